//! Gemini-backed summarizer.
//!
//! Calls `generateContent` with a JSON response mime type and an explicit
//! response schema, so the model output parses straight into [`MoodSummary`].

use super::{MoodSummary, SummaryError, SummaryRequest, Summarizer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// HTTP request timeout. The lifecycle controller applies its own overall
/// deadline on top of this.
const TIMEOUT: Duration = Duration::from_secs(20);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SYSTEM_INSTRUCTION: &str = "You are a witty, empathetic agile coach named VibeBot. \
     You specialize in synthesizing team sentiment into creative metaphors and \
     actionable advice. Tone: Professional yet playful.";

pub struct GeminiSummarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: GEMINI_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<MoodSummary, SummaryError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateContentRequest::for_summary(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SummaryError::Api(format!("HTTP {status}: {text}")));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| SummaryError::Malformed(format!("{e}\nBody: {text}")))?;
        let payload = parsed
            .first_text()
            .ok_or_else(|| SummaryError::Malformed("response carried no text part".into()))?;

        serde_json::from_str(&payload)
            .map_err(|e| SummaryError::Malformed(format!("{e}\nPayload: {payload}")))
    }
}

/// Build the user prompt: theme context, the per-vote digests as JSON, and
/// the task description.
fn build_prompt(request: &SummaryRequest) -> String {
    let vote_stats = serde_json::to_string(&request.votes).unwrap_or_else(|_| "[]".to_string());
    let kudos = serde_json::to_string(&request.kudos).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Theme: {theme}\n\
         Session Name: {name}\n\
         Aggregate Data: {vote_stats}\n\
         Kudos Received: {kudos}\n\n\
         Task:\n\
         Write a witty and empathetic 3-sentence summary of the team's vibe \
         using {lower} metaphors.\n\
         Incorporate the specific Kudos naturally into the narrative.\n\
         If more than 50% of the team is in a negative or low energy state \
         (value < 0.5), provide one specific 'Smart Nudge' team-building tip \
         or actionable item.",
        theme = request.theme.id().to_uppercase(),
        name = request.session_name,
        lower = request.theme.id(),
    )
}

fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A 3-sentence creative summary using theme metaphors."
            },
            "actionableTip": {
                "type": "STRING",
                "description": "A specific team-building tip if mood is low."
            },
            "dominantVibe": {
                "type": "STRING",
                "description": "The single word that describes the overall mood."
            }
        },
        "required": ["summary", "dominantVibe"]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn for_summary(request: &SummaryRequest) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_prompt(request),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<String> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}
