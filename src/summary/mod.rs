//! Mood summarization collaborator.
//!
//! The summarizer is an opaque function: vote data in, a short textual
//! summary plus an optional team-building tip out. Failures never reach the
//! reveal flow; the lifecycle controller substitutes [`fallback_summary`].

pub mod gemini;

pub use gemini::GeminiSummarizer;

use crate::aggregate;
use crate::session::Session;
use crate::theme::{self, ThemeType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed summarizer output: {0}")]
    Malformed(String),
}

/// One vote as the summarizer sees it: resolved label plus free text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VoteDigest {
    pub mood: String,
    pub reason: String,
    pub kudos: String,
}

/// Everything the summarizer needs about a session.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub theme: ThemeType,
    pub session_name: String,
    pub votes: Vec<VoteDigest>,
    /// Non-empty kudos strings, in vote order.
    pub kudos: Vec<String>,
    /// Fraction of votes with sentiment value below 0.5; above 0.5 the
    /// summarizer is expected to add an actionable tip.
    pub low_mood_share: f32,
}

impl SummaryRequest {
    pub fn from_session(session: &Session) -> Self {
        let options = session.theme_options();
        let breakdown = aggregate::aggregate(session);

        let votes = session
            .votes
            .iter()
            .map(|v| VoteDigest {
                mood: theme::find(options, &v.mood_id)
                    .map_or_else(|| "Unknown".to_string(), |o| o.label.clone()),
                reason: v
                    .reason
                    .clone()
                    .unwrap_or_else(|| "No reason provided".to_string()),
                kudos: v.kudos.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            theme: session.theme_type,
            session_name: session.name.clone(),
            votes,
            kudos: breakdown.kudos,
            low_mood_share: breakdown.low_mood_share,
        }
    }
}

/// Structured summarizer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub summary: String,
    pub dominant_vibe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actionable_tip: Option<String>,
}

/// Fixed payload substituted whenever the summarizer fails or times out.
pub fn fallback_summary() -> MoodSummary {
    MoodSummary {
        summary: "The team's vibe is mysterious today! Technical clouds may be \
                  obscuring our view, but the collective energy remains unique."
            .to_string(),
        dominant_vibe: "Mysterious".to_string(),
        actionable_tip: Some(
            "Maybe take a 5-minute break to grab a coffee and sync up?".to_string(),
        ),
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<MoodSummary, SummaryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Vote;

    #[test]
    fn test_request_resolves_labels_and_defaults() {
        let mut session = Session::new("Retro", ThemeType::Emoji, 5);
        session.votes = vec![
            Vote::new("ana", "1").with_reason("Shipped it"),
            Vote::new("bob", "ghost").with_kudos("Ana rocks"),
        ];

        let request = SummaryRequest::from_session(&session);
        assert_eq!(
            request.votes[0],
            VoteDigest {
                mood: "Stoked".to_string(),
                reason: "Shipped it".to_string(),
                kudos: String::new(),
            }
        );
        assert_eq!(request.votes[1].mood, "Unknown");
        assert_eq!(request.votes[1].reason, "No reason provided");
        assert_eq!(request.kudos, vec!["Ana rocks"]);
    }

    #[test]
    fn test_fallback_summary_is_non_empty() {
        let fallback = fallback_summary();
        assert!(!fallback.summary.is_empty());
        assert!(!fallback.dominant_vibe.is_empty());
        assert!(fallback.actionable_tip.is_some());
    }

    #[test]
    fn test_mood_summary_wire_shape() {
        let parsed: MoodSummary = serde_json::from_str(
            r#"{"summary":"Sunny overall.","dominantVibe":"Sunny"}"#,
        )
        .unwrap();
        assert_eq!(parsed.dominant_vibe, "Sunny");
        assert!(parsed.actionable_tip.is_none());
    }
}
