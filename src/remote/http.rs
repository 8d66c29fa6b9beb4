//! PostgREST-style HTTP remote store.
//!
//! Talks to a Supabase-compatible backend: `/rest/v1` tables with nested
//! selects, `/auth/v1` anonymous handshake, `apikey` + bearer headers. Rows
//! cross an explicit decode boundary (`SessionRow`) so missing nested vote
//! lists normalize to empty rather than being trusted.
//!
//! Realtime is approximated without a websocket channel: `subscribe_votes`
//! runs a cancellable polling task that diffs vote ids and delivers new
//! arrivals over an mpsc channel.

use super::{RemoteError, RemoteStore, VoteSubscription, error::classify};
use crate::session::{Session, SessionStatus, Vote};
use crate::theme::{MoodOption, ThemeType};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// HTTP request timeout.
const TIMEOUT: Duration = Duration::from_secs(10);
/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default interval between vote polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    poll_interval: Duration,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn get_json<R: DeserializeOwned>(&self, path_and_query: &str) -> Result<R, RemoteError> {
        let url = format!("{}{path_and_query}", self.base_url);
        let headers = build_headers(&self.anon_key)?;
        let response = self.client.get(&url).headers(headers).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(RemoteError::Decode)
    }

    /// Run a write request, mapping non-success statuses and discarding the
    /// body (`Prefer: return=minimal`).
    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<(), RemoteError> {
        let mut headers = build_headers(&self.anon_key)?;
        headers.insert("Prefer", HeaderValue::from_static("return=minimal"));

        let response = builder.headers(headers).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify(status.as_u16(), &text));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn sign_in_anonymously(&self) -> Result<(), RemoteError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        self.execute(self.client.post(&url).json(&serde_json::json!({})))
            .await
    }

    async fn fetch_sessions(&self) -> Result<Vec<Session>, RemoteError> {
        let rows: Vec<SessionRow> = self
            .get_json("/rest/v1/sessions?select=*,votes(*)&order=startTime.desc")
            .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn fetch_session(&self, id: &str) -> Result<Option<Session>, RemoteError> {
        let path = format!("/rest/v1/sessions?select=*,votes(*)&id=eq.{id}");
        let mut rows: Vec<SessionRow> = self.get_json(&path).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(Session::from(rows.remove(0))))
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RemoteError> {
        let url = format!("{}/rest/v1/sessions", self.base_url);
        let row = SessionInsert::from(session);
        self.execute(self.client.post(&url).json(&row)).await
    }

    async fn insert_vote(&self, session_id: &str, vote: &Vote) -> Result<(), RemoteError> {
        let url = format!("{}/rest/v1/votes", self.base_url);
        let row = VoteInsert { vote, session_id };
        self.execute(self.client.post(&url).json(&row)).await
    }

    async fn update_reveal(
        &self,
        session_id: &str,
        status: SessionStatus,
        summary: Option<&str>,
        action: Option<&str>,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/rest/v1/sessions?id=eq.{session_id}", self.base_url);
        let body = serde_json::json!({
            "status": status,
            "aiSummary": summary,
            "aiAction": action,
        });
        self.execute(self.client.patch(&url).json(&body)).await
    }

    async fn delete_all_sessions(&self) -> Result<(), RemoteError> {
        // PostgREST refuses unfiltered deletes; the never-matching guard
        // makes this a delete-everything.
        let url = format!("{}/rest/v1/sessions?id=neq.0", self.base_url);
        self.execute(self.client.delete(&url)).await
    }

    async fn count_sessions(&self) -> Result<usize, RemoteError> {
        let rows: Vec<serde_json::Value> = self.get_json("/rest/v1/sessions?select=id").await?;
        Ok(rows.len())
    }

    async fn subscribe_votes(&self, session_id: &str) -> Result<VoteSubscription, RemoteError> {
        let url = format!(
            "{}/rest/v1/votes?select=*&session_id=eq.{session_id}&order=timestamp.asc",
            self.base_url
        );
        let headers = build_headers(&self.anon_key)?;
        let client = self.client.clone();
        let poll_interval = self.poll_interval;

        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let mut seen: HashSet<String> = HashSet::new();
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        match poll_votes(&client, &url, headers.clone()).await {
                            Ok(votes) => {
                                for vote in votes {
                                    if seen.insert(vote_key(&vote)) && tx.send(vote).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(e) => tracing::warn!("Vote poll failed: {e}"),
                        }
                    }
                }
            }
        });

        Ok(VoteSubscription::new(rx, cancel))
    }
}

async fn poll_votes(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
) -> Result<Vec<Vote>, RemoteError> {
    let response = client.get(url).headers(headers).send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(classify(status.as_u16(), &text));
    }
    serde_json::from_str(&text).map_err(RemoteError::Decode)
}

/// Dedup key for polled votes. Remote rows normally carry an id; rows that
/// arrived without one fall back to nickname plus timestamp.
fn vote_key(vote: &Vote) -> String {
    if vote.id.is_empty() {
        format!("{}@{}", vote.nickname, vote.timestamp)
    } else {
        vote.id.clone()
    }
}

fn build_headers(anon_key: &str) -> Result<HeaderMap, RemoteError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let key = HeaderValue::from_str(anon_key)
        .map_err(|_| RemoteError::Config("anon key contains invalid header characters".into()))?;
    headers.insert("apikey", key);

    let bearer = HeaderValue::from_str(&format!("Bearer {anon_key}"))
        .map_err(|_| RemoteError::Config("anon key contains invalid header characters".into()))?;
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}

/// Session row as the remote returns it. The decode boundary: nested vote
/// lists default to empty instead of being trusted to exist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRow {
    id: String,
    name: String,
    theme_type: ThemeType,
    #[serde(default)]
    custom_options: Option<Vec<MoodOption>>,
    start_time: i64,
    timer_duration: u32,
    status: SessionStatus,
    #[serde(default)]
    votes: Vec<Vote>,
    #[serde(default)]
    ai_summary: Option<String>,
    #[serde(default)]
    ai_action: Option<String>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        let mut votes = row.votes;
        // Nested selects carry no ordering; timestamps approximate arrival
        // order for rows fetched cold.
        votes.sort_by_key(|v| v.timestamp);
        Session {
            id: row.id,
            name: row.name,
            theme_type: row.theme_type,
            custom_options: row.custom_options,
            start_time: row.start_time,
            timer_duration: row.timer_duration,
            status: row.status,
            votes,
            ai_summary: row.ai_summary,
            ai_action: row.ai_action,
        }
    }
}

/// Columns sent on session creation. Votes, summary fields and custom
/// options never travel on the insert path.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionInsert<'a> {
    id: &'a str,
    name: &'a str,
    theme_type: ThemeType,
    start_time: i64,
    timer_duration: u32,
    status: SessionStatus,
}

impl<'a> From<&'a Session> for SessionInsert<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            id: &session.id,
            name: &session.name,
            theme_type: session.theme_type,
            start_time: session.start_time,
            timer_duration: session.timer_duration,
            status: session.status,
        }
    }
}

#[derive(Debug, Serialize)]
struct VoteInsert<'a> {
    #[serde(flatten)]
    vote: &'a Vote,
    session_id: &'a str,
}
