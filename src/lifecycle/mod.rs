//! Session lifecycle controller.
//!
//! Orchestrates session creation, joining, vote arrival, and the reveal
//! transition over the session store, the optional remote store, and the
//! summarizer. Every mutation applies locally first; the remote half of the
//! dual write is best-effort and reports through [`RemoteOutcome`] and the
//! notice board, never by blocking or rolling back the local effect.

use crate::aggregate::{self, MoodBreakdown};
use crate::config::Config;
use crate::error::{Error, LookupScope, Result};
use crate::notice::NoticeBoard;
use crate::remote::{HttpRemote, RemoteError, RemoteOutcome, RemoteStore, VoteSubscription};
use crate::session::{Mirror, Session, SessionStore, Vote};
use crate::summary::{
    GeminiSummarizer, MoodSummary, Summarizer, SummaryRequest, fallback_summary,
};
use crate::theme::{MoodOption, ThemeType};
use std::sync::Arc;
use std::time::Duration;

/// Connectivity report for the diagnostic surface. `None` fields mean the
/// check did not run or could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub remote_configured: bool,
    pub auth_ok: Option<bool>,
    pub schema_ok: Option<bool>,
    pub remote_sessions: Option<usize>,
    pub local_sessions: usize,
}

pub struct Controller {
    store: SessionStore,
    remote: Option<Arc<dyn RemoteStore>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    notices: NoticeBoard,
    summarizer_timeout: Duration,
}

impl Controller {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            remote: None,
            summarizer: None,
            notices: NoticeBoard::new(),
            summarizer_timeout: Duration::from_secs(8),
        }
    }

    /// Wire up a controller from config: persisted mirror, HTTP remote when
    /// credentials are present, Gemini summarizer when a key is present.
    pub fn from_config(config: &Config) -> Self {
        let mirror = match Mirror::open(&config.mirror_db_path()) {
            Ok(mirror) => Some(mirror),
            Err(e) => {
                tracing::warn!("Failed to open history mirror: {e}");
                None
            }
        };

        let mut controller = Self::new(SessionStore::initialize(mirror))
            .with_summarizer_timeout(Duration::from_secs(config.summarizer_timeout_secs))
            .with_notice_ttl(Duration::from_secs(config.notice_ttl_secs));

        if let (Some(url), Some(key)) = (&config.remote_url, &config.remote_anon_key) {
            controller = controller.with_remote(Arc::new(HttpRemote::new(url, key)));
        } else {
            tracing::warn!(
                "Remote store not configured; running in offline mode, history is local only"
            );
        }

        if let Some(key) = &config.gemini_api_key {
            controller = controller.with_summarizer(Arc::new(GeminiSummarizer::new(key)));
        }

        controller
    }

    /// Load config from disk and environment, wire everything up, and run
    /// the startup synchronization.
    pub async fn bootstrap() -> crate::Result<Self> {
        let config = Config::load()?;
        let mut controller = Self::from_config(&config);
        controller.startup_sync().await;
        Ok(controller)
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_summarizer_timeout(mut self, timeout: Duration) -> Self {
        self.summarizer_timeout = timeout;
        self
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notices = NoticeBoard::with_ttl(ttl);
        self
    }

    /// Startup synchronization: anonymous handshake, then seed local history
    /// from the remote. Both halves are best-effort; local history is kept
    /// as fallback display data when the remote read fails or is empty.
    pub async fn startup_sync(&mut self) {
        let Some(remote) = self.remote.clone() else {
            return;
        };

        if let Err(e) = remote.sign_in_anonymously().await {
            tracing::warn!("Anonymous auth failed, continuing without it: {e}");
        }

        match remote.fetch_sessions().await {
            Ok(sessions) if sessions.is_empty() => {
                tracing::debug!("Remote history empty, keeping local history");
            }
            Ok(sessions) => {
                tracing::debug!("Loaded {} session(s) from remote", sessions.len());
                self.store.seed(sessions);
            }
            Err(e) if e.is_schema_missing() => {
                tracing::warn!("Remote tables not provisioned; run the setup SQL: {e}");
            }
            Err(e) => {
                tracing::warn!("Remote history fetch failed, using local history: {e}");
            }
        }
    }

    /// Create a session. The session always becomes part of local history;
    /// remote insert failure degrades to a transient notice.
    pub async fn create_session(
        &mut self,
        name: &str,
        theme: ThemeType,
        timer_minutes: u32,
        custom_options: Option<Vec<MoodOption>>,
    ) -> (Session, RemoteOutcome) {
        let mut session = Session::new(name, theme, timer_minutes);
        if let Some(options) = custom_options {
            session = session.with_custom_options(options);
        }

        let outcome = match &self.remote {
            None => RemoteOutcome::Skipped,
            Some(remote) => match remote.insert_session(&session).await {
                Ok(()) => RemoteOutcome::Synced,
                Err(e) => {
                    tracing::warn!("Remote session insert failed: {e}");
                    self.notices.push(if e.is_schema_missing() {
                        "Database not set up! Run the setup SQL. Session saved locally only."
                            .to_string()
                    } else {
                        format!("Cloud sync failed: {e}. Session saved locally only.")
                    });
                    RemoteOutcome::Failed(e)
                }
            },
        };

        self.store.upsert(session.clone());
        (session, outcome)
    }

    /// Look up a session by join code: remote first, local fallback. All
    /// remote failure shapes fall through to the local lookup before the
    /// attempt fails as not-found.
    pub async fn join_session(&mut self, id: &str) -> Result<Session> {
        if let Some(remote) = self.remote.clone() {
            match remote.fetch_session(id).await {
                Ok(Some(session)) => {
                    if !self.store.contains(id) {
                        self.store.upsert(session);
                    }
                    // The local record wins for a session we already hold.
                    if let Some(local) = self.store.get(id) {
                        return Ok(local.clone());
                    }
                }
                Ok(None) => {
                    tracing::debug!("Session {id} not in remote, checking local history");
                }
                Err(e) if e.is_schema_missing() => {
                    tracing::warn!("Join lookup failed, schema missing: {e}");
                    self.notices
                        .push("Database not set up. Run the setup SQL.".to_string());
                }
                Err(e) => {
                    tracing::warn!("Join lookup failed: {e}");
                    self.notices.push(format!("Database error: {e}"));
                }
            }
        }

        match self.store.get(id) {
            Some(session) => Ok(session.clone()),
            None => Err(Error::SessionNotFound {
                id: id.to_string(),
                scope: self.lookup_scope(),
            }),
        }
    }

    /// Record a participant's vote. Rejected when the session is past its
    /// voting window; otherwise reconciled locally and dual-written.
    pub async fn cast_vote(&mut self, session_id: &str, vote: Vote) -> Result<RemoteOutcome> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound {
                id: session_id.to_string(),
                scope: LookupScope::LocalOnly,
            })?;
        if !session.is_active() {
            return Err(Error::SessionClosed(session_id.to_string()));
        }

        self.store.apply_vote(session_id, vote.clone());

        let outcome = match &self.remote {
            None => RemoteOutcome::Skipped,
            Some(remote) => match remote.insert_vote(session_id, &vote).await {
                Ok(()) => RemoteOutcome::Synced,
                Err(e) => {
                    tracing::warn!("Vote saved locally but not synced: {e}");
                    RemoteOutcome::Failed(e)
                }
            },
        };
        Ok(outcome)
    }

    /// Entry point for votes arriving over the realtime channel. Runs the
    /// same reconciler as locally cast votes but never writes back to the
    /// remote the vote came from. Returns false for unknown sessions.
    pub fn apply_remote_vote(&mut self, session_id: &str, vote: Vote) -> bool {
        self.store.apply_vote(session_id, vote)
    }

    /// Reveal a session: synthesize the summary and transition to
    /// `Revealing`. Requires at least one vote. Summarizer failure or
    /// timeout substitutes the fixed fallback payload; once votes exist the
    /// reveal always succeeds.
    pub async fn trigger_reveal(&mut self, session_id: &str) -> Result<(Session, RemoteOutcome)> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound {
                id: session_id.to_string(),
                scope: LookupScope::LocalOnly,
            })?;
        if session.votes.is_empty() {
            return Err(Error::NoVotes);
        }

        let request = SummaryRequest::from_session(session);
        let summary = self.summarize(&request).await;

        let updated = self
            .store
            .apply_reveal(session_id, &summary)
            .ok_or_else(|| Error::SessionNotFound {
                id: session_id.to_string(),
                scope: LookupScope::LocalOnly,
            })?;

        let outcome = match &self.remote {
            None => RemoteOutcome::Skipped,
            Some(remote) => {
                let result = remote
                    .update_reveal(
                        session_id,
                        updated.status,
                        updated.ai_summary.as_deref(),
                        updated.ai_action.as_deref(),
                    )
                    .await;
                match result {
                    Ok(()) => RemoteOutcome::Synced,
                    Err(e) => {
                        tracing::warn!("Remote reveal update failed: {e}");
                        RemoteOutcome::Failed(e)
                    }
                }
            }
        };

        Ok((updated, outcome))
    }

    async fn summarize(&self, request: &SummaryRequest) -> MoodSummary {
        let Some(summarizer) = &self.summarizer else {
            tracing::debug!("No summarizer configured, using fallback summary");
            return fallback_summary();
        };

        match tokio::time::timeout(self.summarizer_timeout, summarizer.summarize(request)).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                tracing::warn!("Summarizer failed, using fallback: {e}");
                fallback_summary()
            }
            Err(_) => {
                tracing::warn!(
                    "Summarizer timed out after {:?}, using fallback",
                    self.summarizer_timeout
                );
                fallback_summary()
            }
        }
    }

    /// Erase all history locally and, best-effort, remotely. Irreversible.
    pub async fn clear_all(&mut self) -> RemoteOutcome {
        self.store.clear();

        match &self.remote {
            None => RemoteOutcome::Skipped,
            Some(remote) => match remote.delete_all_sessions().await {
                Ok(()) => RemoteOutcome::Synced,
                Err(e) => {
                    tracing::warn!("Remote history delete failed: {e}");
                    RemoteOutcome::Failed(e)
                }
            },
        }
    }

    /// Aggregate view of a session's votes.
    pub fn breakdown(&self, session_id: &str) -> Option<MoodBreakdown> {
        self.store.get(session_id).map(aggregate::aggregate)
    }

    /// Subscribe to remote vote insertions for a session. `Ok(None)` in
    /// offline mode; votes received should be fed to
    /// [`Controller::apply_remote_vote`].
    pub async fn watch_votes(&self, session_id: &str) -> Result<Option<VoteSubscription>> {
        match &self.remote {
            None => Ok(None),
            Some(remote) => Ok(Some(remote.subscribe_votes(session_id).await?)),
        }
    }

    /// Connectivity checks for the diagnostic surface.
    pub async fn diagnostics(&self) -> Diagnostics {
        let mut report = Diagnostics {
            remote_configured: self.remote.is_some(),
            auth_ok: None,
            schema_ok: None,
            remote_sessions: None,
            local_sessions: self.store.len(),
        };

        let Some(remote) = &self.remote else {
            return report;
        };

        report.auth_ok = Some(remote.sign_in_anonymously().await.is_ok());
        match remote.count_sessions().await {
            Ok(count) => {
                report.schema_ok = Some(true);
                report.remote_sessions = Some(count);
            }
            Err(RemoteError::SchemaMissing) => report.schema_ok = Some(false),
            Err(e) => tracing::warn!("Diagnostic count failed: {e}"),
        }

        report
    }

    /// Currently visible transient warnings; expired ones are pruned.
    pub fn notices(&mut self) -> Vec<String> {
        self.notices.active()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Tear down, returning the final history snapshot.
    pub fn shutdown(self) -> Vec<Session> {
        self.store.shutdown()
    }

    fn lookup_scope(&self) -> LookupScope {
        if self.remote.is_some() {
            LookupScope::CloudAndLocal
        } else {
            LookupScope::LocalOnly
        }
    }
}
