//! In-memory remote store for tests and offline development.
//!
//! Implements the full [`RemoteStore`] contract over a mutex-guarded session
//! list, with toggleable failure injection to exercise the degrade-to-local
//! paths. Like the real backend, vote inserts append without a per-nickname
//! uniqueness constraint; de-duplication stays a local concern.

use super::{RemoteError, RemoteStore, VoteSubscription};
use crate::session::{Session, SessionStatus, Vote};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// How an injected failure presents to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Tables not provisioned (PostgREST 42P01).
    SchemaMissing,
    /// Generic transport-level unavailability.
    Unavailable,
}

#[derive(Default)]
struct MemoryState {
    sessions: Vec<Session>,
    failure: Option<FailureMode>,
}

#[derive(Clone)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
    poll_interval: Duration,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Make every subsequent call fail in the given mode.
    pub async fn inject_failure(&self, mode: FailureMode) {
        self.state.lock().await.failure = Some(mode);
    }

    /// Restore normal operation.
    pub async fn heal(&self) {
        self.state.lock().await.failure = None;
    }

    /// Sessions currently held, for assertions.
    pub async fn snapshot(&self) -> Vec<Session> {
        self.state.lock().await.sessions.clone()
    }

    /// Pre-load a session, bypassing failure injection.
    pub async fn seed_session(&self, session: Session) {
        self.state.lock().await.sessions.insert(0, session);
    }

    async fn check_failure(&self) -> Result<(), RemoteError> {
        match self.state.lock().await.failure {
            Some(FailureMode::SchemaMissing) => Err(RemoteError::SchemaMissing),
            Some(FailureMode::Unavailable) => Err(RemoteError::Api {
                status: 503,
                message: "remote unavailable".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn sign_in_anonymously(&self) -> Result<(), RemoteError> {
        self.check_failure().await
    }

    async fn fetch_sessions(&self) -> Result<Vec<Session>, RemoteError> {
        self.check_failure().await?;
        let mut sessions = self.state.lock().await.sessions.clone();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.start_time));
        Ok(sessions)
    }

    async fn fetch_session(&self, id: &str) -> Result<Option<Session>, RemoteError> {
        self.check_failure().await?;
        Ok(self
            .state
            .lock()
            .await
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RemoteError> {
        self.check_failure().await?;
        let mut state = self.state.lock().await;
        // Insert carries no votes or summary fields, like the wire path.
        let mut row = session.clone();
        row.votes = Vec::new();
        row.ai_summary = None;
        row.ai_action = None;
        state.sessions.insert(0, row);
        Ok(())
    }

    async fn insert_vote(&self, session_id: &str, vote: &Vote) -> Result<(), RemoteError> {
        self.check_failure().await?;
        let mut state = self.state.lock().await;
        let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) else {
            return Err(RemoteError::Api {
                status: 404,
                message: format!("no session {session_id}"),
            });
        };
        // Plain row append; no (session, nickname) uniqueness remotely.
        session.votes.push(vote.clone());
        Ok(())
    }

    async fn update_reveal(
        &self,
        session_id: &str,
        status: SessionStatus,
        summary: Option<&str>,
        action: Option<&str>,
    ) -> Result<(), RemoteError> {
        self.check_failure().await?;
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
            session.status = status;
            session.ai_summary = summary.map(str::to_string);
            session.ai_action = action.map(str::to_string);
        }
        Ok(())
    }

    async fn delete_all_sessions(&self) -> Result<(), RemoteError> {
        self.check_failure().await?;
        self.state.lock().await.sessions.clear();
        Ok(())
    }

    async fn count_sessions(&self) -> Result<usize, RemoteError> {
        self.check_failure().await?;
        Ok(self.state.lock().await.sessions.len())
    }

    async fn subscribe_votes(&self, session_id: &str) -> Result<VoteSubscription, RemoteError> {
        self.check_failure().await?;

        let state = Arc::clone(&self.state);
        let session_id = session_id.to_string();
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
                        let votes: Vec<Vote> = {
                            let state = state.lock().await;
                            state
                                .sessions
                                .iter()
                                .find(|s| s.id == session_id)
                                .map(|s| s.votes.clone())
                                .unwrap_or_default()
                        };
                        for vote in votes {
                            if seen.insert(vote.id.clone()) && tx.send(vote).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(VoteSubscription::new(rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeType;

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let remote = MemoryRemote::new();
        let session = Session::new("Retro", ThemeType::Emoji, 5);
        remote.insert_session(&session).await.unwrap();

        let fetched = remote.fetch_session(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
        assert!(remote.fetch_session("NOPE42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_sessions_newest_first() {
        let remote = MemoryRemote::new();
        let mut old = Session::new("Old", ThemeType::Emoji, 5);
        old.start_time = 100;
        let mut new = Session::new("New", ThemeType::Emoji, 5);
        new.start_time = 200;
        remote.insert_session(&old).await.unwrap();
        remote.insert_session(&new).await.unwrap();

        let sessions = remote.fetch_sessions().await.unwrap();
        assert_eq!(sessions[0].name, "New");
        assert_eq!(sessions[1].name, "Old");
    }

    #[tokio::test]
    async fn test_concurrent_same_nickname_votes_both_persist() {
        let remote = MemoryRemote::new();
        let session = Session::new("Retro", ThemeType::Emoji, 5);
        remote.insert_session(&session).await.unwrap();

        remote
            .insert_vote(&session.id, &Vote::new("ana", "1"))
            .await
            .unwrap();
        remote
            .insert_vote(&session.id, &Vote::new("ana", "2"))
            .await
            .unwrap();

        // The remote accepts the anomaly; reconciliation is local.
        let snapshot = remote.snapshot().await;
        assert_eq!(snapshot[0].votes.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let remote = MemoryRemote::new();
        remote.inject_failure(FailureMode::SchemaMissing).await;
        assert!(
            remote
                .fetch_sessions()
                .await
                .unwrap_err()
                .is_schema_missing()
        );

        remote.heal().await;
        assert!(remote.fetch_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_reveal_sets_fields() {
        let remote = MemoryRemote::new();
        let session = Session::new("Retro", ThemeType::Emoji, 5);
        remote.insert_session(&session).await.unwrap();

        remote
            .update_reveal(
                &session.id,
                SessionStatus::Revealing,
                Some("Summary"),
                None,
            )
            .await
            .unwrap();

        let fetched = remote.fetch_session(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, SessionStatus::Revealing);
        assert_eq!(fetched.ai_summary.as_deref(), Some("Summary"));
    }

    #[tokio::test]
    async fn test_subscription_delivers_inserted_votes() {
        let remote = MemoryRemote::new();
        let session = Session::new("Retro", ThemeType::Emoji, 5);
        remote.insert_session(&session).await.unwrap();

        let mut subscription = remote.subscribe_votes(&session.id).await.unwrap();
        let vote = Vote::new("ana", "1");
        remote.insert_vote(&session.id, &vote).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("poll should deliver within a second")
            .expect("channel open");
        assert_eq!(received.id, vote.id);

        subscription.stop();
    }

    #[tokio::test]
    async fn test_delete_all() {
        let remote = MemoryRemote::new();
        remote
            .insert_session(&Session::new("Retro", ThemeType::Emoji, 5))
            .await
            .unwrap();
        remote.delete_all_sessions().await.unwrap();
        assert_eq!(remote.count_sessions().await.unwrap(), 0);
    }
}
