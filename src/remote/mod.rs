//! Remote store abstraction and dual-write outcome reporting.
//!
//! The remote store is an opaque collaborator with CRUD plus vote-insert
//! notifications. Every local mutation succeeds on its own; the remote call
//! is a second, independent result channel ([`RemoteOutcome`]) that never
//! rolls back or blocks the local effect.

mod error;
pub mod http;
pub mod memory;

pub use error::RemoteError;
pub use http::HttpRemote;
pub use memory::MemoryRemote;

use crate::session::{Session, SessionStatus, Vote};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Result of the best-effort remote half of a dual write.
#[derive(Debug)]
pub enum RemoteOutcome {
    /// No remote store configured; nothing was attempted.
    Skipped,
    /// The remote call succeeded.
    Synced,
    /// The remote call failed. The local mutation already completed.
    Failed(RemoteError),
}

impl RemoteOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, RemoteOutcome::Synced)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RemoteOutcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RemoteOutcome::Failed(_))
    }
}

/// Live feed of vote insertions for one session.
///
/// Dropping the handle or calling [`VoteSubscription::stop`] cancels the
/// underlying delivery task.
pub struct VoteSubscription {
    votes: mpsc::Receiver<Vote>,
    cancel: CancellationToken,
}

impl VoteSubscription {
    pub fn new(votes: mpsc::Receiver<Vote>, cancel: CancellationToken) -> Self {
        Self { votes, cancel }
    }

    /// Receive the next remote vote; `None` once the feed has stopped.
    pub async fn recv(&mut self) -> Option<Vote> {
        self.votes.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for VoteSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Capability set consumed from the remote persistence backend.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Anonymous-identity handshake. Best-effort: callers log failures and
    /// proceed with store operations regardless.
    async fn sign_in_anonymously(&self) -> Result<(), RemoteError>;

    /// All sessions with nested votes, newest first.
    async fn fetch_sessions(&self) -> Result<Vec<Session>, RemoteError>;

    /// One session by join code, with nested votes. `Ok(None)` means the
    /// remote was reachable but holds no such row.
    async fn fetch_session(&self, id: &str) -> Result<Option<Session>, RemoteError>;

    async fn insert_session(&self, session: &Session) -> Result<(), RemoteError>;

    async fn insert_vote(&self, session_id: &str, vote: &Vote) -> Result<(), RemoteError>;

    /// Propagate a reveal: status plus summary fields only; votes are not
    /// re-sent.
    async fn update_reveal(
        &self,
        session_id: &str,
        status: SessionStatus,
        summary: Option<&str>,
        action: Option<&str>,
    ) -> Result<(), RemoteError>;

    async fn delete_all_sessions(&self) -> Result<(), RemoteError>;

    /// Number of sessions the remote holds. Diagnostics only.
    async fn count_sessions(&self) -> Result<usize, RemoteError>;

    /// Subscribe to vote insertions for one session.
    async fn subscribe_votes(&self, session_id: &str) -> Result<VoteSubscription, RemoteError>;
}
