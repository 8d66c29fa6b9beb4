//! Transient user-visible notices.
//!
//! Remote failures surface as soft, auto-expiring warnings rather than
//! errors; the flow that raised them has already completed locally. Notices
//! expire after a fixed TTL and are pruned on read.

use std::time::{Duration, Instant};

/// How long a notice stays visible.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    raised_at: Instant,
}

#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.notices.push(Notice {
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    /// Currently visible notices, oldest first. Expired entries are dropped.
    pub fn active(&mut self) -> Vec<String> {
        let ttl = self.ttl;
        self.notices.retain(|n| n.raised_at.elapsed() < ttl);
        self.notices.iter().map(|n| n.message.clone()).collect()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
