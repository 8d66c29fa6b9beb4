//! Session and vote records.
//!
//! A session owns an ordered vote list that is semantically a set keyed by
//! nickname; [`reconcile`] enforces that. Field names serialize in camelCase
//! so the persisted mirror and the remote store share one wire shape.

mod reconcile;
pub mod mirror;
pub mod store;

pub use mirror::{Mirror, MirrorError};
pub use reconcile::reconcile;
pub use store::SessionStore;

use crate::theme::{self, MoodOption, ThemeType};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet for join codes. Uppercase alphanumerics keep codes easy to read
/// aloud and type on a phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Session lifecycle states.
///
/// Only `Active -> Revealing` is driven by the lifecycle controller. `Locked`
/// and `Completed` are part of the persisted vocabulary but nothing in this
/// crate transitions into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Locked,
    Revealing,
    Completed,
}

/// One participant's submission. `nickname` is the de-duplication key, not a
/// verified identity; the last vote under a nickname replaces earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    #[serde(default)]
    pub id: String,
    pub nickname: String,
    pub mood_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kudos: Option<String>,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl Vote {
    pub fn new(nickname: impl Into<String>, mood_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nickname: nickname.into(),
            mood_id: mood_id.into(),
            reason: None,
            kudos: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_kudos(mut self, kudos: impl Into<String>) -> Self {
        self.kudos = Some(kudos.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Short human-typeable join code, unique for the store's lifetime.
    /// Collisions are accepted as negligible, not actively checked.
    pub id: String,
    pub name: String,
    pub theme_type: ThemeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_options: Option<Vec<MoodOption>>,
    /// Unix milliseconds.
    pub start_time: i64,
    /// Check-in window length in minutes. A presentation-layer countdown;
    /// expiry does not transition the session.
    pub timer_duration: u32,
    pub status: SessionStatus,
    /// Arrival order; at most one entry per distinct nickname.
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_action: Option<String>,
}

impl Session {
    pub fn new(name: impl Into<String>, theme_type: ThemeType, timer_duration: u32) -> Self {
        Self {
            id: new_join_code(),
            name: name.into(),
            theme_type,
            custom_options: None,
            start_time: chrono::Utc::now().timestamp_millis(),
            timer_duration,
            status: SessionStatus::Active,
            votes: Vec::new(),
            ai_summary: None,
            ai_action: None,
        }
    }

    pub fn with_custom_options(mut self, options: Vec<MoodOption>) -> Self {
        self.custom_options = Some(options);
        self
    }

    /// The option catalog this session's votes resolve against.
    pub fn theme_options(&self) -> &[MoodOption] {
        theme::options_for(self.theme_type, self.custom_options.as_deref())
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Generate a 6-character join code.
pub fn new_join_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
