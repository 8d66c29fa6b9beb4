//! Persisted mirror of the session history with `SQLite`.
//!
//! The mirror is a single key holding the full serialized history array,
//! written after every history mutation and read once at startup. Decoding
//! tolerates a legacy shape where the key held one bare session object and
//! normalizes it to a one-element array.

use crate::session::Session;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;

const SCHEMA_VERSION: i32 = 1;
/// The single key under which the history array is stored.
const HISTORY_KEY: &str = "vibecast_session_data";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub struct Mirror {
    db: Connection,
}

impl Mirror {
    /// Open or create a mirror at the given path.
    pub fn open(path: &Path) -> Result<Self, MirrorError> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                MirrorError::InvalidData(format!(
                    "Failed to create mirror directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = Connection::open(path)?;
        db.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mirror = Self { db };
        mirror.init_schema()?;

        Ok(mirror)
    }

    fn init_schema(&self) -> Result<(), MirrorError> {
        let version: i32 = self
            .db
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            self.db.execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                PRAGMA user_version = 1;
                ",
            )?;
        }

        Ok(())
    }

    /// Load the full history. An absent key is an empty history.
    pub fn load(&self) -> Result<Vec<Session>, MirrorError> {
        let raw: Option<String> = self
            .db
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![HISTORY_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(decode_history(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the stored history with the given snapshot.
    pub fn save(&self, history: &[Session]) -> Result<(), MirrorError> {
        let json = serde_json::to_string(history)?;
        self.db.execute(
            r"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![HISTORY_KEY, json],
        )?;
        Ok(())
    }
}

/// Decode a history blob, accepting either an array of sessions or a single
/// bare session object.
fn decode_history(json: &str) -> Result<Vec<Session>, serde_json::Error> {
    match serde_json::from_str::<Vec<Session>>(json) {
        Ok(sessions) => Ok(sessions),
        Err(_) => serde_json::from_str::<Session>(json).map(|s| vec![s]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionStatus, Vote};
    use crate::theme::ThemeType;
    use tempfile::tempdir;

    fn make_session() -> Session {
        let mut session = Session::new("Standup", ThemeType::Emoji, 5);
        session.votes = vec![
            Vote::new("ana", "1").with_reason("Shipped the feature"),
            Vote::new("bob", "4").with_kudos("Ana unblocked me"),
        ];
        session
    }

    #[test]
    fn test_empty_mirror_loads_empty_history() {
        let dir = tempdir().unwrap();
        let mirror = Mirror::open(&dir.path().join("history.db")).unwrap();
        assert!(mirror.load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_fields_and_vote_order() {
        let dir = tempdir().unwrap();
        let mirror = Mirror::open(&dir.path().join("history.db")).unwrap();

        let mut revealed = make_session();
        revealed.status = SessionStatus::Revealing;
        revealed.ai_summary = Some("Sunny with a chance of shipping.".to_string());
        revealed.ai_action = Some("Grab coffee together.".to_string());
        let history = vec![revealed, make_session()];

        mirror.save(&history).unwrap();
        let loaded = mirror.load().unwrap();

        assert_eq!(loaded, history);
        assert_eq!(loaded[0].votes[0].nickname, "ana");
        assert_eq!(loaded[0].votes[1].nickname, "bob");
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let mirror = Mirror::open(&dir.path().join("history.db")).unwrap();

        mirror.save(&[make_session(), make_session()]).unwrap();
        mirror.save(&[make_session()]).unwrap();

        assert_eq!(mirror.load().unwrap().len(), 1);
    }

    #[test]
    fn test_decode_accepts_legacy_single_session() {
        let session = make_session();
        let single = serde_json::to_string(&session).unwrap();
        let decoded = decode_history(&single).unwrap();
        assert_eq!(decoded, vec![session]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_history("{\"not\":\"a session\"}").is_err());
        assert!(decode_history("nonsense").is_err());
    }

    #[test]
    fn test_reopen_reads_prior_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.db");
        let history = vec![make_session()];

        {
            let mirror = Mirror::open(&path).unwrap();
            mirror.save(&history).unwrap();
        }

        let mirror = Mirror::open(&path).unwrap();
        assert_eq!(mirror.load().unwrap(), history);
    }
}
