//! The session store: single source of truth for session history.
//!
//! An explicit object with a defined lifecycle, created from the persisted
//! snapshot at startup and surrendering it at shutdown; never an ambient
//! singleton. Mutations replace whole session records, so the store is the
//! serialization point for vote arrivals within a process.
//!
//! Local mutations never fail observably: mirror write errors are logged and
//! absorbed, matching the best-effort-local-persistence contract.

use crate::session::{Mirror, Session, SessionStatus, Vote, reconcile};
use crate::summary::MoodSummary;

pub struct SessionStore {
    sessions: Vec<Session>,
    mirror: Option<Mirror>,
}

impl SessionStore {
    /// Create a store hydrated from the persisted mirror. A mirror read
    /// failure starts with an empty history rather than failing startup.
    pub fn initialize(mirror: Option<Mirror>) -> Self {
        let sessions = match &mirror {
            Some(m) => match m.load() {
                Ok(sessions) => sessions,
                Err(e) => {
                    tracing::warn!("Failed to load persisted history: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Self { sessions, mirror }
    }

    /// Create a store from an in-memory snapshot, with no persistence.
    pub fn from_snapshot(sessions: Vec<Session>) -> Self {
        Self {
            sessions,
            mirror: None,
        }
    }

    /// Tear down the store, returning the final snapshot.
    pub fn shutdown(self) -> Vec<Session> {
        self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Insert a session at the front of the history, or replace the record
    /// with the same id in place.
    pub fn upsert(&mut self, session: Session) {
        if let Some(existing) = self.sessions.iter_mut().find(|s| s.id == session.id) {
            *existing = session;
        } else {
            self.sessions.insert(0, session);
        }
        self.persist();
    }

    /// Replace the whole history with a freshly fetched remote snapshot.
    pub fn seed(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
        self.persist();
    }

    /// Merge a vote into a session through the reconciler. Returns false when
    /// the session is unknown.
    pub fn apply_vote(&mut self, session_id: &str, vote: Vote) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return false;
        };
        let votes = std::mem::take(&mut session.votes);
        session.votes = reconcile(votes, vote);
        self.persist();
        true
    }

    /// Apply a completed reveal: transition to `Revealing` and attach the
    /// summary fields. Returns the updated record for remote propagation.
    pub fn apply_reveal(&mut self, session_id: &str, summary: &MoodSummary) -> Option<Session> {
        let session = self.sessions.iter_mut().find(|s| s.id == session_id)?;
        session.status = SessionStatus::Revealing;
        session.ai_summary = Some(summary.summary.clone());
        session.ai_action = summary.actionable_tip.clone();
        let updated = session.clone();
        self.persist();
        Some(updated)
    }

    /// Drop the entire history. Irreversible; no soft-delete.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Some(mirror) = &self.mirror
            && let Err(e) = mirror.save(&self.sessions)
        {
            tracing::warn!("Failed to persist history mirror: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::MoodSummary;
    use crate::theme::ThemeType;
    use tempfile::tempdir;

    fn store() -> SessionStore {
        SessionStore::from_snapshot(Vec::new())
    }

    #[test]
    fn test_upsert_inserts_newest_first() {
        let mut store = store();
        let first = Session::new("One", ThemeType::Emoji, 5);
        let second = Session::new("Two", ThemeType::Emoji, 5);
        store.upsert(first.clone());
        store.upsert(second.clone());

        assert_eq!(store.sessions()[0].id, second.id);
        assert_eq!(store.sessions()[1].id, first.id);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = store();
        let mut session = Session::new("One", ThemeType::Emoji, 5);
        store.upsert(session.clone());

        session.name = "Renamed".to_string();
        store.upsert(session.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&session.id).unwrap().name, "Renamed");
    }

    #[test]
    fn test_apply_vote_deduplicates_by_nickname() {
        let mut store = store();
        let session = Session::new("Retro", ThemeType::Emoji, 5);
        let id = session.id.clone();
        store.upsert(session);

        assert!(store.apply_vote(&id, Vote::new("ana", "1")));
        assert!(store.apply_vote(&id, Vote::new("ana", "6")));

        let votes = &store.get(&id).unwrap().votes;
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].mood_id, "6");
    }

    #[test]
    fn test_apply_vote_unknown_session() {
        let mut store = store();
        assert!(!store.apply_vote("NOPE42", Vote::new("ana", "1")));
    }

    #[test]
    fn test_apply_reveal_sets_status_and_summary() {
        let mut store = store();
        let session = Session::new("Retro", ThemeType::Weather, 5);
        let id = session.id.clone();
        store.upsert(session);
        store.apply_vote(&id, Vote::new("ana", "w1"));

        let summary = MoodSummary {
            summary: "Clear skies all around.".to_string(),
            dominant_vibe: "Sunny".to_string(),
            actionable_tip: Some("Keep the momentum.".to_string()),
        };
        let updated = store.apply_reveal(&id, &summary).unwrap();

        assert_eq!(updated.status, SessionStatus::Revealing);
        assert_eq!(updated.ai_summary.as_deref(), Some("Clear skies all around."));
        assert_eq!(updated.ai_action.as_deref(), Some("Keep the momentum."));
        assert_eq!(store.get(&id).unwrap().status, SessionStatus::Revealing);
    }

    #[test]
    fn test_clear_empties_history() {
        let mut store = store();
        store.upsert(Session::new("One", ThemeType::Emoji, 5));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_initialize_and_shutdown_round_trip_through_mirror() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let mirror = Mirror::open(&path).unwrap();
            let mut store = SessionStore::initialize(Some(mirror));
            let session = Session::new("Persisted", ThemeType::Emoji, 5);
            let id = session.id.clone();
            store.upsert(session);
            store.apply_vote(&id, Vote::new("ana", "2"));
        }

        let mirror = Mirror::open(&path).unwrap();
        let store = SessionStore::initialize(Some(mirror));
        assert_eq!(store.len(), 1);
        let snapshot = store.shutdown();
        assert_eq!(snapshot[0].votes.len(), 1);
    }

    #[test]
    fn test_seed_replaces_history() {
        let mut store = store();
        store.upsert(Session::new("Local", ThemeType::Emoji, 5));
        let remote = vec![
            Session::new("Remote A", ThemeType::Weather, 5),
            Session::new("Remote B", ThemeType::Weather, 5),
        ];
        store.seed(remote.clone());
        assert_eq!(store.sessions(), remote.as_slice());
    }
}
