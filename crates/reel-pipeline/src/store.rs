//! In-memory session store.
//!
//! One entry per session, living for the process lifetime (no
//! retention policy; sessions are never garbage-collected). Each
//! mutation is scoped to one key; readers of other sessions are never
//! blocked by a writer.

use dashmap::DashMap;

use crate::error::{PipelineError, PipelineResult};
use reel_models::Session;

/// Thread-safe keyed store of session progress state.
///
/// The orchestrator task for a session is its only writer; any number
/// of pollers read clone snapshots concurrently.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session in the `Initializing` state.
    ///
    /// Fails if the id already exists. Ids are generated (UUID v4),
    /// never caller-supplied, so a collision is a bug.
    pub fn create(&self, session_id: &str) -> PipelineResult<Session> {
        if self.sessions.contains_key(session_id) {
            return Err(PipelineError::SessionExists(session_id.to_string()));
        }
        let session = Session::new(session_id);
        self.sessions.insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    /// Get a snapshot of a session.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Apply one mutation to a session, atomically with respect to
    /// concurrent readers of the same id. Returns `false` when the
    /// session does not exist.
    pub fn update<F>(&self, session_id: &str, mutator: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                mutator(&mut entry);
                true
            }
            None => false,
        }
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::Stage;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new();
        store.create("s-1").unwrap();

        let session = store.get("s-1").unwrap();
        assert_eq!(session.stage, Stage::Initializing);
        assert!(store.get("s-2").is_none());
    }

    #[test]
    fn test_duplicate_create_fails() {
        let store = SessionStore::new();
        store.create("s-1").unwrap();
        assert!(matches!(
            store.create("s-1"),
            Err(PipelineError::SessionExists(_))
        ));
    }

    #[test]
    fn test_update_applies_mutation() {
        let store = SessionStore::new();
        store.create("s-1").unwrap();

        let updated = store.update("s-1", |s| {
            s.enter_stage(Stage::GeneratingScript, "Generating script with AI...")
        });
        assert!(updated);
        assert_eq!(store.get("s-1").unwrap().progress, 10);

        assert!(!store.update("missing", |_| {}));
    }

    #[test]
    fn test_updates_do_not_cross_keys() {
        let store = SessionStore::new();
        store.create("a").unwrap();
        store.create("b").unwrap();

        store.update("a", |s| s.set_progress(50));
        assert_eq!(store.get("a").unwrap().progress, 50);
        assert_eq!(store.get("b").unwrap().progress, 0);
    }
}
