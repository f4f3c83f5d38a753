use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::session::StreamSession;

/// Tracks every stream session currently open across the running workflow,
/// so a script or a `@trace` directive can look one up by id without the
/// orchestrator threading the handle through every call site.
#[derive(Default)]
pub struct StreamRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<StreamSession>>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) -> Arc<StreamSession> {
        let session = Arc::new(StreamSession::new());
        self.sessions
            .write()
            .expect("registry lock poisoned")
            .insert(session.id, Arc::clone(&session));
        session
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<StreamSession>> {
        self.sessions.read().expect("registry lock poisoned").get(&id).cloned()
    }

    /// Drops closed sessions that have no further use, keeping the registry
    /// from growing unbounded across a long-running workflow.
    pub fn reap_closed(&self) {
        self.sessions
            .write()
            .expect("registry lock poisoned")
            .retain(|_, s| !s.is_closed());
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_sessions_are_retrievable_by_id() {
        let registry = StreamRegistry::new();
        let session = registry.open();
        let found = registry.get(session.id).expect("session should be registered");
        assert_eq!(found.id, session.id);
    }

    #[test]
    fn reap_closed_removes_only_closed_sessions() {
        let registry = StreamRegistry::new();
        let keep = registry.open();
        let drop_me = registry.open();
        drop_me.close(None, None);

        registry.reap_closed();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(keep.id).is_some());
        assert!(registry.get(drop_me.id).is_none());
    }
}
