//! In-memory conversation sessions.
//!
//! Sessions live for the lifetime of the process. Each one sits behind its
//! own async mutex; the orchestrator holds that lock for a whole request so
//! two requests on the same session never interleave their turns.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{Role, Turn};

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
}

impl Session {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("New session {}", session_id);
                Arc::new(Mutex::new(Session::new(session_id)))
            })
            .clone()
    }

    /// Drop a session. Returns whether it existed. A request already
    /// holding the session finishes against the detached copy.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Snapshot of a session's turns.
    pub async fn history(&self, session_id: &str) -> Option<Vec<Turn>> {
        let handle = self.sessions.get(session_id).map(|h| h.value().clone())?;
        let session = handle.lock().await;
        Some(session.turns().to_vec())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("s1");
        a.lock().await.append(Role::User, "hello");
        let b = store.get_or_create("s1");
        assert_eq!(b.lock().await.turns().len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = SessionStore::new();
        store.get_or_create("s1");
        assert!(store.clear("s1"));
        assert!(!store.clear("s1"));
        assert!(store.history("s1").await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_pairs_together() {
        let store = Arc::new(SessionStore::new());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let handle = store.get_or_create("shared");
                let mut session = handle.lock().await;
                session.append(Role::User, format!("q{}", i));
                tokio::task::yield_now().await;
                session.append(Role::Assistant, format!("a{}", i));
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let turns = store.history("shared").await.unwrap();
        assert_eq!(turns.len(), 32);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(&pair[0].content[1..], &pair[1].content[1..]);
        }
    }
}
