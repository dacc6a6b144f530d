//! In-process [`SessionStore`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use solace_core::chat::{ChatSession, SessionKey};
use uuid::Uuid;

use super::error::StoreError;
use super::store::SessionStore;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, ChatSession>>,
    appends: AtomicUsize,
    fail_appends: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `append` calls, failed ones included.
    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Store a session as-is, e.g. one created on an earlier day.
    pub fn insert(&self, mut session: ChatSession) {
        session.mark_persisted();
        self.sessions
            .lock()
            .unwrap()
            .insert(session.key(), session);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find(&self, key: SessionKey) -> Result<Option<ChatSession>, StoreError> {
        Ok(self.sessions.lock().unwrap().get(&key).cloned())
    }

    async fn append(&self, session: &ChatSession) -> Result<ChatSession, StoreError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut sessions = self.sessions.lock().unwrap();
        let stored = sessions.entry(session.key()).or_insert_with(|| {
            let mut fresh = session.clone();
            fresh.messages.clear();
            fresh
        });
        // Same clamping as chat_append_messages in Postgres.
        let floor = stored.messages.last().map(|m| m.timestamp);
        stored
            .messages
            .extend(session.unsaved().iter().cloned().map(|mut message| {
                if let Some(floor) = floor {
                    message.timestamp = message.timestamp.max(floor);
                }
                message
            }));
        stored.updated_at = stored.updated_at.max(session.updated_at);
        stored.mark_persisted();
        Ok(stored.clone())
    }

    async fn latest(&self, user_id: Uuid) -> Result<Option<ChatSession>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.created_at, s.id))
            .cloned())
    }
}
