use std::sync::Arc;

use chrono::{DateTime, Utc};
use solace_core::chat::{ChatSession, DayClock, Message, Role, SessionKey};
use uuid::Uuid;

use super::error::StoreError;
use super::store::SessionStore;

/// Finds or opens the single per-day session of a user and batches appends
/// into one write.
#[derive(Clone)]
pub struct SessionAggregator {
    store: Arc<dyn SessionStore>,
    clock: DayClock,
}

impl SessionAggregator {
    pub fn new(store: Arc<dyn SessionStore>, clock: DayClock) -> Self {
        Self { store, clock }
    }

    pub async fn get_or_create_today(&self, user_id: Uuid) -> Result<ChatSession, StoreError> {
        self.get_or_create_at(user_id, Utc::now()).await
    }

    /// Session for the day containing `now`. A day without a stored session
    /// gets a fresh, empty one which is only written on the first `persist`.
    pub async fn get_or_create_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChatSession, StoreError> {
        let key = SessionKey {
            user_id,
            day: self.clock.day_of(now),
        };

        match self.store.find(key).await? {
            Some(session) => Ok(session),
            None => {
                tracing::debug!(user_id = %user_id, day = %key.day, "Opening new chat session");
                Ok(ChatSession::open(user_id, key.day, now))
            }
        }
    }

    pub fn append_message(
        &self,
        session: &mut ChatSession,
        role: Role,
        content: impl Into<String>,
    ) -> Message {
        session.push(role, content, Utc::now()).clone()
    }

    /// Write every message appended since the last persist in one store call.
    ///
    /// On failure the unsaved messages are dropped from `session`.
    pub async fn persist(&self, session: &mut ChatSession) -> Result<(), StoreError> {
        if session.unsaved().is_empty() {
            return Ok(());
        }

        match self.store.append(session).await {
            Ok(stored) => {
                *session = stored;
                Ok(())
            }
            Err(err) => {
                session.discard_unsaved();
                Err(err)
            }
        }
    }

    pub async fn latest(&self, user_id: Uuid) -> Result<Option<ChatSession>, StoreError> {
        self.store.latest(user_id).await
    }
}
