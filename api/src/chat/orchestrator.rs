use std::sync::Arc;
use std::time::Duration;

use solace_core::chat::{ChatSession, Role};
use uuid::Uuid;

use super::aggregator::SessionAggregator;
use super::error::{ChatError, UpstreamError};
use super::reply::{ReplyProvider, RotatingReplies};

/// Handles one inbound chat message end to end.
pub struct ChatOrchestrator {
    sessions: SessionAggregator,
    provider: Arc<dyn ReplyProvider>,
    /// Used in place of a failing provider; `None` surfaces upstream errors
    fallback: Option<RotatingReplies>,
    reply_timeout: Duration,
}

impl ChatOrchestrator {
    pub fn new(
        sessions: SessionAggregator,
        provider: Arc<dyn ReplyProvider>,
        fallback: Option<RotatingReplies>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            provider,
            fallback,
            reply_timeout,
        }
    }

    /// Record `text` in today's session, answer it, and store both messages
    /// in a single write. Returns only the reply.
    ///
    /// If the write fails the reply is not returned, even though it was
    /// produced.
    pub async fn handle_user_message(&self, user_id: Uuid, text: &str) -> Result<String, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("Message is required".to_string()));
        }

        let mut session = self.sessions.get_or_create_today(user_id).await?;
        self.sessions.append_message(&mut session, Role::User, text);

        let reply = self.obtain_reply(user_id, &session).await?;
        self.sessions
            .append_message(&mut session, Role::Assistant, reply.clone());

        self.sessions.persist(&mut session).await.inspect_err(|err| {
            tracing::error!(user_id = %user_id, error = %err, "Failed to store chat session");
        })?;

        tracing::info!(
            user_id = %user_id,
            session_id = %session.id,
            messages = session.messages.len(),
            "Chat message handled"
        );
        Ok(reply)
    }

    /// The single most recently created session of the user. Older days are
    /// never merged in.
    pub async fn get_history(&self, user_id: Uuid) -> Result<Option<ChatSession>, ChatError> {
        Ok(self.sessions.latest(user_id).await?)
    }

    async fn obtain_reply(&self, user_id: Uuid, session: &ChatSession) -> Result<String, ChatError> {
        let attempt = tokio::time::timeout(self.reply_timeout, self.provider.reply(&session.messages))
            .await
            .unwrap_or(Err(UpstreamError::Timeout(self.reply_timeout)));

        match attempt {
            Ok(reply) => Ok(reply),
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(
                        user_id = %user_id,
                        provider = self.provider.name(),
                        error = %err,
                        "Completion failed, using fallback reply"
                    );
                    Ok(fallback.next().to_string())
                }
                None => {
                    tracing::error!(
                        user_id = %user_id,
                        provider = self.provider.name(),
                        error = %err,
                        "Completion failed"
                    );
                    Err(err.into())
                }
            },
        }
    }
}
