use std::sync::Arc;

use solace_core::chat::DayClock;
use solace_core::fallback::FallbackResponder;
use sqlx::PgPool;

use crate::auth::JwtKeys;
use crate::chat::{
    ChatOrchestrator, OpenAiReplies, PgSessionStore, ReplyProvider, RotatingReplies,
    SessionAggregator, SessionStore, UpstreamError,
};
use crate::config::{AppConfig, CompletionProvider};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub chat: Arc<ChatOrchestrator>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn from_config(db: PgPool, config: &AppConfig) -> Result<Self, UpstreamError> {
        let store: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db.clone()));
        Self::with_store(db, store, config)
    }

    /// Wire the chat stack on top of an arbitrary session store.
    pub fn with_store(
        db: PgPool,
        store: Arc<dyn SessionStore>,
        config: &AppConfig,
    ) -> Result<Self, UpstreamError> {
        let sessions = SessionAggregator::new(store, DayClock::new(config.day_timezone));

        // One rotation per process, shared by the primary provider and the fallback path.
        let rotation = RotatingReplies::new(Arc::new(FallbackResponder::new()));
        let completion = &config.completion;
        let (provider, fallback): (Arc<dyn ReplyProvider>, Option<RotatingReplies>) =
            match (completion.provider, &completion.openai) {
                (CompletionProvider::OpenAi, Some(openai)) => (
                    Arc::new(OpenAiReplies::new(openai.clone(), completion.timeout)?),
                    completion.fallback_on_error.then_some(rotation),
                ),
                _ => (Arc::new(rotation), None),
            };
        tracing::info!(
            provider = provider.name(),
            fallback = fallback.is_some(),
            day_timezone = %config.day_timezone,
            "Chat replies configured"
        );

        Ok(Self {
            db,
            chat: Arc::new(ChatOrchestrator::new(
                sessions,
                provider,
                fallback,
                completion.timeout,
            )),
            jwt: Arc::new(JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours)),
        })
    }
}
