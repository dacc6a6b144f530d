use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use solace_core::chat::{ChatSession, Message, SessionKey, Sentiment};
use sqlx::types::Json;
use uuid::Uuid;

use super::error::StoreError;

/// Durable storage for daily chat sessions.
///
/// Implementations must keep at most one session per [`SessionKey`], and
/// `append` must be atomic: either every unsaved message of the session is
/// stored or none is.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The session for this user and day, if one was stored.
    async fn find(&self, key: SessionKey) -> Result<Option<ChatSession>, StoreError>;

    /// Store the session's unsaved messages in one write, creating the day's
    /// session if it does not exist yet. Returns the session as stored.
    async fn append(&self, session: &ChatSession) -> Result<ChatSession, StoreError>;

    /// The most recently created session of the user, whatever its day.
    async fn latest(&self, user_id: Uuid) -> Result<Option<ChatSession>, StoreError>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    pool: sqlx::PgPool,
}

impl PgSessionStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, day_bucket, messages, sentiment, tags, created_at, updated_at";

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find(&self, key: SessionKey) -> Result<Option<ChatSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE user_id = $1 AND day_bucket = $2"
        ))
        .bind(key.user_id)
        .bind(key.day)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    async fn append(&self, session: &ChatSession) -> Result<ChatSession, StoreError> {
        // One statement: concurrent first messages of the day for the same
        // user collapse into a single row via the (user_id, day_bucket) key.
        // chat_append_messages clamps merged timestamps to the stored tail.
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            INSERT INTO chat_sessions ({SESSION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, day_bucket) DO UPDATE
            SET messages = chat_append_messages(chat_sessions.messages, EXCLUDED.messages),
                updated_at = GREATEST(chat_sessions.updated_at, EXCLUDED.updated_at)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.day)
        .bind(Json(session.unsaved()))
        .bind(session.sentiment.as_str())
        .bind(&session.tags)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_session()
    }

    async fn latest(&self, user_id: Uuid) -> Result<Option<ChatSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    day_bucket: NaiveDate,
    messages: Json<Vec<Message>>,
    sentiment: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Result<ChatSession, StoreError> {
        let sentiment = Sentiment::parse(&self.sentiment).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "session {} has unknown sentiment '{}'",
                self.id, self.sentiment
            ))
        })?;

        let mut session = ChatSession::open(self.user_id, self.day_bucket, self.created_at);
        session.id = self.id;
        session.messages = self.messages.0;
        session.sentiment = sentiment;
        session.tags = self.tags;
        session.updated_at = self.updated_at;
        session.mark_persisted();
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use solace_core::chat::Role;

    use super::*;
    use crate::state::test_support;

    fn row(sentiment: &str) -> SessionRow {
        let created = Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap();
        SessionRow {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            day_bucket: created.date_naive(),
            messages: Json(vec![Message {
                role: Role::User,
                content: "hello".to_string(),
                timestamp: created,
            }]),
            sentiment: sentiment.to_string(),
            tags: vec!["sleep".to_string()],
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn stored_rows_load_as_persisted_sessions() {
        let session = row("negative").into_session().unwrap();
        assert_eq!(session.sentiment, Sentiment::Negative);
        assert_eq!(session.messages.len(), 1);
        assert!(session.unsaved().is_empty());
    }

    #[test]
    fn unknown_sentiment_is_reported_as_corrupt() {
        let err = row("furious").into_session().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    fn draft(user_id: Uuid, at: DateTime<Utc>, label: &str) -> ChatSession {
        let mut session = ChatSession::open(user_id, at.date_naive(), at);
        session.push(Role::User, format!("{label} user"), at);
        session.push(Role::Assistant, format!("{label} reply"), at);
        session
    }

    #[tokio::test]
    async fn concurrent_first_messages_share_one_session() {
        let Some(pool) = test_support::db_pool_if_available().await else {
            return;
        };
        let store = PgSessionStore::new(pool.clone());
        let user_id = test_support::insert_user(&pool).await;
        let now = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                let session = draft(user_id, now + chrono::Duration::milliseconds(n), &n.to_string());
                tokio::spawn(async move { store.append(&session).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("task should join").expect("append should succeed");
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .expect("count rows");
        assert_eq!(rows, 1);

        let stored = store
            .find(SessionKey {
                user_id,
                day: now.date_naive(),
            })
            .await
            .expect("find should succeed")
            .expect("session should exist");
        assert_eq!(stored.messages.len(), 16);
        for pair in stored.messages.chunks(2) {
            let label = pair[0]
                .content
                .strip_suffix(" user")
                .expect("pairs start with the user message");
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].content, format!("{label} reply"));
        }
        assert!(
            stored
                .messages
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
        );
    }

    #[tokio::test]
    async fn merged_append_clamps_older_timestamps() {
        let Some(pool) = test_support::db_pool_if_available().await else {
            return;
        };
        let store = PgSessionStore::new(pool.clone());
        let user_id = test_support::insert_user(&pool).await;
        let now = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();

        store
            .append(&draft(user_id, now, "late"))
            .await
            .expect("first append");
        let merged = store
            .append(&draft(user_id, now - chrono::Duration::seconds(2), "early"))
            .await
            .expect("second append");

        assert_eq!(merged.messages.len(), 4);
        assert_eq!(merged.messages[2].content, "early user");
        assert!(
            merged
                .messages
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
        );
    }

    #[tokio::test]
    async fn latest_ignores_earlier_days_and_find_matches_the_day() {
        let Some(pool) = test_support::db_pool_if_available().await else {
            return;
        };
        let store = PgSessionStore::new(pool.clone());
        let user_id = test_support::insert_user(&pool).await;
        let today = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();
        let yesterday = today - chrono::Duration::days(1);

        store
            .append(&draft(user_id, yesterday, "yesterday"))
            .await
            .expect("append yesterday");
        store
            .append(&draft(user_id, today, "today"))
            .await
            .expect("append today");

        let latest = store
            .latest(user_id)
            .await
            .expect("latest should succeed")
            .expect("a session exists");
        assert_eq!(latest.day, today.date_naive());
        assert_eq!(latest.messages[0].content, "today user");

        let earlier = store
            .find(SessionKey {
                user_id,
                day: yesterday.date_naive(),
            })
            .await
            .expect("find should succeed")
            .expect("yesterday's session exists");
        assert_eq!(earlier.messages.len(), 2);
        assert_eq!(earlier.messages[0].content, "yesterday user");
    }
}
