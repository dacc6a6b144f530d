use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who wrote a message. Only the two conversation participants exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Classification tag stored on a session. Never computed by the chat flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

/// One entry in a session's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Assigned by the server at append time, never client-supplied
    pub timestamp: DateTime<Utc>,
}

/// Identity of a daily session: one per user per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: Uuid,
    pub day: NaiveDate,
}

/// The single daily log of messages exchanged with one user.
///
/// Messages appended since the last successful persist are tracked so a
/// store can write exactly those entries, and so they can be dropped again
/// when the write fails.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    /// Owning user
    #[serde(rename = "user")]
    pub user_id: Uuid,
    /// Calendar day (in the configured day-boundary timezone) the session belongs to
    pub day: NaiveDate,
    pub messages: Vec<Message>,
    pub sentiment: Sentiment,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    persisted_len: usize,
}

impl ChatSession {
    /// A new, empty, not yet stored session.
    pub fn open(user_id: Uuid, day: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            day,
            messages: Vec::new(),
            sentiment: Sentiment::default(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            persisted_len: 0,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey {
            user_id: self.user_id,
            day: self.day,
        }
    }

    /// Append a message. The timestamp never goes backwards within a session,
    /// even if the wall clock does.
    pub fn push(&mut self, role: Role, content: impl Into<String>, now: DateTime<Utc>) -> &Message {
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp,
        });
        self.updated_at = timestamp;
        &self.messages[self.messages.len() - 1]
    }

    /// Messages appended since the session was loaded or last persisted.
    pub fn unsaved(&self) -> &[Message] {
        &self.messages[self.persisted_len..]
    }

    /// Record that everything currently in the log is stored.
    pub fn mark_persisted(&mut self) {
        self.persisted_len = self.messages.len();
    }

    /// Drop the appends a failed write could not store.
    pub fn discard_unsaved(&mut self) {
        self.messages.truncate(self.persisted_len);
    }
}

/// Maps instants to the calendar day used for session bucketing.
///
/// A day is the half-open interval from local midnight to the next local
/// midnight in `tz`.
#[derive(Debug, Clone, Copy)]
pub struct DayClock {
    tz: Tz,
}

impl DayClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }
}

impl Default for DayClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// Request body for POST /api/chat
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// What the user wrote
    pub message: String,
}

/// Response for POST /api/chat
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    /// The assistant's reply
    pub message: String,
}
