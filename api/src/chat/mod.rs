//! Daily chat sessions: storage, aggregation, reply strategies and the
//! orchestrator that ties them together for one inbound message.

pub mod aggregator;
pub mod error;
pub mod orchestrator;
pub mod reply;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use aggregator::SessionAggregator;
pub use error::{ChatError, StoreError, UpstreamError};
pub use orchestrator::ChatOrchestrator;
pub use reply::{OpenAiReplies, ReplyProvider, RotatingReplies};
pub use store::{PgSessionStore, SessionStore};
