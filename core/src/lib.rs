pub mod auth;
pub mod chat;
pub mod error;
pub mod fallback;
pub mod resources;
