use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use solace_core::chat::{ChatSession, SendMessageRequest, SendMessageResponse};
use solace_core::error::ApiError;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn send_router() -> Router<AppState> {
    Router::new().route("/api/chat", post(send_message))
}

pub fn history_router() -> Router<AppState> {
    Router::new().route("/api/chat/history", get(get_history))
}

/// Send a message and receive the assistant's reply
///
/// The message and the reply are appended to today's session in one write.
/// Only the reply is returned; use the history endpoint for the transcript.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Reply generated and stored", body = SendMessageResponse),
        (status = 400, description = "Empty message", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Session could not be stored", body = ApiError),
        (status = 502, description = "Completion service failed and fallback is disabled", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(req): AppJson<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    tracing::debug!(user_id = %user.user_id, "Processing chat message");
    let reply = state
        .chat
        .handle_user_message(user.user_id, &req.message)
        .await?;
    Ok(Json(SendMessageResponse { message: reply }))
}

/// Latest chat session
///
/// Returns an array holding the user's most recently created session, or an
/// empty array. Earlier sessions are not included.
#[utoipa::path(
    get,
    path = "/api/chat/history",
    responses(
        (status = 200, description = "Zero or one session", body = Vec<ChatSession>),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Sessions could not be read", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat"
)]
pub async fn get_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ChatSession>>, AppError> {
    let latest = state.chat.get_history(user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, found = latest.is_some(), "Fetched chat history");
    Ok(Json(latest.into_iter().collect()))
}
