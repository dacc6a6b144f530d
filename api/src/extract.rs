//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! Use `AppJson<T>` instead of `axum::Json<T>` in handler signatures so a
//! malformed body yields a JSON 400 instead of axum's plain-text 422.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field = backticked_after(&body_text, "missing field `")
        .or_else(|| backticked_after(&body_text, "unknown field `"))
        .unwrap_or_else(|| "body".to_string());

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field),
        received: None,
        docs_hint: Some("Send a JSON object matching the endpoint schema (see /swagger-ui).".to_string()),
    }
}

/// `missing field `message`` → `message`
fn backticked_after(msg: &str, marker: &str) -> Option<String> {
    let start = msg.find(marker)? + marker.len();
    let rest = &msg[start..];
    rest.find('`').map(|end| rest[..end].to_string())
}
