use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// The token is verified first; the user row is then loaded so premium
/// status is always current.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_premium: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for session tokens (HS256).
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::Unauthorized {
                    message: "Token is invalid or expired".to_string(),
                    docs_hint: Some(
                        "Log in again via POST /api/auth/login to obtain a fresh token."
                            .to_string(),
                    ),
                }
            })
    }
}

/// Pull the token out of an `Authorization` header value.
fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.ok_or_else(|| AppError::Unauthorized {
        message: "No authentication token, access denied".to_string(),
        docs_hint: Some("Include 'Authorization: Bearer <token>' header.".to_string()),
    })?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must use Bearer scheme".to_string(),
            docs_hint: Some("Format: 'Authorization: Bearer <token>'".to_string()),
        })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by an earlier extraction in the same request; route tests also
        // seed it directly instead of minting tokens.
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;
        let claims = state.jwt.verify(token)?;

        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, is_premium FROM users WHERE id = $1",
        )
        .bind(claims.sub)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "User not found".to_string(),
            docs_hint: None,
        })?;

        let user = AuthenticatedUser {
            user_id: row.id,
            username: row.username,
            email: row.email,
            is_premium: row.is_premium,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    is_premium: bool,
}
