use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use solace_core::auth;
use solace_core::error::ApiError;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, is_unique_violation};
use crate::extract::AppJson;
use crate::state::AppState;

pub fn register_router() -> Router<AppState> {
    Router::new().route("/api/auth/register", post(register))
}

pub fn login_router() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

pub fn verify_router() -> Router<AppState> {
    Router::new().route("/api/auth/verify", get(verify))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_premium: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VerifyResponse {
    pub user: UserView,
}

impl From<AuthenticatedUser> for UserView {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.user_id,
            username: user.username,
            email: user.email,
            is_premium: user.is_premium,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_premium: bool,
}

/// Create an account and return a session token
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 409, description = "Username or email already taken", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth::check_registration(&req.username, &req.email, &req.password).map_err(
        |(field, message)| AppError::Validation {
            message,
            field: Some(field.to_string()),
            received: None,
            docs_hint: None,
        },
    )?;

    let username = req.username.trim().to_string();
    let email = auth::normalize_email(&req.email);
    let password_hash = auth::hash_password(&req.password).map_err(AppError::Internal)?;
    let user_id = Uuid::now_v7();

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            return duplicate_account(&e);
        }
        AppError::Database(e)
    })?;

    tracing::info!(user_id = %user_id, "User registered");

    let token = state.jwt.issue(user_id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserView {
                id: user_id,
                username,
                email,
                is_premium: false,
            },
        }),
    ))
}

fn duplicate_account(err: &sqlx::Error) -> AppError {
    let constraint = match err {
        sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or_default().to_string(),
        _ => String::new(),
    };
    let field = if constraint.contains("username") {
        "username"
    } else {
        "email"
    };
    AppError::Conflict {
        message: format!("An account with this {field} already exists"),
        field: Some(field.to_string()),
    }
}

/// Exchange email and password for a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized {
        message: "Invalid email or password".to_string(),
        docs_hint: None,
    };

    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, username, email, password_hash, is_premium FROM users WHERE email = $1",
    )
    .bind(auth::normalize_email(&req.email))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(invalid)?;

    if !auth::verify_password(&req.password, &row.password_hash).map_err(AppError::Internal)? {
        tracing::info!(user_id = %row.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    let token = state.jwt.issue(row.id)?;
    Ok(Json(AuthResponse {
        token,
        user: UserView {
            id: row.id,
            username: row.username,
            email: row.email,
            is_premium: row.is_premium,
        },
    }))
}

/// Check a token and return the account it belongs to
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Token missing, invalid or expired", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn verify(user: AuthenticatedUser) -> Json<VerifyResponse> {
    Json(VerifyResponse { user: user.into() })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_support;

    fn app() -> Router {
        register_router()
            .merge(login_router())
            .merge(verify_router())
            .with_state(test_support::state())
    }

    fn app_with_pool(pool: sqlx::PgPool) -> Router {
        register_router()
            .merge(login_router())
            .merge(verify_router())
            .with_state(test_support::state_with_pool(pool))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn register_rejects_short_password_before_touching_the_database() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"username":"river","email":"river@example.com","password":"short"}"#,
                    ))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["field"], "password");
    }

    #[tokio::test]
    async fn login_with_malformed_body_is_a_validation_error() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"river@example.com"}"#))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "password");
    }

    #[tokio::test]
    async fn verify_returns_the_authenticated_user() {
        let user = test_support::user(true);
        let mut request = Request::builder()
            .uri("/api/auth/verify")
            .body(Body::empty())
            .expect("request should build");
        request.extensions_mut().insert(user.clone());

        let response = app().oneshot(request).await.expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["id"], user.user_id.to_string());
        assert_eq!(body["user"]["isPremium"], true);
    }

    #[tokio::test]
    async fn verify_without_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/verify")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verify_with_forged_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/verify")
                    .header("authorization", "Bearer not.a.jwt")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unauthorized");
    }

    fn register_request(username: &str, email: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/register")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": "long-enough-secret",
                })
                .to_string(),
            ))
            .expect("request should build")
    }

    #[tokio::test]
    async fn duplicate_email_registration_is_a_conflict() {
        let Some(pool) = test_support::db_pool_if_available().await else {
            return;
        };
        let app = register_router().with_state(test_support::state_with_pool(pool));
        let suffix = Uuid::now_v7().simple().to_string();
        let email = format!("dup-{suffix}@example.com");

        let first = app
            .clone()
            .oneshot(register_request(&format!("a{}", &suffix[..20]), &email))
            .await
            .expect("request should succeed");
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(register_request(&format!("b{}", &suffix[..20]), &email.to_uppercase()))
            .await
            .expect("request should succeed");
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = body_json(second).await;
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["field"], "email");
    }

    #[tokio::test]
    async fn registered_user_can_log_in_and_verify() {
        let Some(pool) = test_support::db_pool_if_available().await else {
            return;
        };
        let app = app_with_pool(pool);
        let suffix = Uuid::now_v7().simple().to_string();
        let email = format!("login-{suffix}@example.com");

        app.clone()
            .oneshot(register_request(&format!("u{}", &suffix[..20]), &email))
            .await
            .expect("request should succeed");

        let login = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "email": email, "password": "long-enough-secret" })
                            .to_string(),
                    ))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(login.status(), StatusCode::OK);
        let token = body_json(login).await["token"]
            .as_str()
            .expect("token is a string")
            .to_string();

        let verify = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/verify")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(verify.status(), StatusCode::OK);
        assert_eq!(body_json(verify).await["user"]["email"], email);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let Some(pool) = test_support::db_pool_if_available().await else {
            return;
        };
        let app = app_with_pool(pool);
        let suffix = Uuid::now_v7().simple().to_string();
        let email = format!("wrong-{suffix}@example.com");

        app.clone()
            .oneshot(register_request(&format!("w{}", &suffix[..20]), &email))
            .await
            .expect("request should succeed");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "email": email, "password": "not-the-password" })
                            .to_string(),
                    ))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid email or password");
    }
}
