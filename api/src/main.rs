use std::net::SocketAddr;

use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod auth;
mod chat;
mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Solace API",
        version = "0.1.0",
        description = "Supportive chat with daily sessions, plus a small catalog of self-help resources."
    ),
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::auth::verify,
        routes::chat::send_message,
        routes::chat::get_history,
        routes::resources::list_resources,
        routes::resources::get_resource,
        routes::resources::list_by_category,
    ),
    components(schemas(
        HealthResponse,
        solace_core::error::ApiError,
        solace_core::chat::Role,
        solace_core::chat::Sentiment,
        solace_core::chat::Message,
        solace_core::chat::ChatSession,
        solace_core::chat::SendMessageRequest,
        solace_core::chat::SendMessageResponse,
        solace_core::resources::Resource,
        solace_core::resources::ResourceKind,
        routes::auth::RegisterRequest,
        routes::auth::LoginRequest,
        routes::auth::UserView,
        routes::auth::AuthResponse,
        routes::auth::VerifyResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solace_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let app_state =
        state::AppState::from_config(pool, &config).expect("Failed to set up chat replies");

    let cors_layer = middleware::cors::build_cors_layer(&config.cors_origins);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::auth::register_router().layer(middleware::rate_limit::register_layer()))
        .merge(routes::auth::login_router().layer(middleware::rate_limit::login_layer()))
        .merge(routes::auth::verify_router().layer(middleware::rate_limit::read_layer()))
        .merge(routes::chat::send_router().layer(middleware::rate_limit::chat_layer()))
        .merge(routes::chat::history_router().layer(middleware::rate_limit::read_layer()))
        .merge(routes::resources::router().layer(middleware::rate_limit::read_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Solace API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
