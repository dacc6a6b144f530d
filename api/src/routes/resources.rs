use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};

use solace_core::error::ApiError;
use solace_core::resources::{self, AccessError, Resource, ResourceKind};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/resources", get(list_resources))
        .route("/api/resources/{id}", get(get_resource))
        .route("/api/resources/category/{category}", get(list_by_category))
}

/// Resources visible to the caller
///
/// Premium entries are only listed for premium accounts.
#[utoipa::path(
    get,
    path = "/api/resources",
    responses(
        (status = 200, description = "Visible resources", body = Vec<Resource>),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn list_resources(user: AuthenticatedUser) -> Json<Vec<&'static Resource>> {
    Json(resources::visible(user.is_premium))
}

#[utoipa::path(
    get,
    path = "/api/resources/{id}",
    params(("id" = u32, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "The resource", body = Resource),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Premium subscription required", body = ApiError),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn get_resource(
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<&'static Resource>, AppError> {
    let not_found = || AppError::NotFound {
        resource: format!("Resource {id}"),
    };
    let numeric: u32 = id.trim().parse().map_err(|_| not_found())?;

    match resources::access(numeric, user.is_premium) {
        Ok(resource) => Ok(Json(resource)),
        Err(AccessError::NotFound(_)) => Err(not_found()),
        Err(AccessError::PremiumRequired) => Err(AppError::Forbidden {
            message: "Premium subscription required".to_string(),
            docs_hint: None,
        }),
    }
}

#[utoipa::path(
    get,
    path = "/api/resources/category/{category}",
    params(("category" = String, Path, description = "Resource type: article or audio")),
    responses(
        (status = 200, description = "Visible resources of the category", body = Vec<Resource>),
        (status = 400, description = "Unknown category", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn list_by_category(
    user: AuthenticatedUser,
    Path(category): Path<String>,
) -> Result<Json<Vec<&'static Resource>>, AppError> {
    let kind = ResourceKind::parse(&category).ok_or_else(|| AppError::Validation {
        message: format!("Unknown resource category '{category}'"),
        field: Some("category".to_string()),
        received: Some(serde_json::Value::String(category.clone())),
        docs_hint: Some("Use 'article' or 'audio'.".to_string()),
    })?;
    Ok(Json(resources::visible_of_kind(kind, user.is_premium)))
}
