use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;

use super::directory::{TenantDirectory, TenantDirectoryError, TenantUpdate};
use super::domain::NewTenant;
use super::middleware::CurrentTenant;
use super::repository::TenantRepository;

/// Router builder exposing the current site and tenant administration endpoints.
pub fn tenant_router<R>(directory: Arc<TenantDirectory<R>>) -> Router
where
    R: TenantRepository + 'static,
{
    Router::new()
        .route("/api/v1/site", get(current_site_handler))
        .route("/api/v1/tenants", post(register_handler::<R>))
        .route(
            "/api/v1/tenants/:slug",
            get(tenant_handler::<R>).patch(update_handler::<R>),
        )
        .with_state(directory)
}

pub(crate) async fn current_site_handler(
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> Response {
    match tenant {
        Some(tenant) => (StatusCode::OK, Json(tenant.view())).into_response(),
        None => {
            let payload = json!({ "error": "no site is configured for this host" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn register_handler<R>(
    State(directory): State<Arc<TenantDirectory<R>>>,
    Json(request): Json<NewTenant>,
) -> Response
where
    R: TenantRepository + 'static,
{
    match directory.register(request) {
        Ok(tenant) => (StatusCode::CREATED, Json(tenant.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn tenant_handler<R>(
    State(directory): State<Arc<TenantDirectory<R>>>,
    Path(slug): Path<String>,
) -> Response
where
    R: TenantRepository + 'static,
{
    match directory.get(&slug) {
        Ok(tenant) => (StatusCode::OK, Json(tenant.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R>(
    State(directory): State<Arc<TenantDirectory<R>>>,
    Path(slug): Path<String>,
    Json(update): Json<TenantUpdate>,
) -> Response
where
    R: TenantRepository + 'static,
{
    match directory.update(&slug, update) {
        Ok(tenant) => (StatusCode::OK, Json(tenant.view())).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: TenantDirectoryError) -> Response {
    let status = match &err {
        TenantDirectoryError::InvalidName(_) | TenantDirectoryError::InvalidDomain(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TenantDirectoryError::DomainTaken(_)
        | TenantDirectoryError::SlugTaken(_)
        | TenantDirectoryError::Conflict(_) => StatusCode::CONFLICT,
        TenantDirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
        TenantDirectoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
