use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::middleware::{AuthenticatedUser, SessionActivity};
use super::store::{SessionStore, UserId};
use crate::config::login_route;

pub const LOGOUT_PATH: &str = "/accounts/logout/";
pub const WHOAMI_PATH: &str = "/accounts/me";

/// Body accepted by the login endpoint. Credential checks happen upstream.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    #[serde(default)]
    pub session_expired: Option<String>,
}

/// Router builder for the session lifecycle endpoints; the login page lives at `login_path`.
pub fn account_router<S>(activity: Arc<SessionActivity<S>>, login_path: &str) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route(login_route(login_path), get(login_page_handler).post(login_handler::<S>))
        .route(LOGOUT_PATH, post(logout_handler::<S>))
        .route(WHOAMI_PATH, get(whoami_handler))
        .with_state(activity)
}

pub(crate) async fn login_page_handler(Query(query): Query<LoginPageQuery>) -> Response {
    let expired = query
        .session_expired
        .as_deref()
        .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));

    let mut payload = json!({ "session_expired": expired });
    if expired {
        payload["message"] = json!("Your session expired after a period of inactivity. Please sign in again.");
    }
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn login_handler<S>(
    State(activity): State<Arc<SessionActivity<S>>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        let payload = json!({ "error": "user_id must not be empty" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    if let Some(previous) = activity.session_key(&jar) {
        if let Err(err) = activity.close(&previous) {
            warn!(session = %previous, error = %err, "failed to discard previous session at login");
        }
    }

    match activity.open(UserId(user_id.to_string()), Utc::now()) {
        Ok(key) => {
            info!(user = user_id, "session opened");
            (
                StatusCode::OK,
                jar.add(activity.session_cookie(&key)),
                Json(json!({ "user_id": user_id })),
            )
                .into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn logout_handler<S>(
    State(activity): State<Arc<SessionActivity<S>>>,
    jar: CookieJar,
) -> Response
where
    S: SessionStore + 'static,
{
    if let Some(key) = activity.session_key(&jar) {
        if let Err(err) = activity.close(&key) {
            let payload = json!({ "error": err.to_string() });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
        info!(session = %key, "session closed");
    }

    (StatusCode::NO_CONTENT, jar.add(activity.cleared_cookie())).into_response()
}

pub(crate) async fn whoami_handler(user: Option<Extension<AuthenticatedUser>>) -> Response {
    match user {
        Some(Extension(user)) => {
            (StatusCode::OK, Json(json!({ "user_id": user.user_id.0 }))).into_response()
        }
        None => {
            let payload = json!({ "error": "authentication required" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
    }
}
