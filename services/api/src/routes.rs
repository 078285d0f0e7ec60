use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use sitekit::sessions::{account_router, with_session_tracking, SessionActivity, SessionStore};
use sitekit::tenancy::{tenant_router, with_tenant_resolution, TenantDirectory, TenantRepository, TenantResolver};
use std::sync::Arc;

/// Services the HTTP surface is assembled from.
pub(crate) struct SiteServices<R, S> {
    pub(crate) directory: Arc<TenantDirectory<R>>,
    pub(crate) resolver: Arc<TenantResolver<R>>,
    pub(crate) activity: Arc<SessionActivity<S>>,
    pub(crate) login_path: String,
}

/// Full router: site and account routes behind tenant resolution and idle-session tracking,
/// plus the operational endpoints.
pub(crate) fn with_site_routes<R, S>(services: SiteServices<R, S>) -> axum::Router
where
    R: TenantRepository + 'static,
    S: SessionStore + 'static,
{
    let SiteServices {
        directory,
        resolver,
        activity,
        login_path,
    } = services;

    let site = tenant_router(directory).merge(account_router(activity.clone(), &login_path));
    let site = with_tenant_resolution(with_session_tracking(site, activity), resolver);

    site.route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seed_demo_tenants, InMemorySessionStore, InMemoryTenantRepository};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use sitekit::config::{SessionConfig, TenancyConfig};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let repository = Arc::new(InMemoryTenantRepository::default());
        let directory = TenantDirectory::new(repository.clone());
        seed_demo_tenants(&directory).expect("demo tenants register");

        let session_config = SessionConfig::default();
        let services = SiteServices {
            directory: Arc::new(directory),
            resolver: Arc::new(TenantResolver::new(
                repository,
                TenancyConfig::new(["localhost", "127.0.0.1"]),
            )),
            activity: Arc::new(SessionActivity::new(
                Arc::new(InMemorySessionStore::default()),
                &session_config,
            )),
            login_path: session_config.login_path.clone(),
        };

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        state.readiness.store(ready, Ordering::Release);

        with_site_routes(services).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_site_resolves_by_domain_and_fallback() {
        let app = app(true);

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/site")
                    .header(header::HOST, "toitures-lemoine.example")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["plan"], "Premium");

        let response = app
            .oneshot(
                Request::get("/api/v1/site")
                    .header(header::HOST, "127.0.0.1:3000")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["slug"], "batimart-pro");
    }

    #[tokio::test]
    async fn login_then_whoami_round_trip() {
        let app = app(true);

        let response = app
            .clone()
            .oneshot(
                Request::post("/accounts/login/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"user_id":"staff@batimart.example"}"#))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .expect("session cookie")
            .to_string();

        let response = app
            .oneshot(
                Request::get("/accounts/me")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["user_id"], "staff@batimart.example");
    }
}
