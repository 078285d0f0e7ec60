use crate::cli::ServeArgs;
use crate::infra::{seed_demo_tenants, AppState, InMemorySessionStore, InMemoryTenantRepository};
use crate::routes::{with_site_routes, SiteServices};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sitekit::config::AppConfig;
use sitekit::error::AppError;
use sitekit::sessions::SessionActivity;
use sitekit::telemetry;
use sitekit::tenancy::{TenantDirectory, TenantResolver};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryTenantRepository::default());
    let directory = TenantDirectory::new(repository.clone());
    if args.seed_demo {
        match seed_demo_tenants(&directory) {
            Ok(tenants) => info!(count = tenants.len(), "seeded demo tenants"),
            Err(err) => warn!(error = %err, "demo tenants could not be seeded"),
        }
    }

    let services = SiteServices {
        directory: Arc::new(directory),
        resolver: Arc::new(TenantResolver::new(repository, config.tenancy.clone())),
        activity: Arc::new(SessionActivity::new(
            Arc::new(InMemorySessionStore::default()),
            &config.session,
        )),
        login_path: config.session.login_path.clone(),
    };

    let app = with_site_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        generic_hosts = ?config.tenancy.generic_hosts,
        idle_timeout_seconds = config.session.idle_timeout.num_seconds(),
        "site pipeline ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
