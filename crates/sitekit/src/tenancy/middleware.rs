use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;

use super::domain::Tenant;
use super::host::request_host;
use super::repository::TenantRepository;
use super::resolver::{Resolution, TenantResolver};

/// Request extension carrying the resolved tenant, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentTenant(pub Option<Tenant>);

/// Middleware attaching [`CurrentTenant`] to every request.
pub async fn resolve_tenant<R>(
    State(resolver): State<Arc<TenantResolver<R>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: TenantRepository + 'static,
{
    let resolution = match request_host(&request) {
        Some(host) => resolver.resolution(&host),
        None => Resolution::NotAllowed,
    };
    request
        .extensions_mut()
        .insert(CurrentTenant(resolution.into_tenant()));
    next.run(request).await
}

/// Wraps `router` so every route sees a [`CurrentTenant`] extension.
pub fn with_tenant_resolution<R>(router: Router, resolver: Arc<TenantResolver<R>>) -> Router
where
    R: TenantRepository + 'static,
{
    router.layer(middleware::from_fn_with_state(resolver, resolve_tenant::<R>))
}
