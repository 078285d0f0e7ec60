use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::Tenant;
use super::host::normalize_host;
use super::repository::{RepositoryError, TenantRepository};
use crate::config::TenancyConfig;

/// Which branch of host resolution produced the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An active tenant owns the host as its custom domain.
    Matched(Tenant),
    /// The host is a generic host; the lowest-id active tenant stands in.
    Fallback(Tenant),
    /// The host is neither a custom domain nor allow-listed.
    NotAllowed,
    /// The host is allow-listed but no tenant is active.
    NoActiveTenant,
    /// Storage failed during lookup.
    Unavailable,
}

impl Resolution {
    pub fn tenant(&self) -> Option<&Tenant> {
        match self {
            Resolution::Matched(tenant) | Resolution::Fallback(tenant) => Some(tenant),
            Resolution::NotAllowed | Resolution::NoActiveTenant | Resolution::Unavailable => None,
        }
    }

    pub fn into_tenant(self) -> Option<Tenant> {
        match self {
            Resolution::Matched(tenant) | Resolution::Fallback(tenant) => Some(tenant),
            Resolution::NotAllowed | Resolution::NoActiveTenant | Resolution::Unavailable => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Matched(_) => "matched",
            Resolution::Fallback(_) => "fallback",
            Resolution::NotAllowed => "not_allowed",
            Resolution::NoActiveTenant => "no_active_tenant",
            Resolution::Unavailable => "unavailable",
        }
    }
}

/// Maps request hosts to tenants. Never fails: every error degrades to "no tenant".
pub struct TenantResolver<R> {
    repository: Arc<R>,
    config: TenancyConfig,
}

impl<R> TenantResolver<R>
where
    R: TenantRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: TenancyConfig) -> Self {
        Self { repository, config }
    }

    /// Convenience wrapper over [`Self::resolution`].
    pub fn resolve(&self, host: &str) -> Option<Tenant> {
        self.resolution(host).into_tenant()
    }

    pub fn resolution(&self, host: &str) -> Resolution {
        let Some(host) = normalize_host(host) else {
            debug!("request carried no usable host");
            return Resolution::NotAllowed;
        };

        match self.repository.find_by_domain(&host) {
            Ok(Some(tenant)) if tenant.active => {
                debug!(%host, tenant = %tenant.slug, "custom domain matched");
                return Resolution::Matched(tenant);
            }
            Ok(Some(tenant)) => {
                info!(%host, tenant = %tenant.slug, "custom domain belongs to an inactive tenant");
            }
            Ok(None) => {}
            Err(err) => return unavailable(&host, err),
        }

        if !self.config.is_generic(&host) {
            info!(%host, "host is not allow-listed and matches no custom domain");
            return Resolution::NotAllowed;
        }

        match self.repository.first_active() {
            Ok(Some(tenant)) => {
                info!(%host, tenant = %tenant.slug, "falling back to default tenant for generic host");
                Resolution::Fallback(tenant)
            }
            Ok(None) => {
                warn!(%host, "generic host requested but no tenant is active");
                Resolution::NoActiveTenant
            }
            Err(err) => unavailable(&host, err),
        }
    }
}

fn unavailable(host: &str, err: RepositoryError) -> Resolution {
    warn!(%host, error = %err, "tenant lookup failed; continuing without tenant");
    Resolution::Unavailable
}
