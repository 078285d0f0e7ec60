use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::response::Response;
use serde_json::Value;

use crate::config::TenancyConfig;
use crate::tenancy::domain::{NewTenant, Tenant, TenantId};
use crate::tenancy::repository::{RepositoryError, TenantDraft, TenantRepository};
use crate::tenancy::{TenantDirectory, TenantResolver};

#[derive(Default)]
pub(super) struct MemoryTenantRepository {
    pub(super) tenants: Mutex<Vec<Tenant>>,
}

impl MemoryTenantRepository {
    fn clashes(existing: &Tenant, slug: &str, domain: Option<&str>) -> Option<String> {
        if existing.slug == slug {
            return Some(format!("slug {slug}"));
        }
        match (domain, existing.custom_domain.as_deref()) {
            (Some(domain), Some(other)) if domain == other => Some(format!("domain {domain}")),
            _ => None,
        }
    }
}

impl TenantRepository for MemoryTenantRepository {
    fn create(&self, draft: TenantDraft) -> Result<Tenant, RepositoryError> {
        let mut guard = self.tenants.lock().expect("repository mutex poisoned");
        for existing in guard.iter() {
            if let Some(what) = Self::clashes(existing, &draft.slug, draft.custom_domain.as_deref())
            {
                return Err(RepositoryError::Conflict(what));
            }
        }
        let next = guard.iter().map(|tenant| tenant.id.0).max().unwrap_or(0) + 1;
        let tenant = draft.into_tenant(TenantId(next));
        guard.push(tenant.clone());
        Ok(tenant)
    }

    fn update(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        let mut guard = self.tenants.lock().expect("repository mutex poisoned");
        for existing in guard.iter().filter(|existing| existing.id != tenant.id) {
            if let Some(what) =
                Self::clashes(existing, &tenant.slug, tenant.custom_domain.as_deref())
            {
                return Err(RepositoryError::Conflict(what));
            }
        }
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == tenant.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = tenant;
        Ok(())
    }

    fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .find(|tenant| tenant.custom_domain.as_deref() == Some(domain))
            .cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|tenant| tenant.slug == slug).cloned())
    }

    fn first_active(&self) -> Result<Option<Tenant>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|tenant| tenant.active)
            .min_by_key(|tenant| tenant.id)
            .cloned())
    }
}

pub(super) struct UnavailableRepository;

impl TenantRepository for UnavailableRepository {
    fn create(&self, _draft: TenantDraft) -> Result<Tenant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _tenant: Tenant) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_domain(&self, _domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_slug(&self, _slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn first_active(&self) -> Result<Option<Tenant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn registration(name: &str, domain: Option<&str>) -> NewTenant {
    NewTenant {
        company_name: name.to_string(),
        custom_domain: domain.map(str::to_string),
        active: true,
        ..NewTenant::default()
    }
}

pub(super) fn generic_hosts() -> TenancyConfig {
    TenancyConfig::new(["localhost", "127.0.0.1", "builder.example"])
}

/// Repository seeded with an inactive tenant first so the fallback has to skip it.
pub(super) fn seeded_repository() -> Arc<MemoryTenantRepository> {
    let repository = Arc::new(MemoryTenantRepository::default());
    let directory = TenantDirectory::new(repository.clone());

    let mut dormant = registration("Dormant Works", Some("dormant.example"));
    dormant.active = false;
    directory.register(dormant).expect("dormant tenant registers");
    directory
        .register(registration("Batimart", Some("batimart.example")))
        .expect("batimart registers");
    directory
        .register(registration("Roofing Co", Some("roofing.example")))
        .expect("roofing registers");

    repository
}

pub(super) fn seeded_resolver() -> TenantResolver<MemoryTenantRepository> {
    TenantResolver::new(seeded_repository(), generic_hosts())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}
