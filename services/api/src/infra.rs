use metrics_exporter_prometheus::PrometheusHandle;
use sitekit::sessions::{SessionData, SessionKey, SessionStore, SessionStoreError};
use sitekit::tenancy::{
    NewTenant, Plan, RepositoryError, Tenant, TenantDirectory, TenantDirectoryError, TenantDraft,
    TenantId, TenantRepository,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTenantRepository {
    tenants: Arc<Mutex<Vec<Tenant>>>,
}

impl InMemoryTenantRepository {
    fn conflict(existing: &Tenant, slug: &str, domain: Option<&str>) -> Option<String> {
        if existing.slug == slug {
            return Some(format!("slug {slug}"));
        }
        match (domain, existing.custom_domain.as_deref()) {
            (Some(domain), Some(claimed)) if domain == claimed => {
                Some(format!("domain {domain}"))
            }
            _ => None,
        }
    }
}

impl TenantRepository for InMemoryTenantRepository {
    fn create(&self, draft: TenantDraft) -> Result<Tenant, RepositoryError> {
        let mut guard = self.tenants.lock().expect("repository mutex poisoned");
        if let Some(what) = guard
            .iter()
            .find_map(|existing| Self::conflict(existing, &draft.slug, draft.custom_domain.as_deref()))
        {
            return Err(RepositoryError::Conflict(what));
        }
        let next_id = guard.iter().map(|tenant| tenant.id.0).max().unwrap_or(0) + 1;
        let tenant = draft.into_tenant(TenantId(next_id));
        guard.push(tenant.clone());
        Ok(tenant)
    }

    fn update(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        let mut guard = self.tenants.lock().expect("repository mutex poisoned");
        if let Some(what) = guard
            .iter()
            .filter(|existing| existing.id != tenant.id)
            .find_map(|existing| {
                Self::conflict(existing, &tenant.slug, tenant.custom_domain.as_deref())
            })
        {
            return Err(RepositoryError::Conflict(what));
        }
        match guard.iter_mut().find(|existing| existing.id == tenant.id) {
            Some(slot) => {
                *slot = tenant;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
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

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionKey, SessionData>>>,
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &SessionKey, data: SessionData) -> Result<(), SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(key.clone(), data);
        Ok(())
    }

    fn update(&self, key: &SessionKey, data: SessionData) -> Result<bool, SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        match guard.get_mut(key) {
            Some(slot) => {
                *slot = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.remove(key);
        Ok(())
    }
}

/// Sample site owners used by `--seed-demo` and the console demo.
pub(crate) fn seed_demo_tenants<R>(directory: &TenantDirectory<R>) -> Result<Vec<Tenant>, TenantDirectoryError>
where
    R: TenantRepository + 'static,
{
    let samples = [
        ("Batimart Pro", Some("batimart.example"), Plan::Enterprise, true),
        ("Toitures Lemoine", Some("toitures-lemoine.example"), Plan::Premium, true),
        ("Atelier Dormant", Some("atelier-dormant.example"), Plan::Basic, false),
        ("Plomberie Martin", None, Plan::Basic, true),
    ];

    samples
        .into_iter()
        .map(|(name, domain, plan, active)| {
            directory.register(NewTenant {
                company_name: name.to_string(),
                custom_domain: domain.map(str::to_string),
                active,
                plan,
                ..NewTenant::default()
            })
        })
        .collect()
}
