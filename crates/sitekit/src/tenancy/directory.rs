use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::domain::{slugify, NewTenant, Tenant};
use super::host::normalize_domain;
use super::repository::{RepositoryError, TenantDraft, TenantRepository};

/// Partial update applied by administrators.
///
/// `custom_domain` distinguishes "leave as is" (absent) from "clear" (`null`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUpdate {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub custom_domain: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Administrative operations over tenant records.
pub struct TenantDirectory<R> {
    repository: Arc<R>,
}

impl<R> TenantDirectory<R>
where
    R: TenantRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Register a new tenant, deriving the slug from the company name when omitted.
    pub fn register(&self, request: NewTenant) -> Result<Tenant, TenantDirectoryError> {
        let company_name = request.company_name.trim().to_string();
        let slug = match request.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slugify(slug),
            _ => slugify(&company_name),
        };
        if company_name.is_empty() || slug.is_empty() {
            return Err(TenantDirectoryError::InvalidName(request.company_name));
        }

        if self.repository.find_by_slug(&slug)?.is_some() {
            return Err(TenantDirectoryError::SlugTaken(slug));
        }

        let custom_domain = match request.custom_domain {
            Some(raw) => Some(self.claimable_domain(&raw, None)?),
            None => None,
        };

        let draft = TenantDraft {
            slug,
            company_name,
            custom_domain,
            active: request.active,
            plan: request.plan,
            branding: request.branding.unwrap_or_default(),
        };

        let tenant = self.repository.create(draft).map_err(from_storage)?;
        info!(tenant = %tenant.slug, id = tenant.id.0, domain = ?tenant.custom_domain, "tenant registered");
        Ok(tenant)
    }

    pub fn get(&self, slug: &str) -> Result<Tenant, TenantDirectoryError> {
        self.repository
            .find_by_slug(slug)?
            .ok_or_else(|| TenantDirectoryError::NotFound(slug.to_string()))
    }

    /// Apply a domain and/or activation change.
    pub fn update(&self, slug: &str, update: TenantUpdate) -> Result<Tenant, TenantDirectoryError> {
        let mut tenant = self.get(slug)?;

        if let Some(domain) = update.custom_domain {
            tenant.custom_domain = match domain {
                Some(raw) => Some(self.claimable_domain(&raw, Some(&tenant))?),
                None => None,
            };
        }
        if let Some(active) = update.active {
            tenant.active = active;
        }

        self.repository
            .update(tenant.clone())
            .map_err(from_storage)?;
        info!(
            tenant = %tenant.slug,
            domain = ?tenant.custom_domain,
            active = tenant.active,
            "tenant updated"
        );
        Ok(tenant)
    }

    /// Validates and normalizes `raw`, then checks no other tenant owns it.
    fn claimable_domain(
        &self,
        raw: &str,
        owner: Option<&Tenant>,
    ) -> Result<String, TenantDirectoryError> {
        let domain = normalize_domain(raw)
            .ok_or_else(|| TenantDirectoryError::InvalidDomain(raw.to_string()))?;

        match self.repository.find_by_domain(&domain)? {
            Some(existing) if owner.map_or(true, |owner| owner.id != existing.id) => {
                Err(TenantDirectoryError::DomainTaken(domain))
            }
            _ => Ok(domain),
        }
    }
}

fn from_storage(err: RepositoryError) -> TenantDirectoryError {
    match err {
        RepositoryError::Conflict(what) => TenantDirectoryError::Conflict(what),
        other => TenantDirectoryError::Repository(other),
    }
}

/// Error raised by the tenant directory.
#[derive(Debug, thiserror::Error)]
pub enum TenantDirectoryError {
    #[error("'{0}' does not produce a usable company name and slug")]
    InvalidName(String),
    #[error("'{0}' is not a valid domain name")]
    InvalidDomain(String),
    #[error("domain {0} is already claimed by another tenant")]
    DomainTaken(String),
    #[error("slug {0} is already in use")]
    SlugTaken(String),
    #[error("tenant conflicts with an existing record on {0}")]
    Conflict(String),
    #[error("tenant {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
