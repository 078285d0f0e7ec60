use super::domain::{Branding, Plan, Tenant, TenantId};

/// Validated tenant that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDraft {
    pub slug: String,
    pub company_name: String,
    pub custom_domain: Option<String>,
    pub active: bool,
    pub plan: Plan,
    pub branding: Branding,
}

impl TenantDraft {
    pub fn into_tenant(self, id: TenantId) -> Tenant {
        Tenant {
            id,
            slug: self.slug,
            company_name: self.company_name,
            custom_domain: self.custom_domain,
            active: self.active,
            plan: self.plan,
            branding: self.branding,
        }
    }
}

/// Storage abstraction for tenant records.
///
/// Implementations must enforce unique slugs and unique custom domains and report violations
/// as [`RepositoryError::Conflict`]. Domains are passed in normalized form.
pub trait TenantRepository: Send + Sync {
    fn create(&self, draft: TenantDraft) -> Result<Tenant, RepositoryError>;
    fn update(&self, tenant: Tenant) -> Result<(), RepositoryError>;
    fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError>;
    /// The active tenant with the lowest id.
    fn first_active(&self) -> Result<Option<Tenant>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts on {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
