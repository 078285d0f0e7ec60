//! Host-based tenant resolution and the administrative surface around tenant records.
//!
//! The resolver looks up the request host as a custom domain first. Hosts on the configured
//! generic allow-list fall back to the lowest-id active tenant; anything else proceeds with no
//! tenant and downstream handlers decide whether that is a 404.

pub mod directory;
pub mod domain;
pub mod host;
pub mod middleware;
pub mod repository;
pub mod resolver;
pub mod router;

#[cfg(test)]
mod tests;

pub use directory::{TenantDirectory, TenantDirectoryError, TenantUpdate};
pub use domain::{slugify, Branding, NewTenant, Plan, Tenant, TenantId, TenantView};
pub use host::{normalize_domain, normalize_host, request_host};
pub use middleware::{resolve_tenant, with_tenant_resolution, CurrentTenant};
pub use repository::{RepositoryError, TenantDraft, TenantRepository};
pub use resolver::{Resolution, TenantResolver};
pub use router::tenant_router;
