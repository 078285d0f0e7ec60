//! Request-pipeline core of a multi-tenant site builder.
//!
//! Two middleware stages run ahead of the view layer: [`tenancy`] maps the request host to the
//! site owner it belongs to, and [`sessions`] enforces the idle timeout on authenticated
//! sessions. Both degrade to a safe default instead of failing the request.

pub mod config;
pub mod error;
pub mod sessions;
pub mod telemetry;
pub mod tenancy;
