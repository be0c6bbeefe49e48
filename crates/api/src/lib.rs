//! HTTP API layer for facility-admin.
//!
//! - **Endpoints**: community moderation routes under `/admin/community`
//!   and metrics under `/metrics`
//! - **Extractors**: the admin identity set by the upstream identity provider
//! - **Middleware**: request metrics
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
