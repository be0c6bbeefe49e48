//! API endpoints.

mod comments;
mod metrics;
mod posts;
mod reports;
mod stats;

use axum::Router;

use crate::middleware::AppState;

pub use comments::MAX_NESTED_DEPTH;

/// Create the API router.
pub fn router() -> Router<AppState> {
    let community = Router::new()
        .nest("/comments", comments::router())
        .nest("/posts", posts::router())
        .nest("/reports", reports::router())
        .merge(stats::router());

    Router::new()
        .nest("/admin/community", community)
        .nest("/metrics", metrics::router())
}
