//! API middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use facility_admin_common::{Timer, config::CommunityConfig, get_metrics};
use facility_admin_core::{CommentService, CommunityStatsService, PostService, ReportService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub comment_service: CommentService,
    pub post_service: PostService,
    pub report_service: ReportService,
    pub stats_service: CommunityStatsService,
    pub community: CommunityConfig,
}

/// Count requests and record their status and latency.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let metrics = get_metrics();
    let timer = Timer::start();
    metrics.start_request();

    let response = next.run(req).await;

    metrics.end_request();
    metrics.record_http_request(response.status().as_u16(), timer.elapsed());
    response
}
