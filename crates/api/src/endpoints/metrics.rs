//! Metrics endpoints for monitoring.
//!
//! - JSON snapshot
//! - Prometheus text export
//! - Liveness check

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use facility_admin_common::metrics::{MetricsSnapshot, get_metrics};
use serde::Serialize;

use crate::middleware::AppState;

/// Create the metrics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_metrics_json))
        .route("/prometheus", get(get_metrics_prometheus))
        .route("/health", get(health_check))
}

/// JSON metrics response.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub http: HttpMetrics,
    pub datastore: DatastoreMetrics,
    pub comments: CommentMetrics,
    pub moderation: ModerationMetrics,
}

#[derive(Debug, Serialize)]
pub struct HttpMetrics {
    pub requests_total: u64,
    pub requests_active: u64,
    pub requests_2xx: u64,
    pub requests_4xx: u64,
    pub requests_5xx: u64,
    pub latency_avg_us: u64,
}

#[derive(Debug, Serialize)]
pub struct DatastoreMetrics {
    pub requests_total: u64,
    pub errors_total: u64,
    pub avg_time_us: u64,
}

#[derive(Debug, Serialize)]
pub struct CommentMetrics {
    pub trees_built: u64,
    pub orphaned_replies_promoted: u64,
    pub likes_degraded: u64,
}

#[derive(Debug, Serialize)]
pub struct ModerationMetrics {
    pub enrichment_failures: u64,
    pub report_transitions_applied: u64,
    pub report_transitions_rejected: u64,
    pub content_status_changes: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(s: MetricsSnapshot) -> Self {
        Self {
            http: HttpMetrics {
                requests_total: s.http_requests_total,
                requests_active: s.http_requests_active,
                requests_2xx: s.http_requests_2xx,
                requests_4xx: s.http_requests_4xx,
                requests_5xx: s.http_requests_5xx,
                latency_avg_us: s.http_request_latency_avg_us,
            },
            datastore: DatastoreMetrics {
                requests_total: s.datastore_requests_total,
                errors_total: s.datastore_errors_total,
                avg_time_us: s.datastore_avg_time_us,
            },
            comments: CommentMetrics {
                trees_built: s.comment_trees_built,
                orphaned_replies_promoted: s.orphaned_replies_promoted,
                likes_degraded: s.likes_degraded,
            },
            moderation: ModerationMetrics {
                enrichment_failures: s.enrichment_failures,
                report_transitions_applied: s.report_transitions_applied,
                report_transitions_rejected: s.report_transitions_rejected,
                content_status_changes: s.content_status_changes,
            },
        }
    }
}

/// Get metrics in JSON format.
async fn get_metrics_json() -> Json<MetricsResponse> {
    Json(MetricsResponse::from(get_metrics().snapshot()))
}

/// Get metrics in Prometheus text format.
async fn get_metrics_prometheus() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        get_metrics().to_prometheus(),
    )
        .into_response()
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
