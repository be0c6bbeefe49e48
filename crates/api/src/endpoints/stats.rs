//! Dashboard statistics endpoint.

use axum::{Router, extract::State, routing::post};
use facility_admin_common::AppResult;
use facility_admin_core::AdminStats;
use serde::Serialize;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Moderation queue counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub pending_reports: u64,
    pub reviewed_reports: u64,
    pub resolved_reports: u64,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(s: AdminStats) -> Self {
        Self {
            pending_reports: s.pending_reports,
            reviewed_reports: s.reviewed_reports,
            resolved_reports: s.resolved_reports,
        }
    }
}

async fn stats(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AdminStatsResponse>> {
    let stats = state.stats_service.admin_stats().await?;

    Ok(ApiResponse::ok(stats.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", post(stats))
}
