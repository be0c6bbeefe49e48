//! Report review endpoints.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, Utc};
use facility_admin_common::AppResult;
use facility_admin_core::{EnrichedReport, EnrichmentError, ReportSummary};
use facility_admin_db::{
    PageRequest, PaginationMeta,
    entities::{
        ReportStatus,
        report::{self, ReportReason, ReportTarget, ReportTargetKind},
    },
    repositories::ReportFilter,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub reporter_id: String,
    pub target_kind: Option<ReportTargetKind>,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: String,
    pub resolved_by: Option<String>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            target_kind: r.target().map(|t| t.kind()),
            id: r.id,
            reporter_id: r.reporter_id,
            post_id: r.post_id,
            comment_id: r.comment_id,
            reason: r.reason,
            description: r.description,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
            resolved_by: r.resolved_by,
        }
    }
}

/// Report with display details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedReportResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    pub reporter_name: Option<String>,
    pub resolver_name: Option<String>,
    pub target_author_id: Option<String>,
    pub target_author_name: Option<String>,
    pub post_title: Option<String>,
    pub comment_excerpt: Option<String>,
}

impl From<EnrichedReport> for EnrichedReportResponse {
    fn from(e: EnrichedReport) -> Self {
        let mut report = ReportResponse::from(e.report);
        // For comment reports this is the post the comment belongs to.
        if e.post_id.is_some() {
            report.post_id = e.post_id;
        }
        Self {
            report,
            reporter_name: e.reporter_name,
            resolver_name: e.resolver_name,
            target_author_id: e.target_author_id,
            target_author_name: e.target_author_name,
            post_title: e.post_title,
            comment_excerpt: e.comment_excerpt,
        }
    }
}

fn warnings(errors: Vec<EnrichmentError>) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Reports against one target.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryResponse {
    pub target: ReportTarget,
    pub reports: Vec<EnrichedReportResponse>,
    pub reports_by_reason: BTreeMap<ReportReason, u64>,
    pub total_reports: u64,
    pub enrichment_warnings: Vec<String>,
}

impl From<ReportSummary> for ReportSummaryResponse {
    fn from(s: ReportSummary) -> Self {
        Self {
            target: s.target,
            reports: s.reports.into_iter().map(Into::into).collect(),
            reports_by_reason: s.aggregate.reports_by_reason,
            total_reports: s.aggregate.total_reports,
            enrichment_warnings: warnings(s.enrichment_warnings),
        }
    }
}

/// One page of reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListResponse {
    pub items: Vec<EnrichedReportResponse>,
    pub pagination: PaginationMeta,
    pub enrichment_warnings: Vec<String>,
}

/// Single report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailResponse {
    pub report: EnrichedReportResponse,
    pub enrichment_warnings: Vec<String>,
}

/// List reports request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ListReportsRequest {
    pub status: Option<ReportStatus>,
    pub reason: Option<ReportReason>,
    pub target_kind: Option<ReportTargetKind>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1))]
    pub page_size: Option<u64>,
}

impl ListReportsRequest {
    fn filter(&self) -> ReportFilter {
        ReportFilter {
            status: self.status,
            reason: self.reason,
            target_kind: self.target_kind,
            created_from: self.created_from,
            created_to: self.created_to,
            search: self.search.clone(),
        }
    }
}

/// Show report request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShowReportRequest {
    #[validate(length(min = 1, max = 128))]
    pub report_id: String,
}

/// Reports for comment request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentReportsRequest {
    #[validate(length(min = 1, max = 128))]
    pub comment_id: String,
}

/// Reports for post request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostReportsRequest {
    #[validate(length(min = 1, max = 128))]
    pub post_id: String,
}

/// Update report status request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportStatusRequest {
    #[validate(length(min = 1, max = 128))]
    pub report_id: String,
    pub status: ReportStatus,
}

/// List reports matching a filter.
async fn list(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ListReportsRequest>,
) -> AppResult<ApiResponse<ReportListResponse>> {
    req.validate()?;

    let page = PageRequest::new(
        req.page.unwrap_or(1),
        req.page_size.unwrap_or(state.community.default_page_size),
        state.community.max_page_size,
    )?;
    let result = state.report_service.list_reports(&req.filter(), page).await?;

    Ok(ApiResponse::ok(ReportListResponse {
        items: result.page.items.into_iter().map(Into::into).collect(),
        pagination: result.page.pagination,
        enrichment_warnings: warnings(result.enrichment_warnings),
    }))
}

/// Get a report.
async fn show(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ShowReportRequest>,
) -> AppResult<ApiResponse<ReportDetailResponse>> {
    req.validate()?;

    let (report, errors) = state.report_service.get_report(&req.report_id).await?;

    Ok(ApiResponse::ok(ReportDetailResponse {
        report: report.into(),
        enrichment_warnings: warnings(errors),
    }))
}

/// Reports filed against a comment.
async fn for_comment(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CommentReportsRequest>,
) -> AppResult<ApiResponse<ReportSummaryResponse>> {
    req.validate()?;

    let summary = state
        .report_service
        .reports_for_comment(&req.comment_id)
        .await?;

    Ok(ApiResponse::ok(summary.into()))
}

/// Reports filed against a post.
async fn for_post(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<PostReportsRequest>,
) -> AppResult<ApiResponse<ReportSummaryResponse>> {
    req.validate()?;

    let summary = state.report_service.reports_for_post(&req.post_id).await?;

    Ok(ApiResponse::ok(summary.into()))
}

/// Change a report's status.
async fn update_status(
    AdminUser(admin_id): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateReportStatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    req.validate()?;

    let report = state
        .report_service
        .update_report_status(&req.report_id, req.status, &admin_id)
        .await?;

    Ok(ApiResponse::ok(report.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/for-comment", post(for_comment))
        .route("/for-post", post(for_post))
        .route("/update-status", post(update_status))
}
