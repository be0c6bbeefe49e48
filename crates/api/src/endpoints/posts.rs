//! Post moderation endpoints.

use axum::{Json, Router, extract::State, routing::post};
use facility_admin_common::AppResult;
use facility_admin_core::{CategoryStats, CategoryStatsReport};
use facility_admin_db::entities::{ContentStatus, post};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Post response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub category: String,
    pub status: ContentStatus,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub created_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            title: p.title,
            category: p.category,
            status: p.status,
            view_count: p.view_count,
            like_count: p.like_count,
            comment_count: p.comment_count,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsResponse {
    pub category: String,
    pub post_count: u64,
    pub comment_count: u64,
    pub like_count: u64,
    pub view_count: u64,
    pub avg_comments_per_post: f64,
    pub avg_likes_per_post: f64,
    pub share_of_posts: f64,
}

impl From<CategoryStats> for CategoryStatsResponse {
    fn from(c: CategoryStats) -> Self {
        Self {
            category: c.category,
            post_count: c.post_count,
            comment_count: c.comment_count,
            like_count: c.like_count,
            view_count: c.view_count,
            avg_comments_per_post: c.avg_comments_per_post,
            avg_likes_per_post: c.avg_likes_per_post,
            share_of_posts: c.share_of_posts,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsReportResponse {
    pub categories: Vec<CategoryStatsResponse>,
    pub total_posts: u64,
    pub total_comments: u64,
    pub total_likes: u64,
    pub total_views: u64,
    pub avg_comments_per_post: f64,
    pub avg_likes_per_post: f64,
}

impl From<CategoryStatsReport> for CategoryStatsReportResponse {
    fn from(r: CategoryStatsReport) -> Self {
        Self {
            categories: r.categories.into_iter().map(Into::into).collect(),
            total_posts: r.total_posts,
            total_comments: r.total_comments,
            total_likes: r.total_likes,
            total_views: r.total_views,
            avg_comments_per_post: r.avg_comments_per_post,
            avg_likes_per_post: r.avg_likes_per_post,
        }
    }
}

/// Show post request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShowPostRequest {
    #[validate(length(min = 1, max = 128))]
    pub post_id: String,
}

/// Update post status request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostStatusRequest {
    #[validate(length(min = 1, max = 128))]
    pub post_id: String,
    pub status: ContentStatus,
}

/// Get a post.
async fn show(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ShowPostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    req.validate()?;

    let post = state.post_service.get_post(&req.post_id).await?;

    Ok(ApiResponse::ok(post.into()))
}

/// Change a post's status.
async fn update_status(
    AdminUser(admin_id): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdatePostStatusRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    req.validate()?;

    let post = state
        .post_service
        .update_post_status(&req.post_id, req.status, &admin_id)
        .await?;

    Ok(ApiResponse::ok(post.into()))
}

/// Activity statistics per post category.
async fn category_stats(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CategoryStatsReportResponse>> {
    let report = state.stats_service.category_stats().await?;

    Ok(ApiResponse::ok(report.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/update-status", post(update_status))
        .route("/category-stats", post(category_stats))
}
