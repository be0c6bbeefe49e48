//! Comment moderation endpoints.

use axum::{Json, Router, extract::State, routing::post};
use facility_admin_common::AppResult;
use facility_admin_core::{CommentThread, CommentTreeNode};
use facility_admin_db::entities::{ContentStatus, comment};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Comment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub author_id: String,
    pub author_name: Option<String>,
    pub content: String,
    pub status: ContentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            parent_comment_id: c.parent_comment_id,
            author_id: c.author_id,
            author_name: c.author_name,
            content: c.content,
            status: c.status,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Deepest reply level returned nested. A reply at this depth carries all
/// of its descendants as a flat, pre-ordered `children` list; each entry
/// keeps its `parentCommentId` and `depth`.
pub const MAX_NESTED_DEPTH: usize = 32;

/// A comment with its replies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNodeResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub likes_count: u64,
    pub depth: usize,
    /// Depth capped for display.
    pub indent: usize,
    pub orphaned: bool,
    pub children: Vec<CommentNodeResponse>,
}

impl CommentNodeResponse {
    fn leaf(node: &CommentTreeNode, max_indent: usize) -> Self {
        Self {
            comment: node.comment.comment.clone().into(),
            likes_count: node.comment.likes_count,
            depth: node.depth,
            indent: node.indent(max_indent),
            orphaned: node.orphaned,
            children: Vec::new(),
        }
    }
}

/// Convert a comment forest without recursion, nesting at most
/// `max_nested` levels.
fn nest_nodes(
    roots: &[CommentTreeNode],
    max_indent: usize,
    max_nested: usize,
) -> Vec<CommentNodeResponse> {
    // Pre-order walk recording which response each node is appended to.
    let mut visited: Vec<&CommentTreeNode> = Vec::new();
    let mut kids: Vec<Vec<usize>> = Vec::new();
    let mut top: Vec<usize> = Vec::new();
    let mut stack: Vec<(&CommentTreeNode, Option<usize>)> =
        roots.iter().rev().map(|r| (r, None)).collect();

    while let Some((node, owner)) = stack.pop() {
        let index = visited.len();
        visited.push(node);
        kids.push(Vec::new());
        match owner {
            Some(o) => kids[o].push(index),
            None => top.push(index),
        }

        let child_owner = if node.depth <= max_nested { Some(index) } else { owner };
        stack.extend(node.children.iter().rev().map(|c| (c, child_owner)));
    }

    let mut built: Vec<Option<CommentNodeResponse>> = (0..visited.len()).map(|_| None).collect();
    for (index, node) in visited.iter().enumerate().rev() {
        let mut response = CommentNodeResponse::leaf(node, max_indent);
        response.children = kids[index]
            .iter()
            .filter_map(|&k| built[k].take())
            .collect();
        built[index] = Some(response);
    }

    top.iter().filter_map(|&t| built[t].take()).collect()
}

/// Comment thread response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadResponse {
    pub post_id: String,
    pub comments: Vec<CommentNodeResponse>,
    pub total_comments: usize,
    pub orphans_promoted: usize,
    pub likes_degraded: bool,
}

impl CommentThreadResponse {
    fn new(thread: CommentThread, max_indent: usize) -> Self {
        Self {
            comments: nest_nodes(&thread.comments, max_indent, MAX_NESTED_DEPTH),
            post_id: thread.post_id,
            total_comments: thread.total_comments,
            orphans_promoted: thread.orphans_promoted,
            likes_degraded: thread.likes_degraded,
        }
    }
}

/// Comment tree request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentTreeRequest {
    #[validate(length(min = 1, max = 128))]
    pub post_id: String,
}

/// Update comment status request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentStatusRequest {
    #[validate(length(min = 1, max = 128))]
    pub comment_id: String,
    pub status: ContentStatus,
}

/// Get a post's comments as a thread.
async fn tree(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CommentTreeRequest>,
) -> AppResult<ApiResponse<CommentThreadResponse>> {
    req.validate()?;

    let thread = state.comment_service.get_comment_tree(&req.post_id).await?;

    Ok(ApiResponse::ok(CommentThreadResponse::new(
        thread,
        state.community.max_indent_depth,
    )))
}

/// Change a comment's status.
async fn update_status(
    AdminUser(admin_id): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateCommentStatusRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    req.validate()?;

    let comment = state
        .comment_service
        .update_comment_status(&req.comment_id, req.status, &admin_id)
        .await?;

    Ok(ApiResponse::ok(comment.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tree", post(tree))
        .route("/update-status", post(update_status))
}
