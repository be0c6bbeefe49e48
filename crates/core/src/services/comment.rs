//! Comment moderation service.

use std::collections::HashMap;

use facility_admin_common::{AppResult, get_metrics};
use facility_admin_db::{
    entities::{ContentStatus, comment, like},
    repositories::{CommentRepository, LikeRepository},
};
use tracing::{info, warn};

use super::comment_tree::{CommentTreeNode, CommentWithStats, build_forest, count_nodes};

/// Attach a like count to each comment. Comments without likes get 0.
#[must_use]
pub fn annotate_likes(comments: Vec<comment::Model>, likes: &[like::Model]) -> Vec<CommentWithStats> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for like in likes {
        if let Some(comment_id) = like.comment_id.as_deref() {
            *counts.entry(comment_id).or_default() += 1;
        }
    }

    comments
        .into_iter()
        .map(|comment| {
            let likes_count = counts.get(comment.id.as_str()).copied().unwrap_or(0);
            CommentWithStats::new(comment, likes_count)
        })
        .collect()
}

/// A post's comments as a thread.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentThread {
    pub post_id: String,
    pub comments: Vec<CommentTreeNode>,
    pub total_comments: usize,
    pub orphans_promoted: usize,
    /// Like counts could not be loaded and are all 0.
    pub likes_degraded: bool,
}

/// Service for reading and moderating comments.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    like_repo: LikeRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, like_repo: LikeRepository) -> Self {
        Self {
            comment_repo,
            like_repo,
        }
    }

    /// Load a post's comments with like counts and nest them.
    ///
    /// A failed comment fetch is returned as an error. A failed like fetch
    /// is logged and every comment is reported with 0 likes.
    pub async fn get_comment_tree(&self, post_id: &str) -> AppResult<CommentThread> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        let ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();

        let (likes, likes_degraded) = match self.like_repo.find_for_comments(&ids).await {
            Ok(likes) => (likes, false),
            Err(e) => {
                warn!(post_id = %post_id, error = %e, "Failed to load comment likes, showing zero counts");
                get_metrics().record_likes_degraded();
                (Vec::new(), true)
            }
        };

        let forest = build_forest(annotate_likes(comments, &likes));
        if forest.cycles_broken > 0 {
            warn!(post_id = %post_id, count = forest.cycles_broken, "Comment parent cycle detected");
        }
        get_metrics().record_tree_built(forest.orphans_promoted as u64);

        Ok(CommentThread {
            post_id: post_id.to_string(),
            total_comments: count_nodes(&forest.roots),
            comments: forest.roots,
            orphans_promoted: forest.orphans_promoted,
            likes_degraded,
        })
    }

    /// Move a comment to a new status.
    pub async fn update_comment_status(
        &self,
        id: &str,
        status: ContentStatus,
        admin_id: &str,
    ) -> AppResult<comment::Model> {
        let current = self.comment_repo.get(id).await?;
        let next = current.status.transition_to(status)?;

        let mut updated = self.comment_repo.update_status(id, next).await?;
        if updated.author_name.is_none() {
            updated.author_name = current.author_name;
        }
        get_metrics().record_content_status_change();
        info!(comment_id = %id, admin_id = %admin_id, from = %current.status, to = %next, "Comment status changed");
        Ok(updated)
    }
}
