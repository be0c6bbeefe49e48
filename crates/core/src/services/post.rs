//! Post moderation service.

use facility_admin_common::{AppResult, get_metrics};
use facility_admin_db::{
    entities::{ContentStatus, post},
    repositories::PostRepository,
};
use tracing::info;

/// Service for reading and moderating posts.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository) -> Self {
        Self { post_repo }
    }

    /// Get a post by ID.
    pub async fn get_post(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get(id).await
    }

    /// Move a post to a new status. Deleting is a soft status change.
    pub async fn update_post_status(
        &self,
        id: &str,
        status: ContentStatus,
        admin_id: &str,
    ) -> AppResult<post::Model> {
        let current = self.post_repo.get(id).await?;
        let next = current.status.transition_to(status)?;
        let updated = self.post_repo.update_status(id, next).await?;

        get_metrics().record_content_status_change();
        info!(post_id = %id, admin_id = %admin_id, from = %current.status, to = %next, "Post status changed");
        Ok(updated)
    }
}
