//! Like repository.

use facility_admin_common::AppResult;

use crate::client::SharedDataSource;
use crate::entities::like;
use crate::query::{ColumnRef, Query};

/// Like repository for datastore operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: SharedDataSource,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: SharedDataSource) -> Self {
        Self { db }
    }

    /// Likes on any of the given comments. No request is made for an empty
    /// ID set.
    pub async fn find_for_comments(&self, comment_ids: &[String]) -> AppResult<Vec<like::Model>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .fetch(
                &Query::new(like::TABLE)
                    .filter(like::Column::CommentId.is_not_null())
                    .filter(like::Column::CommentId.is_in(comment_ids.iter().cloned())),
            )
            .await?
            .decode()
    }
}
