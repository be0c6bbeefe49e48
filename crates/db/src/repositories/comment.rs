//! Comment repository.

use chrono::Utc;
use facility_admin_common::{AppError, AppResult};
use serde_json::json;

use super::single_updated;
use crate::client::SharedDataSource;
use crate::entities::{ContentStatus, comment};
use crate::query::{ColumnRef, Query};

/// Comment repository for datastore operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: SharedDataSource,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: SharedDataSource) -> Self {
        Self { db }
    }

    /// All comments of a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        self.db
            .fetch(
                &Query::new(comment::TABLE)
                    .filter(comment::Column::PostId.eq(post_id))
                    .order_by_asc(comment::Column::CreatedAt),
            )
            .await?
            .decode()
    }

    /// Get a comment by ID.
    pub async fn get(&self, id: &str) -> AppResult<comment::Model> {
        self.db
            .fetch(
                &Query::new(comment::TABLE)
                    .filter(comment::Column::Id.eq(id))
                    .limit(1),
            )
            .await?
            .decode()?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Get comments by IDs. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .fetch(&Query::new(comment::TABLE).filter(comment::Column::Id.is_in(ids.iter().cloned())))
            .await?
            .decode()
    }

    /// Set a comment's status. Returns the base-table row, which lacks the
    /// author name the list view carries.
    pub async fn update_status(
        &self,
        id: &str,
        status: ContentStatus,
    ) -> AppResult<comment::Model> {
        let rows = self
            .db
            .update(
                comment::WRITE_TABLE,
                &[comment::Column::Id.eq(id)],
                json!({ "status": status, "updated_at": Utc::now() }),
            )
            .await?;
        single_updated(rows, || AppError::CommentNotFound(id.to_string()))
    }
}
