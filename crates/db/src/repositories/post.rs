//! Post repository.

use facility_admin_common::{AppError, AppResult};
use serde_json::json;

use super::single_updated;
use crate::client::SharedDataSource;
use crate::entities::{ContentStatus, post};
use crate::query::{ColumnRef, Query};

/// Post repository for datastore operations.
#[derive(Clone)]
pub struct PostRepository {
    db: SharedDataSource,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: SharedDataSource) -> Self {
        Self { db }
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.db
            .fetch(&Query::new(post::TABLE).filter(post::Column::Id.eq(id)).limit(1))
            .await?
            .decode()?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Get posts by IDs. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .fetch(&Query::new(post::TABLE).filter(post::Column::Id.is_in(ids.iter().cloned())))
            .await?
            .decode()
    }

    /// Every post that is not soft-deleted, for category statistics.
    pub async fn find_all_for_stats(&self) -> AppResult<Vec<post::Model>> {
        self.db
            .fetch(
                &Query::new(post::TABLE)
                    .filter(post::Column::Status.neq(ContentStatus::Deleted.as_str()))
                    .order_by_asc(post::Column::Category),
            )
            .await?
            .decode()
    }

    /// Set a post's status.
    pub async fn update_status(&self, id: &str, status: ContentStatus) -> AppResult<post::Model> {
        let rows = self
            .db
            .update(post::TABLE, &[post::Column::Id.eq(id)], json!({ "status": status }))
            .await?;
        single_updated(rows, || AppError::PostNotFound(id.to_string()))
    }
}
