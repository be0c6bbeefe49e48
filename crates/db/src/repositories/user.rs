//! User directory repository.

use facility_admin_common::AppResult;

use crate::client::SharedDataSource;
use crate::entities::user;
use crate::query::{ColumnRef, Query};

/// Read access to the user directory.
#[derive(Clone)]
pub struct UserRepository {
    db: SharedDataSource,
    table: String,
}

impl UserRepository {
    /// Create a repository over the configured user table.
    #[must_use]
    pub fn new(db: SharedDataSource, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    /// Look up users by ID. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .fetch(
                &Query::new(self.table.as_str())
                    .select(&["id", "nickname", "email"])
                    .filter(user::Column::Id.is_in(ids.iter().cloned())),
            )
            .await?
            .decode()
    }
}
