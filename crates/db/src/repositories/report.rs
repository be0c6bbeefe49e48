//! Report repository.

use chrono::{DateTime, Utc};
use facility_admin_common::{AppError, AppResult};
use serde_json::{Map, Value};

use super::single_updated;
use crate::client::SharedDataSource;
use crate::entities::ReportStatus;
use crate::entities::report::{self, ReportReason, ReportTargetKind};
use crate::query::{ColumnRef, Query};

/// Criteria for the report list view. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub reason: Option<ReportReason>,
    pub target_kind: Option<ReportTargetKind>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive match against the report description.
    pub search: Option<String>,
}

impl ReportFilter {
    /// Reject an inverted date range.
    pub fn validate(&self) -> AppResult<()> {
        match (self.created_from, self.created_to) {
            (Some(from), Some(to)) if from > to => Err(AppError::Validation(
                "createdFrom must not be after createdTo".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn apply(&self, mut query: Query) -> Query {
        if let Some(status) = self.status {
            query = query.filter(report::Column::Status.eq(status.as_str()));
        }
        if let Some(reason) = self.reason {
            query = query.filter(report::Column::Reason.eq(reason.as_str()));
        }
        match self.target_kind {
            Some(ReportTargetKind::Comment) => {
                query = query.filter(report::Column::CommentId.is_not_null());
            }
            Some(ReportTargetKind::Post) => {
                query = query
                    .filter(report::Column::CommentId.is_null())
                    .filter(report::Column::PostId.is_not_null());
            }
            None => {}
        }
        if let Some(from) = self.created_from {
            query = query.filter(report::Column::CreatedAt.gte(from.to_rfc3339()));
        }
        if let Some(to) = self.created_to {
            query = query.filter(report::Column::CreatedAt.lte(to.to_rfc3339()));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(report::Column::Description.contains(term));
        }
        query
    }
}

/// Report repository for datastore operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: SharedDataSource,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: SharedDataSource) -> Self {
        Self { db }
    }

    /// Reports filed against a comment, newest first.
    pub async fn find_for_comment(&self, comment_id: &str) -> AppResult<Vec<report::Model>> {
        self.db
            .fetch(
                &Query::new(report::TABLE)
                    .filter(report::Column::CommentId.eq(comment_id))
                    .order_by_desc(report::Column::CreatedAt),
            )
            .await?
            .decode()
    }

    /// Reports filed against the post itself, newest first. Reports on the
    /// post's comments are excluded.
    pub async fn find_for_post(&self, post_id: &str) -> AppResult<Vec<report::Model>> {
        self.db
            .fetch(
                &Query::new(report::TABLE)
                    .filter(report::Column::PostId.eq(post_id))
                    .filter(report::Column::CommentId.is_null())
                    .order_by_desc(report::Column::CreatedAt),
            )
            .await?
            .decode()
    }

    /// Get a report by ID.
    pub async fn get(&self, id: &str) -> AppResult<report::Model> {
        self.db
            .fetch(&Query::new(report::TABLE).filter(report::Column::Id.eq(id)).limit(1))
            .await?
            .decode()?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// One page of reports matching `filter`, newest first, with the total
    /// number of matches. A response without a count is an error.
    pub async fn find_page(
        &self,
        filter: &ReportFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        let query = filter
            .apply(Query::new(report::TABLE))
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .offset(offset)
            .limit(limit)
            .with_count();

        let rows = self.db.fetch(&query).await?;
        let total = rows.total.ok_or_else(|| {
            AppError::Datastore(format!("{}: response carried no count", report::TABLE))
        })?;
        Ok((rows.decode()?, total))
    }

    /// Set a report's status, recording the resolving admin when given.
    pub async fn update_status(
        &self,
        id: &str,
        status: ReportStatus,
        resolved_by: Option<&str>,
    ) -> AppResult<report::Model> {
        let mut patch = Map::new();
        patch.insert("status".to_string(), Value::from(status.as_str()));
        if let Some(admin_id) = resolved_by {
            patch.insert("resolved_by".to_string(), Value::from(admin_id));
        }

        let rows = self
            .db
            .update(report::TABLE, &[report::Column::Id.eq(id)], Value::Object(patch))
            .await?;
        single_updated(rows, || AppError::ReportNotFound(id.to_string()))
    }

    /// Number of reports with `status`.
    pub async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64> {
        let rows = self
            .db
            .fetch(
                &Query::new(report::TABLE)
                    .select(&["id"])
                    .filter(report::Column::Status.eq(status.as_str()))
                    .limit(1)
                    .with_count(),
            )
            .await?;
        rows.total.ok_or_else(|| {
            AppError::Datastore(format!("{}: response carried no count", report::TABLE))
        })
    }
}
