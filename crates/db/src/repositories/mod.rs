//! Repositories over the community tables.

pub mod comment;
pub mod like;
pub mod post;
pub mod report;
pub mod user;

pub use comment::CommentRepository;
pub use like::LikeRepository;
pub use post::PostRepository;
pub use report::{ReportFilter, ReportRepository};
pub use user::UserRepository;

use facility_admin_common::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::decode_rows;

/// Decode the single row an update by primary key returns.
pub(crate) fn single_updated<T: DeserializeOwned>(
    rows: Vec<Value>,
    not_found: impl FnOnce() -> AppError,
) -> AppResult<T> {
    decode_rows(rows)?.into_iter().next().ok_or_else(not_found)
}
