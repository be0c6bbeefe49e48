//! Community comment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentStatus, columns};

/// Read view joining comments with their author's display name.
pub const TABLE: &str = "community_comments_list";

/// Base table that accepts updates.
pub const WRITE_TABLE: &str = "community_comments";

columns! {
    Id => "id",
    PostId => "post_id",
    ParentCommentId => "parent_comment_id",
    AuthorId => "author_id",
    Status => "status",
    CreatedAt => "created_at",
    UpdatedAt => "updated_at",
}

/// Comment model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub post_id: String,
    /// Parent comment, `None` for a top-level comment.
    pub parent_comment_id: Option<String>,
    pub author_id: String,
    /// Author nickname resolved by the view.
    #[serde(default)]
    pub author_name: Option<String>,
    pub content: String,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
