//! Like entity. A like targets either a post or a comment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::columns;

pub const TABLE: &str = "community_likes";

columns! {
    Id => "id",
    UserId => "user_id",
    PostId => "post_id",
    CommentId => "comment_id",
    CreatedAt => "created_at",
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub user_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
