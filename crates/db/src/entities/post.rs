//! Community post entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentStatus, columns};

pub const TABLE: &str = "community_posts";

columns! {
    Id => "id",
    AuthorId => "author_id",
    Title => "title",
    Category => "category",
    Status => "status",
    CreatedAt => "created_at",
}

/// Post model with its denormalized counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub category: String,
    pub status: ContentStatus,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
}
