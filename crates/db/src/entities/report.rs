//! Community report entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ReportStatus, columns};

pub const TABLE: &str = "community_reports";

columns! {
    Id => "id",
    ReporterId => "reporter_id",
    PostId => "post_id",
    CommentId => "comment_id",
    Reason => "reason",
    Description => "description",
    Status => "status",
    CreatedAt => "created_at",
    ResolvedBy => "resolved_by",
}

/// Reason a user gave when filing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Inappropriate,
    Harassment,
    FalseInfo,
    Copyright,
    Other,
}

impl ReportReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Inappropriate => "inappropriate",
            Self::Harassment => "harassment",
            Self::FalseInfo => "false_info",
            Self::Copyright => "copyright",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub reporter_id: String,
    pub post_id: Option<String>,
    /// Set when the report targets a comment. `post_id` may then hold the
    /// comment's post.
    pub comment_id: Option<String>,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    /// Admin who resolved the report.
    #[serde(default)]
    pub resolved_by: Option<String>,
}

impl Model {
    /// What the report points at. A comment target takes precedence.
    #[must_use]
    pub fn target(&self) -> Option<ReportTarget> {
        match (&self.comment_id, &self.post_id) {
            (Some(id), _) => Some(ReportTarget::Comment(id.clone())),
            (None, Some(id)) => Some(ReportTarget::Post(id.clone())),
            (None, None) => None,
        }
    }
}

/// The content a report is filed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ReportTarget {
    Post(String),
    Comment(String),
}

impl ReportTarget {
    #[must_use]
    pub const fn kind(&self) -> ReportTargetKind {
        match self {
            Self::Post(_) => ReportTargetKind::Post,
            Self::Comment(_) => ReportTargetKind::Comment,
        }
    }
}

/// Target kind, used for filtering report lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTargetKind {
    Post,
    Comment,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_row() {
        let row = json!({
            "id": "r1",
            "reporter_id": "u1",
            "post_id": "p1",
            "comment_id": "c1",
            "reason": "false_info",
            "description": null,
            "status": "pending",
            "created_at": "2024-03-01T10:00:00+00:00"
        });
        let report: Model = serde_json::from_value(row).unwrap();

        assert_eq!(report.reason, ReportReason::FalseInfo);
        assert_eq!(report.resolved_by, None);
        assert_eq!(report.target(), Some(ReportTarget::Comment("c1".into())));
    }

    #[test]
    fn test_target_serializes_tagged() {
        let value = serde_json::to_value(ReportTarget::Post("p1".into())).unwrap();
        assert_eq!(value, json!({"kind": "post", "id": "p1"}));
    }
}
