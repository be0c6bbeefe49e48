//! Moderation statuses and their allowed transitions.

use std::fmt;

use facility_admin_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Visibility status shared by posts and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Active,
    Hidden,
    Deleted,
    Pending,
}

impl ContentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Hidden => "hidden",
            Self::Deleted => "deleted",
            Self::Pending => "pending",
        }
    }

    /// Statuses reachable from `self` in one step. `Deleted` is a soft
    /// status and may be restored to `Active`.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Active, Self::Hidden, Self::Deleted],
            Self::Active => &[Self::Hidden, Self::Deleted],
            Self::Hidden => &[Self::Active, Self::Deleted],
            Self::Deleted => &[Self::Active],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Validate a move to `next`.
    pub fn transition_to(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition {
                entity: "content",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Resolved => "resolved",
        }
    }

    /// Statuses reachable from `self` in one step. `Resolved` is terminal.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Reviewed, Self::Resolved],
            Self::Reviewed => &[Self::Resolved, Self::Pending],
            Self::Resolved => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Validate a move to `next`.
    pub fn transition_to(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition {
                entity: "report",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
