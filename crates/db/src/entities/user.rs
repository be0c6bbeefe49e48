//! User directory entity.

use serde::{Deserialize, Serialize};

use super::columns;

columns! {
    Id => "id",
    Nickname => "nickname",
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Model {
    /// Nickname, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
    }
}
