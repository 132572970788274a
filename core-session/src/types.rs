//! Session data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in user as persisted between launches.
///
/// Accounts are provisioned locally; there is no account backend behind
/// this, so the profile is whatever the sign-in flow synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    /// Display name. Sign-in without an explicit name derives it from the
    /// email local part.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial profile edit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar_url.is_none()
    }
}
