//! User profile records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the tracker, keyed by the identity provider's uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Unset for profiles that were never stored.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name shown on leaderboards.
    pub fn display_name_or_anonymous(&self) -> &str {
        self.display_name.as_deref().unwrap_or(ANONYMOUS)
    }
}

pub const ANONYMOUS: &str = "Anonymous";

/// Profile fields written on sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}
