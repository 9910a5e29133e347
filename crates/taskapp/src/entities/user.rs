//! Account and session entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier; also names the user's task file
    pub id: String,

    pub name: String,

    /// Stored lowercase
    pub email: String,

    /// Hex SHA-256 of `salt:password`
    #[serde(rename = "passwordHash")]
    pub password_hash: String,

    pub salt: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Active login, persisted between CLI invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "userId")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "loggedInAt")]
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn login(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            logged_in_at: Some(Utc::now()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.user_id.is_some()
    }
}
