//! Account records.
//!
//! `AuthUser` carries a plaintext password. It is a placeholder for real
//! credential hashing and never leaves the auth service; public reads return
//! `User`.

use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Member,
}

/// Public user view, also stored as the session pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Stored account with credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Some(UserRole::Admin)
    }
}

impl AuthUser {
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    pub fn email_matches(&self, email: &str) -> bool {
        self.user.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Per-user profile extension stored under its own key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// `data:` URI of the avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
