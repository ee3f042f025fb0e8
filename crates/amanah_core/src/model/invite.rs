//! Registration invite codes.
//!
//! # Invariants
//! - A code is redeemable only while active, unused and unexpired.
//! - `used_by`/`used_at` are set together, once.
//! - Codes are compared in normalized (trimmed, uppercase) form.

use super::new_record_id;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const INVITE_CODE_LEN: usize = 8;
const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

static INVITE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{8}$").expect("valid invite code regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub id: String,
    pub code: String,
    /// Display name of the issuer.
    pub created_by: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Why a code cannot be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteRejection {
    Deactivated,
    AlreadyUsed,
    Expired,
}

impl Display for InviteRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deactivated => write!(f, "Invite code has been deactivated"),
            Self::AlreadyUsed => write!(f, "Invite code has already been used"),
            Self::Expired => write!(f, "Invite code has expired"),
        }
    }
}

impl Error for InviteRejection {}

impl InviteCode {
    /// Issues a new active code.
    ///
    /// `expiry_days = Some(0)` yields a code that is already expired.
    pub fn issue(
        code: String,
        created_by: &str,
        expiry_days: Option<u32>,
        group_id: Option<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: new_record_id(),
            code,
            created_by: created_by.trim().to_string(),
            created_at: now_ms,
            expires_at: expiry_days.map(|days| now_ms + i64::from(days) * MS_PER_DAY),
            used_by: None,
            used_at: None,
            is_active: true,
            group_id,
        }
    }

    pub fn check_redeemable(&self, now_ms: i64) -> Result<(), InviteRejection> {
        if !self.is_active {
            return Err(InviteRejection::Deactivated);
        }
        if self.used_by.is_some() {
            return Err(InviteRejection::AlreadyUsed);
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now_ms) {
            return Err(InviteRejection::Expired);
        }
        Ok(())
    }

    /// Marks the code consumed by `user_id`.
    pub fn redeem(&mut self, user_id: &str, now_ms: i64) -> Result<(), InviteRejection> {
        self.check_redeemable(now_ms)?;
        self.used_by = Some(user_id.to_string());
        self.used_at = Some(now_ms);
        Ok(())
    }

    pub fn matches(&self, code: &str) -> bool {
        self.code == normalize_invite_code(code)
    }
}

/// Trims and uppercases user-entered codes.
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Returns whether `code` has the generated shape.
pub fn is_well_formed_invite_code(code: &str) -> bool {
    INVITE_CODE_RE.is_match(&normalize_invite_code(code))
}

/// Derives a fresh candidate code from a random UUID.
///
/// Not suitable where unguessability matters.
pub fn generate_invite_code() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .to_ascii_uppercase()
        .chars()
        .take(INVITE_CODE_LEN)
        .collect()
}
