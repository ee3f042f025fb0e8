//! Activity feed records.
//!
//! # Invariants
//! - The feed is stored newest-first and holds at most
//!   `ACTIVITY_LOG_CAPACITY` entries.
//! - Private contributions are shown as `ANONYMOUS_DISPLAY_NAME`; the real
//!   contributor is not stored anywhere else.

use super::new_record_id;
use serde::{Deserialize, Serialize};

pub const ACTIVITY_LOG_CAPACITY: usize = 50;
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Contribution,
    CampaignCreated,
    GroupCreated,
}

impl ActivityKind {
    /// Default action text shown next to the user name.
    pub fn action_text(self) -> &'static str {
        match self {
            Self::Contribution => "contributed",
            Self::CampaignCreated => "created campaign",
            Self::GroupCreated => "created group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Display name, never an id.
    pub user: String,
    pub action: String,
    /// Campaign title, or group name for `GroupCreated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    pub created_at: i64,
}

/// Activity payload before id/timestamp assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub user: String,
    pub action: String,
    pub campaign: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub is_private: Option<bool>,
}

impl NewActivity {
    pub fn campaign_created(user: &str, title: &str) -> Self {
        Self::titled(ActivityKind::CampaignCreated, user, title)
    }

    pub fn group_created(user: &str, group_name: &str) -> Self {
        Self::titled(ActivityKind::GroupCreated, user, group_name)
    }

    /// Contribution entry; `user` is replaced by the anonymous name when
    /// `is_private` is set.
    pub fn contribution(
        user: &str,
        campaign_title: &str,
        amount: f64,
        currency: &str,
        is_private: bool,
    ) -> Self {
        let display = if is_private { ANONYMOUS_DISPLAY_NAME } else { user };
        Self {
            kind: ActivityKind::Contribution,
            user: display.to_string(),
            action: ActivityKind::Contribution.action_text().to_string(),
            campaign: Some(campaign_title.to_string()),
            amount: Some(amount),
            currency: Some(currency.to_string()),
            is_private: Some(is_private),
        }
    }

    fn titled(kind: ActivityKind, user: &str, title: &str) -> Self {
        Self {
            kind,
            user: user.to_string(),
            action: kind.action_text().to_string(),
            campaign: Some(title.to_string()),
            amount: None,
            currency: None,
            is_private: None,
        }
    }

    pub fn into_activity(self, now_ms: i64) -> Activity {
        Activity {
            id: new_record_id(),
            kind: self.kind,
            user: self.user,
            action: self.action,
            campaign: self.campaign,
            amount: self.amount,
            currency: self.currency,
            is_private: self.is_private,
            created_at: now_ms,
        }
    }
}

/// Inserts `activity` at the front and drops entries past the capacity.
///
/// Returns how many old entries were evicted.
pub fn push_capped(log: &mut Vec<Activity>, activity: Activity) -> usize {
    log.insert(0, activity);
    let evicted = log.len().saturating_sub(ACTIVITY_LOG_CAPACITY);
    log.truncate(ACTIVITY_LOG_CAPACITY);
    evicted
}
