//! Campaign domain model and approval lifecycle.
//!
//! # Responsibility
//! - Define the stored campaign record.
//! - Apply vote, unvote and contribution rules to one campaign.
//!
//! # Invariants
//! - New campaigns start `Pending` with zero votes, funds and contributors.
//! - `Pending -> Active` happens only when `votes` reaches `MINIMUM_VOTES`.
//! - `Active -> Pending` happens when a withdrawn vote drops `votes` below
//!   `MINIMUM_VOTES`.
//! - `Active -> Completed` happens when `current >= target`; vote changes never
//!   leave `Completed`.
//! - A user id appears at most once in `voted_by`.

use super::{new_record_id, require_positive_amount, require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Votes required before a pending campaign accepts contributions.
pub const MINIMUM_VOTES: u32 = 3;

pub const VOTE_ACTIVATED_MESSAGE: &str =
    "Vote recorded! Campaign is now active and can receive contributions.";
pub const VOTE_RECORDED_MESSAGE: &str = "Vote recorded successfully";
pub const VOTE_DEACTIVATED_MESSAGE: &str =
    "Vote removed. Campaign is now pending and needs more votes to become active.";
pub const VOTE_REMOVED_MESSAGE: &str = "Vote removed successfully";

/// Approval/funding state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Waiting for enough votes.
    Pending,
    /// Approved and accepting contributions.
    Active,
    /// Target reached.
    Completed,
    /// Defined for completeness; nothing transitions here yet.
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Stored campaign record.
///
/// `group_name` is a copy taken at creation time, not a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub title: String,
    pub description: String,
    pub beneficiary_name: String,
    pub group_id: String,
    pub group_name: String,
    pub current: f64,
    pub target: f64,
    pub currency: String,
    pub status: CampaignStatus,
    pub contributors: u32,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub voted_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_approval: Option<bool>,
}

/// Caller input for creating a campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub beneficiary_name: String,
    pub group_id: String,
    pub group_name: String,
    pub target: f64,
    pub currency: String,
    pub due_date: Option<i64>,
    pub needs_approval: Option<bool>,
}

/// Rule violations for single-campaign mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignRuleError {
    AlreadyVoted,
    NotVoted,
}

impl Display for CampaignRuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyVoted => write!(f, "You have already voted for this campaign"),
            Self::NotVoted => write!(f, "You have not voted for this campaign"),
        }
    }
}

impl Error for CampaignRuleError {}

/// Status change caused by one vote or unvote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub votes: u32,
    pub status: CampaignStatus,
    /// `true` when this call moved the campaign across the threshold.
    pub status_changed: bool,
}

impl Campaign {
    /// Builds a new pending campaign from validated input.
    ///
    /// # Errors
    /// - Blank title, beneficiary or currency.
    /// - Non-positive or non-finite target.
    pub fn create(input: &NewCampaign, now_ms: i64) -> Result<Self, ModelValidationError> {
        let title = require_text("title", &input.title)?;
        let beneficiary_name = require_text("beneficiaryName", &input.beneficiary_name)?;
        let currency = require_text("currency", &input.currency)?.to_ascii_uppercase();
        let target = require_positive_amount("target", input.target)?;

        Ok(Self {
            id: new_record_id(),
            title,
            description: input.description.trim().to_string(),
            beneficiary_name,
            group_id: input.group_id.clone(),
            group_name: input.group_name.clone(),
            current: 0.0,
            target,
            currency,
            status: CampaignStatus::Pending,
            contributors: 0,
            created_at: now_ms,
            due_date: input.due_date,
            votes: 0,
            voted_by: Vec::new(),
            needs_approval: input.needs_approval,
        })
    }

    pub fn has_voted(&self, user_id: &str) -> bool {
        self.voted_by.iter().any(|voter| voter == user_id)
    }

    /// Records one approval vote.
    ///
    /// The campaign is left untouched when the user already voted.
    pub fn record_vote(&mut self, user_id: &str) -> Result<VoteTransition, CampaignRuleError> {
        if self.has_voted(user_id) {
            return Err(CampaignRuleError::AlreadyVoted);
        }

        self.votes += 1;
        self.voted_by.push(user_id.to_string());

        let activated = self.status == CampaignStatus::Pending && self.votes >= MINIMUM_VOTES;
        if activated {
            self.status = CampaignStatus::Active;
        }

        Ok(VoteTransition {
            votes: self.votes,
            status: self.status,
            status_changed: activated,
        })
    }

    /// Withdraws a previously recorded vote.
    pub fn withdraw_vote(&mut self, user_id: &str) -> Result<VoteTransition, CampaignRuleError> {
        if !self.has_voted(user_id) {
            return Err(CampaignRuleError::NotVoted);
        }

        self.votes = self.votes.saturating_sub(1);
        self.voted_by.retain(|voter| voter != user_id);

        let deactivated = self.status == CampaignStatus::Active && self.votes < MINIMUM_VOTES;
        if deactivated {
            self.status = CampaignStatus::Pending;
        }

        Ok(VoteTransition {
            votes: self.votes,
            status: self.status,
            status_changed: deactivated,
        })
    }

    /// Adds one contribution. Returns `true` when it completed the campaign.
    ///
    /// Funds accumulate past the target and regardless of status; only an
    /// active campaign moves to `Completed`.
    pub fn apply_contribution(&mut self, amount: f64) -> Result<bool, ModelValidationError> {
        let amount = require_positive_amount("amount", amount)?;
        self.current += amount;
        self.contributors += 1;

        let completed = self.status == CampaignStatus::Active && self.current >= self.target;
        if completed {
            self.status = CampaignStatus::Completed;
        }
        Ok(completed)
    }

    /// Funding progress, clamped to `0..=100`.
    pub fn progress_percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 100.0;
        }
        (self.current / self.target * 100.0).clamp(0.0, 100.0)
    }

    /// Amount still missing to reach the target.
    pub fn remaining(&self) -> f64 {
        (self.target - self.current).max(0.0)
    }

    /// Votes still missing before activation.
    pub fn votes_needed(&self) -> u32 {
        MINIMUM_VOTES.saturating_sub(self.votes)
    }

    pub fn accepts_contributions(&self) -> bool {
        self.status == CampaignStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::{Campaign, CampaignRuleError, CampaignStatus, NewCampaign, MINIMUM_VOTES};

    fn new_campaign(target: f64) -> Campaign {
        let input = NewCampaign {
            title: "  Roof repair ".to_string(),
            description: "Storm damage".to_string(),
            beneficiary_name: "Fatima".to_string(),
            group_id: "g1".to_string(),
            group_name: "Close Family".to_string(),
            target,
            currency: "usd".to_string(),
            due_date: None,
            needs_approval: Some(true),
        };
        Campaign::create(&input, 1_000).unwrap()
    }

    #[test]
    fn create_starts_pending_and_empty() {
        let campaign = new_campaign(500.0);
        assert_eq!(campaign.title, "Roof repair");
        assert_eq!(campaign.currency, "USD");
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert_eq!(campaign.votes, 0);
        assert_eq!(campaign.current, 0.0);
        assert_eq!(campaign.contributors, 0);
        assert!(campaign.voted_by.is_empty());
    }

    #[test]
    fn create_rejects_blank_title_and_bad_target() {
        let mut input = NewCampaign {
            title: " ".to_string(),
            description: String::new(),
            beneficiary_name: "A".to_string(),
            group_id: "g".to_string(),
            group_name: "G".to_string(),
            target: 10.0,
            currency: "USD".to_string(),
            due_date: None,
            needs_approval: None,
        };
        assert!(Campaign::create(&input, 0).is_err());
        input.title = "ok".to_string();
        input.target = 0.0;
        assert!(Campaign::create(&input, 0).is_err());
    }

    #[test]
    fn third_vote_activates_and_duplicate_is_rejected() {
        let mut campaign = new_campaign(500.0);
        assert!(!campaign.record_vote("u1").unwrap().status_changed);
        assert!(!campaign.record_vote("u2").unwrap().status_changed);
        assert_eq!(campaign.status, CampaignStatus::Pending);

        let third = campaign.record_vote("u3").unwrap();
        assert!(third.status_changed);
        assert_eq!(third.votes, MINIMUM_VOTES);
        assert_eq!(campaign.status, CampaignStatus::Active);

        assert_eq!(
            campaign.record_vote("u3").unwrap_err(),
            CampaignRuleError::AlreadyVoted
        );
        assert_eq!(campaign.votes, 3);

        let fourth = campaign.record_vote("u4").unwrap();
        assert!(!fourth.status_changed);
    }

    #[test]
    fn withdrawing_below_threshold_returns_to_pending() {
        let mut campaign = new_campaign(500.0);
        for voter in ["a", "b", "c", "d"] {
            campaign.record_vote(voter).unwrap();
        }

        let first = campaign.withdraw_vote("d").unwrap();
        assert_eq!(first.votes, 3);
        assert!(!first.status_changed);
        assert_eq!(campaign.status, CampaignStatus::Active);

        let second = campaign.withdraw_vote("a").unwrap();
        assert_eq!(second.votes, 2);
        assert!(second.status_changed);
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert!(!campaign.has_voted("a"));

        assert_eq!(
            campaign.withdraw_vote("a").unwrap_err(),
            CampaignRuleError::NotVoted
        );
    }

    #[test]
    fn contribution_completes_only_active_campaigns() {
        let mut pending = new_campaign(100.0);
        assert!(!pending.apply_contribution(150.0).unwrap());
        assert_eq!(pending.status, CampaignStatus::Pending);
        assert_eq!(pending.progress_percent(), 100.0);

        let mut campaign = new_campaign(100.0);
        for voter in ["a", "b", "c"] {
            campaign.record_vote(voter).unwrap();
        }
        assert!(!campaign.apply_contribution(40.0).unwrap());
        assert_eq!(campaign.remaining(), 60.0);
        assert!(campaign.apply_contribution(60.0).unwrap());
        assert_eq!(campaign.status, CampaignStatus::Completed);

        assert!(!campaign.apply_contribution(25.0).unwrap());
        assert_eq!(campaign.current, 125.0);
        assert_eq!(campaign.contributors, 3);
        assert_eq!(campaign.status, CampaignStatus::Completed);
    }

    #[test]
    fn completed_campaign_survives_vote_withdrawal() {
        let mut campaign = new_campaign(100.0);
        for voter in ["a", "b", "c"] {
            campaign.record_vote(voter).unwrap();
        }
        campaign.apply_contribution(100.0).unwrap();

        let transition = campaign.withdraw_vote("b").unwrap();
        assert_eq!(transition.votes, 2);
        assert!(!transition.status_changed);
        assert_eq!(campaign.status, CampaignStatus::Completed);
    }

    #[test]
    fn legacy_record_without_votes_deserializes() {
        let json = r#"{
            "id": "1",
            "title": "Medical",
            "description": "",
            "beneficiaryName": "Ahmed",
            "groupId": "1",
            "groupName": "Family",
            "current": 10,
            "target": 50,
            "currency": "USD",
            "status": "active",
            "contributors": 1,
            "createdAt": 0
        }"#;
        let campaign: Campaign = serde_json::from_str(json).unwrap();
        assert_eq!(campaign.votes, 0);
        assert!(campaign.voted_by.is_empty());
        assert_eq!(campaign.votes_needed(), 3);
    }
}
