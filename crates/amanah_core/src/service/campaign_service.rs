//! Campaign use-case service.
//!
//! # Responsibility
//! - Create, read and delete campaigns.
//! - Run the approval lifecycle (vote/unvote) and record contributions.
//!
//! # Invariants
//! - Each mutation is one store transaction covering the campaign collection
//!   and, where applicable, the activity feed.
//! - Rejected operations return before anything is written.

use crate::model::activity::{Activity, NewActivity};
use crate::model::campaign::{
    Campaign, CampaignRuleError, CampaignStatus, NewCampaign, VOTE_ACTIVATED_MESSAGE,
    VOTE_DEACTIVATED_MESSAGE, VOTE_RECORDED_MESSAGE, VOTE_REMOVED_MESSAGE,
};
use crate::model::{now_epoch_ms, ModelValidationError};
use crate::repo::{RepoError, SeedMode, CAMPAIGNS};
use crate::service::activity_service::append_activity;
use crate::store::{KvAccess, KvStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from campaign use-cases.
#[derive(Debug)]
pub enum CampaignServiceError {
    Validation(ModelValidationError),
    CampaignNotFound(String),
    AlreadyVoted(String),
    NotVoted(String),
    Repo(RepoError),
}

impl Display for CampaignServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CampaignNotFound(_) => write!(f, "Campaign not found"),
            Self::AlreadyVoted(_) => write!(f, "{}", CampaignRuleError::AlreadyVoted),
            Self::NotVoted(_) => write!(f, "{}", CampaignRuleError::NotVoted),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CampaignServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CampaignServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for CampaignServiceError {
    fn from(value: StoreError) -> Self {
        Self::Repo(RepoError::Store(value))
    }
}

impl From<ModelValidationError> for CampaignServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of a successful vote or vote withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    pub campaign: Campaign,
    /// `true` when this call crossed the activation threshold.
    pub status_changed: bool,
    /// Human-readable confirmation for the caller.
    pub message: &'static str,
}

/// One contribution toward a campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRequest {
    pub campaign_id: String,
    pub amount: f64,
    /// Shown as "Anonymous" in the activity feed when set.
    pub is_private: bool,
    pub contributor_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributionReceipt {
    pub campaign: Campaign,
    /// `true` when this contribution completed the campaign.
    pub completed: bool,
    pub activity: Activity,
}

/// Campaign service facade over a key-value store.
pub struct CampaignService<S: KvStore> {
    store: S,
    seed: SeedMode,
}

impl<S: KvStore> CampaignService<S> {
    pub fn new(store: S) -> Self {
        Self::with_seed_mode(store, SeedMode::default())
    }

    pub fn with_seed_mode(store: S, seed: SeedMode) -> Self {
        Self { store, seed }
    }

    /// Creates a pending campaign and logs a `campaign_created` activity.
    pub fn create_campaign(
        &self,
        input: &NewCampaign,
        actor_name: &str,
    ) -> Result<Campaign, CampaignServiceError> {
        let now_ms = now_epoch_ms();
        let campaign = Campaign::create(input, now_ms)?;

        self.store.transaction(|access| {
            let mut campaigns = CAMPAIGNS.load(access, self.seed, now_ms)?;
            campaigns.insert(0, campaign.clone());
            CAMPAIGNS.save(access, &campaigns)?;
            append_activity(
                access,
                self.seed,
                NewActivity::campaign_created(actor_name, &campaign.title),
                now_ms,
            )?;
            Ok::<_, CampaignServiceError>(())
        })?;

        info!(
            "event=campaign_create module=service status=ok campaign_id={} group_id={}",
            campaign.id, campaign.group_id
        );
        Ok(campaign)
    }

    /// Lists all campaigns, newest first.
    pub fn list_campaigns(&self) -> Result<Vec<Campaign>, CampaignServiceError> {
        let campaigns = self
            .store
            .transaction(|access| CAMPAIGNS.load(access, self.seed, now_epoch_ms()))?;
        Ok(campaigns)
    }

    pub fn get_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>, CampaignServiceError> {
        Ok(self
            .list_campaigns()?
            .into_iter()
            .find(|campaign| campaign.id == campaign_id))
    }

    pub fn list_campaigns_by_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Campaign>, CampaignServiceError> {
        Ok(self
            .list_campaigns()?
            .into_iter()
            .filter(|campaign| campaign.group_id == group_id)
            .collect())
    }

    pub fn list_campaigns_by_status(
        &self,
        status: CampaignStatus,
    ) -> Result<Vec<Campaign>, CampaignServiceError> {
        Ok(self
            .list_campaigns()?
            .into_iter()
            .filter(|campaign| campaign.status == status)
            .collect())
    }

    /// Records an approval vote by `user_id`.
    ///
    /// # Errors
    /// - `CampaignNotFound` for unknown ids.
    /// - `AlreadyVoted` when the user already voted; nothing is written.
    pub fn vote(&self, campaign_id: &str, user_id: &str) -> Result<VoteOutcome, CampaignServiceError> {
        let outcome = self.mutate_campaign(campaign_id, |campaign| {
            let transition = campaign.record_vote(user_id).map_err(|err| {
                reject_vote(campaign_id, "campaign_vote", err)
            })?;
            Ok(VoteOutcome {
                campaign: campaign.clone(),
                status_changed: transition.status_changed,
                message: if transition.status_changed {
                    VOTE_ACTIVATED_MESSAGE
                } else {
                    VOTE_RECORDED_MESSAGE
                },
            })
        })?;

        info!(
            "event=campaign_vote module=service status=ok campaign_id={campaign_id} votes={} campaign_status={}",
            outcome.campaign.votes,
            outcome.campaign.status.as_str()
        );
        Ok(outcome)
    }

    /// Withdraws the vote of `user_id`.
    ///
    /// # Errors
    /// - `CampaignNotFound` for unknown ids.
    /// - `NotVoted` when the user has no vote to withdraw.
    pub fn remove_vote(
        &self,
        campaign_id: &str,
        user_id: &str,
    ) -> Result<VoteOutcome, CampaignServiceError> {
        let outcome = self.mutate_campaign(campaign_id, |campaign| {
            let transition = campaign.withdraw_vote(user_id).map_err(|err| {
                reject_vote(campaign_id, "campaign_unvote", err)
            })?;
            Ok(VoteOutcome {
                campaign: campaign.clone(),
                status_changed: transition.status_changed,
                message: if transition.status_changed {
                    VOTE_DEACTIVATED_MESSAGE
                } else {
                    VOTE_REMOVED_MESSAGE
                },
            })
        })?;

        info!(
            "event=campaign_unvote module=service status=ok campaign_id={campaign_id} votes={} campaign_status={}",
            outcome.campaign.votes,
            outcome.campaign.status.as_str()
        );
        Ok(outcome)
    }

    /// Adds a contribution and logs a `contribution` activity.
    ///
    /// Funds are accepted whatever the campaign status; only an active
    /// campaign can complete.
    pub fn contribute(
        &self,
        request: &ContributionRequest,
    ) -> Result<ContributionReceipt, CampaignServiceError> {
        let now_ms = now_epoch_ms();
        let receipt = self.store.transaction(|access| {
            let mut campaigns = CAMPAIGNS.load(access, self.seed, now_ms)?;
            let campaign = find_mut(&mut campaigns, &request.campaign_id)?;
            let completed = campaign.apply_contribution(request.amount)?;
            let updated = campaign.clone();
            CAMPAIGNS.save(access, &campaigns)?;

            let activity = append_activity(
                access,
                self.seed,
                NewActivity::contribution(
                    &request.contributor_name,
                    &updated.title,
                    request.amount,
                    &updated.currency,
                    request.is_private,
                ),
                now_ms,
            )?;

            Ok::<_, CampaignServiceError>(ContributionReceipt {
                campaign: updated,
                completed,
                activity,
            })
        })?;

        info!(
            "event=campaign_contribute module=service status=ok campaign_id={} completed={} private={}",
            receipt.campaign.id, receipt.completed, request.is_private
        );
        Ok(receipt)
    }

    /// Deletes one campaign.
    pub fn delete_campaign(&self, campaign_id: &str) -> Result<(), CampaignServiceError> {
        self.store.transaction(|access| {
            let mut campaigns = CAMPAIGNS.load(access, self.seed, now_epoch_ms())?;
            let before = campaigns.len();
            campaigns.retain(|campaign| campaign.id != campaign_id);
            if campaigns.len() == before {
                return Err(CampaignServiceError::CampaignNotFound(
                    campaign_id.to_string(),
                ));
            }
            CAMPAIGNS.save(access, &campaigns)?;
            Ok(())
        })?;

        info!("event=campaign_delete module=service status=ok campaign_id={campaign_id}");
        Ok(())
    }

    fn mutate_campaign<T>(
        &self,
        campaign_id: &str,
        apply: impl FnOnce(&mut Campaign) -> Result<T, CampaignServiceError>,
    ) -> Result<T, CampaignServiceError> {
        self.store.transaction(|access: &dyn KvAccess| {
            let mut campaigns = CAMPAIGNS.load(access, self.seed, now_epoch_ms())?;
            let result = apply(find_mut(&mut campaigns, campaign_id)?)?;
            CAMPAIGNS.save(access, &campaigns)?;
            Ok(result)
        })
    }
}

fn find_mut<'a>(
    campaigns: &'a mut [Campaign],
    campaign_id: &str,
) -> Result<&'a mut Campaign, CampaignServiceError> {
    campaigns
        .iter_mut()
        .find(|campaign| campaign.id == campaign_id)
        .ok_or_else(|| CampaignServiceError::CampaignNotFound(campaign_id.to_string()))
}

fn reject_vote(
    campaign_id: &str,
    event: &'static str,
    err: CampaignRuleError,
) -> CampaignServiceError {
    warn!("event={event} module=service status=rejected campaign_id={campaign_id} reason={err:?}");
    match err {
        CampaignRuleError::AlreadyVoted => {
            CampaignServiceError::AlreadyVoted(campaign_id.to_string())
        }
        CampaignRuleError::NotVoted => CampaignServiceError::NotVoted(campaign_id.to_string()),
    }
}
