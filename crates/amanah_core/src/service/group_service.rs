//! Family group use-case service.
//!
//! # Invariants
//! - Admin members are never removed.
//! - Deleting a group deletes its campaigns and deactivates its invite codes
//!   in the same transaction.
//! - Member counts are recomputed on every membership change.

use crate::model::activity::NewActivity;
use crate::model::group::{Group, GroupMember, GroupUpdate, MembershipError, NewGroup};
use crate::model::{now_epoch_ms, ModelValidationError};
use crate::repo::{RepoError, SeedMode, CAMPAIGNS, GROUPS, INVITE_CODES};
use crate::service::activity_service::append_activity;
use crate::store::{KvAccess, KvStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from group use-cases.
#[derive(Debug)]
pub enum GroupServiceError {
    Validation(ModelValidationError),
    GroupNotFound(String),
    MemberNotFound { group_id: String, member_id: String },
    AdminMemberProtected { group_id: String, member_id: String },
    Repo(RepoError),
}

impl Display for GroupServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::MemberNotFound {
                group_id,
                member_id,
            } => write!(f, "member {member_id} not found in group {group_id}"),
            Self::AdminMemberProtected {
                group_id,
                member_id,
            } => write!(
                f,
                "member {member_id} is an admin of group {group_id} and cannot be removed"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GroupServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GroupServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for GroupServiceError {
    fn from(value: StoreError) -> Self {
        Self::Repo(RepoError::Store(value))
    }
}

impl From<ModelValidationError> for GroupServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Summary of a cascading group deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDeletion {
    pub group_id: String,
    pub campaigns_removed: usize,
    pub invites_deactivated: usize,
}

/// Group service facade over a key-value store.
pub struct GroupService<S: KvStore> {
    store: S,
    seed: SeedMode,
}

impl<S: KvStore> GroupService<S> {
    pub fn new(store: S) -> Self {
        Self::with_seed_mode(store, SeedMode::default())
    }

    pub fn with_seed_mode(store: S, seed: SeedMode) -> Self {
        Self { store, seed }
    }

    /// Creates a group with the creator as admin plus invited members, and
    /// logs a `group_created` activity.
    pub fn create_group(
        &self,
        input: &NewGroup,
        creator_name: &str,
    ) -> Result<Group, GroupServiceError> {
        let now_ms = now_epoch_ms();
        let group = Group::create(input, Some(creator_name), now_ms)?;

        self.store.transaction(|access| {
            let mut groups = GROUPS.load(access, self.seed, now_ms)?;
            groups.insert(0, group.clone());
            GROUPS.save(access, &groups)?;
            append_activity(
                access,
                self.seed,
                NewActivity::group_created(creator_name, &group.name),
                now_ms,
            )?;
            Ok::<_, GroupServiceError>(())
        })?;

        info!(
            "event=group_create module=service status=ok group_id={} members={}",
            group.id, group.members
        );
        Ok(group)
    }

    /// Lists all groups, newest first.
    pub fn list_groups(&self) -> Result<Vec<Group>, GroupServiceError> {
        let groups = self
            .store
            .transaction(|access| GROUPS.load(access, self.seed, now_epoch_ms()))?;
        Ok(groups)
    }

    pub fn get_group(&self, group_id: &str) -> Result<Option<Group>, GroupServiceError> {
        Ok(self
            .list_groups()?
            .into_iter()
            .find(|group| group.id == group_id))
    }

    /// Invites contacts as new members; returns the updated group.
    pub fn add_members(
        &self,
        group_id: &str,
        contacts: &[String],
    ) -> Result<Group, GroupServiceError> {
        let now_ms = now_epoch_ms();
        let group = self.mutate_group(group_id, |group| {
            group.invite_members(contacts, now_ms);
            Ok(group.clone())
        })?;
        info!(
            "event=group_add_members module=service status=ok group_id={group_id} members={}",
            group.members
        );
        Ok(group)
    }

    /// Adds a registered user as an active member.
    ///
    /// Returns `false` when the user's email is already a member contact.
    pub fn add_user_to_group(
        &self,
        group_id: &str,
        user_id: &str,
        name: &str,
        email: &str,
    ) -> Result<bool, GroupServiceError> {
        self.store.transaction(|access| {
            add_user_to_group_in(access, self.seed, group_id, user_id, name, email)
        })
    }

    /// Removes a non-admin member and returns it.
    pub fn remove_member(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> Result<GroupMember, GroupServiceError> {
        let removed = self.mutate_group(group_id, |group| {
            group.remove_member(member_id).map_err(|err| {
                warn!(
                    "event=group_remove_member module=service status=rejected group_id={group_id} member_id={member_id} reason={err:?}"
                );
                membership_error(group_id, err)
            })
        })?;
        info!(
            "event=group_remove_member module=service status=ok group_id={group_id} member_id={member_id}"
        );
        Ok(removed)
    }

    /// Applies a partial update to name/description.
    pub fn update_group(
        &self,
        group_id: &str,
        update: &GroupUpdate,
    ) -> Result<Group, GroupServiceError> {
        self.mutate_group(group_id, |group| {
            group.apply_update(update);
            Ok(group.clone())
        })
    }

    /// Deletes a group together with all of its campaigns. Active invite
    /// codes scoped to the group are deactivated.
    pub fn delete_group(&self, group_id: &str) -> Result<GroupDeletion, GroupServiceError> {
        let now_ms = now_epoch_ms();
        let deletion = self.store.transaction(|access| {
            let mut groups = GROUPS.load(access, self.seed, now_ms)?;
            let before = groups.len();
            groups.retain(|group| group.id != group_id);
            if groups.len() == before {
                return Err(GroupServiceError::GroupNotFound(group_id.to_string()));
            }

            let mut campaigns = CAMPAIGNS.load(access, self.seed, now_ms)?;
            let campaigns_before = campaigns.len();
            campaigns.retain(|campaign| campaign.group_id != group_id);
            let campaigns_removed = campaigns_before - campaigns.len();

            let mut invites = INVITE_CODES.load(access, SeedMode::Empty, now_ms)?;
            let mut invites_deactivated = 0;
            for invite in invites
                .iter_mut()
                .filter(|invite| invite.is_active && invite.group_id.as_deref() == Some(group_id))
            {
                invite.is_active = false;
                invites_deactivated += 1;
            }
            if invites_deactivated > 0 {
                INVITE_CODES.save(access, &invites)?;
            }

            CAMPAIGNS.save(access, &campaigns)?;
            GROUPS.save(access, &groups)?;
            Ok(GroupDeletion {
                group_id: group_id.to_string(),
                campaigns_removed,
                invites_deactivated,
            })
        })?;

        info!(
            "event=group_delete module=service status=ok group_id={group_id} campaigns_removed={} invites_deactivated={}",
            deletion.campaigns_removed, deletion.invites_deactivated
        );
        Ok(deletion)
    }

    fn mutate_group<T>(
        &self,
        group_id: &str,
        apply: impl FnOnce(&mut Group) -> Result<T, GroupServiceError>,
    ) -> Result<T, GroupServiceError> {
        self.store.transaction(|access: &dyn KvAccess| {
            let mut groups = GROUPS.load(access, self.seed, now_epoch_ms())?;
            let group = groups
                .iter_mut()
                .find(|group| group.id == group_id)
                .ok_or_else(|| GroupServiceError::GroupNotFound(group_id.to_string()))?;
            let result = apply(group)?;
            GROUPS.save(access, &groups)?;
            Ok(result)
        })
    }
}

/// Joins a user to a group inside an open store scope.
pub(crate) fn add_user_to_group_in(
    access: &dyn KvAccess,
    seed: SeedMode,
    group_id: &str,
    user_id: &str,
    name: &str,
    email: &str,
) -> Result<bool, GroupServiceError> {
    let now_ms = now_epoch_ms();
    let mut groups = GROUPS.load(access, seed, now_ms)?;
    let group = groups
        .iter_mut()
        .find(|group| group.id == group_id)
        .ok_or_else(|| GroupServiceError::GroupNotFound(group_id.to_string()))?;
    let added = group.add_active_member(name, email, now_ms);
    if added {
        GROUPS.save(access, &groups)?;
    }
    info!(
        "event=group_add_user module=service status=ok group_id={group_id} user_id={user_id} added={added}"
    );
    Ok(added)
}

fn membership_error(group_id: &str, err: MembershipError) -> GroupServiceError {
    match err {
        MembershipError::MemberNotFound(member_id) => GroupServiceError::MemberNotFound {
            group_id: group_id.to_string(),
            member_id,
        },
        MembershipError::AdminMemberProtected(member_id) => {
            GroupServiceError::AdminMemberProtected {
                group_id: group_id.to_string(),
                member_id,
            }
        }
    }
}
