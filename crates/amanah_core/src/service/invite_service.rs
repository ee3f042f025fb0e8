//! Invite code issuance, validation and invite-gated registration.
//!
//! # Invariants
//! - Issued codes are unique among stored codes.
//! - A code is consumed at most once.
//! - `register_with_invite` is all-or-nothing: account, group membership and
//!   code consumption commit together.
//! - A scoped code whose group no longer exists still registers the account,
//!   without a group.

use crate::model::invite::{
    generate_invite_code, is_well_formed_invite_code, normalize_invite_code, InviteCode,
    InviteRejection,
};
use crate::model::now_epoch_ms;
use crate::model::user::User;
use crate::repo::keys::CURRENT_USER;
use crate::repo::{save_value, RepoError, SeedMode, INVITE_CODES};
use crate::service::auth_service::{register_in, AuthError};
use crate::service::group_service::{add_user_to_group_in, GroupServiceError};
use crate::store::{KvAccess, KvStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_CODE_ATTEMPTS: usize = 16;

/// Errors from invite use-cases.
#[derive(Debug)]
pub enum InviteError {
    InvalidCode(String),
    Rejected(InviteRejection),
    CodeSpaceExhausted,
    Auth(AuthError),
    Group(GroupServiceError),
    Repo(RepoError),
}

impl Display for InviteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCode(_) => write!(f, "Invalid invite code"),
            Self::Rejected(reason) => write!(f, "{reason}"),
            Self::CodeSpaceExhausted => write!(f, "could not generate a unique invite code"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Group(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InviteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Group(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for InviteError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for InviteError {
    fn from(value: StoreError) -> Self {
        Self::Repo(RepoError::Store(value))
    }
}

impl From<AuthError> for InviteError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<GroupServiceError> for InviteError {
    fn from(value: GroupServiceError) -> Self {
        Self::Group(value)
    }
}

impl From<InviteRejection> for InviteError {
    fn from(value: InviteRejection) -> Self {
        Self::Rejected(value)
    }
}

/// Parameters for issuing a code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteRequest {
    pub created_by: String,
    /// `None` never expires.
    pub expiry_days: Option<u32>,
    /// Redeeming joins the new account to this group.
    pub group_id: Option<String>,
}

/// Outcome of an invite-gated registration.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteRegistration {
    pub user: User,
    pub invite: InviteCode,
    /// Group joined through the code, if any.
    pub joined_group: Option<String>,
}

pub struct InviteService<S: KvStore> {
    store: S,
    seed: SeedMode,
}

impl<S: KvStore> InviteService<S> {
    pub fn new(store: S) -> Self {
        Self::with_seed_mode(store, SeedMode::default())
    }

    /// `seed` governs the group collection touched by group-scoped codes.
    pub fn with_seed_mode(store: S, seed: SeedMode) -> Self {
        Self { store, seed }
    }

    /// Issues a fresh code.
    pub fn create_invite(&self, request: &InviteRequest) -> Result<InviteCode, InviteError> {
        let now_ms = now_epoch_ms();
        let invite = self.store.transaction(|access| {
            let mut invites = INVITE_CODES.load(access, SeedMode::Empty, now_ms)?;
            let code = unique_code(&invites)?;
            let invite = InviteCode::issue(
                code,
                &request.created_by,
                request.expiry_days,
                request.group_id.clone(),
                now_ms,
            );
            invites.push(invite.clone());
            INVITE_CODES.save(access, &invites)?;
            Ok::<_, InviteError>(invite)
        })?;

        info!(
            "event=invite_create module=service status=ok invite_id={} group_scoped={}",
            invite.id,
            invite.group_id.is_some()
        );
        Ok(invite)
    }

    pub fn list_invites(&self) -> Result<Vec<InviteCode>, InviteError> {
        Ok(INVITE_CODES.load(&self.store, SeedMode::Empty, now_epoch_ms())?)
    }

    /// Looks a code up in normalized form.
    pub fn get_invite_by_code(&self, code: &str) -> Result<Option<InviteCode>, InviteError> {
        if !is_well_formed_invite_code(code) {
            return Ok(None);
        }
        Ok(self
            .list_invites()?
            .into_iter()
            .find(|invite| invite.matches(code)))
    }

    /// Returns the code when it can currently be redeemed.
    pub fn validate_invite(&self, code: &str) -> Result<InviteCode, InviteError> {
        let invite = self
            .get_invite_by_code(code)?
            .ok_or_else(|| InviteError::InvalidCode(normalize_invite_code(code)))?;
        invite.check_redeemable(now_epoch_ms())?;
        Ok(invite)
    }

    /// Consumes a code on behalf of `user_id`.
    pub fn mark_invite_used(&self, code: &str, user_id: &str) -> Result<InviteCode, InviteError> {
        let invite = self
            .store
            .transaction(|access| redeem_in(access, code, user_id, now_epoch_ms()))?;
        info!(
            "event=invite_redeem module=service status=ok invite_id={} user_id={user_id}",
            invite.id
        );
        Ok(invite)
    }

    /// Deactivates a code. Returns `false` when no such code exists.
    pub fn deactivate_invite(&self, code: &str) -> Result<bool, InviteError> {
        let found = self.store.transaction(|access| {
            let mut invites = INVITE_CODES.load(access, SeedMode::Empty, now_epoch_ms())?;
            let Some(invite) = invites.iter_mut().find(|invite| invite.matches(code)) else {
                return Ok::<_, InviteError>(None);
            };
            invite.is_active = false;
            let invite_id = invite.id.clone();
            INVITE_CODES.save(access, &invites)?;
            Ok(Some(invite_id))
        })?;
        match found.as_deref() {
            Some(invite_id) => {
                info!("event=invite_deactivate module=service status=ok invite_id={invite_id}")
            }
            None => warn!("event=invite_deactivate module=service status=rejected error_code=not_found"),
        }
        Ok(found.is_some())
    }

    /// Registers an account gated by an invite code and starts its session.
    ///
    /// Group-scoped codes also add the new account to that group when it
    /// still exists.
    pub fn register_with_invite(
        &self,
        code: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<InviteRegistration, InviteError> {
        if !is_well_formed_invite_code(code) {
            return Err(InviteError::InvalidCode(normalize_invite_code(code)));
        }
        let now_ms = now_epoch_ms();
        let result = self.store.transaction(|access| {
            let invites = INVITE_CODES.load(access, SeedMode::Empty, now_ms)?;
            let invite = invites
                .iter()
                .find(|invite| invite.matches(code))
                .ok_or_else(|| InviteError::InvalidCode(normalize_invite_code(code)))?;
            invite.check_redeemable(now_ms)?;
            let group_id = invite.group_id.clone();

            let user = register_in(access, email, password, name, now_ms)?;
            let joined_group = match group_id {
                Some(group_id) => join_scoped_group(access, self.seed, group_id, &user)?,
                None => None,
            };
            let invite = redeem_in(access, code, &user.id, now_ms)?;
            save_value(access, CURRENT_USER, &user)?;

            Ok::<_, InviteError>(InviteRegistration {
                user,
                invite,
                joined_group,
            })
        });

        match result {
            Ok(registration) => {
                info!(
                    "event=invite_register module=service status=ok user_id={} invite_id={}",
                    registration.user.id, registration.invite.id
                );
                Ok(registration)
            }
            Err(err) => {
                warn!("event=invite_register module=service status=rejected error={err}");
                Err(err)
            }
        }
    }
}

fn join_scoped_group(
    access: &dyn KvAccess,
    seed: SeedMode,
    group_id: String,
    user: &User,
) -> Result<Option<String>, InviteError> {
    match add_user_to_group_in(access, seed, &group_id, &user.id, &user.name, &user.email) {
        Ok(_) => Ok(Some(group_id)),
        Err(GroupServiceError::GroupNotFound(_)) => {
            warn!(
                "event=invite_register module=service status=degraded group_id={group_id} error_code=group_not_found"
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn redeem_in(
    access: &dyn KvAccess,
    code: &str,
    user_id: &str,
    now_ms: i64,
) -> Result<InviteCode, InviteError> {
    let mut invites = INVITE_CODES.load(access, SeedMode::Empty, now_ms)?;
    let invite = invites
        .iter_mut()
        .find(|invite| invite.matches(code))
        .ok_or_else(|| InviteError::InvalidCode(normalize_invite_code(code)))?;
    invite.redeem(user_id, now_ms)?;
    let redeemed = invite.clone();
    INVITE_CODES.save(access, &invites)?;
    Ok(redeemed)
}

fn unique_code(existing: &[InviteCode]) -> Result<String, InviteError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = generate_invite_code();
        if !existing.iter().any(|invite| invite.code == candidate) {
            return Ok(candidate);
        }
    }
    Err(InviteError::CodeSpaceExhausted)
}
