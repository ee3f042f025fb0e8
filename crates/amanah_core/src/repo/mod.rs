//! Typed access to whole-collection blobs stored in the key-value store.
//!
//! # Responsibility
//! - Map storage keys to record types and JSON encoding.
//! - Supply seed datasets for collections that are missing.
//!
//! # Invariants
//! - A collection is always read and written as one JSON array.
//! - Corrupt blobs are logged and replaced by defaults on read, never
//!   overwritten implicitly.
//! - Encode failures and store transport failures are surfaced.

use crate::model::activity::Activity;
use crate::model::campaign::Campaign;
use crate::model::group::Group;
use crate::model::invite::InviteCode;
use crate::model::user::AuthUser;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod collection;
pub mod keys;
pub mod seed;

pub use collection::{load_value, remove_value, save_value, Collection, SeedMode};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Encode { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub const CAMPAIGNS: Collection<Campaign> =
    Collection::new(keys::CAMPAIGNS, seed::default_campaigns);
pub const GROUPS: Collection<Group> = Collection::new(keys::GROUPS, seed::default_groups);
pub const ACTIVITIES: Collection<Activity> =
    Collection::new(keys::ACTIVITIES, seed::default_activities);
pub const USERS: Collection<AuthUser> = Collection::new(keys::USERS, seed::none::<AuthUser>);
pub const INVITE_CODES: Collection<InviteCode> =
    Collection::new(keys::INVITE_CODES, seed::none::<InviteCode>);
