//! Core domain logic for Amanah family crowdfunding.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::campaign::{Campaign, CampaignStatus, NewCampaign, MINIMUM_VOTES};
pub use model::currency::{convert_amount, format_amount, Currency};
pub use model::group::{Group, GroupMember, GroupUpdate, NewGroup};
pub use model::invite::InviteCode;
pub use model::language::Language;
pub use model::user::{User, UserProfile, UserRole};
pub use repo::{RepoError, SeedMode};
pub use service::activity_service::ActivityService;
pub use service::auth_service::{AuthError, AuthService, ProfileUpdate};
pub use service::campaign_service::{
    CampaignService, CampaignServiceError, ContributionReceipt, ContributionRequest, VoteOutcome,
};
pub use service::group_service::{GroupDeletion, GroupService, GroupServiceError};
pub use service::invite_service::{InviteError, InviteRegistration, InviteRequest, InviteService};
pub use service::preference_service::PreferenceService;
pub use store::{KvAccess, KvStore, SqliteKvStore, StoreError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
