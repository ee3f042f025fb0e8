//! Storage keys for every persisted collection and value.

pub const USERS: &str = "amanah_users";
pub const CURRENT_USER: &str = "amanah_current_user";
pub const PROFILE_PREFIX: &str = "amanah_profile_";
pub const CAMPAIGNS: &str = "amanah_campaigns";
pub const GROUPS: &str = "amanah_groups";
pub const ACTIVITIES: &str = "amanah_activities";
pub const LANGUAGE: &str = "amanah_language";
pub const INVITE_CODES: &str = "amanah_invite_codes";

/// Key holding the profile extension of one user.
pub fn profile_key(user_id: &str) -> String {
    format!("{PROFILE_PREFIX}{user_id}")
}
