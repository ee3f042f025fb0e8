//! Family group model and membership rules.
//!
//! # Invariants
//! - `members` equals `member_list.len()` after every mutation made here.
//! - The creator is stored as member id `"1"` with role `Admin`.
//! - Admin members cannot be removed.
//! - Member ids are decimal strings local to one group; new ids continue from
//!   the current numeric maximum.

use super::{new_record_id, require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const CREATOR_MEMBER_ID: &str = "1";
pub const CREATOR_CONTACT: &str = "creator";
pub const DEFAULT_CREATOR_NAME: &str = "You";
pub const INVITED_MEMBER_NAME: &str = "Invited Member";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Invited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    pub name: String,
    /// Email address or phone number.
    pub contact: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member count.
    pub members: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_list: Option<Vec<GroupMember>>,
}

/// Caller input for creating a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    /// Contacts to invite; blank entries are ignored.
    pub invites: Vec<String>,
}

/// Partial update for group details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupUpdate {
    /// Applied only when non-blank.
    pub name: Option<String>,
    /// Applied whenever present; an empty string clears the description.
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    MemberNotFound(String),
    AdminMemberProtected(String),
}

impl Display for MembershipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberNotFound(id) => write!(f, "group member not found: {id}"),
            Self::AdminMemberProtected(id) => {
                write!(f, "group admin cannot be removed: {id}")
            }
        }
    }
}

impl Error for MembershipError {}

impl GroupMember {
    fn creator(name: &str, now_ms: i64) -> Self {
        Self {
            id: CREATOR_MEMBER_ID.to_string(),
            name: name.to_string(),
            contact: CREATOR_CONTACT.to_string(),
            role: MemberRole::Admin,
            status: MemberStatus::Active,
            joined_date: now_ms,
        }
    }

    fn invited(id: u64, contact: &str, now_ms: i64) -> Self {
        Self {
            id: id.to_string(),
            name: INVITED_MEMBER_NAME.to_string(),
            contact: contact.to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Invited,
            joined_date: now_ms,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

impl Group {
    /// Creates a group whose first member is the creator as admin.
    pub fn create(
        input: &NewGroup,
        creator_name: Option<&str>,
        now_ms: i64,
    ) -> Result<Self, ModelValidationError> {
        let name = require_text("name", &input.name)?;
        let creator_name = creator_name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CREATOR_NAME);

        let mut group = Self {
            id: new_record_id(),
            name,
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            members: 0,
            member_list: Some(vec![GroupMember::creator(creator_name, now_ms)]),
        };
        group.invite_members(&input.invites, now_ms);
        Ok(group)
    }

    pub fn member_list(&self) -> &[GroupMember] {
        self.member_list.as_deref().unwrap_or(&[])
    }

    pub fn admins(&self) -> impl Iterator<Item = &GroupMember> {
        self.member_list().iter().filter(|member| member.is_admin())
    }

    /// Next free member id: numeric maximum plus one.
    ///
    /// Non-numeric ids count as zero.
    pub fn next_member_id(&self) -> u64 {
        self.member_list()
            .iter()
            .map(|member| member.id.trim().parse::<u64>().unwrap_or(0))
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Appends invited members for every non-blank contact.
    ///
    /// Returns the number of members added.
    pub fn invite_members(&mut self, contacts: &[String], now_ms: i64) -> usize {
        self.ensure_member_list(now_ms);
        let mut next_id = self.next_member_id();
        let members = self.ensure_member_list(now_ms);
        let mut added = 0;
        for contact in contacts.iter().map(|value| value.trim()) {
            if contact.is_empty() {
                continue;
            }
            members.push(GroupMember::invited(next_id, contact, now_ms));
            next_id += 1;
            added += 1;
        }
        self.sync_member_count();
        added
    }

    /// Adds a registered user as an active member.
    ///
    /// Returns `false` when a member with the same contact already exists.
    pub fn add_active_member(&mut self, name: &str, contact: &str, now_ms: i64) -> bool {
        let contact = contact.trim();
        self.ensure_member_list(now_ms);
        let next_id = self.next_member_id();
        let members = self.ensure_member_list(now_ms);
        if members
            .iter()
            .any(|member| member.contact.eq_ignore_ascii_case(contact))
        {
            return false;
        }
        members.push(GroupMember {
            id: next_id.to_string(),
            name: name.trim().to_string(),
            contact: contact.to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Active,
            joined_date: now_ms,
        });
        self.sync_member_count();
        true
    }

    /// Removes one non-admin member.
    pub fn remove_member(&mut self, member_id: &str) -> Result<GroupMember, MembershipError> {
        let members = self
            .member_list
            .as_mut()
            .ok_or_else(|| MembershipError::MemberNotFound(member_id.to_string()))?;
        let index = members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or_else(|| MembershipError::MemberNotFound(member_id.to_string()))?;
        if members[index].is_admin() {
            return Err(MembershipError::AdminMemberProtected(member_id.to_string()));
        }

        let removed = members.remove(index);
        self.sync_member_count();
        Ok(removed)
    }

    /// Applies a partial details update. Returns whether anything changed.
    pub fn apply_update(&mut self, update: &GroupUpdate) -> bool {
        let mut changed = false;
        if let Some(name) = update
            .name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            if self.name != name {
                self.name = name.to_string();
                changed = true;
            }
        }
        if let Some(description) = update.description.as_deref() {
            let description = Some(description.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            if self.description != description {
                self.description = description;
                changed = true;
            }
        }
        changed
    }

    fn ensure_member_list(&mut self, now_ms: i64) -> &mut Vec<GroupMember> {
        self.member_list
            .get_or_insert_with(|| vec![GroupMember::creator(DEFAULT_CREATOR_NAME, now_ms)])
    }

    fn sync_member_count(&mut self) {
        self.members = self.member_list().len() as u32;
    }
}
