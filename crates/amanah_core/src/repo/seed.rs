//! Built-in demo datasets written when a collection is first read.

use crate::model::activity::{Activity, ActivityKind};
use crate::model::campaign::{Campaign, CampaignStatus};
use crate::model::group::{
    Group, GroupMember, MemberRole, MemberStatus, CREATOR_CONTACT, CREATOR_MEMBER_ID,
    DEFAULT_CREATOR_NAME,
};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Seed for collections that start empty.
pub fn none<T>(_now_ms: i64) -> Vec<T> {
    Vec::new()
}

pub fn default_campaigns(now_ms: i64) -> Vec<Campaign> {
    vec![
        seeded_campaign(SeedCampaign {
            id: "1",
            title: "Medical Emergency - Uncle Ahmed",
            description: "Uncle Ahmed needs urgent medical treatment for a serious condition.",
            beneficiary_name: "Ahmed Hassan",
            group: ("1", "Extended Family Circle"),
            current: 3200.0,
            target: 5000.0,
            status: CampaignStatus::Active,
            contributors: 12,
            created_at: now_ms - 2 * DAY_MS,
            votes: 8,
        }),
        seeded_campaign(SeedCampaign {
            id: "2",
            title: "Education Support - Cousin Sara",
            description: "Supporting Sara's university education expenses.",
            beneficiary_name: "Sara Ahmed",
            group: ("1", "Extended Family Circle"),
            current: 1800.0,
            target: 3000.0,
            status: CampaignStatus::Active,
            contributors: 8,
            created_at: now_ms - 5 * DAY_MS,
            votes: 5,
        }),
        seeded_campaign(SeedCampaign {
            id: "3",
            title: "Home Repair - Aunt Fatima",
            description: "Helping Aunt Fatima repair her home after storm damage.",
            beneficiary_name: "Fatima Rahman",
            group: ("2", "Close Family"),
            current: 4500.0,
            target: 4500.0,
            status: CampaignStatus::Completed,
            contributors: 15,
            created_at: now_ms - 30 * DAY_MS,
            votes: 10,
        }),
    ]
}

pub fn default_groups(now_ms: i64) -> Vec<Group> {
    vec![
        seeded_group(
            "1",
            "Extended Family Circle",
            "Supporting our extended family",
            &[("Sarah Miller", "sarah@email.com"), ("Ali Khan", "+1234567890")],
            now_ms,
        ),
        seeded_group(
            "2",
            "Close Family",
            "Immediate family support",
            &[("Mom", "mom@email.com")],
            now_ms,
        ),
        seeded_group(
            "3",
            "Community Support",
            "Wider community network",
            &[],
            now_ms,
        ),
    ]
}

pub fn default_activities(now_ms: i64) -> Vec<Activity> {
    vec![
        Activity {
            id: "1".to_string(),
            kind: ActivityKind::Contribution,
            user: "John D.".to_string(),
            action: ActivityKind::Contribution.action_text().to_string(),
            campaign: Some("Medical Emergency - Uncle Ahmed".to_string()),
            amount: Some(100.0),
            currency: Some("USD".to_string()),
            is_private: Some(false),
            created_at: now_ms - 2 * HOUR_MS,
        },
        Activity {
            id: "2".to_string(),
            kind: ActivityKind::CampaignCreated,
            user: "Sarah M.".to_string(),
            action: ActivityKind::CampaignCreated.action_text().to_string(),
            campaign: Some("Education Support - Cousin Sara".to_string()),
            amount: None,
            currency: None,
            is_private: None,
            created_at: now_ms - 5 * HOUR_MS,
        },
        Activity {
            id: "3".to_string(),
            kind: ActivityKind::Contribution,
            user: DEFAULT_CREATOR_NAME.to_string(),
            action: ActivityKind::Contribution.action_text().to_string(),
            campaign: Some("Home Repair - Aunt Fatima".to_string()),
            amount: Some(50.0),
            currency: Some("USD".to_string()),
            is_private: Some(false),
            created_at: now_ms - DAY_MS,
        },
    ]
}

struct SeedCampaign {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    beneficiary_name: &'static str,
    group: (&'static str, &'static str),
    current: f64,
    target: f64,
    status: CampaignStatus,
    contributors: u32,
    created_at: i64,
    votes: u32,
}

fn seeded_campaign(seed: SeedCampaign) -> Campaign {
    Campaign {
        id: seed.id.to_string(),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        beneficiary_name: seed.beneficiary_name.to_string(),
        group_id: seed.group.0.to_string(),
        group_name: seed.group.1.to_string(),
        current: seed.current,
        target: seed.target,
        currency: "USD".to_string(),
        status: seed.status,
        contributors: seed.contributors,
        created_at: seed.created_at,
        due_date: None,
        votes: seed.votes,
        voted_by: Vec::new(),
        needs_approval: None,
    }
}

fn seeded_group(
    id: &str,
    name: &str,
    description: &str,
    others: &[(&str, &str)],
    now_ms: i64,
) -> Group {
    let mut members = vec![GroupMember {
        id: CREATOR_MEMBER_ID.to_string(),
        name: DEFAULT_CREATOR_NAME.to_string(),
        contact: CREATOR_CONTACT.to_string(),
        role: MemberRole::Admin,
        status: MemberStatus::Active,
        joined_date: now_ms,
    }];
    for (index, (member_name, contact)) in others.iter().enumerate() {
        members.push(GroupMember {
            id: (index + 2).to_string(),
            name: member_name.to_string(),
            contact: contact.to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Active,
            joined_date: now_ms,
        });
    }

    Group {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        members: members.len() as u32,
        member_list: Some(members),
    }
}
