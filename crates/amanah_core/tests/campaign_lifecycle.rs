use amanah_core::db::{open_db, open_db_in_memory};
use amanah_core::model::activity::{ActivityKind, ANONYMOUS_DISPLAY_NAME};
use amanah_core::model::campaign::{
    VOTE_ACTIVATED_MESSAGE, VOTE_DEACTIVATED_MESSAGE, VOTE_RECORDED_MESSAGE,
    VOTE_REMOVED_MESSAGE,
};
use amanah_core::{
    ActivityService, Campaign, CampaignService, CampaignServiceError, CampaignStatus,
    ContributionRequest, NewCampaign, SeedMode, SqliteKvStore,
};
use rusqlite::Connection;

fn new_campaign(target: f64) -> NewCampaign {
    NewCampaign {
        title: "Wedding - Cousin Omar".to_string(),
        description: "Help Omar with wedding costs".to_string(),
        beneficiary_name: "Omar Saleh".to_string(),
        group_id: "g1".to_string(),
        group_name: "Close Family".to_string(),
        target,
        currency: "sek".to_string(),
        due_date: None,
        needs_approval: Some(true),
    }
}

fn service(conn: &Connection) -> CampaignService<SqliteKvStore<'_>> {
    CampaignService::with_seed_mode(SqliteKvStore::try_new(conn).unwrap(), SeedMode::Empty)
}

fn contribution(campaign: &Campaign, amount: f64, is_private: bool) -> ContributionRequest {
    ContributionRequest {
        campaign_id: campaign.id.clone(),
        amount,
        is_private,
        contributor_name: "Layla".to_string(),
    }
}

#[test]
fn full_lifecycle_from_pending_to_completed() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);

    let campaign = campaigns.create_campaign(&new_campaign(500.0), "Layla").unwrap();
    assert_eq!(campaign.status, CampaignStatus::Pending);
    assert_eq!(campaign.currency, "SEK");
    assert_eq!(campaign.votes_needed(), 3);

    let first = campaigns.vote(&campaign.id, "u1").unwrap();
    assert_eq!(first.message, VOTE_RECORDED_MESSAGE);
    assert!(!first.status_changed);
    campaigns.vote(&campaign.id, "u2").unwrap();
    let third = campaigns.vote(&campaign.id, "u3").unwrap();
    assert_eq!(third.message, VOTE_ACTIVATED_MESSAGE);
    assert!(third.status_changed);
    assert_eq!(third.campaign.status, CampaignStatus::Active);

    let receipt = campaigns
        .contribute(&contribution(&campaign, third.campaign.remaining(), false))
        .unwrap();
    assert!(receipt.completed);
    assert_eq!(receipt.campaign.status, CampaignStatus::Completed);
    assert_eq!(receipt.campaign.contributors, 1);
    assert_eq!(receipt.campaign.progress_percent(), 100.0);

    let unvote = campaigns.remove_vote(&campaign.id, "u1").unwrap();
    assert_eq!(unvote.campaign.votes, 2);
    assert_eq!(unvote.campaign.status, CampaignStatus::Completed);
    assert_eq!(unvote.message, VOTE_REMOVED_MESSAGE);
}

#[test]
fn duplicate_vote_is_rejected_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();

    campaigns.vote(&campaign.id, "u1").unwrap();
    let err = campaigns.vote(&campaign.id, "u1").unwrap_err();
    assert!(matches!(err, CampaignServiceError::AlreadyVoted(_)));
    assert_eq!(err.to_string(), "You have already voted for this campaign");

    let stored = campaigns.get_campaign(&campaign.id).unwrap().unwrap();
    assert_eq!(stored.votes, 1);
    assert_eq!(stored.voted_by, vec!["u1".to_string()]);
}

#[test]
fn unvote_without_vote_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();

    let err = campaigns.remove_vote(&campaign.id, "stranger").unwrap_err();
    assert!(matches!(err, CampaignServiceError::NotVoted(_)));
    assert_eq!(err.to_string(), "You have not voted for this campaign");
}

#[test]
fn dropping_below_threshold_deactivates_active_campaign() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();
    for voter in ["u1", "u2", "u3"] {
        campaigns.vote(&campaign.id, voter).unwrap();
    }

    let outcome = campaigns.remove_vote(&campaign.id, "u2").unwrap();
    assert!(outcome.status_changed);
    assert_eq!(outcome.message, VOTE_DEACTIVATED_MESSAGE);
    assert_eq!(outcome.campaign.status, CampaignStatus::Pending);
    assert_eq!(outcome.campaign.votes, 2);

    let again = campaigns.vote(&campaign.id, "u4").unwrap();
    assert_eq!(again.campaign.status, CampaignStatus::Active);
}

#[test]
fn contributions_to_completed_campaign_still_accumulate() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();
    for voter in ["u1", "u2", "u3"] {
        campaigns.vote(&campaign.id, voter).unwrap();
    }
    campaigns.contribute(&contribution(&campaign, 150.0, false)).unwrap();

    let receipt = campaigns.contribute(&contribution(&campaign, 25.0, false)).unwrap();
    assert!(!receipt.completed);
    assert_eq!(receipt.campaign.status, CampaignStatus::Completed);
    assert_eq!(receipt.campaign.current, 175.0);
    assert_eq!(receipt.campaign.contributors, 2);
    assert_eq!(receipt.campaign.remaining(), 0.0);
}

#[test]
fn pending_campaign_accepts_funds_but_does_not_complete() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();

    let receipt = campaigns.contribute(&contribution(&campaign, 200.0, false)).unwrap();
    assert!(!receipt.completed);
    assert_eq!(receipt.campaign.status, CampaignStatus::Pending);
    assert_eq!(receipt.campaign.current, 200.0);
}

#[test]
fn private_contribution_is_logged_anonymously() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();

    let receipt = campaigns.contribute(&contribution(&campaign, 10.0, true)).unwrap();
    assert_eq!(receipt.activity.kind, ActivityKind::Contribution);
    assert_eq!(receipt.activity.user, ANONYMOUS_DISPLAY_NAME);
    assert_eq!(receipt.activity.is_private, Some(true));

    let feed = ActivityService::with_seed_mode(SqliteKvStore::try_new(&conn).unwrap(), SeedMode::Empty)
        .list_activities(None)
        .unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].id, receipt.activity.id);
    assert_eq!(feed[1].kind, ActivityKind::CampaignCreated);
}

#[test]
fn invalid_input_and_unknown_ids_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);

    let mut blank = new_campaign(100.0);
    blank.title = "  ".to_string();
    assert!(matches!(
        campaigns.create_campaign(&blank, "Layla").unwrap_err(),
        CampaignServiceError::Validation(_)
    ));
    assert!(matches!(
        campaigns.create_campaign(&new_campaign(0.0), "Layla").unwrap_err(),
        CampaignServiceError::Validation(_)
    ));

    let campaign = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();
    assert!(matches!(
        campaigns.contribute(&contribution(&campaign, -5.0, false)).unwrap_err(),
        CampaignServiceError::Validation(_)
    ));
    let missing = ContributionRequest {
        campaign_id: "missing".to_string(),
        ..contribution(&campaign, 5.0, false)
    };
    let err = campaigns.contribute(&missing).unwrap_err();
    assert_eq!(err.to_string(), "Campaign not found");
    assert!(matches!(
        campaigns.vote("missing", "u1").unwrap_err(),
        CampaignServiceError::CampaignNotFound(_)
    ));

    let stored = campaigns.get_campaign(&campaign.id).unwrap().unwrap();
    assert_eq!(stored.current, 0.0);
    assert_eq!(stored.contributors, 0);
}

#[test]
fn filters_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = service(&conn);
    let first = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();
    let mut other_group = new_campaign(100.0);
    other_group.group_id = "g2".to_string();
    let second = campaigns.create_campaign(&other_group, "Layla").unwrap();
    for voter in ["u1", "u2", "u3"] {
        campaigns.vote(&second.id, voter).unwrap();
    }

    let all = campaigns.list_campaigns().unwrap();
    assert_eq!(all[0].id, second.id);
    assert_eq!(campaigns.list_campaigns_by_group("g1").unwrap().len(), 1);
    let active = campaigns.list_campaigns_by_status(CampaignStatus::Active).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);

    campaigns.delete_campaign(&first.id).unwrap();
    assert!(campaigns.get_campaign(&first.id).unwrap().is_none());
    assert!(matches!(
        campaigns.delete_campaign(&first.id).unwrap_err(),
        CampaignServiceError::CampaignNotFound(_)
    ));
}

#[test]
fn demo_seed_provides_three_campaigns() {
    let conn = open_db_in_memory().unwrap();
    let campaigns = CampaignService::new(SqliteKvStore::try_new(&conn).unwrap());

    let seeded = campaigns.list_campaigns().unwrap();
    assert_eq!(seeded.len(), 3);
    assert_eq!(
        campaigns.list_campaigns_by_status(CampaignStatus::Completed).unwrap().len(),
        1
    );

    let created = campaigns.create_campaign(&new_campaign(100.0), "Layla").unwrap();
    let all = campaigns.list_campaigns().unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].id, created.id);
}

#[test]
fn concurrent_voters_on_separate_connections_are_all_counted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("amanah.db");
    let campaign = {
        let conn = open_db(&path).unwrap();
        service(&conn).create_campaign(&new_campaign(500.0), "Layla").unwrap()
    };

    let voters: Vec<_> = (0..4)
        .map(|thread| {
            let path = path.clone();
            let campaign_id = campaign.id.clone();
            std::thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let campaigns = service(&conn);
                for vote in 0..25 {
                    campaigns
                        .vote(&campaign_id, &format!("t{thread}-v{vote}"))
                        .unwrap();
                }
            })
        })
        .collect();
    for voter in voters {
        voter.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let stored = service(&conn).get_campaign(&campaign.id).unwrap().unwrap();
    assert_eq!(stored.votes, 100);
    assert_eq!(stored.voted_by.len(), 100);
    assert_eq!(stored.status, CampaignStatus::Active);
}
