//! CLI entry point.
//!
//! # Responsibility
//! - Verify `amanah_core` linkage (`ping`, `version`).
//! - Run the campaign lifecycle scenario against a database to check wiring.
//!
//! Settings come from `AMANAH_*` environment variables; a path given after
//! `demo` overrides `AMANAH_DB_PATH`.

use amanah_core::{
    format_amount, init_from_config, open_db, open_db_in_memory, CampaignService,
    ContributionRequest, CoreConfig, GroupService, NewCampaign, NewGroup, SqliteKvStore,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: amanah_cli [ping|version|demo [DB_PATH]]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None | Some("ping") => {
            println!("amanah_core ping={}", amanah_core::ping());
            println!("amanah_core version={}", amanah_core::core_version());
            Ok(())
        }
        Some("version") => {
            println!("{}", amanah_core::core_version());
            Ok(())
        }
        Some("demo") => run_demo(args.get(1).map(PathBuf::from)),
        Some(_) => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(path_override: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if path_override.is_some() {
        config.db_path = path_override;
    }
    init_from_config(&config)?;

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteKvStore::try_new(&conn)?;
    let groups = GroupService::with_seed_mode(store, config.seed);
    let campaigns = CampaignService::with_seed_mode(store, config.seed);

    let group = groups.create_group(
        &NewGroup {
            name: "Demo Family".to_string(),
            description: Some("Created by amanah_cli demo".to_string()),
            invites: vec!["aunt@example.com".to_string(), "+46700000000".to_string()],
        },
        "Demo Admin",
    )?;
    println!("group {} members={}", group.name, group.members);

    let campaign = campaigns.create_campaign(
        &NewCampaign {
            title: "Demo Campaign".to_string(),
            description: "Lifecycle walkthrough".to_string(),
            beneficiary_name: "Demo Beneficiary".to_string(),
            group_id: group.id.clone(),
            group_name: group.name.clone(),
            target: 1000.0,
            currency: "USD".to_string(),
            due_date: None,
            needs_approval: Some(true),
        },
        "Demo Admin",
    )?;
    println!("campaign {} status={}", campaign.title, campaign.status.as_str());

    for voter in ["voter-1", "voter-2", "voter-3"] {
        let outcome = campaigns.vote(&campaign.id, voter)?;
        println!(
            "vote {voter}: votes={} status={} ({})",
            outcome.campaign.votes,
            outcome.campaign.status.as_str(),
            outcome.message
        );
    }

    let receipt = campaigns.contribute(&ContributionRequest {
        campaign_id: campaign.id.clone(),
        amount: 1000.0,
        is_private: false,
        contributor_name: "Demo Admin".to_string(),
    })?;
    println!(
        "contribution: raised={} status={}",
        format_amount(receipt.campaign.current, &receipt.campaign.currency, Default::default()),
        receipt.campaign.status.as_str()
    );

    let outcome = campaigns.remove_vote(&campaign.id, "voter-1")?;
    println!(
        "unvote voter-1: votes={} status={} ({})",
        outcome.campaign.votes,
        outcome.campaign.status.as_str(),
        outcome.message
    );

    info!("event=cli_demo module=cli status=ok campaign_id={}", campaign.id);
    Ok(())
}
