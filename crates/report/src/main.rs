//! Listing progress report for one owner.
//!
//! ```text
//! paddock-report <owner-id> [draft-id] [--json] [--summary] [--generate <answers.json>]
//! ```
//!
//! Without a draft id, lists the owner's drafts and published listings with
//! their completion; `--summary` prints the compact one-line-per-listing
//! view instead. With a draft id, loads that draft and shows per-step
//! progress and the fields still blocking publication. `--generate` first
//! sends the interview answers in the given file to the profile service,
//! merges the result into the draft and saves it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paddock_core::config::DraftConfig;
use paddock_core::draft::{DraftManager, ListingOverview};
use paddock_core::listing::ListingStatus;
use paddock_core::listing_wizard::{ListingStep, StepSequencer, MAX_STEP, TOTAL_STEPS};
use paddock_core::notices::DraftNotices;
use paddock_core::profile::InterviewAnswer;
use paddock_core::session::Session;
use paddock_core::types::DbId;
use paddock_db::repositories::ListingRepo;
use paddock_db::{DbPool, PgListingStore};
use paddock_profilegen::{ProfileGenApi, ProfileGenConfig};

const USAGE: &str =
    "usage: paddock-report <owner-id> [draft-id] [--json] [--summary] [--generate <answers.json>]";

struct Args {
    owner_id: DbId,
    draft_id: Option<DbId>,
    json: bool,
    summary: bool,
    answers_path: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut json = false;
    let mut summary = false;
    let mut answers_path = None;
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--summary" => summary = true,
            "--generate" => {
                let Some(path) = args.next() else {
                    bail!("--generate needs an answers file\n{USAGE}");
                };
                answers_path = Some(PathBuf::from(path));
            }
            _ => positional.push(arg),
        }
    }

    let Some(owner) = positional.first() else {
        bail!(USAGE);
    };
    let owner_id = owner
        .parse()
        .with_context(|| format!("invalid owner id '{owner}'"))?;
    let draft_id = positional
        .get(1)
        .map(|d| d.parse().with_context(|| format!("invalid draft id '{d}'")))
        .transpose()?;
    if answers_path.is_some() && draft_id.is_none() {
        bail!("--generate needs a draft id\n{USAGE}");
    }

    Ok(Args {
        owner_id,
        draft_id,
        json,
        summary,
        answers_path,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // LOG_FORMAT=json switches to structured output for log shippers.
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paddock_report=info,paddock_core=info".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let args = parse_args()?;
    let config = DraftConfig::from_env();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = paddock_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    paddock_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    paddock_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    if args.summary && args.draft_id.is_none() {
        return report_summaries(&pool, args.owner_id, args.json).await;
    }

    let notices = Arc::new(DraftNotices::default());
    let store = Arc::new(PgListingStore::new(pool));
    let manager = DraftManager::new(store, Session::new(args.owner_id))
        .with_retry_policy(config.retry)
        .with_notices(Arc::clone(&notices));

    match args.draft_id {
        None => report_listings(&manager, args.json).await,
        Some(id) => {
            if let Some(path) = &args.answers_path {
                generate_and_save(&manager, &notices, id, path).await?;
            }
            report_draft(&manager, id, args.json).await
        }
    }
}

async fn report_summaries(pool: &DbPool, owner_id: DbId, json: bool) -> anyhow::Result<()> {
    let summaries = ListingRepo::list_summaries(pool, owner_id)
        .await
        .context("Failed to list listings")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "#{:<6} {:<9} {}  {}",
            summary.id,
            summary.listing_status,
            summary.updated_at.format("%Y-%m-%d %H:%M"),
            summary
                .title
                .as_deref()
                .or(summary.horse_name.as_deref())
                .unwrap_or("(untitled)")
        );
    }
    Ok(())
}

/// Draft a profile from interview answers, merge it and persist the draft.
async fn generate_and_save(
    manager: &DraftManager,
    notices: &DraftNotices,
    id: DbId,
    answers_path: &Path,
) -> anyhow::Result<()> {
    let Some(profile_config) = ProfileGenConfig::from_env() else {
        bail!("PROFILE_API_URL must be set to generate a profile");
    };
    let raw = std::fs::read_to_string(answers_path)
        .with_context(|| format!("Failed to read {}", answers_path.display()))?;
    let answers: Vec<InterviewAnswer> =
        serde_json::from_str(&raw).context("Answers file must be a JSON list of {question, answer}")?;

    let profile_api = ProfileGenApi::new(&profile_config).context("Failed to build profile client")?;
    let mut notice_rx = notices.subscribe();

    manager.load_draft(id).await?;
    manager.generate_profile(&profile_api, answers).await?;
    manager.save_draft(true).await?;

    while let Ok(notice) = notice_rx.try_recv() {
        tracing::info!(?notice, "Draft notice");
    }
    Ok(())
}

async fn report_listings(manager: &DraftManager, json: bool) -> anyhow::Result<()> {
    let drafts = manager.list_listings(ListingStatus::Draft).await?;
    let published = manager.list_listings(ListingStatus::Published).await?;

    if json {
        let value = serde_json::json!({ "drafts": drafts, "published": published });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_section("Drafts", &drafts);
    print_section("Published", &published);
    Ok(())
}

fn print_section(heading: &str, listings: &[ListingOverview]) {
    println!("{heading} ({})", listings.len());
    for listing in listings {
        let updated = listing
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<6} {:>3}%  {}  {}",
            listing.id,
            listing.completion_percentage,
            updated,
            listing.title.as_deref().unwrap_or("(untitled)")
        );
    }
}

async fn report_draft(manager: &DraftManager, id: DbId, json: bool) -> anyhow::Result<()> {
    manager.load_draft(id).await?;
    let draft = manager.draft();
    let engine = manager.engine();

    let resume_at = engine.first_incomplete_step(&draft).unwrap_or(MAX_STEP);
    let mut sequencer = StepSequencer::resume(TOTAL_STEPS, resume_at, resume_at);
    if manager.original_status() == Some(ListingStatus::Published) {
        sequencer.unlock_all();
    }

    let steps: Vec<_> = ListingStep::ALL
        .iter()
        .map(|step| engine.validate_step(step.to_number(), &draft))
        .collect();
    let blocking = engine.validate_form(&draft);

    if json {
        let value = serde_json::json!({
            "draftId": id,
            "status": manager.original_status(),
            "completionPercentage": engine.form_completion_percentage(&draft),
            "resumeStep": sequencer.current_step(),
            "unlockedThrough": sequencer.highest_completed_step(),
            "steps": steps,
            "blocking": blocking,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "Draft #{id}: {}% complete, resume at step {} of {}",
        engine.form_completion_percentage(&draft),
        sequencer.current_step(),
        sequencer.total_steps()
    );
    for (step, result) in ListingStep::ALL.iter().zip(&steps) {
        let marker = if sequencer.can_go_to(step.to_number()) { ' ' } else { '#' };
        println!(
            " {marker}{:>2}. {:<16} {:>3}%",
            step.to_number(),
            step.label(),
            result.completion_percentage
        );
    }
    if blocking.is_empty() {
        println!("Ready to publish");
    } else {
        println!("Blocking publication:");
        for err in &blocking {
            println!("  - [{}] {}: {}", err.step_title, err.label, err.message);
        }
    }
    Ok(())
}
