//! Scorecast CLI — batch scoring, triage ranking and forecasting commands.
//!
//! Commands:
//! - `score` — run the batch pipeline over a fixture and save artifacts
//! - `rank` — rank a card payload for one user
//! - `trend` — trend analysis and ensemble forecast over a history file
//! - `forecast` — impact forecast for one entity and one market event
//! - `radar` — severity/type summary of recent events
//! - `config` — print the default pipeline config as TOML

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scorecast_core::domain::{
    CardInput, EntityId, HistoricalImpact, MarketEvent, ModelId, ScoreHistoryPoint,
};
use scorecast_core::impact::{forecast_impact, radar};
use scorecast_core::sources::InMemoryUserHistory;
use scorecast_core::trend::analyze_trend;
use scorecast_core::triage::{Ranker, UserHistory};
use scorecast_runner::{
    export_batch_json, export_triage_json, run_triage, save_batch_artifacts,
    save_triage_artifacts, valid_cards, BatchFixture, BatchReport, Pipeline, PipelineConfig,
};

#[derive(Parser)]
#[command(
    name = "scorecast",
    about = "Scorecast CLI — visibility scoring, trend forecasting and triage"
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch pipeline over a fixture file.
    Score {
        /// Batch fixture JSON (entities, events, users).
        #[arg(long)]
        fixture: PathBuf,

        /// Pipeline config TOML. Defaults to built-in settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scoring day (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        as_of: Option<String>,

        /// Write report.json and entities.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Rank a JSON array of triage cards.
    Rank {
        /// Card payload JSON.
        #[arg(long)]
        cards: PathBuf,

        /// User history JSON.
        #[arg(long)]
        history: Option<PathBuf>,

        /// Ranking instant (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<String>,

        /// User the queue is ranked for.
        #[arg(long, default_value = "cli")]
        user: String,

        /// Reference cards for the similarity factor. Defaults to the valid
        /// cards of the payload itself.
        #[arg(long)]
        similar: Option<PathBuf>,

        /// Pipeline config TOML, for ranking weights.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write triage.json and queue.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Analyze a score history file.
    Trend {
        /// JSON array of history points.
        #[arg(long)]
        history: PathBuf,
    },
    /// Forecast the impact of one market event on one entity.
    Forecast {
        /// Market event JSON.
        #[arg(long)]
        event: PathBuf,

        /// JSON array of historical impacts for the entity.
        #[arg(long)]
        impacts: Option<PathBuf>,

        /// Entity to forecast for.
        #[arg(long)]
        entity: String,

        /// Model identifier stamped on the forecast.
        #[arg(long, default_value = "elasticity-v1")]
        model: String,
    },
    /// Summarize recent market events.
    Radar {
        /// JSON array of market events.
        #[arg(long)]
        events: PathBuf,

        /// Most recent events to include.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the default pipeline config as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Score {
            fixture,
            config,
            as_of,
            output_dir,
        } => run_score(&fixture, config.as_deref(), as_of.as_deref(), output_dir.as_deref()),
        Commands::Rank {
            cards,
            history,
            now,
            user,
            similar,
            config,
            output_dir,
        } => run_rank(
            &cards,
            history.as_deref(),
            now.as_deref(),
            &user,
            similar.as_deref(),
            config.as_deref(),
            output_dir.as_deref(),
        ),
        Commands::Trend { history } => run_trend(&history),
        Commands::Forecast {
            event,
            impacts,
            entity,
            model,
        } => run_forecast(&event, impacts.as_deref(), &entity, &model),
        Commands::Radar { events, limit } => run_radar(&events, limit),
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // logs go to stderr; stdout carries the JSON result
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => Ok(PipelineConfig::from_file(p)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid --now '{s}', expected RFC 3339"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

fn run_score(
    fixture_path: &Path,
    config_path: Option<&Path>,
    as_of: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let fixture = BatchFixture::from_file(fixture_path)?;
    let now = Utc::now();
    let as_of = as_of
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --as-of, expected YYYY-MM-DD")?
        .unwrap_or_else(|| now.date_naive());

    let pipeline = Pipeline::new(config, fixture.collaborators(now)?)?;
    let report = pipeline.run_batch(&fixture.targets(), as_of, now)?;

    print_summary(&report);
    if let Some(dir) = output_dir {
        let run_dir = save_batch_artifacts(&report, dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
    } else {
        println!("{}", export_batch_json(&report)?);
    }
    Ok(())
}

fn run_rank(
    cards_path: &Path,
    history_path: Option<&Path>,
    now: Option<&str>,
    user: &str,
    similar_path: Option<&Path>,
    config_path: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let ranker = Ranker::new(config.ranking)?;
    let cards: Vec<CardInput> = read_json(cards_path)?;
    let now = parse_now(now)?;
    let pool = match similar_path {
        Some(path) => valid_cards(&read_json::<Vec<CardInput>>(path)?),
        None => valid_cards(&cards),
    };

    let users = InMemoryUserHistory::new();
    if let Some(path) = history_path {
        let history: UserHistory = read_json(path)?;
        users.insert(user, history)?;
    }

    let report = run_triage(&ranker, &users, &cards, user, &pool, now);
    if let Some(dir) = output_dir {
        let out = save_triage_artifacts(&report, dir)?;
        info!(dir = %out.display(), "artifacts saved");
    }
    println!("{}", export_triage_json(&report)?);
    Ok(())
}

fn run_trend(history_path: &Path) -> Result<()> {
    let mut history: Vec<ScoreHistoryPoint> = read_json(history_path)?;
    history.sort_by_key(|p| p.timestamp);
    let analysis = analyze_trend(&history);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn run_forecast(
    event_path: &Path,
    impacts_path: Option<&Path>,
    entity: &str,
    model: &str,
) -> Result<()> {
    let event: MarketEvent = read_json(event_path)?;
    let impacts: Vec<HistoricalImpact> = match impacts_path {
        Some(p) => read_json(p)?,
        None => Vec::new(),
    };
    let entity = EntityId::new(entity);
    if !event.affects(&entity) {
        info!(entity = %entity, event = %event.id, "event does not list this entity");
    }
    let forecast = forecast_impact(&entity, &ModelId::new(model), &impacts, &event);
    println!("{}", serde_json::to_string_pretty(&forecast)?);
    Ok(())
}

fn run_radar(events_path: &Path, limit: usize) -> Result<()> {
    let events: Vec<MarketEvent> = read_json(events_path)?;
    let summary = radar(&events, limit);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let c = &report.counts;
    eprintln!();
    eprintln!("=== Batch {} ===", report.as_of);
    eprintln!("Entities:     {} requested, {} scored", c.requested, c.succeeded);
    eprintln!("Skipped:      {}", c.skipped);
    eprintln!("Over budget:  {}", c.over_budget);
    eprintln!("Forecasts:    {}", c.forecasts);
    let gaps: usize = report.outcomes.iter().map(|o| o.competitor_gaps.len()).sum();
    eprintln!("Competitors:  {}", gaps);
    eprintln!("Events:       {}", report.radar.total);
    if !report.outcomes.is_empty() {
        eprintln!();
        eprintln!("{:<20} {:>9} {:>9} {:<7}", "Entity", "Score", "Velocity", "Trend");
        eprintln!("{}", "-".repeat(48));
        for o in &report.outcomes {
            eprintln!(
                "{:<20} {:>9.2} {:>9.3} {:<7}",
                o.entity_id.as_str(),
                o.final_aggregate(),
                o.trend.velocity,
                o.trend.direction.as_str()
            );
        }
    }
    for s in &report.skipped {
        eprintln!("SKIPPED: {} at {}: {}", s.entity_id, s.stage.as_str(), s.reason);
    }
    eprintln!();
}
