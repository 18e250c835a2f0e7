//! Reporting and export — JSON and CSV artifacts.
//!
//! - **JSON**: full round-trip serialization of batch and triage reports,
//!   each carrying `schema_version`; newer versions are rejected on load
//! - **CSV**: one row per entity outcome, and one row per ranked card

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::pipeline::{BatchReport, EntityOutcome, SCHEMA_VERSION};
use crate::triage::TriageReport;
use scorecast_core::triage::RankedCard;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_batch_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BatchReport to JSON")
}

/// Deserialize a `BatchReport`, rejecting unknown schema versions.
pub fn import_batch_json(json: &str) -> Result<BatchReport> {
    let report: BatchReport =
        serde_json::from_str(json).context("failed to deserialize BatchReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

pub fn export_triage_json(report: &TriageReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize TriageReport to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per processed entity.
///
/// Columns: entity_id, aggregate, velocity, acceleration, direction,
/// next_7_days, next_30_days, forecast_confidence, forecasts
pub fn export_outcomes_csv(outcomes: &[EntityOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entity_id",
        "aggregate",
        "velocity",
        "acceleration",
        "direction",
        "next_7_days",
        "next_30_days",
        "forecast_confidence",
        "forecasts",
    ])?;

    for o in outcomes {
        let t = &o.trend;
        wtr.write_record([
            o.entity_id.as_str(),
            &format!("{:.2}", o.final_aggregate()),
            &format!("{:.4}", t.velocity),
            &format!("{:.4}", t.acceleration),
            t.direction.as_str(),
            &format!("{:.2}", t.forecast.next_7_days),
            &format!("{:.2}", t.forecast.next_30_days),
            &format!("{:.4}", t.forecast.confidence),
            &o.forecasts.len().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// The ranked queue, one row per card. Suggested actions are `;`-joined.
pub fn export_queue_csv(ranked: &[RankedCard]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "id",
        "kind",
        "level",
        "priority_score",
        "predicted_resolution_minutes",
        "suggested_actions",
    ])?;

    for (i, r) in ranked.iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            r.card.id.as_str(),
            r.card.kind.as_str(),
            r.card.level.as_str(),
            &format!("{:.2}", r.priority_score),
            &r.predicted_resolution_minutes.to_string(),
            &r.suggested_actions.join("; "),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save a batch report under `output_dir/batch_{as_of}_{generated_at}/`:
/// - `report.json` — the full `BatchReport`
/// - `entities.csv` — per-entity outcome table
///
/// Returns the created directory.
pub fn save_batch_artifacts(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "batch_{}_{}",
        report.as_of,
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_batch_json(report)?)
        .context("failed to write report.json")?;
    std::fs::write(run_dir.join("entities.csv"), export_outcomes_csv(&report.outcomes)?)
        .context("failed to write entities.csv")?;

    Ok(run_dir)
}

/// Save a triage report as `triage.json` and `queue.csv` under `output_dir`.
pub fn save_triage_artifacts(report: &TriageReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;
    std::fs::write(output_dir.join("triage.json"), export_triage_json(report)?)
        .context("failed to write triage.json")?;
    std::fs::write(output_dir.join("queue.csv"), export_queue_csv(&report.ranked)?)
        .context("failed to write queue.csv")?;
    Ok(output_dir.to_path_buf())
}
