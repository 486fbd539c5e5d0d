//! Session replay command
//!
//! Loads a catalog and a session script, replays the script through a
//! live session and streams every published event as JSONL.

use tracing::{info, warn};

use crate::cli::args::{OutputFormat, ReplayArgs};
use crate::config::CatalogLoader;
use crate::error::TrainerError;
use crate::events::EventBus;
use crate::observability::{EventEmitter, forward_events, init_metrics};
use crate::replay::{Replay, ReplayReport, SessionScript};
use crate::tracking::{MemoryTracker, TrackingSummary};

/// Replay a session script.
///
/// Events go to `--events` or stdout; the tracking summary goes to stderr
/// unless `quiet` is set.
///
/// # Errors
///
/// Returns an error if the catalog or script cannot be loaded, the events
/// file cannot be created, or the replay itself fails. Events published
/// before a failure are still written.
pub async fn run(args: &ReplayArgs, quiet: bool) -> Result<(), TrainerError> {
    let loaded = CatalogLoader::default().load(&args.catalog)?;
    for warning in &loaded.warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    let script = SessionScript::from_path(&args.script)?;

    if args.metrics_port.is_some() {
        init_metrics(args.metrics_port)?;
    }

    let bus = EventBus::default();
    let events = bus.subscribe();
    let tracker = if quiet {
        MemoryTracker::new().muted()
    } else {
        MemoryTracker::new()
    };
    let replay = Replay::new(&loaded.catalog, bus).with_tracker(tracker.clone());

    let session_id = replay.session_id().to_string();
    let emitter = match &args.events {
        Some(path) => EventEmitter::from_file(path, session_id)?,
        None => EventEmitter::stdout(session_id),
    };
    let forwarder = forward_events(events, emitter);

    let result = replay.run(&script).await;
    let written = forwarder.await.unwrap_or_else(|e| {
        warn!(error = %e, "event forwarder failed");
        0
    });
    let report = result?;
    info!(
        session_id = %report.session_id,
        events = written,
        checks = report.statuses.len(),
        final_phase = %report.final_phase,
        "replay complete"
    );

    if !quiet {
        print_summary(args.summary, &report, &tracker.summary());
    }
    Ok(())
}

fn print_summary(format: OutputFormat, report: &ReplayReport, summary: &TrackingSummary) {
    match format {
        OutputFormat::Human => {
            eprintln!(
                "session {}: {} steps, {} of {} checks valid, ended in {}",
                report.session_id,
                report.steps,
                report.valid_checks(),
                report.statuses.len(),
                report.final_phase
            );
            for (phase, tally) in &summary.phases {
                eprintln!(
                    "  {phase:<8} {} checks, {} compile failures",
                    tally.checks, tally.compile_failures
                );
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "session_id": report.session_id,
                "steps": report.steps,
                "valid_checks": report.valid_checks(),
                "final_phase": report.final_phase,
                "tracking": summary,
            });
            eprintln!("{value}");
        }
    }
}
