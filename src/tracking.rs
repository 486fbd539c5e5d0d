//! Session tracking
//!
//! The engine reports every check to a [`Tracker`] and never reads
//! anything back. [`MemoryTracker`] keeps the history in memory and can
//! summarise it per phase.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::exercise::Exercise;
use crate::phase::{Phase, PhaseStatus};

/// Receives a record of every check.
pub trait Tracker: Send {
    /// Records a checked submission.
    fn track(&mut self, exercise: &Exercise, status: &PhaseStatus);

    /// Discards everything recorded so far.
    fn reset(&mut self);

    /// Presents the recorded history to the learner.
    fn display_in_new_window(&self);
}

/// One recorded check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedCheck {
    /// When the check was recorded
    pub at: DateTime<Utc>,
    /// Exercise name
    pub exercise: String,
    /// Phase the submission was made in
    pub phase: Phase,
    /// Whether the submission compiled
    pub compiled: bool,
    /// Failed test count
    pub failed_tests: u32,
}

/// Per-phase totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTally {
    /// Checks recorded in the phase
    pub checks: usize,
    /// Checks whose submission did not compile
    pub compile_failures: usize,
}

/// Aggregate view of a tracked session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackingSummary {
    /// Totals keyed by phase
    pub phases: BTreeMap<String, PhaseTally>,
    /// First recorded check
    pub started_at: Option<DateTime<Utc>>,
    /// Last recorded check
    pub last_at: Option<DateTime<Utc>>,
}

impl TrackingSummary {
    /// Total number of checks.
    #[must_use]
    pub fn total_checks(&self) -> usize {
        self.phases.values().map(|t| t.checks).sum()
    }

    /// Plain-text report, one line per phase plus a total.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("tracking:\n");
        for (phase, tally) in &self.phases {
            let _ = writeln!(
                out,
                "  {phase:<8} {} checks, {} compile failures",
                tally.checks, tally.compile_failures
            );
        }
        let _ = writeln!(out, "  total    {} checks", self.total_checks());
        out
    }
}

/// In-memory tracker. Clones share the same history.
///
/// Displaying prints the rendered summary to stderr unless muted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    checks: Arc<Mutex<Vec<TrackedCheck>>>,
    muted: bool,
}

impl MemoryTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops [`Tracker::display_in_new_window`] from printing.
    #[must_use]
    pub const fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    /// Returns a copy of the recorded checks.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn checks(&self) -> Vec<TrackedCheck> {
        self.checks.lock().expect("tracker lock poisoned").clone()
    }

    /// Summarises the recorded checks per phase.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn summary(&self) -> TrackingSummary {
        let checks = self.checks.lock().expect("tracker lock poisoned");
        let mut summary = TrackingSummary {
            started_at: checks.first().map(|c| c.at),
            last_at: checks.last().map(|c| c.at),
            ..TrackingSummary::default()
        };
        for check in checks.iter() {
            let tally = summary
                .phases
                .entry(check.phase.as_str().to_string())
                .or_default();
            tally.checks += 1;
            if !check.compiled {
                tally.compile_failures += 1;
            }
        }
        summary
    }
}

impl Tracker for MemoryTracker {
    fn track(&mut self, exercise: &Exercise, status: &PhaseStatus) {
        let (compiled, failed_tests) = status
            .outcome
            .as_ref()
            .map_or((true, 0), |o| (!o.has_compile_errors, o.failed_tests()));
        let check = TrackedCheck {
            at: Utc::now(),
            exercise: exercise.name.clone(),
            phase: status.phase,
            compiled,
            failed_tests,
        };
        self.checks.lock().expect("tracker lock poisoned").push(check);
    }

    fn reset(&mut self) {
        self.checks.lock().expect("tracker lock poisoned").clear();
    }

    fn display_in_new_window(&self) {
        let summary = self.summary();
        debug!(total_checks = summary.total_checks(), muted = self.muted, "displaying tracking");
        if !self.muted {
            eprint!("{}", summary.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionOutcome;

    fn status(phase: Phase, outcome: ExecutionOutcome) -> PhaseStatus {
        PhaseStatus::new(false, Some(outcome), phase)
    }

    #[test]
    fn test_track_records_phase_and_counts() {
        let mut tracker = MemoryTracker::new();
        let exercise = Exercise::new("fizzbuzz");
        tracker.track(&exercise, &status(Phase::Red, ExecutionOutcome::compiled(2, 1)));

        let checks = tracker.checks();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].exercise, "fizzbuzz");
        assert_eq!(checks[0].phase, Phase::Red);
        assert!(checks[0].compiled);
        assert_eq!(checks[0].failed_tests, 1);
    }

    #[test]
    fn test_summary_per_phase() {
        let mut tracker = MemoryTracker::new();
        let exercise = Exercise::new("roman");
        tracker.track(
            &exercise,
            &status(
                Phase::Red,
                ExecutionOutcome::compile_failed_in("T", &["cannot find symbol"]),
            ),
        );
        tracker.track(&exercise, &status(Phase::Red, ExecutionOutcome::compiled(1, 1)));
        tracker.track(&exercise, &status(Phase::Green, ExecutionOutcome::compiled(1, 0)));

        let summary = tracker.summary();
        assert_eq!(summary.total_checks(), 3);
        assert_eq!(
            summary.phases["red"],
            PhaseTally {
                checks: 2,
                compile_failures: 1
            }
        );
        assert_eq!(summary.phases["green"].checks, 1);
        assert!(summary.started_at <= summary.last_at);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut tracker = MemoryTracker::new();
        tracker.track(
            &Exercise::new("x"),
            &status(Phase::Red, ExecutionOutcome::compiled(1, 1)),
        );
        tracker.reset();
        assert!(tracker.checks().is_empty());
        assert_eq!(tracker.summary(), TrackingSummary::default());
    }

    #[test]
    fn test_clones_share_history() {
        let tracker = MemoryTracker::new();
        let mut writer = tracker.clone();
        writer.track(
            &Exercise::new("x"),
            &status(Phase::Green, ExecutionOutcome::compiled(1, 0)),
        );
        assert_eq!(tracker.checks().len(), 1);
    }

    #[test]
    fn test_display_does_not_panic_when_empty() {
        MemoryTracker::new().muted().display_in_new_window();
    }

    #[test]
    fn test_render_lists_phases_and_total() {
        let mut tracker = MemoryTracker::new();
        let exercise = Exercise::new("roman");
        tracker.track(&exercise, &status(Phase::Red, ExecutionOutcome::compiled(1, 1)));
        tracker.track(&exercise, &status(Phase::Green, ExecutionOutcome::compiled(1, 0)));

        let text = tracker.summary().render();
        assert!(text.contains("green    1 checks, 0 compile failures"), "{text}");
        assert!(text.contains("red      1 checks, 0 compile failures"), "{text}");
        assert!(text.ends_with("total    2 checks\n"), "{text}");
    }

    #[test]
    fn test_muted_clone_shares_history() {
        let tracker = MemoryTracker::new();
        let mut muted = tracker.clone().muted();
        muted.track(
            &Exercise::new("x"),
            &status(Phase::Red, ExecutionOutcome::compiled(1, 1)),
        );
        assert_eq!(tracker.checks().len(), 1);
    }
}
