//! Metrics collection for `tddtrainer`.
//!
//! Prometheus-compatible counters and gauges for checks, transitions,
//! resets and babystep expiries. All labels come from fixed phase names,
//! so cardinality is bounded.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TrainerError;
use crate::phase::Phase;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const ALL_PHASES: [Phase; 3] = [Phase::Red, Phase::Green, Phase::Refactor];

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`; this must be called from within a tokio runtime.
/// When `None`, the recorder is installed without an HTTP endpoint.
///
/// # Errors
///
/// Returns `TrainerError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), TrainerError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| TrainerError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "tddtrainer_checks_total",
        "Total number of submissions checked"
    );
    describe_counter!(
        "tddtrainer_phase_transitions_total",
        "Total number of phase transitions"
    );
    describe_counter!("tddtrainer_resets_total", "Accepted phase resets");
    describe_counter!(
        "tddtrainer_babystep_expiries_total",
        "Babystep budgets that ran out"
    );
    describe_gauge!(
        "tddtrainer_current_phase",
        "Currently active phase (1 = active)"
    );
}

/// Records a checked submission.
pub fn record_check(phase: Phase, valid: bool) {
    counter!(
        "tddtrainer_checks_total",
        "phase" => phase.as_str(),
        "valid" => if valid { "true" } else { "false" },
    )
    .increment(1);
}

/// Records a phase transition and updates the current-phase gauge.
pub fn record_transition(from: Phase, to: Phase) {
    counter!(
        "tddtrainer_phase_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    set_current_phase(to);
}

/// Sets the current-phase gauge, zeroing the other phases.
pub fn set_current_phase(current: Phase) {
    for phase in ALL_PHASES {
        let value = if phase == current { 1.0 } else { 0.0 };
        gauge!("tddtrainer_current_phase", "phase" => phase.as_str()).set(value);
    }
}

/// Records an accepted reset.
pub fn record_reset() {
    counter!("tddtrainer_resets_total").increment(1);
}

/// Records a babystep expiry.
pub fn record_babystep_expiry() {
    counter!("tddtrainer_babystep_expiries_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        record_check(Phase::Red, true);
        record_check(Phase::Green, false);
        record_transition(Phase::Red, Phase::Green);
        set_current_phase(Phase::Refactor);
        record_reset();
        record_babystep_expiry();
    }

    #[test]
    fn all_phases_covered() {
        assert_eq!(ALL_PHASES.len(), 3);
        assert!(ALL_PHASES.contains(&Phase::Refactor));
    }
}
