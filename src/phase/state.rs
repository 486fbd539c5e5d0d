//! Phase and status types

use serde::{Deserialize, Serialize};

use crate::execution::ExecutionOutcome;

/// A step of the Red-Green-Refactor cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Write a failing test
    #[default]
    Red,
    /// Make the failing test pass
    Green,
    /// Clean up while staying green
    Refactor,
}

impl Phase {
    /// Returns the phase that follows this one in the cycle.
    ///
    /// The cycle never skips: `Red -> Green -> Refactor -> Red`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Refactor,
            Self::Refactor => Self::Red,
        }
    }

    /// Lowercase label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Refactor => "refactor",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the engine's verdict on a submission.
///
/// The value returned from a check is the same value broadcast to
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStatus {
    /// Whether the submission satisfied the phase rule
    pub valid: bool,
    /// Outcome of the check; absent before the first check
    pub outcome: Option<ExecutionOutcome>,
    /// Phase after the check, including any transition it caused
    pub phase: Phase,
}

impl PhaseStatus {
    /// Creates a status snapshot.
    #[must_use]
    pub const fn new(valid: bool, outcome: Option<ExecutionOutcome>, phase: Phase) -> Self {
        Self {
            valid,
            outcome,
            phase,
        }
    }

    /// The status of a fresh engine: not valid, no outcome, RED.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(false, None, Phase::Red)
    }
}

impl Default for PhaseStatus {
    fn default() -> Self {
        Self::initial()
    }
}
