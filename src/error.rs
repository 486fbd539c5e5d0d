//! Error types for `tddtrainer`
//!
//! Learner mistakes are never errors: an invalid submission is reported
//! through `PhaseStatus::valid`. The types here cover protocol violations
//! by the caller, catalog/script loading, and session plumbing.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Process exit codes of the `tddtrainer` binary.
pub struct ExitCode;

impl ExitCode {
    /// Command completed
    pub const SUCCESS: i32 = 0;
    /// Session plumbing failed
    pub const ERROR: i32 = 1;
    /// Bad catalog, script or recorded outcome
    pub const CONFIG_ERROR: i32 = 2;
    /// Events file or input could not be read or written
    pub const IO_ERROR: i32 = 3;
    /// The engine refused a scripted operation
    pub const PHASE_ERROR: i32 = 5;
    /// Bad command line (sysexits `EX_USAGE`)
    pub const USAGE_ERROR: i32 = 64;
    /// SIGINT
    pub const INTERRUPTED: i32 = 130;
    /// SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `tddtrainer` operations.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Catalog loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Phase engine rejected an operation
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Session actor error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Replay script error
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Reading an input or writing events failed
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed script YAML
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TrainerError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Script(_) | Self::Json(_) | Self::Yaml(_) => {
                ExitCode::CONFIG_ERROR
            }
            Self::Phase(_) => ExitCode::PHASE_ERROR,
            Self::Session(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Phase Engine Errors
// ============================================================================

/// Operations the phase engine refuses to perform.
///
/// These are caller bugs, not learner mistakes. They are returned rather
/// than recovered so the caller can be fixed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    /// `reset_phase` was called while refactoring; there is no red/green
    /// checkpoint to roll back to.
    #[error("reset not permitted during refactor")]
    ResetDuringRefactor,
}

// ============================================================================
// Session Errors
// ============================================================================

/// Errors talking to a running session actor.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task has shut down and no longer accepts commands
    #[error("session closed")]
    Closed,

    /// The session rejected the command
    #[error(transparent)]
    Rejected(#[from] PhaseError),
}

// ============================================================================
// Catalog Errors
// ============================================================================

/// Exercise catalog loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The catalog is not well-formed YAML
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the catalog file
        path: PathBuf,
        /// 1-based line reported by the parser
        line: Option<usize>,
        /// Parser diagnostic
        message: String,
    },

    /// Catalog validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the catalog file
        path: String,
        /// Every error-severity issue
        errors: Vec<ValidationIssue>,
    },

    /// The catalog path does not exist
    #[error("file not found: {path}")]
    MissingFile {
        /// Requested path
        path: PathBuf,
    },

    /// Catalog exceeds a configured limit
    #[error("{what} exceeds limit: {actual} > {limit}")]
    LimitExceeded {
        /// Which limit was exceeded
        what: &'static str,
        /// Observed size
        actual: usize,
        /// Configured limit
        limit: usize,
    },
}

// ============================================================================
// Script Errors
// ============================================================================

/// Replay script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A `select` step names an exercise that is not in the catalog
    #[error("step {step}: unknown exercise '{name}'")]
    UnknownExercise {
        /// Zero-based step index
        step: usize,
        /// Requested exercise name
        name: String,
    },

    /// A `check` step was reached before any exercise was selected
    #[error("step {step}: check before any exercise was selected")]
    NoExerciseSelected {
        /// Zero-based step index
        step: usize,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found in a catalog.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "exercises[2].name")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.severity == Severity::Error {
            "error"
        } else {
            "warning"
        };
        write!(f, "{level}: {} at {}", self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the catalog from being used
    Error,
    /// Reported but does not prevent loading
    Warning,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `tddtrainer` operations.
pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_exit_codes_follow_shell_convention() {
        assert_eq!(ExitCode::INTERRUPTED, 128 + 2);
        assert_eq!(ExitCode::TERMINATED, 128 + 15);
    }

    #[test]
    fn test_session_closed_exit_code() {
        let err: TrainerError = SessionError::Closed.into();
        assert_eq!(err.exit_code(), ExitCode::ERROR);
    }

    #[test]
    fn test_phase_error_exit_code() {
        let err: TrainerError = PhaseError::ResetDuringRefactor.into();
        assert_eq!(err.exit_code(), ExitCode::PHASE_ERROR);
    }

    #[test]
    fn test_script_error_exit_code() {
        let err: TrainerError = ScriptError::NoExerciseSelected { step: 0 }.into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let err = TrainerError::from(std::io::Error::other("disk full"));
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
        assert_eq!(err.to_string(), "i/o failure: disk full");
    }

    #[test]
    fn test_reset_error_message() {
        assert_eq!(
            PhaseError::ResetDuringRefactor.to_string(),
            "reset not permitted during refactor"
        );
    }

    #[test]
    fn test_session_rejected_is_transparent() {
        let err = SessionError::from(PhaseError::ResetDuringRefactor);
        assert_eq!(err.to_string(), "reset not permitted during refactor");
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "exercises[0].name".to_string(),
            message: "duplicate exercise name".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: duplicate exercise name at exercises[0].name"
        );
    }

    #[test]
    fn test_limit_exceeded_display() {
        let err = ConfigError::LimitExceeded {
            what: "catalog size",
            actual: 10,
            limit: 5,
        };
        assert_eq!(err.to_string(), "catalog size exceeds limit: 10 > 5");
    }
}
