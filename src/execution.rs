//! Execution outcomes and the executor seam
//!
//! Compiling and running a submission is done by an external engine
//! behind the [`Executor`] trait. The engine hands back an
//! [`ExecutionOutcome`], which the phase engine only ever reads.

use serde::{Deserialize, Serialize};

use crate::exercise::Exercise;

/// A single compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileDiagnostic {
    /// Compiler message, e.g. `"cannot find symbol: variable x"`
    pub message: String,
    /// 1-based line number, when the compiler reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl CompileDiagnostic {
    /// Creates a diagnostic without a line number.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    /// Returns a copy pinned to the given line.
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

/// Diagnostics produced while compiling one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationResult {
    /// File or class the diagnostics belong to
    pub file: String,
    /// Diagnostics in compiler order
    #[serde(default)]
    pub diagnostics: Vec<CompileDiagnostic>,
}

/// Test run counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Number of tests executed
    #[serde(default)]
    pub run: u32,
    /// Number of tests that failed
    #[serde(default)]
    pub failed: u32,
}

/// Result of compiling and running one submission.
///
/// `has_compile_errors` is reported by the executor rather than derived
/// from `compilation`, since a compiler may fail without producing a
/// per-file diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Per-file compiler diagnostics
    #[serde(default)]
    pub compilation: Vec<CompilationResult>,
    /// Whether compilation failed
    #[serde(default)]
    pub has_compile_errors: bool,
    /// Test counts; meaningless when compilation failed
    #[serde(default)]
    pub tests: TestSummary,
}

impl ExecutionOutcome {
    /// An outcome where everything compiled and `failed` of `run` tests failed.
    #[must_use]
    pub const fn compiled(run: u32, failed: u32) -> Self {
        Self {
            compilation: Vec::new(),
            has_compile_errors: false,
            tests: TestSummary { run, failed },
        }
    }

    /// An outcome where compilation failed with the given per-file results.
    #[must_use]
    pub fn compile_failed(compilation: Vec<CompilationResult>) -> Self {
        Self {
            compilation,
            has_compile_errors: true,
            tests: TestSummary::default(),
        }
    }

    /// Shorthand for a compile failure in a single file.
    #[must_use]
    pub fn compile_failed_in(file: impl Into<String>, messages: &[&str]) -> Self {
        Self::compile_failed(vec![CompilationResult {
            file: file.into(),
            diagnostics: messages
                .iter()
                .map(|m| CompileDiagnostic::new(*m))
                .collect(),
        }])
    }

    /// Number of failed tests.
    #[must_use]
    pub const fn failed_tests(&self) -> u32 {
        self.tests.failed
    }

    /// Iterates over every diagnostic across all files, in order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &CompileDiagnostic> {
        self.compilation.iter().flat_map(|c| c.diagnostics.iter())
    }
}

/// Compiles and runs a submission.
///
/// Called once per check, synchronously. Failures of the underlying
/// toolchain are the executor's concern and must be folded into the
/// returned outcome.
pub trait Executor: Send {
    /// Evaluates the given exercise.
    fn evaluate(&mut self, exercise: &Exercise) -> ExecutionOutcome;
}
