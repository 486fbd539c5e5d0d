//! Scripted collaborators
//!
//! Queue-backed stand-ins for the execution engine and the exercise
//! picker. Clones share one queue, so a driver can keep a clone and feed
//! it while the engine owns another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::execution::{ExecutionOutcome, Executor};
use crate::exercise::{Exercise, ExerciseSelector};

/// Diagnostic reported when a check runs with nothing queued.
pub const NO_SCRIPTED_OUTCOME: &str = "no scripted outcome";

/// Executor that returns queued outcomes in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    outcomes: Arc<Mutex<VecDeque<ExecutionOutcome>>>,
}

impl ScriptedExecutor {
    /// Creates an executor with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome for the next evaluation.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push(&self, outcome: ExecutionOutcome) {
        self.outcomes
            .lock()
            .expect("executor queue poisoned")
            .push_back(outcome);
    }

    /// Number of outcomes still queued.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().expect("executor queue poisoned").len()
    }
}

impl Executor for ScriptedExecutor {
    fn evaluate(&mut self, exercise: &Exercise) -> ExecutionOutcome {
        let next = self
            .outcomes
            .lock()
            .expect("executor queue poisoned")
            .pop_front();
        next.unwrap_or_else(|| {
            warn!(exercise = %exercise.name, "executor queue empty");
            ExecutionOutcome::compile_failed_in(exercise.name.clone(), &[NO_SCRIPTED_OUTCOME])
        })
    }
}

/// Selector that hands out queued exercises; `None` when empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    exercises: Arc<Mutex<VecDeque<Exercise>>>,
}

impl ScriptedSelector {
    /// Creates a selector with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an exercise for the next selection.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push(&self, exercise: Exercise) {
        self.exercises
            .lock()
            .expect("selector queue poisoned")
            .push_back(exercise);
    }
}

impl ExerciseSelector for ScriptedSelector {
    fn select_exercise(&mut self) -> Option<Exercise> {
        self.exercises
            .lock()
            .expect("selector queue poisoned")
            .pop_front()
    }
}
