//! Phase engine orchestration
//!
//! The `PhaseEngine` judges each submission against the current phase,
//! advances the Red-Green-Refactor cycle, drives the babystep timer and
//! publishes what happened.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::babysteps::BabystepTimer;
use crate::error::PhaseError;
use crate::events::{EventBus, TrainerEvent};
use crate::execution::Executor;
use crate::exercise::{Exercise, ExerciseSelector};
use crate::observability::metrics;
use crate::tracking::Tracker;

use super::rules;
use super::state::{Phase, PhaseStatus};

/// The external parts the engine talks to.
pub struct Collaborators {
    /// Compiles and runs submissions
    pub executor: Box<dyn Executor>,
    /// Records every check
    pub tracker: Box<dyn Tracker>,
    /// Picks the exercise to work on
    pub selector: Box<dyn ExerciseSelector>,
    /// Enforces phase time budgets
    pub timer: Box<dyn BabystepTimer>,
}

/// Red-Green-Refactor state machine.
///
/// All mutation goes through `&mut self`; the engine is meant to be owned
/// by a single controlling actor (see [`crate::session::Session`]).
///
/// Coordinates:
/// - Submission evaluation and per-phase validity
/// - Cyclic phase transitions
/// - Babystep timer starts and stops
/// - Status and exercise-selection events
pub struct PhaseEngine {
    phase: Phase,
    /// Exercise as selected; its budgets drive the timer
    original_exercise: Exercise,
    /// Most recent submission judged valid
    last_valid_exercise: Option<Exercise>,
    last_status: PhaseStatus,
    executor: Box<dyn Executor>,
    tracker: Box<dyn Tracker>,
    selector: Box<dyn ExerciseSelector>,
    timer: Box<dyn BabystepTimer>,
    bus: EventBus,
}

impl PhaseEngine {
    /// Creates an engine in RED with no exercise selected.
    #[must_use]
    pub fn new(collaborators: Collaborators, bus: EventBus) -> Self {
        let Collaborators {
            executor,
            tracker,
            selector,
            timer,
        } = collaborators;
        let phase = Phase::Red;
        metrics::set_current_phase(phase);

        Self {
            phase,
            original_exercise: Exercise::default(),
            last_valid_exercise: None,
            last_status: PhaseStatus::initial(),
            executor,
            tracker,
            selector,
            timer,
            bus,
        }
    }

    /// Evaluates `submission` and, if it is valid for the current phase and
    /// `advance` is set, moves to the next phase.
    ///
    /// An invalid submission is not an error; it is reported through
    /// [`PhaseStatus::valid`]. The returned status is also published as a
    /// [`TrainerEvent::ExecutionStatus`].
    pub fn check_phase(&mut self, submission: Exercise, advance: bool) -> PhaseStatus {
        let outcome = self.executor.evaluate(&submission);
        let submitted_in = self.phase;

        let tracked = PhaseStatus::new(self.last_status.valid, Some(outcome.clone()), submitted_in);
        self.tracker.track(&submission, &tracked);

        let valid = rules::is_valid(submitted_in, &outcome);
        metrics::record_check(submitted_in, valid);
        debug!(
            phase = %submitted_in,
            valid,
            advance,
            compile_errors = outcome.has_compile_errors,
            failed_tests = outcome.failed_tests(),
            "submission checked"
        );

        if valid {
            if advance {
                self.advance();
            }
            self.last_valid_exercise = Some(submission);
        }

        let status = PhaseStatus::new(valid, Some(outcome), self.phase);
        self.last_status = status.clone();
        self.bus.publish(TrainerEvent::ExecutionStatus {
            status: status.clone(),
        });
        status
    }

    /// Moves one step along the cycle and updates the timer.
    fn advance(&mut self) {
        let from = self.phase;
        let to = from.next();
        self.phase = to;

        match to {
            Phase::Green => self.timer.start(self.original_exercise.baby_steps_code_time),
            Phase::Refactor => self.timer.stop(),
            Phase::Red => self.timer.start(self.original_exercise.baby_steps_test_time),
        }

        info!(from = %from, to = %to, "phase transition");
        metrics::record_transition(from, to);
    }

    /// Abandons the current step and returns to RED with the last valid
    /// exercise.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::ResetDuringRefactor`] in REFACTOR. State is left
    /// untouched in that case.
    pub fn reset_phase(&mut self) -> Result<(), PhaseError> {
        if self.phase == Phase::Refactor {
            warn!("reset rejected during refactor");
            return Err(PhaseError::ResetDuringRefactor);
        }
        if self.phase == Phase::Green {
            info!(from = %Phase::Green, to = %Phase::Red, "phase reset");
            self.phase = Phase::Red;
            metrics::set_current_phase(self.phase);
        }
        metrics::record_reset();

        if let Some(exercise) = &self.last_valid_exercise {
            self.timer.start(self.original_exercise.baby_steps_test_time);
            self.bus.publish(TrainerEvent::ExerciseSelected {
                exercise: exercise.clone(),
            });
        }
        Ok(())
    }

    /// Asks the selector for an exercise and starts it from RED.
    ///
    /// Returns `false` (and changes nothing) when the selection was
    /// cancelled.
    pub fn select_exercise(&mut self) -> bool {
        let Some(exercise) = self.selector.select_exercise() else {
            debug!("exercise selection cancelled");
            return false;
        };

        if exercise.baby_steps_activated {
            self.timer.enable();
        } else {
            self.timer.disable();
        }

        self.phase = Phase::Red;
        metrics::set_current_phase(self.phase);
        info!(
            exercise = %exercise.name,
            babysteps = exercise.baby_steps_activated,
            "exercise selected"
        );

        self.last_valid_exercise = Some(exercise.clone());
        self.original_exercise = exercise;

        self.bus.publish(TrainerEvent::ExerciseSelected {
            exercise: self.original_exercise.clone(),
        });
        self.tracker.reset();
        self.timer.start(self.original_exercise.baby_steps_test_time);
        true
    }

    /// Applies an expired babystep budget by resetting to RED.
    ///
    /// Returns whether the learner was rolled back. Expiry during REFACTOR
    /// is ignored; the timer is stopped there, so it only arises from a
    /// stale countdown.
    pub fn on_babystep_expired(&mut self, budget: Duration) -> bool {
        metrics::record_babystep_expiry();
        match self.reset_phase() {
            Ok(()) => {
                info!(?budget, "babystep budget ran out; rolled back to red");
                true
            }
            Err(err) => {
                warn!(%err, ?budget, "ignoring babystep expiry");
                false
            }
        }
    }

    /// Hands the tracked history to the tracker for display.
    pub fn display_tracking(&self) {
        self.tracker.display_in_new_window();
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Exercise as originally selected.
    #[must_use]
    pub const fn original_exercise(&self) -> &Exercise {
        &self.original_exercise
    }

    /// Most recent submission judged valid, if any.
    #[must_use]
    pub const fn last_valid_exercise(&self) -> Option<&Exercise> {
        self.last_valid_exercise.as_ref()
    }

    /// Status produced by the most recent check.
    #[must_use]
    pub const fn last_status(&self) -> &PhaseStatus {
        &self.last_status
    }

    /// The bus this engine publishes to.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl std::fmt::Debug for PhaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseEngine")
            .field("phase", &self.phase)
            .field("original_exercise", &self.original_exercise.name)
            .field(
                "last_valid_exercise",
                &self.last_valid_exercise.as_ref().map(|e| e.name.as_str()),
            )
            .finish_non_exhaustive()
    }
}
