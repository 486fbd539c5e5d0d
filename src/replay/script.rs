//! Session scripts
//!
//! A script is a YAML list of steps replayed against a live [`Session`]:
//!
//! ```yaml
//! steps:
//!   - select: fizzbuzz
//!   - check:
//!       outcome:
//!         tests: { run: 1, failed: 1 }
//!   - wait: 90s
//!   - reset
//!   - display_tracking
//! ```
//!
//! `check` steps carry the outcome the executor reports for that
//! submission, so a recorded session replays without a compiler.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::babysteps;
use crate::config::Catalog;
use crate::error::{ScriptError, SessionError, TrainerError};
use crate::events::{EventBus, TrainerEvent};
use crate::execution::ExecutionOutcome;
use crate::exercise::{Exercise, SourceFile, human_duration};
use crate::phase::{Collaborators, Phase, PhaseEngine, PhaseStatus};
use crate::replay::scripted::{ScriptedExecutor, ScriptedSelector};
use crate::session::{Session, SessionHandle};
use crate::tracking::MemoryTracker;

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionScript {
    /// Steps in replay order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl SessionScript {
    /// Reads a script from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a YAML error if
    /// it does not parse.
    pub fn from_path(path: &Path) -> Result<Self, TrainerError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parses a script from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a YAML error if the text does not parse.
    pub fn from_yaml(raw: &str) -> Result<Self, TrainerError> {
        Ok(serde_yaml::from_str(raw.strip_prefix('\u{feff}').unwrap_or(raw))?)
    }
}

/// A single script step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// A bare action such as `reset`
    Action(Action),

    /// Pick an exercise from the catalog by name
    Select {
        /// Catalog exercise name
        select: String,
    },

    /// Submit and check
    Check {
        /// Submission and recorded outcome
        check: CheckStep,
    },

    /// Let time pass so babystep budgets can run out
    Wait {
        /// How long to wait
        #[serde(with = "human_duration")]
        wait: Duration,
    },
}

/// Steps that take no arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Roll back to RED
    Reset,
    /// Ask the tracker to display its history
    DisplayTracking,
    /// A selection the learner cancelled
    CancelSelection,
}

/// Parameters of a `check` step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckStep {
    /// Advance on a valid submission
    #[serde(default = "default_advance")]
    pub advance: bool,

    /// Production files of the submission; the selected exercise's when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<SourceFile>>,

    /// Test files of the submission; the selected exercise's when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<SourceFile>>,

    /// What the executor reports for this submission
    #[serde(default)]
    pub outcome: ExecutionOutcome,
}

const fn default_advance() -> bool {
    true
}

/// Summary of a finished replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Id of the replayed session
    pub session_id: String,
    /// Number of steps applied
    pub steps: usize,
    /// Status of every check, in order
    pub statuses: Vec<PhaseStatus>,
    /// Exercise handed to the engine by every check, in order
    pub submissions: Vec<Exercise>,
    /// Phase after the last step
    pub final_phase: Phase,
}

impl ReplayReport {
    /// Number of checks judged valid.
    #[must_use]
    pub fn valid_checks(&self) -> usize {
        self.statuses.iter().filter(|s| s.valid).count()
    }
}

/// Replays scripts against a catalog.
#[derive(Debug)]
pub struct Replay<'a> {
    catalog: &'a Catalog,
    bus: EventBus,
    tracker: MemoryTracker,
    session_id: String,
}

impl<'a> Replay<'a> {
    /// Creates a replay that publishes to `bus`.
    #[must_use]
    pub fn new(catalog: &'a Catalog, bus: EventBus) -> Self {
        Self {
            catalog,
            bus,
            tracker: MemoryTracker::new(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Records checks into `tracker`; keep a clone to read it afterwards.
    #[must_use]
    pub fn with_tracker(mut self, tracker: MemoryTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Uses the given session id instead of a random one.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Id the session will run under.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Runs every step of `script` through a fresh session.
    ///
    /// The session and its engine are torn down before this returns, so
    /// the bus closes once the caller drops its own handles.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError::Script`] for steps that do not fit the
    /// catalog, [`TrainerError::Phase`] when the engine rejects a reset and
    /// [`TrainerError::Session`] if the session stops unexpectedly.
    pub async fn run(self, script: &SessionScript) -> Result<ReplayReport, TrainerError> {
        let executor = ScriptedExecutor::new();
        let selector = ScriptedSelector::new();
        let (timer, expiries) = babysteps::channel();
        let events = self.bus.subscribe();

        let engine = PhaseEngine::new(
            Collaborators {
                executor: Box::new(executor.clone()),
                tracker: Box::new(self.tracker),
                selector: Box::new(selector.clone()),
                timer: Box::new(timer),
            },
            self.bus,
        );
        let (handle, task) = Session::spawn_named(engine, Some(expiries), self.session_id.clone());
        info!(session_id = %self.session_id, steps = script.steps.len(), "replay started");

        let mut driver = Driver {
            catalog: self.catalog,
            handle: &handle,
            executor: &executor,
            selector: &selector,
            events,
            working: None,
            statuses: Vec::new(),
            submissions: Vec::new(),
        };
        let outcome = driver.run(script).await;
        let Driver {
            statuses,
            submissions,
            ..
        } = driver;

        let final_phase = match &outcome {
            Ok(()) => Some(handle.snapshot().await?.phase),
            Err(_) => None,
        };
        handle.shutdown();
        let engine = task.await.map_err(|_| SessionError::Closed)?;
        let final_phase = final_phase.unwrap_or_else(|| engine.phase());
        drop(engine);
        outcome?;

        info!(session_id = %self.session_id, phase = %final_phase, "replay finished");
        Ok(ReplayReport {
            session_id: self.session_id,
            steps: script.steps.len(),
            statuses,
            submissions,
            final_phase,
        })
    }
}

struct Driver<'a> {
    catalog: &'a Catalog,
    handle: &'a SessionHandle,
    executor: &'a ScriptedExecutor,
    selector: &'a ScriptedSelector,
    events: broadcast::Receiver<TrainerEvent>,
    /// The learner's files as they stand; omitted check fields come from here.
    working: Option<Exercise>,
    statuses: Vec<PhaseStatus>,
    submissions: Vec<Exercise>,
}

impl Driver<'_> {
    async fn run(&mut self, script: &SessionScript) -> Result<(), TrainerError> {
        for (index, step) in script.steps.iter().enumerate() {
            debug!(step = index, ?step, "applying step");
            self.apply(index, step).await?;
        }
        Ok(())
    }

    /// Follows selections and rollbacks the session has published, which
    /// replace the working copy with the engine's checkpoint.
    fn sync_working_copy(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(TrainerEvent::ExerciseSelected { exercise }) => self.working = Some(exercise),
                Ok(TrainerEvent::ExecutionStatus { .. }) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "replay driver lagged behind session events");
                }
                Err(_) => break,
            }
        }
    }

    async fn apply(&mut self, index: usize, step: &Step) -> Result<(), TrainerError> {
        match step {
            Step::Select { select } => {
                let exercise = self.catalog.find(select).ok_or_else(|| {
                    ScriptError::UnknownExercise {
                        step: index,
                        name: select.clone(),
                    }
                })?;
                self.selector.push(exercise.clone());
                self.handle.select_exercise().await?;
                self.sync_working_copy();
            }
            Step::Check { check } => {
                self.sync_working_copy();
                let mut submission = self
                    .working
                    .clone()
                    .ok_or(ScriptError::NoExerciseSelected { step: index })?;
                if let Some(code) = &check.code {
                    submission.code.clone_from(code);
                }
                if let Some(tests) = &check.tests {
                    submission.tests.clone_from(tests);
                }
                self.executor.push(check.outcome.clone());
                let status = self.handle.check(submission.clone(), check.advance).await?;
                self.statuses.push(status);
                self.submissions.push(submission.clone());
                self.working = Some(submission);
            }
            Step::Wait { wait } => tokio::time::sleep(*wait).await,
            Step::Action(Action::Reset) => self.handle.reset().await.map_err(|e| match e {
                SessionError::Rejected(phase) => TrainerError::Phase(phase),
                closed @ SessionError::Closed => TrainerError::Session(closed),
            })?,
            Step::Action(Action::DisplayTracking) => self.handle.display_tracking().await?,
            Step::Action(Action::CancelSelection) => {
                let selected = self.handle.select_exercise().await?;
                debug!(selected, "selection cancelled");
            }
        }
        Ok(())
    }
}
