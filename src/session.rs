//! Single-writer session actor
//!
//! A [`Session`] owns a [`PhaseEngine`] inside one tokio task. Checks,
//! resets, selections and babystep expiries all arrive on that task's
//! queue and are applied one at a time, so the engine never sees two
//! writers. Callers talk to it through a cloneable [`SessionHandle`].

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::babysteps::{BabystepExpired, BabystepExpiries};
use crate::error::{PhaseError, SessionError};
use crate::exercise::Exercise;
use crate::phase::{Phase, PhaseEngine, PhaseStatus};

/// Commands buffered before senders wait.
const COMMAND_QUEUE_DEPTH: usize = 64;

/// Point-in-time view of the engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current phase
    pub phase: Phase,
    /// Exercise as selected
    pub original_exercise: Exercise,
    /// Most recent valid submission
    pub last_valid_exercise: Option<Exercise>,
    /// Status of the most recent check
    pub last_status: PhaseStatus,
}

enum Command {
    Check {
        submission: Box<Exercise>,
        advance: bool,
        reply: oneshot::Sender<PhaseStatus>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), PhaseError>>,
    },
    Select {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    DisplayTracking,
}

/// The task side of a session.
pub struct Session {
    engine: PhaseEngine,
    commands: mpsc::Receiver<Command>,
    expiries: Option<BabystepExpiries>,
    cancel: CancellationToken,
    id: String,
}

impl Session {
    /// Moves `engine` into a new task and returns a handle to it.
    ///
    /// `expiries` is the receiving end of the engine's babystep timer, if
    /// it has one. The join handle yields the engine back once the session
    /// stops.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        engine: PhaseEngine,
        expiries: Option<BabystepExpiries>,
    ) -> (SessionHandle, JoinHandle<PhaseEngine>) {
        Self::spawn_named(engine, expiries, uuid::Uuid::new_v4().to_string())
    }

    /// Like [`Session::spawn`], with a caller-chosen session id.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn_named(
        engine: PhaseEngine,
        expiries: Option<BabystepExpiries>,
        id: impl Into<String>,
    ) -> (SessionHandle, JoinHandle<PhaseEngine>) {
        let (tx, commands) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let cancel = CancellationToken::new();
        let id = id.into();

        let session = Self {
            engine,
            commands,
            expiries,
            cancel: cancel.clone(),
            id: id.clone(),
        };
        let task = tokio::spawn(session.run());

        (SessionHandle { tx, cancel, id }, task)
    }

    async fn run(mut self) -> PhaseEngine {
        info!(session_id = %self.id, "session started");
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("session cancelled");
                    break;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("all session handles dropped");
                        break;
                    };
                    self.apply(command);
                }
                Some(expired) = next_expiry(self.expiries.as_mut()) => {
                    self.engine.on_babystep_expired(expired.budget);
                }
            }
        }
        info!(session_id = %self.id, phase = %self.engine.phase(), "session stopped");
        self.engine
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Check {
                submission,
                advance,
                reply,
            } => {
                let status = self.engine.check_phase(*submission, advance);
                let _ = reply.send(status);
            }
            Command::Reset { reply } => {
                let _ = reply.send(self.engine.reset_phase());
            }
            Command::Select { reply } => {
                let _ = reply.send(self.engine.select_exercise());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(SessionSnapshot {
                    phase: self.engine.phase(),
                    original_exercise: self.engine.original_exercise().clone(),
                    last_valid_exercise: self.engine.last_valid_exercise().cloned(),
                    last_status: self.engine.last_status().clone(),
                });
            }
            Command::DisplayTracking => self.engine.display_tracking(),
        }
    }
}

async fn next_expiry(expiries: Option<&mut BabystepExpiries>) -> Option<BabystepExpired> {
    match expiries {
        Some(expiries) => expiries.recv().await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle for sending commands to a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    id: String,
}

impl SessionHandle {
    /// Unique id of the session.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Checks a submission; see [`PhaseEngine::check_phase`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn check(
        &self,
        submission: Exercise,
        advance: bool,
    ) -> Result<PhaseStatus, SessionError> {
        self.request(|reply| Command::Check {
            submission: Box::new(submission),
            advance,
            reply,
        })
        .await
    }

    /// Resets the phase; see [`PhaseEngine::reset_phase`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] during REFACTOR and
    /// [`SessionError::Closed`] if the session has stopped.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Reset { reply }).await??;
        Ok(())
    }

    /// Selects an exercise; see [`PhaseEngine::select_exercise`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn select_exercise(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::Select { reply }).await
    }

    /// Reads the current engine state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Asks the tracker to display its history.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn display_tracking(&self) -> Result<(), SessionError> {
        self.tx
            .send(Command::DisplayTracking)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Stops the session after the command currently being applied.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::babysteps;
    use crate::events::{EventBus, TrainerEvent};
    use crate::execution::ExecutionOutcome;
    use crate::phase::Collaborators;
    use crate::replay::{ScriptedExecutor, ScriptedSelector};
    use crate::tracking::MemoryTracker;

    const BUDGET: Duration = Duration::from_secs(60);

    struct Fixture {
        handle: SessionHandle,
        task: JoinHandle<PhaseEngine>,
        executor: ScriptedExecutor,
        bus: EventBus,
    }

    fn start() -> Fixture {
        let executor = ScriptedExecutor::new();
        let selector = ScriptedSelector::new();
        selector.push(Exercise::new("fizzbuzz").with_baby_steps(BUDGET, BUDGET));
        let (timer, expiries) = babysteps::channel();
        let bus = EventBus::default();

        let engine = PhaseEngine::new(
            Collaborators {
                executor: Box::new(executor.clone()),
                tracker: Box::new(MemoryTracker::new()),
                selector: Box::new(selector),
                timer: Box::new(timer),
            },
            bus.clone(),
        );
        let (handle, task) = Session::spawn(engine, Some(expiries));
        Fixture {
            handle,
            task,
            executor,
            bus,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_applied_in_order() {
        let f = start();
        assert!(f.handle.select_exercise().await.unwrap());

        f.executor.push(ExecutionOutcome::compiled(1, 1));
        f.executor.push(ExecutionOutcome::compiled(1, 0));
        let first = f.handle.check(Exercise::new("fizzbuzz"), true).await.unwrap();
        let second = f.handle.check(Exercise::new("fizzbuzz"), true).await.unwrap();

        assert_eq!(first.phase, Phase::Green);
        assert_eq!(second.phase, Phase::Refactor);
        assert_eq!(f.handle.snapshot().await.unwrap().phase, Phase::Refactor);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_in_refactor_rejected() {
        let f = start();
        f.handle.select_exercise().await.unwrap();
        f.executor.push(ExecutionOutcome::compiled(1, 1));
        f.executor.push(ExecutionOutcome::compiled(1, 0));
        f.handle.check(Exercise::new("fizzbuzz"), true).await.unwrap();
        f.handle.check(Exercise::new("fizzbuzz"), true).await.unwrap();

        let err = f.handle.reset().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Rejected(PhaseError::ResetDuringRefactor)
        ));
        assert_eq!(f.handle.snapshot().await.unwrap().phase, Phase::Refactor);
    }

    #[tokio::test(start_paused = true)]
    async fn test_babystep_expiry_rolls_back_through_queue() {
        let f = start();
        let mut events = f.bus.subscribe();
        f.handle.select_exercise().await.unwrap();

        f.executor.push(ExecutionOutcome::compiled(1, 1));
        let status = f.handle.check(Exercise::new("attempt"), true).await.unwrap();
        assert_eq!(status.phase, Phase::Green);

        tokio::time::sleep(BUDGET + Duration::from_secs(1)).await;

        let snapshot = f.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Red);
        assert_eq!(
            snapshot.last_valid_exercise.map(|e| e.name),
            Some("attempt".to_string())
        );

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(match event {
                TrainerEvent::ExerciseSelected { .. } => "selected",
                TrainerEvent::ExecutionStatus { .. } => "status",
            });
        }
        assert_eq!(kinds, vec!["selected", "status", "selected"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_expiry_while_refactoring() {
        let f = start();
        f.handle.select_exercise().await.unwrap();
        f.executor.push(ExecutionOutcome::compiled(1, 1));
        f.executor.push(ExecutionOutcome::compiled(1, 0));
        f.handle.check(Exercise::new("fizzbuzz"), true).await.unwrap();
        f.handle.check(Exercise::new("fizzbuzz"), true).await.unwrap();

        tokio::time::sleep(BUDGET * 3).await;
        assert_eq!(f.handle.snapshot().await.unwrap().phase, Phase::Refactor);
    }

    #[tokio::test]
    async fn test_shutdown_returns_engine() {
        let f = start();
        f.handle.select_exercise().await.unwrap();
        f.handle.shutdown();

        let engine = f.task.await.unwrap();
        assert_eq!(engine.original_exercise().name, "fizzbuzz");
        assert!(matches!(
            f.handle.snapshot().await,
            Err(SessionError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_session() {
        let f = start();
        let id = f.handle.id().to_string();
        assert!(!id.is_empty());
        drop(f.handle);
        let engine = f.task.await.unwrap();
        assert_eq!(engine.phase(), Phase::Red);
    }
}
