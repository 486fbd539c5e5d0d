//! Shared integration-test harness: a recording babystep timer, an engine
//! wired to scripted collaborators, and helpers for running the binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tddtrainer::babysteps::BabystepTimer;
use tddtrainer::events::EventBus;
use tddtrainer::exercise::{Exercise, SourceFile};
use tddtrainer::phase::{Collaborators, PhaseEngine};
use tddtrainer::replay::{ScriptedExecutor, ScriptedSelector};
use tddtrainer::tracking::MemoryTracker;

/// A call the engine made on its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCall {
    Start(Duration),
    Stop,
    Enable,
    Disable,
}

/// Timer that only records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingTimer(Arc<Mutex<Vec<TimerCall>>>);

impl RecordingTimer {
    /// Drains the recorded calls.
    pub fn take(&self) -> Vec<TimerCall> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl BabystepTimer for RecordingTimer {
    fn start(&mut self, budget: Duration) {
        self.0.lock().unwrap().push(TimerCall::Start(budget));
    }

    fn stop(&mut self) {
        self.0.lock().unwrap().push(TimerCall::Stop);
    }

    fn enable(&mut self) {
        self.0.lock().unwrap().push(TimerCall::Enable);
    }

    fn disable(&mut self) {
        self.0.lock().unwrap().push(TimerCall::Disable);
    }
}

/// Test budget for writing a failing test.
pub const TEST_TIME: Duration = Duration::from_secs(120);

/// Test budget for writing production code.
pub const CODE_TIME: Duration = Duration::from_secs(180);

/// A kata with babysteps enabled.
pub fn fizzbuzz() -> Exercise {
    Exercise::new("fizzbuzz")
        .with_code(vec![SourceFile::new("FizzBuzz", "public class FizzBuzz {}")])
        .with_tests(vec![SourceFile::new("FizzBuzzTest", "public class FizzBuzzTest {}")])
        .with_baby_steps(TEST_TIME, CODE_TIME)
}

/// An engine plus handles on every collaborator it owns.
pub struct Rig {
    pub engine: PhaseEngine,
    pub executor: ScriptedExecutor,
    pub selector: ScriptedSelector,
    pub tracker: MemoryTracker,
    pub timer: RecordingTimer,
    pub bus: EventBus,
}

impl Rig {
    pub fn new() -> Self {
        let executor = ScriptedExecutor::new();
        let selector = ScriptedSelector::new();
        let tracker = MemoryTracker::new();
        let timer = RecordingTimer::default();
        let bus = EventBus::default();
        let engine = PhaseEngine::new(
            Collaborators {
                executor: Box::new(executor.clone()),
                tracker: Box::new(tracker.clone()),
                selector: Box::new(selector.clone()),
                timer: Box::new(timer.clone()),
            },
            bus.clone(),
        );
        Self {
            engine,
            executor,
            selector,
            tracker,
            timer,
            bus,
        }
    }
}

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs the compiled binary to completion.
pub fn run_cli(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_tddtrainer"))
        .args(args)
        .env_remove("TDDTRAINER_LOG_LEVEL")
        .output()
        .expect("failed to spawn tddtrainer")
}

/// Parses JSONL output into values, skipping blank lines.
pub fn jsonl(raw: &str) -> Vec<serde_json::Value> {
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("invalid JSONL line"))
        .collect()
}
