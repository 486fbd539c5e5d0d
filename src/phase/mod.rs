//! Phase engine
//!
//! Implements the Red-Green-Refactor state machine that decides whether a
//! submission is valid for the current phase and whether to advance.
//!
//! # Architecture
//!
//! - [`Phase`] / [`PhaseStatus`] - Cycle step and per-check verdict
//! - [`rules`] - Per-phase acceptance rules
//! - [`PhaseEngine`] - Orchestrator (evaluation, transitions, timer, events)

pub mod engine;
pub mod rules;
pub mod state;

pub use engine::{Collaborators, PhaseEngine};
pub use state::{Phase, PhaseStatus};
