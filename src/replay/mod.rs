//! Session replay
//!
//! Drives a [`crate::session::Session`] from a YAML script, with scripted
//! stand-ins for the execution engine and the exercise picker.

pub mod script;
pub mod scripted;

pub use script::{Action, CheckStep, Replay, ReplayReport, SessionScript, Step};
pub use scripted::{NO_SCRIPTED_OUTCOME, ScriptedExecutor, ScriptedSelector};
