//! `tddtrainer` - Red-Green-Refactor phase engine
//!
//! This library tracks a learner through the TDD cycle: it judges each
//! submission against the current phase, advances RED → GREEN → REFACTOR,
//! enforces optional babystep time budgets and publishes what happened.
//!
//! The [`phase::PhaseEngine`] is the core. It is owned by a
//! [`session::Session`] task that serializes checks, resets, selections
//! and timer expiries.

pub mod babysteps;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod execution;
pub mod exercise;
pub mod observability;
pub mod phase;
pub mod replay;
pub mod session;
pub mod tracking;
