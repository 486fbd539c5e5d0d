//! Observability module
//!
//! Logging, metrics, and the JSONL event stream written by the CLI.

pub mod emitter;
pub mod logging;
pub mod metrics;

pub use emitter::{EventEmitter, forward_events};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
