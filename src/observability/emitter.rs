//! JSONL event stream.
//!
//! Every [`TrainerEvent`] a session publishes can be written as one JSON
//! line with a monotonically increasing sequence number, a timestamp and
//! the session id.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::events::TrainerEvent;

/// One line of the stream.
#[derive(Debug, Serialize)]
struct Line<'a> {
    sequence: u64,
    timestamp: DateTime<Utc>,
    session_id: &'a str,
    #[serde(flatten)]
    event: &'a TrainerEvent,
}

/// Buffered JSONL sink for trainer events.
///
/// Serialization or I/O failures are dropped: the event stream must never
/// take a session down.
pub struct EventEmitter {
    sink: Mutex<BufWriter<Box<dyn Write + Send>>>,
    next: AtomicU64,
    session_id: String,
}

// Box<dyn Write> is not Debug.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("session_id", &self.session_id)
            .field("written", &self.written())
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Stream lines to `sink`, stamped with `session_id`.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>, session_id: impl Into<String>) -> Self {
        Self {
            sink: Mutex::new(BufWriter::new(sink)),
            next: AtomicU64::new(0),
            session_id: session_id.into(),
        }
    }

    /// Stream lines to standard output.
    #[must_use]
    pub fn stdout(session_id: impl Into<String>) -> Self {
        Self::new(Box::new(std::io::stdout()), session_id)
    }

    /// Stream lines to a freshly truncated file.
    ///
    /// # Errors
    ///
    /// Fails when `path` cannot be created.
    pub fn from_file(path: &Path, session_id: impl Into<String>) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file), session_id))
    }

    /// Writes `event` as the next line and flushes.
    pub fn emit(&self, event: &TrainerEvent) {
        let line = Line {
            sequence: self.next.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            session_id: &self.session_id,
            event,
        };
        let Ok(json) = serde_json::to_string(&line) else {
            return;
        };
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{json}").and_then(|()| sink.flush());
        }
    }

    /// Lines handed out so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Spawns a subscriber task that writes every event from `rx` to `emitter`
/// until the bus is dropped. Resolves to the number of events written.
pub fn forward_events(
    mut rx: broadcast::Receiver<TrainerEvent>,
    emitter: EventEmitter,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => emitter.emit(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        emitter.written()
    })
}
