//! Babystep timer
//!
//! The engine tells a [`BabystepTimer`] when a phase budget starts and
//! stops; the timer decides nothing. [`TokioBabystepTimer`] counts down on
//! the tokio runtime and reports expiry as a message on a channel, so the
//! owner of the engine can apply it on the same queue as every other
//! mutation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Controls the per-phase time budget.
pub trait BabystepTimer: Send {
    /// Starts a new countdown, superseding any running one.
    fn start(&mut self, budget: Duration);

    /// Stops the running countdown, if any.
    fn stop(&mut self);

    /// Allows countdowns to run.
    fn enable(&mut self);

    /// Stops the running countdown and ignores further starts.
    fn disable(&mut self);
}

/// A countdown ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BabystepExpired {
    /// Span the expiry belongs to
    pub generation: u64,
    /// Budget that ran out
    pub budget: Duration,
}

/// Creates a tokio-backed timer and the receiving end of its expiries.
#[must_use]
pub fn channel() -> (TokioBabystepTimer, BabystepExpiries) {
    let (tx, rx) = mpsc::unbounded_channel();
    let generation = Arc::new(AtomicU64::new(0));
    let timer = TokioBabystepTimer {
        enabled: false,
        generation: Arc::clone(&generation),
        current: None,
        expiry_tx: tx,
    };
    (timer, BabystepExpiries { rx, generation })
}

/// Babystep timer that spawns one sleep task per span.
///
/// Starts outside a tokio runtime are logged and ignored.
pub struct TokioBabystepTimer {
    enabled: bool,
    /// Bumped on every start and stop; expiries carrying an older value
    /// are stale.
    generation: Arc<AtomicU64>,
    current: Option<CancellationToken>,
    expiry_tx: mpsc::UnboundedSender<BabystepExpired>,
}

impl TokioBabystepTimer {
    /// Whether starts are honoured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a countdown is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn cancel_current(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl BabystepTimer for TokioBabystepTimer {
    fn start(&mut self, budget: Duration) {
        if !self.enabled {
            debug!(?budget, "babysteps disabled; not starting timer");
            return;
        }
        self.cancel_current();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime; babystep timer not started");
            return;
        };

        let generation = self.generation.load(Ordering::SeqCst);
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.expiry_tx.clone();

        runtime.spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(budget) => {
                    debug!(generation, ?budget, "babystep budget expired");
                    let _ = tx.send(BabystepExpired { generation, budget });
                }
            }
        });

        self.current = Some(token);
        debug!(generation, ?budget, "babystep timer started");
    }

    fn stop(&mut self) {
        self.cancel_current();
        debug!("babystep timer stopped");
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.cancel_current();
        self.enabled = false;
    }
}

impl Drop for TokioBabystepTimer {
    fn drop(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl std::fmt::Debug for TokioBabystepTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioBabystepTimer")
            .field("enabled", &self.enabled)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Receiving end of a [`TokioBabystepTimer`].
#[derive(Debug)]
pub struct BabystepExpiries {
    rx: mpsc::UnboundedReceiver<BabystepExpired>,
    generation: Arc<AtomicU64>,
}

impl BabystepExpiries {
    /// Waits for the next expiry of the current span.
    ///
    /// Expiries that raced with a later start or stop are dropped. Returns
    /// `None` once the timer has been dropped.
    pub async fn recv(&mut self) -> Option<BabystepExpired> {
        loop {
            let expired = self.rx.recv().await?;
            if expired.generation == self.generation.load(Ordering::SeqCst) {
                return Some(expired);
            }
            debug!(
                generation = expired.generation,
                "discarding expiry from superseded span"
            );
        }
    }
}
