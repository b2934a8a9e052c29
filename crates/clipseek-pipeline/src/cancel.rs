//! Cancellation plumbing shared by all stages.
//!
//! A pipeline run holds a [`CancelSignal`]; the embedder keeps the
//! [`CancelHandle`]. Once signalled, no stage initiates new external calls,
//! pending stagger/backoff sleeps wake early, and subprocess runners given
//! the same watch receiver terminate their children.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{PipelineError, PipelineResult};

/// Create a connected cancellation handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Sender half. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half. Cheap to clone; every worker task carries one.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires, for callers without cancellation needs.
    pub fn never() -> Self {
        static NEVER: OnceLock<watch::Sender<bool>> = OnceLock::new();
        let tx = NEVER.get_or_init(|| watch::channel(false).0);
        Self { rx: tx.subscribe() }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Error out immediately when already cancelled. Called before every
    /// external call.
    pub fn check(&self) -> PipelineResult<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation is signalled; never resolves otherwise.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep that wakes early on cancellation.
    pub async fn sleep(&self, duration: Duration) -> PipelineResult<()> {
        self.check()?;
        let mut signal = self.clone();
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = signal.cancelled() => Err(PipelineError::Cancelled),
        }
    }

    /// The underlying watch receiver, for wiring into subprocess runners.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}
