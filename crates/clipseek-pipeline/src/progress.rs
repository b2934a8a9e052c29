//! Monotone progress reporting.

use std::sync::{Arc, Mutex};
use tracing::debug;

use clipseek_models::{PipelinePhase, ProgressEvent};

use crate::sinks::ProgressSink;

/// Fans progress events out to the optional sink, enforcing that progress
/// values never decrease within one run.
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Option<Arc<dyn ProgressSink>>,
    last: Arc<Mutex<f64>>,
}

impl ProgressReporter {
    pub fn new(sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            sink,
            last: Arc::new(Mutex::new(0.0)),
        }
    }

    pub fn emit(&self, phase: PipelinePhase, step: impl Into<String>, progress: f64) {
        self.emit_event(ProgressEvent::new(phase, step, progress));
    }

    pub fn emit_with_details(
        &self,
        phase: PipelinePhase,
        step: impl Into<String>,
        progress: f64,
        details: serde_json::Value,
    ) {
        self.emit_event(ProgressEvent::new(phase, step, progress).with_details(details));
    }

    fn emit_event(&self, mut event: ProgressEvent) {
        let mut last = self.last.lock().expect("progress lock poisoned");
        event.progress = event.progress.clamp(*last, 1.0);
        *last = event.progress;
        drop(last);

        debug!(
            phase = event.phase.as_str(),
            progress = event.progress,
            "{}",
            event.step
        );

        if let Some(sink) = &self.sink {
            sink.on_progress(&event);
        }
    }
}
