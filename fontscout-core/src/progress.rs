//! Progress reporting seam for discovery runs.
//!
//! The orchestrator overwrites a single message at each named step; a polling
//! caller reads the latest one. No global state: the sink is handed to the
//! orchestrator per call.

use std::sync::{Arc, Mutex};

pub trait ProgressSink: Send + Sync {
    /// Overwrite the current step message.
    fn set(&self, message: &str);
    /// Latest message, empty when idle.
    fn get(&self) -> String;
}

/// Shared mutable slot for the poll-for-progress UX; clone one side into the
/// orchestrator and read from the other.
#[derive(Clone, Default)]
pub struct SharedProgress {
    slot: Arc<Mutex<String>>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for SharedProgress {
    fn set(&self, message: &str) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = message.to_string();
        }
    }

    fn get(&self) -> String {
        self.slot.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// Sink that drops every message, for one-shot callers that only want the
/// final result.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set(&self, _message: &str) {}

    fn get(&self) -> String {
        String::new()
    }
}
