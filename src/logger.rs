//! Fault logging capability.
//!
//! The facade reports contained command faults through a minimal logging
//! trait rather than a concrete sink, so callers can route them anywhere.
//! [`TracingLogger`] covers the common case of feeding them into the
//! `tracing` stack; [`CapturingLogger`] records them for inspection.

use std::sync::{Arc, Mutex, PoisonError};

/// Minimal structured-logging capability the facade needs: one
/// critical-severity call.
pub trait FaultLogger: Send + Sync {
    /// Record a critical-severity message.
    fn critical(&self, message: &str);
}

/// Routes critical messages through the `tracing` stack as error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl FaultLogger for TracingLogger {
    fn critical(&self, message: &str) {
        tracing::error!(target: "redis_facade", "{message}");
    }
}

/// Records every critical message in memory.
///
/// Clones share the same buffer, so a clone handed to a facade can be
/// inspected afterwards. Used by tests and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct CapturingLogger {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FaultLogger for CapturingLogger {
    fn critical(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
