//! Resource limits.
//!
//! The solver is a synchronous state machine; the only cancellation sites
//! are the explicit checkpoints in the decision and probe loops, which
//! consult this manager. The cancellation flag may be shared with other
//! threads; the memory ceiling is checked against the solver's own
//! allocation estimate.

use crate::error::{Result, SolverError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag and memory ceiling consulted at checkpoints.
#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    cancel: Arc<AtomicBool>,
    max_memory: Option<u64>,
}

impl ResourceManager {
    /// Create a manager with no limits set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared cancellation flag. Storing `true` makes the next
    /// checkpoint fail with [`SolverError::Canceled`].
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Clear a pending cancellation request.
    pub fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::Relaxed);
    }

    /// Set the memory ceiling in bytes.
    pub fn set_max_memory(&mut self, bytes: u64) {
        self.max_memory = Some(bytes);
    }

    /// The configured memory ceiling, if any.
    #[must_use]
    pub fn max_memory(&self) -> Option<u64> {
        self.max_memory
    }

    /// Check whether cancellation was requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Checkpoint: fail if canceled or over the memory ceiling.
    pub fn check(&self, allocated: u64) -> Result<()> {
        if self.is_canceled() {
            return Err(SolverError::Canceled);
        }
        if let Some(limit) = self.max_memory {
            if allocated > limit {
                return Err(SolverError::OutOfMemory { limit, allocated });
            }
        }
        Ok(())
    }
}
