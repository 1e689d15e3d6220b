//! Error types.
//!
//! Resource exhaustion is the only recoverable error surfaced to callers;
//! it is raised at explicit checkpoints in the decision loop and unwinds
//! through the scope stacks. An unsatisfiable formula is a normal result,
//! not an error, and invariant violations are programmer errors that
//! abort the process.

use thiserror::Error;

/// Errors surfaced by the solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The cancellation token was triggered at a checkpoint.
    #[error("solver canceled")]
    Canceled,
    /// The memory ceiling was exceeded at a checkpoint.
    #[error("memory limit of {limit} bytes exceeded ({allocated} allocated)")]
    OutOfMemory {
        /// The configured ceiling in bytes.
        limit: u64,
        /// The estimated allocation at the checkpoint.
        allocated: u64,
    },
}

/// Result alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;
