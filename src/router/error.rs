//! Router error taxonomy.
//!
//! Constraint and validation failures surface to the caller; persistence
//! failures are contained in the storage writer and only logged.

use thiserror::Error;

/// Errors the selection engine can return to a caller.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The requested task type is not in the profile registry.
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    /// No candidate satisfies quality and budget, and the catalog has no
    /// zero-cost fallback.
    #[error("no viable model: budget exhausted or quality requirements too high")]
    NoViableModel,
}
