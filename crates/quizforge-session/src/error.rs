//! Session error types.

use thiserror::Error;

/// Errors raised by exam-session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("select at least one exercise type")]
    NoKindsSelected,

    #[error("no exercises match the selected filters")]
    EmptyPool,

    /// The caller may retry with `accept_smaller` once the user confirms.
    #[error("only {available} exercises match, {requested} requested")]
    PoolTooSmall { requested: usize, available: usize },

    #[error("no exam is running")]
    NotRunning,

    #[error("an exam is already running")]
    AlreadyRunning,
}

impl SessionError {
    /// Returns the matching pool size when the failure is recoverable by
    /// accepting a smaller exam.
    pub fn available_pool(&self) -> Option<usize> {
        match self {
            SessionError::PoolTooSmall { available, .. } => Some(*available),
            _ => None,
        }
    }
}

/// Errors at the snapshot persistence boundary. Callers treat every variant
/// as "state unavailable" and fall back to fresh initialization.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("snapshot is {age_hours}h old, past the staleness threshold")]
    Stale { age_hours: i64 },
}
