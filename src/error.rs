//! Error types for Steplite
//!
//! Every engine failure is captured into an owned error value at the moment
//! it happens. The engine's error-message slot is stateful and can be
//! overwritten by the next call, so the message is copied out immediately
//! rather than read lazily.

use thiserror::Error;

/// The main error type for Steplite
#[derive(Error, Debug)]
pub enum Error {
    #[error("Open error: {0}")]
    Open(String),

    #[error("Prepare error: {0}")]
    Prepare(String),

    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Step error: {0}")]
    Step(String),

    /// Programmer error, not an engine error: the statement's native handle
    /// was already released.
    #[error("Statement error: statement already finalized")]
    StatementFinalized,
}

/// Result type alias for Steplite operations
pub type Result<T> = std::result::Result<T, Error>;
