//! Client error types.

use daily_core::TracingError;
use daily_sync::{StoreError, SyncError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening a link or another side action failed.
    #[error("action failed: {0}")]
    Action(String),
}

impl ClientError {
    /// Returns true if running `daily auth` would fix this.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Sync(e) if e.is_authorization())
    }
}
