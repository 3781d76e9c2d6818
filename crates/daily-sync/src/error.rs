//! Sync error types.

use std::path::PathBuf;

use daily_providers::{NormalizeError, ProviderError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for preference and secret stores.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while refreshing or reading the agenda.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No usable credential. The user has to authorize again.
    #[error("not authorized: {message}")]
    Authorization { message: String },

    /// The remote calendar call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A listed item could not be converted. Nothing was merged.
    #[error("malformed calendar item: {0}")]
    Parse(#[from] NormalizeError),

    /// Reading or writing preferences or secrets failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Returns true if the credential is missing or was rejected.
    pub fn is_authorization(&self) -> bool {
        match self {
            Self::Authorization { .. } => true,
            Self::Provider(e) => e.is_authorization(),
            _ => false,
        }
    }

    /// Returns true if the next poll may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_retryable())
    }
}

/// Errors raised by preference and secret stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("no configuration directory for this platform")]
    NoConfigDir,
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_classification() {
        assert!(SyncError::authorization("no token").is_authorization());
        assert!(SyncError::from(ProviderError::authentication("401")).is_authorization());
        assert!(!SyncError::from(ProviderError::network("down")).is_authorization());
        assert!(!SyncError::from(StoreError::NoConfigDir).is_authorization());
    }

    #[test]
    fn retry_classification() {
        assert!(SyncError::from(ProviderError::server("502")).is_retryable());
        assert!(!SyncError::authorization("no token").is_retryable());
    }

    #[test]
    fn display() {
        let err = SyncError::authorization("calendar-token is empty");
        assert_eq!(err.to_string(), "not authorized: calendar-token is empty");

        let err = StoreError::invalid_value("calendar-update-interval", "soon");
        assert_eq!(
            err.to_string(),
            "invalid value for calendar-update-interval: \"soon\""
        );
    }
}
