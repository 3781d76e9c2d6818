//! Error types for remote calendar and status operations.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
///
/// Callers branch on the code: authorization failures need user action,
/// retryable ones are left to the next poll, and an expired sync token is
/// recovered with a full fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials are missing, invalid or expired (401).
    AuthenticationFailed,
    /// The credential lacks access to the resource (403).
    AuthorizationFailed,
    /// Connection failed, timed out or the body could not be read.
    NetworkError,
    /// Too many requests (429).
    RateLimited,
    /// 5xx status codes.
    ServerError,
    /// The body did not parse.
    InvalidResponse,
    /// 404.
    NotFound,
    /// 400, or another unexpected 4xx.
    BadRequest,
    /// Missing or invalid local configuration.
    ConfigurationError,
    /// The incremental sync token is no longer valid (410 Gone).
    SyncTokenExpired,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns true if the credential itself was rejected.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::AuthenticationFailed | Self::AuthorizationFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::SyncTokenExpired => "sync_token_expired",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised by a remote calendar or status service.
#[derive(Debug, Error)]
#[error("{}{}: {}", service_prefix(.provider), .code, .message)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Service that produced the error ("google", "mattermost").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn sync_token_expired(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::SyncTokenExpired, message)
    }

    /// Sets the service name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn is_authorization(&self) -> bool {
        self.code.is_authorization()
    }

    pub fn is_sync_token_expired(&self) -> bool {
        self.code == ProviderErrorCode::SyncTokenExpired
    }
}

fn service_prefix(provider: &Option<String>) -> String {
    provider
        .as_deref()
        .map(|p| format!("[{}] ", p))
        .unwrap_or_default()
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_codes() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::RateLimited.is_retryable());
        assert!(ProviderErrorCode::ServerError.is_retryable());
        assert!(!ProviderErrorCode::AuthenticationFailed.is_retryable());
        assert!(!ProviderErrorCode::SyncTokenExpired.is_retryable());
    }

    #[test]
    fn authorization_codes() {
        assert!(ProviderError::authentication("expired").is_authorization());
        assert!(ProviderError::authorization("denied").is_authorization());
        assert!(!ProviderError::network("down").is_authorization());
    }

    #[test]
    fn sync_token_expired() {
        let err = ProviderError::sync_token_expired("gone").with_provider("google");
        assert!(err.is_sync_token_expired());
        assert_eq!(err.code().as_str(), "sync_token_expired");
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_includes_provider_and_code() {
        let err = ProviderError::rate_limited("too many requests").with_provider("google");
        assert_eq!(err.to_string(), "[google] rate_limited: too many requests");
        assert_eq!(
            ProviderError::not_found("calendar not found").to_string(),
            "not_found: calendar not found"
        );
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ProviderError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
