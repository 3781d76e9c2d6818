//! Stored credential parsing.
//!
//! The `calendar-token` secret holds either a bare bearer token or the JSON
//! token blob written by an OAuth flow. Only the access token is used.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenBlob {
    #[serde(default)]
    access_token: String,
}

/// Extracts the bearer token from a stored credential.
///
/// Returns `None` for an empty credential, or a JSON blob without a usable
/// `access_token`.
pub fn access_token_from_credential(credential: &str) -> Option<String> {
    let credential = credential.trim();
    if credential.is_empty() {
        return None;
    }

    if credential.starts_with('{') {
        let blob: TokenBlob = serde_json::from_str(credential).ok()?;
        let token = blob.access_token.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    Some(credential.to_string())
}
