//! `daily auth`: stored credentials.
//!
//! Obtaining a token is left to an OAuth helper; these commands only store
//! or remove what it produced.

use std::io::BufRead;

use daily_providers::google::access_token_from_credential;
use daily_sync::{Preferences, SecretStore, keys};
use tracing::info;

use crate::error::{ClientError, ClientResult};

/// Stores the calendar credential and drops the sync token of the previous
/// one.
pub fn set_token(
    secrets: &dyn SecretStore,
    prefs: &dyn Preferences,
    token: Option<String>,
) -> ClientResult<()> {
    let credential = token_or_stdin(token)?;
    if access_token_from_credential(&credential).is_none() {
        return Err(ClientError::Config(
            "credential holds no access token".to_string(),
        ));
    }

    secrets.set(keys::CALENDAR_TOKEN, &credential)?;
    prefs.remove(keys::SYNC_TOKEN)?;
    info!("calendar credential stored");
    println!("Calendar credential stored.");
    Ok(())
}

pub fn set_mattermost_token(secrets: &dyn SecretStore, token: Option<String>) -> ClientResult<()> {
    let token = token_or_stdin(token)?;
    secrets.set(keys::MATTERMOST_TOKEN, &token)?;
    println!("Mattermost token stored.");
    Ok(())
}

pub fn clear(secrets: &dyn SecretStore, prefs: &dyn Preferences) -> ClientResult<()> {
    secrets.delete(keys::CALENDAR_TOKEN)?;
    secrets.delete(keys::MATTERMOST_TOKEN)?;
    prefs.remove(keys::SYNC_TOKEN)?;
    println!("Stored credentials removed.");
    Ok(())
}

fn token_or_stdin(token: Option<String>) -> ClientResult<String> {
    let token = match token {
        Some(token) => token,
        None => {
            eprintln!("Paste the token, then press Enter:");
            read_token(std::io::stdin().lock())?
        }
    };
    non_empty(token)
}

fn read_token(mut input: impl BufRead) -> ClientResult<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

fn non_empty(token: String) -> ClientResult<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ClientError::Config("empty token".to_string()));
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use daily_sync::{MemoryPreferences, MemorySecretStore};

    #[test]
    fn set_token_stores_and_resets_sync() {
        let secrets = MemorySecretStore::new();
        let prefs = MemoryPreferences::new().with_value(keys::SYNC_TOKEN, "stale");

        set_token(&secrets, &prefs, Some(" ya29.token \n".to_string())).unwrap();
        assert_eq!(
            secrets.get(keys::CALENDAR_TOKEN).unwrap().as_deref(),
            Some("ya29.token")
        );
        assert!(prefs.get_string(keys::SYNC_TOKEN).unwrap().is_none());
    }

    #[test]
    fn rejects_blob_without_access_token() {
        let secrets = MemorySecretStore::new();
        let prefs = MemoryPreferences::new();
        let err = set_token(&secrets, &prefs, Some(r#"{"refresh_token":"r"}"#.to_string()));
        assert!(err.is_err());
        assert!(secrets.get(keys::CALENDAR_TOKEN).unwrap().is_none());
    }

    #[test]
    fn rejects_empty_token() {
        let secrets = MemorySecretStore::new();
        assert!(set_mattermost_token(&secrets, Some("   ".to_string())).is_err());
    }

    #[test]
    fn reads_first_line() {
        let token = read_token(std::io::Cursor::new("abc\nignored\n")).unwrap();
        assert_eq!(non_empty(token).unwrap(), "abc");
    }

    #[test]
    fn clear_removes_everything() {
        let secrets = MemorySecretStore::new()
            .with_secret(keys::CALENDAR_TOKEN, "a")
            .with_secret(keys::MATTERMOST_TOKEN, "b");
        let prefs = MemoryPreferences::new().with_value(keys::SYNC_TOKEN, "t");

        clear(&secrets, &prefs).unwrap();
        assert!(secrets.get(keys::CALENDAR_TOKEN).unwrap().is_none());
        assert!(secrets.get(keys::MATTERMOST_TOKEN).unwrap().is_none());
        assert!(prefs.get_string(keys::SYNC_TOKEN).unwrap().is_none());
    }
}
