//! `daily config`: configuration file and preferences.

use daily_sync::{Preferences, TomlPreferences, keys};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Preferences that hold a whole number of minutes.
const MINUTE_KEYS: &[&str] = &[keys::CALENDAR_UPDATE_INTERVAL, keys::NOTIFICATION_TIME];

/// Print the configuration and the stored preferences.
pub fn show(config: &ClientConfig, prefs: &TomlPreferences) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    println!("# preferences ({})", prefs.path().display());
    for (key, value) in prefs.entries() {
        if key == keys::SYNC_TOKEN {
            continue;
        }
        println!("{} = {}", key, value);
    }
    Ok(())
}

/// Validates and stores one preference.
pub fn set(prefs: &dyn Preferences, key: &str, value: &str) -> ClientResult<()> {
    check_key(key)?;
    let value = value.trim();
    if MINUTE_KEYS.contains(&key) && value.parse::<u64>().is_err() {
        return Err(ClientError::Config(format!(
            "{} takes a number of minutes, got {:?}",
            key, value
        )));
    }
    if value.is_empty() {
        return Err(ClientError::Config(format!("{} cannot be empty", key)));
    }

    prefs.set_string(key, value)?;
    if key == keys::CALENDAR_ID {
        // tokens are per calendar
        prefs.remove(keys::SYNC_TOKEN)?;
    }
    println!("{} = {}", key, value);
    Ok(())
}

pub fn unset(prefs: &dyn Preferences, key: &str) -> ClientResult<()> {
    check_key(key)?;
    prefs.remove(key)?;
    Ok(())
}

pub fn path(prefs: &TomlPreferences) -> ClientResult<()> {
    println!("config: {}", ClientConfig::default_path().display());
    println!("preferences: {}", prefs.path().display());
    Ok(())
}

fn check_key(key: &str) -> ClientResult<()> {
    if key == keys::SYNC_TOKEN || !keys::ALL_PREFERENCES.contains(&key) {
        let known: Vec<_> = keys::ALL_PREFERENCES
            .iter()
            .filter(|k| **k != keys::SYNC_TOKEN)
            .copied()
            .collect();
        return Err(ClientError::Config(format!(
            "unknown preference {:?} (known: {})",
            key,
            known.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use daily_sync::MemoryPreferences;

    #[test]
    fn sets_known_preferences() {
        let prefs = MemoryPreferences::new();
        set(&prefs, keys::NOTIFICATION_TIME, " 5 ").unwrap();
        set(&prefs, keys::MATTERMOST_SERVER, "chat.example.com").unwrap();
        assert_eq!(prefs.get_u64_or(keys::NOTIFICATION_TIME, 1).unwrap(), 5);
        assert_eq!(
            prefs.get_string(keys::MATTERMOST_SERVER).unwrap().as_deref(),
            Some("chat.example.com")
        );
    }

    #[test]
    fn rejects_unknown_and_internal_keys() {
        let prefs = MemoryPreferences::new();
        assert!(set(&prefs, "colour", "blue").is_err());
        assert!(set(&prefs, keys::SYNC_TOKEN, "abc").is_err());
        assert!(unset(&prefs, "colour").is_err());
    }

    #[test]
    fn rejects_non_numeric_minutes() {
        let prefs = MemoryPreferences::new();
        let err = set(&prefs, keys::CALENDAR_UPDATE_INTERVAL, "soon").unwrap_err();
        assert!(err.to_string().contains("number of minutes"));
    }

    #[test]
    fn changing_calendar_drops_sync_token() {
        let prefs = MemoryPreferences::new().with_value(keys::SYNC_TOKEN, "t1");
        set(&prefs, keys::CALENDAR_ID, "team@example.com").unwrap();
        assert!(prefs.get_string(keys::SYNC_TOKEN).unwrap().is_none());
    }

    #[test]
    fn unset_removes() {
        let prefs = MemoryPreferences::new().with_value(keys::NOTIFICATION_TIME, "3");
        unset(&prefs, keys::NOTIFICATION_TIME).unwrap();
        assert!(prefs.get_string(keys::NOTIFICATION_TIME).unwrap().is_none());
    }
}
