//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

/// daily - your calendar, one day at a time
#[derive(Debug, Parser)]
#[command(name = "daily")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DAILY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Serve canned events instead of the calendar
    #[arg(long, env = "DAILY_FIXTURE", value_parser = BoolishValueParser::new(), global = true)]
    pub fixture: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the agenda of a day (default command)
    Agenda(AgendaArgs),

    /// Poll the calendar, send reminders and update the meeting status
    Watch,

    /// Configuration and preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct AgendaArgs {
    /// Day to show (YYYY-MM-DD), today by default
    #[arg(long)]
    pub day: Option<NaiveDate>,

    /// Refresh from the calendar even if the cache is current
    #[arg(long, short)]
    pub refresh: bool,

    /// Print each event's details below it
    #[arg(long)]
    pub details: bool,

    /// Open the meeting link of the ongoing or next meeting
    #[arg(long)]
    pub open: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show configuration and preferences
    Show,

    /// Set a preference
    Set { key: String, value: String },

    /// Remove a preference
    Unset { key: String },

    /// Show file paths
    Path,
}

#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Store the calendar credential (bearer token or OAuth token JSON)
    SetToken {
        /// Read from stdin when omitted
        #[arg(long, env = "DAILY_CALENDAR_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Store the Mattermost personal access token
    SetMattermostToken {
        /// Read from stdin when omitted
        #[arg(long, env = "DAILY_MATTERMOST_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Remove stored credentials and the sync token
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_agenda_day() {
        let cli = Cli::parse_from(["daily", "agenda", "--day", "2025-03-10", "--refresh"]);
        match cli.command {
            Some(Command::Agenda(args)) => {
                assert_eq!(args.day, NaiveDate::from_ymd_opt(2025, 3, 10));
                assert!(args.refresh);
                assert!(!args.open);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn fixture_flag_after_subcommand() {
        let cli = Cli::parse_from(["daily", "watch", "--fixture"]);
        assert!(cli.fixture);
        assert!(matches!(cli.command, Some(Command::Watch)));
    }

    #[test]
    fn rejects_malformed_day() {
        assert!(Cli::try_parse_from(["daily", "agenda", "--day", "10/03/2025"]).is_err());
    }

    #[test]
    fn config_set() {
        let cli = Cli::parse_from(["daily", "config", "set", "notification-time", "5"]);
        match cli.command {
            Some(Command::Config {
                action: ConfigAction::Set { key, value },
            }) => {
                assert_eq!(key, "notification-time");
                assert_eq!(value, "5");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
