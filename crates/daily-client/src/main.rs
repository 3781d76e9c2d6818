//! daily CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use daily_core::{TracingConfig, init_tracing};
use daily_sync::{KeyringSecretStore, Preferences, TomlPreferences};
use tracing::Level;

use daily_client::cli::{AgendaArgs, AuthAction, Cli, Command, ConfigAction};
use daily_client::commands;
use daily_client::config::ClientConfig;
use daily_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if e.is_authorization() {
                eprintln!("hint: store a calendar credential with `daily auth set-token`");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    config.validate()?;

    let tracing = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, Some(Command::Watch)) {
        TracingConfig::watch()
    } else {
        TracingConfig::default().with_level(Level::WARN)
    };
    init_tracing(tracing)?;

    let secrets = KeyringSecretStore::default();
    let toml_prefs = Arc::new(TomlPreferences::open(ClientConfig::preferences_path())?);
    let prefs: Arc<dyn Preferences> = toml_prefs.clone();

    match cli.command.unwrap_or_else(|| Command::Agenda(AgendaArgs::default())) {
        Command::Agenda(args) => {
            let source = commands::event_source(cli.fixture, &secrets, prefs, &config)?;
            commands::agenda::run(source.as_ref(), &args).await
        }
        Command::Watch => {
            let source = commands::event_source(cli.fixture, &secrets, prefs.clone(), &config)?;
            commands::watch::run(source, &secrets, prefs.as_ref(), &config).await
        }
        Command::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config, &toml_prefs),
            ConfigAction::Set { key, value } => {
                commands::config::set(prefs.as_ref(), &key, &value)
            }
            ConfigAction::Unset { key } => commands::config::unset(prefs.as_ref(), &key),
            ConfigAction::Path => commands::config::path(&toml_prefs),
        },
        Command::Auth { action } => match action {
            AuthAction::SetToken { token } => {
                commands::auth::set_token(&secrets, prefs.as_ref(), token)
            }
            AuthAction::SetMattermostToken { token } => {
                commands::auth::set_mattermost_token(&secrets, token)
            }
            AuthAction::Clear => commands::auth::clear(&secrets, prefs.as_ref()),
        },
    }
}
