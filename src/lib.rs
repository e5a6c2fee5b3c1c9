pub mod api;
pub mod cli;
pub mod core;

use anyhow::Result;
use tracing::{debug, info};

use crate::api::{ApiClient, token};
use crate::cli::assets::AssetCommand;
use crate::cli::banks::BankCommand;
use crate::cli::cards::CardCommand;
use crate::cli::savings::SavingCommand;
use crate::cli::users::UserCommand;
use crate::core::analytics::TimeRange;
use crate::core::config::AppConfig;

/// Application-level commands, decoupled from the clap surface so the
/// dispatch can be driven from tests.
pub enum AppCommand {
    Dashboard { range: TimeRange, watch: bool },
    Assets(AssetCommand),
    Banks(BankCommand),
    Savings(SavingCommand),
    Cards(CardCommand),
    Users(UserCommand),
    Login { name: String, password: String },
    Register {
        name: String,
        password: String,
        age: Option<u32>,
        place: Option<String>,
    },
    Logout,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Finance tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Dashboard { range, watch } => {
            cli::dashboard::run(&config, range, watch).await
        }
        AppCommand::Assets(cmd) => {
            cli::assets::run(&authed_client(&config)?, cmd, &config.currency).await
        }
        AppCommand::Banks(cmd) => {
            cli::banks::run(&authed_client(&config)?, cmd, &config.currency).await
        }
        AppCommand::Savings(cmd) => {
            cli::savings::run(&authed_client(&config)?, cmd, &config.currency).await
        }
        AppCommand::Cards(cmd) => {
            cli::cards::run(&authed_client(&config)?, cmd, &config.currency).await
        }
        AppCommand::Users(cmd) => cli::users::run(&authed_client(&config)?, cmd).await,
        AppCommand::Login { name, password } => cli::auth::login(&config, &name, &password).await,
        AppCommand::Register {
            name,
            password,
            age,
            place,
        } => cli::auth::register(&config, &name, &password, age, place).await,
        AppCommand::Logout => cli::auth::logout(&config),
    }
}

/// Builds a client carrying whatever token a previous login stored.
fn authed_client(config: &AppConfig) -> Result<ApiClient> {
    let stored_token = token::load(&config.token_path()?)?;
    ApiClient::new(&config.base_url, stored_token)
}
