use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pft::cli::assets::AssetCommand;
use pft::cli::banks::BankCommand;
use pft::cli::cards::CardCommand;
use pft::cli::savings::SavingCommand;
use pft::cli::users::UserCommand;
use pft::core::analytics::TimeRange;
use pft::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the financial dashboard
    Dashboard {
        /// Time range: 7d, 30d, 90d, 6m or 1y
        #[arg(short, long, default_value = "30d")]
        range: TimeRange,
        /// Stay open and re-render on demand
        #[arg(short, long)]
        watch: bool,
    },
    /// Manage assets
    Assets {
        #[command(subcommand)]
        command: AssetCommand,
    },
    /// Manage bank accounts
    Banks {
        #[command(subcommand)]
        command: BankCommand,
    },
    /// Manage savings accounts
    Savings {
        #[command(subcommand)]
        command: SavingCommand,
    },
    /// Manage credit cards
    Cards {
        #[command(subcommand)]
        command: CardCommand,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Log in and store the session token
    Login {
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        place: Option<String>,
    },
    /// Forget the stored session token
    Logout,
}

impl From<Commands> for pft::AppCommand {
    fn from(cmd: Commands) -> pft::AppCommand {
        match cmd {
            Commands::Dashboard { range, watch } => pft::AppCommand::Dashboard { range, watch },
            Commands::Assets { command } => pft::AppCommand::Assets(command),
            Commands::Banks { command } => pft::AppCommand::Banks(command),
            Commands::Savings { command } => pft::AppCommand::Savings(command),
            Commands::Cards { command } => pft::AppCommand::Cards(command),
            Commands::Users { command } => pft::AppCommand::Users(command),
            Commands::Login { name, password } => pft::AppCommand::Login { name, password },
            Commands::Register {
                name,
                password,
                age,
                place,
            } => pft::AppCommand::Register {
                name,
                password,
                age,
                place,
            },
            Commands::Logout => pft::AppCommand::Logout,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => pft::cli::setup::setup_at_path(path),
            None => pft::cli::setup::setup(),
        },
        Some(cmd) => pft::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
