use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use lendrate::core::log::init_logging;

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

impl From<Commands> for lendrate::AppCommand {
    fn from(cmd: Commands) -> lendrate::AppCommand {
        match cmd {
            Commands::List { page } => lendrate::AppCommand::List {
                page: page.saturating_sub(1),
            },
            Commands::Rate { symbols } => lendrate::AppCommand::Rate { symbols },
            Commands::History { symbols } => lendrate::AppCommand::History { symbols },
            Commands::Chat => lendrate::AppCommand::Chat,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List all pairs ranked by current lending rate
    List {
        /// Page to show, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Show current and estimated rates for tickers
    Rate {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Show recent rate history and today's average for tickers
    History {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Browse rates through the interactive menu
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => lendrate::cli::setup::setup(),
        Some(cmd) => lendrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
