use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use quotebox::{
    config::Config,
    constants::{version::get_version, EXPORT_FILE_NAME},
    telemetry, ImportMode,
};

mod commands;
mod init;

const AFTER_HELP: &str = "\
EXAMPLES:
    Show a random quote:
        $ quotebox show

    Add a quote:
        $ quotebox add \"Do or do not. There is no try.\" Motivation

    Run a quote server and sync against it:
        $ quotebox serve --port 3000
        $ QUOTEBOX_REMOTE_URL=http://localhost:3000 quotebox sync

CONFIGURATION:
    Settings are read from the environment and from a .env file.
    Common ones: QUOTEBOX_DATABASE_URL, QUOTEBOX_REMOTE_URL,
    QUOTEBOX_SYNC_STRATEGY (remote-wins | last-write-wins).";

#[derive(Parser)]
#[command(name = "quotebox")]
#[command(about = "A random quote generator with local storage and remote sync")]
#[command(after_help = AFTER_HELP)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommands),

    /// Run a quote server that other instances can sync against
    Serve {
        /// Port to listen on, defaults to QUOTEBOX_SERVER_PORT or 3000
        #[arg(long, short)]
        port: Option<u16>,
    },
}

/// commands that work on the local quote store.
#[derive(Subcommand)]
enum StoreCommands {
    /// Show a random quote
    Show {
        /// Only draw from this category, and remember it for next time
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Add a new quote
    Add {
        /// The quote text
        text: String,
        /// The quote category
        category: String,
    },

    /// List stored quotes
    List {
        /// Only list quotes in this category
        #[arg(long, short, default_value = "all")]
        category: String,
    },

    /// List the known categories
    Categories,

    /// Write all quotes to a JSON file
    Export {
        /// Destination file
        #[arg(long, short, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },

    /// Load quotes from a JSON file, replacing the current ones
    Import {
        /// File produced by `quotebox export`
        file: PathBuf,
        /// Add the imported quotes to the existing ones instead of replacing them
        #[arg(long)]
        append: bool,
    },

    /// Fetch quotes from the remote source and merge them in
    Sync,

    /// Send all quotes to the remote source
    Push,

    /// Keep syncing with the remote source until interrupted
    Watch,

    /// Interactive session reading commands from stdin
    Session,

    /// Display the store status
    Status,
}

async fn run_store_command(command: StoreCommands, config: &Config) -> anyhow::Result<()> {
    let store = init::init_store(config).await?;

    let result = match command {
        StoreCommands::Show { category } => commands::quote::show(&store, category).await,
        StoreCommands::Add { text, category } => {
            commands::quote::add(&store, &text, &category).await
        }
        StoreCommands::List { category } => commands::quote::list(&store, &category).await,
        StoreCommands::Categories => commands::quote::categories(&store).await,
        StoreCommands::Export { output } => commands::transfer::export(&store, &output).await,
        StoreCommands::Import { file, append } => {
            let mode = if append {
                ImportMode::Append
            } else {
                ImportMode::Replace
            };
            commands::transfer::import(&store, &file, mode).await
        }
        StoreCommands::Sync => commands::sync::sync(&store).await,
        StoreCommands::Push => commands::sync::push(&store).await,
        StoreCommands::Watch => commands::sync::watch(&store, config).await,
        StoreCommands::Session => commands::session::run(&store, config).await,
        StoreCommands::Status => commands::status::run(&store, config).await,
    };

    store.wait_for_pushes().await;

    result
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Store(command) => run_store_command(command, &config).await,
        Commands::Serve { port } => {
            commands::serve::run(port.unwrap_or(config.server_port)).await
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let matches = Cli::command().version(get_version()).get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let telemetry_guard = match telemetry::init_telemetry() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!(err = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    drop(telemetry_guard);
    std::process::exit(code);
}
