//! Roundtable CLI — the main entry point.
//!
//! Commands:
//! - `session`    — Talk to the document preprocessor, turn by turn
//! - `preprocess` — Upload documents directly, one outcome line each
//! - `extract`    — Print the paths in a `<FilePath>` block read from stdin
//! - `config`     — Show, locate, validate, or initialize configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "roundtable",
    about = "Roundtable — turn-taking workers that preprocess the documents you name",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (you + the document preprocessor)
    Session {
        /// Stop after this many turns
        #[arg(long)]
        max_turns: Option<usize>,

        /// Ask before each upload
        #[arg(long)]
        confirm: bool,
    },

    /// Upload documents to the preprocessing service
    Preprocess {
        /// Local paths of the documents
        #[arg(required = true)]
        paths: Vec<String>,

        /// Ask before each upload
        #[arg(long)]
        confirm: bool,
    },

    /// Read text from stdin and print the paths in its <FilePath> block
    Extract,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Check the configuration for errors
    Validate,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Session { max_turns, confirm } => {
            commands::session::run(max_turns, confirm).await?
        }
        Commands::Preprocess { paths, confirm } => {
            commands::preprocess::run(paths, confirm).await?
        }
        Commands::Extract => commands::extract::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
        },
    }

    Ok(())
}
