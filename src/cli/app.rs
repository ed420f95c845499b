//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::session::Session;
use super::{inventory, item, search, stats};
use crate::catalog::DEFAULT_SEARCH_LIMIT;
use crate::storage::{Config, Workspace};

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Inventory catalog with custom item IDs and optimistic locking")]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Act as this user
    #[arg(long = "as", global = true, env = "STOCKROOM_USER", value_name = "USER")]
    pub as_user: Option<String>,

    /// Act with admin rights
    #[arg(long, global = true)]
    pub admin: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stockroom workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage inventories
    #[command(subcommand)]
    Inventory(inventory::InventoryCommands),

    /// Manage items
    #[command(subcommand)]
    Item(item::ItemCommands),

    /// Search inventories and items by title or custom ID
    Search {
        /// Text to look for (case-insensitive substring)
        query: String,

        /// Only search the items of this inventory
        #[arg(long)]
        inventory: Option<String>,

        /// Maximum hits per kind
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Show field statistics of an inventory, or of all your inventories
    Stats {
        /// Inventory ID (omit for an overview of the inventories you own)
        inventory: Option<String>,
    },
}

/// Installs the stderr log subscriber
///
/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_logging(verbose: bool, configured: &str) {
    let fallback = if verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    init_logging(cli.verbose, &config.project.log.level);

    let format = cli.format.unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format);

    tracing::debug!(root = ?config.project_root, "stockroom starting");

    match cli.command {
        Commands::Init { path } => {
            let workspace = Workspace::init(&path)?;
            output.success(&format!(
                "Initialized stockroom workspace at {}",
                workspace.root().display()
            ));
        }

        Commands::Inventory(cmd) => {
            let session = Session::open(cli.as_user.as_deref(), cli.admin)?;
            inventory::run(cmd, &output, &session)?
        }
        Commands::Item(cmd) => {
            let session = Session::open(cli.as_user.as_deref(), cli.admin)?;
            item::run(cmd, &output, &session)?
        }
        Commands::Search {
            query,
            inventory,
            limit,
        } => {
            let session = Session::open(cli.as_user.as_deref(), cli.admin)?;
            search::run(&output, &session, &query, inventory.as_deref(), limit)?
        }
        Commands::Stats { inventory } => {
            let session = Session::open(cli.as_user.as_deref(), cli.admin)?;
            match inventory {
                Some(inventory) => stats::run(&output, &session, &inventory)?,
                None => stats::overview(&output, &session)?,
            }
        }
    }

    Ok(())
}
