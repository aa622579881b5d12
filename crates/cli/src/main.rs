//! Trekbase CLI - migration and back office management tools.
//!
//! # Usage
//!
//! ```bash
//! # Copy the admin panel's trips into the remote store
//! tb-cli migrate run
//!
//! # Same, but fail if any single trip failed
//! tb-cli migrate run --strict
//!
//! # Delete every remote trip / compare counts
//! tb-cli migrate clear
//! tb-cli migrate verify
//!
//! # Grant, revoke or show the admin flag
//! tb-cli admin grant
//! tb-cli admin status
//!
//! # Dump a mirror collection
//! tb-cli trips list --collection customerReviews
//! ```
//!
//! # Commands
//!
//! - `migrate` - Local-to-remote trip migration
//! - `admin` - Admin flag in the local mirror
//! - `trips` - Inspect mirror collections

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use trekbase_admin::mirror::keys;

mod commands;

#[derive(Parser)]
#[command(name = "tb-cli")]
#[command(author, version, about = "Trekbase CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate local trips into the remote store
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Manage the admin flag
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Inspect mirror collections
    Trips {
        #[command(subcommand)]
        action: TripsAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Replace the remote trips with the local ones
    Run {
        /// Report failure if any trip failed to migrate
        #[arg(long)]
        strict: bool,
    },
    /// Delete every remote trip
    Clear,
    /// Compare local and remote trip counts
    Verify,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Set the admin flag
    Grant,
    /// Clear the admin flag
    Revoke,
    /// Show the resolved admin status
    Status,
}

#[derive(Subcommand)]
enum TripsAction {
    /// Print a collection as JSON
    List {
        /// Mirror key of the collection
        #[arg(short, long, default_value = keys::ADMIN_TRIPS)]
        collection: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { action } => match action {
            MigrateAction::Run { strict } => commands::migrate::run(strict).await?,
            MigrateAction::Clear => commands::migrate::clear().await?,
            MigrateAction::Verify => commands::migrate::verify().await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant => commands::admin::set_flag(true).await?,
            AdminAction::Revoke => commands::admin::set_flag(false).await?,
            AdminAction::Status => commands::admin::status().await?,
        },
        Commands::Trips { action } => match action {
            TripsAction::List { collection } => commands::trips::list(&collection).await?,
        },
    }
    Ok(())
}
