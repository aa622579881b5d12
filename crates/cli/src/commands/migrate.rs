//! Local-to-remote trip migration commands.
//!
//! # Usage
//!
//! ```bash
//! tb-cli migrate run [--strict]
//! tb-cli migrate clear
//! tb-cli migrate verify
//! ```
//!
//! # Environment Variables
//!
//! - `REMOTE_STORE_URL` / `REMOTE_STORE_KEY` - Remote store connection
//! - `TREKBASE_DATA_DIR` - Directory holding the local mirror
//! - `REMOTE_TRIPS_TABLE`, `MIGRATION_DELAY_MS` - See the admin configuration

use std::sync::Arc;

use trekbase_admin::config::AdminConfig;
use trekbase_admin::migration::Migrator;
use trekbase_admin::mirror::{Collection, LocalMirror, keys};
use trekbase_admin::remote::RestRemoteStore;
use trekbase_core::SuccessPolicy;

use super::{CommandError, print_json};

async fn migrator(strict: bool) -> Result<Migrator, CommandError> {
    let config = AdminConfig::from_env()?;
    let mirror = LocalMirror::open(config.mirror_path()).await?;
    let remote = RestRemoteStore::new(&config.remote)?;

    let mut options = config.migration_options();
    if strict {
        options.success_policy = SuccessPolicy::NoErrors;
    }

    tracing::info!(table = %options.table, url = %config.remote.url, "Connected to remote store");
    Ok(Migrator::new(
        Arc::new(remote),
        Collection::new(mirror, keys::ADMIN_TRIPS),
        options,
    ))
}

/// Migrate every local trip, printing the result.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the run is not a success.
pub async fn run(strict: bool) -> Result<(), CommandError> {
    let result = migrator(strict).await?.migrate().await;
    print_json(&result)?;

    for error in &result.errors {
        tracing::warn!("{error}");
    }

    if result.success {
        tracing::info!("Migration complete: {} trips migrated", result.migrated);
        Ok(())
    } else {
        Err(CommandError::Failed(format!(
            "migration failed: {} migrated, {} errors",
            result.migrated,
            result.errors.len()
        )))
    }
}

/// Delete every remote trip.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the delete fails.
pub async fn clear() -> Result<(), CommandError> {
    let outcome = migrator(false).await?.clear_remote().await;
    print_json(&outcome)?;

    if outcome.success {
        Ok(())
    } else {
        Err(CommandError::Failed(outcome.message))
    }
}

/// Compare local and remote trip counts.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the counts differ.
pub async fn verify() -> Result<(), CommandError> {
    let report = migrator(false).await?.verify().await;
    print_json(&report)?;
    tracing::info!("{}", report.note);

    if report.matches {
        Ok(())
    } else {
        Err(CommandError::Failed(format!(
            "counts differ: {} local, {} remote",
            report.local_count,
            report
                .remote_count
                .map_or_else(|| "unknown".to_owned(), |n| n.to_string())
        )))
    }
}
