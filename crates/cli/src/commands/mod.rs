//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod trips;

use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use trekbase_admin::config::{self, ConfigError};
use trekbase_admin::mirror::{LocalMirror, MirrorError};
use trekbase_admin::remote::RemoteError;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The command ran but its outcome is a failure.
    #[error("{0}")]
    Failed(String),
}

/// Open the file-backed mirror under `TREKBASE_DATA_DIR`.
async fn open_mirror() -> Result<LocalMirror, CommandError> {
    dotenvy::dotenv().ok();
    let path = config::data_dir_from_env().join(config::MIRROR_FILE_NAME);
    Ok(LocalMirror::open(path).await?)
}

/// Write `value` to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
