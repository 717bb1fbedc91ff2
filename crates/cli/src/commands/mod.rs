//! Subcommand implementations.

pub mod auth;
pub mod create;
pub mod profile;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the CLI before or after talking to the backend.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Login name failed validation.
    #[error("Invalid identifier: {0}")]
    Identifier(#[from] icycon_core::IdentifierError),

    /// A `--field` argument was not `key=value` or `key:=json`.
    #[error("Invalid field {0:?}, expected key=value or key:=json")]
    InvalidField(String),

    /// The command needs a logged-in user.
    #[error("Not logged in, run `icycon login` first")]
    NotLoggedIn,

    /// Profile update with no fields set.
    #[error("Nothing to update, pass at least one field")]
    EmptyUpdate,

    /// Payload did not fit the chosen record kind, or was not valid JSON.
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] icycon_client::ApiError),

    /// Local file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Print a value to stdout as pretty JSON.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
