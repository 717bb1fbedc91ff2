//! Profile edits.

use std::path::Path;

use icycon_client::Session;
use icycon_core::ProfileUpdate;

use super::{CommandError, print_json};

/// Apply a partial profile update and print the result.
///
/// # Errors
///
/// Returns `EmptyUpdate` when no field is set, or the backend's error.
pub async fn update(session: &Session, update: &ProfileUpdate) -> Result<(), CommandError> {
    if update.is_empty() {
        return Err(CommandError::EmptyUpdate);
    }
    let profile = session.update_profile(update).await?;
    print_json(&profile)
}

/// Upload an avatar from a local file and print the resulting profile.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the upload is rejected.
pub async fn avatar(session: &Session, file: &Path) -> Result<(), CommandError> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|source| CommandError::Io {
            path: file.display().to_string(),
            source,
        })?;

    let file_name = file
        .file_name()
        .map_or_else(|| "avatar".to_string(), |n| n.to_string_lossy().into_owned());

    tracing::info!(file = %file_name, size = bytes.len(), "Uploading avatar");
    let profile = session.upload_avatar(&file_name, bytes).await?;
    print_json(&profile)
}
