//! Login, signup and session inspection.

use icycon_client::Session;
use icycon_core::Identifier;
use secrecy::SecretString;
use serde_json::json;

use super::{CommandError, print_json};

/// Log in and print the user's profile.
///
/// # Errors
///
/// Returns an error if the identifier is malformed or the backend rejects
/// the credentials.
pub async fn login(
    session: &Session,
    identifier: &str,
    password: SecretString,
) -> Result<(), CommandError> {
    let identifier = Identifier::parse(identifier)?;
    let user = session.login(identifier, password).await?;
    session.wait_for_refresh().await;

    tracing::info!(username = %user.username, "Logged in");
    print_json(&user)
}

/// Create an account and print the backend's confirmation.
///
/// # Errors
///
/// Returns an error if the email is malformed or the backend rejects the
/// signup.
pub async fn signup(
    session: &Session,
    email: &str,
    username: &str,
    password: SecretString,
) -> Result<(), CommandError> {
    let email = Identifier::parse(email)?;
    let response = session.signup(email, username, password).await?;
    session.wait_for_refresh().await;

    print_json(&json!({
        "email": response.email,
        "username": response.username,
        "features": response.features,
    }))
}

/// Forget the stored credentials.
pub fn logout(session: &Session) {
    session.logout();
    tracing::info!("Logged out");
}

/// Print the current user (freshly fetched when possible) and features.
///
/// # Errors
///
/// Returns `NotLoggedIn` when no credentials are stored.
pub async fn whoami(session: &Session) -> Result<(), CommandError> {
    if !session.is_authenticated() {
        return Err(CommandError::NotLoggedIn);
    }
    session.wait_for_refresh().await;

    print_json(&json!({
        "user": session.user(),
        "features": session.features(),
    }))
}

/// Print the feature index for the current user.
///
/// # Errors
///
/// Returns an error if the feature index cannot be fetched.
pub async fn features(session: &Session) -> Result<(), CommandError> {
    let list = session.client().fetch_features().await?;
    print_json(&list)
}
