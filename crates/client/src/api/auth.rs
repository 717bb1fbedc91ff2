//! Login and signup.
//!
//! Both calls skip the stored credentials: they are how credentials are
//! obtained in the first place.

use icycon_core::{Feature, Identifier, Profile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;
use crate::executor::{ApiClient, ApiRequest};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Signup endpoint.
pub const SIGNUP_PATH: &str = "/api/auth/signup";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
    password_confirm: &'a str,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub user: Profile,
    /// Features advertised alongside the login, if the backend sends them.
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// Successful signup. The backend does not return a full profile here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl ApiClient {
    /// Verify credentials with the backend.
    ///
    /// The identifier is sent in the `email` field, which is what the
    /// backend's login serializer reads.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message when the
    /// credentials are rejected.
    #[instrument(skip(self, password), fields(identifier = %identifier))]
    pub async fn login(
        &self,
        identifier: &Identifier,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            email: identifier.as_str(),
            password: password.expose_secret(),
        })?;

        self.request_json(ApiRequest::post(LOGIN_PATH).json(body).skip_auth()).await
    }

    /// Create an account. `password_confirm` is always sent equal to
    /// `password`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's validation message when
    /// the signup is rejected (e.g. duplicate email, short password).
    #[instrument(skip(self, password), fields(email = %email, username = %username))]
    pub async fn signup(
        &self,
        email: &Identifier,
        username: &str,
        password: &SecretString,
    ) -> Result<SignupResponse, ApiError> {
        let body = serde_json::to_value(SignupRequest {
            email: email.as_str(),
            username,
            password: password.expose_secret(),
            password_confirm: password.expose_secret(),
        })?;

        self.request_json(ApiRequest::post(SIGNUP_PATH).json(body).skip_auth()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_without_features() {
        let json = r#"{"email": "a@b.com", "user": {"id": 1, "email": "a@b.com", "username": "ab", "avatar": null}}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.username, "ab");
        assert!(response.features.is_empty());
    }

    #[test]
    fn test_signup_request_confirms_password() {
        let body = serde_json::to_value(SignupRequest {
            email: "a@b.com",
            username: "ab",
            password: "pw123456",
            password_confirm: "pw123456",
        })
        .unwrap();
        assert_eq!(body["password_confirm"], body["password"]);
    }
}
