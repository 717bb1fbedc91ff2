//! Current-user profile endpoint.

use icycon_core::{Profile, ProfileUpdate};
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use crate::error::ApiError;
use crate::executor::{ApiClient, ApiRequest};

/// Profile fetch/update endpoint.
pub const PROFILE_PATH: &str = "/api/profile/dashboard";

impl ApiClient {
    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` (usually 401/403) when not authenticated.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        self.request_json(ApiRequest::get(PROFILE_PATH)).await
    }

    /// Apply a partial update and return the updated profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` carrying the backend's validation errors.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let body = serde_json::to_value(update)?;
        self.request_json(ApiRequest::patch(PROFILE_PATH).json(body)).await
    }

    /// Upload a new avatar image as multipart field `avatar`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` when the backend rejects the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Profile, ApiError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("avatar", part);
        self.request_json(ApiRequest::patch(PROFILE_PATH).multipart(form)).await
    }
}
