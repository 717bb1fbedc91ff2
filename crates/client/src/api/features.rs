//! Feature index and connectivity check.

use icycon_core::FeatureList;
use serde_json::Value;
use tracing::instrument;

use crate::error::ApiError;
use crate::executor::{ApiClient, ApiRequest};

/// Feature index endpoint.
pub const FEATURES_PATH: &str = "/api/features/";

impl ApiClient {
    /// List the features available to the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` when not authenticated.
    #[instrument(skip(self))]
    pub async fn fetch_features(&self) -> Result<FeatureList, ApiError> {
        self.request_json(ApiRequest::get(FEATURES_PATH)).await
    }

    /// Hit the API root without credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` when the backend is unreachable.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<Value, ApiError> {
        self.request_json(ApiRequest::get("/").skip_auth()).await
    }
}
