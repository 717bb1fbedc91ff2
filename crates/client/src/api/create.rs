//! Quick-create submissions.
//!
//! Each payload type maps to one backend collection endpoint. Optional
//! fields are omitted from the JSON when unset. Creates are not idempotent:
//! sending the same payload twice creates two records.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::instrument;

use crate::error::ApiError;
use crate::executor::{ApiClient, ApiRequest, ResponseBody};

/// A payload that creates one record at a fixed endpoint.
pub trait CreateRequest: Serialize + DeserializeOwned + Send + Sync {
    /// Collection endpoint the payload is POSTed to.
    const PATH: &'static str;
}

macro_rules! create_request {
    ($name:ident => $path:literal) => {
        impl CreateRequest for $name {
            const PATH: &'static str = $path;
        }
    };
}

// =============================================================================
// SEO
// =============================================================================

/// Keyword cluster for a search intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordCluster {
    pub intent: String,
    /// Comma-separated terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}
create_request!(KeywordCluster => "/api/seo/keywords/");

/// Directory listing submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Directory {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
create_request!(Directory => "/api/seo/directories/");

/// Tracked content URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentItem {
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}
create_request!(ContentItem => "/api/seo/content/");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}
create_request!(Faq => "/api/seo/faqs/");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Backlink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}
create_request!(Backlink => "/api/seo/backlinks/");

// =============================================================================
// Analytics & translation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsSite {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
}
create_request!(AnalyticsSite => "/api/analytics/sites/");

/// Translation job. The backend answers synchronously with the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Translation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,
}
create_request!(Translation => "/api/translate/");

// =============================================================================
// Social & email
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialPost {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}
create_request!(SocialPost => "/api/social/posts/");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailList {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lawful_basis: Option<String>,
}
create_request!(EmailList => "/api/email/lists/");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
}
create_request!(EmailTemplate => "/api/email/templates/");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailFlow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
create_request!(EmailFlow => "/api/email/flows/");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailContact {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
create_request!(EmailContact => "/api/email/contacts/");

// =============================================================================
// App stores & marketplace
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AsoApp {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}
create_request!(AsoApp => "/api/aso/apps/");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketplaceProduct {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
create_request!(MarketplaceProduct => "/api/marketplace/products/");

impl ApiClient {
    /// Create one record and return the backend's JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message on rejection,
    /// or `ApiError::UnexpectedBody` if the backend does not answer with JSON.
    #[instrument(skip(self, payload), fields(path = T::PATH))]
    pub async fn create<T: CreateRequest>(&self, payload: &T) -> Result<Value, ApiError> {
        let body = serde_json::to_value(payload)?;
        self.request_json(ApiRequest::post(T::PATH).json(body)).await
    }

    /// POST an arbitrary JSON payload to any endpoint (relative or absolute).
    ///
    /// Used for feature endpoints discovered at runtime from the feature index.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message on rejection.
    #[instrument(skip(self, payload))]
    pub async fn post_feature_data(
        &self,
        endpoint: &str,
        payload: Value,
    ) -> Result<ResponseBody, ApiError> {
        self.request(ApiRequest::post(endpoint).json(payload)).await
    }
}
