//! Feature descriptors advertised by the backend.

use serde::{Deserialize, Serialize};

/// A backend capability the current user can reach.
///
/// The client treats descriptors as opaque; they are only listed and passed
/// back to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Absolute endpoint URL. May contain placeholders such as `{id}`.
    #[serde(default)]
    pub endpoint: String,
}

/// Response body of the feature index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureList {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureList {
    /// Look up a feature by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.key == key)
    }
}
