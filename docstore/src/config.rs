use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Empty project id")]
    EmptyProjectId,

    #[error("Store base URL must be http(s): {0}")]
    UnsupportedScheme(String),
}

/// Connection parameters for the managed document store.
///
/// Consumed once at process start; see [`crate::connect`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Project identifier the store is addressed by
    pub project_id: String,
    /// Base URL of the store's REST endpoint
    ///
    /// Note: Uses the `url::Url` type for compile-time URL validation.
    /// Invalid URLs will be rejected during config deserialization.
    pub base_url: Url,
    /// Optional API key, sent as a bearer token when present
    pub api_key: Option<String>,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_id.is_empty() {
            return Err(ValidationError::EmptyProjectId);
        }

        match self.base_url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::UnsupportedScheme(other.to_string())),
        }
    }
}
