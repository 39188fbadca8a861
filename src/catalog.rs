//! Shelf catalog: read-only view of shelf records from the catalog backend.
//!
//! The catalog owns shelves; this crate only needs their id and assigned
//! location to work out which kubes are occupied.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::KubeConfig;
use crate::error::ErrorCode;
use crate::kube::LocationId;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("shelf request failed: {0}")]
    Request(String),

    #[error("shelf request returned status {0}")]
    Status(u16),

    #[error("shelf list could not be decoded: {0}")]
    Decode(String),
}

impl ErrorCode for CatalogError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_CATALOG_REQUEST",
            Self::Status(_) => "E_CATALOG_STATUS",
            Self::Decode(_) => "E_CATALOG_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status(429 | 500..=599))
    }
}

/// A shelf as served by the catalog. Only the fields this crate reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<LocationId>,
}

impl ShelfRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, location: Option<&str>) -> Self {
        Self { id: id.into(), name: None, location: location.map(LocationId::from) }
    }

    /// Name for display, falling back to the id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<LocationId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(LocationId::from))
}

// =============================================================================
// CATALOG SOURCE
// =============================================================================

/// Supplier of the current shelf list.
#[async_trait::async_trait]
pub trait ShelfCatalog: Send + Sync {
    async fn list_shelves(&self) -> Result<Vec<ShelfRecord>, CatalogError>;
}

pub struct HttpShelfCatalog {
    http: reqwest::Client,
    url: String,
}

impl HttpShelfCatalog {
    /// # Errors
    ///
    /// Returns [`CatalogError::Request`] if the HTTP client cannot be built.
    pub fn new(config: &KubeConfig) -> Result<Self, CatalogError> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| CatalogError::Request(e.to_string()))?;
        Ok(Self { http, url: config.shelves_url() })
    }
}

#[async_trait::async_trait]
impl ShelfCatalog for HttpShelfCatalog {
    async fn list_shelves(&self) -> Result<Vec<ShelfRecord>, CatalogError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CatalogError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let text = response.text().await.map_err(|e| CatalogError::Request(e.to_string()))?;
        parse_shelves(&text)
    }
}

/// Decode a shelf list body.
///
/// # Errors
///
/// Returns [`CatalogError::Decode`] when the body is not a JSON array of shelves.
pub fn parse_shelves(body: &str) -> Result<Vec<ShelfRecord>, CatalogError> {
    serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
