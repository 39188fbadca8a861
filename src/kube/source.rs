//! Floor-plan source: reads and writes the remote SVG document.
//!
//! DESIGN
//! ======
//! [`LocationSource`] is the seam between the cache and the network so the
//! cache state machine can be driven by a scripted source in tests. The HTTP
//! implementation distinguishes 404 (`NotFound`) from every other failure
//! (`Transport`) because the two drive different cache states.
//!
//! Writes pick `POST` for a first upload and `PUT` for a replacement; see
//! [`choose_write_verb`].

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;

use super::types::{CacheState, FetchError, WriteVerb};
use crate::config::KubeConfig;

/// Remote home of the floor-plan document.
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    /// Read the current floor-plan document as raw text.
    async fn fetch(&self) -> Result<String, FetchError>;

    /// Write a full replacement document with the given verb.
    async fn replace(&self, document: &str, verb: WriteVerb) -> Result<(), FetchError>;

    /// Delete the floor-plan document. Deleting an absent document succeeds.
    async fn remove(&self) -> Result<(), FetchError>;
}

/// Pick the write verb from the cache state alone: a document known to be
/// absent is created, anything else is overwritten.
#[must_use]
pub fn choose_write_verb(state: CacheState) -> WriteVerb {
    match state {
        CacheState::InvalidNotFound => WriteVerb::Create,
        CacheState::Unknown | CacheState::Valid | CacheState::InvalidEmpty => WriteVerb::Overwrite,
    }
}

// =============================================================================
// HTTP SOURCE
// =============================================================================

/// JSON envelope returned by the write endpoint.
#[derive(Debug, Default, Deserialize)]
struct WriteEnvelope {
    success: Option<bool>,
    message: Option<String>,
    error: Option<String>,
}

/// [`LocationSource`] backed by the catalog's REST API.
pub struct HttpLocationSource {
    http: reqwest::Client,
    url: String,
}

impl HttpLocationSource {
    /// Build a source for the floor-plan endpoint described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &KubeConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| FetchError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self { http, url: config.floorplan_url() })
    }

    /// Endpoint this source reads and writes.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl LocationSource for HttpLocationSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self.http.get(&self.url).send().await.map_err(transport)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(status_error("fetch", status));
        }
        response.text().await.map_err(transport)
    }

    async fn replace(&self, document: &str, verb: WriteVerb) -> Result<(), FetchError> {
        let method = match verb {
            WriteVerb::Create => Method::POST,
            WriteVerb::Overwrite => Method::PUT,
        };
        let response = self
            .http
            .request(method, &self.url)
            .header(reqwest::header::CONTENT_TYPE, "image/svg+xml")
            .body(document.to_owned())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(write_rejected(status, &body));
        }
        check_envelope(&body)
    }

    async fn remove(&self) -> Result<(), FetchError> {
        let response = self.http.delete(&self.url).send().await.map_err(transport)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::info!(url = %self.url, "floor plan already absent");
            return Ok(());
        }
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(write_rejected(status, &body));
        }
        check_envelope(&body)
    }
}

fn transport(err: reqwest::Error) -> FetchError {
    FetchError::Transport(err.to_string())
}

fn status_error(op: &str, status: StatusCode) -> FetchError {
    FetchError::Transport(format!("{op} failed: {status}"))
}

/// Non-2xx write: prefer the server's own explanation when it sent one.
fn write_rejected(status: StatusCode, body: &str) -> FetchError {
    match serde_json::from_str::<WriteEnvelope>(body) {
        Ok(env) => match env.error.or(env.message) {
            Some(reason) => FetchError::Transport(format!("write failed: {status}: {reason}")),
            None => status_error("write", status),
        },
        Err(_) => status_error("write", status),
    }
}

/// 2xx write: an explicit `{success: false}` envelope still means the write
/// was refused. Bodies that are not a JSON envelope are accepted as success.
fn check_envelope(body: &str) -> Result<(), FetchError> {
    let Ok(env) = serde_json::from_str::<WriteEnvelope>(body) else {
        return Ok(());
    };
    if env.success != Some(false) {
        return Ok(());
    }
    let reason = env.error.or(env.message).unwrap_or_else(|| "write rejected".to_owned());
    Err(FetchError::Transport(reason))
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
