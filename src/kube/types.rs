//! Kube types: location ids, geometry, cache state and errors.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Literal prefix every location group id carries (`kube1`, `kube40`).
pub const LOCATION_ID_PREFIX: &str = "kube";

// =============================================================================
// LOCATION ID
// =============================================================================

/// Identifier of a physical location, e.g. `kube12`.
///
/// Ordering is by numeric suffix (`kube2 < kube10`). Ids whose suffix is not a
/// positive integer sort after every numeric id, lexicographically among
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric suffix after the `kube` prefix, if it is a positive integer.
    #[must_use]
    pub fn ordinal(&self) -> Option<u64> {
        let suffix = self.0.strip_prefix(LOCATION_ID_PREFIX)?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse::<u64>().ok().filter(|n| *n > 0)
    }
}

impl Ord for LocationId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.ordinal(), other.ordinal()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for LocationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for LocationId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl PartialEq<str> for LocationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LocationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Axis-aligned rectangle in document coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Geometry of one physical location: outer frame, inner interactive area,
/// and the inner element's style class (opaque, passed through to renderers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGeometry {
    pub outer: Rectangle,
    pub inner: Rectangle,
    pub inner_style_class: String,
}

/// Location id → geometry. Iteration order is display order.
pub type LocationMap = BTreeMap<LocationId, LocationGeometry>;

// =============================================================================
// CACHE STATE
// =============================================================================

/// Why the in-memory location map is (or is not) trustworthy without refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheState {
    /// No fetch has resolved yet (or a forced reload is in progress).
    #[default]
    Unknown,
    /// Map populated from a successful parse with at least one location.
    Valid,
    /// Document exists but describes zero locations.
    InvalidEmpty,
    /// Document does not exist on the backend.
    InvalidNotFound,
}

impl CacheState {
    /// True when a non-forced load can answer without a network fetch.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
            Self::InvalidEmpty => "invalidEmpty",
            Self::InvalidNotFound => "invalidNotFound",
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verb family for writing the floor-plan document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteVerb {
    /// First write: the document does not exist yet (`POST`).
    Create,
    /// Replace an existing document (`PUT`).
    Overwrite,
}

impl WriteVerb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Overwrite => "overwrite",
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Outcome of a parse that did not yield any locations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The document parsed but contains no qualifying location groups.
    #[error("floor plan contains no locations")]
    Empty,

    /// The document is not well-formed markup.
    #[error("floor plan is not valid markup: {0}")]
    Malformed(String),
}

impl ErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_EMPTY",
            Self::Malformed(_) => "E_MALFORMED",
        }
    }
}

/// Failure reading or writing the floor-plan resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend has no floor-plan document (HTTP 404).
    #[error("floor plan not found")]
    NotFound,

    /// Network failure or any non-success status other than 404.
    #[error("floor plan request failed: {0}")]
    Transport(String),
}

impl ErrorCode for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_NOT_FOUND",
            Self::Transport(_) => "E_TRANSPORT",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Errors surfaced by [`super::cache::LocationCache`].
///
/// `NotFound` and `Empty` are not errors at this level; they resolve the cache
/// into an invalid state and read as "no data".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("floor plan request failed: {0}")]
    Transport(String),

    #[error("floor plan is not valid markup: {0}")]
    Malformed(String),
}

impl ErrorCode for LocationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Malformed(_) => "E_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
