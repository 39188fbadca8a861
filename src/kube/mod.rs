//! Kube: physical locations parsed from the uploaded floor plan.
//!
//! ARCHITECTURE
//! ============
//! `source` fetches the SVG, `geometry` turns it into a [`LocationMap`],
//! `cache` holds the result plus a [`CacheState`] and answers lookups, and
//! `reconcile` cross-references location ids against shelf records.

pub mod cache;
pub mod geometry;
pub mod reconcile;
pub mod source;
pub mod types;

pub use cache::{LoadResult, LocationCache};
pub use source::{HttpLocationSource, LocationSource, choose_write_verb};
pub use types::{
    CacheState, FetchError, LocationError, LocationGeometry, LocationId, LocationMap, ParseError, Rectangle, WriteVerb,
};
