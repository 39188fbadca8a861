//! Kubeshelf: floor-plan location cache for a personal library catalog.
//!
//! DESIGN
//! ======
//! The library side of the catalog UI that deals with physical storage
//! slots ("kubes"). A single [`kube::LocationCache`] is created by the
//! composition root and shared with every consumer; it loads the uploaded
//! SVG floor plan, keeps the parsed geometry, and tracks whether that data
//! can be reused. Shelf records come from the catalog backend and are
//! matched against location ids by [`kube::reconcile`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod kube;

pub use config::KubeConfig;
pub use error::ErrorCode;
