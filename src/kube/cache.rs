//! Location cache: the session-wide view of the current floor plan.
//!
//! DESIGN
//! ======
//! One `LocationCache` is built by the composition root and shared (via `Arc`)
//! with everything that needs location data. It owns the parsed map plus a
//! [`CacheState`] tag that alone decides whether a load may skip the network.
//!
//! State is behind a `std::sync::RwLock` so the sync accessors (`get_sync`,
//! `list_ids`, ...) never suspend. Network loads go through `fetch_gate`, an
//! async mutex held across the fetch: concurrent loads queue behind the one in
//! flight, and a waiter whose request predates a completed fetch reuses that
//! result instead of fetching again.
//!
//! INVALIDATION
//! ============
//! `force_reload` and `mark_as_deleted` bump `generation`. A fetch that was
//! already in flight when the generation changed drops its result on the
//! floor, so a plan uploaded mid-fetch is never shadowed by the older body.
//! If that leaves the state `Unknown` (a forced reload is queued), the loader
//! goes back to the gate and takes the reload's answer instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::geometry;
use super::source::{LocationSource, choose_write_verb};
use super::types::{CacheState, FetchError, LocationError, LocationGeometry, LocationId, LocationMap, ParseError};

/// `None` means "no data": the plan is absent or empty.
pub type LoadResult = Result<Option<Arc<LocationMap>>, LocationError>;

#[derive(Default)]
struct CacheInner {
    state: CacheState,
    locations: Arc<LocationMap>,
    /// Bumped by every invalidation.
    generation: u64,
    /// Bumped every time a fetch result is stored.
    epoch: u64,
    /// Whether any load (or deletion) has ever resolved the state.
    resolved_once: bool,
}

impl CacheInner {
    /// Answer for a non-forced load, or `None` when a fetch is required.
    fn resolved_answer(&self) -> Option<Option<Arc<LocationMap>>> {
        match self.state {
            CacheState::Unknown => None,
            CacheState::Valid => Some(Some(Arc::clone(&self.locations))),
            CacheState::InvalidEmpty | CacheState::InvalidNotFound => Some(None),
        }
    }

    fn resolve(&mut self, state: CacheState, locations: Arc<LocationMap>) {
        self.state = state;
        self.locations = locations;
        self.epoch += 1;
        self.resolved_once = true;
    }

    fn invalidate(&mut self, state: CacheState) {
        self.state = state;
        self.locations = Arc::default();
        self.generation += 1;
    }
}

/// Fetch outcome that resolves the cache into a state.
enum Resolution {
    Valid(Arc<LocationMap>),
    Empty,
    NotFound,
}

/// What a single fetch did to the cache.
enum Fetched {
    Stored(Option<Arc<LocationMap>>),
    /// An invalidation landed while the fetch was in flight.
    Superseded,
}

pub struct LocationCache {
    source: Arc<dyn LocationSource>,
    inner: RwLock<CacheInner>,
    fetch_gate: tokio::sync::Mutex<()>,
    /// Set once the read-before-load warning has been logged.
    warned_unloaded: AtomicBool,
}

impl LocationCache {
    #[must_use]
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self {
            source,
            inner: RwLock::new(CacheInner::default()),
            fetch_gate: tokio::sync::Mutex::new(()),
            warned_unloaded: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> CacheState {
        self.read().state
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Load the floor plan, fetching only when needed (or when `force` is set).
    ///
    /// Returns `Ok(None)` when the plan is absent or describes no locations.
    ///
    /// # Errors
    ///
    /// - [`LocationError::Transport`] when the fetch fails; the state is left
    ///   unchanged so a later load retries.
    /// - [`LocationError::Malformed`] when the body is not valid markup; also
    ///   leaves the state unchanged.
    pub async fn load(&self, force: bool) -> LoadResult {
        let mut seen_epoch = {
            let inner = self.read();
            if !force {
                if let Some(answer) = inner.resolved_answer() {
                    return Ok(answer);
                }
            }
            inner.epoch
        };

        loop {
            let _gate = self.fetch_gate.lock().await;
            {
                let inner = self.read();
                if inner.epoch != seen_epoch {
                    if let Some(answer) = inner.resolved_answer() {
                        tracing::debug!(state = %inner.state, "reusing result of concurrent fetch");
                        return Ok(answer);
                    }
                }
            }

            match self.fetch_and_store().await? {
                Fetched::Stored(answer) => return Ok(answer),
                Fetched::Superseded => {
                    let inner = self.read();
                    if let Some(answer) = inner.resolved_answer() {
                        return Ok(answer);
                    }
                    // Still unknown: a reload is queued behind us. Wait for it.
                    seen_epoch = inner.epoch;
                }
            }
        }
    }

    /// Clear the map, drop to `Unknown`, then fetch again.
    ///
    /// Until the fetch resolves, sync readers see no locations.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`]. On error the cache stays `Unknown`.
    pub async fn force_reload(&self) -> LoadResult {
        self.write().invalidate(CacheState::Unknown);
        tracing::debug!("location cache cleared for reload");
        self.load(true).await
    }

    /// Record that the plan was deleted on the backend, without refetching.
    pub fn mark_as_deleted(&self) {
        let mut inner = self.write();
        inner.invalidate(CacheState::InvalidNotFound);
        inner.resolved_once = true;
        tracing::info!("floor plan marked as deleted");
    }

    async fn fetch_and_store(&self) -> Result<Fetched, LocationError> {
        let generation = self.read().generation;

        let resolution = match self.source.fetch().await {
            Ok(text) => match geometry::parse(&text) {
                Ok(map) => Resolution::Valid(Arc::new(map)),
                Err(ParseError::Empty) => Resolution::Empty,
                Err(ParseError::Malformed(detail)) => {
                    tracing::error!(error = %detail, "floor plan is malformed");
                    return Err(LocationError::Malformed(detail));
                }
            },
            Err(FetchError::NotFound) => Resolution::NotFound,
            Err(FetchError::Transport(detail)) => {
                tracing::warn!(error = %detail, "floor plan fetch failed");
                return Err(LocationError::Transport(detail));
            }
        };

        let mut inner = self.write();
        if inner.generation != generation {
            tracing::debug!("location cache invalidated during fetch; discarding result");
            return Ok(Fetched::Superseded);
        }

        match resolution {
            Resolution::Valid(map) => {
                tracing::info!(count = map.len(), "floor plan loaded");
                inner.resolve(CacheState::Valid, Arc::clone(&map));
                Ok(Fetched::Stored(Some(map)))
            }
            Resolution::Empty => {
                tracing::info!("floor plan has no locations");
                inner.resolve(CacheState::InvalidEmpty, Arc::default());
                Ok(Fetched::Stored(None))
            }
            Resolution::NotFound => {
                tracing::info!("no floor plan uploaded");
                inner.resolve(CacheState::InvalidNotFound, Arc::default());
                Ok(Fetched::Stored(None))
            }
        }
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Upload a new floor plan and reload from the backend.
    ///
    /// The write verb follows the current state (`create` only when the plan
    /// is known to be absent).
    ///
    /// # Errors
    ///
    /// - [`LocationError::Malformed`] if `document` is not valid markup; no
    ///   request is made.
    /// - [`LocationError::Transport`] if the write or the reload fails.
    pub async fn upload(&self, document: &str) -> LoadResult {
        if let Err(ParseError::Malformed(detail)) = geometry::check_well_formed(document) {
            return Err(LocationError::Malformed(detail));
        }

        let verb = choose_write_verb(self.state());
        tracing::info!(verb = verb.as_str(), bytes = document.len(), "uploading floor plan");
        self.source.replace(document, verb).await.map_err(write_error)?;
        self.force_reload().await
    }

    /// Delete the floor plan on the backend and mark the cache accordingly.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Transport`] if the delete request fails; the
    /// cache is left untouched in that case.
    pub async fn delete(&self) -> Result<(), LocationError> {
        self.source.remove().await.map_err(write_error)?;
        self.mark_as_deleted();
        Ok(())
    }

    // =========================================================================
    // SYNC ACCESSORS
    // =========================================================================

    /// Geometry for `id`, without fetching. `None` unless the cache is valid
    /// and holds the id.
    #[must_use]
    pub fn get_sync(&self, id: &LocationId) -> Option<LocationGeometry> {
        let inner = self.read();
        if !inner.resolved_once {
            if self.warned_unloaded.swap(true, Ordering::Relaxed) {
                tracing::debug!(location = %id, "location read before the floor plan was loaded");
            } else {
                tracing::warn!(location = %id, "location read before the floor plan was loaded");
            }
        }
        if inner.state != CacheState::Valid {
            return None;
        }
        inner.locations.get(id).cloned()
    }

    /// Current map when valid, without fetching.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<LocationMap>> {
        let inner = self.read();
        (inner.state == CacheState::Valid).then(|| Arc::clone(&inner.locations))
    }

    /// All known ids in display order (ascending numeric suffix).
    #[must_use]
    pub fn list_ids(&self) -> Vec<LocationId> {
        let inner = self.read();
        if inner.state != CacheState::Valid {
            return Vec::new();
        }
        inner.locations.keys().cloned().collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        let inner = self.read();
        if inner.state == CacheState::Valid { inner.locations.len() } else { 0 }
    }

    /// Valid with at least one location. Never fetches.
    #[must_use]
    pub fn is_available_sync(&self) -> bool {
        let inner = self.read();
        inner.state == CacheState::Valid && !inner.locations.is_empty()
    }

    /// True iff the cache can be reused as-is (state is exactly `valid`).
    #[must_use]
    pub fn is_already_loaded(&self) -> bool {
        self.read().state == CacheState::Valid
    }

    /// Like [`Self::is_available_sync`], loading first if the state is still
    /// `unknown`. A resolved state never triggers a fetch.
    ///
    /// # Errors
    ///
    /// Propagates transport and malformed errors from the implied load.
    pub async fn is_available(&self) -> Result<bool, LocationError> {
        if !self.state().is_resolved() {
            self.load(false).await?;
        }
        Ok(self.is_available_sync())
    }
}

fn write_error(err: FetchError) -> LocationError {
    match err {
        FetchError::NotFound => LocationError::Transport("floor plan endpoint not found".to_owned()),
        FetchError::Transport(detail) => LocationError::Transport(detail),
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
