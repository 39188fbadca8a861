//! Shelf ↔ location reconciliation.
//!
//! Shelves point at locations by id; nothing here enforces one shelf per
//! location. When the catalog holds duplicates, the first shelf in list order
//! is reported as the occupant.

use std::collections::HashSet;

use super::types::LocationId;
use crate::catalog::ShelfRecord;

/// First shelf assigned to `location`, if any.
#[must_use]
pub fn occupant_of<'a>(location: &LocationId, shelves: &'a [ShelfRecord]) -> Option<&'a ShelfRecord> {
    shelves.iter().find(|shelf| shelf.location.as_ref() == Some(location))
}

/// Locations held by some shelf, ignoring the shelf with `excluding_shelf_id`.
#[must_use]
pub fn used_locations<'a>(shelves: &'a [ShelfRecord], excluding_shelf_id: Option<&str>) -> HashSet<&'a LocationId> {
    shelves
        .iter()
        .filter(|shelf| Some(shelf.id.as_str()) != excluding_shelf_id)
        .filter_map(|shelf| shelf.location.as_ref())
        .collect()
}

/// Ids from `all_ids` not used by any shelf other than `excluding_shelf_id`.
///
/// The excluded shelf is the one being edited: it may keep its own location.
/// Input order is preserved.
#[must_use]
pub fn free_locations(
    all_ids: &[LocationId],
    shelves: &[ShelfRecord],
    excluding_shelf_id: Option<&str>,
) -> Vec<LocationId> {
    let used = used_locations(shelves, excluding_shelf_id);
    all_ids.iter().filter(|id| !used.contains(id)).cloned().collect()
}

/// Each id paired with its occupant, in the order given.
#[must_use]
pub fn occupancy<'a>(ids: &[LocationId], shelves: &'a [ShelfRecord]) -> Vec<(LocationId, Option<&'a ShelfRecord>)> {
    ids.iter()
        .map(|id| (id.clone(), occupant_of(id, shelves)))
        .collect()
}

/// Shelves whose location is not among `known_ids` (stale after a new plan upload).
#[must_use]
pub fn orphaned_shelves<'a>(known_ids: &[LocationId], shelves: &'a [ShelfRecord]) -> Vec<&'a ShelfRecord> {
    let known: HashSet<&LocationId> = known_ids.iter().collect();
    shelves
        .iter()
        .filter(|shelf| shelf.location.as_ref().is_some_and(|loc| !known.contains(loc)))
        .collect()
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
