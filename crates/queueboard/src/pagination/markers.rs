use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pagination::PaginationResult;

/// Page number → absolute index the page starts at.
///
/// Collapsed and filtered pages hold a varying number of jobs, so page
/// arithmetic stops lining up after page 1. A caller that keeps the markers
/// of pages it has seen can pass them back as `after` cursors. Markers only
/// make sense for one listing (queue, status, mode); clear them when any of
/// those change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMarkers {
    markers: BTreeMap<u64, u64>,
}

impl PageMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers where `page` started and where the page after it begins.
    pub fn record(&mut self, page: u64, pagination: &PaginationResult) {
        self.markers.insert(page, pagination.range.start);
        self.markers.insert(page + 1, pagination.next_cursor);
    }

    pub fn set(&mut self, page: u64, marker: u64) {
        self.markers.insert(page, marker);
    }

    /// Cursor for `page`, if one was recorded.
    pub fn after(&self, page: u64) -> Option<u64> {
        self.markers.get(&page).copied()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
