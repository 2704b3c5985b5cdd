use crate::dom::tracking::{TrackedElement, TrackingMap};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one snapshot capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

impl SnapshotId {
    pub fn next() -> Self {
        SnapshotId(NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Immutable view of the interactive elements for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub id: SnapshotId,
    pub url: String,
    pub title: String,
    pub elements: TrackingMap,
}

impl DomSnapshot {
    pub fn new(url: impl Into<String>, title: impl Into<String>, elements: TrackingMap) -> Self {
        Self {
            id: SnapshotId::next(),
            url: url.into(),
            title: title.into(),
            elements,
        }
    }

    /// Look up the element the model refers to by highlight index
    pub fn element(&self, index: usize) -> Option<&TrackedElement> {
        self.elements.get(index)
    }

    /// Hash of the (index, xpath) listing; differs when the page changed shape
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (index, element) in self.elements.iter() {
            index.hash(&mut hasher);
            element.xpath.hash(&mut hasher);
        }
        hasher.finish()
    }
}
