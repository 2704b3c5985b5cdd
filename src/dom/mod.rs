//! DOM indexing, visibility and element resolution
//!
//! This module provides everything the engine knows about a page:
//! - ElementNode / DomTree: the extracted page tree and its indexing pass
//! - TrackingMap / DomSnapshot: the per-turn list of interactive elements
//! - visibility: the "meaningfully visible" decision
//! - ElementResolver: index to live element, re-resolved on every call
//! - page: capability traits implemented by the CDP page and `MemoryPage`

pub mod element;
pub mod memory;
pub mod page;
pub mod resolver;
pub mod snapshot;
pub mod tracking;
pub mod tree;
pub mod visibility;

pub use element::ElementNode;
pub use memory::{MemoryNode, MemoryPage};
pub use page::{
    Animator, Celebrator, ElementHandle, Page, PageLocation, ScrollDirection, SelectOption,
    SnapshotSource,
};
pub use resolver::{ElementResolver, ResolvedElement};
pub use snapshot::{DomSnapshot, SnapshotId};
pub use tracking::{TrackedElement, TrackingMap};
pub use tree::DomTree;
pub use visibility::{ElementGeometry, Rect, Viewport, is_visible};

use crate::error::Result;
use headless_chrome::Tab;
use std::sync::Arc;

/// Extract and index the DOM tree of a browser tab
pub fn extract_dom(tab: &Arc<Tab>) -> Result<DomTree> {
    DomTree::from_tab(tab)
}

/// Extract the tab's DOM and freeze it into a snapshot
pub fn capture_snapshot(tab: &Arc<Tab>) -> Result<DomSnapshot> {
    let tree = DomTree::from_tab(tab)?;
    Ok(tree.into_snapshot(tab.get_url(), tab.get_title().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_export() {
        let element = ElementNode::new("div");
        assert_eq!(element.tag_name, "div");
    }

    #[test]
    fn test_tracking_map_export() {
        let map = TrackingMap::new();
        assert!(map.is_empty());
    }

    #[test]
    fn test_dom_tree_export() {
        let tree = DomTree::new(ElementNode::new("body"));
        assert_eq!(tree.root.tag_name, "body");
    }
}
