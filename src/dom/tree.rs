use crate::dom::element::ElementNode;
use crate::dom::snapshot::DomSnapshot;
use crate::dom::tracking::{TrackedElement, TrackingMap};
use crate::error::{GuideError, Result};
use headless_chrome::Tab;
use std::collections::HashMap;
use std::sync::Arc;

/// Extracted page tree plus the tracking map of its interactive elements
#[derive(Debug, Clone)]
pub struct DomTree {
    /// Root element (`body`)
    pub root: ElementNode,

    pub tracking: TrackingMap,
}

impl DomTree {
    /// Create an unindexed tree
    pub fn new(root: ElementNode) -> Self {
        Self {
            root,
            tracking: TrackingMap::new(),
        }
    }

    /// Create a tree and index it
    pub fn indexed(root: ElementNode) -> Self {
        let mut tree = Self::new(root);
        tree.build_tracking_map();
        tree
    }

    /// Extract and index the DOM of a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        let js_code = include_str!("extract_dom.js");

        let result = tab.evaluate(js_code, false).map_err(|e| {
            GuideError::DomParseFailed(format!("Failed to execute DOM extraction script: {}", e))
        })?;

        let json_value = result.value.ok_or_else(|| {
            GuideError::DomParseFailed("No value returned from DOM extraction".to_string())
        })?;

        // The script returns a JSON string
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| GuideError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        let mut root: ElementNode = serde_json::from_str(&json_str)
            .map_err(|e| GuideError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))?;
        root.simplify();

        Ok(Self::indexed(root))
    }

    /// Assign highlight indices and XPaths by walking the tree in document order
    pub fn build_tracking_map(&mut self) {
        self.tracking.clear();
        let root_path = format!("/html/{}", self.root.tag_name);
        Self::traverse_and_index(&mut self.root, &root_path, &mut self.tracking);
    }

    fn traverse_and_index(node: &mut ElementNode, xpath: &str, tracking: &mut TrackingMap) {
        node.xpath = Some(xpath.to_string());
        node.compute_interactivity();
        node.highlight_index = None;

        // Children first so the parent's label can skip indexed descendants
        let mut tag_counts: HashMap<String, usize> = HashMap::new();
        for child in &node.children {
            *tag_counts.entry(child.tag_name.clone()).or_default() += 1;
        }

        let mut index = if node.is_interactive && node.is_visible {
            // Reserve the slot now to keep document order
            Some(tracking.register(TrackedElement::new(xpath, &node.tag_name)))
        } else {
            None
        };

        let mut seen: HashMap<String, usize> = HashMap::new();
        for child in node.children.iter_mut() {
            let position = seen.entry(child.tag_name.clone()).or_default();
            *position += 1;
            let child_path = if tag_counts[&child.tag_name] > 1 {
                format!("{}/{}[{}]", xpath, child.tag_name, position)
            } else {
                format!("{}/{}", xpath, child.tag_name)
            };
            Self::traverse_and_index(child, &child_path, tracking);
        }

        if let Some(idx) = index.take() {
            node.highlight_index = Some(idx);
            let mut element = TrackedElement::new(xpath, &node.tag_name).with_text(node.label());
            element.highlight_index = idx;
            element.attributes = node.attributes.clone();
            tracking.insert(element);
        }
    }

    /// Freeze the indexed tree into a per-turn snapshot
    pub fn into_snapshot(self, url: impl Into<String>, title: impl Into<String>) -> DomSnapshot {
        DomSnapshot::new(url, title, self.tracking)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root).map_err(|e| {
            GuideError::DomParseFailed(format!("Failed to serialize DOM to JSON: {}", e))
        })
    }

    pub fn count_elements(&self) -> usize {
        Self::count_recursive(&self.root)
    }

    fn count_recursive(node: &ElementNode) -> usize {
        1 + node.children.iter().map(Self::count_recursive).sum::<usize>()
    }

    pub fn count_interactive(&self) -> usize {
        self.tracking.len()
    }

    /// Find element node by highlight index
    pub fn find_node_by_index(&self, index: usize) -> Option<&ElementNode> {
        Self::find_recursive(&self.root, index)
    }

    fn find_recursive(node: &ElementNode, target: usize) -> Option<&ElementNode> {
        if node.highlight_index == Some(target) {
            return Some(node);
        }
        node.children
            .iter()
            .find_map(|child| Self::find_recursive(child, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tree() -> ElementNode {
        let mut root = ElementNode::new("body");

        let mut header = ElementNode::new("header");
        header.add_child(
            ElementNode::new("button")
                .with_attribute("id", "nav-btn")
                .with_text("Menu")
                .with_visibility(true),
        );

        let mut main = ElementNode::new("main");
        main.add_child(
            ElementNode::new("a")
                .with_attribute("href", "/page")
                .with_text("Click here")
                .with_visibility(true),
        );
        main.add_child(ElementNode::new("div").with_text("Some text"));
        main.add_child(ElementNode::new("div").with_children(vec![
            ElementNode::new("button").with_text("Refund").with_visibility(true),
        ]));
        main.add_child(ElementNode::new("button").with_text("Hidden"));

        root.add_child(header);
        root.add_child(main);
        root
    }

    #[test]
    fn test_build_tracking_map() {
        let tree = DomTree::indexed(create_test_tree());

        // Invisible button is not indexed
        assert_eq!(tree.count_interactive(), 3);
    }

    #[test]
    fn test_xpaths_and_document_order() {
        let tree = DomTree::indexed(create_test_tree());

        let xpaths: Vec<_> = tree
            .tracking
            .iter()
            .map(|(idx, el)| (*idx, el.xpath.clone()))
            .collect();
        assert_eq!(
            xpaths,
            vec![
                (0, "/html/body/header/button".to_string()),
                (1, "/html/body/main/a".to_string()),
                (2, "/html/body/main/div[2]/button".to_string()),
            ]
        );
    }

    #[test]
    fn test_tracked_element_carries_label_and_attributes() {
        let tree = DomTree::indexed(create_test_tree());
        let first = tree.tracking.get(0).unwrap();
        assert_eq!(first.text.as_deref(), Some("Menu"));
        assert_eq!(first.attributes.get("id").map(String::as_str), Some("nav-btn"));
    }

    #[test]
    fn test_find_node_by_index() {
        let tree = DomTree::indexed(create_test_tree());

        for &index in tree.tracking.indices() {
            let node = tree.find_node_by_index(index).unwrap();
            assert_eq!(node.highlight_index, Some(index));
        }
        assert!(tree.find_node_by_index(99).is_none());
    }

    #[test]
    fn test_count_elements() {
        let tree = DomTree::new(create_test_tree());
        // body, header, button, main, a, div, div, button, button
        assert_eq!(tree.count_elements(), 9);
    }

    #[test]
    fn test_reindexing_starts_over() {
        let mut tree = DomTree::indexed(create_test_tree());
        tree.build_tracking_map();
        assert_eq!(tree.count_interactive(), 3);
        assert_eq!(tree.tracking.indices().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_into_snapshot() {
        let snapshot = DomTree::indexed(create_test_tree()).into_snapshot("https://x", "X");
        assert_eq!(snapshot.elements.len(), 3);
        assert_eq!(snapshot.title, "X");
    }

    #[test]
    fn test_to_json() {
        let root = ElementNode::new("div")
            .with_attribute("id", "container")
            .with_children(vec![ElementNode::new("span").with_text("Hello")]);

        let json = DomTree::new(root).to_json().unwrap();

        assert!(json.contains("\"tag_name\": \"div\""));
        assert!(json.contains("\"id\": \"container\""));
        assert!(json.contains("Hello"));
    }
}
