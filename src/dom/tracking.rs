use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One interactive element of a snapshot: what the model refers to by index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedElement {
    pub highlight_index: usize,

    /// Stable locator, re-evaluated against the live document on every use
    pub xpath: String,

    #[serde(rename = "tag")]
    pub tag_name: String,

    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text description shown to the model (truncated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TrackedElement {
    pub fn new(xpath: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            highlight_index: 0,
            xpath: xpath.into(),
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text: None,
        }
    }

    /// Builder method: set an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set text content, truncated for display
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(truncate(&text.into(), 80));
        self
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", head)
}

/// The DOM tracking map: highlight index to element locator.
///
/// Indices are assigned in document order and only mean something within
/// the snapshot that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingMap {
    map: IndexMap<usize, TrackedElement>,

    #[serde(skip)]
    next_index: usize,
}

impl TrackingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new element and return its assigned highlight index
    pub fn register(&mut self, mut element: TrackedElement) -> usize {
        let index = self.next_index;
        element.highlight_index = index;
        self.map.insert(index, element);
        self.next_index += 1;
        index
    }

    /// Insert an element under the highlight index it already carries
    pub fn insert(&mut self, element: TrackedElement) {
        let index = element.highlight_index;
        self.next_index = self.next_index.max(index + 1);
        self.map.insert(index, element);
    }

    pub fn get(&self, index: usize) -> Option<&TrackedElement> {
        self.map.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.map.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.next_index = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &TrackedElement)> {
        self.map.iter()
    }

    pub fn indices(&self) -> impl Iterator<Item = &usize> {
        self.map.keys()
    }

    pub fn find_by_xpath(&self, xpath: &str) -> Option<usize> {
        self.map
            .iter()
            .find(|(_, el)| el.xpath == xpath)
            .map(|(idx, _)| *idx)
    }

    /// Parse the map produced by an external page indexer
    /// (`{"map": {"<key>": {"xpath", "tag", "attributes", "highlightIndex"}}}`).
    ///
    /// Entries are re-keyed by their `highlightIndex`; entries without one
    /// are not addressable and are dropped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct External {
            map: IndexMap<String, serde_json::Value>,
        }

        let external: External = serde_json::from_str(json)?;
        let mut tracking = Self::new();
        for (_, value) in external.map {
            if value.get("highlightIndex").is_none_or(|v| v.is_null()) {
                continue;
            }
            tracking.insert(serde_json::from_value(value)?);
        }
        Ok(tracking)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_sequential_indices() {
        let mut map = TrackingMap::new();

        let idx1 = map.register(TrackedElement::new("/html/body/button[1]", "button"));
        let idx2 = map.register(TrackedElement::new("/html/body/button[2]", "button"));

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(map.get(1).unwrap().highlight_index, 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_insert_keeps_external_index() {
        let mut map = TrackingMap::new();
        let mut el = TrackedElement::new("//button[@id='refund']", "button");
        el.highlight_index = 7;
        map.insert(el);

        assert!(map.contains(7));
        assert!(!map.contains(0));
        assert_eq!(map.register(TrackedElement::new("/html/body/a", "a")), 8);
    }

    #[test]
    fn test_clear() {
        let mut map = TrackingMap::new();
        map.register(TrackedElement::new("/html/body/div[1]", "div"));
        map.register(TrackedElement::new("/html/body/div[2]", "div"));

        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.register(TrackedElement::new("/html/body/p", "p")), 0);
    }

    #[test]
    fn test_find_by_xpath() {
        let mut map = TrackingMap::new();
        map.register(TrackedElement::new("/html/body/a", "a"));
        let idx = map.register(TrackedElement::new("/html/body/button", "button"));

        assert_eq!(map.find_by_xpath("/html/body/button"), Some(idx));
        assert!(map.find_by_xpath("/html/body/select").is_none());
    }

    #[test]
    fn test_text_truncation() {
        let long = "x".repeat(200);
        let el = TrackedElement::new("/html/body/p", "p").with_text(long);
        let text = el.text.unwrap();
        assert_eq!(text.chars().count(), 80);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_from_external_json() {
        let json = r#"{
            "map": {
                "12": {"xpath": "//button[@id='refund']", "tag": "button", "attributes": {"id": "refund"}, "highlightIndex": 1},
                "13": {"xpath": "/html/body/div", "tag": "div", "attributes": {}, "highlightIndex": null},
                "14": {"xpath": "/html/body/textarea", "tag": "textarea", "highlightIndex": 2}
            }
        }"#;

        let map = TrackingMap::from_json(json).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1).unwrap().xpath, "//button[@id='refund']");
        assert_eq!(map.get(2).unwrap().tag_name, "textarea");
        let indices: Vec<_> = map.indices().copied().collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_serialized_field_names() {
        let el = TrackedElement::new("/html/body/a", "a").with_text("Home");
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["tag"], "a");
        assert_eq!(json["highlightIndex"], 0);
        assert_eq!(json["xpath"], "/html/body/a");
    }
}
