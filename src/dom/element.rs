use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tags that are interactive on their own
const INTERACTIVE_TAGS: [&str; 7] = ["button", "a", "input", "select", "textarea", "label", "summary"];

/// ARIA roles that make an arbitrary element clickable
const CLICKABLE_ROLES: [&str; 8] = [
    "button", "link", "tab", "menuitem", "checkbox", "radio", "option", "combobox",
];

/// An element of the extracted page tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name, lowercase (e.g., "div", "button", "input")
    pub tag_name: String,

    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Direct text content, trimmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Highlight index assigned when the element is indexed as interactive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_index: Option<usize>,

    /// Absolute XPath assigned during indexing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,

    #[serde(default)]
    pub is_visible: bool,

    #[serde(default)]
    pub is_interactive: bool,
}

impl ElementNode {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            highlight_index: None,
            xpath: None,
            is_visible: false,
            is_interactive: false,
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Determine if this element should be considered interactive
    pub fn compute_interactivity(&mut self) {
        let tag_is_interactive = INTERACTIVE_TAGS.iter().any(|&tag| self.is_tag(tag));

        // Hidden inputs are never a target
        let is_hidden_input = self.is_tag("input")
            && self
                .get_attribute("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));

        let has_event_handler = self.attributes.keys().any(|k| k.starts_with("on"));

        let has_clickable_role = self
            .get_attribute("role")
            .is_some_and(|r| CLICKABLE_ROLES.contains(&r.as_str()));

        let is_editable = self
            .get_attribute("contenteditable")
            .is_some_and(|v| v.is_empty() || v == "true");

        self.is_interactive = !is_hidden_input
            && (tag_is_interactive || has_event_handler || has_clickable_role || is_editable);
    }

    /// Remove script, style and other non-content children recursively
    pub fn simplify(&mut self) {
        self.children.retain(|child| {
            !matches!(
                child.tag_name.as_str(),
                "script" | "style" | "noscript" | "template" | "svg"
            )
        });

        for child in &mut self.children {
            child.simplify();
        }
    }

    /// Human-readable description used in the element listing.
    ///
    /// Falls back from visible text to the attributes a user would read
    /// (aria-label, placeholder, title, value, alt, name).
    pub fn label(&self) -> String {
        let text = self.collect_text();
        if !text.is_empty() {
            return text;
        }

        ["aria-label", "placeholder", "title", "value", "alt", "name"]
            .iter()
            .filter_map(|key| self.get_attribute(key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    fn collect_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text_into(&mut parts);
        parts.join(" ")
    }

    fn collect_text_into(&self, parts: &mut Vec<String>) {
        if let Some(text) = &self.text_content {
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                parts.push(text);
            }
        }
        for child in &self.children {
            // Nested interactive elements get their own listing line
            if child.highlight_index.is_none() {
                child.collect_text_into(parts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let element = ElementNode::new("BUTTON")
            .with_attribute("id", "refund")
            .with_text("Request refund")
            .with_visibility(true);

        assert_eq!(element.tag_name, "button");
        assert_eq!(element.id(), Some(&"refund".to_string()));
        assert!(element.is_visible);
        assert!(element.highlight_index.is_none());
    }

    #[test]
    fn test_compute_interactivity() {
        let mut button = ElementNode::new("button");
        button.compute_interactivity();
        assert!(button.is_interactive);

        let mut div = ElementNode::new("div");
        div.compute_interactivity();
        assert!(!div.is_interactive);

        let mut clickable_div = ElementNode::new("div").with_attribute("onclick", "go()");
        clickable_div.compute_interactivity();
        assert!(clickable_div.is_interactive);

        let mut role_option = ElementNode::new("li").with_attribute("role", "option");
        role_option.compute_interactivity();
        assert!(role_option.is_interactive);

        let mut hidden = ElementNode::new("input").with_attribute("type", "hidden");
        hidden.compute_interactivity();
        assert!(!hidden.is_interactive);

        let mut editable = ElementNode::new("div").with_attribute("contenteditable", "true");
        editable.compute_interactivity();
        assert!(editable.is_interactive);
    }

    #[test]
    fn test_simplify() {
        let mut parent = ElementNode::new("div");
        parent.add_child(ElementNode::new("p").with_text("Content"));
        parent.add_child(ElementNode::new("script").with_text("alert('test')"));
        parent.add_child(ElementNode::new("style").with_text(".test { color: red; }"));
        parent.add_child(ElementNode::new("span").with_text("More content"));

        parent.simplify();

        assert_eq!(parent.children.len(), 2);
        assert!(parent.children[0].is_tag("p"));
        assert!(parent.children[1].is_tag("span"));
    }

    #[test]
    fn test_label_prefers_text_then_attributes() {
        let button = ElementNode::new("button")
            .with_children(vec![ElementNode::new("span").with_text("  Request\n refund ")]);
        assert_eq!(button.label(), "Request refund");

        let input = ElementNode::new("input").with_attribute("placeholder", "Email address");
        assert_eq!(input.label(), "Email address");

        assert_eq!(ElementNode::new("div").label(), "");
    }

    #[test]
    fn test_label_skips_indexed_children() {
        let mut nested = ElementNode::new("a").with_text("Nested link");
        nested.highlight_index = Some(4);
        let parent = ElementNode::new("label")
            .with_text("Outer")
            .with_children(vec![nested]);
        assert_eq!(parent.label(), "Outer");
    }

    #[test]
    fn test_deserialize_from_extraction_json() {
        let json = serde_json::json!({
            "tag_name": "button",
            "attributes": {"id": "go"},
            "text_content": "Go",
            "is_visible": true
        });
        let node: ElementNode = serde_json::from_value(json).unwrap();
        assert!(node.is_visible);
        assert!(!node.is_interactive);
        assert!(node.children.is_empty());
    }
}
