//! Capability interfaces over the live page.
//!
//! The engine never holds on to a node: every operation takes the element's
//! XPath and resolves it again against the current document.

use crate::dom::snapshot::DomSnapshot;
use crate::dom::visibility::ElementGeometry;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One `<option>` of a native select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Visible text
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A live element read from the page at resolution time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementHandle {
    /// Identity of the DOM node that matched; changes when the node is replaced
    pub node_id: u64,

    /// Lowercase tag name
    pub tag_name: String,

    /// `type` attribute of inputs, lowercase
    #[serde(default)]
    pub input_type: Option<String>,

    #[serde(default)]
    pub is_content_editable: bool,

    /// Options when the element is a native `<select>`
    #[serde(default)]
    pub options: Vec<SelectOption>,

    pub geometry: ElementGeometry,
}

impl ElementHandle {
    pub fn is_native_select(&self) -> bool {
        self.tag_name == "select"
    }

    /// Whether the element accepts typed text
    pub fn accepts_text(&self) -> bool {
        match self.tag_name.as_str() {
            "textarea" => true,
            "input" => !matches!(
                self.input_type.as_deref(),
                Some(
                    "checkbox" | "radio" | "submit" | "button" | "reset" | "file" | "image"
                        | "hidden" | "range" | "color"
                )
            ),
            _ => false,
        }
    }
}

/// Direction of a window scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn sign(self) -> i64 {
        match self {
            ScrollDirection::Up => -1,
            ScrollDirection::Down => 1,
        }
    }
}

/// URL and title of the current document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    pub url: String,
    pub title: String,
}

/// DOM reads and effects the engine needs from the page
#[async_trait]
pub trait Page: Send + Sync {
    /// Evaluate the XPath (first ordered node) and read the matching element.
    ///
    /// `Ok(None)` means nothing matched, which is a normal outcome.
    async fn inspect(&self, xpath: &str) -> Result<Option<ElementHandle>>;

    /// Synthetic `click()` on the element; `false` if it no longer resolves
    async fn click(&self, xpath: &str) -> Result<bool>;

    /// Focus the element and clear its current value
    async fn clear(&self, xpath: &str) -> Result<bool>;

    /// Type one character as a keystroke (keydown, value update, `input`, keyup)
    async fn send_key(&self, xpath: &str, key: char) -> Result<bool>;

    /// Set a native select's value and dispatch a bubbling `change` event
    async fn select_value(&self, xpath: &str, value: &str) -> Result<bool>;

    /// Scroll the element into view, centered on both axes
    async fn scroll_into_view(&self, xpath: &str) -> Result<bool>;

    /// Scroll the window vertically by `amount` pixels, or one viewport height
    async fn scroll_by(&self, direction: ScrollDirection, amount: Option<i64>) -> Result<()>;

    async fn go_back(&self) -> Result<()>;

    async fn location(&self) -> Result<PageLocation>;
}

/// The on-page pointer indicator ("hand")
#[async_trait]
pub trait Animator: Send + Sync {
    /// Create the indicator at the viewport center and make it visible.
    /// Calling it while mounted must not create a second indicator.
    async fn mount(&self) -> Result<()>;

    /// Animate the indicator to a viewport point
    async fn move_to(&self, x: f64, y: f64) -> Result<()>;

    /// Toggle the "clicking" visual state
    async fn set_pressed(&self, pressed: bool) -> Result<()>;

    /// Remove the indicator from the page
    async fn unmount(&self) -> Result<()>;
}

/// Completion celebration shown when a guide succeeds
#[async_trait]
pub trait Celebrator: Send + Sync {
    async fn celebrate(&self) -> Result<()>;
}

/// Page indexing: produces the per-turn snapshot
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<DomSnapshot>;

    /// PNG screenshot of the viewport, base64 encoded
    async fn screenshot(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::visibility::{Rect, Viewport};

    fn handle(tag: &str, input_type: Option<&str>) -> ElementHandle {
        ElementHandle {
            node_id: 1,
            tag_name: tag.to_string(),
            input_type: input_type.map(str::to_string),
            is_content_editable: false,
            options: Vec::new(),
            geometry: ElementGeometry::new(Rect::new(0.0, 0.0, 10.0, 10.0), Viewport::default()),
        }
    }

    #[test]
    fn test_accepts_text() {
        assert!(handle("textarea", None).accepts_text());
        assert!(handle("input", None).accepts_text());
        assert!(handle("input", Some("email")).accepts_text());
        assert!(!handle("input", Some("checkbox")).accepts_text());
        assert!(!handle("button", None).accepts_text());
        assert!(!handle("div", None).accepts_text());
    }

    #[test]
    fn test_native_select() {
        assert!(handle("select", None).is_native_select());
        assert!(!handle("div", None).is_native_select());
    }
}
