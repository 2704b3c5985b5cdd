//! Visibility evaluation over a layout snapshot of one element.
//!
//! The page collects the element's layout plus its full ancestor chain in a
//! single read; the decision itself is pure and deterministic.

use serde::{Deserialize, Serialize};

/// Rectangle in viewport coordinates (CSS pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap: touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(Rect {
            x,
            y,
            width: self.right().min(other.right()) - x,
            height: self.bottom().min(other.bottom()) - y,
        })
    }
}

/// Browser window size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Overflow mode of one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
}

impl Overflow {
    pub fn is_scrollable(self) -> bool {
        matches!(self, Overflow::Auto | Overflow::Scroll)
    }
}

/// The computed-style properties visibility depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSummary {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    #[serde(default)]
    pub overflow_x: Overflow,
    #[serde(default)]
    pub overflow_y: Overflow,
}

impl StyleSummary {
    pub fn hides_element(&self) -> bool {
        self.display == "none" || self.visibility == "hidden" || self.opacity <= 0.0
    }

    pub fn is_scroll_container(&self) -> bool {
        self.overflow_x.is_scrollable() || self.overflow_y.is_scrollable()
    }
}

impl Default for StyleSummary {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            overflow_x: Overflow::Visible,
            overflow_y: Overflow::Visible,
        }
    }
}

/// Scroll state of a scroll container
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollWindow {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub client_width: f64,
    pub client_height: f64,
}

/// Layout of one ancestor, as seen from the element being evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestorLayout {
    pub tag_name: String,
    pub offset_width: f64,
    pub offset_height: f64,
    pub style: StyleSummary,
    pub rect: Rect,
    #[serde(default)]
    pub scroll: ScrollWindow,
    /// Position of the element inside this ancestor's scrollable content,
    /// independent of the current scroll offset
    #[serde(default)]
    pub content_offset_x: f64,
    #[serde(default)]
    pub content_offset_y: f64,
}

impl AncestorLayout {
    pub fn new(tag_name: impl Into<String>, rect: Rect) -> Self {
        Self {
            tag_name: tag_name.into(),
            offset_width: rect.width,
            offset_height: rect.height,
            style: StyleSummary::default(),
            rect,
            scroll: ScrollWindow::default(),
            content_offset_x: 0.0,
            content_offset_y: 0.0,
        }
    }
}

/// Everything the visibility decision needs about one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementGeometry {
    pub offset_width: f64,
    pub offset_height: f64,
    pub style: StyleSummary,
    pub rect: Rect,
    pub viewport: Viewport,
    /// Parent first, document root last
    #[serde(default)]
    pub ancestors: Vec<AncestorLayout>,
}

impl ElementGeometry {
    pub fn new(rect: Rect, viewport: Viewport) -> Self {
        Self {
            offset_width: rect.width,
            offset_height: rect.height,
            style: StyleSummary::default(),
            rect,
            viewport,
            ancestors: Vec::new(),
        }
    }
}

/// Decide whether an element is meaningfully visible to the user.
///
/// Checks run in order and short-circuit: non-zero size, computed style,
/// viewport intersection, then every ancestor (hidden ancestors, and for
/// scroll containers both the clipped visible box and the scroll window).
pub fn is_visible(geometry: &ElementGeometry) -> bool {
    if geometry.offset_width <= 0.0 || geometry.offset_height <= 0.0 {
        return false;
    }

    if geometry.style.hides_element() {
        return false;
    }

    let rect = geometry.rect;
    if !rect.intersects(&geometry.viewport.rect()) {
        return false;
    }

    geometry
        .ancestors
        .iter()
        .all(|ancestor| ancestor_allows(ancestor, &rect, geometry.viewport))
}

fn ancestor_allows(ancestor: &AncestorLayout, rect: &Rect, viewport: Viewport) -> bool {
    if ancestor.offset_width <= 0.0 || ancestor.offset_height <= 0.0 {
        return false;
    }
    if ancestor.style.hides_element() {
        return false;
    }
    if !ancestor.style.is_scroll_container() {
        return true;
    }

    let Some(visible_box) = ancestor.rect.intersection(&viewport.rect()) else {
        return false;
    };
    if !rect.intersects(&visible_box) {
        return false;
    }

    let scroll = ancestor.scroll;
    let in_window_y = ancestor.content_offset_y < scroll.scroll_top + scroll.client_height
        && ancestor.content_offset_y + rect.height > scroll.scroll_top;
    let in_window_x = ancestor.content_offset_x < scroll.scroll_left + scroll.client_width
        && ancestor.content_offset_x + rect.width > scroll.scroll_left;

    in_window_y && in_window_x
}
