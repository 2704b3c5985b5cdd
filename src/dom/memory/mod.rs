//! In-memory headless DOM.
//!
//! Implements every page capability ([`Page`], [`Animator`], [`Celebrator`],
//! [`SnapshotSource`]) over a small arena of nodes with explicit layout, so
//! the engine can run deterministically without a browser. Effects are
//! recorded as [`DomEvent`]s.

mod xpath;

pub use xpath::{XPath, XPathTree};

use crate::dom::element::ElementNode;
use crate::dom::page::{
    Animator, Celebrator, ElementHandle, Page, PageLocation, ScrollDirection, SelectOption,
    SnapshotSource,
};
use crate::dom::snapshot::DomSnapshot;
use crate::dom::tree::DomTree;
use crate::dom::visibility::{
    self, AncestorLayout, ElementGeometry, Overflow, Rect, ScrollWindow, StyleSummary, Viewport,
};
use crate::error::{GuideError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub type NodeId = u64;

const DOCUMENT: NodeId = 0;

/// Description of a node to insert
#[derive(Debug, Clone)]
pub struct MemoryNode {
    tag_name: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    value: String,
    options: Vec<SelectOption>,
    rect: Rect,
    style: StyleSummary,
    scroll: ScrollWindow,
}

impl MemoryNode {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text: None,
            value: String::new(),
            options: Vec::new(),
            rect: Rect::new(10.0, 10.0, 120.0, 24.0),
            style: StyleSummary::default(),
            scroll: ScrollWindow::default(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Add an `<option>` (for `select` nodes)
    pub fn option(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(SelectOption::new(label, value));
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(x, y, width, height);
        self
    }

    pub fn display(mut self, display: impl Into<String>) -> Self {
        self.style.display = display.into();
        self
    }

    pub fn visibility(mut self, visibility: impl Into<String>) -> Self {
        self.style.visibility = visibility.into();
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.style.opacity = opacity;
        self
    }

    /// Make the node a vertical scroll container with the given client size
    pub fn scrollable(mut self, client_width: f64, client_height: f64) -> Self {
        self.style.overflow_y = Overflow::Auto;
        self.scroll.client_width = client_width;
        self.scroll.client_height = client_height;
        self
    }
}

/// What happened to a node
#[derive(Debug, Clone, PartialEq)]
pub enum DomEventKind {
    Click,
    Focus,
    KeyDown(char),
    Input,
    KeyUp(char),
    Change,
    ScrollIntoView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub node: NodeId,
    pub kind: DomEventKind,
}

/// Observable state of the pointer indicator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorState {
    pub mounted: bool,
    /// How many indicator elements were ever created
    pub created: usize,
    pub position: Option<(f64, f64)>,
    pub pressed: bool,
    pub moves: usize,
    pub presses: usize,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: MemoryNode,
}

#[derive(Debug)]
struct DomState {
    nodes: HashMap<NodeId, Node>,
    body: NodeId,
    next_id: NodeId,
    viewport: Viewport,
    location: PageLocation,
    events: Vec<DomEvent>,
    window_scroll_y: f64,
    back_navigations: usize,
    indicator: IndicatorState,
    celebrations: usize,
}

impl DomState {
    fn new(viewport: Viewport) -> Self {
        let mut state = Self {
            nodes: HashMap::new(),
            body: 0,
            next_id: 1,
            viewport,
            location: PageLocation {
                url: "about:blank".to_string(),
                title: String::new(),
            },
            events: Vec::new(),
            window_scroll_y: 0.0,
            back_navigations: 0,
            indicator: IndicatorState::default(),
            celebrations: 0,
        };

        state.nodes.insert(
            DOCUMENT,
            Node {
                parent: None,
                children: Vec::new(),
                data: MemoryNode::new("#document"),
            },
        );
        let page_rect = viewport.rect();
        let html = MemoryNode::new("html").rect(page_rect.x, page_rect.y, page_rect.width, page_rect.height);
        let html = state.insert(DOCUMENT, html);
        let body = MemoryNode::new("body").rect(page_rect.x, page_rect.y, page_rect.width, page_rect.height);
        state.body = state.insert(html, body);
        state
    }

    fn insert(&mut self, parent: NodeId, data: MemoryNode) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                children: Vec::new(),
                data,
            },
        );
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        id
    }

    fn remove(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != id);
        }
        for child in node.children {
            self.remove(child);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| GuideError::ScriptFailed(format!("node {} is detached", id)))
    }

    fn locate(&self, xpath: &str) -> Result<Option<NodeId>> {
        let path = XPath::parse(xpath)
            .map_err(|e| GuideError::ScriptFailed(format!("Invalid XPath '{}': {}", xpath, e)))?;
        Ok(path.first(self))
    }

    fn record(&mut self, node: NodeId, kind: DomEventKind) {
        self.events.push(DomEvent { node, kind });
    }

    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == DOCUMENT {
                break;
            }
            out.push(parent);
            current = self.nodes.get(&parent).and_then(|n| n.parent);
        }
        out
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    fn shift(&mut self, ids: &[NodeId], dx: f64, dy: f64) {
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.data.rect.x -= dx;
                node.data.rect.y -= dy;
            }
        }
    }

    /// Scroll the window; the vertical offset never goes above the top
    fn scroll_window(&mut self, dx: f64, dy: f64) {
        let target = (self.window_scroll_y + dy).max(0.0);
        let dy = target - self.window_scroll_y;
        let everything: Vec<NodeId> = self.nodes.keys().copied().collect();
        self.shift(&everything, dx, dy);
        self.window_scroll_y = target;
    }

    fn offset_size(data: &MemoryNode) -> (f64, f64) {
        if data.style.display == "none" {
            (0.0, 0.0)
        } else {
            (data.rect.width, data.rect.height)
        }
    }

    fn geometry(&self, id: NodeId) -> Result<ElementGeometry> {
        let node = self.node(id)?;
        let rect = node.data.rect;
        let (offset_width, offset_height) = Self::offset_size(&node.data);

        let mut ancestors = Vec::new();
        for ancestor_id in self.ancestors(id) {
            let ancestor = &self.node(ancestor_id)?.data;
            let (w, h) = Self::offset_size(ancestor);
            ancestors.push(AncestorLayout {
                tag_name: ancestor.tag_name.clone(),
                offset_width: w,
                offset_height: h,
                style: ancestor.style.clone(),
                rect: ancestor.rect,
                scroll: ancestor.scroll,
                content_offset_x: rect.x - ancestor.rect.x + ancestor.scroll.scroll_left,
                content_offset_y: rect.y - ancestor.rect.y + ancestor.scroll.scroll_top,
            });
        }

        Ok(ElementGeometry {
            offset_width,
            offset_height,
            style: node.data.style.clone(),
            rect,
            viewport: self.viewport,
            ancestors,
        })
    }

    fn handle(&self, id: NodeId) -> Result<ElementHandle> {
        let data = &self.node(id)?.data;
        Ok(ElementHandle {
            node_id: id,
            tag_name: data.tag_name.clone(),
            input_type: data.attributes.get("type").map(|t| t.to_ascii_lowercase()),
            is_content_editable: data.attributes.get("contenteditable").is_some(),
            options: data.options.clone(),
            geometry: self.geometry(id)?,
        })
    }

    /// Scroll every scrollable ancestor, then the window, to center the node
    fn scroll_into_view(&mut self, id: NodeId) -> Result<()> {
        for ancestor_id in self.ancestors(id) {
            let (scrollable, scroll, anc_rect) = {
                let anc = &self.node(ancestor_id)?.data;
                (anc.style.is_scroll_container(), anc.scroll, anc.rect)
            };
            if !scrollable {
                continue;
            }
            let rect = self.node(id)?.data.rect;
            let content_y = rect.y - anc_rect.y + scroll.scroll_top;
            let target = (content_y - (scroll.client_height - rect.height) / 2.0).max(0.0);
            let delta = target - scroll.scroll_top;

            if let Some(anc) = self.nodes.get_mut(&ancestor_id) {
                anc.data.scroll.scroll_top = target;
            }
            let mut moved = self.subtree(ancestor_id);
            moved.retain(|&n| n != ancestor_id);
            self.shift(&moved, 0.0, delta);
        }

        let (cx, cy) = self.node(id)?.data.rect.center();
        let dx = cx - self.viewport.width / 2.0;
        self.scroll_window(dx, cy - self.viewport.height / 2.0);

        self.record(id, DomEventKind::ScrollIntoView);
        Ok(())
    }

    fn to_element_node(&self, id: NodeId) -> Result<ElementNode> {
        let data = &self.node(id)?.data;
        let mut element = ElementNode::new(&data.tag_name)
            .with_visibility(visibility::is_visible(&self.geometry(id)?));
        for (key, value) in &data.attributes {
            element.add_attribute(key, value);
        }
        if !data.value.is_empty() {
            element.add_attribute("value", &data.value);
        }
        if let Some(text) = &data.text {
            element.text_content = Some(text.clone());
        }
        for &child in &self.node(id)?.children {
            element.add_child(self.to_element_node(child)?);
        }
        Ok(element)
    }
}

impl XPathTree for DomState {
    fn document(&self) -> u64 {
        DOCUMENT
    }

    fn children(&self, node: u64) -> Vec<u64> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag(&self, node: u64) -> String {
        self.nodes
            .get(&node)
            .map(|n| n.data.tag_name.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: u64, name: &str) -> Option<String> {
        self.nodes
            .get(&node)
            .and_then(|n| n.data.attributes.get(name).cloned())
    }

    fn text(&self, node: u64) -> String {
        self.nodes
            .get(&node)
            .and_then(|n| n.data.text.clone())
            .unwrap_or_default()
    }
}

/// Headless page backed by an in-memory node arena
#[derive(Debug)]
pub struct MemoryPage {
    state: Mutex<DomState>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Empty `html > body` document with a 1280x800 viewport
    pub fn new() -> Self {
        Self::with_viewport(Viewport::default())
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            state: Mutex::new(DomState::new(viewport)),
        }
    }

    fn state(&self) -> MutexGuard<'_, DomState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn body(&self) -> NodeId {
        self.state().body
    }

    /// Append a node as the last child of `parent`
    pub fn append(&self, parent: NodeId, node: MemoryNode) -> NodeId {
        self.state().insert(parent, node)
    }

    /// Detach a node and its subtree
    pub fn remove(&self, id: NodeId) {
        self.state().remove(id);
    }

    pub fn set_location(&self, url: impl Into<String>, title: impl Into<String>) {
        self.state().location = PageLocation {
            url: url.into(),
            title: title.into(),
        };
    }

    pub fn set_rect(&self, id: NodeId, rect: Rect) {
        if let Some(node) = self.state().nodes.get_mut(&id) {
            node.data.rect = rect;
        }
    }

    pub fn set_scroll_top(&self, id: NodeId, scroll_top: f64) {
        if let Some(node) = self.state().nodes.get_mut(&id) {
            node.data.scroll.scroll_top = scroll_top;
        }
    }

    pub fn value(&self, id: NodeId) -> Option<String> {
        self.state().nodes.get(&id).map(|n| n.data.value.clone())
    }

    pub fn text(&self, id: NodeId) -> Option<String> {
        self.state().nodes.get(&id).and_then(|n| n.data.text.clone())
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.state().nodes.get(&id).map(|n| n.data.rect)
    }

    pub fn events(&self) -> Vec<DomEvent> {
        self.state().events.clone()
    }

    /// Events of one kind recorded on one node
    pub fn count_events(&self, id: NodeId, kind: &DomEventKind) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| e.node == id && &e.kind == kind)
            .count()
    }

    pub fn indicator(&self) -> IndicatorState {
        self.state().indicator.clone()
    }

    pub fn celebrations(&self) -> usize {
        self.state().celebrations
    }

    pub fn back_navigations(&self) -> usize {
        self.state().back_navigations
    }

    pub fn window_scroll_y(&self) -> f64 {
        self.state().window_scroll_y
    }

    /// Run the visibility evaluator on a node
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.state()
            .geometry(id)
            .map(|g| visibility::is_visible(&g))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Page for MemoryPage {
    async fn inspect(&self, xpath: &str) -> Result<Option<ElementHandle>> {
        let state = self.state();
        match state.locate(xpath)? {
            Some(id) => Ok(Some(state.handle(id)?)),
            None => Ok(None),
        }
    }

    async fn click(&self, xpath: &str) -> Result<bool> {
        let mut state = self.state();
        let Some(id) = state.locate(xpath)? else {
            return Ok(false);
        };
        state.record(id, DomEventKind::Click);
        Ok(true)
    }

    async fn clear(&self, xpath: &str) -> Result<bool> {
        let mut state = self.state();
        let Some(id) = state.locate(xpath)? else {
            return Ok(false);
        };
        state.record(id, DomEventKind::Focus);
        if let Some(node) = state.nodes.get_mut(&id) {
            if !node.data.value.is_empty() {
                node.data.value.clear();
                state.record(id, DomEventKind::Input);
            }
        }
        Ok(true)
    }

    async fn send_key(&self, xpath: &str, key: char) -> Result<bool> {
        let mut state = self.state();
        let Some(id) = state.locate(xpath)? else {
            return Ok(false);
        };
        let handle = state.handle(id)?;
        let (editable, rich) = (handle.accepts_text(), handle.is_content_editable);
        state.record(id, DomEventKind::KeyDown(key));
        if let Some(node) = state.nodes.get_mut(&id) {
            if editable {
                node.data.value.push(key);
            } else if rich {
                node.data.text.get_or_insert_with(String::new).push(key);
            }
        }
        if editable || rich {
            state.record(id, DomEventKind::Input);
        }
        state.record(id, DomEventKind::KeyUp(key));
        Ok(true)
    }

    async fn select_value(&self, xpath: &str, value: &str) -> Result<bool> {
        let mut state = self.state();
        let Some(id) = state.locate(xpath)? else {
            return Ok(false);
        };
        let Some(node) = state.nodes.get_mut(&id) else {
            return Ok(false);
        };
        if node.data.tag_name != "select" || !node.data.options.iter().any(|o| o.value == value) {
            return Ok(false);
        }
        node.data.value = value.to_string();
        state.record(id, DomEventKind::Change);
        Ok(true)
    }

    async fn scroll_into_view(&self, xpath: &str) -> Result<bool> {
        let mut state = self.state();
        let Some(id) = state.locate(xpath)? else {
            return Ok(false);
        };
        state.scroll_into_view(id)?;
        Ok(true)
    }

    async fn scroll_by(&self, direction: ScrollDirection, amount: Option<i64>) -> Result<()> {
        let mut state = self.state();
        let distance = amount.map(|a| a.unsigned_abs() as f64).unwrap_or(state.viewport.height);
        state.scroll_window(0.0, distance * direction.sign() as f64);
        Ok(())
    }

    async fn go_back(&self) -> Result<()> {
        self.state().back_navigations += 1;
        Ok(())
    }

    async fn location(&self) -> Result<PageLocation> {
        Ok(self.state().location.clone())
    }
}

#[async_trait]
impl Animator for MemoryPage {
    async fn mount(&self) -> Result<()> {
        let mut state = self.state();
        if !state.indicator.mounted {
            let (cx, cy) = state.viewport.rect().center();
            state.indicator.mounted = true;
            state.indicator.created += 1;
            state.indicator.position = Some((cx, cy));
        }
        Ok(())
    }

    async fn move_to(&self, x: f64, y: f64) -> Result<()> {
        let mut state = self.state();
        state.indicator.position = Some((x, y));
        state.indicator.moves += 1;
        Ok(())
    }

    async fn set_pressed(&self, pressed: bool) -> Result<()> {
        let mut state = self.state();
        if pressed && !state.indicator.pressed {
            state.indicator.presses += 1;
        }
        state.indicator.pressed = pressed;
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        let mut state = self.state();
        state.indicator.mounted = false;
        state.indicator.pressed = false;
        state.indicator.position = None;
        Ok(())
    }
}

#[async_trait]
impl Celebrator for MemoryPage {
    async fn celebrate(&self) -> Result<()> {
        self.state().celebrations += 1;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for MemoryPage {
    async fn snapshot(&self) -> Result<DomSnapshot> {
        let state = self.state();
        let root = state.to_element_node(state.body)?;
        let location = state.location.clone();
        Ok(DomTree::indexed(root).into_snapshot(location.url, location.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inspect_reads_tag_and_options() {
        let page = MemoryPage::new();
        let body = page.body();
        let select = page.append(
            body,
            MemoryNode::new("select")
                .attr("name", "reason")
                .option("Damaged", "damaged")
                .option("Late", "late"),
        );

        let handle = page.inspect("//select[@name='reason']").await.unwrap().unwrap();
        assert_eq!(handle.node_id, select);
        assert!(handle.is_native_select());
        assert_eq!(handle.options.len(), 2);
        // html and body
        assert_eq!(handle.geometry.ancestors.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_xpath_is_a_script_error() {
        let page = MemoryPage::new();
        let err = page.inspect("//button[").await.unwrap_err();
        assert!(matches!(err, GuideError::ScriptFailed(_)));
    }

    #[tokio::test]
    async fn test_send_key_updates_value_and_fires_input() {
        let page = MemoryPage::new();
        let input = page.append(page.body(), MemoryNode::new("input").attr("id", "email"));

        for key in "ab".chars() {
            assert!(page.send_key("//input[@id='email']", key).await.unwrap());
        }

        assert_eq!(page.value(input).as_deref(), Some("ab"));
        assert_eq!(page.count_events(input, &DomEventKind::Input), 2);
        assert_eq!(page.count_events(input, &DomEventKind::KeyDown('a')), 1);
    }

    #[tokio::test]
    async fn test_send_key_inserts_into_contenteditable() {
        let page = MemoryPage::new();
        let note = page.append(
            page.body(),
            MemoryNode::new("div").attr("contenteditable", "true").text("Hi"),
        );

        for key in " there".chars() {
            assert!(page.send_key("/html/body/div", key).await.unwrap());
        }

        assert_eq!(page.text(note).as_deref(), Some("Hi there"));
        assert_eq!(page.value(note).as_deref(), Some(""));
        assert_eq!(page.count_events(note, &DomEventKind::Input), 6);
    }

    #[tokio::test]
    async fn test_scroll_by_accepts_extreme_amount() {
        let page = MemoryPage::new();
        page.scroll_by(ScrollDirection::Up, Some(i64::MIN)).await.unwrap();
        assert_eq!(page.window_scroll_y(), 0.0);
        page.scroll_by(ScrollDirection::Down, Some(i64::MIN)).await.unwrap();
        assert!(page.window_scroll_y() > 9.0e18);
    }

    #[tokio::test]
    async fn test_select_value_requires_existing_option() {
        let page = MemoryPage::new();
        let select = page.append(page.body(), MemoryNode::new("select").option("One", "1"));

        assert!(!page.select_value("/html/body/select", "2").await.unwrap());
        assert_eq!(page.count_events(select, &DomEventKind::Change), 0);

        assert!(page.select_value("/html/body/select", "1").await.unwrap());
        assert_eq!(page.value(select).as_deref(), Some("1"));
        assert_eq!(page.count_events(select, &DomEventKind::Change), 1);
    }

    #[tokio::test]
    async fn test_scroll_into_view_centers_offscreen_node() {
        let page = MemoryPage::new();
        let button = page.append(
            page.body(),
            MemoryNode::new("button").rect(100.0, 2000.0, 100.0, 40.0),
        );
        assert!(!page.is_visible(button));

        assert!(page.scroll_into_view("/html/body/button").await.unwrap());

        assert!(page.is_visible(button));
        let (_, cy) = page.rect(button).unwrap().center();
        assert_eq!(cy, 400.0);
        assert_eq!(page.window_scroll_y(), 1620.0);
    }

    #[tokio::test]
    async fn test_scroll_into_view_scrolls_nested_container() {
        let page = MemoryPage::new();
        let list = page.append(
            page.body(),
            MemoryNode::new("div").rect(0.0, 100.0, 400.0, 200.0).scrollable(400.0, 200.0),
        );
        let item = page.append(list, MemoryNode::new("button").rect(10.0, 700.0, 100.0, 20.0));
        assert!(!page.is_visible(item));

        page.scroll_into_view("/html/body/div/button").await.unwrap();

        assert!(page.is_visible(item));
    }

    #[tokio::test]
    async fn test_indicator_mount_is_idempotent() {
        let page = MemoryPage::new();
        page.mount().await.unwrap();
        page.mount().await.unwrap();
        assert_eq!(page.indicator().created, 1);
        assert_eq!(page.indicator().position, Some((640.0, 400.0)));

        page.unmount().await.unwrap();
        assert!(!page.indicator().mounted);
    }

    #[tokio::test]
    async fn test_snapshot_indexes_visible_interactive_nodes() {
        let page = MemoryPage::new();
        page.set_location("https://shop.example/orders", "Orders");
        let body = page.body();
        page.append(body, MemoryNode::new("button").attr("id", "refund").text("Request refund"));
        page.append(body, MemoryNode::new("button").text("Hidden").display("none"));
        page.append(body, MemoryNode::new("p").text("Order #1"));

        let snapshot = page.snapshot().await.unwrap();

        assert_eq!(snapshot.url, "https://shop.example/orders");
        assert_eq!(snapshot.elements.len(), 1);
        let element = snapshot.element(0).unwrap();
        assert_eq!(element.xpath, "/html/body/button[1]");
        assert_eq!(element.text.as_deref(), Some("Request refund"));
    }
}
