use crate::dom::page::{ElementHandle, Page};
use crate::dom::snapshot::DomSnapshot;
use crate::dom::tracking::TrackedElement;
use crate::dom::visibility;
use crate::error::Result;

/// A snapshot entry together with the live element it resolved to
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub index: usize,
    pub xpath: String,
    pub handle: ElementHandle,
}

impl ResolvedElement {
    pub fn is_visible(&self) -> bool {
        visibility::is_visible(&self.handle.geometry)
    }

    /// Center of the element's bounding box, in viewport coordinates
    pub fn center(&self) -> (f64, f64) {
        self.handle.geometry.rect.center()
    }
}

/// Maps highlight indices of one snapshot to live DOM nodes.
///
/// Nothing is cached: each call evaluates the stored XPath again, so a node
/// replaced between turns (or during a scroll/animation delay) is picked up.
pub struct ElementResolver<'a> {
    page: &'a dyn Page,
    snapshot: &'a DomSnapshot,
}

impl<'a> ElementResolver<'a> {
    pub fn new(page: &'a dyn Page, snapshot: &'a DomSnapshot) -> Self {
        Self { page, snapshot }
    }

    pub fn page(&self) -> &'a dyn Page {
        self.page
    }

    pub fn snapshot(&self) -> &DomSnapshot {
        self.snapshot
    }

    /// The snapshot entry for an index, without touching the page
    pub fn entry(&self, index: usize) -> Option<&'a TrackedElement> {
        self.snapshot.element(index)
    }

    /// Resolve an XPath against the current document
    pub async fn resolve_xpath(&self, xpath: &str) -> Result<Option<ElementHandle>> {
        let handle = self.page.inspect(xpath).await?;
        if handle.is_none() {
            log::debug!("XPath {} did not resolve", xpath);
        }
        Ok(handle)
    }

    /// Resolve a highlight index; `Ok(None)` if the index is unknown or the
    /// element no longer exists
    pub async fn resolve(&self, index: usize) -> Result<Option<ResolvedElement>> {
        let Some(entry) = self.entry(index) else {
            log::debug!(
                "Index {} not present in snapshot {:?}",
                index,
                self.snapshot.id
            );
            return Ok(None);
        };

        Ok(self
            .resolve_xpath(&entry.xpath)
            .await?
            .map(|handle| ResolvedElement {
                index,
                xpath: entry.xpath.clone(),
                handle,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryNode, MemoryPage};
    use crate::dom::tracking::{TrackedElement, TrackingMap};

    fn snapshot_for(xpath: &str) -> DomSnapshot {
        let mut map = TrackingMap::new();
        map.register(TrackedElement::new(xpath, "button"));
        DomSnapshot::new("about:blank", "", map)
    }

    #[tokio::test]
    async fn test_resolves_live_node() {
        let page = MemoryPage::new();
        let body = page.body();
        let button = page.append(body, MemoryNode::new("button").attr("id", "refund"));

        let snapshot = snapshot_for("//button[@id='refund']");
        let resolver = ElementResolver::new(&page, &snapshot);

        let resolved = resolver.resolve(0).await.unwrap().unwrap();
        assert_eq!(resolved.handle.node_id, button);
        assert_eq!(resolved.xpath, "//button[@id='refund']");
    }

    #[tokio::test]
    async fn test_unknown_index_and_missing_node() {
        let page = MemoryPage::new();
        let snapshot = snapshot_for("//button[@id='gone']");
        let resolver = ElementResolver::new(&page, &snapshot);

        assert!(resolver.resolve(5).await.unwrap().is_none());
        assert!(resolver.resolve(0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_never_returns_stale_node() {
        let page = MemoryPage::new();
        let body = page.body();
        let original = page.append(body, MemoryNode::new("button").attr("id", "refund"));

        let snapshot = snapshot_for("//button[@id='refund']");
        let resolver = ElementResolver::new(&page, &snapshot);
        assert_eq!(resolver.resolve(0).await.unwrap().unwrap().handle.node_id, original);

        page.remove(original);
        let replacement = page.append(body, MemoryNode::new("button").attr("id", "refund"));

        let first = resolver.resolve(0).await.unwrap().unwrap();
        let second = resolver.resolve(0).await.unwrap().unwrap();
        assert_eq!(first.handle.node_id, replacement);
        assert_eq!(second.handle.node_id, replacement);
        assert_ne!(replacement, original);
    }
}
