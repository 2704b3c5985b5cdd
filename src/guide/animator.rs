use crate::dom::page::Animator;
use crate::dom::resolver::{ElementResolver, ResolvedElement};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Wait after scrolling an element into view, for lazy layout to stabilize
pub const SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Time the indicator's CSS transition needs to reach its target
pub const TRAVEL_DELAY: Duration = Duration::from_millis(600);

/// Length of the "clicking" visual state
pub const PRESS_PULSE: Duration = Duration::from_millis(200);

/// Pause before a click animation starts, for pending layout
pub const CLICK_GRACE: Duration = Duration::from_millis(1000);

/// Owner of the on-page pointer indicator.
///
/// The indicator is created lazily and removed by [`destroy`](Self::destroy),
/// which every session exit path calls.
pub struct InteractionAnimator {
    animator: Arc<dyn Animator>,
    mounted: bool,
}

impl InteractionAnimator {
    pub fn new(animator: Arc<dyn Animator>) -> Self {
        Self {
            animator,
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Make sure the indicator exists; a second call is a no-op
    pub async fn create_indicator(&mut self) -> Result<()> {
        if !self.mounted {
            self.animator.mount().await?;
            self.mounted = true;
        }
        Ok(())
    }

    /// Bring the element at `index` into view and animate the indicator onto it.
    ///
    /// Scrolls at most once, and only when the element is not visible; the
    /// element is resolved again after the settle delay. `Ok(None)` when the
    /// index is unknown or the element cannot be resolved, in which case no
    /// animation was played.
    pub async fn move_to_and_settle(
        &mut self,
        resolver: &ElementResolver<'_>,
        index: usize,
    ) -> Result<Option<ResolvedElement>> {
        let Some(mut element) = resolver.resolve(index).await? else {
            return Ok(None);
        };

        if !element.is_visible() {
            log::debug!("Element {} not visible, scrolling it into view", index);
            resolver.page().scroll_into_view(&element.xpath).await?;
            sleep(SETTLE_DELAY).await;

            element = match resolver.resolve(index).await? {
                Some(element) => element,
                None => {
                    log::debug!("Element {} disappeared after scrolling", index);
                    return Ok(None);
                }
            };
        }

        let (x, y) = element.center();
        self.create_indicator().await?;
        self.animator.move_to(x, y).await?;
        sleep(TRAVEL_DELAY).await;

        self.animator.set_pressed(true).await?;
        sleep(PRESS_PULSE).await;
        self.animator.set_pressed(false).await?;

        Ok(Some(element))
    }

    /// Remove the indicator from the page
    pub async fn destroy(&mut self) {
        if let Err(e) = self.animator.unmount().await {
            log::warn!("Failed to remove pointer indicator: {}", e);
        }
        self.mounted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{IndicatorState, MemoryNode, MemoryPage};
    use crate::dom::page::SnapshotSource;
    use crate::dom::visibility::Rect;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_visible_element_is_not_scrolled() {
        let page = Arc::new(MemoryPage::new());
        page.append(page.body(), MemoryNode::new("button").rect(100.0, 100.0, 80.0, 20.0));
        let snapshot = page.snapshot().await.unwrap();

        let mut animator = InteractionAnimator::new(page.clone());
        let resolver = ElementResolver::new(page.as_ref(), &snapshot);
        let started = Instant::now();

        let element = animator.move_to_and_settle(&resolver, 0).await.unwrap().unwrap();

        assert_eq!(element.center(), (140.0, 110.0));
        assert_eq!(started.elapsed(), TRAVEL_DELAY + PRESS_PULSE);
        assert_eq!(page.window_scroll_y(), 0.0);

        let indicator = page.indicator();
        assert!(indicator.mounted);
        assert_eq!(indicator.position, Some((140.0, 110.0)));
        assert_eq!(indicator.presses, 1);
        assert!(!indicator.pressed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offscreen_element_scrolls_once_and_settles() {
        let page = Arc::new(MemoryPage::new());
        let button = page.append(page.body(), MemoryNode::new("button"));
        let snapshot = page.snapshot().await.unwrap();
        // Pushed below the fold after indexing
        page.set_rect(button, Rect::new(100.0, 1800.0, 80.0, 20.0));

        let mut animator = InteractionAnimator::new(page.clone());
        let resolver = ElementResolver::new(page.as_ref(), &snapshot);
        let started = Instant::now();

        let element = animator.move_to_and_settle(&resolver, 0).await.unwrap().unwrap();

        assert!(element.is_visible());
        assert_eq!(started.elapsed(), SETTLE_DELAY + TRAVEL_DELAY + PRESS_PULSE);
        assert_eq!(page.window_scroll_y(), 1410.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_index_leaves_indicator_alone() {
        let page = Arc::new(MemoryPage::new());
        let snapshot = page.snapshot().await.unwrap();

        let mut animator = InteractionAnimator::new(page.clone());
        let resolver = ElementResolver::new(page.as_ref(), &snapshot);

        assert!(animator.move_to_and_settle(&resolver, 7).await.unwrap().is_none());
        assert_eq!(page.indicator(), IndicatorState::default());
    }

    #[tokio::test]
    async fn test_indicator_is_a_singleton() {
        let page = Arc::new(MemoryPage::new());
        let mut animator = InteractionAnimator::new(page.clone());

        animator.create_indicator().await.unwrap();
        animator.create_indicator().await.unwrap();
        assert_eq!(page.indicator().created, 1);

        animator.destroy().await;
        assert!(!animator.is_mounted());
        assert!(!page.indicator().mounted);

        animator.create_indicator().await.unwrap();
        assert_eq!(page.indicator().created, 2);
    }
}
