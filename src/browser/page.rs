use crate::browser::scripts;
use crate::dom::page::{
    Animator, Celebrator, ElementHandle, Page, PageLocation, ScrollDirection, SnapshotSource,
};
use crate::dom::snapshot::DomSnapshot;
use crate::dom::tree::DomTree;
use crate::error::{GuideError, Result};
use async_trait::async_trait;
use base64::Engine;
use headless_chrome::Tab;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use serde_json::Value;
use std::sync::Arc;

/// Capabilities of a live Chrome tab.
///
/// `headless_chrome` is blocking, so every call runs on the blocking pool.
#[derive(Clone)]
pub struct CdpPage {
    tab: Arc<Tab>,
}

impl CdpPage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Arc<Tab>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(tab))
            .await
            .map_err(|e| GuideError::ScriptFailed(format!("Page task failed: {}", e)))?
    }

    /// Evaluate a script and return its value (`Null` when it returned nothing)
    async fn evaluate(&self, script: String) -> Result<Value> {
        self.blocking(move |tab| {
            let result = tab
                .evaluate(&script, false)
                .map_err(|e| GuideError::ScriptFailed(e.to_string()))?;
            Ok(result.value.unwrap_or(Value::Null))
        })
        .await
    }

    async fn evaluate_bool(&self, script: String) -> Result<bool> {
        Ok(self.evaluate(script).await?.as_bool().unwrap_or(false))
    }

    /// Evaluate a script that returns a JSON string and decode it
    async fn evaluate_json<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        let value = self.evaluate(script).await?;
        let json = value.as_str().ok_or_else(|| {
            GuideError::ScriptFailed(format!("Expected a JSON string, got {}", value))
        })?;
        serde_json::from_str(json)
            .map_err(|e| GuideError::ScriptFailed(format!("Malformed script result: {}", e)))
    }
}

#[async_trait]
impl Page for CdpPage {
    async fn inspect(&self, xpath: &str) -> Result<Option<ElementHandle>> {
        self.evaluate_json(scripts::inspect(xpath)).await
    }

    async fn click(&self, xpath: &str) -> Result<bool> {
        self.evaluate_bool(scripts::click(xpath)).await
    }

    async fn clear(&self, xpath: &str) -> Result<bool> {
        self.evaluate_bool(scripts::clear(xpath)).await
    }

    async fn send_key(&self, xpath: &str, key: char) -> Result<bool> {
        self.evaluate_bool(scripts::send_key(xpath, key)).await
    }

    async fn select_value(&self, xpath: &str, value: &str) -> Result<bool> {
        self.evaluate_bool(scripts::select_value(xpath, value)).await
    }

    async fn scroll_into_view(&self, xpath: &str) -> Result<bool> {
        self.evaluate_bool(scripts::scroll_into_view(xpath)).await
    }

    async fn scroll_by(&self, direction: ScrollDirection, amount: Option<i64>) -> Result<()> {
        self.evaluate(scripts::scroll_by(direction, amount)).await?;
        Ok(())
    }

    async fn go_back(&self) -> Result<()> {
        self.evaluate(scripts::GO_BACK.to_string())
            .await
            .map_err(|e| GuideError::NavigationFailed(format!("Failed to go back: {}", e)))?;
        Ok(())
    }

    async fn location(&self) -> Result<PageLocation> {
        self.evaluate_json(scripts::LOCATION.to_string()).await
    }
}

#[async_trait]
impl Animator for CdpPage {
    async fn mount(&self) -> Result<()> {
        if self.evaluate_bool(scripts::mount_indicator()).await? {
            log::debug!("Pointer indicator created");
        }
        Ok(())
    }

    async fn move_to(&self, x: f64, y: f64) -> Result<()> {
        self.evaluate(scripts::move_indicator(x, y)).await?;
        Ok(())
    }

    async fn set_pressed(&self, pressed: bool) -> Result<()> {
        self.evaluate(scripts::press_indicator(pressed)).await?;
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        self.evaluate(scripts::unmount_indicator()).await?;
        Ok(())
    }
}

#[async_trait]
impl Celebrator for CdpPage {
    async fn celebrate(&self) -> Result<()> {
        self.evaluate(scripts::CONFETTI.to_string()).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for CdpPage {
    async fn snapshot(&self) -> Result<DomSnapshot> {
        self.blocking(|tab| {
            let tree = DomTree::from_tab(&tab)?;
            let title = tab.get_title().unwrap_or_default();
            Ok(tree.into_snapshot(tab.get_url(), title))
        })
        .await
    }

    async fn screenshot(&self) -> Result<Option<String>> {
        self.blocking(|tab| {
            let png = tab
                .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(|e| GuideError::TabOperationFailed(format!("Screenshot failed: {}", e)))?;
            Ok(Some(base64::engine::general_purpose::STANDARD.encode(png)))
        })
        .await
    }
}
