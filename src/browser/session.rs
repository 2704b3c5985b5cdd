use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::browser::page::CdpPage;
use crate::dom::{DomSnapshot, DomTree};
use crate::error::{GuideError, Result};
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let browser = Browser::new(chrome_options(&options)).map_err(|e| GuideError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| GuideError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Launched browser (headless: {})", options.headless);
        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(
            options.ws_url.clone(),
            Duration::from_millis(options.timeout),
        )
        .map_err(|e| GuideError::ConnectionFailed(e.to_string()))?;

        log::info!("Connected to browser at {}", options.ws_url);
        Ok(Self { browser })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Capabilities of the active tab, for the executor and driver
    pub fn page(&self) -> Result<CdpPage> {
        Ok(CdpPage::new(self.tab()?))
    }

    pub fn new_tab(&self) -> Result<Arc<Tab>> {
        self.browser
            .new_tab()
            .map_err(|e| GuideError::TabOperationFailed(format!("Failed to create tab: {}", e)))
    }

    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| GuideError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the tab the user is looking at.
    ///
    /// Prefers a visible and focused document, then any visible one, then the
    /// first tab (headless tabs never report focus).
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        let probe = |tab: &Arc<Tab>, expression: &str| match tab.evaluate(expression, false) {
            Ok(remote_object) => remote_object
                .value
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            Err(e) => {
                log::debug!("Failed to check tab status: {}", e);
                false
            }
        };

        for expression in [
            "document.visibilityState === 'visible' && document.hasFocus()",
            "document.visibilityState === 'visible'",
        ] {
            if let Some(tab) = tabs.iter().find(|tab| probe(tab, expression)) {
                return Ok(Arc::clone(tab));
            }
        }

        tabs.first()
            .cloned()
            .ok_or_else(|| GuideError::TabOperationFailed("No active tab found".to_string()))
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the active tab and wait for the load to finish
    pub fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| GuideError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| GuideError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Extract and index the DOM tree of the active tab
    pub fn extract_dom(&self) -> Result<DomTree> {
        DomTree::from_tab(&self.tab()?)
    }

    pub fn snapshot(&self) -> Result<DomSnapshot> {
        crate::dom::capture_snapshot(&self.tab()?)
    }

    /// Close all tabs; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab: {}", e);
            }
        }
        Ok(())
    }
}

fn chrome_options(options: &LaunchOptions) -> headless_chrome::LaunchOptions<'static> {
    let mut launch_opts = headless_chrome::LaunchOptions::default();

    // Guides run against real sites; don't advertise automation
    launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
    launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

    launch_opts.idle_browser_timeout = options.idle_timeout;
    launch_opts.headless = options.headless;
    launch_opts.window_size = Some((options.window_width, options.window_height));
    launch_opts.path = options.chrome_path.clone();
    launch_opts.user_data_dir = options.user_data_dir.clone();
    launch_opts.sandbox = options.sandbox;
    launch_opts
}
