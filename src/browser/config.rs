use std::path::PathBuf;
use std::time::Duration;

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    pub window_width: u32,
    pub window_height: u32,

    /// Chrome/Chromium binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,

    /// Profile directory, so a guide can run against the user's own session
    pub user_data_dir: Option<PathBuf>,

    pub sandbox: bool,

    /// How long the browser may sit without DevTools traffic before it is
    /// shut down; a guide waits on the model between steps
    pub idle_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
            idle_timeout: Duration::from_secs(60 * 60),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// Options for attaching to a running browser over its DevTools WebSocket
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub ws_url: String,

    /// Connection timeout in milliseconds
    pub timeout: u64,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout: 30_000,
        }
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_defaults() {
        let opts = LaunchOptions::default();
        assert!(opts.headless);
        assert_eq!((opts.window_width, opts.window_height), (1280, 800));
        assert!(opts.chrome_path.is_none());
        assert_eq!(opts.idle_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new()
            .headless(false)
            .window_size(800, 600)
            .chrome_path("/usr/bin/chromium")
            .sandbox(false);

        assert!(!opts.headless);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert_eq!(opts.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
        assert!(!opts.sandbox);
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }
}
