/// Step ceiling used when none is configured
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Settings for one guide session
#[derive(Debug, Clone)]
pub struct GuideConfig {
    /// Model turns allowed before the driver gives up with `done{success:false}`
    pub max_steps: usize,

    /// Product name rendered into the system prompt
    pub mailbox_name: String,

    /// Email of the user being guided; rendered as "Anonymous user" when `None`
    pub user_email: Option<String>,

    /// Attach a base64 PNG of the viewport to every model request
    pub capture_screenshot: bool,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            mailbox_name: "this website".to_string(),
            user_email: None,
            capture_screenshot: false,
        }
    }
}

impl GuideConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn mailbox_name(mut self, name: impl Into<String>) -> Self {
        self.mailbox_name = name.into();
        self
    }

    pub fn user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn capture_screenshot(mut self, capture: bool) -> Self {
        self.capture_screenshot = capture;
        self
    }
}
