use thiserror::Error;

/// Errors produced by the guide engine
#[derive(Debug, Error)]
pub enum GuideError {
    /// Chrome could not be launched
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Could not attach to an existing browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The page indexing script failed or returned malformed data
    #[error("Failed to parse DOM: {0}")]
    DomParseFailed(String),

    /// A script evaluated inside the page failed
    #[error("Page script failed: {0}")]
    ScriptFailed(String),

    /// The model output did not validate against the action protocol
    #[error("Agent produced an invalid action: {0}")]
    InvalidAction(String),

    /// The LLM call layer failed
    #[error("Model call failed: {0}")]
    ModelFailed(String),

    /// Appending to the guide session log failed
    #[error("Session log error: {0}")]
    SessionLog(String),

    #[error("Guide session cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GuideError {
    /// Whether this error ends the guide session rather than a single action
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GuideError::ScriptFailed(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GuideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_action_message() {
        let err = GuideError::InvalidAction("missing field `index`".to_string());
        assert_eq!(
            err.to_string(),
            "Agent produced an invalid action: missing field `index`"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_script_failure_is_local() {
        let err = GuideError::ScriptFailed("node detached".to_string());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_from_serde_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: GuideError = parse.unwrap_err().into();
        assert!(matches!(err, GuideError::Serialization(_)));
    }
}
