use thiserror::Error;

/// Errors raised by the browser layer and the operations built on it
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Stale element: {0}")]
    StaleElement(String),

    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Frame switch failed: {0}")]
    FrameFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl BrowserError {
    /// Whether an operation may swallow this error and move on to its next
    /// candidate. Only programmer errors are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            BrowserError::InvalidLocator(_)
                | BrowserError::InvalidParameters(_)
                | BrowserError::UnknownTool(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
