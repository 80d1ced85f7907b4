use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Expected and actual values differ. Fatal to the scenario, never retried.
    #[error("{context}: expected {expected}, got {actual}")]
    Assertion {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser not launched")]
    BrowserNotLaunched,

    #[error("Tab creation failed: {0}")]
    TabCreationFailed(String),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Unknown field \"{0}\" on this form")]
    UnknownField(String),

    #[error("Option \"{option}\" not available in field \"{field}\"")]
    OptionNotFound { field: String, option: String },

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chrome error: {0}")]
    ChromeError(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    pub fn assertion(
        context: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        HarnessError::Assertion {
            context: context.into(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    /// A logical mismatch between expected and rendered/persisted state.
    pub fn is_assertion(&self) -> bool {
        matches!(self, HarnessError::Assertion { .. })
    }

    /// Environment trouble: waits that never settled, a browser that went away.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            HarnessError::Timeout(_)
                | HarnessError::NavigationFailed(_)
                | HarnessError::LaunchFailed(_)
                | HarnessError::BrowserNotLaunched
                | HarnessError::TabCreationFailed(_)
                | HarnessError::NoActiveTab
                | HarnessError::ChromeError(_)
        )
    }
}

/// Fails with an [`HarnessError::Assertion`] when `expected != actual`.
pub fn ensure_eq<T: PartialEq + std::fmt::Debug>(
    context: impl Into<String>,
    expected: T,
    actual: T,
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::assertion(context, expected, actual))
    }
}
