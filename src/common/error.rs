//! Error types for the dashboard scenario
//!
//! Scenario failures are recorded as assertions, not errors. These variants
//! cover the infrastructure underneath: the WebDriver session, the driver
//! process and configuration loading.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the dashboard scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === WebDriver Errors ===
    #[error("WebDriver error '{error}': {message}")]
    WebDriver { error: String, message: String },

    #[error("WebDriver HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver returned an unexpected response: {0}")]
    WebDriverProtocol(String),

    #[error("No element matches {0}")]
    ElementNotFound(String),

    #[error("Cannot append `{suffix}` to {selector}")]
    SelectorSuffix { selector: String, suffix: String },

    // === Driver Process Errors ===
    #[error("WebDriver binary '{name}' not found. Searched: {searched}")]
    DriverNotFound { name: String, searched: String },

    #[error("WebDriver failed to start: {0}")]
    DriverStartFailed(String),

    #[error("WebDriver did not become ready after {0} seconds")]
    DriverSpawnTimeout(u64),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a WebDriver error from the wire `error` code and message
    pub fn webdriver(error: &str, message: &str) -> Self {
        Self::WebDriver {
            error: error.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a driver not found error with search paths
    pub fn driver_not_found<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self::DriverNotFound {
            name: name.to_string(),
            searched: paths.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Whether this is the WebDriver "no such element" family
    pub fn is_missing_element(&self) -> bool {
        match self {
            Self::ElementNotFound(_) => true,
            Self::WebDriver { error, .. } => {
                error == "no such element" || error == "stale element reference"
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_element_classification() {
        assert!(Error::ElementNotFound("css `.x`".into()).is_missing_element());
        assert!(Error::webdriver("no such element", "gone").is_missing_element());
        assert!(Error::webdriver("stale element reference", "detached").is_missing_element());
        assert!(!Error::webdriver("invalid session id", "closed").is_missing_element());
        assert!(!Error::Config("bad".into()).is_missing_element());
    }

    #[test]
    fn test_driver_not_found_lists_paths() {
        let err = Error::driver_not_found("chromedriver", &["/usr/bin", "/opt/bin"]);
        assert_eq!(
            err.to_string(),
            "WebDriver binary 'chromedriver' not found. Searched: /usr/bin, /opt/bin"
        );
    }
}
