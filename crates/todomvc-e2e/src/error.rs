// Error types for todomvc-e2e

use std::time::Duration;
use thiserror::Error;

/// Result type alias for todomvc-e2e operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving or asserting on the application
#[derive(Debug, Error)]
pub enum Error {
    /// Assertion timeout (expect API)
    ///
    /// The condition was re-evaluated until the deadline and never matched.
    /// `observed` is the value seen on the last evaluation.
    #[error(
        "Assertion timeout: expected '{selector}' {expected}, but {observed} after {timeout:?}"
    )]
    AssertionTimeout {
        selector: String,
        expected: String,
        observed: String,
        timeout: Duration,
    },

    /// Timeout waiting for an action target
    ///
    /// The locator never resolved to an actionable element within the action timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A locator that must resolve to one element matched several
    ///
    /// Refine the locator (e.g. with a text filter) so that it is unambiguous.
    #[error("Strict mode violation: '{selector}' resolved to {count} elements")]
    StrictModeViolation { selector: String, count: usize },

    /// Selector could not be parsed by the backend
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Action is not supported on the resolved element (e.g. fill on a link)
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    /// Navigation failed
    #[error("Navigation to '{url}' failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    /// Invalid argument provided to method
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid or incomplete configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Operation on a session that has been closed
    #[error("Session closed: cannot {0} after close()")]
    SessionClosed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by the Playwright bindings
    #[cfg(feature = "playwright")]
    #[error("Playwright error: {0}")]
    Playwright(#[from] playwright_rs::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns true if this error (or the error it wraps) is a timeout of any kind.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::AssertionTimeout { .. } | Error::Timeout(_) => true,
            Error::Context(_, inner) => inner.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_timeout_message_carries_observed_state() {
        let err = Error::AssertionTimeout {
            selector: ".todo-list li".to_string(),
            expected: "to have count 3".to_string(),
            observed: "had count 2".to_string(),
            timeout: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains(".todo-list li"));
        assert!(msg.contains("to have count 3"));
        assert!(msg.contains("had count 2"));
    }

    #[test]
    fn test_context_preserves_timeout_kind() {
        let err = Error::Timeout("waiting for '.toggle'".to_string()).context("toggle 'Buy milk'");
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("toggle 'Buy milk': Timeout"));

        let strict = Error::StrictModeViolation {
            selector: ".todo-list li".to_string(),
            count: 2,
        };
        assert!(!strict.is_timeout());
    }
}
