//! Error types for the prerender pool.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_prerender::{ChromePrerender, Result};
//!
//! async fn example(pool: &ChromePrerender) -> Result<()> {
//!     let html = pool.render("https://example.com").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Pool | [`Error::NoBrowserAvailable`], [`Error::TemporaryBrowserFailure`], [`Error::InvalidUrl`], [`Error::Config`] |
//! | Transport | [`Error::InvalidHandshake`], [`Error::ConnectionClosed`], [`Error::NotPermitted`], [`Error::Connection`] |
//! | Timeouts | [`Error::AttachTimeout`], [`Error::Timeout`], [`Error::RequestTimeout`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Http`], [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |
//!
//! Transport variants are the raw material of the pool's failure
//! classification: the render session converts the recognized ones into
//! [`Error::TemporaryBrowserFailure`] and flags the page for replacement,
//! while every other variant propagates to the caller unchanged.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Pool Errors
    // ========================================================================
    /// No browser page exists to serve the render.
    ///
    /// Returned when `render` is called before `bootstrap`, or after the
    /// pool has drained to empty.
    #[error("No browser available")]
    NoBrowserAvailable,

    /// A transient browser-side failure.
    ///
    /// The uniform signal for classified transport failures and acquire
    /// timeouts. Callers may retry against another worker.
    #[error("Temporary browser failure: {message}")]
    TemporaryBrowserFailure {
        /// Description of the failure.
        message: String,
    },

    /// The render URL failed validation.
    #[error("Invalid URL: {message}")]
    InvalidUrl {
        /// Description of the validation failure.
        message: String,
    },

    /// Pool or driver configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// WebSocket handshake with the page target was rejected.
    #[error("Invalid handshake: {message}")]
    InvalidHandshake {
        /// Description of the handshake failure.
        message: String,
    },

    /// Remote debugging connection closed unexpectedly.
    #[error("Remote debugging connection closed")]
    ConnectionClosed,

    /// Driver-internal "operation not permitted" condition.
    #[error("Operation not permitted: {message}")]
    NotPermitted {
        /// Message reported by the driver.
        message: String,
    },

    /// Transport connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    // ========================================================================
    // Timeout Errors
    // ========================================================================
    /// Page transport did not signal readiness after attach.
    #[error("Attach timed out after {timeout_ms}ms")]
    AttachTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Operation timeout.
    ///
    /// Returned when an operation exceeds its timeout duration; the render
    /// deadline surfaces through this variant.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Protocol command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// HTTP error talking to the DevTools endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL construction error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a temporary browser failure.
    #[inline]
    pub fn temporary(message: impl Into<String>) -> Self {
        Self::TemporaryBrowserFailure {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid handshake error.
    #[inline]
    pub fn invalid_handshake(message: impl Into<String>) -> Self {
        Self::InvalidHandshake {
            message: message.into(),
        }
    }

    /// Creates a not-permitted error.
    #[inline]
    pub fn not_permitted(message: impl Into<String>) -> Self {
        Self::NotPermitted {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an attach timeout error.
    #[inline]
    pub fn attach_timeout(timeout_ms: u64) -> Self {
        Self::AttachTimeout { timeout_ms }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::AttachTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a transport failure the pool classifies
    /// as a temporary browser failure (forcing page replacement).
    #[inline]
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidHandshake { .. }
                | Self::ConnectionClosed
                | Self::NotPermitted { .. }
                | Self::AttachTimeout { .. }
        )
    }

    /// Returns `true` if this is the uniform temporary-failure signal.
    #[inline]
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::TemporaryBrowserFailure { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::temporary("no page available in 10s");
        assert_eq!(
            err.to_string(),
            "Temporary browser failure: no page available in 10s"
        );
    }

    #[test]
    fn test_no_browser_available_display() {
        assert_eq!(Error::NoBrowserAvailable.to_string(), "No browser available");
    }

    #[test]
    fn test_is_timeout() {
        let attach = Error::attach_timeout(1000);
        let render = Error::timeout("render", 30_000);
        let other = Error::connection("test");

        assert!(attach.is_timeout());
        assert!(render.is_timeout());
        assert!(!other.is_timeout());
    }

    #[test]
    fn test_is_transport_failure() {
        assert!(Error::invalid_handshake("bad upgrade").is_transport_failure());
        assert!(Error::ConnectionClosed.is_transport_failure());
        assert!(Error::not_permitted("unable to perform operation").is_transport_failure());
        assert!(Error::attach_timeout(1000).is_transport_failure());

        assert!(!Error::timeout("render", 30_000).is_transport_failure());
        assert!(!Error::protocol("test").is_transport_failure());
        assert!(!Error::NoBrowserAvailable.is_transport_failure());
    }

    #[test]
    fn test_render_timeout_is_not_temporary() {
        let err = Error::timeout("render", 30_000);
        assert!(!err.is_temporary());
        assert!(err.is_timeout());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
