//! Command request types.
//!
//! Commands serialize to the DevTools wire format:
//!
//! ```json
//! {
//!   "id": 7,
//!   "method": "Page.navigate",
//!   "params": { "url": "https://example.com" }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::RequestId;

// ============================================================================
// Command
// ============================================================================

/// A DevTools command with method name and parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum Command {
    /// Enables page-domain event notifications.
    ///
    /// The acknowledgment of this command is the transport readiness
    /// signal: once the browser answers, the target accepts commands and
    /// emits lifecycle events.
    #[serde(rename = "Page.enable")]
    PageEnable {},

    /// Navigates the page to a URL.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// The URL to navigate to.
        url: String,
    },

    /// Evaluates a JavaScript expression in the page.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// Expression to evaluate.
        expression: String,
        /// Request the result by value rather than as a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
    },
}

// ============================================================================
// CdpRequest
// ============================================================================

/// A command request with correlation id, ready for the wire.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl CdpRequest {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::next(),
            command,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
