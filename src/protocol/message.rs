//! Incoming message types.
//!
//! Everything arriving on a target's WebSocket is either a correlated
//! response to a command or a broadcast event:
//!
//! Response:
//! ```json
//! { "id": 7, "result": { "frameId": "..." } }
//! { "id": 7, "error": { "code": -32000, "message": "..." } }
//! ```
//!
//! Event:
//! ```json
//! { "method": "Page.loadEventFired", "params": { "timestamp": 123.4 } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// CdpMessage
// ============================================================================

/// A message received from the browser: response or event.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CdpMessage {
    /// Correlated response to a command.
    Response(CdpResponse),
    /// Broadcast event.
    Event(CdpEvent),
}

// ============================================================================
// CdpResponse
// ============================================================================

/// A response correlated to a command by id.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    /// Matches the command `id`.
    pub id: RequestId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error data (if failure).
    #[serde(default)]
    pub error: Option<CdpErrorData>,
}

/// Error payload of a failed command.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorData {
    /// Protocol error code.
    #[serde(default)]
    pub code: i64,

    /// Error message.
    #[serde(default)]
    pub message: String,
}

impl CdpResponse {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Extracts the result value, mapping error responses.
    ///
    /// # Errors
    ///
    /// - [`Error::NotPermitted`] for the driver-internal permission
    ///   condition, which the pool treats as a temporary browser failure
    /// - [`Error::Protocol`] for any other error response
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            None => Ok(self.result.unwrap_or(Value::Null)),
            Some(error) => {
                let lowered = error.message.to_ascii_lowercase();
                if lowered.contains("not permitted") || lowered.contains("not allowed") {
                    Err(Error::not_permitted(error.message))
                } else {
                    Err(Error::protocol(format!(
                        "{} (code {})",
                        error.message, error.code
                    )))
                }
            }
        }
    }
}

// ============================================================================
// CdpEvent
// ============================================================================

/// A broadcast event from the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEvent {
    /// Event method name, e.g. `Page.loadEventFired`.
    pub method: String,

    /// Event payload.
    #[serde(default)]
    pub params: Value,
}

// ============================================================================
// Tests
// ============================================================================
