//! Failure classification.
//!
//! Maps recognized transport-layer failures into the uniform
//! temporary-browser-failure signal plus a reopen decision. Everything else
//! propagates to the caller unchanged and leaves the page in service.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Error;

// ============================================================================
// Classified
// ============================================================================

/// Outcome of classifying a render failure.
pub(crate) struct Classified {
    /// The error to surface to the caller.
    pub(crate) error: Error,

    /// Whether the page must be destroyed and replaced.
    pub(crate) reopen: bool,
}

// ============================================================================
// Classification
// ============================================================================

/// Classifies a failure from the drive phase of a render.
///
/// Classified kinds — rejected handshake, unexpectedly closed debugging
/// connection, the driver-internal permission condition, and the
/// attach-readiness timeout — become [`Error::TemporaryBrowserFailure`]
/// with `reopen = true`. The render-completion timeout is deliberately
/// absent: a slow page is not treated as a browser fault.
pub(crate) fn classify(error: Error) -> Classified {
    match error {
        Error::InvalidHandshake { message } => reopen(format!("invalid handshake: {message}")),
        Error::ConnectionClosed => reopen("remote debugging connection closed".to_string()),
        Error::NotPermitted { message } => reopen(message),
        Error::AttachTimeout { .. } => reopen("attach to page timed out".to_string()),
        error => Classified {
            error,
            reopen: false,
        },
    }
}

fn reopen(message: String) -> Classified {
    Classified {
        error: Error::temporary(message),
        reopen: true,
    }
}

// ============================================================================
// Tests
// ============================================================================
