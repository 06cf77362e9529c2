//! Driver and page abstractions.
//!
//! The pool does not drive browser tabs itself; it orchestrates a
//! [`Driver`] that creates, enumerates and destroys [`PageHandle`]s. The
//! production implementation lives in [`crate::cdp`]; tests supply
//! scriptable in-memory drivers.
//!
//! # Contract
//!
//! Pages are owned exclusively: the pool hands each page to at most one
//! render at a time, and every page handed out is routed back through the
//! pool's recycling policy. Implementations therefore never need internal
//! locking around per-page state.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::identifiers::PageId;

// ============================================================================
// TargetInfo
// ============================================================================

/// Snapshot of one debuggable target, as reported by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetInfo {
    /// Target identifier.
    pub id: PageId,

    /// Target kind (`"page"` for tabs).
    #[serde(default, rename = "type")]
    pub target_type: String,

    /// Current document title.
    #[serde(default)]
    pub title: String,

    /// Current document URL.
    #[serde(default)]
    pub url: String,

    /// WebSocket endpoint for attaching to this target.
    ///
    /// Absent when another client is already attached.
    #[serde(default, rename = "webSocketDebuggerUrl")]
    pub ws_debugger_url: Option<String>,
}

// ============================================================================
// VersionInfo
// ============================================================================

/// Browser and protocol version information.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    /// Browser product and version string.
    #[serde(default, rename = "Browser")]
    pub browser: String,

    /// DevTools protocol version.
    #[serde(default, rename = "Protocol-Version")]
    pub protocol_version: String,

    /// Browser user agent.
    #[serde(default, rename = "User-Agent")]
    pub user_agent: String,

    /// JavaScript engine version.
    #[serde(default, rename = "V8-Version")]
    pub v8_version: Option<String>,

    /// Rendering engine version.
    #[serde(default, rename = "WebKit-Version")]
    pub webkit_version: Option<String>,
}

// ============================================================================
// Driver
// ============================================================================

/// Creates, enumerates and destroys browser page targets.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Page handle type produced by this driver.
    type Page: PageHandle;

    /// Creates a new blank page target.
    async fn new_page(&self) -> Result<Self::Page>;

    /// Lists all debuggable targets currently known to the browser.
    async fn list_pages(&self) -> Result<Vec<TargetInfo>>;

    /// Returns browser and protocol version information.
    async fn version(&self) -> Result<VersionInfo>;

    /// Releases driver resources.
    ///
    /// The browser process itself is owned elsewhere and keeps running.
    async fn shutdown(&self);
}

// ============================================================================
// PageHandle
// ============================================================================

/// One controllable browser tab.
///
/// The transport lifecycle is explicit: [`attach`](PageHandle::attach)
/// opens the debugging transport, [`detach`](PageHandle::detach) closes it
/// while leaving the tab allocated, and [`close`](PageHandle::close)
/// destroys the tab entirely.
#[async_trait]
pub trait PageHandle: Send + 'static {
    /// Returns the target identifier.
    fn id(&self) -> &PageId;

    /// Returns `true` while the debugging transport is open.
    fn is_attached(&self) -> bool;

    /// Opens the debugging transport to this page.
    async fn attach(&mut self) -> Result<()>;

    /// Suspends until the transport signals readiness for commands.
    async fn listen(&mut self) -> Result<()>;

    /// Instructs the page to navigate to `url`.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Suspends until the page has finished rendering; yields the HTML.
    async fn wait(&mut self) -> Result<String>;

    /// Closes the debugging transport; the tab remains allocated.
    async fn detach(&mut self) -> Result<()>;

    /// Destroys the tab.
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_info_deserialize() {
        let json = r#"{
            "description": "",
            "devtoolsFrontendUrl": "/devtools/inspector.html?ws=localhost:9222/devtools/page/A1B2",
            "id": "A1B2",
            "title": "about:blank",
            "type": "page",
            "url": "about:blank",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/A1B2"
        }"#;

        let info: TargetInfo = serde_json::from_str(json).expect("parse");
        assert_eq!(info.id, PageId::new("A1B2"));
        assert_eq!(info.target_type, "page");
        assert_eq!(
            info.ws_debugger_url.as_deref(),
            Some("ws://localhost:9222/devtools/page/A1B2")
        );
    }

    #[test]
    fn test_target_info_without_ws_url() {
        let json = r#"{"id": "A1B2", "type": "page", "title": "", "url": "about:blank"}"#;
        let info: TargetInfo = serde_json::from_str(json).expect("parse");
        assert!(info.ws_debugger_url.is_none());
    }

    #[test]
    fn test_version_info_deserialize() {
        let json = r#"{
            "Browser": "HeadlessChrome/120.0.6099.109",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "V8-Version": "12.0.267.8",
            "WebKit-Version": "537.36"
        }"#;

        let info: VersionInfo = serde_json::from_str(json).expect("parse");
        assert_eq!(info.browser, "HeadlessChrome/120.0.6099.109");
        assert_eq!(info.protocol_version, "1.3");
        assert_eq!(info.v8_version.as_deref(), Some("12.0.267.8"));
    }
}
