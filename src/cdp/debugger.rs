//! Remote debugger endpoint client.
//!
//! Talks to a running browser's remote-debugging HTTP endpoint to create,
//! enumerate and destroy page targets. The browser process itself is
//! launched and owned elsewhere (typically `chrome --headless
//! --remote-debugging-port=9222`); this client only drives its endpoint.
//!
//! # Example
//!
//! ```no_run
//! use chrome_prerender::{ChromeRemoteDebugger, Driver};
//!
//! # async fn example() -> chrome_prerender::Result<()> {
//! let debugger = ChromeRemoteDebugger::new("localhost", 9222)?;
//! let version = debugger.version().await?;
//! println!("driving {}", version.browser);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::cdp::CdpPage;
use crate::driver::{Driver, TargetInfo, VersionInfo};
use crate::error::Result;

// ============================================================================
// ChromeRemoteDebugger
// ============================================================================

/// Client for the browser's remote-debugging HTTP endpoint.
#[derive(Clone)]
pub struct ChromeRemoteDebugger {
    /// Base endpoint, e.g. `http://localhost:9222/`.
    endpoint: Url,

    /// Shared HTTP client; cloned into every page for target teardown.
    client: Client,
}

impl fmt::Debug for ChromeRemoteDebugger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeRemoteDebugger")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ChromeRemoteDebugger - Public API
// ============================================================================

impl ChromeRemoteDebugger {
    /// Creates a debugger client for `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`](crate::Error::Url) if the host does not form
    /// a valid endpoint URL.
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let endpoint = Url::parse(&format!("http://{host}:{port}/"))?;
        Ok(Self {
            endpoint,
            client: Client::new(),
        })
    }

    /// Returns the base endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

// ============================================================================
// ChromeRemoteDebugger - Driver
// ============================================================================

#[async_trait]
impl Driver for ChromeRemoteDebugger {
    type Page = CdpPage;

    /// Creates a new blank page target.
    ///
    /// Newer Chrome builds only accept `PUT` on `/json/new`.
    async fn new_page(&self) -> Result<CdpPage> {
        let url = self.endpoint.join("json/new?about:blank")?;
        let info: TargetInfo = self
            .client
            .put(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(page_id = %info.id, "Created page target");
        Ok(CdpPage::new(
            info,
            self.client.clone(),
            self.endpoint.clone(),
        ))
    }

    async fn list_pages(&self) -> Result<Vec<TargetInfo>> {
        let url = self.endpoint.join("json/list")?;
        let targets = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(targets)
    }

    async fn version(&self) -> Result<VersionInfo> {
        let url = self.endpoint.join("json/version")?;
        let version = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(version)
    }

    async fn shutdown(&self) {
        // nothing held open; the browser process is owned elsewhere
        debug!(endpoint = %self.endpoint, "Remote debugger released");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let debugger = ChromeRemoteDebugger::new("localhost", 9222).expect("debugger");
        assert_eq!(debugger.endpoint().as_str(), "http://localhost:9222/");
    }

    #[test]
    fn test_endpoint_join() {
        let debugger = ChromeRemoteDebugger::new("127.0.0.1", 9222).expect("debugger");
        let url = debugger.endpoint().join("json/version").expect("join");
        assert_eq!(url.as_str(), "http://127.0.0.1:9222/json/version");
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(ChromeRemoteDebugger::new("not a host", 9222).is_err());
    }

    #[test]
    fn test_debugger_is_clone_and_debug() {
        fn assert_clone<T: Clone>() {}
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_clone::<ChromeRemoteDebugger>();
        assert_debug::<ChromeRemoteDebugger>();
    }
}
