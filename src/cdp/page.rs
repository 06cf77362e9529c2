//! One controllable page target.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::driver::{PageHandle, TargetInfo};
use crate::error::{Error, Result};
use crate::identifiers::PageId;
use crate::protocol::Command;
use crate::transport::CdpConnection;

// ============================================================================
// Constants
// ============================================================================

/// Expression yielding the rendered document markup.
const OUTER_HTML_EXPRESSION: &str = "document.documentElement.outerHTML";

// ============================================================================
// CdpPage
// ============================================================================

/// A page target reachable through the remote-debugging endpoint.
///
/// The transport lifecycle mirrors how the pool uses pages: the pool
/// attaches before a render, detaches when parking the page in the idle
/// queue, and closes the target when the page is recycled.
pub struct CdpPage {
    /// Target description from the `/json` endpoint.
    info: TargetInfo,

    /// HTTP client for target teardown.
    client: Client,

    /// Remote-debugging base endpoint.
    endpoint: Url,

    /// Debugging transport; `Some` while attached.
    connection: Option<CdpConnection>,
}

impl CdpPage {
    /// Creates a page handle for a freshly created target.
    pub(crate) fn new(info: TargetInfo, client: Client, endpoint: Url) -> Self {
        Self {
            info,
            client,
            endpoint,
            connection: None,
        }
    }

    /// Returns the attached connection or fails.
    fn connection(&self) -> Result<&CdpConnection> {
        self.connection
            .as_ref()
            .ok_or_else(|| Error::connection("page transport is not attached"))
    }
}

// ============================================================================
// CdpPage - PageHandle
// ============================================================================

#[async_trait]
impl PageHandle for CdpPage {
    fn id(&self) -> &PageId {
        &self.info.id
    }

    fn is_attached(&self) -> bool {
        self.connection.is_some()
    }

    async fn attach(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let ws_url = self
            .info
            .ws_debugger_url
            .as_deref()
            .ok_or_else(|| Error::protocol("page target has no WebSocket debugger URL"))?;

        let connection = CdpConnection::connect(ws_url).await?;
        self.connection = Some(connection);
        debug!(page_id = %self.info.id, "Page attached");
        Ok(())
    }

    /// Enables page-domain events; the browser's acknowledgment is the
    /// readiness signal the pool waits for.
    async fn listen(&mut self) -> Result<()> {
        self.connection()?.send(Command::PageEnable {}).await?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!(page_id = %self.info.id, url = %url, "Navigating");
        self.connection()?
            .send(Command::Navigate {
                url: url.to_string(),
            })
            .await?;
        Ok(())
    }

    /// Waits for the load event, then captures the rendered markup.
    async fn wait(&mut self) -> Result<String> {
        let connection = self.connection()?;
        connection.wait_for_event("Page.loadEventFired").await?;

        let value = connection
            .send(Command::Evaluate {
                expression: OUTER_HTML_EXPRESSION.to_string(),
                return_by_value: true,
            })
            .await?;

        let html = value
            .get("result")
            .and_then(|result| result.get("value"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("evaluate returned no HTML string"))?;

        debug!(page_id = %self.info.id, html_len = html.len(), "Render captured");
        Ok(html.to_string())
    }

    async fn detach(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.shutdown();
            debug!(page_id = %self.info.id, "Page detached");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.detach().await?;

        let url = self
            .endpoint
            .join(&format!("json/close/{}", self.info.id))?;
        self.client.get(url).send().await?.error_for_status()?;

        debug!(page_id = %self.info.id, "Page target closed");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
