//! The per-render protocol.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error};

use crate::driver::{Driver, PageHandle};
use crate::error::{Error, Result};
use crate::pool::classify::{Classified, classify};

use super::manager::{PooledPage, Prerender};

// ============================================================================
// Constants
// ============================================================================

/// Maximum wait for the transport readiness signal after attach.
const ATTACH_READY_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Prerender - Render
// ============================================================================

impl<D: Driver> Prerender<D> {
    /// Renders `url` to its fully-rendered HTML.
    ///
    /// Checks out one page from the idle queue (waiting up to 10s), drives
    /// it through attach, readiness, navigation and the render wait, and
    /// unconditionally routes it back through the recycling policy — on
    /// success, on error, and on caller cancellation alike. Failures are
    /// never retried internally.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` is empty
    /// - [`Error::NoBrowserAvailable`] before bootstrap or on a drained pool
    /// - [`Error::TemporaryBrowserFailure`] on acquire timeout or any
    ///   classified transport failure (the page is replaced)
    /// - [`Error::Timeout`] if rendering exceeds the configured deadline
    ///   (the page stays in service)
    /// - Any other driver error, propagated unchanged
    pub async fn render(&self, url: &str) -> Result<String> {
        if url.is_empty() {
            return Err(Error::invalid_url("render URL must not be empty"));
        }
        if self.page_count() == 0 {
            return Err(Error::NoBrowserAvailable);
        }

        let page = self.acquire().await?;
        let page_id = page.id().clone();
        debug!(page_id = %page_id, url = %url, "Page checked out for render");

        let mut guard = PageGuard::new(self.clone(), page);
        let result = match guard.drive(url, self.config().render_timeout).await {
            Ok(html) => {
                debug!(page_id = %page_id, html_len = html.len(), "Render complete");
                Ok(html)
            }
            Err(raw) => {
                let Classified { error, reopen } = classify(raw);
                if reopen {
                    guard.flag_reopen();
                    error!(
                        page_id = %page_id,
                        error = %error,
                        "Transport failure, page will be replaced"
                    );
                }
                Err(error)
            }
        };

        // the release completes before the result reaches the caller
        guard.finish().await;
        result
    }
}

// ============================================================================
// PageGuard
// ============================================================================

/// Scopes a checked-out page to one render call.
///
/// The page leaves the guard through exactly one of two doors: `finish`,
/// which runs the release inline and awaits it, or `Drop`, which detaches
/// the release onto its own task when the render future is cancelled
/// mid-flight. Either way the page is routed through the recycling policy
/// and never silently lost.
struct PageGuard<D: Driver> {
    pool: Prerender<D>,
    page: Option<PooledPage<D::Page>>,
    reopen: bool,
}

impl<D: Driver> PageGuard<D> {
    fn new(pool: Prerender<D>, page: PooledPage<D::Page>) -> Self {
        Self {
            pool,
            page: Some(page),
            reopen: false,
        }
    }

    /// Marks the page for destruction and replacement at release.
    fn flag_reopen(&mut self) {
        self.reopen = true;
    }

    /// Drives the page through the render protocol steps.
    ///
    /// Timeout handling differs per step: the readiness wait maps to
    /// [`Error::AttachTimeout`] (classified later), while the render wait
    /// maps to a plain [`Error::Timeout`].
    async fn drive(&mut self, url: &str, render_timeout: Duration) -> Result<String> {
        let Some(page) = self.page.as_mut() else {
            return Err(Error::connection("page already released"));
        };

        page.handle.attach().await?;

        match timeout(ATTACH_READY_TIMEOUT, page.handle.listen()).await {
            Ok(ready) => ready?,
            Err(_) => {
                return Err(Error::attach_timeout(
                    ATTACH_READY_TIMEOUT.as_millis() as u64
                ));
            }
        }

        page.handle.navigate(url).await?;

        match timeout(render_timeout, page.handle.wait()).await {
            Ok(html) => html,
            Err(_) => Err(Error::timeout("render", render_timeout.as_millis() as u64)),
        }
    }

    /// Runs the release to completion before returning.
    async fn finish(mut self) {
        if let Some(page) = self.page.take() {
            self.pool.release(page, self.reopen).await;
        }
    }
}

impl<D: Driver> Drop for PageGuard<D> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            // the render future was dropped mid-flight; the release must
            // still run to completion, out of reach of the cancellation
            let pool = self.pool.clone();
            let reopen = self.reopen;
            tokio::spawn(async move {
                pool.release(page, reopen).await;
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
