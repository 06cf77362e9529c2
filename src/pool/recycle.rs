//! The recycling policy.
//!
//! Every page checked out for a render passes through [`Prerender::release`]
//! on its way back, whatever the render's outcome. The policy either
//! returns the page to service or replaces it one-for-one, keeping the
//! pool at its configured size and bounding any single page's lifetime to
//! `max_iterations` renders.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::driver::{Driver, PageHandle};

use super::manager::{PooledPage, Prerender};

// ============================================================================
// Constants
// ============================================================================

/// Settle time for a freshly created replacement tab.
const REPLACEMENT_GRACE: Duration = Duration::from_millis(100);

// ============================================================================
// Prerender - Release
// ============================================================================

impl<D: Driver> Prerender<D> {
    /// Routes a checked-out page back into the pool.
    ///
    /// Never raises: failures inside the release are logged and the policy
    /// continues, so a checked-out page is always either returned to idle
    /// or replaced — never silently lost. A replacement that cannot be
    /// created shrinks the pool by one.
    pub(crate) async fn release(&self, mut page: PooledPage<D::Page>, reopen: bool) {
        if page.handle.is_attached() {
            if !reopen {
                // parking idle tabs on a blank document bounds browser memory
                if let Err(error) = page.handle.navigate("about:blank").await {
                    debug!(
                        page_id = %page.id(),
                        error = %error,
                        "Error parking page on blank document"
                    );
                }
            }
            if let Err(error) = page.handle.detach().await {
                debug!(page_id = %page.id(), error = %error, "Error detaching page transport");
            }
        }

        page.iteration += 1;
        if !reopen && page.iteration < self.inner.config.max_iterations {
            debug!(
                page_id = %page.id(),
                iteration = page.iteration,
                "Page returned to idle queue"
            );
            self.put_idle(page).await;
            return;
        }

        self.replace(page).await;
    }

    /// Destroys a worn-out or faulted page and adds a fresh one in its
    /// place.
    async fn replace(&self, mut page: PooledPage<D::Page>) {
        let old_id = page.id().clone();
        if let Err(error) = page.handle.close().await {
            warn!(page_id = %old_id, error = %error, "Error closing page");
        }
        self.untrack(&old_id);

        match self.inner.driver.new_page().await {
            Ok(fresh) => {
                // let the browser finish allocating the tab before use
                sleep(REPLACEMENT_GRACE).await;
                let id = fresh.id().clone();
                self.track(id.clone());
                self.put_idle(PooledPage::new(fresh)).await;
                info!(
                    old_page_id = %old_id,
                    page_id = %id,
                    "Replacement page added to idle queue"
                );
            }
            Err(error) => {
                error!(
                    old_page_id = %old_id,
                    error = %error,
                    "Replacement page creation failed, pool capacity reduced"
                );
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
