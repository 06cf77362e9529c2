//! Pool ownership and the idle queue.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::PrerenderConfig;
use crate::driver::{Driver, PageHandle, TargetInfo, VersionInfo};
use crate::error::{Error, Result};
use crate::identifiers::PageId;

// ============================================================================
// Constants
// ============================================================================

/// Maximum time a render waits for an idle page.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// PooledPage
// ============================================================================

/// A pool-owned page with its render bookkeeping.
pub(crate) struct PooledPage<P> {
    /// The driver's page handle.
    pub(crate) handle: P,

    /// Renders this page has served since creation.
    pub(crate) iteration: u32,
}

impl<P: PageHandle> PooledPage<P> {
    /// Wraps a freshly created page.
    pub(crate) fn new(handle: P) -> Self {
        Self {
            handle,
            iteration: 0,
        }
    }

    /// Returns the page's target identifier.
    #[inline]
    pub(crate) fn id(&self) -> &PageId {
        self.handle.id()
    }
}

// ============================================================================
// Types
// ============================================================================

/// Shared pool state.
pub(crate) struct PoolInner<D: Driver> {
    /// The driver creating and destroying pages.
    pub(crate) driver: D,

    /// Immutable pool configuration.
    pub(crate) config: PrerenderConfig,

    /// Identifiers of every page the pool currently owns.
    pages: Mutex<FxHashSet<PageId>>,

    /// Producer half of the idle queue; sending is the last step of release.
    idle_tx: mpsc::Sender<PooledPage<D::Page>>,

    /// Consumer half of the idle queue, serialized across acquirers.
    idle_rx: AsyncMutex<mpsc::Receiver<PooledPage<D::Page>>>,

    /// Number of pages currently parked in the idle queue.
    idle_count: AtomicUsize,
}

// ============================================================================
// Prerender
// ============================================================================

/// A fixed-size pool of browser pages behind a single render operation.
///
/// Cheap to clone; all clones share the same pool.
///
/// # Example
///
/// ```no_run
/// use chrome_prerender::{ChromeRemoteDebugger, Prerender, PrerenderConfig};
///
/// # async fn example() -> chrome_prerender::Result<()> {
/// let driver = ChromeRemoteDebugger::new("localhost", 9222)?;
/// let pool = Prerender::new(driver, PrerenderConfig::new());
///
/// pool.bootstrap().await?;
/// let html = pool.render("https://example.com").await?;
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Prerender<D: Driver> {
    pub(crate) inner: Arc<PoolInner<D>>,
}

impl<D: Driver> Clone for Prerender<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Driver> fmt::Debug for Prerender<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prerender")
            .field("page_count", &self.page_count())
            .field("idle_count", &self.idle_count())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Prerender - Constructor
// ============================================================================

impl<D: Driver> Prerender<D> {
    /// Creates an empty pool around a driver.
    ///
    /// No pages exist until [`bootstrap`](Self::bootstrap) runs.
    #[must_use]
    pub fn new(driver: D, config: PrerenderConfig) -> Self {
        let (idle_tx, idle_rx) = mpsc::channel(config.concurrency.max(1));

        Self {
            inner: Arc::new(PoolInner {
                driver,
                config,
                pages: Mutex::new(FxHashSet::default()),
                idle_tx,
                idle_rx: AsyncMutex::new(idle_rx),
                idle_count: AtomicUsize::new(0),
            }),
        }
    }
}

// ============================================================================
// Prerender - Lifecycle
// ============================================================================

impl<D: Driver> Prerender<D> {
    /// Creates the configured number of pages and parks them in the idle
    /// queue.
    ///
    /// Must complete before the first render. The pool size is fixed from
    /// here on; the only change mechanism is the one-for-one replacement
    /// performed by the recycling policy.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the pool is already bootstrapped
    /// - Any driver error creating a page
    pub async fn bootstrap(&self) -> Result<()> {
        if self.page_count() > 0 {
            return Err(Error::config("pool is already bootstrapped"));
        }

        for _ in 0..self.inner.config.concurrency {
            let page = self.inner.driver.new_page().await?;
            debug!(page_id = %page.id(), "Page created at bootstrap");
            self.track(page.id().clone());
            self.put_idle(PooledPage::new(page)).await;
        }

        info!(
            concurrency = self.inner.config.concurrency,
            max_iterations = self.inner.config.max_iterations,
            "Page pool bootstrapped"
        );
        Ok(())
    }

    /// Closes every idle page and releases the driver.
    ///
    /// Pages still checked out are closed when their release step finds
    /// the idle queue closed.
    pub async fn shutdown(&self) {
        info!("Shutting down page pool");

        let mut idle_rx = self.inner.idle_rx.lock().await;
        idle_rx.close();

        while let Ok(mut page) = idle_rx.try_recv() {
            self.inner.idle_count.fetch_sub(1, Ordering::SeqCst);
            if let Err(error) = page.handle.close().await {
                debug!(page_id = %page.id(), error = %error, "Error closing page during shutdown");
            }
        }
        drop(idle_rx);

        self.inner.pages.lock().clear();
        self.inner.driver.shutdown().await;

        info!("Page pool shutdown complete");
    }

    /// Lists all debuggable targets known to the browser.
    ///
    /// Pure passthrough to the driver; no pool state is touched.
    pub async fn status(&self) -> Result<Vec<TargetInfo>> {
        self.inner.driver.list_pages().await
    }

    /// Returns browser and protocol version information.
    ///
    /// Pure passthrough to the driver; no pool state is touched.
    pub async fn version(&self) -> Result<VersionInfo> {
        self.inner.driver.version().await
    }
}

// ============================================================================
// Prerender - Accessors
// ============================================================================

impl<D: Driver> Prerender<D> {
    /// Returns the number of pages the pool currently owns.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.inner.pages.lock().len()
    }

    /// Returns the number of pages parked in the idle queue.
    #[inline]
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.inner.idle_count.load(Ordering::SeqCst)
    }

    /// Returns the pool configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PrerenderConfig {
        &self.inner.config
    }
}

// ============================================================================
// Prerender - Idle Queue
// ============================================================================

impl<D: Driver> Prerender<D> {
    /// Checks out an idle page, waiting up to the acquire deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::TemporaryBrowserFailure`] if no page frees up in time
    /// - [`Error::NoBrowserAvailable`] if the queue is closed (shutdown)
    pub(crate) async fn acquire(&self) -> Result<PooledPage<D::Page>> {
        match timeout(ACQUIRE_TIMEOUT, self.take_idle()).await {
            Ok(Some(page)) => Ok(page),
            Ok(None) => Err(Error::NoBrowserAvailable),
            Err(_) => Err(Error::temporary(format!(
                "no page available in {}s",
                ACQUIRE_TIMEOUT.as_secs()
            ))),
        }
    }

    /// Takes the next idle page; `None` when the pool is shut down.
    async fn take_idle(&self) -> Option<PooledPage<D::Page>> {
        let mut idle_rx = self.inner.idle_rx.lock().await;
        let page = idle_rx.recv().await;
        if page.is_some() {
            self.inner.idle_count.fetch_sub(1, Ordering::SeqCst);
        }
        page
    }

    /// Parks a page in the idle queue, making it visible to acquirers.
    ///
    /// A page that cannot be parked because the pool shut down underneath
    /// it is closed and dropped from tracking.
    pub(crate) async fn put_idle(&self, page: PooledPage<D::Page>) {
        match self.inner.idle_tx.send(page).await {
            Ok(()) => {
                self.inner.idle_count.fetch_add(1, Ordering::SeqCst);
            }
            Err(mpsc::error::SendError(mut page)) => {
                let id = page.id().clone();
                warn!(page_id = %id, "Idle queue closed, discarding page");
                self.untrack(&id);
                if let Err(error) = page.handle.close().await {
                    debug!(page_id = %id, error = %error, "Error closing discarded page");
                }
            }
        }
    }

    /// Records a page as pool-owned.
    pub(crate) fn track(&self, id: PageId) {
        self.inner.pages.lock().insert(id);
    }

    /// Removes a page from pool ownership.
    pub(crate) fn untrack(&self, id: &PageId) {
        self.inner.pages.lock().remove(id);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pool::mock::MockDriver;

    fn config(concurrency: usize) -> PrerenderConfig {
        PrerenderConfig::new()
            .with_concurrency(concurrency)
            .with_max_iterations(100)
    }

    #[tokio::test]
    async fn test_bootstrap_fills_idle_queue() {
        let driver = MockDriver::new();
        let pool = Prerender::new(driver.clone(), config(3));

        pool.bootstrap().await.expect("bootstrap");

        assert_eq!(pool.page_count(), 3);
        assert_eq!(pool.idle_count(), 3);
        assert_eq!(driver.created(), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_twice_fails() {
        let pool = Prerender::new(MockDriver::new(), config(1));

        pool.bootstrap().await.expect("bootstrap");
        let err = pool.bootstrap().await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(pool.page_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_pages() {
        let driver = MockDriver::new();
        let pool = Prerender::new(driver.clone(), config(2));

        pool.bootstrap().await.expect("bootstrap");
        pool.shutdown().await;

        assert_eq!(pool.page_count(), 0);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(driver.closed(), 2);
        assert!(driver.is_shut_down());
    }

    #[tokio::test]
    async fn test_release_after_shutdown_closes_page() {
        let driver = MockDriver::new();
        let pool = Prerender::new(driver.clone(), config(1));

        pool.bootstrap().await.expect("bootstrap");
        let page = pool.acquire().await.expect("acquire");

        pool.shutdown().await;
        assert_eq!(driver.closed(), 0); // the page was out during shutdown

        pool.release(page, false).await;
        assert_eq!(driver.closed(), 1);
        assert_eq!(pool.page_count(), 0);
        assert_eq!(pool.idle_count(), 0);
    }

    #[tokio::test]
    async fn test_status_and_version_passthrough() {
        let pool = Prerender::new(MockDriver::new(), config(1));

        let targets = pool.status().await.expect("status");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_type, "page");

        let version = pool.version().await.expect("version");
        assert_eq!(version.browser, "MockChrome/1.0");
    }

    #[tokio::test]
    async fn test_acquire_returns_idle_page() {
        let pool = Prerender::new(MockDriver::new(), config(2));
        pool.bootstrap().await.expect("bootstrap");

        let page = pool.acquire().await.expect("acquire");
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.page_count(), 2);

        pool.put_idle(page).await;
        assert_eq!(pool.idle_count(), 2);
    }
}
