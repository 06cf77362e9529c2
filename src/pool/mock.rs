//! Scriptable in-memory driver for pool tests.

use std::collections::VecDeque;
use std::future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::driver::{Driver, PageHandle, TargetInfo, VersionInfo};
use crate::error::{Error, Result};
use crate::identifiers::PageId;

/// Installs a subscriber once so `RUST_LOG=debug cargo test` shows events.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Outcome of one scripted page operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Fault {
    /// Complete successfully.
    #[default]
    None,
    /// Never complete.
    Hang,
    /// Fail with a rejected WebSocket handshake.
    InvalidHandshake,
    /// Fail with a closed debugging connection.
    ConnectionClosed,
    /// Fail with the driver-internal permission condition.
    NotPermitted,
    /// Fail with an unclassified protocol error.
    Protocol,
}

impl Fault {
    async fn run(self) -> Result<()> {
        match self {
            Fault::None => Ok(()),
            Fault::Hang => future::pending::<Result<()>>().await,
            Fault::InvalidHandshake => Err(Error::invalid_handshake("scripted handshake failure")),
            Fault::ConnectionClosed => Err(Error::ConnectionClosed),
            Fault::NotPermitted => Err(Error::not_permitted("unable to perform operation")),
            Fault::Protocol => Err(Error::protocol("scripted protocol failure")),
        }
    }
}

/// Per-page behavior script.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PageScript {
    pub(crate) attach: Fault,
    pub(crate) listen: Fault,
    pub(crate) navigate: Fault,
    pub(crate) wait: Fault,
}

struct MockDriverInner {
    scripts: Mutex<VecDeque<PageScript>>,
    created: AtomicUsize,
    closed: AtomicUsize,
    fail_new_pages: AtomicBool,
    shut_down: AtomicBool,
}

/// In-memory driver whose pages follow per-page fault scripts.
#[derive(Clone)]
pub(crate) struct MockDriver {
    inner: Arc<MockDriverInner>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self::with_scripts([])
    }

    /// Pages take their scripts from this queue in creation order; pages
    /// created after the queue empties behave normally.
    pub(crate) fn with_scripts(scripts: impl IntoIterator<Item = PageScript>) -> Self {
        Self {
            inner: Arc::new(MockDriverInner {
                scripts: Mutex::new(scripts.into_iter().collect()),
                created: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                fail_new_pages: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Total pages created, including replacements.
    pub(crate) fn created(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    /// Total pages closed.
    pub(crate) fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Makes subsequent `new_page` calls fail.
    pub(crate) fn fail_new_pages(&self, fail: bool) {
        self.inner.fail_new_pages.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Page = MockPage;

    async fn new_page(&self) -> Result<MockPage> {
        if self.inner.fail_new_pages.load(Ordering::SeqCst) {
            return Err(Error::connection("scripted page creation failure"));
        }

        let n = self.inner.created.fetch_add(1, Ordering::SeqCst);
        let script = self.inner.scripts.lock().pop_front().unwrap_or_default();
        Ok(MockPage {
            id: PageId::new(format!("mock-page-{n}")),
            attached: false,
            script,
            driver: Arc::clone(&self.inner),
        })
    }

    async fn list_pages(&self) -> Result<Vec<TargetInfo>> {
        Ok(vec![TargetInfo {
            id: PageId::new("mock-target"),
            target_type: "page".to_string(),
            title: "about:blank".to_string(),
            url: "about:blank".to_string(),
            ws_debugger_url: None,
        }])
    }

    async fn version(&self) -> Result<VersionInfo> {
        Ok(VersionInfo {
            browser: "MockChrome/1.0".to_string(),
            protocol_version: "1.3".to_string(),
            user_agent: String::new(),
            v8_version: None,
            webkit_version: None,
        })
    }

    async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
    }
}

/// A scripted page.
pub(crate) struct MockPage {
    id: PageId,
    attached: bool,
    script: PageScript,
    driver: Arc<MockDriverInner>,
}

#[async_trait]
impl PageHandle for MockPage {
    fn id(&self) -> &PageId {
        &self.id
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    async fn attach(&mut self) -> Result<()> {
        self.script.attach.run().await?;
        self.attached = true;
        Ok(())
    }

    async fn listen(&mut self) -> Result<()> {
        self.script.listen.run().await
    }

    async fn navigate(&mut self, _url: &str) -> Result<()> {
        self.script.navigate.run().await
    }

    async fn wait(&mut self) -> Result<String> {
        self.script.wait.run().await?;
        Ok(format!("<html><body>rendered by {}</body></html>", self.id))
    }

    async fn detach(&mut self) -> Result<()> {
        self.attached = false;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.attached = false;
        self.driver.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
