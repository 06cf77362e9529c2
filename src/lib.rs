//! Chrome prerender pool - render JavaScript pages to HTML at scale.
//!
//! This library is the core of a server-side rendering service: it manages
//! a fixed-size pool of headless-Chrome page targets and exposes a single
//! operation - render a URL to its fully-rendered HTML - safely across
//! concurrent callers.
//!
//! # Architecture
//!
//! The pool is the only place with real concurrency and failure-handling
//! logic:
//!
//! - Each render checks out one page from a bounded idle queue (waiting up
//!   to 10s), drives it through attach / readiness / navigate / wait, and
//!   unconditionally releases it through the recycling policy.
//! - Recognized transport failures collapse into a single
//!   temporary-browser-failure signal and force the page to be destroyed
//!   and replaced one-for-one.
//! - Every page is recycled after a fixed number of renders, bounding
//!   resource growth inside the browser process.
//!
//! The pool is generic over a [`Driver`]; [`ChromeRemoteDebugger`] is the
//! production implementation speaking the DevTools protocol against a
//! browser launched with `--remote-debugging-port`.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_prerender::{ChromeRemoteDebugger, Prerender, PrerenderConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let driver = ChromeRemoteDebugger::new("localhost", 9222)?;
//!     let pool = Prerender::new(driver, PrerenderConfig::new());
//!
//!     pool.bootstrap().await?;
//!
//!     let html = pool.render("https://example.com").await?;
//!     println!("{html}");
//!
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pool`] | Page pool: checkout, render session, classification, recycling |
//! | [`cdp`] | DevTools driver: [`ChromeRemoteDebugger`], [`CdpPage`] |
//! | [`driver`] | Driver and page trait seams, target/version payloads |
//! | [`config`] | Immutable pool configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | DevTools message types (internal) |
//! | [`transport`] | Debugging WebSocket layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// DevTools protocol driver: the production [`Driver`] implementation.
pub mod cdp;

/// Immutable pool configuration.
///
/// Constructed once, passed into [`Prerender::new`], never ambient.
pub mod config;

/// Driver and page abstractions the pool orchestrates.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for pool and protocol entities.
pub mod identifiers;

/// DevTools protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// Page pool and render orchestration.
pub mod pool;

/// Debugging WebSocket transport layer.
///
/// Internal module handling per-target connections.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Pool types
pub use pool::Prerender;

// Driver types
pub use cdp::{CdpPage, ChromeRemoteDebugger};
pub use driver::{Driver, PageHandle, TargetInfo, VersionInfo};

// Configuration
pub use config::PrerenderConfig;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{PageId, RequestId};

/// The pool specialized to the production DevTools driver.
pub type ChromePrerender = Prerender<ChromeRemoteDebugger>;
