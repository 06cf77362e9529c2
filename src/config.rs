//! Pool configuration.
//!
//! Provides a type-safe, immutable configuration value constructed once and
//! passed into the pool's constructor. Nothing in the crate reads ambient
//! process state; varying these values in tests is just constructing a
//! different [`PrerenderConfig`].
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use chrome_prerender::PrerenderConfig;
//!
//! let config = PrerenderConfig::new()
//!     .with_render_timeout(Duration::from_secs(15))
//!     .with_concurrency(8)
//!     .with_max_iterations(100);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::thread;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for a single render.
const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of renders a page serves before forced recycling.
const DEFAULT_MAX_ITERATIONS: u32 = 200;

// ============================================================================
// PrerenderConfig
// ============================================================================

/// Pool configuration.
///
/// Immutable after construction; the pool takes it by value and never
/// changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerenderConfig {
    /// Deadline for the render-complete signal of a single render.
    pub render_timeout: Duration,

    /// Number of pages kept in the pool (fixed after bootstrap).
    pub concurrency: usize,

    /// Renders a single page may serve before it is closed and replaced.
    pub max_iterations: u32,
}

// ============================================================================
// Constructors
// ============================================================================

impl PrerenderConfig {
    /// Creates a configuration with default settings.
    ///
    /// Defaults: 30s render timeout, twice the available processing units
    /// as concurrency, 200 renders per page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            concurrency: default_concurrency(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl PrerenderConfig {
    /// Sets the render-completion deadline.
    #[inline]
    #[must_use]
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Sets the pool concurrency (clamped to at least one page).
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the per-page render cap (clamped to at least one render).
    #[inline]
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Twice the available processing units, matching a per-worker deployment
/// where renders are IO-bound on the browser.
fn default_concurrency() -> usize {
    thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(2)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrerenderConfig::new();
        assert_eq!(config.render_timeout, Duration::from_secs(30));
        assert_eq!(config.max_iterations, 200);
        assert!(config.concurrency >= 2);
        assert_eq!(config, PrerenderConfig::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = PrerenderConfig::new()
            .with_render_timeout(Duration::from_secs(5))
            .with_concurrency(4)
            .with_max_iterations(10);

        assert_eq!(config.render_timeout, Duration::from_secs(5));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn test_concurrency_clamped_to_one() {
        let config = PrerenderConfig::new().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_max_iterations_clamped_to_one() {
        let config = PrerenderConfig::new().with_max_iterations(0);
        assert_eq!(config.max_iterations, 1);
    }
}
