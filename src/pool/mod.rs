//! Page pool and render orchestration.
//!
//! The pool owns a fixed set of browser pages and hands them to concurrent
//! render calls one at a time. It is the only place with real concurrency
//! and failure-handling logic:
//!
//! - **Manager** (`manager`) - page ownership, the idle queue,
//!   bootstrap/shutdown and the bounded-wait checkout
//! - **Session** (`session`) - the per-render protocol and the
//!   cancellation-shielded release guard
//! - **Classification** (`classify`) - mapping transport failures into
//!   the uniform temporary-failure signal plus a replacement decision
//! - **Recycling** (`recycle`) - the unconditional release path: return
//!   a page to service or replace it one-for-one
//!
//! # Checkout protocol
//!
//! ```text
//! caller ──► render(url)
//!              │ acquire (≤10s)          ┌───────────────┐
//!              ├────────────────────────►│  idle queue   │
//!              │ attach / listen (≤1s)   └───────┬───────┘
//!              │ navigate                        │ put (last step
//!              │ wait (≤render_timeout)          │  of release)
//!              ▼                                 │
//!           release ── always runs ──► recycling policy
//! ```

mod classify;
mod manager;
mod recycle;
mod session;

pub use manager::Prerender;

#[cfg(test)]
pub(crate) mod mock;
