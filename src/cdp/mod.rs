//! Chrome DevTools Protocol driver.
//!
//! Production implementation of the [`Driver`](crate::driver::Driver) and
//! [`PageHandle`](crate::driver::PageHandle) seams: target management via
//! the browser's `/json` HTTP endpoints, page control via the per-target
//! debugging WebSocket.

mod debugger;
mod page;

pub use debugger::ChromeRemoteDebugger;
pub use page::CdpPage;
