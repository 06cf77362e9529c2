//! DevTools protocol message types.
//!
//! Internal module defining the command/response/event structures exchanged
//! with a page target over its debugging WebSocket. Only the small subset
//! of the protocol the prerender driver needs is modeled.

mod command;
mod message;

pub use command::{CdpRequest, Command};
pub use message::{CdpEvent, CdpMessage, CdpResponse};
