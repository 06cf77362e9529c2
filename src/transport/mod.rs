//! WebSocket transport layer.
//!
//! Internal module handling the debugging WebSocket of a single page
//! target: connection establishment, the message event loop, and
//! request/response correlation.

mod connection;

pub use connection::CdpConnection;
