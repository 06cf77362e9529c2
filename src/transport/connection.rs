//! WebSocket connection and event loop.
//!
//! Each attached page owns one [`CdpConnection`] to its target's debugging
//! endpoint. The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the browser (responses, events)
//! - Outgoing commands from the driver API
//! - Request/response correlation by command id
//! - Waiters for named lifecycle events
//!
//! Transport failures are mapped at this boundary so the pool's failure
//! classification only ever sees crate error variants: a rejected
//! handshake surfaces as [`Error::InvalidHandshake`] and an unexpectedly
//! terminated stream as [`Error::ConnectionClosed`].

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{CdpMessage, CdpRequest, Command};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a single command round-trip.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// WebSocket stream type returned by the client handshake.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Value>>>;

/// Map of event method names to waiting listeners.
type EventWaiters = FxHashMap<String, Vec<oneshot::Sender<Value>>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for the correlated response.
    Send {
        request: CdpRequest,
        response_tx: oneshot::Sender<Result<Value>>,
    },
    /// Register a waiter for the next event with the given method name.
    WaitEvent {
        method: String,
        notify_tx: oneshot::Sender<Value>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Close the connection.
    Shutdown,
}

// ============================================================================
// CdpConnection
// ============================================================================

/// WebSocket connection to one page target.
///
/// Handles request/response correlation and event waiting.
/// The connection spawns an internal event loop task.
///
/// # Thread Safety
///
/// `CdpConnection` is `Send + Sync` and can be shared across tasks.
/// All operations are non-blocking.
#[derive(Clone)]
pub struct CdpConnection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl CdpConnection {
    /// Connects to a target's debugging WebSocket endpoint.
    ///
    /// Spawns the event loop task internally.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHandshake`] if the WebSocket upgrade is rejected
    /// - [`Error::Connection`] if the underlying socket cannot be opened
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(ws_url).await.map_err(handshake_error)?;
        debug!(url = %ws_url, "Debugging transport attached");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run_event_loop(ws_stream, command_rx));

        Ok(Self { command_tx })
    }

    /// Sends a command and waits for its response with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::RequestTimeout`] if no response arrives within 30s
    /// - Any error the browser reports for the command
    pub async fn send(&self, command: Command) -> Result<Value> {
        self.send_with_timeout(command, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a command and waits for its response with a custom timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_with_timeout(
        &self,
        command: Command,
        command_timeout: Duration,
    ) -> Result<Value> {
        let request = CdpRequest::new(command);
        let id = request.id;

        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(command_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(id));
                Err(Error::request_timeout(
                    id,
                    command_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Suspends until the browser emits an event with the given method name.
    ///
    /// No internal timeout: callers bound the wait themselves.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection closes first
    pub async fn wait_for_event(&self, method: &str) -> Result<Value> {
        let (notify_tx, notify_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::WaitEvent {
                method: method.to_string(),
                notify_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        notify_rx.await.map_err(|_| Error::ConnectionClosed)
    }

    /// Closes the connection.
    ///
    /// Pending requests and event waiters fail with
    /// [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// CdpConnection - Event Loop
// ============================================================================

impl CdpConnection {
    /// Background task owning the WebSocket stream.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    ) {
        let (mut sink, mut stream) = ws_stream.split();
        let mut correlation = CorrelationMap::default();
        let mut event_waiters = EventWaiters::default();

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(ConnectionCommand::Send { request, response_tx }) => {
                        let text = match to_string(&request) {
                            Ok(text) => text,
                            Err(error) => {
                                let _ = response_tx.send(Err(error.into()));
                                continue;
                            }
                        };
                        trace!(request_id = %request.id, "Sending command");
                        correlation.insert(request.id, response_tx);
                        if let Err(error) = sink.send(Message::text(text)).await {
                            warn!(error = %error, "WebSocket send failed");
                            if let Some(tx) = correlation.remove(&request.id) {
                                let _ = tx.send(Err(stream_error(error)));
                            }
                            break;
                        }
                    }
                    Some(ConnectionCommand::WaitEvent { method, notify_tx }) => {
                        event_waiters.entry(method).or_default().push(notify_tx);
                    }
                    Some(ConnectionCommand::RemoveCorrelation(id)) => {
                        correlation.remove(&id);
                    }
                    Some(ConnectionCommand::Shutdown) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                },
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        Self::dispatch(&text, &mut correlation, &mut event_waiters);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket stream closed");
                        break;
                    }
                    Some(Ok(_)) => {
                        // binary/ping/pong frames carry no protocol messages
                    }
                    Some(Err(error)) => {
                        warn!(error = %error, "WebSocket receive failed");
                        break;
                    }
                },
            }
        }

        // Anything still pending observes the closed connection.
        for (_, tx) in correlation.drain() {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }
        event_waiters.clear();

        trace!("Connection event loop terminated");
    }

    /// Routes one incoming text frame to its correlation entry or waiters.
    fn dispatch(text: &str, correlation: &mut CorrelationMap, event_waiters: &mut EventWaiters) {
        match from_str::<CdpMessage>(text) {
            Ok(CdpMessage::Response(response)) => {
                if let Some(tx) = correlation.remove(&response.id) {
                    let _ = tx.send(response.into_result());
                } else {
                    trace!(request_id = %response.id, "Response without pending request");
                }
            }
            Ok(CdpMessage::Event(event)) => {
                trace!(method = %event.method, "Event received");
                if let Some(waiters) = event_waiters.remove(&event.method) {
                    for tx in waiters {
                        let _ = tx.send(event.params.clone());
                    }
                }
            }
            Err(error) => {
                warn!(error = %error, "Unparseable message from browser");
            }
        }
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Maps a client handshake failure to a crate error.
pub(crate) fn handshake_error(error: WsError) -> Error {
    match error {
        WsError::Http(response) => {
            Error::invalid_handshake(format!("HTTP {}", response.status()))
        }
        WsError::HttpFormat(error) => Error::invalid_handshake(error.to_string()),
        WsError::Protocol(error) => Error::invalid_handshake(error.to_string()),
        WsError::Url(error) => Error::invalid_handshake(error.to_string()),
        WsError::Io(error) => Error::connection(error.to_string()),
        other => Error::WebSocket(other),
    }
}

/// Maps a mid-stream failure to a crate error.
pub(crate) fn stream_error(error: WsError) -> Error {
    match error {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Io(_)
        | WsError::Protocol(_) => Error::ConnectionClosed,
        other => Error::WebSocket(other),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::error::ProtocolError;

    /// One-connection server answering every command with an empty result
    /// and emitting `Page.loadEventFired` after each `Page.navigate`.
    async fn spawn_target_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("ws accept");

            while let Some(Ok(message)) = ws.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let value: Value = serde_json::from_str(&text).expect("request json");
                let id = value["id"].as_u64().expect("request id");
                let method = value["method"].as_str().unwrap_or_default().to_string();

                let reply = json!({"id": id, "result": {}});
                ws.send(Message::text(reply.to_string())).await.expect("send");

                if method == "Page.navigate" {
                    let event = json!({
                        "method": "Page.loadEventFired",
                        "params": {"timestamp": 1.0}
                    });
                    ws.send(Message::text(event.to_string())).await.expect("send");
                }
            }
        });

        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn test_send_receives_response() {
        let url = spawn_target_server().await;
        let connection = CdpConnection::connect(&url).await.expect("connect");

        let result = connection.send(Command::PageEnable {}).await.expect("send");
        assert_eq!(result, json!({}));

        connection.shutdown();
    }

    #[tokio::test]
    async fn test_event_waiter_resolves() {
        let url = spawn_target_server().await;
        let connection = CdpConnection::connect(&url).await.expect("connect");

        let waiter_connection = connection.clone();
        let waiter = tokio::spawn(async move {
            waiter_connection.wait_for_event("Page.loadEventFired").await
        });
        // let the waiter register before the navigate response arrives
        tokio::task::yield_now().await;

        connection
            .send(Command::Navigate {
                url: "https://example.com".to_string(),
            })
            .await
            .expect("navigate");

        let params = waiter.await.expect("join").expect("event");
        assert!(params.get("timestamp").is_some());

        connection.shutdown();
    }

    #[tokio::test]
    async fn test_closed_connection_fails_event_waiters() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("ws accept");
            ws.close(None).await.expect("close");
        });

        let connection = CdpConnection::connect(&format!("ws://{addr}"))
            .await
            .expect("connect");
        let err = connection
            .wait_for_event("Page.loadEventFired")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_connect_rejected_by_dead_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            drop(stream);
        });

        let result = CdpConnection::connect(&format!("ws://{addr}")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_handshake_error_mapping() {
        let err = handshake_error(WsError::Protocol(ProtocolError::HandshakeIncomplete));
        assert!(matches!(err, Error::InvalidHandshake { .. }));
        assert!(err.is_transport_failure());
    }

    #[test]
    fn test_stream_error_mapping() {
        assert!(matches!(
            stream_error(WsError::ConnectionClosed),
            Error::ConnectionClosed
        ));
        assert!(matches!(
            stream_error(WsError::AlreadyClosed),
            Error::ConnectionClosed
        ));
    }
}
