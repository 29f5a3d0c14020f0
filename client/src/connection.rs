//! Single WebSocket connection to the ledger node.
//!
//! The `ConnectionManager` is the only holder of the network handle and
//! the only mutator of `ConnectionState`. Every other component reaches
//! the node through it.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Lifecycle of the single node connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// The node's request/response protocol can fail two ways: the transport
/// broke, or the node answered with an error payload. Callers map these
/// onto the operation-level taxonomy.
#[derive(Debug)]
pub enum RpcError {
    /// Network-level failure (send/receive/timeout/closed).
    Transport(String),
    /// The node processed the request and reported an error code.
    Node(String),
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcError::Transport(msg) => write!(f, "transport error: {msg}"),
            RpcError::Node(msg) => write!(f, "node error: {msg}"),
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open WebSocket session with the node.
///
/// Requests carry a monotonically increasing `id` and a `command`;
/// responses are matched by `id`. Unrelated frames (pings, stray pushes)
/// are skipped.
pub struct NodeHandle {
    ws: WsStream,
    endpoint: String,
    next_id: u64,
    request_timeout: Duration,
}

impl NodeHandle {
    /// Open a WebSocket handle to the given `ws://` endpoint.
    pub async fn open(endpoint: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let (ws, _response) = tokio::time::timeout(request_timeout, connect_async(endpoint))
            .await
            .map_err(|_| ClientError::Connection(format!("connect timed out: {endpoint}")))?
            .map_err(|e| ClientError::Connection(format!("connect failed: {e}")))?;

        debug!(endpoint, "websocket handle opened");
        Ok(Self {
            ws,
            endpoint: endpoint.to_string(),
            next_id: 1,
            request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a command and await the matching response, returning its
    /// `result` payload.
    pub async fn request(&mut self, command: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut body = params;
        let obj = body
            .as_object_mut()
            .ok_or_else(|| RpcError::Transport("params must be a JSON object".into()))?;
        obj.insert("id".to_string(), json!(id));
        obj.insert("command".to_string(), json!(command));

        let exchange = async {
            self.ws
                .send(Message::Text(body.to_string()))
                .await
                .map_err(|e| RpcError::Transport(format!("send failed: {e}")))?;

            loop {
                let msg = self
                    .ws
                    .next()
                    .await
                    .ok_or_else(|| RpcError::Transport("connection closed".into()))?
                    .map_err(|e| RpcError::Transport(format!("receive failed: {e}")))?;

                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => {
                        return Err(RpcError::Transport("connection closed by node".into()))
                    }
                    // Ping/pong and binary frames are not part of the
                    // request/response protocol.
                    _ => continue,
                };

                let value: Value = serde_json::from_str(&text)
                    .map_err(|e| RpcError::Transport(format!("invalid JSON response: {e}")))?;
                if value.get("id").and_then(Value::as_u64) != Some(id) {
                    continue;
                }

                if value.get("status").and_then(Value::as_str) == Some("error") {
                    let err = value
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown node error");
                    return Err(RpcError::Node(err.to_string()));
                }
                return Ok(value.get("result").cloned().unwrap_or(value));
            }
        };

        tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| RpcError::Transport(format!("request timed out: {command}")))?
    }

    /// Close the WebSocket gracefully. Errors are logged, not surfaced;
    /// the handle is unusable afterwards either way.
    pub async fn close(mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(endpoint = %self.endpoint, "close failed: {e}");
        }
    }
}

/// Owner of the single network handle and the connection state machine.
pub struct ConnectionManager {
    state: ConnectionState,
    handle: Option<NodeHandle>,
    request_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            handle: None,
            request_timeout,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.handle.is_some()
    }

    /// The endpoint of the live handle, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.handle.as_ref().map(NodeHandle::endpoint)
    }

    /// Establish the single node connection.
    ///
    /// An existing handle is closed first so at most one is ever open.
    /// On failure the state is `Error` and the error is returned.
    pub async fn connect(&mut self, endpoint: &str) -> Result<(), ClientError> {
        if let Some(existing) = self.handle.take() {
            warn!(
                old = existing.endpoint(),
                new = endpoint,
                "replacing existing connection"
            );
            existing.close().await;
        }

        self.state = ConnectionState::Connecting;
        match NodeHandle::open(endpoint, self.request_timeout).await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Error;
                Err(e)
            }
        }
    }

    /// Release the handle if present. Idempotent; always ends
    /// `Disconnected`.
    pub async fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close().await;
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Borrow the live handle, or fail with `NotReady`.
    pub fn handle_mut(&mut self) -> Result<&mut NodeHandle, ClientError> {
        if self.state != ConnectionState::Connected {
            return Err(ClientError::NotReady("not connected to a node"));
        }
        self.handle
            .as_mut()
            .ok_or(ClientError::NotReady("not connected to a node"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let mgr = ConnectionManager::new(Duration::from_secs(5));
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(!mgr.is_connected());
        assert!(mgr.endpoint().is_none());
    }

    #[tokio::test]
    async fn connect_refusal_sets_error_state() {
        let mut mgr = ConnectionManager::new(Duration::from_secs(2));
        let result = mgr.connect("ws://127.0.0.1:1").await;
        assert!(matches!(result, Err(ClientError::Connection(_))));
        assert_eq!(mgr.state(), ConnectionState::Error);
        assert!(mgr.handle_mut().is_err());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let mut mgr = ConnectionManager::new(Duration::from_secs(2));
        mgr.disconnect().await;
        mgr.disconnect().await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Connected).unwrap();
        assert_eq!(json, "\"connected\"");
    }
}
