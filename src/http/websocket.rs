//! WebSocket echo sessions.
//!
//! # Responsibilities
//! - Upgrade the connection, logging failures without affecting the server
//! - Echo each text or binary message `n` times with the same opcode
//! - Close the way the client asked: a close frame, a dropped socket, both,
//!   or neither
//!
//! # Data Flow
//! ```text
//! GET <prefix>websocket?n=3&c1
//!     → SessionConfig::from_query
//!     → WebSocketUpgrade (101)
//!     → WebSocketSession::run (one task per session)
//!         recv → echo ×n → [stop after first message if a close mode is set]
//!     → finish (exactly once): close frame? then drop or linger
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::http::request::QueryParams;
use crate::http::server::AppState;
use crate::observability::metrics;

/// How a session ends once it stops echoing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Wait for the peer to go away.
    None,
    /// Send a close frame but leave the socket open.
    ProtocolOnly,
    /// Drop the socket without a close frame.
    SocketOnly,
    /// Send a close frame, then drop the socket.
    Both,
}

impl CloseMode {
    pub fn from_flags(protocol: bool, socket: bool) -> Self {
        match (protocol, socket) {
            (true, true) => CloseMode::Both,
            (true, false) => CloseMode::ProtocolOnly,
            (false, true) => CloseMode::SocketOnly,
            (false, false) => CloseMode::None,
        }
    }

    pub fn sends_close_frame(self) -> bool {
        matches!(self, CloseMode::ProtocolOnly | CloseMode::Both)
    }

    pub fn closes_socket(self) -> bool {
        matches!(self, CloseMode::SocketOnly | CloseMode::Both)
    }

    pub fn is_set(self) -> bool {
        self != CloseMode::None
    }
}

/// Per-session settings taken from the upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Echoes per inbound message, at least 1.
    pub echo: usize,
    pub close: CloseMode,
}

impl SessionConfig {
    /// `n` sets the echo count (unparsable → 1, clamped to ≥ 1); `c` asks
    /// for both closes, `c1` for the close frame, `c2` for the socket.
    pub fn from_query(query: &QueryParams) -> Self {
        let echo = match query.int("n") {
            Some(Ok(n)) if n >= 1 => usize::try_from(n).unwrap_or(1),
            _ => 1,
        };
        let both = query.contains("c");
        Self {
            echo,
            close: CloseMode::from_flags(both || query.contains("c1"), both || query.contains("c2")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            echo: 1,
            close: CloseMode::None,
        }
    }
}

pub async fn websocket(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    query: QueryParams,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let config = SessionConfig::from_query(&query);
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::warn!(peer = %peer, error = %rejection, "WebSocket upgrade failed");
            return rejection.into_response();
        }
    };

    metrics::record_behavior("websocket");
    let linger = state.ctx.idle;
    upgrade
        .on_failed_upgrade(move |error| {
            tracing::warn!(peer = %peer, error = %error, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| async move {
            WebSocketSession::new(peer, config, linger).run(socket).await;
        })
}

/// One upgraded connection.
pub struct WebSocketSession {
    id: Uuid,
    peer: SocketAddr,
    config: SessionConfig,
    /// Effective close mode; a peer close upgrades it to `Both`.
    close: CloseMode,
    linger: Duration,
}

impl WebSocketSession {
    pub fn new(peer: SocketAddr, config: SessionConfig, linger: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            config,
            close: config.close,
            linger,
        }
    }

    pub async fn run(mut self, mut socket: WebSocket) {
        metrics::websocket_session_opened();
        tracing::info!(
            session = %self.id,
            peer = %self.peer,
            echo = self.config.echo,
            close = ?self.config.close,
            "WebSocket session started"
        );

        loop {
            let message = match socket.recv().await {
                None => {
                    tracing::info!(session = %self.id, "Peer hung up");
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(session = %self.id, error = %e, "Error reading websocket message");
                    break;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(session = %self.id, frame = ?frame, "Peer closed the protocol");
                    self.close = CloseMode::Both;
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(message)) => message,
            };

            if !self.echo(&mut socket, message).await {
                break;
            }
            if self.config.close.is_set() {
                break;
            }
        }

        self.finish(socket).await;
        metrics::websocket_session_closed();
    }

    /// Send `message` back `n` times. Returns false once a write fails.
    async fn echo(&self, socket: &mut WebSocket, message: Message) -> bool {
        for round in 1..=self.config.echo {
            if let Err(e) = socket.send(message.clone()).await {
                tracing::warn!(session = %self.id, error = %e, round, "Error writing websocket message");
                return false;
            }
            tracing::debug!(session = %self.id, round, "Echoed message");
        }
        true
    }

    /// Runs once per session, consuming it.
    async fn finish(self, mut socket: WebSocket) {
        if self.close.sends_close_frame() {
            let frame = CloseFrame {
                code: close_code::NORMAL,
                reason: Utf8Bytes::from_static("close requested"),
            };
            match socket.send(Message::Close(Some(frame))).await {
                Ok(()) => tracing::info!(session = %self.id, "Sent close frame"),
                Err(e) => tracing::info!(session = %self.id, error = %e, "Protocol already closed"),
            }
        }

        if self.close.closes_socket() {
            drop(socket);
            tracing::info!(session = %self.id, "Socket closed");
        } else if self.close.sends_close_frame() {
            // Keep the transport until the peer lets go.
            let drained = tokio::time::timeout(self.linger, async {
                while let Some(Ok(_)) = socket.recv().await {}
            })
            .await;
            if drained.is_err() {
                tracing::debug!(session = %self.id, "Linger timed out");
            }
        }

        tracing::info!(session = %self.id, "WebSocket session ended");
    }
}
