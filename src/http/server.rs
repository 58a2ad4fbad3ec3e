//! HTTP server setup and connection dispatch.
//!
//! # Responsibilities
//! - Accept connections through the bounded listener
//! - Terminate TLS when configured, bounded by the idle timeout
//! - Read the first request head and classify the connection
//! - Hand raw behaviors the bare transport
//! - Serve everything else with hyper and the axum router
//!
//! # Design Decisions
//! - Standard connections serve one request with keep-alive off, so every
//!   request is classified before hyper sees it
//! - Upgrade connections keep hyper's upgrade machinery and keep-alive
//! - Bytes read while classifying are replayed to hyper unchanged

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::{Extension, Router};
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;

use crate::behaviors::{self, BehaviorContext, Dispatch, Registry};
use crate::codec::CodecSet;
use crate::config::ServerConfig;
use crate::net::connection::ConnectionMode;
use crate::net::head::MAX_HEAD_BYTES;
use crate::net::{read_head, ConnectionId, ConnectionTracker, HeadError, Listener, RequestHead, Rewind};
use crate::observability::metrics;
use crate::rotation::RotationCounter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<BehaviorContext>,
    pub codecs: Arc<CodecSet>,
    pub rotation: Arc<RotationCounter>,
}

impl AppState {
    pub fn new(ctx: Arc<BehaviorContext>, config: &ServerConfig) -> Self {
        Self {
            ctx,
            codecs: Arc::new(CodecSet::new()),
            rotation: Arc::new(RotationCounter::new(config.behaviors.rotation)),
        }
    }
}

/// Error type for the server loop.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to read listener address: {0}")]
    LocalAddr(#[from] std::io::Error),
}

/// The fault-injection HTTP server.
pub struct HttpServer {
    config: ServerConfig,
    tls: Option<TlsAcceptor>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config, tls: None }
    }

    /// Serve every connection over TLS.
    pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls = Some(acceptor);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        let ctx = Arc::new(BehaviorContext::from_config(&self.config, addr.port()));
        let dispatcher = Arc::new(Dispatcher::new(ctx, &self.config));

        tracing::info!(
            address = %addr,
            prefix = %dispatcher.registry.context().prefix,
            behaviors = dispatcher.registry.len(),
            tls = self.tls.is_some(),
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let dispatcher = Arc::clone(&dispatcher);
                        let tls = self.tls.clone();
                        tokio::spawn(async move {
                            let _permit = permit;
                            dispatcher.handle(stream, peer, tls).await;
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
                _ = shutdown.recv() => {
                    tracing::info!(
                        active_connections = dispatcher.tracker.active_count(),
                        "Shutdown signal received, no longer accepting"
                    );
                    break;
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Per-server connection handling shared by every connection task.
struct Dispatcher {
    registry: Registry,
    router: Router,
    tracker: ConnectionTracker,
}

impl Dispatcher {
    fn new(ctx: Arc<BehaviorContext>, config: &ServerConfig) -> Self {
        let state = AppState::new(Arc::clone(&ctx), config);
        let registry = Registry::new(ctx, behaviors::registry());
        let router = registry.router(state);
        Self {
            registry,
            router,
            tracker: ConnectionTracker::new(),
        }
    }

    async fn handle(&self, stream: TcpStream, peer: SocketAddr, tls: Option<TlsAcceptor>) {
        let guard = self.tracker.track();
        let id = guard.id();

        let idle = self.registry.context().idle;
        match tls {
            Some(acceptor) => match tokio::time::timeout(idle, acceptor.accept(stream)).await {
                Ok(Ok(stream)) => self.dispatch(stream, peer, id).await,
                Ok(Err(e)) => tracing::warn!(connection_id = %id, peer = %peer, error = %e, "TLS handshake failed"),
                Err(_) => tracing::debug!(
                    connection_id = %id,
                    peer = %peer,
                    idle_secs = idle.as_secs(),
                    "Idle timeout during TLS handshake"
                ),
            },
            None => self.dispatch(stream, peer, id).await,
        }
    }

    async fn dispatch<S>(&self, mut stream: S, peer: SocketAddr, id: ConnectionId)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let idle = self.registry.context().idle;
        let buffered = match tokio::time::timeout(idle, read_head(&mut stream, MAX_HEAD_BYTES)).await {
            Ok(Ok(buffered)) => buffered,
            Ok(Err(HeadError::Closed)) => {
                tracing::trace!(connection_id = %id, "Closed before sending a request");
                return;
            }
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %id, error = %e, "Failed to read request head");
                return;
            }
            Err(_) => {
                tracing::debug!(connection_id = %id, idle_secs = idle.as_secs(), "Idle timeout before request head");
                let _ = stream.shutdown().await;
                return;
            }
        };

        // A head we cannot parse still goes to hyper, which answers 400.
        let dispatch = match RequestHead::parse(&buffered) {
            Ok(head) => match self.registry.classify(&head) {
                Dispatch::Raw(behavior) => {
                    tracing::debug!(connection_id = %id, peer = %peer, behavior = behavior.name(), "Raw dispatch");
                    metrics::record_connection(ConnectionMode::Raw.as_str());
                    behavior.serve(self.registry.context(), &head, stream).await;
                    return;
                }
                Dispatch::Upgrade => ConnectionMode::Upgrade,
                Dispatch::Standard => ConnectionMode::Standard,
            },
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Unparsable request head");
                ConnectionMode::Standard
            }
        };

        metrics::record_connection(dispatch.as_str());
        let io = Rewind::new(buffered.freeze(), stream);
        self.serve_hyper(io, peer, id, dispatch == ConnectionMode::Upgrade).await;
    }

    async fn serve_hyper<S>(&self, io: Rewind<S>, peer: SocketAddr, id: ConnectionId, upgrades: bool)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let service = TowerToHyperService::new(self.router.clone().layer(Extension(ConnectInfo(peer))));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.registry.context().idle);

        let result = if upgrades {
            builder
                .serve_connection(TokioIo::new(io), service)
                .with_upgrades()
                .await
        } else {
            builder
                .keep_alive(false)
                .serve_connection(TokioIo::new(io), service)
                .await
        };

        if let Err(e) = result {
            tracing::debug!(connection_id = %id, peer = %peer, error = %e, "Connection ended with error");
        }
    }
}
