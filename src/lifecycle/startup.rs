//! Startup checks.
//!
//! # Responsibilities
//! - `-t`: verify the configured port can be bound, then release it
//! - Log the effective configuration once before serving

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

#[derive(Debug, Error)]
#[error("port {port} is not bindable: {source}")]
pub struct SelfTestError {
    pub port: u16,
    #[source]
    pub source: std::io::Error,
}

/// Bind `0.0.0.0:<port>` and immediately release it.
pub async fn self_test(port: u16) -> Result<(), SelfTestError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    match TcpListener::bind(addr).await {
        Ok(listener) => {
            drop(listener);
            tracing::info!(port, "Self-test passed");
            Ok(())
        }
        Err(source) => Err(SelfTestError { port, source }),
    }
}

/// One structured line describing what is about to be served.
pub fn log_effective_config(config: &ServerConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.behaviors.prefix,
        wait_secs = config.behaviors.wait_secs,
        hangup_secs = config.behaviors.hangup_secs,
        rotation = ?config.behaviors.rotation,
        idle_secs = config.timeouts.idle_secs,
        tls = config.listener.tls.is_some(),
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );
}
