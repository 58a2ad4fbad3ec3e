//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls;
use tokio_rustls::TlsAcceptor;
use wirefault::config::ServerConfig;
use wirefault::net::Listener;
use wirefault::{HttpServer, Shutdown};

/// A server running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    /// Full URL for a behavior under the default prefix.
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}/wirefault/{}", self.addr, path_and_query)
    }

    pub fn ws_url(&self, path_and_query: &str) -> String {
        format!("ws://{}/wirefault/{}", self.addr, path_and_query)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Test defaults: one-second waits and hangups keep the suite quick.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.behaviors.wait_secs = 1;
    config.behaviors.hangup_secs = 1;
    config.timeouts.idle_secs = 5;
    config
}

pub async fn start_server() -> TestServer {
    start_server_with(test_config()).await
}

pub async fn start_server_with(config: ServerConfig) -> TestServer {
    spawn_server(HttpServer::new(config)).await
}

/// A TLS server that never gets as far as choosing a certificate.
pub async fn start_tls_server_with(config: ServerConfig) -> TestServer {
    spawn_server(HttpServer::new(config).with_tls(no_certificate_acceptor())).await
}

async fn spawn_server(server: HttpServer) -> TestServer {
    let config = server.config();
    let tcp = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, config.listener.max_connections);

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(server.run(listener, receiver));

    TestServer { addr, shutdown }
}

#[derive(Debug)]
struct NoCertificate;

impl rustls::server::ResolvesServerCert for NoCertificate {
    fn resolve(&self, _: rustls::server::ClientHello<'_>) -> Option<Arc<rustls::sign::CertifiedKey>> {
        None
    }
}

fn no_certificate_acceptor() -> TlsAcceptor {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(NoCertificate));
    TlsAcceptor::from(Arc::new(config))
}

/// HTTP client that leaves encoded bodies alone.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Send a request by hand and collect every byte until the server hangs up.
pub async fn raw_exchange(addr: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut received))
        .await
        .expect("server never hung up")
        .unwrap();
    received
}

/// A minimal `GET` with `Connection: close`.
pub fn get_request(path_and_query: &str) -> String {
    format!("GET /wirefault/{path_and_query} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
}
