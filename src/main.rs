//! wirefault server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ [TLS] ──▶ read request head
//!                                                 │
//!                 ┌───────────────────────────────┼──────────────────────────┐
//!                 ▼                               ▼                          ▼
//!          raw behavior                  hyper + upgrades              hyper, one request
//!     (raw::RawWriter on the          (websocket echo sessions)     (axum router: structured
//!        bare transport)                                              behaviors, 404, 405)
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;

use wirefault::config::{self, ServerConfig, TlsConfig};
use wirefault::lifecycle::{self, signals, startup, Shutdown};
use wirefault::net::{tls, Listener};
use wirefault::observability::{logging, metrics};
use wirefault::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "wirefault", about = "HTTP fault-injection server", disable_version_flag = true)]
struct Cli {
    /// Port to listen on
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Path prefix for every behavior
    #[arg(short = 'u', long)]
    prefix: Option<String>,

    /// Default wait in seconds for delaying behaviors
    #[arg(short = 'w', long)]
    wait: Option<u64>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// PEM certificate chain; serves TLS together with --key
    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    /// PEM private key
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    /// Check that the port can be bound, then exit
    #[arg(short = 't', long)]
    self_test: bool,

    /// Print the version and exit
    #[arg(short = 'v', long)]
    version: bool,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(prefix) = self.prefix {
            config.behaviors.prefix = prefix;
        }
        if let Some(wait) = self.wait {
            config.behaviors.wait_secs = wait;
        }
        if let (Some(cert), Some(key)) = (self.cert, self.key) {
            config.listener.tls = Some(TlsConfig {
                cert_path: cert.display().to_string(),
                key_path: key.display().to_string(),
            });
        }

        config::finalize(config)
    }
}

fn port_of(config: &ServerConfig) -> u16 {
    config
        .listener
        .bind_address
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse().ok())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", wirefault::behaviors::context::server_header());
        return Ok(());
    }

    let self_test = cli.self_test;
    let config = cli.into_config()?;
    logging::init(&config.observability)?;

    if self_test {
        // An error here exits with status 1.
        lifecycle::self_test(port_of(&config)).await?;
        return Ok(());
    }

    run(config).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wirefault starting");
    startup::log_effective_config(&config);

    if config.observability.metrics_enabled {
        // Validation already checked the address parses.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = Listener::bind(&config.listener).await?;

    let mut server = HttpServer::new(config.clone());
    if let Some(tls_config) = &config.listener.tls {
        let acceptor =
            tls::load_tls_acceptor(Path::new(&tls_config.cert_path), Path::new(&tls_config.key_path)).await?;
        server = server.with_tls(acceptor);
    }

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    signals::spawn_handler(shutdown);

    server.run(listener, receiver).await?;
    Ok(())
}
