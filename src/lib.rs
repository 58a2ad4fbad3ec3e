//! wirefault: an HTTP/WebSocket server that misbehaves on request.
//!
//! Each endpoint under the configured prefix reproduces one scenario a
//! client must survive: slow or missing headers, truncated bodies, bogus
//! lengths, broken compression, rotating key sets, abrupt hangups.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Behaviors and their building blocks
pub mod behaviors;
pub mod codec;
pub mod raw;
pub mod rotation;
pub mod timing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
