//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (read first head, classify, pick the protocol engine)
//!     → request.rs (query parameters, request ID)
//!     → behaviors (one handler per fault scenario)
//!     → response.rs (marker bodies, 404/405 fallbacks)
//!     → websocket.rs (echo sessions after an upgrade)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{QueryParams, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServeError};
