//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → tls.rs (optional TLS handshake)
//!     → connection.rs (lifecycle tracking)
//!     → head.rs (read the request head without consuming the connection)
//!     → either the raw writer on the bare stream
//!       or rewind.rs replaying the head into hyper
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - The first request head decides who owns the connection
//! - TLS is optional and handled transparently

pub mod connection;
pub mod head;
pub mod listener;
pub mod rewind;
pub mod tls;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use head::{read_head, HeadError, RequestHead};
pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use rewind::Rewind;
