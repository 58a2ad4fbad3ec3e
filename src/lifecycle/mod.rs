//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse CLI → Load config → Validate → Init logging/metrics → Bind → Serve
//!     -t: bind check only, then exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → accept loop stops → in-flight connections finish on their own
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind failure at startup is fatal
//! - No drain deadline: slow behaviors are expected to outlive the listener

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{self_test, SelfTestError};
