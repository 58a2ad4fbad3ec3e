//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every log line carries structured fields, never interpolated text
//! - `X-Request-Id` is logged for every served behavior (`none` if absent)
//! - Metric updates are atomic increments and never fail

pub mod logging;
pub mod metrics;
