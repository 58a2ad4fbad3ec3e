//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (port, prefix, wait, TLS paths)
//!     → validation.rs (normalize prefix, semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → BehaviorContext built from it once the port is bound
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, parse_config, ConfigError};
pub use schema::{
    BehaviorConfig, ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig, TlsConfig,
};
pub use validation::{normalize_prefix, validate_config, ValidationError};
