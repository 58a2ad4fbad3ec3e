//! Timing controls shared by the delay behaviors.
//!
//! Every behavior that pauses mid-response asks the [`WaitResolver`] how long
//! to pause. The resolver owns the configured default and the rules for
//! honoring a per-request `wait` override.

pub mod wait;

pub use wait::WaitResolver;
