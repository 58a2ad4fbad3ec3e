//! Rotating key-set state.
//!
//! # Responsibilities
//! - Own the per-server rotation counter
//! - Map counter values to the four rotation stages
//! - Select the payload for a stage from a fixed candidate set
//!
//! # Design Decisions
//! - The counter lives in server state, never in a global
//! - `Racy` mode keeps the unsynchronized load/store pair so concurrent
//!   callers can observe skipped or repeated values; `Serialized` makes
//!   every step atomic

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// How the counter is advanced under concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    #[default]
    Racy,
    Serialized,
}

/// Stage of the rotation cycle a counter value maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStage {
    /// First key set.
    Initial,
    /// The key has been replaced.
    Rotated,
    /// A deliberately broken intermediate key set.
    Intermediate,
    /// Two fresh keys; the cycle stays here until reset.
    Steady,
}

impl RotationStage {
    pub fn for_value(value: u64) -> Self {
        match value {
            0 | 1 => RotationStage::Initial,
            2 => RotationStage::Rotated,
            3 => RotationStage::Intermediate,
            _ => RotationStage::Steady,
        }
    }
}

/// The counter behind a rotating endpoint.
#[derive(Debug, Default)]
pub struct RotationCounter {
    value: AtomicU64,
    mode: RotationMode,
}

impl RotationCounter {
    pub fn new(mode: RotationMode) -> Self {
        Self {
            value: AtomicU64::new(0),
            mode,
        }
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Advance the counter by one, optionally resetting it to zero first.
    /// Returns the value served to this request.
    pub fn advance(&self, reset: bool) -> u64 {
        match self.mode {
            RotationMode::Racy => {
                if reset {
                    self.value.store(0, Ordering::Relaxed);
                }
                let next = self.value.load(Ordering::Relaxed).wrapping_add(1);
                self.value.store(next, Ordering::Relaxed);
                next
            }
            RotationMode::Serialized => {
                if reset {
                    self.value.store(1, Ordering::SeqCst);
                    1
                } else {
                    self.value.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
                }
            }
        }
    }

    pub fn next_stage(&self, reset: bool) -> (u64, RotationStage) {
        let value = self.advance(reset);
        (value, RotationStage::for_value(value))
    }
}

/// One payload per rotation stage.
#[derive(Debug, Clone, Copy)]
pub struct RotationSet<T: 'static> {
    pub initial: T,
    pub rotated: T,
    pub intermediate: T,
    pub steady: T,
}

impl<T: Copy> RotationSet<T> {
    pub fn select(&self, stage: RotationStage) -> T {
        match stage {
            RotationStage::Initial => self.initial,
            RotationStage::Rotated => self.rotated,
            RotationStage::Intermediate => self.intermediate,
            RotationStage::Steady => self.steady,
        }
    }
}
