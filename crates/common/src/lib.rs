//! Shared value types for the driftfield engine.
//!
//! # Invariants
//! - Colour interpolation factors are clamped to `[0, 1]`.
//! - Phase generation is seed-deterministic and never touches wall-clock time.

mod rng;
mod types;

pub use rng::{Lcg, LcgParams};
pub use types::{Color, ParseColorError};

pub fn crate_info() -> &'static str {
    "driftfield-common v0.1.0"
}
