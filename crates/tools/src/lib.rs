//! Developer tooling: field and motion inspectors.
//!
//! # Invariants
//! - Inspectors are read-only; they never change what they observe.

mod inspector;

pub use inspector::{FieldInspector, FieldSummary, InstanceInfo, MotionSummary};

pub fn crate_info() -> &'static str {
    "driftfield-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
