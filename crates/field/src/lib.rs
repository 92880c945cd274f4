//! Instanced fields: grids and particle rings animated per frame and written
//! to an instance surface in one batch.
//!
//! # Invariants
//! - Each instance is written at most once per pass, followed by one commit.
//! - Instance identity (index, phase, base scale, ring) is fixed at
//!   construction and survives resize.
//! - The same seed and topology always produce the same field.
//! - A single bad instance is skipped; it never aborts the pass.
//! - Nothing is written while hidden or after disposal.

mod activation;
mod animator;
mod config;
mod instance;
mod renderer;
mod surface;
mod topology;

pub use activation::{activation, breathing, color_mix, edge_fade};
pub use animator::{FieldAnimator, FrameOutcome};
pub use config::{
    ConfigError, FadeBand, FieldConfig, MAX_INSTANCES, PointerMapping, SceneConfig, TopologyConfig,
};
pub use instance::{InstanceRecord, build_records};
pub use renderer::{FrameReport, InstancedFieldRenderer};
pub use surface::{InstanceSurface, RecordingSurface, SurfaceError};
pub use topology::{FieldExtent, Topology, Viewport};

/// Errors from building or driving a field.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Frame(#[from] driftfield_frame::FrameError),
}

pub fn crate_info() -> &'static str {
    "driftfield-field v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("field"));
    }

    #[test]
    fn viewport_error_message() {
        let err = FieldError::InvalidViewport {
            width: 0.0,
            height: 10.0,
        };
        assert_eq!(err.to_string(), "invalid viewport 0x10");
    }
}
