//! Viewport visibility: edge-triggered in-view signals for animated elements.
//!
//! # Invariants
//! - Callbacks fire only when an element's boolean state flips.
//! - Each element transitions independently, even over a shared backend.
//! - A host without an intersection primitive never pauses anything: its
//!   elements report visible.

mod backend;
mod controller;
mod geometry;

pub use backend::{IntersectionBackend, IntersectionEntry, NoIntersection, ViewportIntersector};
pub use controller::{
    ElementId, ObserveOptions, Transition, VisibilityCallbacks, VisibilityController,
    VisibilitySignal,
};
pub use geometry::{Rect, RootMargin};

/// Errors from visibility observation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VisibilityError {
    #[error("viewport intersection is not supported by this host")]
    Unsupported,
    #[error("element {0:?} is already observed")]
    AlreadyObserved(ElementId),
    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),
    #[error("invalid root margin {0:?}")]
    InvalidMargin(String),
}

pub fn crate_info() -> &'static str {
    "driftfield-visibility v0.1.0"
}
