//! Motion orchestration: named effects built on tweens and timelines.
//!
//! # Invariants
//! - Reduced motion is checked once, by the orchestrator, before any effect
//!   is built; a gated effect registers nothing.
//! - Timeline offsets are applied exactly as written; only negative starts
//!   are clamped to zero.
//! - Killing a timeline kills its children; a killed animation never writes
//!   again.
//! - Looping animations run until killed.

mod easing;
mod effects;
mod engine;
mod gate;
mod orchestrator;
mod target;
mod timeline;
mod tween;

pub use easing::{EaseMode, Easing};
pub use effects::{Effect, EffectOptions};
pub use engine::{AnimationHandle, MAX_EVENTS, MotionEngine, MotionEvent};
pub use gate::MotionGate;
pub use orchestrator::{AnimationOrchestrator, Choreography, SequenceStep};
pub use target::{AnimatableTarget, Property, PropertySink, PropertyStore, TargetResolver};
pub use timeline::{Position, TimelineSpec, TimelineStep};
pub use tween::{PropertyTween, Repeat, TweenSpec};

/// Errors from building animations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    #[error("unknown easing {0:?}")]
    UnknownEasing(String),
    #[error("invalid timeline position {0:?}")]
    InvalidPosition(String),
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidTiming { field: &'static str, value: f32 },
    #[error("non-finite value for {0:?}")]
    InvalidValue(Property),
    #[error("tween animates no properties")]
    EmptyTween,
    #[error("timeline has no steps")]
    EmptyTimeline,
    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),
    #[error("invalid repeat {0:?} (expected a count or \"infinite\")")]
    InvalidRepeat(String),
    #[error("target {0:?} matched no elements")]
    UnresolvedTarget(AnimatableTarget),
}

pub fn crate_info() -> &'static str {
    "driftfield-motion v0.1.0"
}
