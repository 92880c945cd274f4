//! Frame gating: decides whether a host frame's work should run.
//!
//! # Invariants
//! - Gates only decide; they never queue or replay skipped frames.
//! - The throttle carries the interval remainder forward, so the achieved rate
//!   does not drift below the target.
//! - A disposed frame loop holds no pending request and never runs again.

mod frame_loop;
mod stats;
mod throttle;

pub use frame_loop::{FrameLoop, FrameRequestId, FrameSource, LoopState, ManualFrameSource};
pub use stats::FrameStats;
pub use throttle::{FrameThrottle, create_throttle};

/// Errors from frame gating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("target frame rate must be positive, got {0}")]
    InvalidTargetRate(u32),
    #[error("illegal frame loop transition: {from} -> {to}")]
    IllegalTransition { from: LoopState, to: LoopState },
}

pub fn crate_info() -> &'static str {
    "driftfield-frame v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("frame"));
    }

    #[test]
    fn error_messages_name_states() {
        let err = FrameError::IllegalTransition {
            from: LoopState::Disposed,
            to: LoopState::Running,
        };
        assert_eq!(
            err.to_string(),
            "illegal frame loop transition: disposed -> running"
        );
    }
}
