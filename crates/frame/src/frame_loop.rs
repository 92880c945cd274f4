use std::fmt;

use crate::FrameError;

/// Identifier of a pending frame request issued by a [`FrameSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(pub u64);

/// The host's animation-frame primitive.
///
/// A request is a one-shot registration: the host calls back once, and the
/// loop re-requests if it wants another frame.
pub trait FrameSource {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Lifecycle of a frame loop.
///
/// ```text
/// Idle --start--> Running --pause--> Paused --resume--> Running
///   \                |                  |
///    +-----------dispose------------dispose--> Disposed (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Idle,
    Running,
    Paused,
    Disposed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Explicit state machine around a host frame source.
///
/// Owns at most one pending request at a time. Pausing and disposing cancel
/// that request synchronously; a disposed loop can never run again.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    pending: Option<FrameRequestId>,
    frames_accepted: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            pending: None,
            frames_accepted: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn pending_request(&self) -> Option<FrameRequestId> {
        self.pending
    }

    /// Frames delivered to [`FrameLoop::on_frame`] while running.
    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted
    }

    /// Move `from -> to`, failing unless the loop is currently in `from`.
    fn transition(&mut self, from: LoopState, to: LoopState) -> Result<(), FrameError> {
        if self.state != from {
            return Err(FrameError::IllegalTransition {
                from: self.state,
                to,
            });
        }
        tracing::trace!(from = %self.state, %to, "frame loop transition");
        self.state = to;
        Ok(())
    }

    /// Idle -> Running. Requests the first frame.
    pub fn start(&mut self, source: &mut impl FrameSource) -> Result<(), FrameError> {
        self.transition(LoopState::Idle, LoopState::Running)?;
        self.pending = Some(source.request_frame());
        Ok(())
    }

    /// Running -> Paused. Cancels the pending request.
    pub fn pause(&mut self, source: &mut impl FrameSource) -> Result<(), FrameError> {
        self.transition(LoopState::Running, LoopState::Paused)?;
        self.cancel_pending(source);
        Ok(())
    }

    /// Paused -> Running. Requests a fresh frame.
    pub fn resume(&mut self, source: &mut impl FrameSource) -> Result<(), FrameError> {
        self.transition(LoopState::Paused, LoopState::Running)?;
        self.pending = Some(source.request_frame());
        Ok(())
    }

    /// Any live state -> Disposed. Cancels the pending request. Disposing twice
    /// is a no-op rather than an error, so teardown paths can be idempotent.
    pub fn dispose(&mut self, source: &mut impl FrameSource) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.cancel_pending(source);
        self.state = LoopState::Disposed;
        tracing::trace!("frame loop disposed");
    }

    /// Called by the host when frame `id` fires. Returns true when the loop is
    /// running and the caller should consider doing work; the next frame is
    /// requested before returning. Stale or unexpected frames return false.
    pub fn on_frame(&mut self, id: FrameRequestId, source: &mut impl FrameSource) -> bool {
        if self.state != LoopState::Running || self.pending != Some(id) {
            return false;
        }
        self.frames_accepted += 1;
        self.pending = Some(source.request_frame());
        true
    }

    fn cancel_pending(&mut self, source: &mut impl FrameSource) {
        if let Some(id) = self.pending.take() {
            source.cancel_frame(id);
        }
    }
}

/// Deterministic frame source for headless runs and tests.
///
/// Requests are queued; [`ManualFrameSource::fire`] hands back the oldest one.
#[derive(Debug, Default)]
pub struct ManualFrameSource {
    next_id: u64,
    queued: Vec<FrameRequestId>,
    requested: u64,
    cancelled: u64,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest outstanding request, as if the host delivered it.
    pub fn fire(&mut self) -> Option<FrameRequestId> {
        if self.queued.is_empty() {
            None
        } else {
            Some(self.queued.remove(0))
        }
    }

    pub fn outstanding(&self) -> usize {
        self.queued.len()
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameSource for ManualFrameSource {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.queued.push(id);
        self.requested += 1;
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        let before = self.queued.len();
        self.queued.retain(|q| *q != id);
        if self.queued.len() != before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let lp = FrameLoop::new();
        assert_eq!(lp.state(), LoopState::Idle);
        assert!(lp.pending_request().is_none());
    }

    #[test]
    fn start_requests_a_frame() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        lp.start(&mut src).unwrap();
        assert!(lp.is_running());
        assert_eq!(src.outstanding(), 1);
    }

    #[test]
    fn on_frame_rerequests_while_running() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        lp.start(&mut src).unwrap();
        for _ in 0..5 {
            let id = src.fire().unwrap();
            assert!(lp.on_frame(id, &mut src));
        }
        assert_eq!(lp.frames_accepted(), 5);
        assert_eq!(src.outstanding(), 1);
        assert_eq!(src.requested(), 6);
    }

    #[test]
    fn pause_cancels_and_resume_rerequests() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        lp.start(&mut src).unwrap();
        lp.pause(&mut src).unwrap();
        assert_eq!(src.outstanding(), 0);
        assert_eq!(src.cancelled(), 1);

        lp.resume(&mut src).unwrap();
        assert_eq!(src.outstanding(), 1);
    }

    #[test]
    fn stale_frame_after_pause_is_ignored() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        lp.start(&mut src).unwrap();
        let stale = lp.pending_request().unwrap();
        lp.pause(&mut src).unwrap();
        assert!(!lp.on_frame(stale, &mut src));
        assert_eq!(src.outstanding(), 0);
    }

    #[test]
    fn illegal_transitions_rejected() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        assert!(matches!(
            lp.pause(&mut src),
            Err(FrameError::IllegalTransition {
                from: LoopState::Idle,
                to: LoopState::Paused
            })
        ));
        assert!(lp.resume(&mut src).is_err());
        lp.start(&mut src).unwrap();
        assert!(lp.start(&mut src).is_err());
    }

    #[test]
    fn resume_requires_pause() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        assert!(matches!(
            lp.resume(&mut src),
            Err(FrameError::IllegalTransition {
                from: LoopState::Idle,
                to: LoopState::Running
            })
        ));
        assert_eq!(lp.state(), LoopState::Idle);
        assert_eq!(src.requested(), 0);

        lp.start(&mut src).unwrap();
        assert!(lp.resume(&mut src).is_err());
        assert_eq!(src.outstanding(), 1);

        lp.pause(&mut src).unwrap();
        assert!(lp.start(&mut src).is_err());
        lp.resume(&mut src).unwrap();
        assert!(lp.is_running());
    }

    #[test]
    fn disposed_loop_never_resumes() {
        let mut src = ManualFrameSource::new();
        let mut lp = FrameLoop::new();
        lp.start(&mut src).unwrap();
        let id = lp.pending_request().unwrap();
        lp.dispose(&mut src);

        assert_eq!(lp.state(), LoopState::Disposed);
        assert_eq!(src.outstanding(), 0);
        assert!(lp.start(&mut src).is_err());
        assert!(lp.resume(&mut src).is_err());
        assert!(!lp.on_frame(id, &mut src));
        assert_eq!(src.requested(), 1);

        // idempotent
        lp.dispose(&mut src);
        assert_eq!(src.cancelled(), 1);
    }
}
