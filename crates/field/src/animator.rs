use driftfield_frame::{FrameLoop, FrameRequestId, FrameSource, FrameStats, FrameThrottle, LoopState};
use driftfield_profile::QualitySettings;
use driftfield_visibility::VisibilitySignal;
use glam::Vec2;

use crate::FieldError;
use crate::config::FieldConfig;
use crate::renderer::{FrameReport, InstancedFieldRenderer};
use crate::surface::InstanceSurface;
use crate::topology::Viewport;

/// What happened to one delivered animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered(FrameReport),
    /// Too soon after the last rendered frame.
    Throttled,
    /// Out of view; the loop paused itself.
    Hidden,
    /// Not running, or a stale request.
    Inactive,
}

/// A field renderer driven by a frame loop, gated by a throttle and by
/// viewport visibility.
///
/// Visibility is the conjunction of the host's [`FieldAnimator::set_visible`]
/// flag and the observed [`VisibilitySignal`]. While not visible the loop
/// holds no frame request and nothing is written.
#[derive(Debug)]
pub struct FieldAnimator {
    renderer: InstancedFieldRenderer,
    frame_loop: FrameLoop,
    throttle: FrameThrottle,
    signal: VisibilitySignal,
    host_visible: bool,
    stats: FrameStats,
    origin_ms: Option<f64>,
}

impl FieldAnimator {
    /// `fps_cap` further limits the tier's frame rate; it never raises it.
    pub fn new(
        config: FieldConfig,
        settings: &QualitySettings,
        viewport: Viewport,
        fps_cap: Option<u32>,
    ) -> Result<Self, FieldError> {
        let fps = fps_cap.map_or(settings.max_fps, |cap| cap.min(settings.max_fps));
        let throttle = FrameThrottle::new(fps)?;
        let renderer = InstancedFieldRenderer::new(config, settings, viewport)?;
        Ok(Self {
            renderer,
            frame_loop: FrameLoop::new(),
            throttle,
            signal: VisibilitySignal::always_visible(),
            host_visible: true,
            stats: FrameStats::new(120),
            origin_ms: None,
        })
    }

    /// Gate frames on an observed element's visibility.
    pub fn with_visibility(mut self, signal: VisibilitySignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn renderer(&self) -> &InstancedFieldRenderer {
        &self.renderer
    }

    pub fn state(&self) -> LoopState {
        self.frame_loop.state()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn target_fps(&self) -> u32 {
        self.throttle.target_fps()
    }

    pub fn is_visible(&self) -> bool {
        self.host_visible && self.signal.is_in_view()
    }

    /// Begin the loop. An animator that starts out of view parks in `Paused`
    /// without a pending request.
    pub fn start(&mut self, source: &mut impl FrameSource) -> Result<(), FieldError> {
        self.frame_loop.start(source)?;
        if !self.is_visible() {
            self.frame_loop.pause(source)?;
        }
        tracing::debug!(state = %self.frame_loop.state(), fps = self.target_fps(), "field animator started");
        Ok(())
    }

    /// Host callback for frame `id` at timestamp `now_ms`.
    pub fn on_animation_frame(
        &mut self,
        id: FrameRequestId,
        now_ms: f64,
        source: &mut impl FrameSource,
        surface: &mut impl InstanceSurface,
    ) -> FrameOutcome {
        if !self.frame_loop.is_running() {
            return FrameOutcome::Inactive;
        }
        if !self.is_visible() {
            // the observed signal flipped without a sync; stop requesting
            if let Err(err) = self.frame_loop.pause(source) {
                tracing::warn!(%err, "could not pause hidden field");
            }
            return FrameOutcome::Hidden;
        }
        if !self.frame_loop.on_frame(id, source) {
            return FrameOutcome::Inactive;
        }
        if !self.throttle.should_run(now_ms) {
            return FrameOutcome::Throttled;
        }

        self.stats.record_frame(now_ms);
        let origin = *self.origin_ms.get_or_insert(now_ms);
        let elapsed = ((now_ms - origin) / 1000.0) as f32;
        FrameOutcome::Rendered(self.renderer.update(elapsed, surface))
    }

    /// Host-level visibility (window occluded, tab hidden). Pauses or resumes
    /// the loop; a no-op before start and after disposal.
    pub fn set_visible(
        &mut self,
        visible: bool,
        source: &mut impl FrameSource,
    ) -> Result<(), FieldError> {
        self.host_visible = visible;
        self.sync_visibility(source)
    }

    /// Re-read the observed signal after a visibility controller pass.
    pub fn sync_visibility(&mut self, source: &mut impl FrameSource) -> Result<(), FieldError> {
        match (self.frame_loop.state(), self.is_visible()) {
            (LoopState::Running, false) => {
                self.frame_loop.pause(source)?;
                tracing::debug!("field hidden, loop paused");
            }
            (LoopState::Paused, true) => {
                self.frame_loop.resume(source)?;
                tracing::debug!("field visible, loop resumed");
            }
            _ => {}
        }
        Ok(())
    }

    pub fn set_pointer(&mut self, ndc: Option<Vec2>) {
        self.renderer.set_pointer(ndc);
    }

    pub fn resize(&mut self, viewport: Viewport) -> Result<(), FieldError> {
        self.renderer.resize(viewport)
    }

    /// Cancel the pending frame and drop the field. Idempotent.
    pub fn dispose(&mut self, source: &mut impl FrameSource) {
        self.frame_loop.dispose(source);
        self.renderer.dispose();
    }
}
