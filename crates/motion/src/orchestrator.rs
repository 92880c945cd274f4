use serde::{Deserialize, Serialize};

use crate::MotionError;
use crate::effects::{Effect, EffectOptions};
use crate::engine::{AnimationHandle, MotionEngine};
use crate::gate::MotionGate;
use crate::target::{AnimatableTarget, PropertySink, TargetResolver};
use crate::timeline::{Position, TimelineSpec};

/// One effect placed in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub effect: Effect,
    pub target: AnimatableTarget,
    #[serde(default)]
    pub options: EffectOptions,
    #[serde(default)]
    pub position: Position,
}

impl SequenceStep {
    pub fn new(effect: Effect, target: impl Into<AnimatableTarget>) -> Self {
        Self {
            effect,
            target: target.into(),
            options: EffectOptions::default(),
            position: Position::default(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn options(mut self, options: EffectOptions) -> Self {
        self.options = options;
        self
    }
}

/// A scripted sequence, as loaded from a choreography file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choreography {
    pub steps: Vec<SequenceStep>,
}

/// Named motion effects over a [`MotionEngine`].
///
/// Every effect goes through the [`MotionGate`] first. With reduced motion
/// an effect returns `Ok(None)` and registers nothing, so callers must treat
/// the handle as optional.
#[derive(Debug)]
pub struct AnimationOrchestrator<R> {
    engine: MotionEngine,
    resolver: R,
    gate: MotionGate,
}

impl<R: TargetResolver> AnimationOrchestrator<R> {
    pub fn new(resolver: R, gate: MotionGate) -> Self {
        Self {
            engine: MotionEngine::new(),
            resolver,
            gate,
        }
    }

    pub fn engine(&self) -> &MotionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MotionEngine {
        &mut self.engine
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    pub fn gate(&self) -> MotionGate {
        self.gate
    }

    /// Swap the gate. Turning motion off stops everything already running.
    pub fn set_gate(&mut self, gate: MotionGate) {
        if self.gate.allows_motion() && !gate.allows_motion() {
            let killed = self.engine.kill_all();
            tracing::info!(killed, "reduced motion enabled, animations stopped");
        }
        self.gate = gate;
    }

    /// Build `effect` on `target`, with `options` overriding its defaults.
    pub fn effect(
        &mut self,
        effect: Effect,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        let Some(spec) = self.gate.run(|| options.apply(effect.preset())) else {
            return Ok(None);
        };
        let _span = tracing::debug_span!("effect", name = effect.name()).entered();
        self.engine
            .tween(&target.into(), spec, &self.resolver)
            .map(Some)
    }

    pub fn fade_in(
        &mut self,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        self.effect(Effect::FadeIn, target, options)
    }

    pub fn stagger_fade_in(
        &mut self,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        self.effect(Effect::StaggerFadeIn, target, options)
    }

    pub fn breathing(
        &mut self,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        self.effect(Effect::Breathing, target, options)
    }

    pub fn float(
        &mut self,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        self.effect(Effect::Float, target, options)
    }

    pub fn glow(
        &mut self,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        self.effect(Effect::Glow, target, options)
    }

    pub fn rotate(
        &mut self,
        target: impl Into<AnimatableTarget>,
        options: EffectOptions,
    ) -> Result<Option<AnimationHandle>, MotionError> {
        self.effect(Effect::Rotate, target, options)
    }

    /// Compose effects into one timeline. The returned handle kills every
    /// step at once; step handles are available from
    /// [`MotionEngine::children`].
    pub fn sequence(
        &mut self,
        steps: &[SequenceStep],
    ) -> Result<Option<AnimationHandle>, MotionError> {
        let Some(spec) = self.gate.run(|| TimelineSpec {
            steps: steps
                .iter()
                .map(|s| crate::timeline::TimelineStep {
                    target: s.target.clone(),
                    tween: s.options.apply(s.effect.preset()),
                    position: s.position,
                })
                .collect(),
        }) else {
            return Ok(None);
        };
        self.engine.timeline(&spec, &self.resolver).map(Some)
    }

    /// Kill one handle. Accepts the optional handle effects return.
    pub fn kill(&mut self, handle: Option<AnimationHandle>) -> bool {
        handle.is_some_and(|h| self.engine.kill(h))
    }

    /// Stop everything this orchestrator started and clear the event log.
    pub fn dispose(&mut self) {
        let killed = self.engine.kill_all();
        let dropped = self.engine.drain_events().len();
        tracing::debug!(killed, dropped, "orchestrator disposed");
    }

    pub fn tick(&mut self, dt: f32, sink: &mut impl PropertySink) {
        self.engine.tick(dt, sink);
    }
}

impl<R: TargetResolver + PropertySink> AnimationOrchestrator<R> {
    /// Tick with the resolver as the sink, for headless stores.
    pub fn advance(&mut self, dt: f32) {
        self.engine.tick(dt, &mut self.resolver);
    }
}
