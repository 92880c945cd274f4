use std::collections::{BTreeMap, VecDeque};

use driftfield_visibility::ElementId;
use serde::Serialize;

use crate::MotionError;
use crate::target::{AnimatableTarget, PropertySink, TargetResolver};
use crate::timeline::TimelineSpec;
use crate::tween::TweenSpec;

/// Opaque reference to a running tween or timeline.
///
/// Animations stay registered until they finish or are killed through
/// [`MotionEngine::kill`]; dropping the handle does not stop them.
#[must_use = "a looping animation runs until its handle is killed"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Lifecycle record emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionEvent {
    Started {
        handle: AnimationHandle,
        targets: usize,
    },
    Completed(AnimationHandle),
    Killed(AnimationHandle),
}

#[derive(Debug)]
struct TweenState {
    targets: Vec<ElementId>,
    spec: TweenSpec,
    /// Seconds since this tween's start; negative while a timeline child
    /// waits for its slot.
    elapsed: f32,
    parent: Option<AnimationHandle>,
}

#[derive(Debug)]
struct TimelineState {
    children: Vec<AnimationHandle>,
    elapsed: f32,
}

#[derive(Debug)]
enum Animation {
    Tween(TweenState),
    Timeline(TimelineState),
}

/// Lifecycle events kept before the oldest are dropped.
pub const MAX_EVENTS: usize = 256;

/// Registry of running animations, advanced by the host's frame callback.
///
/// Animations are applied in creation order, so a later animation of the same
/// property wins within a tick.
#[derive(Debug, Default)]
pub struct MotionEngine {
    next_id: u64,
    animations: BTreeMap<AnimationHandle, Animation>,
    events: VecDeque<MotionEvent>,
}

impl MotionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, event: MotionEvent) {
        if self.events.len() == MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn allocate(&mut self) -> AnimationHandle {
        self.next_id += 1;
        AnimationHandle(self.next_id)
    }

    fn resolve_targets(
        target: &AnimatableTarget,
        resolver: &impl TargetResolver,
    ) -> Result<Vec<ElementId>, MotionError> {
        let targets = target.resolve(resolver);
        if targets.is_empty() {
            return Err(MotionError::UnresolvedTarget(target.clone()));
        }
        Ok(targets)
    }

    /// Register a standalone tween.
    pub fn tween(
        &mut self,
        target: &AnimatableTarget,
        spec: TweenSpec,
        resolver: &impl TargetResolver,
    ) -> Result<AnimationHandle, MotionError> {
        spec.validate()?;
        let targets = Self::resolve_targets(target, resolver)?;
        let handle = self.allocate();
        tracing::debug!(
            handle = handle.id(),
            targets = targets.len(),
            duration = spec.duration,
            easing = %spec.easing,
            "tween registered"
        );
        self.record(MotionEvent::Started {
            handle,
            targets: targets.len(),
        });
        self.animations.insert(
            handle,
            Animation::Tween(TweenState {
                targets,
                spec,
                elapsed: 0.0,
                parent: None,
            }),
        );
        Ok(handle)
    }

    /// Register a timeline and one child tween per step. Either every step is
    /// registered or none is.
    pub fn timeline(
        &mut self,
        spec: &TimelineSpec,
        resolver: &impl TargetResolver,
    ) -> Result<AnimationHandle, MotionError> {
        if spec.steps.is_empty() {
            return Err(MotionError::EmptyTimeline);
        }
        let mut resolved = Vec::with_capacity(spec.steps.len());
        for step in &spec.steps {
            step.tween.validate()?;
            resolved.push(Self::resolve_targets(&step.target, resolver)?);
        }
        let counts: Vec<usize> = resolved.iter().map(Vec::len).collect();
        let starts = spec.schedule(&counts);

        let timeline = self.allocate();
        let mut children = Vec::with_capacity(spec.steps.len());
        for ((step, targets), start) in spec.steps.iter().zip(resolved).zip(starts) {
            let child = self.allocate();
            tracing::trace!(timeline = timeline.id(), child = child.id(), start, "timeline step");
            self.animations.insert(
                child,
                Animation::Tween(TweenState {
                    targets,
                    spec: step.tween.clone(),
                    elapsed: -start,
                    parent: Some(timeline),
                }),
            );
            children.push(child);
        }
        tracing::debug!(handle = timeline.id(), steps = children.len(), "timeline registered");
        self.record(MotionEvent::Started {
            handle: timeline,
            targets: counts.iter().sum(),
        });
        self.animations.insert(
            timeline,
            Animation::Timeline(TimelineState {
                children,
                elapsed: 0.0,
            }),
        );
        Ok(timeline)
    }

    /// Advance every animation by `dt` seconds and write current values.
    /// Finite animations that finish are retired after their final write.
    pub fn tick(&mut self, dt: f32, sink: &mut impl PropertySink) {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "ignoring invalid motion tick");
            return;
        }
        let mut finished = Vec::new();
        for (&handle, animation) in self.animations.iter_mut() {
            match animation {
                Animation::Tween(tween) => {
                    tween.elapsed += dt;
                    if tween.elapsed < 0.0 {
                        continue;
                    }
                    for (index, &element) in tween.targets.iter().enumerate() {
                        let progress = tween.spec.progress(index, tween.elapsed);
                        for p in &tween.spec.properties {
                            sink.set_property(element, p.property, p.value_at(progress));
                        }
                    }
                    if tween.spec.is_finished(tween.targets.len(), tween.elapsed) {
                        finished.push(handle);
                    }
                }
                Animation::Timeline(tl) => tl.elapsed += dt,
            }
        }

        for handle in finished {
            self.retire(handle);
        }
        let empty: Vec<AnimationHandle> = self
            .animations
            .iter()
            .filter_map(|(&h, a)| match a {
                Animation::Timeline(tl) if tl.children.is_empty() => Some(h),
                _ => None,
            })
            .collect();
        for handle in empty {
            self.retire(handle);
        }
    }

    fn retire(&mut self, handle: AnimationHandle) {
        if let Some(animation) = self.animations.remove(&handle) {
            self.detach_from_parent(handle, &animation);
            tracing::debug!(handle = handle.id(), "animation completed");
            self.record(MotionEvent::Completed(handle));
        }
    }

    fn detach_from_parent(&mut self, handle: AnimationHandle, animation: &Animation) {
        let Animation::Tween(TweenState {
            parent: Some(parent),
            ..
        }) = animation
        else {
            return;
        };
        if let Some(Animation::Timeline(tl)) = self.animations.get_mut(parent) {
            tl.children.retain(|c| *c != handle);
        }
    }

    /// Stop an animation immediately. Killing a timeline kills all of its
    /// children. Returns false for unknown or already finished handles.
    pub fn kill(&mut self, handle: AnimationHandle) -> bool {
        let Some(animation) = self.animations.remove(&handle) else {
            return false;
        };
        match &animation {
            Animation::Timeline(tl) => {
                for child in &tl.children {
                    self.animations.remove(child);
                }
            }
            Animation::Tween(_) => self.detach_from_parent(handle, &animation),
        }
        tracing::debug!(handle = handle.id(), "animation killed");
        self.record(MotionEvent::Killed(handle));
        true
    }

    /// Kill everything. Returns the number of top-level animations stopped.
    pub fn kill_all(&mut self) -> usize {
        let roots: Vec<AnimationHandle> = self
            .animations
            .iter()
            .filter_map(|(&h, a)| match a {
                Animation::Tween(TweenState {
                    parent: Some(_), ..
                }) => None,
                _ => Some(h),
            })
            .collect();
        for &handle in &roots {
            self.kill(handle);
        }
        roots.len()
    }

    pub fn is_active(&self, handle: AnimationHandle) -> bool {
        self.animations.contains_key(&handle)
    }

    /// Registered animations, timeline children included.
    pub fn active_count(&self) -> usize {
        self.animations.len()
    }

    /// Live children of a timeline, in step order.
    pub fn children(&self, handle: AnimationHandle) -> Vec<AnimationHandle> {
        match self.animations.get(&handle) {
            Some(Animation::Timeline(tl)) => tl.children.clone(),
            _ => Vec::new(),
        }
    }

    /// Seconds a tween or timeline has run.
    pub fn elapsed(&self, handle: AnimationHandle) -> Option<f32> {
        self.animations.get(&handle).map(|a| match a {
            Animation::Tween(t) => t.elapsed,
            Animation::Timeline(tl) => tl.elapsed,
        })
    }

    /// Drain lifecycle events recorded since the last call.
    /// At most [`MAX_EVENTS`] are kept; older ones are dropped.
    pub fn drain_events(&mut self) -> Vec<MotionEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::target::{Property, PropertyStore};
    use crate::timeline::Position;
    use crate::tween::Repeat;

    fn store() -> PropertyStore {
        let mut s = PropertyStore::new();
        s.register(".item", vec![ElementId(1), ElementId(2), ElementId(3)]);
        s
    }

    fn fade(duration: f32) -> TweenSpec {
        TweenSpec::new(duration)
            .from_to(Property::Opacity, 0.0, 1.0)
            .easing(Easing::Linear)
    }

    #[test]
    fn tween_applies_and_retires() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let h = engine
            .tween(&ElementId(1).into(), fade(1.0), &s)
            .unwrap();
        engine.tick(0.5, &mut s);
        assert_eq!(s.get(ElementId(1), Property::Opacity), Some(0.5));
        assert!(engine.is_active(h));
        engine.tick(0.5, &mut s);
        assert_eq!(s.get(ElementId(1), Property::Opacity), Some(1.0));
        assert!(!engine.is_active(h));
        assert_eq!(
            engine.drain_events(),
            vec![
                MotionEvent::Started {
                    handle: h,
                    targets: 1
                },
                MotionEvent::Completed(h)
            ]
        );
    }

    #[test]
    fn event_log_keeps_only_recent_events() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let mut last = None;
        for _ in 0..MAX_EVENTS {
            let h = engine.tween(&ElementId(1).into(), fade(0.1), &s).unwrap();
            engine.tick(0.1, &mut s);
            last = Some(h);
        }
        let events = engine.drain_events();
        assert_eq!(events.len(), MAX_EVENTS);
        assert_eq!(events.last(), last.map(MotionEvent::Completed).as_ref());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn stagger_holds_waiting_elements_at_start() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let _h = engine
            .tween(&".item".into(), fade(1.0).stagger(0.5), &s)
            .unwrap();
        engine.tick(0.5, &mut s);
        assert_eq!(s.get(ElementId(1), Property::Opacity), Some(0.5));
        assert_eq!(s.get(ElementId(2), Property::Opacity), Some(0.0));
        assert_eq!(s.get(ElementId(3), Property::Opacity), Some(0.0));
    }

    #[test]
    fn infinite_tween_stays_until_killed() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let h = engine
            .tween(
                &ElementId(1).into(),
                fade(1.0).repeat(Repeat::Infinite).yoyo(true),
                &s,
            )
            .unwrap();
        for _ in 0..1000 {
            engine.tick(0.1, &mut s);
        }
        assert!(engine.is_active(h));
        assert!(engine.kill(h));
        assert!(!engine.kill(h));
        let writes = s.writes();
        engine.tick(0.1, &mut s);
        assert_eq!(s.writes(), writes);
    }

    #[test]
    fn killing_timeline_kills_children() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let tl = TimelineSpec::new()
            .add(ElementId(1), fade(1.0), Position::AfterPrevious)
            .add(ElementId(2), fade(1.0).repeat(Repeat::Infinite), Position::Offset(-0.5));
        let h = engine.timeline(&tl, &s).unwrap();
        let children = engine.children(h);
        assert_eq!(children.len(), 2);
        assert_eq!(engine.active_count(), 3);

        assert!(engine.kill(h));
        assert_eq!(engine.active_count(), 0);
        for c in children {
            assert!(!engine.is_active(c));
        }
        engine.tick(1.0, &mut s);
        assert_eq!(s.writes(), 0);
    }

    #[test]
    fn timeline_children_wait_for_their_slot() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let tl = TimelineSpec::new()
            .add(ElementId(1), fade(1.0), Position::AfterPrevious)
            .add(ElementId(2), fade(1.0), Position::Offset(-0.25));
        let h = engine.timeline(&tl, &s).unwrap();

        engine.tick(0.5, &mut s);
        assert_eq!(s.get(ElementId(1), Property::Opacity), Some(0.5));
        assert_eq!(s.get(ElementId(2), Property::Opacity), None);

        engine.tick(0.5, &mut s);
        assert_eq!(s.get(ElementId(2), Property::Opacity), Some(0.25));

        engine.tick(0.75, &mut s);
        assert_eq!(s.get(ElementId(2), Property::Opacity), Some(1.0));
        assert!(!engine.is_active(h));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn child_handles_killable_independently() {
        let s = store();
        let mut engine = MotionEngine::new();
        let tl = TimelineSpec::new()
            .add(ElementId(1), fade(1.0), Position::AfterPrevious)
            .add(ElementId(2), fade(1.0), Position::AfterPrevious);
        let h = engine.timeline(&tl, &s).unwrap();
        let first = engine.children(h)[0];
        assert!(engine.kill(first));
        assert_eq!(engine.children(h).len(), 1);
        assert!(engine.is_active(h));
    }

    #[test]
    fn failed_timeline_registers_nothing() {
        let s = store();
        let mut engine = MotionEngine::new();
        let tl = TimelineSpec::new()
            .add(ElementId(1), fade(1.0), Position::AfterPrevious)
            .add(".missing", fade(1.0), Position::AfterPrevious);
        assert!(matches!(
            engine.timeline(&tl, &s),
            Err(MotionError::UnresolvedTarget(_))
        ));
        assert_eq!(engine.active_count(), 0);
        assert!(matches!(
            engine.timeline(&TimelineSpec::new(), &s),
            Err(MotionError::EmptyTimeline)
        ));
    }

    #[test]
    fn kill_all_clears_registry() {
        let s = store();
        let mut engine = MotionEngine::new();
        let _a = engine.tween(&ElementId(1).into(), fade(1.0), &s).unwrap();
        let tl = TimelineSpec::new().add(ElementId(2), fade(1.0), Position::AfterPrevious);
        let _b = engine.timeline(&tl, &s).unwrap();
        assert_eq!(engine.kill_all(), 2);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn invalid_ticks_ignored() {
        let mut s = store();
        let mut engine = MotionEngine::new();
        let h = engine.tween(&ElementId(1).into(), fade(1.0), &s).unwrap();
        engine.tick(f32::NAN, &mut s);
        engine.tick(-1.0, &mut s);
        assert_eq!(engine.elapsed(h), Some(0.0));
        assert_eq!(s.writes(), 0);
    }
}
