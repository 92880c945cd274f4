use serde::{Deserialize, Serialize};

use crate::MotionError;
use crate::easing::Easing;
use crate::target::Property;

/// How many times a tween plays after its first pass.
///
/// Written in files as `2`, `{ count: 2 }` or `infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RepeatRepr", into = "RepeatRepr")]
pub enum Repeat {
    Count(u32),
    Infinite,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RepeatRepr {
    Times(u32),
    Named(String),
    Map { count: u32 },
}

impl TryFrom<RepeatRepr> for Repeat {
    type Error = MotionError;

    fn try_from(repr: RepeatRepr) -> Result<Self, Self::Error> {
        match repr {
            RepeatRepr::Times(count) | RepeatRepr::Map { count } => Ok(Self::Count(count)),
            RepeatRepr::Named(name) if name == "infinite" => Ok(Self::Infinite),
            RepeatRepr::Named(name) => Err(MotionError::InvalidRepeat(name)),
        }
    }
}

impl From<Repeat> for RepeatRepr {
    fn from(repeat: Repeat) -> Self {
        match repeat {
            Repeat::Count(count) => Self::Map { count },
            Repeat::Infinite => Self::Named("infinite".into()),
        }
    }
}

impl Repeat {
    /// Total passes, `None` when unbounded.
    pub fn passes(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n.saturating_add(1)),
            Self::Infinite => None,
        }
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// One property interpolated from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyTween {
    pub property: Property,
    pub from: f32,
    pub to: f32,
}

/// Timing and values of one tween, shared by every element it targets.
///
/// Element `k` of the resolved target starts at `delay + k * stagger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
    pub properties: Vec<PropertyTween>,
    /// Seconds per pass.
    pub duration: f32,
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub repeat: Repeat,
    /// Alternate direction on every other pass.
    #[serde(default)]
    pub yoyo: bool,
    #[serde(default)]
    pub stagger: f32,
}

impl TweenSpec {
    pub fn new(duration: f32) -> Self {
        Self {
            properties: Vec::new(),
            duration,
            delay: 0.0,
            easing: Easing::default(),
            repeat: Repeat::default(),
            yoyo: false,
            stagger: 0.0,
        }
    }

    pub fn from_to(mut self, property: Property, from: f32, to: f32) -> Self {
        self.properties.push(PropertyTween { property, from, to });
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn stagger(mut self, stagger: f32) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn validate(&self) -> Result<(), MotionError> {
        if self.properties.is_empty() {
            return Err(MotionError::EmptyTween);
        }
        for (field, value) in [
            ("duration", self.duration),
            ("delay", self.delay),
            ("stagger", self.stagger),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MotionError::InvalidTiming { field, value });
            }
        }
        if let Some(p) = self
            .properties
            .iter()
            .find(|p| !p.from.is_finite() || !p.to.is_finite())
        {
            return Err(MotionError::InvalidValue(p.property));
        }
        Ok(())
    }

    /// Seconds one element spends playing, `None` when it repeats forever.
    pub fn active_duration(&self) -> Option<f32> {
        self.repeat.passes().map(|n| self.duration * n as f32)
    }

    /// Seconds from start until the last of `targets` elements finishes.
    pub fn total_duration(&self, targets: usize) -> Option<f32> {
        let last_start = self.delay + self.stagger * targets.saturating_sub(1) as f32;
        self.active_duration().map(|d| last_start + d)
    }

    /// Seconds until the last element completes its first pass. Used to
    /// place following timeline steps after a looping one.
    pub fn first_pass_end(&self, targets: usize) -> f32 {
        self.delay + self.stagger * targets.saturating_sub(1) as f32 + self.duration
    }

    /// Eased progress for element `index` at `t` seconds after the tween
    /// started. Before its start an element holds its `from` values.
    pub fn progress(&self, index: usize, t: f32) -> f32 {
        let local = t - self.delay - self.stagger * index as f32;
        if local <= 0.0 {
            return self.easing.apply(0.0);
        }
        let passes = self.repeat.passes();
        let finished = self
            .active_duration()
            .is_some_and(|active| local >= active);

        let (pass, u) = if finished || self.duration <= 0.0 {
            (passes.map_or(0, |n| n - 1), 1.0)
        } else {
            let pass = (local / self.duration).floor();
            (pass as u32, (local - pass * self.duration) / self.duration)
        };
        let u = if self.yoyo && pass % 2 == 1 { 1.0 - u } else { u };
        self.easing.apply(u)
    }

    /// True once every one of `targets` elements has finished.
    pub fn is_finished(&self, targets: usize, t: f32) -> bool {
        self.total_duration(targets).is_some_and(|total| t >= total)
    }
}

impl PropertyTween {
    pub fn value_at(&self, progress: f32) -> f32 {
        self.from + (self.to - self.from) * progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(duration: f32) -> TweenSpec {
        TweenSpec::new(duration)
            .from_to(Property::Opacity, 0.0, 1.0)
            .easing(Easing::Linear)
    }

    #[test]
    fn plays_once_by_default() {
        let t = linear(2.0);
        assert_eq!(t.progress(0, 0.0), 0.0);
        assert_eq!(t.progress(0, 1.0), 0.5);
        assert_eq!(t.progress(0, 2.0), 1.0);
        assert_eq!(t.progress(0, 50.0), 1.0);
        assert!(t.is_finished(1, 2.0));
        assert!(!t.is_finished(1, 1.9));
    }

    #[test]
    fn delay_and_stagger_offset_each_element() {
        let t = linear(1.0).delay(0.5).stagger(0.25);
        assert_eq!(t.progress(0, 0.5), 0.0);
        assert_eq!(t.progress(0, 1.0), 0.5);
        assert_eq!(t.progress(2, 1.0), 0.0);
        assert_eq!(t.progress(2, 1.5), 0.5);
        assert_eq!(t.total_duration(3), Some(2.0));
    }

    #[test]
    fn yoyo_reverses_alternate_passes() {
        let t = linear(1.0).repeat(Repeat::Count(1)).yoyo(true);
        assert_eq!(t.progress(0, 0.5), 0.5);
        assert_eq!(t.progress(0, 1.25), 0.75);
        // two passes with yoyo end back at the start
        assert_eq!(t.progress(0, 2.0), 0.0);
        assert_eq!(t.total_duration(1), Some(2.0));
    }

    #[test]
    fn repeat_without_yoyo_restarts() {
        let t = linear(1.0).repeat(Repeat::Count(2));
        assert_eq!(t.progress(0, 1.25), 0.25);
        assert_eq!(t.progress(0, 3.0), 1.0);
    }

    #[test]
    fn infinite_never_finishes() {
        let t = linear(1.0).repeat(Repeat::Infinite).yoyo(true);
        assert_eq!(t.total_duration(4), None);
        assert!(!t.is_finished(1, 1e6));
        assert_eq!(t.progress(0, 1001.5), 0.5);
        assert_eq!(t.first_pass_end(1), 1.0);
    }

    #[test]
    fn zero_duration_jumps_to_end() {
        let t = linear(0.0);
        assert_eq!(t.progress(0, 0.001), 1.0);
    }

    #[test]
    fn validation() {
        assert!(matches!(TweenSpec::new(1.0).validate(), Err(MotionError::EmptyTween)));
        assert!(matches!(
            linear(-1.0).validate(),
            Err(MotionError::InvalidTiming {
                field: "duration",
                ..
            })
        ));
        assert!(linear(1.0).stagger(f32::NAN).validate().is_err());
        assert!(
            TweenSpec::new(1.0)
                .from_to(Property::X, f32::INFINITY, 0.0)
                .validate()
                .is_err()
        );
        assert!(linear(1.0).validate().is_ok());
    }

    #[test]
    fn repeat_accepts_count_forms() {
        let r: Repeat = serde_yaml::from_str("{ count: 2 }").unwrap();
        assert_eq!(r, Repeat::Count(2));
        let r: Repeat = serde_yaml::from_str("3").unwrap();
        assert_eq!(r, Repeat::Count(3));
        let r: Repeat = serde_yaml::from_str("infinite").unwrap();
        assert_eq!(r, Repeat::Infinite);
        assert!(serde_yaml::from_str::<Repeat>("forever").is_err());
        assert_eq!(serde_yaml::to_string(&Repeat::Count(2)).unwrap().trim(), "count: 2");
    }

    #[test]
    fn value_interpolates() {
        let p = PropertyTween {
            property: Property::Y,
            from: 30.0,
            to: 0.0,
        };
        assert_eq!(p.value_at(0.0), 30.0);
        assert_eq!(p.value_at(1.0), 0.0);
        assert_eq!(p.value_at(0.5), 15.0);
    }
}
