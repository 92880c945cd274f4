use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::target::Property;
use crate::tween::{Repeat, TweenSpec};

/// The named effects components can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    FadeIn,
    StaggerFadeIn,
    Breathing,
    Float,
    Glow,
    Rotate,
}

impl Effect {
    pub const ALL: [Self; 6] = [
        Self::FadeIn,
        Self::StaggerFadeIn,
        Self::Breathing,
        Self::Float,
        Self::Glow,
        Self::Rotate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::FadeIn => "fade_in",
            Self::StaggerFadeIn => "stagger_fade_in",
            Self::Breathing => "breathing",
            Self::Float => "float",
            Self::Glow => "glow",
            Self::Rotate => "rotate",
        }
    }

    /// Documented defaults for the effect.
    pub fn preset(self) -> TweenSpec {
        let looping = |spec: TweenSpec| spec.repeat(Repeat::Infinite);
        match self {
            Self::FadeIn => TweenSpec::new(0.8)
                .from_to(Property::Y, 30.0, 0.0)
                .from_to(Property::Opacity, 0.0, 1.0)
                .easing(Easing::POWER2_OUT),
            Self::StaggerFadeIn => TweenSpec::new(0.6)
                .from_to(Property::Y, 30.0, 0.0)
                .from_to(Property::Opacity, 0.0, 1.0)
                .easing(Easing::POWER2_OUT)
                .stagger(0.1),
            Self::Breathing => looping(TweenSpec::new(2.0))
                .from_to(Property::Scale, 1.0, 1.05)
                .easing(Easing::SINE_IN_OUT)
                .yoyo(true),
            Self::Float => looping(TweenSpec::new(3.0))
                .from_to(Property::Y, 0.0, -10.0)
                .easing(Easing::SINE_IN_OUT)
                .yoyo(true),
            Self::Glow => looping(TweenSpec::new(1.5))
                .from_to(Property::Glow, 0.3, 1.0)
                .easing(Easing::SINE_IN_OUT)
                .yoyo(true),
            Self::Rotate => looping(TweenSpec::new(20.0))
                .from_to(Property::Rotation, 0.0, 360.0)
                .easing(Easing::Linear),
        }
    }
}

/// Per-call overrides of an effect's defaults. Unset fields keep the preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOptions {
    pub duration: Option<f32>,
    pub delay: Option<f32>,
    pub easing: Option<Easing>,
    pub repeat: Option<Repeat>,
    pub yoyo: Option<bool>,
    pub stagger: Option<f32>,
}

impl EffectOptions {
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn apply(&self, mut spec: TweenSpec) -> TweenSpec {
        if let Some(d) = self.duration {
            spec.duration = d;
        }
        if let Some(d) = self.delay {
            spec.delay = d;
        }
        if let Some(e) = self.easing {
            spec.easing = e;
        }
        if let Some(r) = self.repeat {
            spec.repeat = r;
        }
        if let Some(y) = self.yoyo {
            spec.yoyo = y;
        }
        if let Some(s) = self.stagger {
            spec.stagger = s;
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for e in Effect::ALL {
            e.preset().validate().unwrap();
        }
    }

    #[test]
    fn fade_in_defaults() {
        let spec = Effect::FadeIn.preset();
        assert_eq!(spec.duration, 0.8);
        assert_eq!(spec.easing, Easing::POWER2_OUT);
        assert_eq!(spec.repeat, Repeat::Count(0));
        assert_eq!(spec.properties[0].property, Property::Y);
        assert_eq!((spec.properties[0].from, spec.properties[0].to), (30.0, 0.0));
    }

    #[test]
    fn looping_effects_repeat_forever() {
        for e in [Effect::Breathing, Effect::Float, Effect::Glow, Effect::Rotate] {
            assert_eq!(e.preset().repeat, Repeat::Infinite, "{}", e.name());
        }
        assert!(!Effect::Rotate.preset().yoyo);
        assert!(Effect::Glow.preset().yoyo);
        assert_eq!(Effect::StaggerFadeIn.preset().stagger, 0.1);
    }

    #[test]
    fn options_override_only_what_is_set() {
        let spec = EffectOptions::default()
            .with_duration(2.0)
            .apply(Effect::Float.preset());
        assert_eq!(spec.duration, 2.0);
        assert_eq!(spec.easing, Easing::SINE_IN_OUT);
        assert!(spec.yoyo);
    }

    #[test]
    fn options_deserialize() {
        let opts: EffectOptions =
            serde_yaml::from_str("duration: 1.2\neasing: expo.out\nrepeat: { count: 2 }").unwrap();
        assert_eq!(opts.duration, Some(1.2));
        assert_eq!(opts.easing, Some(Easing::ExpoOut));
        assert_eq!(opts.repeat, Some(Repeat::Count(2)));
    }
}
