use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MotionError;

/// Which end of a curve is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

impl EaseMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inOut",
        }
    }
}

/// Easing curve mapping linear progress in `[0, 1]` to eased progress.
///
/// Named the way motion designers write them: `none`, `power2.out`,
/// `sine.inOut`, `back.out`, `expo.out`. A bare family name (`power3`) means
/// its `out` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    /// Polynomial of degree `1 + power`, `power` in `1..=4`.
    Power(u8, EaseMode),
    Sine(EaseMode),
    BackOut,
    ExpoOut,
}

const BACK_OVERSHOOT: f32 = 1.70158;

impl Easing {
    pub const POWER2_OUT: Self = Self::Power(2, EaseMode::Out);
    pub const SINE_IN_OUT: Self = Self::Sine(EaseMode::InOut);

    /// Eased progress for `t`, clamped to `[0, 1]` first. Endpoints are exact.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Self::Linear => t,
            Self::Power(power, mode) => {
                let exp = i32::from(power) + 1;
                match mode {
                    EaseMode::In => t.powi(exp),
                    EaseMode::Out => 1.0 - (1.0 - t).powi(exp),
                    EaseMode::InOut if t < 0.5 => (2.0 * t).powi(exp) / 2.0,
                    EaseMode::InOut => 1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0,
                }
            }
            Self::Sine(mode) => match mode {
                EaseMode::In => 1.0 - (t * PI / 2.0).cos(),
                EaseMode::Out => (t * PI / 2.0).sin(),
                EaseMode::InOut => -((PI * t).cos() - 1.0) / 2.0,
            },
            Self::BackOut => {
                let u = t - 1.0;
                u * u * ((BACK_OVERSHOOT + 1.0) * u + BACK_OVERSHOOT) + 1.0
            }
            Self::ExpoOut => 1.0 - 2f32.powf(-10.0 * t),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::POWER2_OUT
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("none"),
            Self::Power(p, mode) => write!(f, "power{p}.{}", mode.as_str()),
            Self::Sine(mode) => write!(f, "sine.{}", mode.as_str()),
            Self::BackOut => f.write_str("back.out"),
            Self::ExpoOut => f.write_str("expo.out"),
        }
    }
}

impl FromStr for Easing {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || MotionError::UnknownEasing(s.to_string());
        let (family, mode) = match s.split_once('.') {
            Some((family, mode)) => (family, Some(mode)),
            None => (s, None),
        };
        let mode = match mode {
            None | Some("out") => EaseMode::Out,
            Some("in") => EaseMode::In,
            Some("inOut") => EaseMode::InOut,
            Some(_) => return Err(unknown()),
        };
        match family {
            "none" | "linear" => Ok(Self::Linear),
            "sine" => Ok(Self::Sine(mode)),
            "back" if mode == EaseMode::Out => Ok(Self::BackOut),
            "expo" if mode == EaseMode::Out => Ok(Self::ExpoOut),
            _ => {
                let power = family
                    .strip_prefix("power")
                    .and_then(|p| p.parse::<u8>().ok())
                    .filter(|p| (1..=4).contains(p))
                    .ok_or_else(unknown)?;
                Ok(Self::Power(power, mode))
            }
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = MotionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Easing> for String {
    fn from(e: Easing) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 8] = [
        Easing::Linear,
        Easing::Power(1, EaseMode::In),
        Easing::Power(2, EaseMode::Out),
        Easing::Power(4, EaseMode::InOut),
        Easing::Sine(EaseMode::Out),
        Easing::Sine(EaseMode::InOut),
        Easing::BackOut,
        Easing::ExpoOut,
    ];

    #[test]
    fn endpoints_are_exact() {
        for e in ALL {
            assert_eq!(e.apply(0.0), 0.0, "{e}");
            assert_eq!(e.apply(1.0), 1.0, "{e}");
        }
    }

    #[test]
    fn out_of_range_input_clamped() {
        assert_eq!(Easing::Linear.apply(-2.0), 0.0);
        assert_eq!(Easing::POWER2_OUT.apply(7.0), 1.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 0.0);
    }

    #[test]
    fn power2_out_shape() {
        // 1 - (1 - 0.5)^3
        assert!((Easing::POWER2_OUT.apply(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn in_out_curves_are_symmetric() {
        for e in [Easing::SINE_IN_OUT, Easing::Power(3, EaseMode::InOut)] {
            assert!((e.apply(0.5) - 0.5).abs() < 1e-6);
            let a = e.apply(0.2);
            let b = e.apply(0.8);
            assert!((a + b - 1.0).abs() < 1e-5, "{e}");
        }
    }

    #[test]
    fn back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::BackOut.apply(i as f32 / 100.0))
            .fold(0.0f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn parses_designer_names() {
        assert_eq!("power2.out".parse::<Easing>().unwrap(), Easing::POWER2_OUT);
        assert_eq!("power3".parse::<Easing>().unwrap(), Easing::Power(3, EaseMode::Out));
        assert_eq!("sine.inOut".parse::<Easing>().unwrap(), Easing::SINE_IN_OUT);
        assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!("back.out".parse::<Easing>().unwrap(), Easing::BackOut);
        for bad in ["power5.out", "back.in", "elastic", "sine.sideways"] {
            assert!(bad.parse::<Easing>().is_err(), "{bad}");
        }
    }

    #[test]
    fn display_round_trips() {
        for e in ALL {
            assert_eq!(e.to_string().parse::<Easing>().unwrap(), e);
        }
    }
}
