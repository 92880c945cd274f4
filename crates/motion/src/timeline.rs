use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MotionError;
use crate::target::AnimatableTarget;
use crate::tween::TweenSpec;

/// Where a timeline step starts.
///
/// Written as `"1.5"` (absolute seconds), `"<"` (with the previous step),
/// `">"` (after the previous step), or `"+=0.2"` / `"-=0.4"` (relative to the
/// previous step's end).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    At(f32),
    WithPrevious,
    #[default]
    AfterPrevious,
    Offset(f32),
}

impl Position {
    /// Start time given the previous step's start and end. Never negative.
    pub fn resolve(self, previous_start: f32, previous_end: f32) -> f32 {
        let start = match self {
            Self::At(s) => s,
            Self::WithPrevious => previous_start,
            Self::AfterPrevious => previous_end,
            Self::Offset(dt) => previous_end + dt,
        };
        start.max(0.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(s) => write!(f, "{s}"),
            Self::WithPrevious => f.write_str("<"),
            Self::AfterPrevious => f.write_str(">"),
            Self::Offset(dt) if *dt < 0.0 => write!(f, "-={}", -dt),
            Self::Offset(dt) => write!(f, "+={dt}"),
        }
    }
}

impl FromStr for Position {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::InvalidPosition(s.to_string());
        let number = |n: &str| {
            n.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(invalid)
        };
        match s.trim() {
            "<" => Ok(Self::WithPrevious),
            ">" => Ok(Self::AfterPrevious),
            t => {
                if let Some(n) = t.strip_prefix("+=") {
                    Ok(Self::Offset(number(n)?))
                } else if let Some(n) = t.strip_prefix("-=") {
                    Ok(Self::Offset(-number(n)?))
                } else {
                    Ok(Self::At(number(t)?))
                }
            }
        }
    }
}

impl TryFrom<String> for Position {
    type Error = MotionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.to_string()
    }
}

/// One tween placed on a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub target: AnimatableTarget,
    pub tween: TweenSpec,
    #[serde(default)]
    pub position: Position,
}

/// An ordered list of steps with relative placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpec {
    pub steps: Vec<TimelineStep>,
}

impl TimelineSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        mut self,
        target: impl Into<AnimatableTarget>,
        tween: TweenSpec,
        position: Position,
    ) -> Self {
        self.steps.push(TimelineStep {
            target: target.into(),
            tween,
            position,
        });
        self
    }

    /// Start time of every step, given how many elements each resolves to.
    ///
    /// A step's end is where its last element finishes; for a looping step
    /// it is where the last element finishes its first pass.
    pub fn schedule(&self, target_counts: &[usize]) -> Vec<f32> {
        let mut starts = Vec::with_capacity(self.steps.len());
        let (mut prev_start, mut prev_end) = (0.0f32, 0.0f32);
        for (step, &count) in self.steps.iter().zip(target_counts) {
            let start = step.position.resolve(prev_start, prev_end);
            let length = step
                .tween
                .total_duration(count)
                .unwrap_or_else(|| step.tween.first_pass_end(count));
            prev_start = start;
            prev_end = start + length;
            starts.push(start);
        }
        starts
    }
}
