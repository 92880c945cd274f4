use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::VisibilityError;

/// Axis-aligned rectangle in layout pixels, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow each side by the margin; negative margins shrink.
    pub fn expand(&self, m: &RootMargin) -> Self {
        Self {
            x: self.x - m.left,
            y: self.y - m.top,
            width: self.width + m.left + m.right,
            height: self.height + m.top + m.bottom,
        }
    }

    /// Overlap of two rectangles, if they share positive area.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 > x0 && y1 > y0 {
            Some(Self::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Margin applied to the viewport before intersecting, in pixels.
///
/// Parses CSS-style shorthand: `"50px"`, `"10px 20px"`, `"1px 2px 3px"` or
/// `"1px 2px 3px 4px"` (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl RootMargin {
    pub const fn uniform(px: f32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

impl FromStr for RootMargin {
    type Err = VisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f32> = s
            .split_whitespace()
            .map(|p| {
                p.trim_end_matches("px")
                    .parse::<f32>()
                    .map_err(|_| VisibilityError::InvalidMargin(s.to_string()))
            })
            .collect::<Result<_, _>>()?;
        let [top, right, bottom, left] = match parts.as_slice() {
            [a] => [*a, *a, *a, *a],
            [v, h] => [*v, *h, *v, *h],
            [t, h, b] => [*t, *h, *b, *h],
            [t, r, b, l] => [*t, *r, *b, *l],
            _ => return Err(VisibilityError::InvalidMargin(s.to_string())),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}
