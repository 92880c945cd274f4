//! Scalar shaping functions applied per instance, per frame.

/// Pointer influence at distance `d`: 1 at the pointer, falling linearly to 0
/// at `radius` and beyond. A radius of zero (or less) only activates `d == 0`.
pub fn activation(d: f32, radius: f32) -> f32 {
    if !d.is_finite() {
        return 0.0;
    }
    if radius <= 0.0 {
        return if d <= 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - d / radius).clamp(0.0, 1.0)
}

/// Vertical offset of the idle breathing motion.
pub fn breathing(amplitude: f32, speed: f32, t: f32, phase: f32) -> f32 {
    amplitude * (speed * t + phase).sin()
}

/// 1 inside `start`, 0 beyond `end`, smoothstep in between. `r` is the
/// normalized distance from the field centre.
pub fn edge_fade(r: f32, start: f32, end: f32) -> f32 {
    if r <= start {
        return 1.0;
    }
    if r >= end {
        return 0.0;
    }
    let x = (r - start) / (end - start);
    1.0 - x * x * (3.0 - 2.0 * x)
}

/// Accent mix factor for an activation, always within `[0, 1]`.
pub fn color_mix(activation: f32, gain: f32) -> f32 {
    let t = activation * gain;
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}
