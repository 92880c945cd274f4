use serde::{Deserialize, Serialize};

use crate::tier::PerformanceTier;

/// Inclusive range the renderer may pick its pixel ratio from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRatioRange {
    pub min: f32,
    pub max: f32,
}

impl PixelRatioRange {
    pub fn clamp(&self, ratio: f32) -> f32 {
        if ratio.is_finite() {
            ratio.clamp(self.min, self.max)
        } else {
            self.min
        }
    }
}

/// Concrete render and animation parameters for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub pixel_ratio_range: PixelRatioRange,
    pub antialias: bool,
    pub shadows: bool,
    /// Upper bound for the frame throttle.
    pub max_fps: u32,
    /// Cells per side of a rectangular instanced grid.
    pub grid_resolution: u32,
    /// Fraction of the nominal particle count to spawn, in `(0, 1]`.
    pub particle_density: f32,
}

impl QualitySettings {
    /// Fixed table lookup. Total over every tier, no I/O.
    pub fn for_tier(tier: PerformanceTier) -> Self {
        match tier {
            PerformanceTier::High => Self {
                pixel_ratio_range: PixelRatioRange { min: 1.0, max: 2.0 },
                antialias: true,
                shadows: true,
                max_fps: 60,
                grid_resolution: 40,
                particle_density: 1.0,
            },
            PerformanceTier::Medium => Self {
                pixel_ratio_range: PixelRatioRange { min: 1.0, max: 1.5 },
                antialias: true,
                shadows: false,
                max_fps: 45,
                grid_resolution: 30,
                particle_density: 0.7,
            },
            PerformanceTier::Low => Self {
                pixel_ratio_range: PixelRatioRange { min: 1.0, max: 1.0 },
                antialias: false,
                shadows: false,
                max_fps: 30,
                grid_resolution: 20,
                particle_density: 0.4,
            },
        }
    }

    /// Pixel ratio to render at for a device reporting `device_ratio`.
    pub fn clamp_pixel_ratio(&self, device_ratio: f32) -> f32 {
        self.pixel_ratio_range.clamp(device_ratio)
    }

    /// Apply the particle density to a nominal count. Never rounds a non-zero
    /// request down to nothing.
    pub fn scaled_count(&self, base: u32) -> u32 {
        if base == 0 {
            return 0;
        }
        ((base as f32 * self.particle_density).round() as u32).max(1)
    }

    /// Instances in a full rectangular grid at this tier.
    pub fn instance_budget(&self) -> u32 {
        self.grid_resolution * self.grid_resolution
    }
}

/// Settings for `tier`. Alias kept for callers that think in terms of a policy
/// function rather than a constructor.
pub fn get_settings(tier: PerformanceTier) -> QualitySettings {
    QualitySettings::for_tier(tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_tier_table() {
        let s = get_settings(PerformanceTier::Medium);
        assert_eq!(s.grid_resolution, 30);
        assert_eq!(s.max_fps, 45);
        assert_eq!(s.particle_density, 0.7);
        assert!(s.antialias);
        assert!(!s.shadows);
    }

    #[test]
    fn settings_are_pure() {
        for tier in PerformanceTier::ALL {
            assert_eq!(get_settings(tier), get_settings(tier));
        }
    }

    #[test]
    fn settings_scale_down_with_tier() {
        for pair in PerformanceTier::ALL.windows(2) {
            let lower = get_settings(pair[0]);
            let higher = get_settings(pair[1]);
            assert!(higher.max_fps >= lower.max_fps);
            assert!(higher.grid_resolution >= lower.grid_resolution);
            assert!(higher.particle_density >= lower.particle_density);
            assert!(higher.pixel_ratio_range.min >= lower.pixel_ratio_range.min);
            assert!(higher.pixel_ratio_range.max >= lower.pixel_ratio_range.max);
            assert!(higher.antialias >= lower.antialias);
            assert!(higher.shadows >= lower.shadows);
        }
    }

    #[test]
    fn density_in_unit_interval() {
        for tier in PerformanceTier::ALL {
            let d = get_settings(tier).particle_density;
            assert!(d > 0.0 && d <= 1.0);
        }
    }

    #[test]
    fn high_tier_budget() {
        assert_eq!(get_settings(PerformanceTier::High).instance_budget(), 1600);
    }

    #[test]
    fn pixel_ratio_clamping() {
        let s = get_settings(PerformanceTier::Medium);
        assert_eq!(s.clamp_pixel_ratio(3.0), 1.5);
        assert_eq!(s.clamp_pixel_ratio(0.5), 1.0);
        assert_eq!(s.clamp_pixel_ratio(f32::NAN), 1.0);
    }

    #[test]
    fn scaled_count_keeps_at_least_one() {
        let low = get_settings(PerformanceTier::Low);
        assert_eq!(low.scaled_count(0), 0);
        assert_eq!(low.scaled_count(1), 1);
        assert_eq!(low.scaled_count(100), 40);
    }

    #[test]
    fn settings_serialize() {
        let json = serde_json::to_string(&get_settings(PerformanceTier::High)).unwrap();
        assert!(json.contains("\"grid_resolution\":40"));
    }
}
