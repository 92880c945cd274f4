//! Device profiling: capability tiers and the quality policy derived from them.
//!
//! # Invariants
//! - Classification is pure; missing signals never panic and fall back to medium.
//! - Quality settings never increase as the tier decreases.
//! - Tier memoization is scoped to a `PerformanceProfiler` value, never global.

mod quality;
mod signals;
mod tier;

pub use quality::{PixelRatioRange, QualitySettings, get_settings};
pub use signals::{
    DeviceSignals, ENV_DEVICE_MEMORY, ENV_PIXEL_RATIO, ENV_REDUCED_MOTION, Environment, Headless,
    HostEnvironment, StaticEnvironment,
};
pub use tier::{ParseTierError, PerformanceProfiler, PerformanceTier, classify, get_tier};

pub fn crate_info() -> &'static str {
    "driftfield-profile v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("profile"));
    }

    #[test]
    fn headless_pipeline_yields_medium_settings() {
        let settings = get_settings(get_tier(&Headless));
        assert_eq!(settings, QualitySettings::for_tier(PerformanceTier::Medium));
    }
}
