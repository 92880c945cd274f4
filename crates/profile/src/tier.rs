use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::signals::{DeviceSignals, Environment};

/// Coarse device capability class used to scale visual fidelity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Low,
    #[default]
    Medium,
    High,
}

impl PerformanceTier {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown performance tier {0:?} (expected low, medium or high)")]
pub struct ParseTierError(pub String);

impl FromStr for PerformanceTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}

/// Classify a device from its signals.
///
/// High needs 8+ cores, 8+ GB and a pixel ratio of at most 2; medium needs
/// 4+ cores and 4+ GB; everything else is low.
pub fn classify(signals: &DeviceSignals) -> PerformanceTier {
    let cores = signals.cores_or_default();
    let memory = signals.memory_or_default();
    let pixel_ratio = signals.pixel_ratio_or_default();

    if cores >= 8 && memory >= 8.0 && pixel_ratio <= 2.0 {
        PerformanceTier::High
    } else if cores >= 4 && memory >= 4.0 {
        PerformanceTier::Medium
    } else {
        PerformanceTier::Low
    }
}

/// Tier for the given environment. Medium when the environment reports
/// nothing. Pure and safe to call repeatedly.
pub fn get_tier(env: &impl Environment) -> PerformanceTier {
    match env.device_signals() {
        Some(signals) => classify(&signals),
        None => PerformanceTier::Medium,
    }
}

/// Profiler owned by one component, memoizing its tier.
///
/// The cache lives in this value, not in a process-wide static, so separate
/// components (and tests) never see each other's environment.
#[derive(Debug)]
pub struct PerformanceProfiler<E> {
    env: E,
    cached: Cell<Option<PerformanceTier>>,
}

impl<E: Environment> PerformanceProfiler<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            cached: Cell::new(None),
        }
    }

    /// Memoized tier; computed on first use.
    pub fn tier(&self) -> PerformanceTier {
        if let Some(tier) = self.cached.get() {
            return tier;
        }
        let tier = get_tier(&self.env);
        tracing::debug!(%tier, "classified device");
        self.cached.set(Some(tier));
        tier
    }

    /// Drop the memoized tier and classify again.
    pub fn refresh(&self) -> PerformanceTier {
        self.cached.set(None);
        self.tier()
    }

    pub fn prefers_reduced_motion(&self) -> bool {
        self.env.prefers_reduced_motion()
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut E {
        self.cached.set(None);
        &mut self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Headless, StaticEnvironment};

    fn signals(cores: u32, memory: f32, ratio: f32) -> DeviceSignals {
        DeviceSignals {
            logical_cores: Some(cores),
            device_memory_gb: Some(memory),
            pixel_ratio: Some(ratio),
        }
    }

    #[test]
    fn no_signals_is_medium() {
        assert_eq!(get_tier(&Headless), PerformanceTier::Medium);
        assert_eq!(
            get_tier(&StaticEnvironment::default()),
            PerformanceTier::Medium
        );
    }

    #[test]
    fn classification_rules() {
        assert_eq!(classify(&signals(8, 8.0, 2.0)), PerformanceTier::High);
        assert_eq!(classify(&signals(16, 32.0, 1.0)), PerformanceTier::High);
        // dense displays cost too much fill rate for high
        assert_eq!(classify(&signals(8, 8.0, 3.0)), PerformanceTier::Medium);
        assert_eq!(classify(&signals(8, 4.0, 1.0)), PerformanceTier::Medium);
        assert_eq!(classify(&signals(4, 4.0, 1.0)), PerformanceTier::Medium);
        assert_eq!(classify(&signals(2, 8.0, 1.0)), PerformanceTier::Low);
        assert_eq!(classify(&signals(8, 2.0, 1.0)), PerformanceTier::Low);
    }

    #[test]
    fn partial_signals_use_conservative_defaults() {
        let only_cores = DeviceSignals {
            logical_cores: Some(12),
            ..DeviceSignals::default()
        };
        // memory defaults to 4 GB, so never high
        assert_eq!(classify(&only_cores), PerformanceTier::Medium);

        let weak = DeviceSignals {
            logical_cores: Some(2),
            ..DeviceSignals::default()
        };
        assert_eq!(classify(&weak), PerformanceTier::Low);
    }

    #[test]
    fn repeated_calls_are_idempotent() {
        let env = StaticEnvironment::new(signals(8, 16.0, 1.0));
        let first = get_tier(&env);
        for _ in 0..10 {
            assert_eq!(get_tier(&env), first);
        }
    }

    #[test]
    fn profiler_memoizes_until_refresh() {
        let mut profiler = PerformanceProfiler::new(StaticEnvironment::new(signals(2, 2.0, 1.0)));
        assert_eq!(profiler.tier(), PerformanceTier::Low);

        profiler.environment_mut().signals = Some(signals(8, 8.0, 1.0));
        assert_eq!(profiler.tier(), PerformanceTier::High);
        assert_eq!(profiler.refresh(), PerformanceTier::High);
    }

    #[test]
    fn profilers_do_not_share_state() {
        let low = PerformanceProfiler::new(StaticEnvironment::new(signals(1, 1.0, 1.0)));
        let high = PerformanceProfiler::new(StaticEnvironment::new(signals(8, 8.0, 1.0)));
        assert_eq!(low.tier(), PerformanceTier::Low);
        assert_eq!(high.tier(), PerformanceTier::High);
        assert_eq!(low.tier(), PerformanceTier::Low);
    }

    #[test]
    fn tier_ordering_and_parsing() {
        assert!(PerformanceTier::Low < PerformanceTier::Medium);
        assert!(PerformanceTier::Medium < PerformanceTier::High);
        assert_eq!("HIGH".parse::<PerformanceTier>(), Ok(PerformanceTier::High));
        assert!("ultra".parse::<PerformanceTier>().is_err());
        assert_eq!(PerformanceTier::Low.to_string(), "low");
    }
}
