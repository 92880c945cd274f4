use serde::{Deserialize, Serialize};

/// Static capability signals read from the host.
///
/// Every field is optional: hosts expose some, all or none of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSignals {
    /// Logical CPU cores.
    pub logical_cores: Option<u32>,
    /// Approximate device memory in gigabytes.
    pub device_memory_gb: Option<f32>,
    /// Display pixel ratio (physical pixels per logical pixel).
    pub pixel_ratio: Option<f32>,
}

impl DeviceSignals {
    /// Conservative stand-ins for signals the host did not report.
    pub const DEFAULT_CORES: u32 = 4;
    pub const DEFAULT_MEMORY_GB: f32 = 4.0;
    pub const DEFAULT_PIXEL_RATIO: f32 = 1.0;

    pub fn cores_or_default(&self) -> u32 {
        self.logical_cores.unwrap_or(Self::DEFAULT_CORES)
    }

    pub fn memory_or_default(&self) -> f32 {
        self.device_memory_gb
            .filter(|m| m.is_finite() && *m >= 0.0)
            .unwrap_or(Self::DEFAULT_MEMORY_GB)
    }

    pub fn pixel_ratio_or_default(&self) -> f32 {
        self.pixel_ratio
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(Self::DEFAULT_PIXEL_RATIO)
    }

    pub fn is_empty(&self) -> bool {
        self.logical_cores.is_none() && self.device_memory_gb.is_none() && self.pixel_ratio.is_none()
    }
}

/// The execution context the profiler reads from.
///
/// Injected rather than global so tests can describe any device.
pub trait Environment {
    /// Capability signals, or `None` when there is no host environment at all.
    fn device_signals(&self) -> Option<DeviceSignals>;

    /// Whether the user asked for reduced motion.
    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}

/// No host: no signals, motion allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Environment for Headless {
    fn device_signals(&self) -> Option<DeviceSignals> {
        None
    }
}

/// Fixed signals, used by tests and command-line overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StaticEnvironment {
    pub signals: Option<DeviceSignals>,
    pub reduced_motion: bool,
}

impl StaticEnvironment {
    pub fn new(signals: DeviceSignals) -> Self {
        Self {
            signals: Some(signals),
            reduced_motion: false,
        }
    }

    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }
}

impl Environment for StaticEnvironment {
    fn device_signals(&self) -> Option<DeviceSignals> {
        self.signals
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}

/// Environment variable overriding the reported device memory (GB).
pub const ENV_DEVICE_MEMORY: &str = "DRIFTFIELD_DEVICE_MEMORY";
/// Environment variable overriding the reported pixel ratio.
pub const ENV_PIXEL_RATIO: &str = "DRIFTFIELD_PIXEL_RATIO";
/// Environment variable enabling reduced motion (`1`, `true`, `yes`).
pub const ENV_REDUCED_MOTION: &str = "DRIFTFIELD_REDUCED_MOTION";

/// The running process: core count from the OS, memory, pixel ratio and the
/// reduced-motion preference from environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEnvironment {
    /// Pixel ratio reported by the windowing layer, if it has one.
    pub window_pixel_ratio: Option<f32>,
}

impl HostEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pixel_ratio(pixel_ratio: f32) -> Self {
        Self {
            window_pixel_ratio: Some(pixel_ratio),
        }
    }
}

fn env_f32(name: &str) -> Option<f32> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<f32>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparsable override: {e}");
            None
        }
    }
}

impl Environment for HostEnvironment {
    fn device_signals(&self) -> Option<DeviceSignals> {
        let logical_cores = std::thread::available_parallelism()
            .ok()
            .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX));
        let signals = DeviceSignals {
            logical_cores,
            device_memory_gb: env_f32(ENV_DEVICE_MEMORY),
            pixel_ratio: env_f32(ENV_PIXEL_RATIO).or(self.window_pixel_ratio),
        };
        if signals.is_empty() {
            None
        } else {
            Some(signals)
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        std::env::var(ENV_REDUCED_MOTION)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}
