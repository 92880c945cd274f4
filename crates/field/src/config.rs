use std::path::Path;

use driftfield_common::Color;
use driftfield_profile::PerformanceTier;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating field configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid field config: {0}")]
    Invalid(String),
}

/// Layout of the repeated elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyConfig {
    /// Square grid. `resolution` cells per side; defaults to the tier's
    /// grid resolution. Without `spacing` the grid spans the field extent.
    Grid {
        #[serde(default)]
        resolution: Option<u32>,
        #[serde(default)]
        spacing: Option<f32>,
    },
    /// Concentric rings around the centre. Ring `r` (1-based) holds
    /// `per_ring * r` particles before density scaling.
    Rings { rings: u32, per_ring: u32 },
}

/// Upper bound on the instances one field may hold.
pub const MAX_INSTANCES: u64 = 1 << 20;

impl TopologyConfig {
    /// Instances asked for before tier scaling. `None` for a grid that takes
    /// its resolution from the tier.
    pub fn requested_instances(&self) -> Option<u64> {
        match *self {
            Self::Grid { resolution, .. } => resolution.map(|n| u64::from(n) * u64::from(n)),
            Self::Rings { rings, per_ring } => {
                let r = u64::from(rings);
                Some(u64::from(per_ring).saturating_mul(r * (r + 1) / 2))
            }
        }
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::Grid {
            resolution: None,
            spacing: None,
        }
    }
}

/// Band, as fractions of the field radius, over which instances fade out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeBand {
    pub start: f32,
    pub end: f32,
}

impl Default for FadeBand {
    fn default() -> Self {
        Self {
            start: 0.7,
            end: 1.0,
        }
    }
}

/// Linear map from normalized pointer coordinates into field space.
///
/// An approximation of a ray cast against the field plane; the factors are
/// visual tuning, not geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerMapping {
    pub scale_x: f32,
    pub scale_z: f32,
}

impl Default for PointerMapping {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_z: 1.0,
        }
    }
}

/// Visual parameters of one instanced field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub topology: TopologyConfig,
    /// Seed for the phase generator.
    pub seed: u64,
    /// Half the field depth in world units; width follows the aspect ratio.
    pub half_extent: f32,
    /// Breathing amplitude `A` in world units.
    pub breathing_amplitude: f32,
    /// Breathing angular speed `w` in radians per second.
    pub breathing_speed: f32,
    /// Pointer influence radius in world units.
    pub interaction_radius: f32,
    /// Height added at full activation.
    pub lift: f32,
    /// Relative scale added at full activation.
    pub scale_boost: f32,
    /// Multiplier on activation before colour mixing. Values above 1 saturate
    /// the accent earlier; the mix factor is still clamped.
    pub color_gain: f32,
    /// Per-instance base scale varies by up to this fraction.
    pub scale_jitter: f32,
    pub base_color: Color,
    pub accent_color: Color,
    pub fade: FadeBand,
    pub pointer: PointerMapping,
    /// Simulated seconds per wall-clock second.
    pub time_scale: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            topology: TopologyConfig::default(),
            seed: 42,
            half_extent: 10.0,
            breathing_amplitude: 0.15,
            breathing_speed: 1.2,
            interaction_radius: 3.0,
            lift: 0.8,
            scale_boost: 0.35,
            color_gain: 1.25,
            scale_jitter: 0.15,
            base_color: Color::from_hex(0x1e293b),
            accent_color: Color::from_hex(0x38bdf8),
            fade: FadeBand::default(),
            pointer: PointerMapping::default(),
            time_scale: 1.0,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("half_extent", self.half_extent),
            ("breathing_amplitude", self.breathing_amplitude),
            ("breathing_speed", self.breathing_speed),
            ("interaction_radius", self.interaction_radius),
            ("lift", self.lift),
            ("scale_boost", self.scale_boost),
            ("color_gain", self.color_gain),
            ("scale_jitter", self.scale_jitter),
            ("time_scale", self.time_scale),
            ("fade.start", self.fade.start),
            ("fade.end", self.fade.end),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite")));
        }
        if self.half_extent <= 0.0 {
            return Err(ConfigError::Invalid("half_extent must be positive".into()));
        }
        if self.interaction_radius < 0.0 {
            return Err(ConfigError::Invalid(
                "interaction_radius must not be negative".into(),
            ));
        }
        if self.time_scale < 0.0 {
            return Err(ConfigError::Invalid("time_scale must not be negative".into()));
        }
        if !(0.0..1.0).contains(&self.scale_jitter) {
            return Err(ConfigError::Invalid("scale_jitter must be in [0, 1)".into()));
        }
        if self.fade.start > self.fade.end {
            return Err(ConfigError::Invalid("fade.start must not exceed fade.end".into()));
        }
        if let Some(n) = self
            .topology
            .requested_instances()
            .filter(|&n| n > MAX_INSTANCES)
        {
            return Err(ConfigError::Invalid(format!(
                "topology asks for {n} instances, limit is {MAX_INSTANCES}"
            )));
        }
        match self.topology {
            TopologyConfig::Grid {
                resolution: Some(0),
                ..
            } => Err(ConfigError::Invalid("grid resolution must be positive".into())),
            TopologyConfig::Grid {
                spacing: Some(s), ..
            } if !(s.is_finite() && s > 0.0) => {
                Err(ConfigError::Invalid("grid spacing must be positive".into()))
            }
            TopologyConfig::Rings { rings, per_ring } if rings == 0 || per_ring == 0 => Err(
                ConfigError::Invalid("rings and per_ring must be positive".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// A scene file: one field plus the overrides a host may pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub field: FieldConfig,
    /// Force a tier instead of profiling the device.
    pub tier: Option<PerformanceTier>,
    /// Force the reduced-motion preference on.
    pub reduced_motion: bool,
    /// Cap below the tier's frame rate.
    pub max_fps: Option<u32>,
}

impl SceneConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let scene: Self = serde_yaml::from_str(s)?;
        scene.field.validate()?;
        if scene.max_fps == Some(0) {
            return Err(ConfigError::Invalid("max_fps must be positive".into()));
        }
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let scene = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded scene config");
        Ok(scene)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
