use std::f32::consts::TAU;

use driftfield_profile::QualitySettings;
use glam::Vec3;

use crate::FieldError;
use crate::config::TopologyConfig;

/// Size of the host surface in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero, negative or non-finite sizes cannot produce geometry.
    pub fn validate(self) -> Result<Self, FieldError> {
        let ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if ok {
            Ok(self)
        } else {
            Err(FieldError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// World-space half sizes of the field on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldExtent {
    pub half_width: f32,
    pub half_depth: f32,
}

impl FieldExtent {
    /// Depth is fixed; width follows the viewport aspect ratio.
    pub fn from_viewport(viewport: Viewport, half_extent: f32) -> Self {
        Self {
            half_width: half_extent * viewport.aspect(),
            half_depth: half_extent,
        }
    }

    /// Distance from the centre normalized so the field boundary is 1.
    pub fn normalized_radius(&self, p: Vec3) -> f32 {
        let nx = p.x / self.half_width;
        let nz = p.z / self.half_depth;
        (nx * nx + nz * nz).sqrt()
    }
}

/// A topology resolved against the quality settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Topology {
    Grid {
        columns: u32,
        rows: u32,
        spacing: Option<f32>,
    },
    Rings { rings: u32, per_ring: u32 },
}

impl Topology {
    /// Apply the tier: grid resolution defaults from the settings, ring
    /// populations are scaled by particle density.
    pub fn resolve(config: &TopologyConfig, settings: &QualitySettings) -> Self {
        match *config {
            TopologyConfig::Grid {
                resolution,
                spacing,
            } => {
                let n = resolution.unwrap_or(settings.grid_resolution).max(1);
                Self::Grid {
                    columns: n,
                    rows: n,
                    spacing,
                }
            }
            TopologyConfig::Rings { rings, per_ring } => Self::Rings {
                rings: rings.max(1),
                per_ring: settings.scaled_count(per_ring.max(1)),
            },
        }
    }

    pub fn instance_count(&self) -> usize {
        match *self {
            Self::Grid { columns, rows, .. } => (columns as usize).saturating_mul(rows as usize),
            Self::Rings { rings, per_ring } => {
                // per_ring * (1 + 2 + ... + rings)
                let r = rings as usize;
                (per_ring as usize).saturating_mul(r.saturating_mul(r.saturating_add(1)) / 2)
            }
        }
    }

    /// Base positions and ring/depth index, in instance order.
    pub fn layout(&self, extent: FieldExtent) -> Vec<(Vec3, u32)> {
        let mut out = Vec::with_capacity(self.instance_count());
        match *self {
            Self::Grid {
                columns,
                rows,
                spacing,
            } => {
                let (half_x, half_z) = match spacing {
                    Some(s) => (s * columns as f32 / 2.0, s * rows as f32 / 2.0),
                    None => (extent.half_width, extent.half_depth),
                };
                for row in 0..rows {
                    let z = cell_center(row, rows, half_z);
                    for col in 0..columns {
                        let x = cell_center(col, columns, half_x);
                        out.push((Vec3::new(x, 0.0, z), row));
                    }
                }
            }
            Self::Rings { rings, per_ring } => {
                let outer = extent.half_width.min(extent.half_depth);
                for ring in 1..=rings {
                    let radius = outer * ring as f32 / rings as f32;
                    let count = per_ring.saturating_mul(ring);
                    // stagger alternate rings so spokes do not line up
                    let offset = if ring % 2 == 0 { 0.5 } else { 0.0 };
                    for i in 0..count {
                        let angle = TAU * (i as f32 + offset) / count as f32;
                        out.push((
                            Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin()),
                            ring,
                        ));
                    }
                }
            }
        }
        out
    }
}

/// Centre of cell `i` of `n` spanning `[-half, half]`.
fn cell_center(i: u32, n: u32, half: f32) -> f32 {
    -half + (2.0 * half) * (i as f32 + 0.5) / n as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_INSTANCES;
    use driftfield_profile::{PerformanceTier, get_settings};

    #[test]
    fn grid_defaults_to_tier_resolution() {
        let settings = get_settings(PerformanceTier::High);
        let t = Topology::resolve(&TopologyConfig::default(), &settings);
        assert_eq!(
            t,
            Topology::Grid {
                columns: 40,
                rows: 40,
                spacing: None
            }
        );
        assert_eq!(t.instance_count(), 1600);
    }

    #[test]
    fn rings_scaled_by_density() {
        let settings = get_settings(PerformanceTier::Low);
        let t = Topology::resolve(
            &TopologyConfig::Rings {
                rings: 3,
                per_ring: 10,
            },
            &settings,
        );
        assert_eq!(
            t,
            Topology::Rings {
                rings: 3,
                per_ring: 4
            }
        );
        // 4 + 8 + 12
        assert_eq!(t.instance_count(), 24);
        assert_eq!(t.layout(FieldExtent::from_viewport(Viewport::new(1.0, 1.0), 5.0)).len(), 24);
    }

    #[test]
    fn instance_count_saturates() {
        let t = Topology::Grid {
            columns: u32::MAX,
            rows: u32::MAX,
            spacing: None,
        };
        assert!(t.instance_count() as u64 > MAX_INSTANCES);
        let t = Topology::Rings {
            rings: u32::MAX,
            per_ring: u32::MAX,
        };
        assert_eq!(t.instance_count(), usize::MAX);
    }

    #[test]
    fn grid_layout_is_centred() {
        let t = Topology::Grid {
            columns: 2,
            rows: 2,
            spacing: None,
        };
        let extent = FieldExtent::from_viewport(Viewport::new(200.0, 100.0), 1.0);
        let pts: Vec<Vec3> = t.layout(extent).into_iter().map(|(p, _)| p).collect();
        assert_eq!(pts[0], Vec3::new(-1.0, 0.0, -0.5));
        assert_eq!(pts[3], Vec3::new(1.0, 0.0, 0.5));
        let sum: Vec3 = pts.iter().copied().sum();
        assert!(sum.length() < 1e-5);
    }

    #[test]
    fn fixed_spacing_ignores_extent() {
        let t = Topology::Grid {
            columns: 3,
            rows: 1,
            spacing: Some(2.0),
        };
        let extent = FieldExtent::from_viewport(Viewport::new(1000.0, 10.0), 1.0);
        let xs: Vec<f32> = t.layout(extent).into_iter().map(|(p, _)| p.x).collect();
        assert_eq!(xs, vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn rings_stay_inside_extent() {
        let t = Topology::Rings {
            rings: 5,
            per_ring: 6,
        };
        let extent = FieldExtent::from_viewport(Viewport::new(160.0, 90.0), 4.0);
        for (p, ring) in t.layout(extent) {
            assert!(ring >= 1 && ring <= 5);
            assert!(extent.normalized_radius(p) <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn invalid_viewports_rejected() {
        for (w, h) in [(0.0, 100.0), (100.0, -1.0), (f32::NAN, 10.0)] {
            assert!(Viewport::new(w, h).validate().is_err());
        }
        assert!(Viewport::new(1.0, 1.0).validate().is_ok());
    }
}
