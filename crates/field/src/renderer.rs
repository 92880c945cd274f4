use driftfield_common::Color;
use driftfield_profile::QualitySettings;
use glam::{Mat4, Quat, Vec2, Vec3};
use serde::Serialize;

use crate::FieldError;
use crate::activation::{activation, breathing, color_mix, edge_fade};
use crate::config::{ConfigError, FieldConfig, MAX_INSTANCES};
use crate::instance::{InstanceRecord, build_records, relayout};
use crate::surface::InstanceSurface;
use crate::topology::{FieldExtent, Topology, Viewport};

/// Result of one update pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Instances whose transform and colour were both written.
    pub written: usize,
    /// Instances dropped from this pass (non-finite maths or surface error).
    pub skipped: usize,
}

/// Computes and writes per-instance transforms and colours for one field.
///
/// Instance identity (index, phase, base scale, ring) is fixed at
/// construction; only base positions follow the viewport.
#[derive(Debug)]
pub struct InstancedFieldRenderer {
    config: FieldConfig,
    topology: Topology,
    viewport: Viewport,
    extent: FieldExtent,
    records: Vec<InstanceRecord>,
    pointer_ndc: Option<Vec2>,
    disposed: bool,
}

impl InstancedFieldRenderer {
    pub fn new(
        config: FieldConfig,
        settings: &QualitySettings,
        viewport: Viewport,
    ) -> Result<Self, FieldError> {
        config.validate()?;
        let viewport = viewport.validate()?;
        let topology = Topology::resolve(&config.topology, settings);
        if topology.instance_count() as u64 > MAX_INSTANCES {
            return Err(ConfigError::Invalid(format!(
                "{topology:?} exceeds {MAX_INSTANCES} instances"
            ))
            .into());
        }
        let extent = FieldExtent::from_viewport(viewport, config.half_extent);
        let records = build_records(&topology.layout(extent), config.seed, config.scale_jitter);
        tracing::info!(
            instances = records.len(),
            ?topology,
            seed = config.seed,
            "field renderer created"
        );
        Ok(Self {
            config,
            topology,
            viewport,
            extent,
            records,
            pointer_ndc: None,
            disposed: false,
        })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn extent(&self) -> FieldExtent {
        self.extent
    }

    pub fn instance_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Pointer in normalized device coordinates (`[-1, 1]`, y up), or `None`
    /// when the pointer has left the surface.
    pub fn set_pointer(&mut self, ndc: Option<Vec2>) {
        self.pointer_ndc = ndc.filter(|p| p.is_finite());
    }

    /// Pointer projected onto the field plane.
    pub fn pointer_world(&self) -> Option<Vec3> {
        let p = self.pointer_ndc?;
        Some(Vec3::new(
            p.x * self.extent.half_width * self.config.pointer.scale_x,
            0.0,
            -p.y * self.extent.half_depth * self.config.pointer.scale_z,
        ))
    }

    /// Re-layout for a new viewport. Invalid sizes leave the field untouched.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), FieldError> {
        let viewport = viewport.validate()?;
        if self.disposed {
            return Ok(());
        }
        self.viewport = viewport;
        self.extent = FieldExtent::from_viewport(viewport, self.config.half_extent);
        relayout(&mut self.records, &self.topology.layout(self.extent));
        tracing::debug!(width = viewport.width, height = viewport.height, "field resized");
        Ok(())
    }

    /// Write every instance for simulated time `elapsed_secs`, then commit
    /// once. A disposed renderer writes and commits nothing.
    pub fn update(&self, elapsed_secs: f32, surface: &mut impl InstanceSurface) -> FrameReport {
        if self.disposed {
            return FrameReport::default();
        }
        let _span = tracing::info_span!("field_update", instances = self.records.len()).entered();

        let cfg = &self.config;
        let t = elapsed_secs * cfg.time_scale;
        let pointer = self.pointer_world();
        let mut report = FrameReport::default();

        for (index, record) in self.records.iter().enumerate() {
            let (transform, color) = self.instance_state(record, t, pointer);
            if !transform.is_finite() || !color.is_finite() {
                report.skipped += 1;
                if cfg!(debug_assertions) {
                    tracing::debug!(index, "skipping non-finite instance");
                }
                continue;
            }
            let result = surface
                .set_instance_transform(index, transform)
                .and_then(|()| surface.set_instance_color(index, color));
            match result {
                Ok(()) => report.written += 1,
                Err(err) => {
                    report.skipped += 1;
                    if cfg!(debug_assertions) {
                        tracing::debug!(index, %err, "instance write failed");
                    }
                }
            }
        }

        surface.commit();
        tracing::trace!(written = report.written, skipped = report.skipped, "field committed");
        report
    }

    fn instance_state(&self, record: &InstanceRecord, t: f32, pointer: Option<Vec3>) -> (Mat4, Color) {
        let cfg = &self.config;
        let base = record.base_position;

        let act = pointer
            .map(|p| {
                let d = Vec2::new(base.x - p.x, base.z - p.z).length();
                activation(d, cfg.interaction_radius)
            })
            .unwrap_or(0.0);
        let fade = edge_fade(
            self.extent.normalized_radius(base),
            cfg.fade.start,
            cfg.fade.end,
        );

        let y = breathing(cfg.breathing_amplitude, cfg.breathing_speed, t, record.phase)
            + cfg.lift * act;
        let scale = record.base_scale * (1.0 + cfg.scale_boost * act) * fade;
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            Quat::IDENTITY,
            Vec3::new(base.x, base.y + y, base.z),
        );

        let mixed = cfg
            .base_color
            .lerp(cfg.accent_color, color_mix(act, cfg.color_gain));
        (transform, mixed.with_alpha(mixed.a * fade))
    }

    /// Release instance data. Later updates write nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.records = Vec::new();
        self.pointer_ndc = None;
        self.disposed = true;
        tracing::debug!("field renderer disposed");
    }
}
