use driftfield_field::{FieldAnimator, InstancedFieldRenderer, Topology};
use driftfield_motion::MotionEngine;
use driftfield_profile::{PerformanceTier, QualitySettings};
use serde::Serialize;

/// Read-only queries against a running field and motion engine, for
/// overlays and command-line reports.
pub struct FieldInspector;

impl FieldInspector {
    /// Summarize an animated field.
    pub fn summary(
        tier: PerformanceTier,
        settings: &QualitySettings,
        animator: &FieldAnimator,
    ) -> FieldSummary {
        let renderer = animator.renderer();
        FieldSummary {
            tier,
            topology: describe_topology(renderer.topology()),
            instances: renderer.instance_count(),
            target_fps: animator.target_fps(),
            achieved_fps: animator.stats().fps(),
            loop_state: animator.state().to_string(),
            visible: animator.is_visible(),
            antialias: settings.antialias,
            pixel_ratio_max: settings.pixel_ratio_range.max,
        }
    }

    /// Identity and base placement of one instance.
    pub fn inspect_instance(renderer: &InstancedFieldRenderer, index: usize) -> Option<InstanceInfo> {
        renderer.records().get(index).map(|r| InstanceInfo {
            index,
            base_position: r.base_position.to_array(),
            phase: r.phase,
            base_scale: r.base_scale,
            ring_or_depth: r.ring_or_depth,
        })
    }

    pub fn motion(engine: &MotionEngine) -> MotionSummary {
        MotionSummary {
            active_animations: engine.active_count(),
        }
    }
}

fn describe_topology(topology: Topology) -> String {
    match topology {
        Topology::Grid {
            columns,
            rows,
            spacing: Some(s),
        } => format!("grid {columns}x{rows} @ {s}"),
        Topology::Grid { columns, rows, .. } => format!("grid {columns}x{rows}"),
        Topology::Rings { rings, per_ring } => format!("rings {rings} x {per_ring}"),
    }
}

/// Summary of one animated field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub tier: PerformanceTier,
    pub topology: String,
    pub instances: usize,
    pub target_fps: u32,
    pub achieved_fps: f64,
    pub loop_state: String,
    pub visible: bool,
    pub antialias: bool,
    pub pixel_ratio_max: f32,
}

impl std::fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Field: tier={} {} instances={} fps={:.1}/{} state={} visible={}",
            self.tier,
            self.topology,
            self.instances,
            self.achieved_fps,
            self.target_fps,
            self.loop_state,
            self.visible
        )
    }
}

/// Detailed info about a single instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceInfo {
    pub index: usize,
    pub base_position: [f32; 3],
    pub phase: f32,
    pub base_scale: f32,
    pub ring_or_depth: u32,
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance #{} pos=({:.2}, {:.2}, {:.2}) phase={:.3} scale={:.3} ring={}",
            self.index,
            self.base_position[0],
            self.base_position[1],
            self.base_position[2],
            self.phase,
            self.base_scale,
            self.ring_or_depth,
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MotionSummary {
    pub active_animations: usize,
}

impl std::fmt::Display for MotionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Motion: active={}", self.active_animations)
    }
}
