use bytemuck::{Pod, Zeroable};
use driftfield_common::Color;
use driftfield_field::{InstanceSurface, SurfaceError};
use glam::Mat4;

/// Per-instance vertex data, laid out for the field shader. The zeroed
/// default has zero scale, so unwritten slots draw nothing.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

/// CPU copy of the GPU instance buffer.
///
/// Writes land here; `commit` marks the batch ready and the renderer uploads
/// it on the next draw. Uncommitted writes are never uploaded.
#[derive(Debug, Clone)]
pub struct InstanceStaging {
    instances: Vec<InstanceData>,
    dirty: bool,
    committed: bool,
    commits: u64,
}

impl InstanceStaging {
    pub fn new(capacity: usize) -> Self {
        Self {
            instances: vec![InstanceData::default(); capacity],
            dirty: false,
            committed: false,
            commits: 0,
        }
    }

    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    /// Whether a committed batch is waiting for upload.
    pub fn needs_upload(&self) -> bool {
        self.committed
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Hand the committed batch to the uploader and clear the flag.
    pub fn take_committed(&mut self) -> Option<&[InstanceData]> {
        if !self.committed {
            return None;
        }
        self.committed = false;
        Some(&self.instances)
    }

    fn slot(&mut self, index: usize) -> Result<&mut InstanceData, SurfaceError> {
        let capacity = self.instances.len();
        self.instances
            .get_mut(index)
            .ok_or(SurfaceError::OutOfRange { index, capacity })
    }
}

impl InstanceSurface for InstanceStaging {
    fn capacity(&self) -> usize {
        self.instances.len()
    }

    fn set_instance_transform(
        &mut self,
        index: usize,
        transform: Mat4,
    ) -> Result<(), SurfaceError> {
        let cols = transform.to_cols_array_2d();
        let slot = self.slot(index)?;
        slot.model_0 = cols[0];
        slot.model_1 = cols[1];
        slot.model_2 = cols[2];
        slot.model_3 = cols[3];
        self.dirty = true;
        Ok(())
    }

    fn set_instance_color(&mut self, index: usize, color: Color) -> Result<(), SurfaceError> {
        self.slot(index)?.color = color.to_array();
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) {
        if self.dirty {
            self.committed = true;
            self.dirty = false;
            self.commits += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn writes_reach_upload_only_after_commit() {
        let mut s = InstanceStaging::new(4);
        s.set_instance_transform(2, Mat4::from_translation(glam::Vec3::X))
            .unwrap();
        assert!(!s.needs_upload());
        assert!(s.take_committed().is_none());

        s.commit();
        let batch = s.take_committed().unwrap();
        assert_eq!(batch[2].model_3, [1.0, 0.0, 0.0, 1.0]);
        assert!(!s.needs_upload());
    }

    #[test]
    fn empty_commit_is_not_an_upload() {
        let mut s = InstanceStaging::new(2);
        s.commit();
        assert!(!s.needs_upload());
        assert_eq!(s.commits(), 0);
    }

    #[test]
    fn out_of_range_write_rejected() {
        let mut s = InstanceStaging::new(1);
        assert_eq!(
            s.set_instance_color(3, Color::WHITE),
            Err(SurfaceError::OutOfRange {
                index: 3,
                capacity: 1
            })
        );
    }

    #[test]
    fn works_as_field_surface() {
        use driftfield_field::{FieldConfig, InstancedFieldRenderer, Viewport};
        use driftfield_profile::{PerformanceTier, get_settings};

        let renderer = InstancedFieldRenderer::new(
            FieldConfig::default(),
            &get_settings(PerformanceTier::Low),
            Viewport::new(640.0, 480.0),
        )
        .unwrap();
        let mut s = InstanceStaging::new(renderer.instance_count());
        let report = renderer.update(0.25, &mut s);
        assert_eq!(report.written, 400);
        assert_eq!(s.commits(), 1);
        assert!(s.needs_upload());
    }
}
