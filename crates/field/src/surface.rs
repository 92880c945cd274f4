use std::collections::BTreeSet;

use driftfield_common::Color;
use glam::Mat4;

/// Errors a surface may report for a single instance write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("instance {index} out of range (capacity {capacity})")]
    OutOfRange { index: usize, capacity: usize },
    #[error("surface rejected instance {0}")]
    Rejected(usize),
}

/// Destination of per-frame instance updates: a GPU instance buffer, or a
/// recorder in headless runs.
///
/// Writes are staged; `commit` publishes the batch. A renderer calls `commit`
/// exactly once per pass, after every write.
pub trait InstanceSurface {
    fn capacity(&self) -> usize;

    fn set_instance_transform(&mut self, index: usize, transform: Mat4)
    -> Result<(), SurfaceError>;

    fn set_instance_color(&mut self, index: usize, color: Color) -> Result<(), SurfaceError>;

    fn commit(&mut self);
}

/// Headless surface that keeps the last written values and counts every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    transforms: Vec<Mat4>,
    colors: Vec<Color>,
    transform_writes: Vec<u32>,
    color_writes: Vec<u32>,
    total_writes: u64,
    commits: u64,
    failing: BTreeSet<usize>,
}

impl RecordingSurface {
    pub fn new(capacity: usize) -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY; capacity],
            colors: vec![Color::default(); capacity],
            transform_writes: vec![0; capacity],
            color_writes: vec![0; capacity],
            ..Self::default()
        }
    }

    /// Make writes to `index` fail with [`SurfaceError::Rejected`].
    pub fn fail_on(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn transform(&self, index: usize) -> Option<Mat4> {
        self.transforms.get(index).copied()
    }

    pub fn color(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    /// Successful transform plus colour writes since creation or the last
    /// [`RecordingSurface::clear_counts`].
    pub fn total_writes(&self) -> u64 {
        self.total_writes
    }

    pub fn transform_writes(&self, index: usize) -> u32 {
        self.transform_writes.get(index).copied().unwrap_or(0)
    }

    pub fn color_writes(&self, index: usize) -> u32 {
        self.color_writes.get(index).copied().unwrap_or(0)
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn clear_counts(&mut self) {
        self.transform_writes.iter_mut().for_each(|c| *c = 0);
        self.color_writes.iter_mut().for_each(|c| *c = 0);
        self.total_writes = 0;
        self.commits = 0;
    }

    fn check(&self, index: usize) -> Result<(), SurfaceError> {
        if index >= self.transforms.len() {
            return Err(SurfaceError::OutOfRange {
                index,
                capacity: self.transforms.len(),
            });
        }
        if self.failing.contains(&index) {
            return Err(SurfaceError::Rejected(index));
        }
        Ok(())
    }
}

impl InstanceSurface for RecordingSurface {
    fn capacity(&self) -> usize {
        self.transforms.len()
    }

    fn set_instance_transform(
        &mut self,
        index: usize,
        transform: Mat4,
    ) -> Result<(), SurfaceError> {
        self.check(index)?;
        self.transforms[index] = transform;
        self.transform_writes[index] += 1;
        self.total_writes += 1;
        Ok(())
    }

    fn set_instance_color(&mut self, index: usize, color: Color) -> Result<(), SurfaceError> {
        self.check(index)?;
        self.colors[index] = color;
        self.color_writes[index] += 1;
        self.total_writes += 1;
        Ok(())
    }

    fn commit(&mut self) {
        self.commits += 1;
    }
}
