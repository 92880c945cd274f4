//! wgpu backend for instanced fields.
//!
//! The field renderer writes into an [`InstanceStaging`] buffer on the CPU;
//! [`FieldGpuRenderer`] uploads committed batches and draws them.
//!
//! # Invariants
//! - Only committed batches reach the GPU; a frame never shows a half-written
//!   field.
//! - Antialiasing follows the tier's quality settings.
//! - The camera is presentation only and never feeds back into the field.

mod camera;
mod gpu;
mod shaders;
mod staging;

pub use camera::FieldCamera;
pub use gpu::{FieldGpuRenderer, GpuFieldOptions};
pub use staging::{InstanceData, InstanceStaging};
