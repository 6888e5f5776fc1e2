//! Alpha Mask GPU — wgpu depth source for orthographic captures.
//!
//! Rasterizes world-space triangle meshes with a depth-visualization shader
//! into an off-screen `R32Float` target, then reads it back as an
//! `alphamask_core::PixelGrid`. No engine dependency.

pub mod depth_source;
pub mod error;
pub mod mesh;
pub mod readback;

pub use depth_source::{DEPTH_VIS_FORMAT, GpuDepthSource, adapter_supports_depth_visualization};
pub use error::GpuError;
pub use mesh::SceneMesh;
