use alphamask_core::{CaptureError, RenderTargetId};

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("GPU poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("readback callback was dropped before completing")]
    MapCallbackDropped,
    #[error("unknown render target {0:?}")]
    UnknownTarget(RenderTargetId),
    #[error("render target size {size} exceeds the device limit of {limit}")]
    TargetTooLarge { size: u32, limit: u32 },
    #[error("{samples} heights cannot form a {columns}×{rows} heightfield with u32 indices")]
    InvalidHeightfield {
        columns: u32,
        rows: u32,
        samples: usize,
    },
}

impl From<GpuError> for CaptureError {
    fn from(e: GpuError) -> Self {
        CaptureError::Backend(e.to_string())
    }
}
