use std::path::PathBuf;

/// Everything that can stop a capture-to-file invocation.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("depth visualization is not supported by the {backend} backend")]
    UnsupportedBackend { backend: String },
    #[error("unsupported resolution {0}; expected one of 256, 512, 1024, 2048, 4096, 8192")]
    UnsupportedResolution(u32),
    #[error("orthographic half-extent must be finite and greater than the near clip plane, got {0}")]
    InvalidHalfExtent(f32),
    #[error("render backend error: {0}")]
    Backend(String),
    #[error("pixel grid holds {actual} samples, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("invalid capture configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl CaptureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
