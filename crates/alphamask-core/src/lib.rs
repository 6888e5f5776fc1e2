//! Alpha Mask Core — orthographic depth capture and channel-masked export.
//!
//! A capture positions a virtual top-down orthographic camera over a region,
//! asks an [`OrthographicDepthSource`] to render visualized depth into an
//! off-screen square target, and reads it back as a [`PixelGrid`]. The
//! [`MaskWriter`] then keeps one colour channel (or all of them) and writes
//! a 16-bit PNG with a timestamped name. No GPU or framework dependencies;
//! backends live in their own crates.

pub mod camera;
pub mod capture;
pub mod clock;
pub mod config;
pub mod creator;
pub mod error;
pub mod grid;
pub mod mask;
pub mod software;
pub mod writer;

// Re-exports for convenience.
pub use camera::{OrthoCamera, ViewportRect};
pub use capture::{CaptureDevice, OrthographicDepthSource, RenderTargetId, capture};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CAMERA_PRESETS, CaptureConfig, ChannelMode, Resolution};
pub use creator::AlphaMaskCreator;
pub use error::CaptureError;
pub use grid::PixelGrid;
pub use writer::{MaskWriter, OutputFile, TextureKind};
