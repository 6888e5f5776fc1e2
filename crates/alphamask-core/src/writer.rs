//! Channel mask writer: mask, encode as 16-bit PNG, write to disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, Luma, Rgb};

use crate::clock::{Clock, SystemClock};
use crate::config::ChannelMode;
use crate::error::CaptureError;
use crate::grid::PixelGrid;
use crate::mask::{apply_channel_mask, extract_channel};

/// How the written image lays out its channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureKind {
    /// 16-bit RGB; channels outside the mode are zero.
    #[default]
    AlphaMask,
    /// 16-bit single-channel luma holding the mode's signal channel.
    BrushTexture,
}

/// A written image: where it went and the exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// `"{name} - yyyy.MM.dd - HH.mm.ss.ff.png"`, `ff` being hundredths of a
/// second.
pub fn capture_filename(logical_name: &str, timestamp: NaiveDateTime) -> String {
    let hundredths = (timestamp.nanosecond() % 1_000_000_000) / 10_000_000;
    format!(
        "{logical_name} - {}.{hundredths:02}.png",
        timestamp.format("%Y.%m.%d - %H.%M.%S")
    )
}

/// Create `dir` and its parents if missing. Succeeds when it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), CaptureError> {
    fs::create_dir_all(dir).map_err(|e| CaptureError::io(dir, e))
}

/// Encode `grid` losslessly. Deterministic for identical input.
pub fn encode_png(
    grid: &PixelGrid,
    kind: TextureKind,
    mode: ChannelMode,
) -> Result<Vec<u8>, CaptureError> {
    let size = grid.size();
    let mut bytes = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Default, FilterType::Adaptive);

    match kind {
        TextureKind::AlphaMask => {
            let flat = grid.as_flat().to_vec();
            let actual = flat.len();
            let image: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::from_raw(size, size, flat)
                .ok_or(CaptureError::SizeMismatch {
                    expected: size as usize * size as usize * 3,
                    actual,
                })?;
            image.write_with_encoder(encoder)?;
        }
        TextureKind::BrushTexture => {
            let plane = extract_channel(grid, mode);
            let actual = plane.len();
            let image: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(size, size, plane)
                .ok_or(CaptureError::SizeMismatch {
                    expected: size as usize * size as usize,
                    actual,
                })?;
            image.write_with_encoder(encoder)?;
        }
    }
    Ok(bytes)
}

/// Masks, encodes and writes captured grids.
#[derive(Debug, Clone)]
pub struct MaskWriter<C = SystemClock> {
    logical_name: String,
    kind: TextureKind,
    clock: C,
}

impl MaskWriter<SystemClock> {
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            kind: TextureKind::default(),
            clock: SystemClock,
        }
    }
}

impl<C: Clock> MaskWriter<C> {
    pub fn with_kind(mut self, kind: TextureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_clock<D: Clock>(self, clock: D) -> MaskWriter<D> {
        MaskWriter {
            logical_name: self.logical_name,
            kind: self.kind,
            clock,
        }
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Apply `mode` to `grid`, encode it and write it into `dest_dir` under
    /// a timestamped name. The directory is created first if needed.
    pub fn write_masked(
        &self,
        mut grid: PixelGrid,
        mode: ChannelMode,
        dest_dir: &Path,
    ) -> Result<OutputFile, CaptureError> {
        ensure_dir(dest_dir)?;

        apply_channel_mask(&mut grid, mode);
        let bytes = encode_png(&grid, self.kind, mode)?;
        drop(grid);

        let path = dest_dir.join(capture_filename(&self.logical_name, self.clock.now()));
        fs::write(&path, &bytes).map_err(|e| CaptureError::io(&path, e))?;
        tracing::info!("file saved: {}", path.display());

        Ok(OutputFile { path, bytes })
    }
}
