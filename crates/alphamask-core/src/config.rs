//! Per-invocation capture settings.
//!
//! `CaptureConfig` is the single struct a host edits and persists. The core
//! never stores it; every capture receives it by reference.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::DEFAULT_NEAR_CLIP;
use crate::error::CaptureError;

/// Camera quick-size presets, in world units.
pub const CAMERA_PRESETS: [f32; 6] = [1.0, 10.0, 50.0, 100.0, 250.0, 500.0];

/// Output image edge length. Always square and a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Resolution {
    R256,
    R512,
    R1024,
    #[default]
    R2048,
    R4096,
    R8192,
}

impl Resolution {
    /// Edge length in pixels.
    pub const fn pixels(self) -> u32 {
        match self {
            Self::R256 => 256,
            Self::R512 => 512,
            Self::R1024 => 1024,
            Self::R2048 => 2048,
            Self::R4096 => 4096,
            Self::R8192 => 8192,
        }
    }

    /// Total sample count (`pixels²`).
    pub const fn sample_count(self) -> usize {
        let edge = self.pixels() as usize;
        edge * edge
    }

    pub fn all() -> &'static [Self] {
        const ALL: [Resolution; 6] = [
            Resolution::R256,
            Resolution::R512,
            Resolution::R1024,
            Resolution::R2048,
            Resolution::R4096,
            Resolution::R8192,
        ];
        &ALL
    }
}

impl TryFrom<u32> for Resolution {
    type Error = CaptureError;

    fn try_from(pixels: u32) -> Result<Self, Self::Error> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.pixels() == pixels)
            .ok_or(CaptureError::UnsupportedResolution(pixels))
    }
}

impl From<Resolution> for u32 {
    fn from(resolution: Resolution) -> Self {
        resolution.pixels()
    }
}

/// Which colour channel carries the depth signal in the written image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChannelMode {
    #[default]
    Red,
    Green,
    Blue,
    /// Leave all three channels untouched.
    All,
}

impl ChannelMode {
    /// Human-readable label for UI menus.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::All => "All",
        }
    }

    /// Per-channel AND mask applied to every `[r, g, b]` sample, or `None`
    /// when nothing is masked.
    pub const fn keep_mask(self) -> Option<[u16; 3]> {
        match self {
            Self::Red => Some([u16::MAX, 0, 0]),
            Self::Green => Some([0, u16::MAX, 0]),
            Self::Blue => Some([0, 0, u16::MAX]),
            Self::All => None,
        }
    }

    /// Index of the channel that carries the signal. `All` reads red.
    pub const fn signal_channel(self) -> usize {
        match self {
            Self::Red | Self::All => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Settings for one capture-to-file invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Edge length of the captured and written image.
    pub resolution: Resolution,
    /// Orthographic half-size. Doubles as camera height and far clip.
    pub half_extent: f32,
    /// Channel kept by the mask writer.
    pub channel: ChannelMode,
    /// Directory the image is written into. Created on demand.
    pub output_dir: PathBuf,
    /// Horizontal `[x, z]` position of the capture camera.
    pub region_center: [f32; 2],
    /// Leading part of the generated filename.
    pub logical_name: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            half_extent: 5.0,
            channel: ChannelMode::default(),
            output_dir: PathBuf::from("AlphaMaskCreatorData"),
            region_center: [0.0, 0.0],
            logical_name: "Texture".to_string(),
        }
    }
}

/// Height and far clip both equal `half_extent`, so a value at or below the
/// near clip leaves an empty depth range.
pub fn check_half_extent(half_extent: f32) -> Result<(), CaptureError> {
    if !half_extent.is_finite() || half_extent <= DEFAULT_NEAR_CLIP {
        return Err(CaptureError::InvalidHalfExtent(half_extent));
    }
    Ok(())
}

impl CaptureConfig {
    /// Reject settings that would produce a degenerate camera.
    pub fn validate(&self) -> Result<(), CaptureError> {
        check_half_extent(self.half_extent)
    }

    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, CaptureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a persisted config file.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = std::fs::read_to_string(path).map_err(|e| CaptureError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Persist the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), CaptureError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| CaptureError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_accepts_every_supported_size() {
        for &res in Resolution::all() {
            assert_eq!(Resolution::try_from(res.pixels()).unwrap(), res);
        }
    }

    #[test]
    fn test_resolution_rejects_unsupported_sizes() {
        for pixels in [0, 255, 300, 1000, 16384] {
            let err = Resolution::try_from(pixels).unwrap_err();
            assert!(matches!(err, CaptureError::UnsupportedResolution(p) if p == pixels));
        }
    }

    #[test]
    fn test_resolution_serializes_as_integer() {
        let json = serde_json::to_string(&Resolution::R512).unwrap();
        assert_eq!(json, "512");
        assert!(serde_json::from_str::<Resolution>("513").is_err());
    }

    #[test]
    fn test_keep_mask_selects_single_channel() {
        assert_eq!(ChannelMode::Red.keep_mask(), Some([u16::MAX, 0, 0]));
        assert_eq!(ChannelMode::Green.keep_mask(), Some([0, u16::MAX, 0]));
        assert_eq!(ChannelMode::Blue.keep_mask(), Some([0, 0, u16::MAX]));
        assert_eq!(ChannelMode::All.keep_mask(), None);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution, Resolution::R2048);
        assert_eq!(config.channel, ChannelMode::Red);
        assert_eq!(config.logical_name, "Texture");
    }

    #[test]
    fn test_validate_rejects_bad_half_extent() {
        for half_extent in [0.0, -1.0, 0.25, DEFAULT_NEAR_CLIP, f32::NAN, f32::INFINITY] {
            let config = CaptureConfig {
                half_extent,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(CaptureError::InvalidHalfExtent(_))
            ));
        }
    }

    #[test]
    fn test_validate_accepts_half_extent_above_near_clip() {
        let config = CaptureConfig {
            half_extent: DEFAULT_NEAR_CLIP + 0.01,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(CAMERA_PRESETS.iter().all(|&size| check_half_extent(size).is_ok()));
    }

    #[test]
    fn test_label_names_each_mode() {
        let labels: Vec<_> = [ChannelMode::Red, ChannelMode::Green, ChannelMode::Blue, ChannelMode::All]
            .into_iter()
            .map(ChannelMode::label)
            .collect();
        assert_eq!(labels, ["Red", "Green", "Blue", "All"]);
    }

    #[test]
    fn test_json_roundtrip_with_missing_fields() {
        let config = CaptureConfig::from_json(r#"{ "resolution": 1024, "channel": "Blue" }"#)
            .unwrap();
        assert_eq!(config.resolution, Resolution::R1024);
        assert_eq!(config.channel, ChannelMode::Blue);
        assert_eq!(config.half_extent, 5.0);

        let back = CaptureConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_json_rejects_unsupported_resolution() {
        let err = CaptureConfig::from_json(r#"{ "resolution": 300 }"#).unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("capture.json");
        let config = CaptureConfig {
            resolution: Resolution::R4096,
            half_extent: 50.0,
            channel: ChannelMode::Green,
            output_dir: PathBuf::from("masks/terrain"),
            region_center: [12.5, -3.0],
            logical_name: "Cliffs".to_string(),
        };
        config.save(&path).unwrap();

        let loaded = CaptureConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.json");
        match CaptureConfig::load(&path) {
            Err(CaptureError::Io { path: failed, source }) => {
                assert_eq!(failed, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_invalid_half_extent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("capture.json");
        std::fs::write(&path, r#"{ "half_extent": 0.25 }"#).unwrap();
        assert!(matches!(
            CaptureConfig::load(&path),
            Err(CaptureError::InvalidHalfExtent(_))
        ));
    }
}
