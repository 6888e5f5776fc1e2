//! The two user-facing actions: "Create Alpha Mask" and "Create Brush
//! Texture", plus camera quick-size adjustments.

use crate::capture::{CaptureDevice, OrthographicDepthSource};
use crate::clock::{Clock, SystemClock};
use crate::config::{CaptureConfig, check_half_extent};
use crate::error::CaptureError;
use crate::writer::{MaskWriter, OutputFile, TextureKind};

/// Owns a capture device, the current settings and a clock.
pub struct AlphaMaskCreator<S, C = SystemClock> {
    config: CaptureConfig,
    device: CaptureDevice<S>,
    clock: C,
}

impl<S: OrthographicDepthSource> AlphaMaskCreator<S, SystemClock> {
    pub fn new(config: CaptureConfig, source: S) -> Self {
        Self {
            config,
            device: CaptureDevice::new(source),
            clock: SystemClock,
        }
    }
}

impl<S: OrthographicDepthSource, C: Clock + Clone> AlphaMaskCreator<S, C> {
    pub fn with_clock<D: Clock + Clone>(self, clock: D) -> AlphaMaskCreator<S, D> {
        AlphaMaskCreator {
            config: self.config,
            device: self.device,
            clock,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CaptureConfig {
        &mut self.config
    }

    pub fn device(&self) -> &CaptureDevice<S> {
        &self.device
    }

    /// Resize the capture region. Ortho size, far clip and camera height
    /// all follow `size`; the horizontal position is kept.
    pub fn apply_camera_preset(&mut self, size: f32) -> Result<(), CaptureError> {
        check_half_extent(size)?;
        self.config.half_extent = size;
        Ok(())
    }

    /// Move the capture camera to world `(x, z)`.
    pub fn move_to(&mut self, x: f32, z: f32) {
        self.config.region_center = [x, z];
    }

    /// Capture and write an RGB alpha mask.
    pub fn create_alpha_mask(&self) -> Result<OutputFile, CaptureError> {
        self.create(TextureKind::AlphaMask)
    }

    /// Capture and write a 16-bit single-channel brush texture.
    pub fn create_brush_texture(&self) -> Result<OutputFile, CaptureError> {
        self.create(TextureKind::BrushTexture)
    }

    fn create(&self, kind: TextureKind) -> Result<OutputFile, CaptureError> {
        let result = self.device.capture(&self.config).and_then(|grid| {
            MaskWriter::new(self.config.logical_name.clone())
                .with_kind(kind)
                .with_clock(self.clock.clone())
                .write_masked(grid, self.config.channel, &self.config.output_dir)
        });
        if let Err(e) = &result {
            tracing::error!("{kind:?} creation failed: {e}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{CAMERA_PRESETS, ChannelMode, Resolution};
    use crate::software::{Primitive, SoftwareDepthSource};
    use chrono::NaiveDate;
    use glam::Vec3;

    fn make_creator(dir: &std::path::Path) -> AlphaMaskCreator<SoftwareDepthSource, FixedClock> {
        let config = CaptureConfig {
            resolution: Resolution::R256,
            half_extent: 10.0,
            channel: ChannelMode::Red,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let source = SoftwareDepthSource::new().with_primitive(Primitive::Sphere {
            center: Vec3::ZERO,
            radius: 4.0,
        });
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        AlphaMaskCreator::new(config, source).with_clock(FixedClock(now))
    }

    #[test]
    fn test_camera_presets_update_half_extent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut creator = make_creator(tmp.path());
        creator.move_to(3.0, 4.0);
        for size in CAMERA_PRESETS {
            creator.apply_camera_preset(size).unwrap();
            assert_eq!(creator.config().half_extent, size);
            assert_eq!(creator.config().region_center, [3.0, 4.0]);
        }
        for size in [0.0, 0.25, crate::camera::DEFAULT_NEAR_CLIP] {
            assert!(matches!(
                creator.apply_camera_preset(size),
                Err(CaptureError::InvalidHalfExtent(_))
            ));
        }
        assert_eq!(creator.config().half_extent, 500.0);
    }

    #[test]
    fn test_create_alpha_mask_writes_rgb16() {
        let tmp = tempfile::tempdir().unwrap();
        let creator = make_creator(tmp.path());
        let out = creator.create_alpha_mask().unwrap();
        assert_eq!(
            out.path.file_name().unwrap().to_str().unwrap(),
            "Texture - 2024.03.01 - 12.00.00.00.png"
        );
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb16);
        assert_eq!(creator.device().with_source(|s| s.live_targets()), 0);
    }

    #[test]
    fn test_create_brush_texture_writes_luma16() {
        let tmp = tempfile::tempdir().unwrap();
        let creator = make_creator(tmp.path());
        let out = creator.create_brush_texture().unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L16);
        assert_eq!((decoded.width(), decoded.height()), (256, 256));
    }

    #[test]
    fn test_unsupported_backend_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("masks");
        let config = CaptureConfig {
            resolution: Resolution::R256,
            output_dir: out_dir.clone(),
            ..Default::default()
        };
        let creator =
            AlphaMaskCreator::new(config, SoftwareDepthSource::new().without_depth_support());
        assert!(matches!(
            creator.create_alpha_mask(),
            Err(CaptureError::UnsupportedBackend { .. })
        ));
        assert!(!out_dir.exists());
    }
}
