//! Orthographic top-down camera model.
//!
//! World space is right-handed with +Y up. A camera looks along its local
//! -Z axis; the capture camera is pitched down 90° so it looks along -Y and
//! its image "up" points towards world -Z.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::config::CaptureConfig;

/// Near clip distance used by every capture.
pub const DEFAULT_NEAR_CLIP: f32 = 0.3;

/// Normalized viewport rectangle inside the presenting surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Fit a 1:1 viewport into a `screen_width × screen_height` surface.
    ///
    /// Wider surfaces get pillarbox bars, taller ones letterbox bars.
    /// Degenerate surfaces fall back to the full rect.
    pub fn fit_square(screen_width: f32, screen_height: f32) -> Self {
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return Self::FULL;
        }
        let screen_ratio = screen_width / screen_height;
        let target_ratio = 1.0;

        if (screen_ratio - target_ratio).abs() <= f32::EPSILON * 8.0 {
            Self::FULL
        } else if screen_ratio > target_ratio {
            let width = target_ratio / screen_ratio;
            Self {
                x: (1.0 - width) / 2.0,
                y: 0.0,
                width,
                height: 1.0,
            }
        } else {
            let height = screen_ratio / target_ratio;
            Self {
                x: 0.0,
                y: (1.0 - height) / 2.0,
                width: 1.0,
                height,
            }
        }
    }
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A virtual orthographic camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub near: f32,
    pub far: f32,
    /// Orthographic half-size along the vertical image axis.
    pub half_extent: f32,
    /// Width / height.
    pub aspect: f32,
    pub viewport: ViewportRect,
}

impl OrthoCamera {
    /// Camera above `center` (world x/z) looking straight down, with its
    /// height and far clip equal to `half_extent`.
    pub fn top_down(center: Vec2, half_extent: f32) -> Self {
        Self {
            position: Vec3::new(center.x, half_extent, center.y),
            rotation: Quat::from_rotation_x(-FRAC_PI_2),
            near: DEFAULT_NEAR_CLIP,
            far: half_extent,
            half_extent,
            aspect: 1.0,
            viewport: ViewportRect::FULL,
        }
    }

    /// The camera a capture renders with: square aspect, full viewport.
    pub fn for_capture(config: &CaptureConfig) -> Self {
        let [x, z] = config.region_center;
        Self::top_down(Vec2::new(x, z), config.half_extent)
    }

    /// Quick-size adjustment: ortho size, far clip and height move together,
    /// the horizontal position stays.
    pub fn set_half_extent(&mut self, size: f32) {
        self.half_extent = size;
        self.far = size;
        self.position.y = size;
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Right-handed orthographic projection with a `[0, 1]` depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        let half_w = self.half_extent * self.aspect;
        let half_h = self.half_extent;
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space origin of the ray through the centre of pixel `(px, py)`
    /// on a `size × size` target. Row 0 is the top of the image.
    pub fn pixel_ray_origin(&self, px: u32, py: u32, size: u32) -> Vec3 {
        let size = size as f32;
        let ndc_x = (px as f32 + 0.5) / size * 2.0 - 1.0;
        let ndc_y = 1.0 - (py as f32 + 0.5) / size * 2.0;
        self.position
            + self.right() * (ndc_x * self.half_extent * self.aspect)
            + self.up() * (ndc_y * self.half_extent)
    }

    /// Map a linear view depth to the visualized intensity.
    ///
    /// Depths inside `[near, far]` map linearly from 1 (near) to 0 (far);
    /// anything clipped returns `None` and renders as the black clear colour.
    pub fn depth_intensity(&self, depth: f32) -> Option<f32> {
        if !(self.near..=self.far).contains(&depth) {
            return None;
        }
        let range = self.far - self.near;
        if range <= 0.0 {
            return Some(1.0);
        }
        Some(1.0 - (depth - self.near) / range)
    }
}
