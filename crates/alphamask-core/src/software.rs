//! CPU reference depth source.
//!
//! Ray-casts a handful of analytic primitives, one orthographic ray per
//! pixel centre. Useful for hosts without a GPU and as the reference the
//! GPU backend is compared against.

use std::collections::HashMap;

use glam::Vec3;

use crate::camera::OrthoCamera;
use crate::capture::{OrthographicDepthSource, RenderTargetId};
use crate::error::CaptureError;
use crate::grid::{PixelGrid, quantize_unorm16};

/// Scene geometry understood by [`SoftwareDepthSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Infinite horizontal plane at `height`.
    Ground { height: f32 },
    Sphere { center: Vec3, radius: f32 },
    /// Axis-aligned box.
    Cuboid { min: Vec3, max: Vec3 },
}

impl Primitive {
    /// Distance along `dir` (unit length) from `origin` to the first hit in
    /// front of the origin.
    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        match *self {
            Self::Ground { height } => {
                if dir.y.abs() < f32::EPSILON {
                    return None;
                }
                let t = (height - origin.y) / dir.y;
                (t >= 0.0).then_some(t)
            }
            Self::Sphere { center, radius } => {
                let oc = origin - center;
                let b = oc.dot(dir);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                let near = -b - sqrt_disc;
                let far = -b + sqrt_disc;
                if near >= 0.0 {
                    Some(near)
                } else if far >= 0.0 {
                    Some(far)
                } else {
                    None
                }
            }
            Self::Cuboid { min, max } => {
                let inv = dir.recip();
                let t0 = (min - origin) * inv;
                let t1 = (max - origin) * inv;
                let t_enter = t0.min(t1).max_element();
                let t_exit = t0.max(t1).min_element();
                if t_exit < t_enter.max(0.0) {
                    return None;
                }
                Some(t_enter.max(0.0))
            }
        }
    }
}

struct Target {
    size: u32,
    grid: Option<PixelGrid>,
}

/// Software rasterizer implementing [`OrthographicDepthSource`].
pub struct SoftwareDepthSource {
    primitives: Vec<Primitive>,
    targets: HashMap<RenderTargetId, Target>,
    next_id: u64,
    depth_supported: bool,
}

impl Default for SoftwareDepthSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDepthSource {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
            targets: HashMap::new(),
            next_id: 1,
            depth_supported: true,
        }
    }

    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Report the depth path as unavailable, as a backend without the
    /// visualization shader would.
    pub fn without_depth_support(mut self) -> Self {
        self.depth_supported = false;
        self
    }

    /// Targets allocated and not yet released.
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    /// Closest hit along the camera ray through pixel `(px, py)`.
    fn trace(&self, camera: &OrthoCamera, px: u32, py: u32, size: u32) -> Option<f32> {
        let origin = camera.pixel_ray_origin(px, py, size);
        let dir = camera.forward();
        self.primitives
            .iter()
            .filter_map(|p| p.intersect(origin, dir))
            .min_by(f32::total_cmp)
    }
}

impl OrthographicDepthSource for SoftwareDepthSource {
    fn backend_name(&self) -> &str {
        "software"
    }

    fn supports_depth_visualization(&self) -> bool {
        self.depth_supported
    }

    fn create_target(&mut self, size: u32) -> Result<RenderTargetId, CaptureError> {
        let id = RenderTargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(id, Target { size, grid: None });
        Ok(id)
    }

    fn render_depth(
        &mut self,
        camera: &OrthoCamera,
        target: RenderTargetId,
    ) -> Result<(), CaptureError> {
        let size = self
            .targets
            .get(&target)
            .map(|t| t.size)
            .ok_or_else(|| CaptureError::Backend(format!("unknown render target {target:?}")))?;

        let mut grid = PixelGrid::new(size);
        for py in 0..size {
            for px in 0..size {
                // Clipped or empty pixels keep the black clear colour.
                let Some(intensity) = self
                    .trace(camera, px, py, size)
                    .and_then(|depth| camera.depth_intensity(depth))
                else {
                    continue;
                };
                let q = quantize_unorm16(intensity);
                grid.set(px, py, [q, q, q]);
            }
        }

        if let Some(t) = self.targets.get_mut(&target) {
            t.grid = Some(grid);
        }
        Ok(())
    }

    fn read_target(&mut self, target: RenderTargetId) -> Result<PixelGrid, CaptureError> {
        let t = self
            .targets
            .get(&target)
            .ok_or_else(|| CaptureError::Backend(format!("unknown render target {target:?}")))?;
        Ok(t.grid.clone().unwrap_or_else(|| PixelGrid::new(t.size)))
    }

    fn release_target(&mut self, target: RenderTargetId) {
        self.targets.remove(&target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::DEFAULT_NEAR_CLIP;
    use glam::Vec2;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_ground_intersection() {
        let ground = Primitive::Ground { height: 2.0 };
        let t = ground.intersect(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y).unwrap();
        assert!(approx(t, 8.0));
        assert!(ground.intersect(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y).is_none());
        assert!(ground.intersect(Vec3::ZERO, Vec3::X).is_none());
    }

    #[test]
    fn test_sphere_intersection() {
        let sphere = Primitive::Sphere {
            center: Vec3::ZERO,
            radius: 2.0,
        };
        let t = sphere.intersect(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y).unwrap();
        assert!(approx(t, 8.0));
        assert!(sphere.intersect(Vec3::new(3.0, 10.0, 0.0), Vec3::NEG_Y).is_none());
    }

    #[test]
    fn test_cuboid_intersection() {
        let cuboid = Primitive::Cuboid {
            min: Vec3::new(-1.0, 0.0, -1.0),
            max: Vec3::new(1.0, 3.0, 1.0),
        };
        let t = cuboid.intersect(Vec3::new(0.5, 10.0, 0.5), Vec3::NEG_Y).unwrap();
        assert!(approx(t, 7.0));
        assert!(cuboid.intersect(Vec3::new(2.0, 10.0, 0.0), Vec3::NEG_Y).is_none());
    }

    #[test]
    fn test_render_maps_heights_to_intensity() {
        let mut source = SoftwareDepthSource::new()
            .with_primitive(Primitive::Ground { height: 0.0 })
            .with_primitive(Primitive::Cuboid {
                min: Vec3::new(-2.0, 0.0, -2.0),
                max: Vec3::new(2.0, 5.0, 2.0),
            });
        let camera = OrthoCamera::top_down(Vec2::ZERO, 10.0);
        let id = source.create_target(8).unwrap();
        source.render_depth(&camera, id).unwrap();
        let grid = source.read_target(id).unwrap();

        // Box top at y = 5 is depth 5 from the camera.
        let expected = 1.0 - (5.0 - DEFAULT_NEAR_CLIP) / (10.0 - DEFAULT_NEAR_CLIP);
        assert_eq!(grid.get(4, 4), [quantize_unorm16(expected); 3]);
        // Ground sits exactly on the far plane.
        assert_eq!(grid.get(0, 0), [0; 3]);
    }

    #[test]
    fn test_empty_scene_renders_black() {
        let mut source = SoftwareDepthSource::new();
        let camera = OrthoCamera::top_down(Vec2::ZERO, 1.0);
        let id = source.create_target(4).unwrap();
        source.render_depth(&camera, id).unwrap();
        assert_eq!(source.read_target(id).unwrap(), PixelGrid::new(4));
    }

    #[test]
    fn test_release_frees_target() {
        let mut source = SoftwareDepthSource::new();
        let id = source.create_target(4).unwrap();
        assert_eq!(source.live_targets(), 1);
        source.release_target(id);
        source.release_target(id);
        assert_eq!(source.live_targets(), 0);
        assert!(source.read_target(id).is_err());
    }
}
