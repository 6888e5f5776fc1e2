//! Depth capture against a pluggable rendering backend.

use parking_lot::Mutex;

use crate::camera::OrthoCamera;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::grid::PixelGrid;

/// Opaque handle to an off-screen render target owned by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub u64);

/// A rendering backend that can draw scene depth from an orthographic
/// camera into an off-screen square target and read it back.
pub trait OrthographicDepthSource {
    /// Label used in errors and logs.
    fn backend_name(&self) -> &str;

    /// Whether the depth-visualization path is available.
    fn supports_depth_visualization(&self) -> bool;

    /// Allocate a `size × size` off-screen target.
    fn create_target(&mut self, size: u32) -> Result<RenderTargetId, CaptureError>;

    /// Render visualized depth into `target`. Blocks until the frame is done.
    fn render_depth(
        &mut self,
        camera: &OrthoCamera,
        target: RenderTargetId,
    ) -> Result<(), CaptureError>;

    /// Read `target` back into a grid.
    fn read_target(&mut self, target: RenderTargetId) -> Result<PixelGrid, CaptureError>;

    /// Free `target`. Unknown ids are ignored.
    fn release_target(&mut self, target: RenderTargetId);
}

/// Releases its render target when dropped.
struct TargetGuard<'a, S: OrthographicDepthSource + ?Sized> {
    source: &'a mut S,
    id: RenderTargetId,
}

impl<'a, S: OrthographicDepthSource + ?Sized> TargetGuard<'a, S> {
    fn acquire(source: &'a mut S, size: u32) -> Result<Self, CaptureError> {
        let id = source.create_target(size)?;
        Ok(Self { source, id })
    }

    fn render(&mut self, camera: &OrthoCamera) -> Result<(), CaptureError> {
        self.source.render_depth(camera, self.id)
    }

    fn read(&mut self) -> Result<PixelGrid, CaptureError> {
        self.source.read_target(self.id)
    }
}

impl<S: OrthographicDepthSource + ?Sized> Drop for TargetGuard<'_, S> {
    fn drop(&mut self) {
        self.source.release_target(self.id);
    }
}

/// Render the region described by `config` and return its depth grid.
///
/// The grid is exactly `resolution × resolution`. The temporary render
/// target is released on every exit path.
pub fn capture<S: OrthographicDepthSource + ?Sized>(
    config: &CaptureConfig,
    source: &mut S,
) -> Result<PixelGrid, CaptureError> {
    config.validate()?;

    if !source.supports_depth_visualization() {
        tracing::error!(
            "depth visualization is not supported by the {} backend",
            source.backend_name()
        );
        return Err(CaptureError::UnsupportedBackend {
            backend: source.backend_name().to_string(),
        });
    }

    let camera = OrthoCamera::for_capture(config);
    let size = config.resolution.pixels();
    tracing::debug!(
        size,
        half_extent = config.half_extent,
        backend = source.backend_name(),
        "capturing depth"
    );

    let mut target = TargetGuard::acquire(source, size)?;
    target.render(&camera)?;
    let grid = target.read()?;

    if grid.size() != size {
        return Err(CaptureError::SizeMismatch {
            expected: config.resolution.sample_count(),
            actual: grid.pixels().len(),
        });
    }
    Ok(grid)
}

/// A depth source shared behind a lock so only one capture drives it at a
/// time.
pub struct CaptureDevice<S> {
    source: Mutex<S>,
}

impl<S: OrthographicDepthSource> CaptureDevice<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    /// Run [`capture`] while holding the device lock.
    pub fn capture(&self, config: &CaptureConfig) -> Result<PixelGrid, CaptureError> {
        let mut source = self.source.lock();
        capture(config, &mut *source)
    }

    /// Borrow the source under the lock, e.g. to edit its scene.
    pub fn with_source<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.source.lock())
    }

    pub fn into_inner(self) -> S {
        self.source.into_inner()
    }
}
