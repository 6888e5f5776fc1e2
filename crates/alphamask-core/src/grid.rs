//! In-memory sample grid produced by a capture.

use crate::error::CaptureError;

/// One `[r, g, b]` sample, 16-bit unsigned normalized per channel.
pub type Rgb16 = [u16; 3];

/// Quantize a `[0, 1]` intensity to 16-bit unorm. Out-of-range and NaN
/// values clamp (NaN maps to 0).
pub fn quantize_unorm16(value: f32) -> u16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

/// Square grid of RGB16 samples. Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    size: u32,
    pixels: Vec<Rgb16>,
}

impl PixelGrid {
    /// A black `size × size` grid.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![[0; 3]; sample_count(size)],
        }
    }

    /// Wrap existing samples; the length must be exactly `size²`.
    pub fn from_pixels(size: u32, pixels: Vec<Rgb16>) -> Result<Self, CaptureError> {
        let expected = sample_count(size);
        if pixels.len() != expected {
            return Err(CaptureError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { size, pixels })
    }

    /// Build a grid from single-channel depth intensities, replicating each
    /// quantized value into all three channels.
    pub fn from_depth(size: u32, intensities: &[f32]) -> Result<Self, CaptureError> {
        let pixels = intensities
            .iter()
            .map(|&v| {
                let q = quantize_unorm16(v);
                [q, q, q]
            })
            .collect();
        Self::from_pixels(size, pixels)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size
    }

    pub fn height(&self) -> u32 {
        self.size
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb16 {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Rgb16) {
        let i = self.index(x, y);
        self.pixels[i] = value;
    }

    pub fn pixels(&self) -> &[Rgb16] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb16] {
        &mut self.pixels
    }

    /// Flattened `r, g, b, r, g, b, …` samples.
    pub fn as_flat(&self) -> &[u16] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Consume the grid into flattened samples.
    pub fn into_flat(self) -> Vec<u16> {
        self.as_flat().to_vec()
    }

    /// Values of a single channel (0 = R, 1 = G, 2 = B) in row-major order.
    pub fn channel(&self, channel: usize) -> Vec<u16> {
        self.pixels.iter().map(|px| px[channel]).collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.size && y < self.size, "({x}, {y}) out of bounds");
        y as usize * self.size as usize + x as usize
    }
}

fn sample_count(size: u32) -> usize {
    size as usize * size as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_unorm16_endpoints_and_clamp() {
        assert_eq!(quantize_unorm16(0.0), 0);
        assert_eq!(quantize_unorm16(1.0), u16::MAX);
        assert_eq!(quantize_unorm16(0.5), 32768);
        assert_eq!(quantize_unorm16(-3.0), 0);
        assert_eq!(quantize_unorm16(7.0), u16::MAX);
        assert_eq!(quantize_unorm16(f32::NAN), 0);
    }

    #[test]
    fn test_from_depth_replicates_into_rgb() {
        let grid = PixelGrid::from_depth(2, &[0.0, 1.0, 0.5, 0.25]).unwrap();
        assert_eq!(grid.get(1, 0), [u16::MAX; 3]);
        assert_eq!(grid.get(0, 1), [32768; 3]);
        assert_eq!(grid.channel(0), grid.channel(2));
    }

    #[test]
    fn test_from_pixels_rejects_wrong_length() {
        let err = PixelGrid::from_pixels(4, vec![[0; 3]; 15]).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::SizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_set_get_and_flat_layout() {
        let mut grid = PixelGrid::new(3);
        grid.set(2, 1, [1, 2, 3]);
        assert_eq!(grid.get(2, 1), [1, 2, 3]);

        let flat = grid.as_flat();
        assert_eq!(flat.len(), 27);
        let base = (3 + 2) * 3;
        assert_eq!(&flat[base..base + 3], &[1, 2, 3]);
    }
}
