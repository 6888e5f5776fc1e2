//! Triangle meshes drawn by the GPU depth source.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::GpuError;

/// CPU-side indexed triangle list in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl SceneMesh {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Axis-aligned box between `min` and `max`.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let positions = vec![
            [min.x, min.y, min.z],
            [max.x, min.y, min.z],
            [max.x, max.y, min.z],
            [min.x, max.y, min.z],
            [min.x, min.y, max.z],
            [max.x, min.y, max.z],
            [max.x, max.y, max.z],
            [min.x, max.y, max.z],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 0, 2, 3, // -z
            4, 6, 5, 4, 7, 6, // +z
            0, 4, 5, 0, 5, 1, // -y
            3, 2, 6, 3, 6, 7, // +y
            0, 3, 7, 0, 7, 4, // -x
            1, 5, 6, 1, 6, 2, // +x
        ];
        Self { positions, indices }
    }

    /// Horizontal square of half-size `half_size` centred on the origin at
    /// `height`.
    pub fn ground(height: f32, half_size: f32) -> Self {
        let h = half_size;
        Self {
            positions: vec![
                [-h, height, -h],
                [h, height, -h],
                [h, height, h],
                [-h, height, h],
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    /// Regular grid of heights, `columns × rows` samples spaced `cell`
    /// apart and centred on the origin. `heights` is row-major along +z.
    ///
    /// Fails when `heights` does not hold exactly `columns * rows` samples
    /// or that product does not fit a `u32` index.
    pub fn heightfield(
        heights: &[f32],
        columns: u32,
        rows: u32,
        cell: f32,
    ) -> Result<Self, GpuError> {
        let invalid = || GpuError::InvalidHeightfield {
            columns,
            rows,
            samples: heights.len(),
        };
        let samples = columns.checked_mul(rows).ok_or_else(invalid)?;
        if heights.len() != samples as usize {
            return Err(invalid());
        }
        let origin_x = -(columns.saturating_sub(1) as f32) * cell / 2.0;
        let origin_z = -(rows.saturating_sub(1) as f32) * cell / 2.0;

        let mut positions = Vec::with_capacity(heights.len());
        for row in 0..rows {
            for col in 0..columns {
                positions.push([
                    origin_x + col as f32 * cell,
                    heights[(row * columns + col) as usize],
                    origin_z + row as f32 * cell,
                ]);
            }
        }

        let mut indices = Vec::new();
        for row in 0..rows.saturating_sub(1) {
            for col in 0..columns.saturating_sub(1) {
                let i = row * columns + col;
                indices.extend_from_slice(&[i, i + columns, i + 1, i + 1, i + columns, i + columns + 1]);
            }
        }
        Ok(Self { positions, indices })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A mesh uploaded to vertex/index buffers.
pub(crate) struct GpuMesh {
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &SceneMesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("alphamask_mesh_vertices"),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("alphamask_mesh_indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}
