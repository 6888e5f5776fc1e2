//! GPU-to-CPU readback of rendered depth targets.

use std::sync::mpsc;

use crate::error::GpuError;

/// `width * bytes_per_pixel` rounded up to the copy row alignment.
pub fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unpadded = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copy a square `R32Float` texture into a staging buffer, block until it is
/// mapped, and return the tightly packed rows.
pub fn read_r32float(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: u32,
) -> Result<Vec<f32>, GpuError> {
    let unpadded = (size * 4) as usize;
    let padded = padded_bytes_per_row(size, 4);

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("alphamask_depth_staging"),
        size: padded as u64 * size as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("alphamask_depth_readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(size),
            },
        },
        wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::wait_indefinitely())?;
    rx.recv().map_err(|_| GpuError::MapCallbackDropped)??;

    let data = slice.get_mapped_range();
    let mut values = Vec::with_capacity(size as usize * size as usize);
    for row in data.chunks_exact(padded as usize) {
        values.extend(bytemuck::pod_collect_to_vec::<u8, f32>(&row[..unpadded]));
    }
    drop(data);
    staging.unmap();

    Ok(values)
}
