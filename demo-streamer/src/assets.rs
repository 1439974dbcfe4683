use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use streamline::base::ResourceId;

// On-disk formats. A real engine would get these from an asset pipeline, the demo writes them
// itself on startup.

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MeshData {
    // Using f32 arrays for serde support
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    // RGBA8
    pub pixels: Vec<u8>,
}

pub fn asset_path(
    root: &Path,
    id: ResourceId,
) -> PathBuf {
    root.join(format!("{:0>32x}.bin", id.as_u128()))
}

pub fn write_asset<T: Serialize>(
    root: &Path,
    id: ResourceId,
    data: &T,
) -> std::io::Result<()> {
    let bytes = bincode::serialize(data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(asset_path(root, id), bytes)
}

pub fn grid_mesh(size: u32) -> MeshData {
    let mut positions = Vec::default();
    for y in 0..=size {
        for x in 0..=size {
            positions.push([x as f32, 0.0, y as f32]);
        }
    }

    let stride = size + 1;
    let mut indices = Vec::default();
    for y in 0..size {
        for x in 0..size {
            let i = y * stride + x;
            indices.extend_from_slice(&[i, i + stride, i + 1, i + 1, i + stride, i + stride + 1]);
        }
    }

    MeshData { positions, indices }
}

pub fn checker_texture(size: u32) -> TextureData {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let value = if (x / 8 + y / 8) % 2 == 0 { 255 } else { 32 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }

    TextureData {
        width: size,
        height: size,
        pixels,
    }
}
