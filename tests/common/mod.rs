#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};
use terrain::{BenchConfig, LodStrategy};
use terrain_lod::BakeSettings;

/// Write a 16-bit grayscale PNG whose samples come from `f(x, y)`.
pub fn write_heightmap(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    f: impl Fn(u32, u32) -> u16,
) -> PathBuf {
    let path = dir.join(name);
    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)]));
    img.save(&path).expect("failed to write heightmap");
    path
}

pub fn flat_heightmap(dir: &Path, size: u32) -> PathBuf {
    write_heightmap(dir, "flat.png", size, size, |_, _| 0)
}

/// A small chunked config: 33x33 samples split into 4x4 vertex chunks.
pub fn small_config(heightmap: PathBuf) -> BenchConfig {
    BenchConfig {
        heightmap_path: heightmap,
        bake: BakeSettings {
            chunk_dim_verts: 4,
            max_lod: 2,
        },
        strategy: LodStrategy::Chunked,
        bench_frames: Some(5),
        ..Default::default()
    }
}
