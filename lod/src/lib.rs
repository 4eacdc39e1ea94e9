//! Heightmap terrain baking and distance based LOD selection.
//!
//! ```no_run
//! use glam::Vec3;
//! use terrain_lod::{load_and_bake, BakeSettings, HeightmapOptions, LodSelector, LodTuning};
//!
//! let baked = load_and_bake("heightmap.png", &HeightmapOptions::default(), &BakeSettings::default())?;
//! let mut selector = LodSelector::new(&baked.chunks);
//! let camera = Vec3::new(256.0, 40.0, 256.0);
//! selector.update(&LodTuning::default(), camera);
//! for (chunk, choice) in selector.select_all(camera).into_iter().enumerate() {
//!     if let Some(lod) = choice.level() {
//!         let range = baked.chunks.lod_range(chunk as u32, lod);
//!         println!("chunk {chunk}: {} indices from {}", range.num_indices, range.start_index);
//!     }
//! }
//! # Ok::<(), terrain_lod::BakeError>(())
//! ```

pub mod bake;
pub mod clipmap;
mod error;
pub mod heightmap;
pub mod select;
pub mod vertex;

pub use bake::{bake, load_and_bake, BakeSettings, BakedTerrain, ChunkLayout, ChunkTable, LodRange};
pub use clipmap::{generate_ring, hole_span, ring_grid_vertices, ClipmapRingConstants, ClipmapRings};
pub use error::{BakeError, LoadError};
pub use heightmap::{load_heightmap, HeightField, HeightmapOptions};
pub use select::{
    height_modifier, select_lod, DrawDistanceTable, LodChoice, LodSelector, LodTuning,
};
pub use vertex::TerrainVertex;
