//! Bakes a [`HeightField`] into a vertex array and a chunked, multi-LOD index
//! buffer.
//!
//! Every LOD level of every chunk is a contiguous run inside one shared index
//! buffer. Runs are written LOD-major, then chunk row, then chunk column, then
//! quad row and quad column. [`LodRange::start_index`] is the write cursor at
//! the start of each run, so the order must not change.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::BakeError;
use crate::heightmap::{load_heightmap, HeightField, HeightmapOptions};
use crate::vertex::{fill_vertices, TerrainVertex};

pub const INDICES_PER_QUAD: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeSettings {
    /// Vertices along one side of a chunk. Must be a power of two.
    pub chunk_dim_verts: u32,
    /// Number of LOD levels baked per chunk.
    pub max_lod: u32,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            chunk_dim_verts: 64,
            max_lod: 6,
        }
    }
}

impl BakeSettings {
    /// Largest LOD count a chunk of `chunk_dim_verts` supports.
    pub fn max_supported_lod(chunk_dim_verts: u32) -> u32 {
        chunk_dim_verts.trailing_zeros()
    }

    pub fn validate(&self) -> Result<(), BakeError> {
        if self.chunk_dim_verts < 2 || !self.chunk_dim_verts.is_power_of_two() {
            return Err(BakeError::InvalidSettings(format!(
                "chunk_dim_verts must be a power of two >= 2, got {}",
                self.chunk_dim_verts
            )));
        }
        let supported = Self::max_supported_lod(self.chunk_dim_verts);
        if self.max_lod == 0 || self.max_lod > supported {
            return Err(BakeError::InvalidSettings(format!(
                "max_lod must be in 1..={supported} for {} vertex chunks, got {}",
                self.chunk_dim_verts, self.max_lod
            )));
        }
        Ok(())
    }
}

/// Location of one LOD level of one chunk inside the shared index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LodRange {
    pub start_index: u32,
    pub num_indices: u32,
}

/// How the grid is split into chunks.
///
/// Chunk `(cx, cz)` starts at grid coordinate `(cx * chunk_dim_quads,
/// cz * chunk_dim_quads)`, so neighbouring chunks share their border vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    pub grid_width: u32,
    pub grid_height: u32,
    pub chunk_dim_verts: u32,
    pub chunk_dim_quads: u32,
    pub chunks_x: u32,
    pub chunks_z: u32,
    pub max_lod: u32,
}

impl ChunkLayout {
    pub fn new(grid_width: u32, grid_height: u32, settings: &BakeSettings) -> Result<Self, BakeError> {
        settings.validate()?;
        if grid_width as u64 * grid_height as u64 > u32::MAX as u64 {
            return Err(BakeError::InvalidSettings(format!(
                "{grid_width}x{grid_height} grid does not fit 32-bit indices"
            )));
        }

        let layout = Self {
            grid_width,
            grid_height,
            chunk_dim_verts: settings.chunk_dim_verts,
            chunk_dim_quads: settings.chunk_dim_verts - 1,
            chunks_x: grid_width / settings.chunk_dim_verts,
            chunks_z: grid_height / settings.chunk_dim_verts,
            max_lod: settings.max_lod,
        };

        let too_small = |required: u32| BakeError::GridTooSmall {
            width: grid_width,
            height: grid_height,
            required,
        };
        if layout.chunks_x == 0 || layout.chunks_z == 0 {
            return Err(too_small(settings.chunk_dim_verts));
        }
        // Coarse quads of the last chunk step one vertex past its edge.
        let extent_x = layout.indexed_extent(layout.chunks_x);
        let extent_z = layout.indexed_extent(layout.chunks_z);
        if extent_x >= grid_width || extent_z >= grid_height {
            return Err(too_small(extent_x.max(extent_z) + 1));
        }
        // LodRange offsets are 32-bit.
        let total = layout.total_indices();
        if total > u32::MAX as usize {
            return Err(BakeError::InvalidSettings(format!(
                "{grid_width}x{grid_height} grid bakes {total} indices, more than a 32-bit index range can address"
            )));
        }

        Ok(layout)
    }

    /// Highest grid coordinate any baked quad touches along an axis holding
    /// `chunks` chunks.
    fn indexed_extent(&self, chunks: u32) -> u32 {
        let reach = (0..self.max_lod)
            .map(|lod| self.quads_per_side(lod) * Self::stride(lod))
            .max()
            .unwrap_or(self.chunk_dim_quads);
        (chunks - 1) * self.chunk_dim_quads + reach
    }

    /// Grid columns and rows that no LOD level ever indexes.
    pub fn unused_samples(&self) -> (u32, u32) {
        (
            self.grid_width - 1 - self.indexed_extent(self.chunks_x),
            self.grid_height - 1 - self.indexed_extent(self.chunks_z),
        )
    }

    pub fn stride(lod: u32) -> u32 {
        1 << lod
    }

    /// Quads sampled along one side of a chunk at `lod`.
    pub fn quads_per_side(&self, lod: u32) -> u32 {
        self.chunk_dim_quads.div_ceil(Self::stride(lod))
    }

    pub fn indices_per_chunk(&self, lod: u32) -> u32 {
        let q = self.quads_per_side(lod);
        q * q * INDICES_PER_QUAD
    }

    /// Chunks along one side, for square grids.
    pub fn chunk_num_dim(&self) -> u32 {
        self.chunks_x
    }

    pub fn chunk_num_total(&self) -> u32 {
        self.chunks_x * self.chunks_z
    }

    pub fn chunk_coords(&self, chunk: u32) -> (u32, u32) {
        (chunk % self.chunks_x, chunk / self.chunks_x)
    }

    /// World space `(x, z)` of the chunk's minimum corner.
    pub fn chunk_anchor(&self, chunk: u32) -> Vec2 {
        let (cx, cz) = self.chunk_coords(chunk);
        Vec2::new(
            (cx * self.chunk_dim_quads) as f32,
            (cz * self.chunk_dim_quads) as f32,
        )
    }

    pub fn total_indices(&self) -> usize {
        let per_chunk: usize = (0..self.max_lod)
            .map(|lod| self.indices_per_chunk(lod) as usize)
            .sum();
        per_chunk * self.chunk_num_total() as usize
    }
}

/// Per chunk LOD ranges, indexed `chunk * max_lod + lod`.
#[derive(Debug, Clone)]
pub struct ChunkTable {
    layout: ChunkLayout,
    lod_ranges: Vec<LodRange>,
}

impl ChunkTable {
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.layout.chunk_num_total() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lod_ranges(&self, chunk: u32) -> &[LodRange] {
        let max_lod = self.layout.max_lod as usize;
        let start = chunk as usize * max_lod;
        &self.lod_ranges[start..start + max_lod]
    }

    pub fn lod_range(&self, chunk: u32, lod: u32) -> LodRange {
        debug_assert!(lod < self.layout.max_lod, "lod {lod} out of range");
        self.lod_ranges(chunk)[lod as usize]
    }

    pub fn anchors(&self) -> Vec<Vec2> {
        (0..self.layout.chunk_num_total())
            .map(|chunk| self.layout.chunk_anchor(chunk))
            .collect()
    }
}

/// Output of [`bake`]. The vertex and index arrays are meant to be moved into a
/// GPU upload; the chunk table stays on the CPU for LOD selection.
#[derive(Debug, Clone)]
pub struct BakedTerrain {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
    pub chunks: ChunkTable,
}

fn reserve<T>(buf: &mut Vec<T>, count: usize, what: &'static str) -> Result<(), BakeError> {
    buf.try_reserve_exact(count)
        .map_err(|_| BakeError::Allocation {
            what,
            requested: count,
        })
}

pub fn bake(field: &HeightField, settings: &BakeSettings) -> Result<BakedTerrain, BakeError> {
    let layout = ChunkLayout::new(field.width(), field.height(), settings)?;
    let (unused_cols, unused_rows) = layout.unused_samples();
    if unused_cols > 0 || unused_rows > 0 {
        warn!(
            "Heightmap {}x{} does not tile into {}-vertex chunks; {} trailing columns and {} trailing rows are never drawn",
            layout.grid_width, layout.grid_height, layout.chunk_dim_verts, unused_cols, unused_rows
        );
    }

    let chunk_count = layout.chunk_num_total() as usize;
    let max_lod = layout.max_lod as usize;

    let mut vertices = Vec::new();
    reserve(&mut vertices, field.len(), "terrain vertices")?;
    let mut indices = Vec::new();
    reserve(&mut indices, layout.total_indices(), "terrain indices")?;
    let mut lod_ranges = Vec::new();
    reserve(&mut lod_ranges, chunk_count * max_lod, "lod ranges")?;
    lod_ranges.resize(chunk_count * max_lod, LodRange::default());

    fill_vertices(field, &mut vertices);

    let w = layout.grid_width;
    let c = layout.chunk_dim_quads;
    for lod in 0..layout.max_lod {
        let step = ChunkLayout::stride(lod);
        let row = w * step;
        for cz in 0..layout.chunks_z {
            for cx in 0..layout.chunks_x {
                let start_index = indices.len() as u32;
                for y in (0..c).step_by(step as usize) {
                    for x in (0..c).step_by(step as usize) {
                        let i = (cx * c + x) + (cz * c + y) * w;
                        indices.extend_from_slice(&[
                            i,
                            i + row,
                            i + row + step,
                            i,
                            i + row + step,
                            i + step,
                        ]);
                    }
                }
                let chunk = (cx + cz * layout.chunks_x) as usize;
                lod_ranges[chunk * max_lod + lod as usize] = LodRange {
                    start_index,
                    num_indices: indices.len() as u32 - start_index,
                };
            }
        }
    }

    debug_assert_eq!(indices.len(), layout.total_indices());
    debug_assert!(
        indices.len() <= 2 * (w as usize - 1) * (layout.grid_height as usize - 1) * INDICES_PER_QUAD as usize
    );

    info!(
        "Baked terrain: {} vertices, {} indices, {}x{} chunks of {} verts, {} lods",
        vertices.len(),
        indices.len(),
        layout.chunks_x,
        layout.chunks_z,
        layout.chunk_dim_verts,
        layout.max_lod
    );

    Ok(BakedTerrain {
        vertices,
        indices,
        chunks: ChunkTable { layout, lod_ranges },
    })
}

/// Load the heightmap at `path` and bake it. The height field is dropped once
/// the mesh exists.
pub fn load_and_bake(
    path: impl AsRef<Path>,
    options: &HeightmapOptions,
    settings: &BakeSettings,
) -> Result<BakedTerrain, BakeError> {
    let field = load_heightmap(path, options)?;
    bake(&field, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32) -> HeightField {
        HeightField::from_heights(width, height, vec![0.0; (width * height) as usize])
    }

    #[test]
    fn odd_sized_heightmap_bakes_four_chunks() {
        let baked = bake(&flat(129, 129), &BakeSettings::default()).unwrap();
        let layout = baked.chunks.layout();
        assert_eq!(layout.chunk_num_dim(), 2);
        assert_eq!(layout.chunk_num_total(), 4);
        assert_eq!(baked.chunks.len(), 4);
        assert_eq!(layout.unused_samples(), (1, 1));
        assert_eq!(baked.vertices.len(), 129 * 129);
    }

    #[test]
    fn every_chunk_has_every_lod() {
        let settings = BakeSettings::default();
        let baked = bake(&flat(128, 128), &settings).unwrap();
        for chunk in 0..4 {
            let ranges = baked.chunks.lod_ranges(chunk);
            assert_eq!(ranges.len(), settings.max_lod as usize);
            assert!(ranges.iter().all(|r| r.num_indices > 0));
            for pair in ranges.windows(2) {
                assert!(pair[0].num_indices >= pair[1].num_indices);
            }
        }
    }

    #[test]
    fn lod_zero_is_full_resolution() {
        let baked = bake(&flat(128, 128), &BakeSettings::default()).unwrap();
        let c = 63;
        for chunk in 0..4 {
            assert_eq!(baked.chunks.lod_range(chunk, 0).num_indices, c * c * 6);
        }
    }

    #[test]
    fn ranges_are_written_lod_major() {
        let baked = bake(&flat(128, 128), &BakeSettings::default()).unwrap();
        let mut cursor = 0;
        for lod in 0..6 {
            for chunk in 0..4 {
                let range = baked.chunks.lod_range(chunk, lod);
                assert_eq!(range.start_index, cursor);
                cursor += range.num_indices;
            }
        }
        assert_eq!(cursor as usize, baked.indices.len());
    }

    #[test]
    fn first_quad_winding() {
        let settings = BakeSettings {
            chunk_dim_verts: 4,
            max_lod: 2,
        };
        let baked = bake(&flat(8, 8), &settings).unwrap();
        assert_eq!(&baked.indices[..6], &[0, 8, 9, 0, 9, 1]);

        let coarse = baked.chunks.lod_range(0, 1);
        let start = coarse.start_index as usize;
        assert_eq!(&baked.indices[start..start + 6], &[0, 16, 18, 0, 18, 2]);
    }

    #[test]
    fn second_chunk_shares_border_vertices() {
        let settings = BakeSettings {
            chunk_dim_verts: 4,
            max_lod: 2,
        };
        let baked = bake(&flat(8, 8), &settings).unwrap();
        let range = baked.chunks.lod_range(1, 0);
        // chunk (1, 0) starts at grid x = 3
        assert_eq!(baked.indices[range.start_index as usize], 3);
        assert_eq!(baked.chunks.layout().chunk_anchor(1), Vec2::new(3.0, 0.0));
        assert_eq!(baked.chunks.layout().chunk_anchor(2), Vec2::new(0.0, 3.0));
    }

    #[test]
    fn indices_stay_inside_vertex_array() {
        let baked = bake(&flat(129, 129), &BakeSettings::default()).unwrap();
        let count = baked.vertices.len() as u32;
        assert!(baked.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn single_chunk_grid_needs_room_for_coarse_quads() {
        let err = bake(&flat(64, 64), &BakeSettings::default()).unwrap_err();
        assert!(matches!(err, BakeError::GridTooSmall { required: 65, .. }));
        assert!(bake(&flat(65, 65), &BakeSettings::default()).is_ok());
    }

    #[test]
    fn grid_smaller_than_chunk_is_rejected() {
        let err = bake(&flat(32, 32), &BakeSettings::default()).unwrap_err();
        assert!(matches!(err, BakeError::GridTooSmall { .. }));
    }

    #[test]
    fn index_count_must_fit_32_bit_ranges() {
        // about 8.4 billion indices, although the vertex count fits a u32
        let err = ChunkLayout::new(32769, 32769, &BakeSettings::default()).unwrap_err();
        match err {
            BakeError::InvalidSettings(reason) => assert!(reason.contains("32-bit index range")),
            other => panic!("unexpected error {other}"),
        }
        let layout = ChunkLayout::new(4097, 4097, &BakeSettings::default()).unwrap();
        assert!(layout.total_indices() <= u32::MAX as usize);
    }

    #[test]
    fn bad_settings_are_rejected() {
        let field = flat(129, 129);
        let not_pow2 = BakeSettings {
            chunk_dim_verts: 48,
            max_lod: 3,
        };
        assert!(matches!(bake(&field, &not_pow2), Err(BakeError::InvalidSettings(_))));
        let too_many = BakeSettings {
            chunk_dim_verts: 64,
            max_lod: 7,
        };
        assert!(matches!(bake(&field, &too_many), Err(BakeError::InvalidSettings(_))));
        let none = BakeSettings {
            chunk_dim_verts: 64,
            max_lod: 0,
        };
        assert!(matches!(bake(&field, &none), Err(BakeError::InvalidSettings(_))));
    }
}
