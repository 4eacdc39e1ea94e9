use glam::Vec3;
use terrain_lod::{
    generate_ring, ring_grid_vertices, BakedTerrain, ChunkTable, ClipmapRings, HeightField,
    LodChoice, LodSelector, TerrainVertex,
};
use tracing::{debug, info};

use super::{
    BufferHandle, BufferInfo, BufferUsage, CommandList, DrawIndexed, GpuError, GpuUploader,
    RING_CONSTANTS_SLOT,
};
use crate::config::{ClipmapConfig, RuntimeConfig};

/// What a renderer recorded for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draws: u32,
    pub culled: u32,
    pub indices: u64,
    /// Draw count per LOD (chunked) or per ring (clipmap).
    pub per_lod: Vec<u32>,
}

/// Baked chunked terrain resident on the GPU.
pub struct ChunkedTerrain {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    chunks: ChunkTable,
    selector: LodSelector,
    choices: Vec<LodChoice>,
}

impl ChunkedTerrain {
    /// Upload the baked arrays. They are dropped once the GPU copies exist;
    /// only the chunk table is kept for selection.
    pub fn upload<U: GpuUploader + ?Sized>(
        ctx: &mut U,
        baked: BakedTerrain,
    ) -> Result<Self, GpuError> {
        let BakedTerrain {
            vertices,
            indices,
            chunks,
        } = baked;

        let vertex_buffer = ctx.create_and_upload(&BufferInfo {
            debug_name: "[TERRAIN] Vertex Buffer",
            usage: BufferUsage::Vertex {
                stride: TerrainVertex::STRIDE,
            },
            initial_data: bytemuck::cast_slice(&vertices),
        })?;
        let index_buffer = ctx.create_and_upload(&BufferInfo {
            debug_name: "[TERRAIN] Index Buffer",
            usage: BufferUsage::Index,
            initial_data: bytemuck::cast_slice(&indices),
        })?;
        info!(
            "Uploaded terrain: {} vertices, {} indices, {} chunks",
            vertices.len(),
            indices.len(),
            chunks.len()
        );

        let selector = LodSelector::new(&chunks);
        let choices = Vec::with_capacity(chunks.len());
        Ok(Self {
            vertex_buffer,
            index_buffer,
            chunks,
            selector,
            choices,
        })
    }

    pub fn chunks(&self) -> &ChunkTable {
        &self.chunks
    }

    pub fn selector(&self) -> &LodSelector {
        &self.selector
    }

    /// LOD choices from the last [`ChunkedTerrain::update`], in chunk order.
    pub fn choices(&self) -> &[LodChoice] {
        &self.choices
    }

    pub fn update(&mut self, runtime: &RuntimeConfig, camera_pos: Vec3) {
        self.selector.update(&runtime.lod, camera_pos);
        if runtime.parallel_selection {
            self.selector.select_all_par_into(camera_pos, &mut self.choices);
        } else {
            self.selector.select_all_into(camera_pos, &mut self.choices);
        }
    }

    pub fn record<C: CommandList + ?Sized>(&self, cmd: &mut C) -> DrawStats {
        let mut stats = DrawStats {
            per_lod: vec![0; self.chunks.layout().max_lod as usize],
            ..Default::default()
        };
        cmd.set_vertex_buffer(self.vertex_buffer);
        cmd.set_index_buffer(self.index_buffer);

        for (chunk, choice) in self.choices.iter().enumerate() {
            let Some(lod) = choice.level() else {
                stats.culled += 1;
                continue;
            };
            let range = self.chunks.lod_range(chunk as u32, lod);
            cmd.draw_indexed(DrawIndexed {
                index_count: range.num_indices,
                first_index: range.start_index,
                base_vertex: 0,
            });
            stats.draws += 1;
            stats.indices += range.num_indices as u64;
            stats.per_lod[lod as usize] += 1;
        }
        stats
    }
}

/// Clipmap rings over a shared grid, displaced by a height buffer.
pub struct ClipmapTerrain {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    heightmap_buffer: BufferHandle,
    rings: ClipmapRings,
    /// Index counts of the filled centre grid and the hollow ring grid. The
    /// hollow indices follow the filled ones in the index buffer.
    filled_indices: u32,
    hollow_indices: u32,
}

impl ClipmapTerrain {
    pub fn upload<U: GpuUploader + ?Sized>(
        ctx: &mut U,
        field: &HeightField,
        config: &ClipmapConfig,
    ) -> Result<Self, GpuError> {
        let n = config.grid_verts;
        let grid = ring_grid_vertices(n);
        let mut indices = generate_ring(n, true);
        let filled_indices = indices.len() as u32;
        indices.extend(generate_ring(n, false));
        let hollow_indices = indices.len() as u32 - filled_indices;

        let vertex_buffer = ctx.create_and_upload(&BufferInfo {
            debug_name: "[TERRAIN CLIPMAP] Grid Vertices",
            usage: BufferUsage::Vertex {
                stride: std::mem::size_of::<[f32; 2]>() as u32,
            },
            initial_data: bytemuck::cast_slice(&grid),
        })?;
        let index_buffer = ctx.create_and_upload(&BufferInfo {
            debug_name: "[TERRAIN CLIPMAP] Ring Indices",
            usage: BufferUsage::Index,
            initial_data: bytemuck::cast_slice(&indices),
        })?;
        let heightmap_buffer = ctx.create_and_upload(&BufferInfo {
            debug_name: "[TERRAIN CLIPMAP] Heightmap",
            usage: BufferUsage::Storage,
            initial_data: bytemuck::cast_slice(field.heights()),
        })?;
        info!(
            "Uploaded clipmap: {}x{} grid, {} rings, {}x{} heightmap",
            n,
            n,
            config.active_rings,
            field.width(),
            field.height()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            heightmap_buffer,
            rings: ClipmapRings::new(n, config.active_rings),
            filled_indices,
            hollow_indices,
        })
    }

    pub fn rings(&self) -> &ClipmapRings {
        &self.rings
    }

    pub fn heightmap_buffer(&self) -> BufferHandle {
        self.heightmap_buffer
    }

    pub fn update(&mut self, camera_pos: Vec3) {
        self.rings.update(camera_pos);
        debug!(
            "clipmap ring 0 origin {:?}",
            self.rings.rings().first().map(|r| r.world_offset)
        );
    }

    pub fn record<C: CommandList + ?Sized>(&self, cmd: &mut C) -> DrawStats {
        let mut stats = DrawStats {
            per_lod: vec![0; self.rings.rings().len()],
            ..Default::default()
        };
        cmd.set_vertex_buffer(self.vertex_buffer);
        cmd.set_index_buffer(self.index_buffer);

        for ring in self.rings.rings() {
            cmd.set_constants(RING_CONSTANTS_SLOT, bytemuck::bytes_of(ring));
            let draw = if ring.ring == 0 {
                DrawIndexed {
                    index_count: self.filled_indices,
                    first_index: 0,
                    base_vertex: 0,
                }
            } else {
                DrawIndexed {
                    index_count: self.hollow_indices,
                    first_index: self.filled_indices,
                    base_vertex: 0,
                }
            };
            cmd.draw_indexed(draw);
            stats.draws += 1;
            stats.indices += draw.index_count as u64;
            stats.per_lod[ring.ring as usize] += 1;
        }
        stats
    }
}

pub enum TerrainRenderer {
    Chunked(ChunkedTerrain),
    Clipmap(ClipmapTerrain),
}

impl TerrainRenderer {
    pub fn update(&mut self, runtime: &RuntimeConfig, camera_pos: Vec3) {
        match self {
            TerrainRenderer::Chunked(terrain) => terrain.update(runtime, camera_pos),
            TerrainRenderer::Clipmap(terrain) => terrain.update(camera_pos),
        }
    }

    pub fn record<C: CommandList + ?Sized>(&self, cmd: &mut C) -> DrawStats {
        match self {
            TerrainRenderer::Chunked(terrain) => terrain.record(cmd),
            TerrainRenderer::Clipmap(terrain) => terrain.record(cmd),
        }
    }
}
