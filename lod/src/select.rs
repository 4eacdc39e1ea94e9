//! Per-frame LOD selection for baked chunks.
//!
//! A chunk is drawn at the finest level whose draw distance still contains it.
//! Distances are measured horizontally from the camera to the chunk's minimum
//! corner. There is no hysteresis; chunks switch level the frame they cross a
//! threshold.

use glam::{Vec2, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bake::ChunkTable;

pub const HEIGHT_MODIFIER_MIN: f32 = 1.0;
pub const HEIGHT_MODIFIER_MAX: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LodChoice {
    Level(u32),
    Cull,
}

impl LodChoice {
    pub fn level(self) -> Option<u32> {
        match self {
            LodChoice::Level(lod) => Some(lod),
            LodChoice::Cull => None,
        }
    }
}

/// Live tunables that drive selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodTuning {
    /// Draw distance of LOD 0. Each further level doubles it.
    pub base_dist: f32,
    pub height_mod_scaler: f32,
    /// Push every threshold outward as the camera climbs.
    pub enable_height_lod_mod: bool,
    /// Draw chunks past the last threshold at the coarsest level instead of
    /// culling them.
    pub render_beyond_max_range: bool,
}

impl Default for LodTuning {
    fn default() -> Self {
        Self {
            base_dist: 141.0,
            height_mod_scaler: 0.091,
            enable_height_lod_mod: false,
            render_beyond_max_range: false,
        }
    }
}

/// `clamp(scaler * sqrt(max(height, 0)), 1, 8)` when enabled, otherwise 1.
pub fn height_modifier(scaler: f32, camera_height: f32, enabled: bool) -> f32 {
    if !enabled {
        return 1.0;
    }
    (scaler * camera_height.max(0.0).sqrt()).clamp(HEIGHT_MODIFIER_MIN, HEIGHT_MODIFIER_MAX)
}

/// World space draw distance per LOD level.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawDistanceTable {
    thresholds: Vec<f32>,
}

impl DrawDistanceTable {
    pub fn new(base_dist: f32, max_lod: u32, height_modifier: f32) -> Self {
        let mut table = Self {
            thresholds: vec![0.0; max_lod as usize],
        };
        table.recompute(base_dist, height_modifier);
        table
    }

    pub fn from_thresholds(thresholds: Vec<f32>) -> Self {
        Self { thresholds }
    }

    pub fn recompute(&mut self, base_dist: f32, height_modifier: f32) {
        for (lod, threshold) in self.thresholds.iter_mut().enumerate() {
            *threshold = base_dist * (1u32 << lod) as f32 * height_modifier;
        }
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn max_lod(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// One `LOD{n}: {distance}` line per level.
    pub fn describe(&self) -> Vec<String> {
        self.thresholds
            .iter()
            .enumerate()
            .map(|(lod, dist)| format!("LOD{lod}: {dist}"))
            .collect()
    }
}

/// Pick the level for a chunk anchored at `anchor` (world `x`, `z`).
///
/// The first level with `squared_distance < threshold^2` wins, so a chunk
/// sitting exactly on a threshold falls into the next coarser band.
pub fn select_lod(anchor: Vec2, camera_pos: Vec3, thresholds: &[f32], render_beyond_max_range: bool) -> LodChoice {
    let delta = Vec2::new(camera_pos.x, camera_pos.z) - anchor;
    let squared_dist = delta.length_squared();

    for (lod, threshold) in thresholds.iter().enumerate() {
        if squared_dist < threshold * threshold {
            return LodChoice::Level(lod as u32);
        }
    }

    match (render_beyond_max_range, thresholds.len()) {
        (true, n) if n > 0 => LodChoice::Level(n as u32 - 1),
        _ => LodChoice::Cull,
    }
}

pub struct LodSelector {
    anchors: Vec<Vec2>,
    table: DrawDistanceTable,
    render_beyond_max_range: bool,
    applied: Option<(f32, f32)>,
}

impl LodSelector {
    pub fn new(chunks: &ChunkTable) -> Self {
        Self::from_anchors(chunks.anchors(), chunks.layout().max_lod)
    }

    pub fn from_anchors(anchors: Vec<Vec2>, max_lod: u32) -> Self {
        let tuning = LodTuning::default();
        Self {
            anchors,
            table: DrawDistanceTable::new(tuning.base_dist, max_lod, 1.0),
            render_beyond_max_range: tuning.render_beyond_max_range,
            applied: None,
        }
    }

    /// Refresh the draw distance table for this frame. Returns `true` when the
    /// thresholds changed.
    pub fn update(&mut self, tuning: &LodTuning, camera_pos: Vec3) -> bool {
        self.render_beyond_max_range = tuning.render_beyond_max_range;
        let modifier = height_modifier(
            tuning.height_mod_scaler,
            camera_pos.y,
            tuning.enable_height_lod_mod,
        );
        let key = (tuning.base_dist, modifier);
        if self.applied == Some(key) {
            return false;
        }

        self.table.recompute(tuning.base_dist, modifier);
        self.applied = Some(key);
        debug!("LOD draw distances: {}", self.table.describe().join(", "));
        true
    }

    pub fn table(&self) -> &DrawDistanceTable {
        &self.table
    }

    pub fn chunk_count(&self) -> u32 {
        self.anchors.len() as u32
    }

    pub fn anchor(&self, chunk: u32) -> Vec2 {
        self.anchors[chunk as usize]
    }

    pub fn select(
        &self,
        chunk: u32,
        camera_pos: Vec3,
        table: &DrawDistanceTable,
        render_beyond_max_range: bool,
    ) -> LodChoice {
        debug_assert!(
            chunk < self.chunk_count(),
            "chunk {chunk} out of range ({} chunks)",
            self.chunk_count()
        );
        select_lod(
            self.anchors[chunk as usize],
            camera_pos,
            table.thresholds(),
            render_beyond_max_range,
        )
    }

    /// Evaluate every chunk against the current table, in chunk order.
    pub fn select_all_into(&self, camera_pos: Vec3, out: &mut Vec<LodChoice>) {
        out.clear();
        let thresholds = self.table.thresholds();
        out.extend(
            self.anchors
                .iter()
                .map(|anchor| select_lod(*anchor, camera_pos, thresholds, self.render_beyond_max_range)),
        );
    }

    /// Same as [`LodSelector::select_all_into`], spread over the rayon pool.
    pub fn select_all_par_into(&self, camera_pos: Vec3, out: &mut Vec<LodChoice>) {
        out.clear();
        let thresholds = self.table.thresholds();
        out.par_extend(
            self.anchors
                .par_iter()
                .map(|anchor| select_lod(*anchor, camera_pos, thresholds, self.render_beyond_max_range)),
        );
    }

    pub fn select_all(&self, camera_pos: Vec3) -> Vec<LodChoice> {
        let mut out = Vec::with_capacity(self.anchors.len());
        self.select_all_into(camera_pos, &mut out);
        out
    }
}
