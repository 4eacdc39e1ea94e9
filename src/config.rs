use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use terrain_lod::{BakeSettings, HeightmapOptions, LodTuning};
use tracing::info;

use crate::error::ConfigError;

pub const BASE_DIST_MAX: f32 = 512.0;
pub const HEIGHT_MOD_SCALER_RANGE: (f32, f32) = (0.01, 0.1);
pub const PLANET_SCALE_DENOM_RANGE: (u32, u32) = (1, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LodStrategy {
    /// Baked chunks, each drawn at a distance selected LOD.
    #[default]
    Chunked,
    /// Camera centred rings over a flat grid.
    Clipmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipmapConfig {
    pub grid_verts: u32,
    pub active_rings: u32,
}

impl Default for ClipmapConfig {
    fn default() -> Self {
        Self {
            grid_verts: 64,
            active_rings: 5,
        }
    }
}

/// Values tweaked while the bench runs. Changes take effect on the next frame
/// and are never written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lod: LodTuning,
    /// Terrain is drawn at `1 / planet_scale_denominator` of its size.
    pub planet_scale_denominator: u32,
    /// Run per chunk selection on the rayon pool.
    pub parallel_selection: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lod: LodTuning::default(),
            planet_scale_denominator: 50,
            parallel_selection: false,
        }
    }
}

impl RuntimeConfig {
    /// Set the LOD 0 draw distance, kept within `[chunk_dim_verts, 512]`.
    pub fn set_base_dist(&mut self, base_dist: f32, chunk_dim_verts: u32) {
        self.lod.base_dist = base_dist.clamp(chunk_dim_verts as f32, BASE_DIST_MAX);
    }

    pub fn set_height_mod_scaler(&mut self, scaler: f32) {
        let (min, max) = HEIGHT_MOD_SCALER_RANGE;
        self.lod.height_mod_scaler = scaler.clamp(min, max);
    }

    pub fn set_planet_scale_denominator(&mut self, denom: u32) {
        let (min, max) = PLANET_SCALE_DENOM_RANGE;
        self.planet_scale_denominator = denom.clamp(min, max);
    }

    pub fn planet_scale_ratio(&self) -> f32 {
        1.0 / self.planet_scale_denominator.max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub heightmap_path: PathBuf,
    pub heightmap: HeightmapOptions,
    pub bake: BakeSettings,
    pub strategy: LodStrategy,
    pub clipmap: ClipmapConfig,
    pub frames_in_flight: u32,
    pub camera_start: [f32; 3],
    /// Stop after this many frames. Runs until asked to quit when unset.
    pub bench_frames: Option<u64>,
    pub runtime: RuntimeConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            heightmap_path: PathBuf::from("heightmap.png"),
            heightmap: HeightmapOptions::default(),
            bake: BakeSettings::default(),
            strategy: LodStrategy::default(),
            clipmap: ClipmapConfig::default(),
            frames_in_flight: 3,
            camera_start: [0.0, 100.0, 0.0],
            bench_frames: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Read a JSON config. Keys that are absent keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_error = |reason: String| ConfigError {
            path: path.display().to_string(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config: BenchConfig = serde_json::from_str(&json).map_err(|e| config_error(e.to_string()))?;
        config.validate().map_err(config_error)?;

        info!("Loaded bench config '{}'", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.frames_in_flight == 0 {
            return Err("frames_in_flight must be at least 1".to_string());
        }
        self.bake.validate().map_err(|e| e.to_string())?;
        if self.strategy == LodStrategy::Clipmap {
            if self.clipmap.grid_verts < 2 {
                return Err("clipmap.grid_verts must be at least 2".to_string());
            }
            if self.clipmap.active_rings == 0 || self.clipmap.active_rings > 16 {
                return Err("clipmap.active_rings must be in 1..=16".to_string());
            }
        }
        Ok(())
    }
}
