//! Terrain rendering test bench.
//!
//! [`TerrainBench`] loads a heightmap, uploads it through a
//! [`render::GraphicsContext`] and then, once per frame, picks which detail
//! level of each terrain chunk to draw from the camera position.

pub mod config;
mod error;
pub mod render;
pub mod utils;

use std::time::Duration;

use glam::Vec3;
use terrain_lod::{load_and_bake, load_heightmap};
use tracing::{error, info, trace, Level};
use tracing_subscriber::FmtSubscriber;

pub use config::{BenchConfig, ClipmapConfig, LodStrategy, RuntimeConfig};
pub use error::{ConfigError, Error, Result};
use render::{
    ChunkedTerrain, ClipmapTerrain, DrawStats, FrameRing, GraphicsContext, TerrainConstants,
    TerrainRenderer, FRAME_CONSTANTS_SLOT,
};
use utils::{FlyCamera, FrameClock, FrameStats};

pub const APP_NAME: &str = "terrain";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = "A test bench for terrain rendering";
pub const APP_WINDOW_TITLE: &str = "Terrain";

/// Install a stdout `tracing` subscriber. Returns `false` when a global
/// subscriber was already set.
pub fn init_logging(level: Level) -> bool {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Outcome of a single [`TerrainBench::frame`].
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_number: u64,
    pub dt: Duration,
    pub camera_position: Vec3,
    pub draws: DrawStats,
}

pub struct TerrainBench {
    config: BenchConfig,
    terrain: TerrainRenderer,
    camera: FlyCamera,
    frames: FrameRing,
    clock: FrameClock,
    stats: FrameStats,
    running: bool,
}

impl TerrainBench {
    /// Load and upload the terrain described by `config`. Any failure here is
    /// fatal for the bench.
    pub fn new<G: GraphicsContext + ?Sized>(config: BenchConfig, ctx: &mut G) -> Result<Self> {
        info!("--INITIALIZING {} {}--", APP_NAME, APP_VERSION);
        info!("{}", APP_DESCRIPTION);
        info!("Heightmap: '{}'", config.heightmap_path.display());

        let terrain = match Self::build_terrain(&config, ctx) {
            Ok(terrain) => terrain,
            Err(err) => {
                error!("{err}");
                return Err(err);
            }
        };

        Ok(Self {
            camera: FlyCamera::new(Vec3::from_array(config.camera_start)),
            frames: FrameRing::new(config.frames_in_flight as usize),
            clock: FrameClock::new(),
            stats: FrameStats::new(),
            running: true,
            terrain,
            config,
        })
    }

    fn build_terrain<G: GraphicsContext + ?Sized>(
        config: &BenchConfig,
        ctx: &mut G,
    ) -> Result<TerrainRenderer> {
        config.validate().map_err(|reason| ConfigError {
            path: "<in memory>".to_string(),
            reason,
        })?;

        match config.strategy {
            LodStrategy::Chunked => {
                let baked = load_and_bake(&config.heightmap_path, &config.heightmap, &config.bake)?;
                Ok(TerrainRenderer::Chunked(ChunkedTerrain::upload(ctx, baked)?))
            }
            LodStrategy::Clipmap => {
                let field = load_heightmap(&config.heightmap_path, &config.heightmap)?;
                Ok(TerrainRenderer::Clipmap(ClipmapTerrain::upload(
                    ctx,
                    &field,
                    &config.clipmap,
                )?))
            }
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Tunables read at the start of every frame.
    pub fn runtime_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config.runtime
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FlyCamera {
        &mut self.camera
    }

    pub fn terrain(&self) -> &TerrainRenderer {
        &self.terrain
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn frame_ring(&self) -> &FrameRing {
        &self.frames
    }

    /// Stop before the next frame starts.
    pub fn request_quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame<G: GraphicsContext + ?Sized>(&mut self, ctx: &mut G) -> FrameReport {
        let dt = self.clock.tick();
        if !dt.is_zero() {
            self.stats.record(dt);
        }

        self.camera.update(dt.as_secs_f32());
        let camera_position = self.camera.position;
        self.terrain.update(&self.config.runtime, camera_position);

        let slot = self.frames.begin_frame(&mut *ctx);
        ctx.begin_frame(slot);
        let constants = TerrainConstants::new(
            self.camera.view_proj(),
            camera_position,
            self.config.runtime.planet_scale_ratio(),
        );
        ctx.set_constants(FRAME_CONSTANTS_SLOT, bytemuck::bytes_of(&constants));
        let draws = self.terrain.record(&mut *ctx);
        self.frames.end_frame(&mut *ctx);
        ctx.present();

        trace!(
            "frame {}: {} draws, {} culled, {} indices",
            self.frames.frame_number(),
            draws.draws,
            draws.culled,
            draws.indices
        );

        FrameReport {
            frame_number: self.frames.frame_number(),
            dt,
            camera_position,
            draws,
        }
    }

    /// Run frames until [`TerrainBench::request_quit`] is called or
    /// `max_frames` have been rendered. Returns the number of frames rendered.
    pub fn run<G: GraphicsContext + ?Sized>(&mut self, ctx: &mut G, max_frames: Option<u64>) -> u64 {
        let mut rendered = 0;
        while self.running && max_frames.map_or(true, |max| rendered < max) {
            self.frame(&mut *ctx);
            rendered += 1;
        }
        self.frames.flush(ctx);

        let fps = self.stats.summary();
        info!(
            "Rendered {} frames. fps min {:.1} / 1% low {:.1} / 0.1% low {:.1} / peak {:.1} / max {:.1}",
            rendered, fps.min, fps.low_1pct, fps.low_01pct, fps.peak, fps.max
        );
        rendered
    }
}
