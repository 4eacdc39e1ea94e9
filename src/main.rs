use std::process::ExitCode;

use terrain::render::HeadlessContext;
use terrain::{init_logging, BenchConfig, TerrainBench, APP_WINDOW_TITLE};
use tracing::{error, info, Level};

/// Headless runs have no quit input, so they stop here unless the config says otherwise.
const HEADLESS_FRAMES: u64 = 1000;

fn main() -> ExitCode {
    init_logging(Level::INFO);

    let config = match std::env::args().nth(1) {
        Some(path) => match BenchConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => BenchConfig::default(),
    };

    info!("{APP_WINDOW_TITLE}: headless");
    let mut ctx = HeadlessContext::new();
    let mut bench = match TerrainBench::new(config, &mut ctx) {
        Ok(bench) => bench,
        Err(_) => return ExitCode::FAILURE,
    };

    let frames = bench.config().bench_frames.unwrap_or(HEADLESS_FRAMES);
    bench.run(&mut ctx, Some(frames));
    ExitCode::SUCCESS
}
