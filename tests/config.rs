use std::fs;

use terrain::{BenchConfig, LodStrategy};

#[test]
fn partial_json_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.json");
    fs::write(
        &path,
        r#"{
            "heightmap_path": "maps/swiss_alps.png",
            "heightmap": { "terrain_scale": 0.071 },
            "strategy": "clipmap",
            "runtime": { "lod": { "base_dist": 200.0 }, "parallel_selection": true }
        }"#,
    )
    .unwrap();

    let config = BenchConfig::load(&path).unwrap();
    assert_eq!(config.heightmap_path.to_str(), Some("maps/swiss_alps.png"));
    assert_eq!(config.heightmap.terrain_scale, 0.071);
    assert!(config.heightmap.mirror_x);
    assert_eq!(config.strategy, LodStrategy::Clipmap);
    assert_eq!(config.clipmap.grid_verts, 64);
    assert_eq!(config.bake.chunk_dim_verts, 64);
    assert_eq!(config.bake.max_lod, 6);
    assert_eq!(config.frames_in_flight, 3);
    assert_eq!(config.runtime.lod.base_dist, 200.0);
    assert_eq!(config.runtime.lod.height_mod_scaler, 0.091);
    assert!(config.runtime.parallel_selection);
    assert_eq!(config.runtime.planet_scale_denominator, 50);
}

#[test]
fn empty_object_is_the_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.json");
    fs::write(&path, "{}").unwrap();
    assert_eq!(BenchConfig::load(&path).unwrap(), BenchConfig::default());
}

#[test]
fn malformed_json_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.json");
    fs::write(&path, "{ \"strategy\": ").unwrap();
    let err = BenchConfig::load(&path).unwrap_err();
    assert!(err.path.ends_with("bench.json"));
}

#[test]
fn invalid_bake_settings_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.json");
    fs::write(&path, r#"{ "bake": { "chunk_dim_verts": 48 } }"#).unwrap();
    let err = BenchConfig::load(&path).unwrap_err();
    assert!(err.reason.contains("power of two"));
}

#[test]
fn missing_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(BenchConfig::load(dir.path().join("nope.json")).is_err());
}

#[test]
fn config_round_trips_through_json() {
    let config = BenchConfig {
        strategy: LodStrategy::Clipmap,
        bench_frames: Some(120),
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: BenchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
