//! Heightmap decoding.
//!
//! A heightmap is a single channel 16-bit grayscale image. Each sample is
//! normalized to `[0, 1]` and scaled into world units by the width of the grid
//! measured in quads times [`HeightmapOptions::terrain_scale`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LoadError;

/// Height scale used for the Peloponnese test data set.
pub const PELOPONNESE_SCALE: f32 = 0.021;
/// Height scale used for the Swiss Alps test data set.
pub const SWISS_ALPS_SCALE: f32 = 0.071;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapOptions {
    /// World height per grid quad at full sample intensity.
    pub terrain_scale: f32,
    /// Flip the image horizontally while reading it.
    pub mirror_x: bool,
}

impl Default for HeightmapOptions {
    fn default() -> Self {
        Self {
            terrain_scale: PELOPONNESE_SCALE,
            mirror_x: true,
        }
    }
}

/// Row-major grid of world space heights, indexed `x + y * width`.
#[derive(Debug, Clone)]
pub struct HeightField {
    width: u32,
    height: u32,
    heights: Vec<f32>,
}

impl HeightField {
    /// Wrap already scaled heights.
    pub fn from_heights(width: u32, height: u32, heights: Vec<f32>) -> Self {
        assert_eq!(
            heights.len(),
            width as usize * height as usize,
            "height count does not match {width}x{height}"
        );
        Self {
            width,
            height,
            heights,
        }
    }

    /// Convert raw 16-bit samples into world heights.
    pub fn from_samples(width: u32, height: u32, samples: &[u16], options: &HeightmapOptions) -> Self {
        assert_eq!(
            samples.len(),
            width as usize * height as usize,
            "sample count does not match {width}x{height}"
        );
        let height_scale = width.saturating_sub(1) as f32 * options.terrain_scale;
        let w = width as usize;
        let mut heights = Vec::with_capacity(samples.len());
        for y in 0..height as usize {
            for x in 0..w {
                let src_x = if options.mirror_x { w - 1 - x } else { x };
                let normalized = samples[src_x + y * w] as f32 / u16::MAX as f32;
                heights.push(normalized * height_scale);
            }
        }

        Self {
            width,
            height,
            heights,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Height at a grid coordinate. Coordinates outside the grid are clamped
    /// to the nearest edge sample.
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.heights[x + y * self.width as usize]
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.heights[x as usize + y as usize * self.width as usize]
    }
}

/// Decode a single channel heightmap image from `path`.
pub fn load_heightmap(path: impl AsRef<Path>, options: &HeightmapOptions) -> Result<HeightField, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let img = image::load_from_memory(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    drop(bytes);

    match img.color() {
        image::ColorType::L16 | image::ColorType::L8 => {}
        color => {
            return Err(LoadError::UnsupportedChannels {
                path: path.to_path_buf(),
                color,
            });
        }
    }

    let gray = img.into_luma16();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    info!(
        "Loaded 16-bit heightmap {}: {}x{}, channels=1",
        path.display(),
        width,
        height
    );

    let field = HeightField::from_samples(width, height, gray.as_raw(), options);
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, RgbImage};

    fn write_gray16(dir: &Path, name: &str, width: u32, height: u32, f: impl Fn(u32, u32) -> u16) -> std::path::PathBuf {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)]));
        let path = dir.join(name);
        img.save(&path).expect("save heightmap");
        path
    }

    #[test]
    fn full_intensity_maps_to_height_scale() {
        let samples = vec![u16::MAX; 9];
        let options = HeightmapOptions {
            terrain_scale: 0.5,
            mirror_x: false,
        };
        let field = HeightField::from_samples(3, 3, &samples, &options);
        // (3 - 1) quads * 0.5
        assert!(field.heights().iter().all(|h| (*h - 1.0).abs() < 1e-6));
    }

    #[test]
    fn mirror_flips_rows() {
        let samples = [0, u16::MAX, 0, 0];
        let plain = HeightField::from_samples(
            2,
            2,
            &samples,
            &HeightmapOptions {
                terrain_scale: 1.0,
                mirror_x: false,
            },
        );
        let mirrored = HeightField::from_samples(
            2,
            2,
            &samples,
            &HeightmapOptions {
                terrain_scale: 1.0,
                mirror_x: true,
            },
        );
        assert_eq!(plain.get(1, 0), 1.0);
        assert_eq!(mirrored.get(0, 0), 1.0);
        assert_eq!(mirrored.get(1, 0), 0.0);
    }

    #[test]
    fn clamped_lookup_reuses_edges() {
        let field = HeightField::from_heights(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(field.get_clamped(-1, 0), 1.0);
        assert_eq!(field.get_clamped(5, 1), 4.0);
        assert_eq!(field.get_clamped(1, -3), 2.0);
    }

    #[test]
    fn loads_sixteen_bit_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gray16(dir.path(), "height.png", 4, 2, |x, _| if x == 0 { u16::MAX } else { 0 });
        let field = load_heightmap(
            &path,
            &HeightmapOptions {
                terrain_scale: 1.0,
                mirror_x: false,
            },
        )
        .unwrap();
        assert_eq!((field.width(), field.height()), (4, 2));
        assert!((field.get(0, 1) - 3.0).abs() < 1e-6);
        assert_eq!(field.get(3, 1), 0.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_heightmap(dir.path().join("nope.png"), &HeightmapOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_heightmap(&path, &HeightmapOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn rgb_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        RgbImage::from_pixel(2, 2, Rgb([10, 20, 30])).save(&path).unwrap();
        let err = load_heightmap(&path, &HeightmapOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedChannels { .. }));
    }
}
