//! Raster heightmaps.
//!
//! A heightmap file is a grayscale image whose RGB channels all carry the same
//! value. Only the red channel is read and the alpha channel is ignored. Each
//! pixel becomes one height sample normalized to `[0, 1]`.

use std::path::Path;

use anyhow::{Context, bail};
use image::GenericImageView;

/// Largest raster intensity; the level threshold is expressed in these units.
pub const RASTER_MAX: f32 = 255.0;

/// Normalized height samples in row-major order. Rows run along z, columns
/// along x.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl HeightMap {
    /// Builds a heightmap from raw samples. Needs at least a 2x2 grid so the
    /// terrain has one cell.
    pub fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> anyhow::Result<Self> {
        if width < 2 || height < 2 {
            bail!("A heightmap needs at least 2x2 samples, got {}x{}", width, height);
        }
        if samples.len() != (width as usize) * (height as usize) {
            bail!(
                "Expected {} samples for a {}x{} heightmap, got {}",
                width as usize * height as usize,
                width,
                height,
                samples.len()
            );
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn from_image(img: &image::DynamicImage) -> anyhow::Result<Self> {
        let (width, height) = img.dimensions();
        let rgb = img.to_rgb8();
        let samples = rgb
            .pixels()
            .map(|pixel| pixel.0[0] as f32 / RASTER_MAX)
            .collect();
        Self::from_samples(width, height, samples)
    }

    /// Decodes raw image file contents (PNG, JPEG, BMP).
    pub fn from_bytes(bytes: &[u8], label: &str) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes)
            .with_context(|| format!("Failed to decode heightmap {}", label))?;
        Self::from_image(&img)
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("Failed to load heightmap {}", path.display()))?;
        log::info!(
            "Heightmap loaded: {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        Self::from_image(&img)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample(&self, column: u32, row: u32) -> f32 {
        self.samples[(row * self.width + column) as usize]
    }

    /// Sample lookup that answers out-of-range neighbours with the sample at
    /// (`column`, `row`) itself, the fallback the normal calculation relies on.
    pub fn neighbour(&self, column: u32, row: u32, dx: i32, dz: i32) -> f32 {
        let x = column as i64 + dx as i64;
        let z = row as i64 + dz as i64;
        if x < 0 || z < 0 || x >= self.width as i64 || z >= self.height as i64 {
            self.sample(column, row)
        } else {
            self.sample(x as u32, z as u32)
        }
    }

    /// Flattens low-lying terrain: every sample below `threshold` becomes
    /// `baseline`, every other sample is left untouched.
    pub fn level(&mut self, threshold: f32, baseline: f32) {
        let mut flattened = 0usize;
        for sample in self.samples.iter_mut().filter(|s| **s < threshold) {
            *sample = baseline;
            flattened += 1;
        }
        log::debug!(
            "Levelled {} of {} heightmap samples below {}",
            flattened,
            self.samples.len(),
            threshold
        );
    }
}
