//! Palette extraction via bounded k-means clustering.
//!
//! The source is first reduced to a small working resolution so extraction
//! cost does not depend on the input size. Samples are optionally filtered
//! by perceptual style before clustering:
//!
//! | Style | Keeps samples with |
//! |---|---|
//! | `all` | every opaque pixel |
//! | `vibrant` | HSL saturation >= 40% |
//! | `muted` | HSL saturation < 40% |
//! | `light` | HSL lightness >= 60% |
//! | `dark` | HSL lightness < 40% |
//!
//! Seeding is deterministic (the first samples in scan order), so identical
//! input always yields an identical palette.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::color::{rgb_to_hsl, to_hex};
use super::raster::Raster;
use crate::error::{ImagingError, Result};

/// Longest edge of the working image used for sampling.
pub const WORKING_SIZE: u32 = 100;
/// Cap on the unfiltered re-scan used when a style filter leaves too few samples.
pub const FALLBACK_SAMPLE_BUDGET: usize = 100;
pub const MAX_ITERATIONS: usize = 10;
/// Largest per-channel centroid movement still considered converged.
pub const CONVERGENCE_EPSILON: f64 = 0.5;
/// Pixels with alpha below this never become samples.
const ALPHA_THRESHOLD: u8 = 128;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PaletteStyle {
    #[default]
    All,
    Vibrant,
    Muted,
    Light,
    Dark,
}

impl PaletteStyle {
    fn accepts(self, rgb: [u8; 3]) -> bool {
        if self == PaletteStyle::All {
            return true;
        }
        let hsl = rgb_to_hsl(rgb[0], rgb[1], rgb[2]);
        match self {
            PaletteStyle::All => true,
            PaletteStyle::Vibrant => hsl.saturation >= 40.0,
            PaletteStyle::Muted => hsl.saturation < 40.0,
            PaletteStyle::Light => hsl.lightness >= 60.0,
            PaletteStyle::Dark => hsl.lightness < 40.0,
        }
    }
}

/// Extract up to `color_count` representative colors as `#rrggbb` strings.
///
/// The result is in centroid order (seed order), not sorted by frequency.
/// A raster without any opaque pixel yields an empty palette.
pub fn extract_palette(
    raster: &Raster,
    color_count: usize,
    style: PaletteStyle,
) -> Result<Vec<String>> {
    if color_count == 0 {
        return Err(ImagingError::invalid("color count must be at least 1"));
    }

    let working = working_image(raster);
    let samples = collect_samples(&working, color_count, style);
    if samples.is_empty() {
        debug!("No opaque samples in {}x{} raster, palette is empty", raster.width(), raster.height());
        return Ok(Vec::new());
    }

    let centroids = cluster(&samples, color_count);
    Ok(centroids.iter().map(|c| centroid_to_hex(*c)).collect())
}

/// Nearest-neighbour reduction to at most `WORKING_SIZE` per axis. Small
/// rasters are sampled as-is.
fn working_image(raster: &Raster) -> RgbaImage {
    let (width, height) = raster.dimensions();
    let img = raster.to_rgba_image();
    if width <= WORKING_SIZE && height <= WORKING_SIZE {
        return img;
    }
    imageops::resize(
        &img,
        width.min(WORKING_SIZE),
        height.min(WORKING_SIZE),
        FilterType::Nearest,
    )
}

fn collect_samples(img: &RgbaImage, color_count: usize, style: PaletteStyle) -> Vec<[u8; 3]> {
    let opaque = img
        .pixels()
        .filter(|p| p[3] >= ALPHA_THRESHOLD)
        .map(|p| [p[0], p[1], p[2]]);

    let filtered: Vec<[u8; 3]> = opaque.clone().filter(|rgb| style.accepts(*rgb)).collect();
    if filtered.len() >= color_count {
        return filtered;
    }

    if style != PaletteStyle::All {
        warn!(
            "Only {} samples match style '{}' (need {}), falling back to unfiltered sampling",
            filtered.len(),
            style,
            color_count
        );
    }
    opaque.take(FALLBACK_SAMPLE_BUDGET).collect()
}

/// Lloyd iterations seeded from the first samples.
fn cluster(samples: &[[u8; 3]], color_count: usize) -> Vec<[f64; 3]> {
    let mut centroids: Vec<[f64; 3]> = samples
        .iter()
        .take(color_count)
        .map(|s| s.map(f64::from))
        .collect();

    let mut sums = vec![[0.0f64; 3]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for round in 1..=MAX_ITERATIONS {
        sums.iter_mut().for_each(|s| *s = [0.0; 3]);
        counts.iter_mut().for_each(|c| *c = 0);

        for sample in samples {
            let nearest = nearest_centroid(*sample, &centroids);
            for ch in 0..3 {
                sums[nearest][ch] += sample[ch] as f64;
            }
            counts[nearest] += 1;
        }

        let mut max_shift = 0.0f64;
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            // Empty clusters keep their previous position
            if count == 0 {
                continue;
            }
            for ch in 0..3 {
                let mean = sum[ch] / count as f64;
                max_shift = max_shift.max((mean - centroid[ch]).abs());
                centroid[ch] = mean;
            }
        }

        if max_shift <= CONVERGENCE_EPSILON {
            debug!("k-means converged after {} rounds ({} samples)", round, samples.len());
            break;
        }
    }

    centroids
}

/// Index of the closest centroid; the first one wins ties.
fn nearest_centroid(sample: [u8; 3], centroids: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let distance: f64 = (0..3).map(|ch| (sample[ch] as f64 - c[ch]).powi(2)).sum();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

fn centroid_to_hex(c: [f64; 3]) -> String {
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    to_hex(channel(c[0]), channel(c[1]), channel(c[2]))
}
