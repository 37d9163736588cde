//! Canvas backgrounds and the film-grain noise layer.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::canvas::Canvas;
use super::color::{parse_hex_color, HexColor};
use super::palette::{extract_palette, PaletteStyle};
use super::raster::Raster;
use crate::error::{ImagingError, Result};

pub const MAX_GRADIENT_STOPS: usize = 8;
/// Opacity of each radial spot in a mesh background.
pub const MESH_SPOT_OPACITY: f32 = 0.5;
pub const NOISE_SPECKS: usize = 1000;
pub const NOISE_OPACITY: f32 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Background {
    Solid {
        color: HexColor,
    },
    /// Diagonal gradient from the top-left to the bottom-right corner,
    /// stops evenly spaced.
    Gradient {
        stops: Vec<HexColor>,
    },
    /// Base fill plus four corner and one center radial spot in screen blend.
    Mesh {
        base: HexColor,
        colors: Vec<HexColor>,
    },
    /// Gradient or mesh built from the source image's own palette.
    Extracted {
        colors: usize,
        #[serde(default)]
        mesh: bool,
    },
}

impl Default for Background {
    fn default() -> Self {
        Background::Gradient {
            stops: vec![HexColor::rgb(0x66, 0x7e, 0xea), HexColor::rgb(0x76, 0x4b, 0xa2)],
        }
    }
}

impl Background {
    pub fn validate(&self) -> Result<()> {
        match self {
            Background::Solid { .. } => Ok(()),
            Background::Gradient { stops } if stops.is_empty() => {
                Err(ImagingError::invalid("gradient background needs at least one stop"))
            }
            Background::Gradient { stops } if stops.len() > MAX_GRADIENT_STOPS => {
                Err(ImagingError::invalid(format!(
                    "gradient background supports at most {} stops, got {}",
                    MAX_GRADIENT_STOPS,
                    stops.len()
                )))
            }
            Background::Gradient { .. } => Ok(()),
            Background::Mesh { colors, .. } if colors.is_empty() => {
                Err(ImagingError::invalid("mesh background needs at least one spot color"))
            }
            Background::Mesh { .. } => Ok(()),
            Background::Extracted { colors, .. } if *colors == 0 || *colors > MAX_GRADIENT_STOPS => {
                Err(ImagingError::invalid(format!(
                    "extracted background needs 1-{} colors, got {}",
                    MAX_GRADIENT_STOPS, colors
                )))
            }
            Background::Extracted { .. } => Ok(()),
        }
    }

    /// Replace an `Extracted` background with the concrete gradient or mesh
    /// derived from `source`.
    pub fn resolve(&self, source: &Raster) -> Result<Background> {
        self.validate()?;
        let Background::Extracted { colors, mesh } = *self else {
            return Ok(self.clone());
        };

        let palette = extract_palette(source, colors, PaletteStyle::All)?
            .iter()
            .map(|hex| parse_hex_color(hex).map(HexColor))
            .collect::<Result<Vec<_>>>()?;
        let Some(&first) = palette.first() else {
            return Err(ImagingError::invalid(
                "source has no opaque pixels to derive a background from",
            ));
        };
        debug!("Background derived from palette {:?}", palette);

        if mesh {
            let spots = if palette.len() > 1 {
                palette[1..].to_vec()
            } else {
                palette.clone()
            };
            Ok(Background::Mesh {
                base: first,
                colors: spots,
            })
        } else {
            Ok(Background::Gradient { stops: palette })
        }
    }
}

/// Paint a resolved background over the whole canvas.
pub fn paint_background(canvas: &mut Canvas, background: &Background) -> Result<()> {
    background.validate()?;
    match background {
        Background::Solid { color } => {
            fill(canvas, *color);
        }
        Background::Gradient { stops } => paint_linear_gradient(canvas, stops),
        Background::Mesh { base, colors } => paint_mesh(canvas, *base, colors),
        Background::Extracted { .. } => {
            return Err(ImagingError::invalid(
                "extracted background must be resolved against a source first",
            ));
        }
    }
    Ok(())
}

fn fill(canvas: &mut Canvas, color: HexColor) {
    for pixel in canvas.image_mut().pixels_mut() {
        pixel.0 = color.0;
    }
}

fn paint_linear_gradient(canvas: &mut Canvas, stops: &[HexColor]) {
    if stops.len() == 1 {
        fill(canvas, stops[0]);
        return;
    }
    let (width, height) = (canvas.width() as f32, canvas.height() as f32);
    let length_sq = width * width + height * height;
    let segments = (stops.len() - 1) as f32;

    for (x, y, pixel) in canvas.image_mut().enumerate_pixels_mut() {
        let t = (((x as f32 + 0.5) * width + (y as f32 + 0.5) * height) / length_sq).clamp(0.0, 1.0);
        let position = t * segments;
        let index = (position.floor() as usize).min(stops.len() - 2);
        let local = position - index as f32;
        pixel.0 = lerp_color(stops[index], stops[index + 1], local);
    }
}

fn lerp_color(from: HexColor, to: HexColor, t: f32) -> [u8; 4] {
    let mut out = [0u8; 4];
    for ch in 0..4 {
        let value = from.0[ch] as f32 + (to.0[ch] as f32 - from.0[ch] as f32) * t;
        out[ch] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn paint_mesh(canvas: &mut Canvas, base: HexColor, colors: &[HexColor]) {
    fill(canvas, base);
    let (width, height) = (canvas.width() as f32, canvas.height() as f32);
    let size = width.max(height);
    let spots = [
        (0.0, 0.0, size * 0.8),
        (width, 0.0, size * 0.8),
        (0.0, height, size * 0.8),
        (width, height, size * 0.8),
        (width / 2.0, height / 2.0, size * 0.6),
    ];

    for (i, (cx, cy, radius)) in spots.into_iter().enumerate() {
        let color = colors[i % colors.len()].to_f32();
        for (x, y, pixel) in canvas.image_mut().enumerate_pixels_mut() {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let falloff = (dx * dx + dy * dy).sqrt() / radius;
            if falloff >= 1.0 {
                continue;
            }
            // Spot fades linearly from its color to transparent
            let alpha = color[3] * (1.0 - falloff) * MESH_SPOT_OPACITY;
            for ch in 0..3 {
                let dst = pixel[ch] as f32 / 255.0;
                let screen = 1.0 - (1.0 - dst) * (1.0 - color[ch]);
                let value = dst + (screen - dst) * alpha;
                pixel[ch] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Sprinkle single-pixel black and white specks in overlay blend at low opacity.
pub fn apply_noise(canvas: &mut Canvas, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (width, height) = (canvas.width(), canvas.height());
    let image = canvas.image_mut();

    for _ in 0..NOISE_SPECKS {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        let speck = if rng.random_bool(0.5) { 1.0 } else { 0.0 };
        let pixel = image.get_pixel_mut(x, y);
        for ch in 0..3 {
            let base = pixel[ch] as f32 / 255.0;
            let overlay = if base < 0.5 {
                2.0 * base * speck
            } else {
                1.0 - 2.0 * (1.0 - base) * (1.0 - speck)
            };
            let value = base + (overlay - base) * NOISE_OPACITY;
            pixel[ch] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}
