//! Palette poster: the image on top, one swatch per palette color below it
//! and an optional caption in the footer.
//!
//! ```text
//! +--------------------------+  0
//! |                          |
//! |   image (cover-cropped)  |
//! |                          |
//! +--------------------------+  945
//! |  [#a] [#b] [#c] [#d]     |  swatches, hex codes read bottom-up
//! |         caption          |
//! +--------------------------+  1350
//! ```

use ab_glyph::FontVec;
use image::imageops;
use log::debug;
use serde::{Deserialize, Serialize};

use super::canvas::{Canvas, Rect, Shape, Transform};
use super::color::{contrast_ratio, HexColor};
use super::raster::Raster;
use super::resize::{resample, CropRect, SmoothingQuality};
use super::text::text_mask;
use crate::error::{ImagingError, Result};

pub const POSTER_WIDTH: u32 = 1080;
pub const POSTER_HEIGHT: u32 = 1350;
/// Height of the image zone, 70% of the poster.
pub const IMAGE_ZONE_HEIGHT: u32 = 945;

const MARGIN: f32 = 40.0;
const SWATCH_GAP: f32 = 20.0;
const SWATCH_TOP: f32 = IMAGE_ZONE_HEIGHT as f32 + MARGIN;
const SWATCH_HEIGHT: f32 = 250.0;
const SWATCH_RADIUS: f32 = 16.0;
const HEX_TEXT_SIZE: f32 = 28.0;
const CAPTION_SIZE: f32 = 36.0;
/// Minimum WCAG contrast for white text on a swatch.
const MIN_CONTRAST: f64 = 4.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterOptions {
    pub caption: String,
    pub caption_color: HexColor,
    pub background: HexColor,
}

impl Default for PosterOptions {
    fn default() -> Self {
        Self {
            caption: String::new(),
            caption_color: HexColor::rgb(0x33, 0x33, 0x33),
            background: HexColor::WHITE,
        }
    }
}

/// White when it reaches 4.5:1 contrast on `swatch`, black otherwise.
pub fn pick_text_color(swatch: HexColor) -> HexColor {
    let [r, g, b, _] = swatch.0;
    if contrast_ratio([255, 255, 255], [r, g, b]) >= MIN_CONTRAST {
        HexColor::WHITE
    } else {
        HexColor::BLACK
    }
}

/// Lay out a 1080x1350 poster of `raster` and its `palette`.
///
/// Without a `font` the zones and swatches are still drawn but every text
/// layer is skipped.
pub fn generate_poster(
    raster: &Raster,
    palette: &[String],
    options: &PosterOptions,
    font: Option<&FontVec>,
) -> Result<Raster> {
    let colors = palette
        .iter()
        .map(|hex| hex.parse::<HexColor>())
        .collect::<Result<Vec<_>>>()?;
    let swatches = swatch_rects(colors.len())?;

    let mut canvas = Canvas::new(POSTER_WIDTH, POSTER_HEIGHT);
    for pixel in canvas.image_mut().pixels_mut() {
        pixel.0 = options.background.0;
    }

    let image_zone = cover_crop(raster, POSTER_WIDTH, IMAGE_ZONE_HEIGHT)?;
    imageops::replace(canvas.image_mut(), &image_zone.into_rgba_image(), 0, 0);

    let identity = Transform::identity();
    for (rect, color) in swatches.iter().zip(&colors) {
        canvas.fill_shape(&identity, &Shape::rounded(*rect, SWATCH_RADIUS), *color, None);
    }

    let Some(font) = font else {
        debug!("No font supplied, poster text layers skipped");
        return canvas.into_raster();
    };

    for ((rect, color), hex) in swatches.iter().zip(&colors).zip(palette) {
        let Some(mask) = text_mask(font, HEX_TEXT_SIZE, &hex.to_uppercase()) else {
            continue;
        };
        // Counter-clockwise quarter turn so the code reads bottom to top
        let rotated = imageops::rotate270(&mask);
        let (cx, cy) = rect.center();
        let left = (cx - rotated.width() as f32 / 2.0).round() as i64;
        let top = (cy - rotated.height() as f32 / 2.0).round() as i64;
        canvas.blend_mask(&rotated, left, top, pick_text_color(*color));
    }

    if let Some(mask) = text_mask(font, CAPTION_SIZE, &options.caption) {
        let footer_top = SWATCH_TOP + SWATCH_HEIGHT;
        let cy = footer_top + (POSTER_HEIGHT as f32 - footer_top) / 2.0;
        let left = ((POSTER_WIDTH as f32 - mask.width() as f32) / 2.0).round() as i64;
        let top = (cy - mask.height() as f32 / 2.0).round() as i64;
        canvas.blend_mask(&mask, left, top, options.caption_color);
    }

    canvas.into_raster()
}

/// Equal-width swatch slots across the bottom zone.
fn swatch_rects(count: usize) -> Result<Vec<Rect>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let available = POSTER_WIDTH as f32 - 2.0 * MARGIN - SWATCH_GAP * (count - 1) as f32;
    let width = available / count as f32;
    if width < 1.0 {
        return Err(ImagingError::invalid(format!(
            "{} swatches do not fit on a {}px poster",
            count, POSTER_WIDTH
        )));
    }
    Ok((0..count)
        .map(|i| {
            let x = MARGIN + i as f32 * (width + SWATCH_GAP);
            Rect::new(x, SWATCH_TOP, width, SWATCH_HEIGHT)
        })
        .collect())
}

/// Scale `raster` to cover `width` x `height` and keep the centered crop.
fn cover_crop(raster: &Raster, width: u32, height: u32) -> Result<Raster> {
    let (src_w, src_h) = raster.dimensions();
    let scale = (width as f64 / src_w as f64).max(height as f64 / src_h as f64);
    let crop_w = ((width as f64 / scale).round() as u32).clamp(1, src_w);
    let crop_h = ((height as f64 / scale).round() as u32).clamp(1, src_h);
    let crop = CropRect {
        x: (src_w - crop_w) / 2,
        y: (src_h - crop_h) / 2,
        width: crop_w,
        height: crop_h,
    };
    resample(raster, crop, width, height, SmoothingQuality::High)
}
