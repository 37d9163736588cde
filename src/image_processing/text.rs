use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_text_mut, text_size};
use log::debug;
use std::path::Path;

use crate::error::{ImagingError, Result};

/// Load a font for poster text
///
/// Resolution order:
/// 1. Full path: "/System/Library/Fonts/Supplemental/Arial.ttf" -> loads directly
/// 2. Font filename: "Arial.ttf" -> searches the common font directories
/// 3. Font name: "Arial" -> tries well-known per-platform file names
/// 4. Any of a handful of common sans-serif fallbacks
pub fn load_font(font_spec: &str) -> Result<FontVec> {
    if is_absolute_path(font_spec) {
        return load_font_from_path(Path::new(font_spec));
    }

    if is_font_filename(font_spec) {
        if let Some(font) = find_in_font_directories(font_spec) {
            return Ok(font);
        }
    }

    let by_name = system_font_paths(font_spec)
        .into_iter()
        .chain(FALLBACK_FONTS.iter().map(|p| p.to_string()))
        .find_map(|path| load_font_from_path(Path::new(&expand_path(&path))).ok());

    by_name.ok_or_else(|| {
        ImagingError::ContextUnavailable(format!(
            "no usable font found for '{}'; pass a path to a .ttf/.otf file",
            font_spec
        ))
    })
}

/// Parse an in-memory TrueType/OpenType font.
pub fn font_from_bytes(data: Vec<u8>) -> Result<FontVec> {
    FontVec::try_from_vec(data)
        .map_err(|e| ImagingError::ContextUnavailable(format!("invalid font data: {}", e)))
}

fn load_font_from_path(path: &Path) -> Result<FontVec> {
    let data = std::fs::read(path).map_err(|e| {
        ImagingError::ContextUnavailable(format!("cannot read font {}: {}", path.display(), e))
    })?;
    let font = font_from_bytes(data)?;
    debug!("Loaded font from {}", path.display());
    Ok(font)
}

const FALLBACK_FONTS: [&str; 6] = [
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/mnt/c/Windows/Fonts/arial.ttf",
];

const FONT_DIRECTORIES: [&str; 12] = [
    // macOS
    "/System/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
    "~/Library/Fonts",
    // Linux
    "/usr/share/fonts",
    "/usr/share/fonts/truetype",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/opentype",
    "/usr/local/share/fonts",
    "~/.local/share/fonts",
    // Windows (via WSL)
    "/mnt/c/Windows/Fonts",
    "/mnt/c/Windows/System32/Fonts",
];

fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || (path.len() > 2 && path.chars().nth(1) == Some(':'))
}

fn is_font_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    [".ttf", ".otf", ".ttc"].iter().any(|ext| lower.ends_with(ext))
}

fn find_in_font_directories(filename: &str) -> Option<FontVec> {
    FONT_DIRECTORIES
        .iter()
        .map(|dir| Path::new(&expand_path(dir)).join(filename))
        .filter(|path| path.exists())
        .find_map(|path| load_font_from_path(&path).ok())
}

/// Expand paths with ~ to home directory
fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}/{}", home, rest);
        }
    }
    path.to_string()
}

fn system_font_paths(font_name: &str) -> Vec<String> {
    let normalized = font_name.to_lowercase().replace([' ', '-'], "");
    let mut paths = Vec::new();
    for ext in ["ttf", "otf", "ttc"] {
        paths.push(format!("/System/Library/Fonts/{}.{}", font_name, ext));
        paths.push(format!("/System/Library/Fonts/Supplemental/{}.{}", font_name, ext));
        paths.push(format!("/Library/Fonts/{}.{}", font_name, ext));
        paths.push(format!("~/Library/Fonts/{}.{}", font_name, ext));
    }
    paths.push(format!("/usr/share/fonts/truetype/{0}/{0}.ttf", normalized));
    paths.push(format!("/usr/share/fonts/TTF/{}.ttf", font_name));
    paths.push(format!("/usr/share/fonts/opentype/{0}/{0}.otf", normalized));
    paths.push(format!("/mnt/c/Windows/Fonts/{}.ttf", font_name));
    paths
}

/// Rasterize `text` on a single line into a coverage mask sized to fit it.
/// Returns `None` when nothing would be drawn.
pub fn text_mask(font: &FontVec, size: f32, text: &str) -> Option<GrayImage> {
    if text.is_empty() || size <= 0.0 {
        return None;
    }
    let scale = PxScale::from(size);
    let (width, height) = text_size(scale, font, text);
    let scaled = font.as_scaled(scale);
    let line_height = (scaled.ascent() - scaled.descent()).ceil() as u32;
    let height = height.max(line_height);
    if width == 0 || height == 0 {
        return None;
    }

    let mut mask = GrayImage::new(width, height);
    draw_text_mut(&mut mask, Luma([255u8]), 0, 0, scale, font, text);
    Some(mask)
}
