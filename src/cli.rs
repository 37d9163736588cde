use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::image_processing::{
    CropFocus, ExportFormat, FrameStyle, FrameTheme, HexColor, PaletteStyle, ResampleMethod,
};

#[derive(Parser, Debug)]
#[command(
    name = "pixelforge",
    version,
    about = "Palette extraction, smart upscaling and screenshot beautification",
    long_about = "
pixelforge - batch image toolkit

Extracts color palettes, upscales with focal-point cropping, wraps screenshots
in backgrounds, shadows and window/device frames, and lays out palette posters.
Inputs may be individual files or directories (scanned recursively).

Example Usage:
  # Five-color palette of every photo in a folder, as JSON lines
  pixelforge --json palette -i ~/Photos --colors 5

  # 2x bicubic upscale of the central 60%, cropped to 16:9, lightly sharpened
  pixelforge upscale -i shot.png -o out --scale 2 --crop-size 60 --aspect 16:9 --sharpen 30

  # Safari window on a gradient, dark theme, settings from a JSON file
  pixelforge beautify -i screenshots -o out --config beautify.json --frame safari --theme dark

  # Instagram-sized palette poster with a caption
  pixelforge poster -i photo.jpg -o out --colors 6 --font Arial --caption \"Lisbon, 2024\"

  # Shrink to fit 1920x1080 and re-encode as JPEG at 80%
  pixelforge compress -i raw -o web --max-width 1920 --max-height 1080 --format jpeg --quality 0.8"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Number of parallel processing jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N", global = true)]
    pub jobs: usize,

    /// Enable verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Emit progress and results as JSON lines on stdout instead of styled text
    #[arg(long = "json", global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the dominant colors of each image
    Palette(PaletteArgs),
    /// Crop and resample by an arbitrary scale factor
    Upscale(UpscaleArgs),
    /// Place screenshots on a padded background with shadow and frame
    Beautify(BeautifyArgs),
    /// Lay out a 1080x1350 poster of the image and its palette
    Poster(PosterArgs),
    /// Shrink to fit a bounding box and re-encode
    Compress(CompressArgs),
    /// Rotate by a multiple of 90 degrees
    Rotate(RotateArgs),
}

/// Where images are read from, shared by every subcommand
#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// Input directories or single image files (can be specified multiple times)
    #[arg(short = 'i', long = "input", required = true, value_name = "DIR|FILE")]
    pub input_paths: Vec<PathBuf>,

    /// Comma-separated list of image extensions to process
    #[arg(long = "extensions", default_value = "jpg,jpeg,png,webp", value_name = "LIST")]
    pub extensions_str: String,

    /// Decode pixels as stored, ignoring the EXIF orientation tag
    #[arg(long = "ignore-exif")]
    pub ignore_exif: bool,
}

impl InputArgs {
    /// Parse the extensions string into a vector
    pub fn extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Inputs, outputs and encoding shared by every subcommand that writes images
#[derive(ClapArgs, Debug, Clone)]
pub struct IoArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory for processed images
    #[arg(short = 'o', long = "output", default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Output format: png, jpeg or webp
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<ExportFormat>,

    /// Encoder quality for lossy formats (0.0-1.0)
    #[arg(long = "quality", value_name = "Q")]
    pub quality: Option<f32>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PaletteArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Number of colors to extract
    #[arg(short = 'c', long = "colors", default_value = "5", value_name = "N")]
    pub colors: usize,

    /// Sample filter: all, vibrant, muted, light or dark
    #[arg(long = "style", default_value = "all", value_name = "STYLE")]
    pub style: PaletteStyle,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct UpscaleArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Scale factor applied to the cropped region
    #[arg(short = 's', long = "scale", default_value = "2.0", value_name = "FACTOR")]
    pub scale: f64,

    /// Resampling method: nearest, bilinear, bicubic or lanczos
    #[arg(short = 'm', long = "method", default_value = "bicubic", value_name = "METHOD")]
    pub method: ResampleMethod,

    /// Trim to an aspect ratio before scaling (e.g. 16:9)
    #[arg(long = "aspect", value_name = "W:H", value_parser = parse_aspect)]
    pub aspect: Option<f64>,

    /// Focal point of the crop in percent (e.g. 50,50)
    #[arg(long = "focus", default_value = "50,50", value_name = "X,Y", value_parser = parse_focus)]
    pub focus: CropFocus,

    /// Percentage of the source kept around the focal point (1-100)
    #[arg(long = "crop-size", default_value = "100", value_name = "PERCENT")]
    pub crop_size: f64,

    /// Sharpen strength applied after scaling (0-100)
    #[arg(long = "sharpen", default_value = "0", value_name = "AMOUNT")]
    pub sharpen: f32,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BeautifyArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// JSON file with composition options; flags below override it
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Padding around the image on all sides
    #[arg(short = 'p', long = "padding", value_name = "PX")]
    pub padding: Option<u32>,

    /// Corner radius of the image
    #[arg(short = 'r', long = "radius", value_name = "PX")]
    pub radius: Option<f32>,

    /// Window or device frame: none, safari, chrome, windows, arc, mobile, tablet, desktop
    #[arg(short = 'f', long = "frame", value_name = "STYLE")]
    pub frame: Option<FrameStyle>,

    /// Frame theme: light or dark
    #[arg(long = "theme", value_name = "THEME")]
    pub theme: Option<FrameTheme>,

    /// Rotation in degrees, clockwise
    #[arg(long = "rotation", value_name = "DEG", allow_negative_numbers = true)]
    pub rotation: Option<f32>,

    /// Scale of the framed image around the canvas center
    #[arg(long = "scale", value_name = "FACTOR")]
    pub scale: Option<f32>,

    /// Shrink the image inside its frame by this percentage
    #[arg(long = "inset", value_name = "PERCENT")]
    pub inset: Option<f32>,

    /// Solid background color (e.g. #1e1e2e)
    #[arg(long = "background", value_name = "COLOR", conflicts_with_all = ["gradient", "auto_background"])]
    pub background: Option<HexColor>,

    /// Diagonal gradient background, comma-separated colors
    #[arg(long = "gradient", value_name = "COLORS", value_delimiter = ',', conflicts_with = "auto_background")]
    pub gradient: Option<Vec<HexColor>>,

    /// Derive a mesh background from the image's own palette
    #[arg(long = "auto-background")]
    pub auto_background: bool,

    /// Shadow blur radius
    #[arg(long = "shadow-blur", value_name = "PX")]
    pub shadow_blur: Option<f32>,

    /// Disable the drop shadow
    #[arg(long = "no-shadow", conflicts_with = "shadow_blur")]
    pub no_shadow: bool,

    /// Add film-grain noise over the background
    #[arg(long = "noise")]
    pub noise: bool,

    /// Seed for reproducible noise
    #[arg(long = "seed", value_name = "N", requires = "noise")]
    pub seed: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PosterArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Number of palette swatches
    #[arg(short = 'c', long = "colors", default_value = "5", value_name = "N")]
    pub colors: usize,

    /// Font for hex codes and caption. Supports three formats:
    /// - Font name: "Arial" (searches system fonts)
    /// - Font filename: "Arial.ttf" (searches in font directories)
    /// - Full path: "/System/Library/Fonts/Arial.ttf" (loads directly)
    ///
    /// Falls back to common system sans-serif fonts when not found.
    #[arg(long = "font", default_value = "Arial", value_name = "FONT")]
    pub font: String,

    /// Caption printed in the footer
    #[arg(long = "caption", default_value = "", value_name = "TEXT")]
    pub caption: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CompressArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[arg(long = "max-width", value_name = "PX")]
    pub max_width: Option<u32>,

    #[arg(long = "max-height", value_name = "PX")]
    pub max_height: Option<u32>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RotateArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Clockwise rotation: 90, 180, 270 (negative values turn counter-clockwise)
    #[arg(short = 'd', long = "degrees", default_value = "90", value_name = "DEG", allow_negative_numbers = true)]
    pub degrees: i32,
}

/// Parse "W:H" into a width/height ratio
pub fn parse_aspect(value: &str) -> Result<f64, String> {
    let (w, h) = value
        .split_once(':')
        .ok_or_else(|| format!("Invalid aspect ratio '{}'. Use W:H (e.g., 16:9)", value))?;
    let w = w
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid aspect width: '{}'", w))?;
    let h = h
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid aspect height: '{}'", h))?;
    if !(w > 0.0 && h > 0.0) {
        return Err("Aspect ratio sides must be greater than 0".to_string());
    }
    Ok(w / h)
}

/// Parse "X,Y" percentages into a crop focus
pub fn parse_focus(value: &str) -> Result<CropFocus, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("Invalid focus '{}'. Use X,Y in percent (e.g., 50,50)", value))?;
    let x = x
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid focus x: '{}'", x))?;
    let y = y
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid focus y: '{}'", y))?;
    if !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y) {
        return Err("Focus coordinates must be within 0-100".to_string());
    }
    Ok(CropFocus { x, y })
}
