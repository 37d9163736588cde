//! Image toolkit: k-means palette extraction, focal-point crop and
//! resample, sharpening, screenshot beautification and palette posters.
//!
//! The imaging core lives in [`image_processing`] and works on in-memory
//! [`Raster`]s; the remaining modules back the `pixelforge` binary.

pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use error::{ImagingError, Result};
pub use image_processing::{
    beautify, extract_palette, fit_within, generate_poster, resolve_crop_rect, rotate_quarter,
    sharpen, upscale, Background, Codec, CompositionOptions, CropFocus, CropRect, ExportFormat,
    ExportSettings, FrameStyle, FrameTheme, HexColor, PaletteStyle, PosterOptions, Raster,
    ResampleMethod, RustCodec, ShadowOptions, UpscaleOptions,
};
pub use json_output::JsonMessage;
