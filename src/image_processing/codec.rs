//! Decoding and encoding between file bytes and [`Raster`]s.
//!
//! The imaging core never touches the filesystem; hosts hand bytes to a
//! [`Codec`] and get bytes back.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::orientation::{apply_orientation, read_exif_orientation, ExifOrientation};
use super::raster::Raster;
use crate::error::{ImagingError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    #[strum(to_string = "jpeg", serialize = "jpg")]
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }
}

/// Output encoding. `quality` (0.0-1.0) only affects lossy formats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub quality: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 0.92,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ImagingError::invalid(format!(
                "export quality must be within 0.0-1.0, got {}",
                self.quality
            )));
        }
        Ok(())
    }

    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

pub trait Codec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Raster>;
    fn encode(&self, raster: &Raster, settings: &ExportSettings) -> Result<Vec<u8>>;
}

/// [`Codec`] backed by the `image` crate, honouring EXIF orientation on
/// decode.
#[derive(Debug, Clone, Copy)]
pub struct RustCodec {
    apply_exif_orientation: bool,
}

impl Default for RustCodec {
    fn default() -> Self {
        Self {
            apply_exif_orientation: true,
        }
    }
}

impl RustCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode pixels exactly as stored, ignoring the orientation tag.
    pub fn without_orientation() -> Self {
        Self {
            apply_exif_orientation: false,
        }
    }
}

impl Codec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Raster> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ImagingError::Decode(e.to_string()))?
            .to_rgba8();

        let img = if self.apply_exif_orientation {
            let orientation = read_exif_orientation(bytes);
            if orientation != ExifOrientation::Undefined {
                debug!("Applying EXIF orientation: {}", orientation.description());
            }
            apply_orientation(img, orientation)
        } else {
            img
        };

        Raster::try_from(img).map_err(|e| ImagingError::Decode(e.to_string()))
    }

    fn encode(&self, raster: &Raster, settings: &ExportSettings) -> Result<Vec<u8>> {
        settings.validate()?;
        let (width, height) = raster.dimensions();
        let mut buffer = Vec::new();
        let encode_error = |e: image::ImageError| ImagingError::Encode(e.to_string());

        match settings.format {
            ExportFormat::Png => {
                PngEncoder::new(&mut buffer)
                    .write_image(raster.pixels(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_error)?;
            }
            ExportFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(raster.to_rgba_image()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buffer, settings.jpeg_quality())
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(encode_error)?;
            }
            ExportFormat::Webp => {
                debug!("WebP output is lossless, quality {} ignored", settings.quality);
                WebPEncoder::new_lossless(&mut buffer)
                    .write_image(raster.pixels(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_error)?;
            }
        }

        Ok(buffer)
    }
}
