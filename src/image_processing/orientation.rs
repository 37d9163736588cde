use exif::{In, Reader, Tag, Value};
use image::{imageops, RgbaImage};
use log::debug;
use std::io::Cursor;

use super::raster::Raster;
use crate::error::{ImagingError, Result};

/// EXIF orientation values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    /// No orientation specified or undefined
    Undefined = 0,
    /// Normal orientation (0 degrees)
    TopLeft = 1,
    /// Horizontally flipped
    TopRight = 2,
    /// Rotated 180 degrees
    BottomRight = 3,
    /// Vertically flipped
    BottomLeft = 4,
    /// Mirrored along the main diagonal
    LeftTop = 5,
    /// Needs a 90 degree clockwise turn
    RightTop = 6,
    /// Mirrored along the anti-diagonal
    RightBottom = 7,
    /// Needs a 90 degree counter-clockwise turn
    LeftBottom = 8,
}

impl From<u32> for ExifOrientation {
    fn from(value: u32) -> Self {
        match value {
            1 => ExifOrientation::TopLeft,
            2 => ExifOrientation::TopRight,
            3 => ExifOrientation::BottomRight,
            4 => ExifOrientation::BottomLeft,
            5 => ExifOrientation::LeftTop,
            6 => ExifOrientation::RightTop,
            7 => ExifOrientation::RightBottom,
            8 => ExifOrientation::LeftBottom,
            _ => ExifOrientation::Undefined,
        }
    }
}

impl ExifOrientation {
    pub fn description(&self) -> &'static str {
        match self {
            ExifOrientation::Undefined => "Undefined",
            ExifOrientation::TopLeft => "Normal",
            ExifOrientation::TopRight => "Horizontally flipped",
            ExifOrientation::BottomRight => "Rotated 180°",
            ExifOrientation::BottomLeft => "Vertically flipped",
            ExifOrientation::LeftTop => "Transposed",
            ExifOrientation::RightTop => "Rotated 90° CW",
            ExifOrientation::RightBottom => "Transversed",
            ExifOrientation::LeftBottom => "Rotated 90° CCW",
        }
    }
}

/// Read the EXIF orientation tag from an encoded image. Missing or unreadable
/// metadata yields `Undefined`.
pub fn read_exif_orientation(bytes: &[u8]) -> ExifOrientation {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No EXIF orientation: {}", e);
            return ExifOrientation::Undefined;
        }
    };

    if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
        if let Value::Short(values) = &field.value {
            if let Some(&orientation_value) = values.first() {
                return ExifOrientation::from(orientation_value as u32);
            }
        }
    }

    ExifOrientation::Undefined
}

/// Turn and/or mirror `img` so it displays upright.
pub fn apply_orientation(img: RgbaImage, orientation: ExifOrientation) -> RgbaImage {
    match orientation {
        ExifOrientation::Undefined | ExifOrientation::TopLeft => img,
        ExifOrientation::TopRight => imageops::flip_horizontal(&img),
        ExifOrientation::BottomRight => imageops::rotate180(&img),
        ExifOrientation::BottomLeft => imageops::flip_vertical(&img),
        ExifOrientation::LeftTop => imageops::flip_horizontal(&imageops::rotate90(&img)),
        ExifOrientation::RightTop => imageops::rotate90(&img),
        ExifOrientation::RightBottom => imageops::flip_horizontal(&imageops::rotate270(&img)),
        ExifOrientation::LeftBottom => imageops::rotate270(&img),
    }
}

/// Rotate clockwise by a multiple of 90 degrees. Negative angles turn
/// counter-clockwise; anything else is rejected.
pub fn rotate_quarter(raster: &Raster, degrees: i32) -> Result<Raster> {
    if degrees % 90 != 0 {
        return Err(ImagingError::invalid(format!(
            "rotation must be a multiple of 90 degrees, got {}",
            degrees
        )));
    }

    let img = raster.to_rgba_image();
    let rotated = match degrees.rem_euclid(360) {
        90 => imageops::rotate90(&img),
        180 => imageops::rotate180(&img),
        270 => imageops::rotate270(&img),
        _ => img,
    };
    Raster::try_from(rotated)
}
