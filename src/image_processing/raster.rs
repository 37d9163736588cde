use image::{Rgba, RgbaImage};

use crate::error::{ImagingError, Result};

/// Decoded RGBA pixels, row-major, top to bottom.
///
/// The constructors guarantee a non-zero area and
/// `pixels.len() == width * height * 4`, so the accessors never need to
/// re-validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = buffer_len(width, height)?;
        let pixels = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wrap an existing RGBA buffer, checking the length invariant.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = buffer_len(width, height)?;
        if pixels.len() != expected {
            return Err(ImagingError::invalid(format!(
                "pixel buffer holds {} bytes, {}x{} RGBA needs {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Result<Self> {
        let mut raster = Self::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                raster.put_pixel(x, y, f(x, y));
            }
        }
        Ok(raster)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Panics when `(x, y)` is outside the raster, like `ImageBuffer::get_pixel`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        self.clone().into_rgba_image()
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        // Length was validated on construction, so this cannot fail.
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside {}x{} raster",
            x,
            y,
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 4
    }
}

impl TryFrom<RgbaImage> for Raster {
    type Error = ImagingError;

    fn try_from(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }
}

fn buffer_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(ImagingError::invalid(format!(
            "raster must have a non-zero area, got {}x{}",
            width, height
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            ImagingError::invalid(format!("raster {}x{} is too large", width, height))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area_rejected() {
        assert!(matches!(
            Raster::new(0, 10),
            Err(ImagingError::InvalidInput(_))
        ));
        assert!(matches!(
            Raster::from_rgba(10, 0, Vec::new()),
            Err(ImagingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_buffer_length_checked() {
        assert!(Raster::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Raster::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_pixel_access_row_major() {
        let mut raster = Raster::new(3, 2).unwrap();
        raster.put_pixel(2, 1, [1, 2, 3, 4]);
        assert_eq!(raster.pixel(2, 1), [1, 2, 3, 4]);
        // Last pixel of the buffer
        assert_eq!(&raster.pixels()[20..24], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_rgba_image_conversion() {
        let raster = Raster::from_fn(4, 3, |x, y| [x as u8, y as u8, 0, 255]).unwrap();
        let img = raster.to_rgba_image();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 2), &Rgba([3, 2, 0, 255]));

        let back = Raster::try_from(img).unwrap();
        assert_eq!(back, raster);
    }
}
