use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::raster::Raster;
use super::sharpen::sharpen;
use crate::error::{ImagingError, Result};

/// Resampling method requested by the caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
    Lanczos,
}

/// Smoothing quality hint derived from a [`ResampleMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SmoothingQuality {
    Disabled,
    Medium,
    High,
}

impl ResampleMethod {
    /// Bicubic and lanczos share the high hint.
    pub fn smoothing(self) -> SmoothingQuality {
        match self {
            ResampleMethod::Nearest => SmoothingQuality::Disabled,
            ResampleMethod::Bilinear => SmoothingQuality::Medium,
            ResampleMethod::Bicubic | ResampleMethod::Lanczos => SmoothingQuality::High,
        }
    }
}

impl SmoothingQuality {
    fn algorithm(self) -> ResizeAlg {
        match self {
            SmoothingQuality::Disabled => ResizeAlg::Nearest,
            SmoothingQuality::Medium => ResizeAlg::Convolution(FilterType::Bilinear),
            SmoothingQuality::High => ResizeAlg::Convolution(FilterType::Lanczos3),
        }
    }
}

/// Focal point as percentages of the full source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFocus {
    pub x: f64,
    pub y: f64,
}

impl Default for CropFocus {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpscaleOptions {
    pub scale_factor: f64,
    pub method: ResampleMethod,
    /// Width / height of the crop, `None` keeps the source aspect.
    pub aspect_ratio: Option<f64>,
    pub crop_focus: CropFocus,
    /// Zoom in percent of the aspect-corrected crop; 100 keeps it whole.
    pub crop_size: f64,
    /// Sharpen strength in percent applied after resampling.
    pub sharpen_amount: f32,
}

impl Default for UpscaleOptions {
    fn default() -> Self {
        Self {
            scale_factor: 2.0,
            method: ResampleMethod::default(),
            aspect_ratio: None,
            crop_focus: CropFocus::default(),
            crop_size: 100.0,
            sharpen_amount: 0.0,
        }
    }
}

impl UpscaleOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(ImagingError::invalid(format!(
                "scale factor must be positive, got {}",
                self.scale_factor
            )));
        }
        if let Some(ratio) = self.aspect_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ImagingError::invalid(format!(
                    "aspect ratio must be positive, got {}",
                    ratio
                )));
            }
        }
        if !self.crop_size.is_finite() || self.crop_size <= 0.0 {
            return Err(ImagingError::invalid(format!(
                "crop size must be positive, got {}",
                self.crop_size
            )));
        }
        if !self.crop_focus.x.is_finite() || !self.crop_focus.y.is_finite() {
            return Err(ImagingError::invalid("crop focus must be finite"));
        }
        Ok(())
    }
}

/// Source region selected before resampling. Always inside the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Work out which part of a `src_width` x `src_height` source gets resampled.
///
/// The aspect ratio trims the excess dimension, `crop_size` zooms in
/// (values above 100 are a no-op) and the focus positions the rectangle,
/// which is then clamped fully inside the source.
pub fn resolve_crop_rect(src_width: u32, src_height: u32, options: &UpscaleOptions) -> Result<CropRect> {
    if src_width == 0 || src_height == 0 {
        return Err(ImagingError::invalid("source has zero area"));
    }
    options.validate()?;

    let (src_w, src_h) = (src_width as f64, src_height as f64);
    let (mut crop_w, mut crop_h) = (src_w, src_h);

    if let Some(ratio) = options.aspect_ratio {
        if src_w / src_h > ratio {
            // Source is wider - trim width
            crop_w = src_h * ratio;
        } else {
            // Source is taller - trim height
            crop_h = src_w / ratio;
        }
    }

    let zoom = (options.crop_size / 100.0).min(1.0);
    crop_w *= zoom;
    crop_h *= zoom;

    let width = (crop_w.round() as u32).clamp(1, src_width);
    let height = (crop_h.round() as u32).clamp(1, src_height);

    let center_x = src_w * options.crop_focus.x.clamp(0.0, 100.0) / 100.0;
    let center_y = src_h * options.crop_focus.y.clamp(0.0, 100.0) / 100.0;
    let x = (center_x - width as f64 / 2.0)
        .round()
        .clamp(0.0, (src_width - width) as f64) as u32;
    let y = (center_y - height as f64 / 2.0)
        .round()
        .clamp(0.0, (src_height - height) as f64) as u32;

    Ok(CropRect {
        x,
        y,
        width,
        height,
    })
}

/// Crop, rescale by `scale_factor`, and optionally sharpen.
pub fn upscale(raster: &Raster, options: &UpscaleOptions) -> Result<Raster> {
    let crop = resolve_crop_rect(raster.width(), raster.height(), options)?;

    let target_w = (crop.width as f64 * options.scale_factor).round();
    let target_h = (crop.height as f64 * options.scale_factor).round();
    if target_w < 1.0 || target_h < 1.0 {
        return Err(ImagingError::invalid(format!(
            "{}x{} crop scaled by {} rounds to an empty image",
            crop.width, crop.height, options.scale_factor
        )));
    }
    if target_w > u32::MAX as f64 || target_h > u32::MAX as f64 {
        return Err(ImagingError::invalid("scaled image dimensions overflow"));
    }

    debug!(
        "Upscaling crop {:?} of {}x{} to {}x{} ({})",
        crop,
        raster.width(),
        raster.height(),
        target_w,
        target_h,
        options.method
    );

    let mut output = resample(
        raster,
        crop,
        target_w as u32,
        target_h as u32,
        options.method.smoothing(),
    )?;

    if options.sharpen_amount > 0.0 {
        sharpen(&mut output, options.sharpen_amount);
    }
    Ok(output)
}

/// Shrink proportionally so the image fits the given bounds; never enlarges.
///
/// Width is constrained first, then height, so a result may end up smaller
/// than `max_width` when the height bound is the tighter one.
pub fn fit_within(raster: &Raster, max_width: Option<u32>, max_height: Option<u32>) -> Result<Raster> {
    if max_width == Some(0) || max_height == Some(0) {
        return Err(ImagingError::invalid("maximum dimensions must be positive"));
    }

    let (src_width, src_height) = raster.dimensions();
    let ratio = src_width as f64 / src_height as f64;
    let (mut width, mut height) = (src_width as f64, src_height as f64);

    if let Some(max_w) = max_width {
        if width > max_w as f64 {
            width = max_w as f64;
            height = width / ratio;
        }
    }
    if let Some(max_h) = max_height {
        if height > max_h as f64 {
            height = max_h as f64;
            width = height * ratio;
        }
    }

    let width = (width.round() as u32).max(1);
    let height = (height.round() as u32).max(1);
    resample(
        raster,
        CropRect::full(src_width, src_height),
        width,
        height,
        SmoothingQuality::Medium,
    )
}

/// Draw `crop` of `raster` into a new `width` x `height` raster.
pub(crate) fn resample(
    raster: &Raster,
    crop: CropRect,
    width: u32,
    height: u32,
    quality: SmoothingQuality,
) -> Result<Raster> {
    if crop == CropRect::full(raster.width(), raster.height())
        && (width, height) == raster.dimensions()
    {
        return Ok(raster.clone());
    }

    let src_image = Image::from_vec_u8(
        raster.width(),
        raster.height(),
        raster.pixels().to_vec(),
        PixelType::U8x4,
    )
    .map_err(|e| ImagingError::invalid(format!("source buffer rejected: {}", e)))?;

    let mut dst_image = Image::new(width, height, PixelType::U8x4);

    let options = ResizeOptions::new()
        .resize_alg(quality.algorithm())
        .crop(
            crop.x as f64,
            crop.y as f64,
            crop.width as f64,
            crop.height as f64,
        );

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImagingError::invalid(format!("resize failed: {}", e)))?;

    Raster::from_rgba(width, height, dst_image.buffer().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_raster(width: u32, height: u32) -> Raster {
        Raster::from_fn(width, height, |x, y| {
            [(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]
        })
        .unwrap()
    }

    fn options() -> UpscaleOptions {
        UpscaleOptions::default()
    }

    #[test]
    fn test_nearest_doubles_dimensions() {
        let raster = create_test_raster(10, 10);
        let opts = UpscaleOptions {
            scale_factor: 2.0,
            method: ResampleMethod::Nearest,
            ..options()
        };
        let result = upscale(&raster, &opts).unwrap();
        assert_eq!(result.dimensions(), (20, 20));
        // Nearest keeps source colors
        assert_eq!(result.pixel(0, 0), raster.pixel(0, 0));
        assert_eq!(result.pixel(19, 19), raster.pixel(9, 9));
    }

    #[test]
    fn test_identity_upscale_keeps_dimensions() {
        let raster = create_test_raster(37, 23);
        let opts = UpscaleOptions {
            scale_factor: 1.0,
            method: ResampleMethod::Nearest,
            ..options()
        };
        let result = upscale(&raster, &opts).unwrap();
        assert_eq!(result, raster);
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let raster = create_test_raster(10, 10);
        for scale in [0.0, -1.5, f64::NAN] {
            let opts = UpscaleOptions {
                scale_factor: scale,
                ..options()
            };
            assert!(matches!(
                upscale(&raster, &opts),
                Err(ImagingError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_tiny_scale_rounding_to_zero_rejected() {
        let raster = create_test_raster(10, 10);
        let opts = UpscaleOptions {
            scale_factor: 0.01,
            ..options()
        };
        assert!(upscale(&raster, &opts).is_err());
    }

    #[test]
    fn test_aspect_ratio_trims_width() {
        let opts = UpscaleOptions {
            aspect_ratio: Some(1.0),
            ..options()
        };
        let crop = resolve_crop_rect(200, 100, &opts).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 50,
                y: 0,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn test_aspect_ratio_trims_height() {
        let opts = UpscaleOptions {
            aspect_ratio: Some(16.0 / 9.0),
            ..options()
        };
        let crop = resolve_crop_rect(160, 200, &opts).unwrap();
        assert_eq!((crop.width, crop.height), (160, 90));
        assert_eq!(crop.y, 55);
    }

    #[test]
    fn test_zoom_with_focus_clamped_to_corner() {
        let opts = UpscaleOptions {
            crop_size: 50.0,
            crop_focus: CropFocus { x: 100.0, y: 0.0 },
            ..options()
        };
        let crop = resolve_crop_rect(100, 80, &opts).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 50,
                y: 0,
                width: 50,
                height: 40
            }
        );
    }

    #[test]
    fn test_crop_size_above_100_is_noop() {
        let opts = UpscaleOptions {
            crop_size: 250.0,
            ..options()
        };
        assert_eq!(resolve_crop_rect(64, 48, &opts).unwrap(), CropRect::full(64, 48));
    }

    #[test]
    fn test_upscale_with_crop_and_sharpen() {
        let raster = create_test_raster(100, 50);
        let opts = UpscaleOptions {
            scale_factor: 1.5,
            method: ResampleMethod::Lanczos,
            aspect_ratio: Some(1.0),
            crop_size: 50.0,
            sharpen_amount: 30.0,
            ..options()
        };
        let result = upscale(&raster, &opts).unwrap();
        // 50x50 aspect crop, zoomed to 25x25, scaled by 1.5
        assert_eq!(result.dimensions(), (38, 38));
    }

    #[test]
    fn test_quality_ordering() {
        assert!(ResampleMethod::Nearest.smoothing() < ResampleMethod::Bilinear.smoothing());
        assert!(ResampleMethod::Bilinear.smoothing() < ResampleMethod::Bicubic.smoothing());
        assert_eq!(
            ResampleMethod::Bicubic.smoothing(),
            ResampleMethod::Lanczos.smoothing()
        );
    }

    #[test]
    fn test_fit_within_width_then_height() {
        let raster = create_test_raster(400, 200);
        let result = fit_within(&raster, Some(200), None).unwrap();
        assert_eq!(result.dimensions(), (200, 100));

        let result = fit_within(&raster, Some(300), Some(100)).unwrap();
        assert_eq!(result.dimensions(), (200, 100));
    }

    #[test]
    fn test_fit_within_never_enlarges() {
        let raster = create_test_raster(40, 30);
        let result = fit_within(&raster, Some(800), Some(600)).unwrap();
        assert_eq!(result, raster);
        assert!(fit_within(&raster, Some(0), None).is_err());
    }

    #[test]
    fn test_upscale_options_from_json() {
        let json = r#"{"scaleFactor": 3, "method": "lanczos", "cropFocus": {"x": 10, "y": 90}}"#;
        let opts: UpscaleOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.scale_factor, 3.0);
        assert_eq!(opts.method, ResampleMethod::Lanczos);
        assert_eq!(opts.crop_focus, CropFocus { x: 10.0, y: 90.0 });
        assert_eq!(opts.crop_size, 100.0);
    }
}
