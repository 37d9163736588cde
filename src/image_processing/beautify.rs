//! Screenshot beautification: the source image placed on a padded
//! background with rounded corners, a drop shadow and optional window or
//! device chrome.
//!
//! Layers are painted strictly in this order:
//!
//! 1. background fill (solid, gradient, mesh or palette-derived)
//! 2. optional noise
//! 3. center/rotate/scale transform around the canvas center
//! 4. shadow cast by the silhouette
//! 5. frame body and chrome, clipped to the silhouette
//! 6. the image, clipped to its own rounded rect
//!
//! The canvas is always `(width + 2 * padding_x) x (height + 2 * padding_y)`;
//! rotation and scale never grow it, so content may be clipped at the edges.

use log::debug;
use serde::{Deserialize, Serialize};

use super::background::{apply_noise, paint_background, Background};
use super::canvas::{Canvas, Shape, Transform};
use super::codec::ExportSettings;
use super::color::HexColor;
use super::frames::{FrameStyle, FrameTheme};
use super::raster::Raster;
use crate::error::{ImagingError, Result};

/// Largest accepted shadow blur radius in pixels.
pub const MAX_SHADOW_BLUR: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShadowOptions {
    /// Blur radius in pixels.
    pub blur: f32,
    pub color: HexColor,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            blur: 30.0,
            color: HexColor::rgba(0, 0, 0, 0x66),
            offset_x: 0.0,
            offset_y: 12.0,
        }
    }
}

impl ShadowOptions {
    pub fn none() -> Self {
        Self {
            blur: 0.0,
            color: HexColor::TRANSPARENT,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionOptions {
    pub padding_x: u32,
    pub padding_y: u32,
    pub border_radius: f32,
    pub shadow: ShadowOptions,
    pub background: Background,
    /// Percentage (0-100, exclusive) the image is shrunk inside its slot.
    pub inset: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub scale: f32,
    pub frame: FrameStyle,
    pub frame_theme: FrameTheme,
    pub noise: bool,
    /// Fixed seed for reproducible noise; random when unset.
    pub noise_seed: Option<u64>,
    pub export: ExportSettings,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            padding_x: 64,
            padding_y: 64,
            border_radius: 12.0,
            shadow: ShadowOptions::default(),
            background: Background::default(),
            inset: 0.0,
            rotation: 0.0,
            scale: 1.0,
            frame: FrameStyle::None,
            frame_theme: FrameTheme::Light,
            noise: false,
            noise_seed: None,
            export: ExportSettings::default(),
        }
    }
}

impl CompositionOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ImagingError::invalid(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !(0.0..100.0).contains(&self.inset) {
            return Err(ImagingError::invalid(format!(
                "inset must be within 0-100 (exclusive), got {}",
                self.inset
            )));
        }
        if !self.rotation.is_finite() {
            return Err(ImagingError::invalid("rotation must be finite"));
        }
        if !self.border_radius.is_finite() || self.border_radius < 0.0 {
            return Err(ImagingError::invalid(format!(
                "border radius must be non-negative, got {}",
                self.border_radius
            )));
        }
        let shadow = &self.shadow;
        if !shadow.blur.is_finite() || !(0.0..=MAX_SHADOW_BLUR).contains(&shadow.blur) {
            return Err(ImagingError::invalid(format!(
                "shadow blur must be within 0-{}, got {}",
                MAX_SHADOW_BLUR, shadow.blur
            )));
        }
        if !shadow.offset_x.is_finite() || !shadow.offset_y.is_finite() {
            return Err(ImagingError::invalid("shadow offset must be finite"));
        }
        self.background.validate()?;
        self.export.validate()
    }

    /// Output size for a `width` x `height` source.
    pub fn canvas_size(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        let grow = |side: u32, padding: u32| {
            padding
                .checked_mul(2)
                .and_then(|p| side.checked_add(p))
                .ok_or_else(|| ImagingError::invalid("padded canvas size overflows"))
        };
        Ok((grow(width, self.padding_x)?, grow(height, self.padding_y)?))
    }
}

/// Composite `source` onto a new canvas according to `options`.
pub fn beautify(source: &Raster, options: &CompositionOptions) -> Result<Raster> {
    options.validate()?;
    let (src_w, src_h) = source.dimensions();
    let (width, height) = options.canvas_size(src_w, src_h)?;
    debug!(
        "Beautify {}x{} -> {}x{} (frame: {}, rotation: {}°, scale: {})",
        src_w, src_h, width, height, options.frame, options.rotation, options.scale
    );

    let mut canvas = Canvas::new(width, height);

    let background = options.background.resolve(source)?;
    paint_background(&mut canvas, &background)?;

    if options.noise {
        let seed = options.noise_seed.unwrap_or_else(rand::random);
        apply_noise(&mut canvas, seed);
    }

    let transform = Transform::identity()
        .translate(width as f32 / 2.0, height as f32 / 2.0)
        .rotate(options.rotation)
        .scale(options.scale);

    let geometry = options.frame.geometry(src_w as f32, src_h as f32, options.border_radius);

    // Inset shrinks only the image inside its slot; chrome keeps full size
    let image_rect = geometry
        .content
        .scaled_about_center(1.0 - options.inset / 100.0);
    let silhouette = if options.frame == FrameStyle::None {
        Shape::RoundedRect {
            rect: image_rect,
            radii: geometry.content_radii,
        }
    } else {
        Shape::RoundedRect {
            rect: geometry.silhouette,
            radii: geometry.silhouette_radii,
        }
    };
    let silhouette_mask = canvas.shape_mask(&transform, &silhouette);

    let shadow = &options.shadow;
    canvas.draw_shadow(
        &silhouette_mask,
        shadow.blur,
        shadow.color,
        (shadow.offset_x, shadow.offset_y),
    );

    if options.frame != FrameStyle::None {
        canvas.fill_shape(
            &transform,
            &silhouette,
            options.frame.body_color(options.frame_theme),
            None,
        );
        options.frame.draw_chrome(
            &mut canvas,
            &transform,
            &geometry,
            options.frame_theme,
            &silhouette_mask,
        );
    }

    let image_mask = canvas.shape_mask(
        &transform,
        &Shape::RoundedRect {
            rect: image_rect,
            radii: geometry.content_radii,
        },
    );
    canvas.draw_image(&transform, source, image_rect, &image_mask);

    canvas.into_raster()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const BACKDROP: [u8; 4] = [10, 20, 30, 255];
    const IMAGE: [u8; 4] = [200, 50, 50, 255];

    fn flat_options() -> CompositionOptions {
        CompositionOptions {
            padding_x: 20,
            padding_y: 20,
            border_radius: 0.0,
            shadow: ShadowOptions::none(),
            background: Background::Solid {
                color: HexColor(BACKDROP),
            },
            ..CompositionOptions::default()
        }
    }

    #[test]
    fn test_canvas_is_source_plus_padding() {
        let source = Raster::filled(100, 50, IMAGE).unwrap();
        let result = beautify(&source, &flat_options()).unwrap();
        assert_eq!(result.dimensions(), (140, 90));
    }

    #[test]
    fn test_image_is_centered_on_background() {
        let source = Raster::filled(100, 50, IMAGE).unwrap();
        let result = beautify(&source, &flat_options()).unwrap();
        assert_eq!(result.pixel(0, 0), BACKDROP);
        assert_eq!(result.pixel(19, 45), BACKDROP);
        assert_eq!(result.pixel(20, 20), IMAGE);
        assert_eq!(result.pixel(70, 45), IMAGE);
        assert_eq!(result.pixel(119, 69), IMAGE);
        assert_eq!(result.pixel(120, 45), BACKDROP);
    }

    #[test]
    fn test_size_ignores_rotation_scale_and_frame() {
        let source = Raster::filled(60, 40, IMAGE).unwrap();
        for frame in FrameStyle::iter() {
            let options = CompositionOptions {
                padding_x: 30,
                padding_y: 10,
                rotation: 33.0,
                scale: 1.7,
                frame,
                ..CompositionOptions::default()
            };
            let result = beautify(&source, &options).unwrap();
            assert_eq!(result.dimensions(), (120, 60), "frame {}", frame);
        }
    }

    #[test]
    fn test_rounded_corners_show_background() {
        let source = Raster::filled(100, 100, IMAGE).unwrap();
        let options = CompositionOptions {
            border_radius: 30.0,
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        assert_eq!(result.pixel(21, 21), BACKDROP);
        assert_eq!(result.pixel(70, 70), IMAGE);
    }

    #[test]
    fn test_inset_shrinks_image() {
        let source = Raster::filled(100, 100, IMAGE).unwrap();
        let options = CompositionOptions {
            inset: 50.0,
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        // Image now spans 50x50 around the center (70, 70)
        assert_eq!(result.pixel(40, 70), BACKDROP);
        assert_eq!(result.pixel(50, 70), IMAGE);
        assert_eq!(result.pixel(89, 70), IMAGE);
        assert_eq!(result.pixel(100, 70), BACKDROP);
    }

    #[test]
    fn test_shadow_darkens_below_image() {
        let source = Raster::filled(40, 40, [255, 255, 255, 255]).unwrap();
        let options = CompositionOptions {
            background: Background::Solid {
                color: HexColor::WHITE,
            },
            shadow: ShadowOptions {
                blur: 10.0,
                color: HexColor::rgba(0, 0, 0, 200),
                offset_x: 0.0,
                offset_y: 10.0,
            },
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        // Just below the image, inside the shifted shadow
        assert!(result.pixel(40, 64)[0] < 200);
        // Far corner stays untouched
        assert_eq!(result.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_safari_header_above_image() {
        let source = Raster::filled(100, 50, IMAGE).unwrap();
        let options = CompositionOptions {
            padding_x: 60,
            padding_y: 60,
            frame: FrameStyle::Safari,
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        assert_eq!(result.dimensions(), (220, 170));
        // Silhouette is 100x90 centered at (110, 85): header spans y 40..80
        assert_eq!(result.pixel(150, 45), [0xf6, 0xf6, 0xf6, 255]);
        assert_eq!(result.pixel(110, 105), IMAGE);
        assert_eq!(result.pixel(110, 20), BACKDROP);
    }

    #[test]
    fn test_inset_keeps_frame_full_size() {
        let source = Raster::filled(100, 50, IMAGE).unwrap();
        let options = CompositionOptions {
            padding_x: 60,
            padding_y: 60,
            frame: FrameStyle::Safari,
            inset: 50.0,
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        let body = [0xf6, 0xf6, 0xf6, 255];
        // Header still spans the full 100px slot at x 60..160
        assert_eq!(result.pixel(150, 45), body);
        // Image is 50x25 around the slot center (110, 105)
        assert_eq!(result.pixel(110, 105), IMAGE);
        assert_eq!(result.pixel(90, 95), IMAGE);
        // The rest of the slot shows the window body
        assert_eq!(result.pixel(70, 105), body);
        assert_eq!(result.pixel(150, 105), body);
        assert_eq!(result.pixel(110, 125), body);
    }

    #[test]
    fn test_inset_shadow_follows_unframed_image() {
        let source = Raster::filled(40, 40, [255, 255, 255, 255]).unwrap();
        let options = CompositionOptions {
            background: Background::Solid {
                color: HexColor::WHITE,
            },
            shadow: ShadowOptions {
                blur: 0.0,
                color: HexColor::rgba(0, 0, 0, 255),
                offset_x: 0.0,
                offset_y: 10.0,
            },
            inset: 50.0,
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        // Image spans 30..50, its shadow 30..50 x 40..60
        assert_eq!(result.pixel(40, 55), [0, 0, 0, 255]);
        // Outside the shrunk image but inside the full 20..60 slot
        assert_eq!(result.pixel(24, 55), [255, 255, 255, 255]);
    }

    #[test]
    fn test_rotation_keeps_center() {
        let source = Raster::filled(80, 20, IMAGE).unwrap();
        let options = CompositionOptions {
            padding_x: 40,
            padding_y: 40,
            rotation: 90.0,
            ..flat_options()
        };
        let result = beautify(&source, &options).unwrap();
        assert_eq!(result.dimensions(), (160, 100));
        // Turned upright: the strip now covers the vertical center line
        assert_eq!(result.pixel(80, 30), IMAGE);
        assert_eq!(result.pixel(30, 50), BACKDROP);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let source = Raster::filled(30, 30, IMAGE).unwrap();
        let options = CompositionOptions {
            noise: true,
            noise_seed: Some(42),
            ..flat_options()
        };
        let first = beautify(&source, &options).unwrap();
        let second = beautify(&source, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let source = Raster::filled(10, 10, IMAGE).unwrap();
        let cases = [
            CompositionOptions { scale: 0.0, ..flat_options() },
            CompositionOptions { scale: f32::NAN, ..flat_options() },
            CompositionOptions { inset: 100.0, ..flat_options() },
            CompositionOptions { border_radius: -1.0, ..flat_options() },
            CompositionOptions {
                shadow: ShadowOptions { blur: 1e9, ..ShadowOptions::default() },
                ..flat_options()
            },
            CompositionOptions {
                shadow: ShadowOptions { blur: -2.0, ..ShadowOptions::default() },
                ..flat_options()
            },
            CompositionOptions {
                background: Background::Gradient { stops: Vec::new() },
                ..flat_options()
            },
        ];
        for options in cases {
            assert!(matches!(
                beautify(&source, &options),
                Err(ImagingError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_options_from_partial_json() {
        let json = r##"{
            "paddingX": 10,
            "frame": "chrome",
            "frameTheme": "dark",
            "shadow": {"blur": 5},
            "background": {"type": "solid", "color": "#123456"}
        }"##;
        let options: CompositionOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.padding_x, 10);
        assert_eq!(options.padding_y, 64);
        assert_eq!(options.frame, FrameStyle::Chrome);
        assert_eq!(options.frame_theme, FrameTheme::Dark);
        assert_eq!(options.shadow.blur, 5.0);
        assert_eq!(options.shadow.offset_y, 12.0);
        assert_eq!(
            options.background,
            Background::Solid {
                color: HexColor::rgb(0x12, 0x34, 0x56)
            }
        );
    }
}
