//! Property tests for the geometric and palette laws of the imaging core.

use pixelforge::{
    beautify, extract_palette, resolve_crop_rect, sharpen, upscale, Background, CompositionOptions,
    CropFocus, FrameStyle, HexColor, PaletteStyle, Raster, ResampleMethod, ShadowOptions,
    UpscaleOptions,
};
use proptest::prelude::*;

fn frame_style() -> impl Strategy<Value = FrameStyle> {
    prop_oneof![
        Just(FrameStyle::None),
        Just(FrameStyle::Safari),
        Just(FrameStyle::Chrome),
        Just(FrameStyle::Windows),
        Just(FrameStyle::Arc),
        Just(FrameStyle::Mobile),
        Just(FrameStyle::Tablet),
        Just(FrameStyle::Desktop),
    ]
}

fn noisy_raster(width: u32, height: u32, seed: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(73).wrapping_add(y.wrapping_mul(151)).wrapping_add(seed);
        [(v % 256) as u8, ((v / 3) % 256) as u8, ((v / 7) % 256) as u8, 255]
    })
    .unwrap()
}

proptest! {
    #[test]
    fn crop_rect_stays_inside_source(
        width in 1u32..2000,
        height in 1u32..2000,
        aspect in proptest::option::of(0.05f64..20.0),
        focus_x in -50.0f64..150.0,
        focus_y in -50.0f64..150.0,
        crop_size in 0.5f64..200.0,
    ) {
        let options = UpscaleOptions {
            aspect_ratio: aspect,
            crop_focus: CropFocus { x: focus_x, y: focus_y },
            crop_size,
            ..UpscaleOptions::default()
        };
        let rect = resolve_crop_rect(width, height, &options).unwrap();

        prop_assert!(rect.width >= 1 && rect.height >= 1);
        prop_assert!(rect.x + rect.width <= width);
        prop_assert!(rect.y + rect.height <= height);
    }

    #[test]
    fn identity_upscale_keeps_dimensions(width in 1u32..64, height in 1u32..64) {
        let source = noisy_raster(width, height, 7);
        let options = UpscaleOptions {
            scale_factor: 1.0,
            method: ResampleMethod::Nearest,
            ..UpscaleOptions::default()
        };
        let output = upscale(&source, &options).unwrap();
        prop_assert_eq!(output.dimensions(), (width, height));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn palette_has_one_color_per_requested_cluster(
        width in 1u32..48,
        height in 1u32..48,
        seed in any::<u32>(),
        count in 1usize..10,
    ) {
        let source = noisy_raster(width, height, seed);
        let palette = extract_palette(&source, count, PaletteStyle::All).unwrap();

        // Every pixel is opaque, so only a tiny raster can run short of samples
        prop_assert_eq!(palette.len(), count.min((width * height) as usize));
        for hex in &palette {
            prop_assert_eq!(hex.len(), 7);
            prop_assert!(hex.parse::<HexColor>().is_ok());
        }
        // Deterministic for the same input
        prop_assert_eq!(extract_palette(&source, count, PaletteStyle::All).unwrap(), palette);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sharpen_moves_pixels_by_at_most_the_kernel_delta(
        width in 1u32..24,
        height in 1u32..24,
        seed in any::<u32>(),
        amount in 0.0f32..=100.0,
    ) {
        let original = Raster::from_fn(width, height, |x, y| {
            let v = (x ^ seed.rotate_left(y % 32)).wrapping_mul(2_654_435_761);
            [(v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8]
        })
        .unwrap();
        let mut output = original.clone();
        sharpen(&mut output, amount);

        for y in 0..height {
            for x in 0..width {
                let before = original.pixel(x, y);
                let after = output.pixel(x, y);
                prop_assert_eq!(after[3], before[3]);
                let interior = x > 0 && y > 0 && x + 1 < width && y + 1 < height;
                if !interior {
                    prop_assert_eq!(after, before);
                    continue;
                }
                for ch in 0..3 {
                    let center = before[ch] as f64;
                    let neighbours: f64 = [
                        original.pixel(x, y - 1)[ch],
                        original.pixel(x, y + 1)[ch],
                        original.pixel(x - 1, y)[ch],
                        original.pixel(x + 1, y)[ch],
                    ]
                    .iter()
                    .map(|&n| n as f64)
                    .sum();
                    let bound = (4.0 * center - neighbours).abs() * amount as f64 / 100.0 + 1.0;
                    let moved = (after[ch] as f64 - center).abs();
                    prop_assert!(moved <= bound, "moved {} > bound {} at ({}, {})", moved, bound, x, y);
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn beautify_canvas_is_source_plus_padding(
        width in 1u32..40,
        height in 1u32..40,
        padding_x in 0u32..24,
        padding_y in 0u32..24,
        frame in frame_style(),
        rotation in -180.0f32..180.0,
    ) {
        let source = noisy_raster(width, height, 3);
        let options = CompositionOptions {
            padding_x,
            padding_y,
            frame,
            rotation,
            shadow: ShadowOptions::none(),
            background: Background::Solid { color: HexColor::rgb(20, 20, 30) },
            ..CompositionOptions::default()
        };
        let output = beautify(&source, &options).unwrap();
        prop_assert_eq!(output.dimensions(), (width + 2 * padding_x, height + 2 * padding_y));
    }
}
