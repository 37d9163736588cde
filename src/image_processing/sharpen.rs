use super::raster::Raster;

/// Sharpen interior pixels in place with a 4-neighbour kernel.
///
/// For each of R, G and B: `s = 5c - (top + bottom + left + right)` and the
/// result is `c + (s - c) * amount / 100`, clamped to a byte. `amount` is
/// clamped to 0-100. The outermost row and column on every side are left
/// untouched, as is the alpha channel. Neighbours are always read from the
/// unmodified input.
pub fn sharpen(raster: &mut Raster, amount: f32) {
    let strength = if amount.is_finite() {
        amount.clamp(0.0, 100.0) / 100.0
    } else {
        0.0
    };
    let (width, height) = raster.dimensions();
    if strength == 0.0 || width < 3 || height < 3 {
        return;
    }

    let stride = width as usize * 4;
    let original = raster.pixels().to_vec();
    let pixels = raster.pixels_mut();

    for y in 1..height as usize - 1 {
        for x in 1..width as usize - 1 {
            let i = y * stride + x * 4;
            for ch in 0..3 {
                let center = original[i + ch] as f32;
                let neighbours = original[i - stride + ch] as f32
                    + original[i + stride + ch] as f32
                    + original[i - 4 + ch] as f32
                    + original[i + 4 + ch] as f32;
                let sharpened = 5.0 * center - neighbours;
                let value = center + (sharpened - center) * strength;
                pixels[i + ch] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_raster(width: u32, height: u32) -> Raster {
        Raster::from_fn(width, height, |x, y| {
            [
                (x * 37 % 256) as u8,
                (y * 53 % 256) as u8,
                ((x * y) % 256) as u8,
                (100 + x % 50) as u8,
            ]
        })
        .unwrap()
    }

    #[test]
    fn test_border_pixels_unchanged() {
        let original = create_test_raster(12, 9);
        let mut sharpened = original.clone();
        sharpen(&mut sharpened, 100.0);

        for x in 0..12 {
            assert_eq!(sharpened.pixel(x, 0), original.pixel(x, 0));
            assert_eq!(sharpened.pixel(x, 8), original.pixel(x, 8));
        }
        for y in 0..9 {
            assert_eq!(sharpened.pixel(0, y), original.pixel(0, y));
            assert_eq!(sharpened.pixel(11, y), original.pixel(11, y));
        }
    }

    #[test]
    fn test_alpha_untouched() {
        let original = create_test_raster(8, 8);
        let mut sharpened = original.clone();
        sharpen(&mut sharpened, 100.0);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(sharpened.pixel(x, y)[3], original.pixel(x, y)[3]);
            }
        }
    }

    #[test]
    fn test_flat_image_is_stable() {
        let original = Raster::filled(6, 6, [120, 60, 30, 255]).unwrap();
        let mut sharpened = original.clone();
        sharpen(&mut sharpened, 100.0);
        assert_eq!(sharpened, original);
    }

    #[test]
    fn test_full_strength_uses_kernel() {
        // Bright center on a dark background
        let mut raster = Raster::filled(3, 3, [10, 10, 10, 255]).unwrap();
        raster.put_pixel(1, 1, [50, 50, 50, 255]);
        sharpen(&mut raster, 100.0);
        // 5*50 - 4*10 = 210
        assert_eq!(raster.pixel(1, 1), [210, 210, 210, 255]);
    }

    #[test]
    fn test_half_strength_blends() {
        let mut raster = Raster::filled(3, 3, [10, 10, 10, 255]).unwrap();
        raster.put_pixel(1, 1, [50, 50, 50, 255]);
        sharpen(&mut raster, 50.0);
        // 50 + (210 - 50) * 0.5 = 130
        assert_eq!(raster.pixel(1, 1)[0], 130);
    }

    #[test]
    fn test_result_is_clamped() {
        let mut raster = Raster::filled(3, 3, [255, 0, 0, 255]).unwrap();
        raster.put_pixel(1, 1, [0, 255, 0, 255]);
        sharpen(&mut raster, 100.0);
        assert_eq!(raster.pixel(1, 1), [0, 255, 0, 255]);
    }

    #[test]
    fn test_zero_amount_is_noop() {
        let original = create_test_raster(7, 7);
        let mut sharpened = original.clone();
        sharpen(&mut sharpened, 0.0);
        assert_eq!(sharpened, original);
    }

    #[test]
    fn test_neighbours_read_from_snapshot() {
        // Two adjacent bright pixels: the second must see the first's original value
        let mut raster = Raster::filled(4, 3, [0, 0, 0, 255]).unwrap();
        raster.put_pixel(1, 1, [40, 40, 40, 255]);
        raster.put_pixel(2, 1, [40, 40, 40, 255]);
        sharpen(&mut raster, 100.0);
        // 5*40 - 40 = 160 for both
        assert_eq!(raster.pixel(1, 1)[0], 160);
        assert_eq!(raster.pixel(2, 1)[0], 160);
    }
}
