//! Minimal 2D drawing surface used by the compositor and the poster.
//!
//! Shapes are described in a local coordinate space and mapped onto the
//! canvas through an affine [`Transform`], the way a canvas context applies
//! translate/rotate/scale. Coverage is computed from each shape's signed
//! distance, which gives anti-aliased edges under any rotation.
//!
//! | Operation | Implementation |
//! |---|---|
//! | Fill shape | signed distance -> coverage -> source-over blend |
//! | Clip | per-pixel coverage [`Mask`] multiplied into fills |
//! | Shadow | mask -> `imageproc::filter::gaussian_blur_f32` -> tinted blend |
//! | Image blit | inverse transform + bilinear sampling of the source |
//! | Glyph masks | `GrayImage` coverage blended at an offset |

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use super::color::HexColor;
use super::raster::Raster;
use crate::error::Result;

/// Affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Append a translation; like `ctx.translate`, it applies before any
    /// transform already present.
    pub fn translate(self, tx: f32, ty: f32) -> Self {
        self.then_local(Self {
            e: tx,
            f: ty,
            ..Self::identity()
        })
    }

    /// Append a clockwise rotation in degrees (y axis points down).
    pub fn rotate(self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.then_local(Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn scale(self, s: f32) -> Self {
        self.then_local(Self {
            a: s,
            d: s,
            ..Self::identity()
        })
    }

    /// `self * local`: `local` is applied to points first.
    fn then_local(self, m: Self) -> Self {
        Self {
            a: self.a * m.a + self.c * m.b,
            b: self.b * m.a + self.d * m.b,
            c: self.a * m.c + self.c * m.d,
            d: self.b * m.c + self.d * m.d,
            e: self.a * m.e + self.c * m.f + self.e,
            f: self.b * m.e + self.d * m.f + self.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Uniform scale of the transform (canvas pixels per local unit).
    pub fn scale_factor(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Same center, both sides multiplied by `factor`.
    pub fn scaled_about_center(&self, factor: f32) -> Self {
        let (cx, cy) = self.center();
        Self::centered(cx, cy, self.width * factor, self.height * factor)
    }

    pub fn expand(&self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerRadii {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadii {
    pub fn uniform(r: f32) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub fn top(r: f32) -> Self {
        Self {
            top_left: r,
            top_right: r,
            ..Self::default()
        }
    }

    pub fn bottom(r: f32) -> Self {
        Self {
            bottom_right: r,
            bottom_left: r,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    RoundedRect { rect: Rect, radii: CornerRadii },
    Circle { cx: f32, cy: f32, radius: f32 },
    /// Line with round caps.
    Segment {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
    },
    /// Rectangle border of the given stroke width, centered on the edge.
    RectOutline { rect: Rect, width: f32 },
}

impl Shape {
    pub fn rect(rect: Rect) -> Self {
        Shape::RoundedRect {
            rect,
            radii: CornerRadii::default(),
        }
    }

    pub fn rounded(rect: Rect, radius: f32) -> Self {
        Shape::RoundedRect {
            rect,
            radii: CornerRadii::uniform(radius),
        }
    }

    /// Signed distance from `(x, y)` to the edge, negative inside.
    pub fn distance(&self, x: f32, y: f32) -> f32 {
        match *self {
            Shape::RoundedRect { rect, radii } => rounded_rect_distance(rect, radii, x, y),
            Shape::Circle { cx, cy, radius } => ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() - radius,
            Shape::Segment { from, to, width } => {
                let (px, py) = (x - from.0, y - from.1);
                let (dx, dy) = (to.0 - from.0, to.1 - from.1);
                let len_sq = dx * dx + dy * dy;
                let t = if len_sq > 0.0 {
                    ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                ((px - dx * t).powi(2) + (py - dy * t).powi(2)).sqrt() - width / 2.0
            }
            Shape::RectOutline { rect, width } => {
                rounded_rect_distance(rect, CornerRadii::default(), x, y).abs() - width / 2.0
            }
        }
    }

    fn bounds(&self) -> Rect {
        match *self {
            Shape::RoundedRect { rect, .. } => rect,
            Shape::Circle { cx, cy, radius } => Rect::centered(cx, cy, radius * 2.0, radius * 2.0),
            Shape::Segment { from, to, width } => {
                let half = width / 2.0;
                let x = from.0.min(to.0) - half;
                let y = from.1.min(to.1) - half;
                Rect::new(
                    x,
                    y,
                    (from.0 - to.0).abs() + width,
                    (from.1 - to.1).abs() + width,
                )
            }
            Shape::RectOutline { rect, width } => {
                let half = width / 2.0;
                rect.expand(half, half, half, half)
            }
        }
    }
}

fn rounded_rect_distance(rect: Rect, radii: CornerRadii, x: f32, y: f32) -> f32 {
    let (cx, cy) = rect.center();
    let (half_w, half_h) = (rect.width / 2.0, rect.height / 2.0);
    let (px, py) = (x - cx, y - cy);
    let radius = match (px > 0.0, py > 0.0) {
        (true, true) => radii.bottom_right,
        (true, false) => radii.top_right,
        (false, true) => radii.bottom_left,
        (false, false) => radii.top_left,
    }
    .clamp(0.0, half_w.min(half_h));

    let qx = px.abs() - half_w + radius;
    let qy = py.abs() - half_h + radius;
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    qx.max(qy).min(0.0) + outside - radius
}

/// Per-pixel coverage in 0.0-1.0, canvas-sized.
#[derive(Debug, Clone)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    fn set(&mut self, x: u32, y: u32, value: f32) {
        let i = y as usize * self.width as usize + x as usize;
        self.data[i] = value;
    }
}

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_raster(self) -> Result<Raster> {
        Raster::try_from(self.image)
    }

    /// Rasterize `shape` into a coverage mask without painting.
    pub fn shape_mask(&self, transform: &Transform, shape: &Shape) -> Mask {
        let mut mask = Mask::new(self.width(), self.height());
        self.for_each_covered(transform, shape, |x, y, coverage| mask.set(x, y, coverage));
        mask
    }

    pub fn fill_shape(
        &mut self,
        transform: &Transform,
        shape: &Shape,
        color: HexColor,
        clip: Option<&Mask>,
    ) {
        let mut spans = Vec::new();
        self.for_each_covered(transform, shape, |x, y, coverage| {
            let clipped = clip.map_or(coverage, |m| coverage * m.get(x, y));
            if clipped > 0.0 {
                spans.push((x, y, clipped));
            }
        });
        for (x, y, coverage) in spans {
            blend_over(self.image.get_pixel_mut(x, y), color.0, coverage);
        }
    }

    /// Blur `mask` with the canvas `shadowBlur` convention (sigma = blur / 2),
    /// shift it and paint it in `color` underneath whatever is drawn next.
    pub fn draw_shadow(&mut self, mask: &Mask, blur: f32, color: HexColor, offset: (f32, f32)) {
        if color.alpha() == 0 {
            return;
        }
        let (width, height) = (self.width(), self.height());
        let gray = GrayImage::from_fn(width, height, |x, y| {
            Luma([(mask.get(x, y) * 255.0).round() as u8])
        });
        let blurred = if blur > 0.0 {
            gaussian_blur_f32(&gray, blur / 2.0)
        } else {
            gray
        };

        let dx = offset.0.round() as i64;
        let dy = offset.1.round() as i64;
        for y in 0..height {
            for x in 0..width {
                let sx = x as i64 - dx;
                let sy = y as i64 - dy;
                if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
                    continue;
                }
                let coverage = blurred.get_pixel(sx as u32, sy as u32)[0] as f32 / 255.0;
                if coverage > 0.0 {
                    blend_over(self.image.get_pixel_mut(x, y), color.0, coverage);
                }
            }
        }
    }

    /// Draw `source` stretched to fill `dest` (local coordinates), restricted
    /// to `clip`.
    pub fn draw_image(&mut self, transform: &Transform, source: &Raster, dest: Rect, clip: &Mask) {
        let Some(inverse) = transform.invert() else {
            return;
        };
        if dest.width <= 0.0 || dest.height <= 0.0 {
            return;
        }
        let (src_w, src_h) = (source.width() as f32, source.height() as f32);
        let (x0, y0, x1, y1) = self.pixel_bounds(transform, dest, 1.0);

        for y in y0..y1 {
            for x in x0..x1 {
                let coverage = clip.get(x, y);
                if coverage <= 0.0 {
                    continue;
                }
                let (lx, ly) = inverse.apply(x as f32 + 0.5, y as f32 + 0.5);
                let u = (lx - dest.x) / dest.width * src_w;
                let v = (ly - dest.y) / dest.height * src_h;
                if u < 0.0 || v < 0.0 || u > src_w || v > src_h {
                    continue;
                }
                let sample = sample_bilinear(source, u, v);
                blend_over(self.image.get_pixel_mut(x, y), sample, coverage);
            }
        }
    }

    /// Paint `color` through a glyph coverage mask placed at `(left, top)`.
    pub fn blend_mask(&mut self, mask: &GrayImage, left: i64, top: i64, color: HexColor) {
        for (mx, my, value) in mask.enumerate_pixels() {
            let x = left + mx as i64;
            let y = top + my as i64;
            if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
                continue;
            }
            let coverage = value[0] as f32 / 255.0;
            if coverage > 0.0 {
                blend_over(self.image.get_pixel_mut(x as u32, y as u32), color.0, coverage);
            }
        }
    }

    fn for_each_covered(
        &self,
        transform: &Transform,
        shape: &Shape,
        mut visit: impl FnMut(u32, u32, f32),
    ) {
        let Some(inverse) = transform.invert() else {
            return;
        };
        let scale = transform.scale_factor();
        let (x0, y0, x1, y1) = self.pixel_bounds(transform, shape.bounds(), 1.0 / scale);

        for y in y0..y1 {
            for x in x0..x1 {
                let (lx, ly) = inverse.apply(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (0.5 - shape.distance(lx, ly) * scale).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    visit(x, y, coverage);
                }
            }
        }
    }

    /// Canvas pixel range covering `rect` (local) after transforming, grown by
    /// `margin` local units for anti-aliasing.
    fn pixel_bounds(&self, transform: &Transform, rect: Rect, margin: f32) -> (u32, u32, u32, u32) {
        let rect = rect.expand(margin, margin, margin, margin);
        let corners = [
            transform.apply(rect.x, rect.y),
            transform.apply(rect.right(), rect.y),
            transform.apply(rect.x, rect.bottom()),
            transform.apply(rect.right(), rect.bottom()),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

        let clamp_x = |v: f32| (v.max(0.0) as u32).min(self.width());
        let clamp_y = |v: f32| (v.max(0.0) as u32).min(self.height());
        (
            clamp_x(min_x.floor()),
            clamp_y(min_y.floor()),
            clamp_x(max_x.ceil()),
            clamp_y(max_y.ceil()),
        )
    }
}

/// Source-over blend of a straight-alpha color scaled by `coverage`.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, color: [u8; 4], coverage: f32) {
    let src_a = color[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for ch in 0..3 {
        let value =
            (color[ch] as f32 * src_a + dst[ch] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[ch] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Bilinear sample at continuous coordinates `(u, v)` in source pixels,
/// interpolating premultiplied values so transparent texels don't darken edges.
fn sample_bilinear(source: &Raster, u: f32, v: f32) -> [u8; 4] {
    let max_x = source.width() - 1;
    let max_y = source.height() - 1;
    let x = (u - 0.5).clamp(0.0, max_x as f32);
    let y = (v - 0.5).clamp(0.0, max_y as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let mut acc = [0.0f32; 4];
    for (px, py, weight) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ] {
        let p = source.pixel(px, py);
        let alpha = p[3] as f32 / 255.0;
        for ch in 0..3 {
            acc[ch] += p[ch] as f32 * alpha * weight;
        }
        acc[3] += alpha * weight;
    }

    if acc[3] <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        (acc[0] / acc[3]).round().clamp(0.0, 255.0) as u8,
        (acc[1] / acc[3]).round().clamp(0.0, 255.0) as u8,
        (acc[2] / acc[3]).round().clamp(0.0, 255.0) as u8,
        (acc[3] * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: HexColor = HexColor::rgb(255, 0, 0);

    #[test]
    fn test_transform_translate_rotate_scale() {
        let t = Transform::identity().translate(10.0, 20.0).rotate(90.0).scale(2.0);
        let (x, y) = t.apply(1.0, 0.0);
        // scale -> (2, 0), rotate 90 cw -> (0, 2), translate -> (10, 22)
        assert!((x - 10.0).abs() < 1e-4);
        assert!((y - 22.0).abs() < 1e-4);
        assert!((t.scale_factor() - 2.0).abs() < 1e-4);

        let inverse = t.invert().unwrap();
        let (lx, ly) = inverse.apply(x, y);
        assert!((lx - 1.0).abs() < 1e-4);
        assert!(ly.abs() < 1e-4);
    }

    #[test]
    fn test_zero_scale_has_no_inverse() {
        assert!(Transform::identity().scale(0.0).invert().is_none());
    }

    #[test]
    fn test_rounded_rect_distance() {
        let shape = Shape::rounded(Rect::new(0.0, 0.0, 100.0, 50.0), 10.0);
        assert!(shape.distance(50.0, 25.0) < 0.0);
        assert!(shape.distance(150.0, 25.0) > 0.0);
        // Square corner would contain (1, 1); the rounded one does not
        assert!(shape.distance(1.0, 1.0) > 0.0);
        assert!(Shape::rect(Rect::new(0.0, 0.0, 100.0, 50.0)).distance(1.0, 1.0) < 0.0);
    }

    #[test]
    fn test_selective_corner_radii() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let shape = Shape::RoundedRect {
            rect,
            radii: CornerRadii::top(20.0),
        };
        assert!(shape.distance(1.0, 1.0) > 0.0); // top-left rounded
        assert!(shape.distance(1.0, 99.0) < 0.0); // bottom-left square
    }

    #[test]
    fn test_scaled_about_center_keeps_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 40.0);
        let half = rect.scaled_about_center(0.5);
        assert_eq!(half, Rect::new(35.0, 30.0, 50.0, 20.0));
        assert_eq!(half.center(), rect.center());
    }

    #[test]
    fn test_fill_shape_opaque_interior() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill_shape(
            &Transform::identity(),
            &Shape::rect(Rect::new(5.0, 5.0, 10.0, 10.0)),
            RED,
            None,
        );
        assert_eq!(canvas.image().get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.image().get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_fill_respects_clip() {
        let mut canvas = Canvas::new(20, 20);
        let clip = canvas.shape_mask(
            &Transform::identity(),
            &Shape::rect(Rect::new(0.0, 0.0, 10.0, 20.0)),
        );
        canvas.fill_shape(
            &Transform::identity(),
            &Shape::rect(Rect::new(0.0, 0.0, 20.0, 20.0)),
            RED,
            Some(&clip),
        );
        assert_eq!(canvas.image().get_pixel(5, 5)[3], 255);
        assert_eq!(canvas.image().get_pixel(15, 5)[3], 0);
    }

    #[test]
    fn test_shadow_spreads_beyond_shape() {
        let mut canvas = Canvas::new(40, 40);
        let mask = canvas.shape_mask(
            &Transform::identity(),
            &Shape::rect(Rect::new(15.0, 15.0, 10.0, 10.0)),
        );
        canvas.draw_shadow(&mask, 8.0, HexColor::BLACK, (0.0, 0.0));
        assert!(canvas.image().get_pixel(20, 20)[3] > 0);
        assert!(canvas.image().get_pixel(13, 20)[3] > 0);
        assert_eq!(canvas.image().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_draw_image_fills_dest() {
        let source = Raster::filled(4, 4, [0, 0, 255, 255]).unwrap();
        let mut canvas = Canvas::new(10, 10);
        let dest = Rect::new(2.0, 2.0, 6.0, 6.0);
        let clip = canvas.shape_mask(&Transform::identity(), &Shape::rect(dest));
        canvas.draw_image(&Transform::identity(), &source, dest, &clip);
        assert_eq!(canvas.image().get_pixel(5, 5), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.image().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_blend_over_half_coverage() {
        let mut dst = Rgba([0, 0, 0, 255]);
        blend_over(&mut dst, [255, 255, 255, 255], 0.5);
        assert_eq!(dst, Rgba([128, 128, 128, 255]));
    }
}
