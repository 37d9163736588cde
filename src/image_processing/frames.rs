//! Window and device chrome drawn around the composited image.
//!
//! Geometry is computed in local coordinates centered on the origin; the
//! compositor supplies the transform that places it on the canvas. Browser
//! styles add a 40px title bar above the content, device styles surround it
//! with a bezel.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::canvas::{Canvas, CornerRadii, Mask, Rect, Shape, Transform};
use super::color::HexColor;

pub const HEADER_HEIGHT: f32 = 40.0;
const TRAFFIC_LIGHT_RADIUS: f32 = 6.0;
const TRAFFIC_LIGHTS: [HexColor; 3] = [
    HexColor::rgb(0xff, 0x5f, 0x57),
    HexColor::rgb(0xfe, 0xbc, 0x2e),
    HexColor::rgb(0x28, 0xc8, 0x40),
];

const PHONE_BEZEL: f32 = 14.0;
const PHONE_TOP_BEZEL: f32 = 36.0;
const TABLET_BEZEL: f32 = 22.0;
const MONITOR_BEZEL: f32 = 16.0;
const MONITOR_CHIN: f32 = 44.0;
const STAND_NECK_HEIGHT: f32 = 48.0;
const STAND_FOOT_HEIGHT: f32 = 10.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    #[default]
    None,
    Safari,
    Chrome,
    Windows,
    Arc,
    Mobile,
    Tablet,
    Desktop,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FrameTheme {
    #[default]
    Light,
    Dark,
}

/// Local-space layout of a framed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    /// Outer outline; casts the shadow and clips all chrome.
    pub silhouette: Rect,
    pub silhouette_radii: CornerRadii,
    /// Where the image is drawn.
    pub content: Rect,
    pub content_radii: CornerRadii,
    pub header: Option<Rect>,
    pub sidebar: Option<Rect>,
}

struct Palette {
    body: HexColor,
    accent: HexColor,
    glyph: HexColor,
}

impl FrameStyle {
    /// Lay out a `width` x `height` image with corner `radius`, with the
    /// silhouette centered on the origin.
    pub fn geometry(self, width: f32, height: f32, radius: f32) -> FrameGeometry {
        let content = Rect::centered(0.0, 0.0, width, height);
        let r = radius.max(0.0);

        let geometry = match self {
            FrameStyle::None => FrameGeometry {
                silhouette: content,
                silhouette_radii: CornerRadii::uniform(r),
                content,
                content_radii: CornerRadii::uniform(r),
                header: None,
                sidebar: None,
            },
            FrameStyle::Safari | FrameStyle::Chrome | FrameStyle::Windows => FrameGeometry {
                silhouette: content.expand(0.0, HEADER_HEIGHT, 0.0, 0.0),
                silhouette_radii: CornerRadii::uniform(r),
                content,
                content_radii: CornerRadii::bottom(r),
                header: Some(Rect::new(content.x, content.y - HEADER_HEIGHT, width, HEADER_HEIGHT)),
                sidebar: None,
            },
            FrameStyle::Arc => {
                let side = sidebar_width(width);
                FrameGeometry {
                    silhouette: content.expand(side, HEADER_HEIGHT, 0.0, 0.0),
                    silhouette_radii: CornerRadii::uniform(r),
                    content,
                    content_radii: CornerRadii {
                        bottom_right: r,
                        ..CornerRadii::default()
                    },
                    header: Some(Rect::new(
                        content.x - side,
                        content.y - HEADER_HEIGHT,
                        width + side,
                        HEADER_HEIGHT,
                    )),
                    sidebar: Some(Rect::new(content.x - side, content.y, side, height)),
                }
            }
            FrameStyle::Mobile => FrameGeometry {
                silhouette: content.expand(PHONE_BEZEL, PHONE_TOP_BEZEL, PHONE_BEZEL, PHONE_BEZEL),
                silhouette_radii: CornerRadii::uniform(r + PHONE_BEZEL),
                content,
                content_radii: CornerRadii::uniform(r),
                header: None,
                sidebar: None,
            },
            FrameStyle::Tablet => FrameGeometry {
                silhouette: content.expand(TABLET_BEZEL, TABLET_BEZEL, TABLET_BEZEL, TABLET_BEZEL),
                silhouette_radii: CornerRadii::uniform(r + TABLET_BEZEL),
                content,
                content_radii: CornerRadii::uniform(r),
                header: None,
                sidebar: None,
            },
            FrameStyle::Desktop => FrameGeometry {
                silhouette: content.expand(MONITOR_BEZEL, MONITOR_BEZEL, MONITOR_BEZEL, MONITOR_CHIN),
                silhouette_radii: CornerRadii::uniform(r.min(12.0)),
                content,
                content_radii: CornerRadii::default(),
                header: None,
                sidebar: None,
            },
        };
        geometry.centered()
    }

    /// Fill color of the whole silhouette.
    pub fn body_color(self, theme: FrameTheme) -> HexColor {
        self.palette(theme).body
    }

    fn palette(self, theme: FrameTheme) -> Palette {
        let dark = theme == FrameTheme::Dark;
        let (body, accent, glyph) = match self {
            FrameStyle::None => (HexColor::TRANSPARENT, HexColor::TRANSPARENT, HexColor::TRANSPARENT),
            FrameStyle::Safari if dark => (rgb(0x2d2d2d), rgb(0x3d3d3d), rgb(0x9a9a9a)),
            FrameStyle::Safari => (rgb(0xf6f6f6), HexColor::WHITE, rgb(0x8e8e93)),
            FrameStyle::Chrome if dark => (rgb(0x202124), rgb(0x35363a), rgb(0x9aa0a6)),
            FrameStyle::Chrome => (rgb(0xdee1e6), HexColor::WHITE, rgb(0x5f6368)),
            FrameStyle::Windows if dark => (rgb(0x202020), rgb(0x2b2b2b), rgb(0xf0f0f0)),
            FrameStyle::Windows => (rgb(0xf3f3f3), HexColor::WHITE, rgb(0x1f1f1f)),
            FrameStyle::Arc if dark => (
                rgb(0x2b2540),
                HexColor::WHITE.with_alpha(0x26),
                HexColor::WHITE.with_alpha(0x4d),
            ),
            FrameStyle::Arc => (
                rgb(0xece6f7),
                HexColor::WHITE.with_alpha(0xb3),
                HexColor::WHITE.with_alpha(0x66),
            ),
            FrameStyle::Mobile | FrameStyle::Tablet | FrameStyle::Desktop if dark => {
                (rgb(0x1c1c1e), rgb(0x0a0a0a), rgb(0x3a3a3c))
            }
            FrameStyle::Mobile | FrameStyle::Tablet | FrameStyle::Desktop => {
                (rgb(0xe3e4e6), rgb(0x1c1c1e), rgb(0xc9cacc))
            }
        };
        Palette { body, accent, glyph }
    }

    /// Paint the style's header, controls and device details. Everything
    /// except a monitor stand is clipped to `silhouette`.
    pub fn draw_chrome(
        self,
        canvas: &mut Canvas,
        transform: &Transform,
        geometry: &FrameGeometry,
        theme: FrameTheme,
        silhouette: &Mask,
    ) {
        let palette = self.palette(theme);
        let mut painter = Painter {
            canvas,
            transform,
            clip: silhouette,
        };

        if let Some(header) = geometry.header {
            painter.fill(
                Shape::RoundedRect {
                    rect: header,
                    radii: CornerRadii::top(geometry.silhouette_radii.top_left),
                },
                palette.body,
            );
        }

        match self {
            FrameStyle::None => {}
            FrameStyle::Safari => {
                if let Some(header) = geometry.header {
                    painter.traffic_lights(header);
                    // Keep the address bar clear of the traffic lights
                    let (cx, cy) = header.center();
                    let width = (header.width * 0.45).min(480.0).min((header.width / 2.0 - 80.0) * 2.0);
                    if width > 0.0 {
                        painter.fill(Shape::rounded(Rect::centered(cx, cy, width, 24.0), 7.0), palette.accent);
                    }
                }
            }
            FrameStyle::Chrome => {
                if let Some(header) = geometry.header {
                    painter.traffic_lights(header);
                    let tab_width = (header.width * 0.35).min(200.0).min(header.width - 88.0);
                    if tab_width > 0.0 {
                        let tab = Rect::new(header.x + 80.0, header.y + 8.0, tab_width, HEADER_HEIGHT - 8.0);
                        painter.fill(
                            Shape::RoundedRect {
                                rect: tab,
                                radii: CornerRadii::top(8.0),
                            },
                            palette.accent,
                        );
                    }
                }
            }
            FrameStyle::Windows => {
                if let Some(header) = geometry.header {
                    painter.window_controls(header, palette.glyph);
                }
            }
            FrameStyle::Arc => {
                if let Some(header) = geometry.header {
                    painter.traffic_lights(header);
                }
                if let Some(sidebar) = geometry.sidebar {
                    painter.sidebar_tabs(sidebar, palette.accent, palette.glyph);
                }
            }
            FrameStyle::Mobile => {
                let (cx, _) = geometry.content.center();
                let cy = geometry.content.y - PHONE_TOP_BEZEL / 2.0;
                let speaker = (geometry.content.width * 0.25).min(80.0);
                painter.fill(Shape::rounded(Rect::centered(cx, cy, speaker, 6.0), 3.0), palette.accent);
                painter.fill(
                    Shape::Circle {
                        cx: cx + speaker / 2.0 + 12.0,
                        cy,
                        radius: 4.0,
                    },
                    palette.accent,
                );
            }
            FrameStyle::Tablet => {
                let (cx, _) = geometry.content.center();
                painter.fill(
                    Shape::Circle {
                        cx,
                        cy: geometry.content.y - TABLET_BEZEL / 2.0,
                        radius: 4.0,
                    },
                    palette.accent,
                );
            }
            FrameStyle::Desktop => {
                let (cx, _) = geometry.content.center();
                painter.fill(
                    Shape::Circle {
                        cx,
                        cy: geometry.content.bottom() + MONITOR_CHIN / 2.0,
                        radius: 5.0,
                    },
                    palette.glyph,
                );
                painter.monitor_stand(geometry.silhouette, palette.glyph);
            }
        }
    }
}

impl FrameGeometry {
    /// Shift every rect so the silhouette is centered on the origin.
    fn centered(self) -> Self {
        let (dx, dy) = self.silhouette.center();
        let shift = |r: Rect| r.offset(-dx, -dy);
        FrameGeometry {
            silhouette: shift(self.silhouette),
            content: shift(self.content),
            header: self.header.map(shift),
            sidebar: self.sidebar.map(shift),
            ..self
        }
    }
}

fn sidebar_width(content_width: f32) -> f32 {
    (content_width * 0.18).clamp(48.0, 160.0)
}

fn rgb(packed: u32) -> HexColor {
    HexColor::rgb((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
}

struct Painter<'a> {
    canvas: &'a mut Canvas,
    transform: &'a Transform,
    clip: &'a Mask,
}

impl Painter<'_> {
    fn fill(&mut self, shape: Shape, color: HexColor) {
        self.canvas.fill_shape(self.transform, &shape, color, Some(self.clip));
    }

    fn traffic_lights(&mut self, header: Rect) {
        let cy = header.y + header.height / 2.0;
        for (i, color) in TRAFFIC_LIGHTS.iter().enumerate() {
            self.fill(
                Shape::Circle {
                    cx: header.x + 20.0 + 20.0 * i as f32,
                    cy,
                    radius: TRAFFIC_LIGHT_RADIUS,
                },
                *color,
            );
        }
    }

    /// Minimize, maximize and close glyphs on the right of the title bar.
    fn window_controls(&mut self, header: Rect, color: HexColor) {
        let cy = header.y + header.height / 2.0;
        let half = 5.0;
        let stroke = 1.2;

        let minimize = header.right() - 115.0;
        self.fill(
            Shape::Segment {
                from: (minimize - half, cy),
                to: (minimize + half, cy),
                width: stroke,
            },
            color,
        );

        let maximize = header.right() - 70.0;
        self.fill(
            Shape::RectOutline {
                rect: Rect::centered(maximize, cy, half * 2.0, half * 2.0),
                width: stroke,
            },
            color,
        );

        let close = header.right() - 25.0;
        for (from, to) in [
            ((close - half, cy - half), (close + half, cy + half)),
            ((close - half, cy + half), (close + half, cy - half)),
        ] {
            self.fill(Shape::Segment { from, to, width: stroke }, color);
        }
    }

    /// Active tab pill followed by two faint placeholders.
    fn sidebar_tabs(&mut self, sidebar: Rect, active: HexColor, inactive: HexColor) {
        let width = sidebar.width - 16.0;
        if width <= 0.0 {
            return;
        }
        for i in 0..3 {
            let tab = Rect::new(sidebar.x + 8.0, sidebar.y + 10.0 + 34.0 * i as f32, width, 26.0);
            if tab.bottom() > sidebar.bottom() {
                break;
            }
            let color = if i == 0 { active } else { inactive };
            self.fill(Shape::rounded(tab, 6.0), color);
        }
    }

    /// Neck and foot below the monitor, drawn outside the silhouette clip.
    fn monitor_stand(&mut self, silhouette: Rect, color: HexColor) {
        let (cx, _) = silhouette.center();
        let neck_width = (silhouette.width * 0.12).max(20.0);
        let neck = Rect::new(cx - neck_width / 2.0, silhouette.bottom(), neck_width, STAND_NECK_HEIGHT);
        let foot = Rect::centered(
            cx,
            neck.bottom() + STAND_FOOT_HEIGHT / 2.0,
            (silhouette.width * 0.36).max(60.0),
            STAND_FOOT_HEIGHT,
        );
        self.canvas.fill_shape(self.transform, &Shape::rect(neck), color, None);
        self.canvas.fill_shape(
            self.transform,
            &Shape::RoundedRect {
                rect: foot,
                radii: CornerRadii::top(5.0),
            },
            color,
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_silhouette_is_centered() {
        for style in FrameStyle::iter() {
            let geometry = style.geometry(200.0, 120.0, 12.0);
            let (cx, cy) = geometry.silhouette.center();
            assert!(cx.abs() < 1e-3 && cy.abs() < 1e-3, "{} not centered", style);
        }
    }

    #[test]
    fn test_content_keeps_image_size() {
        for style in FrameStyle::iter() {
            let geometry = style.geometry(200.0, 120.0, 12.0);
            assert_eq!(geometry.content.width, 200.0);
            assert_eq!(geometry.content.height, 120.0);
        }
    }

    #[test]
    fn test_browser_header_sits_above_content() {
        let geometry = FrameStyle::Safari.geometry(200.0, 120.0, 12.0);
        let header = geometry.header.unwrap();
        assert_eq!(header.height, HEADER_HEIGHT);
        assert!((header.bottom() - geometry.content.y).abs() < 1e-3);
        assert_eq!(geometry.silhouette.height, 160.0);
        assert_eq!(geometry.content_radii.top_left, 0.0);
        assert_eq!(geometry.content_radii.bottom_left, 12.0);
    }

    #[test]
    fn test_arc_has_sidebar() {
        let geometry = FrameStyle::Arc.geometry(400.0, 300.0, 10.0);
        let sidebar = geometry.sidebar.unwrap();
        assert_eq!(sidebar.width, 72.0);
        assert!((sidebar.right() - geometry.content.x).abs() < 1e-3);
        assert_eq!(geometry.content_radii.bottom_left, 0.0);
        assert_eq!(geometry.content_radii.bottom_right, 10.0);
    }

    #[test]
    fn test_device_bezels() {
        let phone = FrameStyle::Mobile.geometry(100.0, 200.0, 20.0);
        assert_eq!(phone.silhouette.width, 128.0);
        assert_eq!(phone.silhouette.height, 250.0);
        assert_eq!(phone.silhouette_radii.top_left, 34.0);

        let monitor = FrameStyle::Desktop.geometry(300.0, 200.0, 20.0);
        assert_eq!(monitor.silhouette.height, 260.0);
        assert_eq!(monitor.content_radii, CornerRadii::default());
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("safari".parse::<FrameStyle>().unwrap(), FrameStyle::Safari);
        assert_eq!("Desktop".parse::<FrameStyle>().unwrap(), FrameStyle::Desktop);
        assert_eq!(FrameTheme::Dark.to_string(), "dark");
        assert!("netscape".parse::<FrameStyle>().is_err());
    }

    #[test]
    fn test_theme_changes_body() {
        assert_ne!(
            FrameStyle::Chrome.body_color(FrameTheme::Light),
            FrameStyle::Chrome.body_color(FrameTheme::Dark)
        );
        assert_eq!(FrameStyle::Safari.body_color(FrameTheme::Light), HexColor::rgb(0xf6, 0xf6, 0xf6));
    }

    #[test]
    fn test_desktop_stand_draws_below_silhouette() {
        let mut canvas = Canvas::new(200, 200);
        let geometry = FrameStyle::Desktop.geometry(100.0, 60.0, 0.0);
        let transform = Transform::identity().translate(100.0, 80.0);
        let silhouette = canvas.shape_mask(
            &transform,
            &Shape::RoundedRect {
                rect: geometry.silhouette,
                radii: geometry.silhouette_radii,
            },
        );
        FrameStyle::Desktop.draw_chrome(&mut canvas, &transform, &geometry, FrameTheme::Light, &silhouette);
        // Silhouette spans 132x120 around y=80, so its bottom is at y=140
        assert!(canvas.image().get_pixel(100, 150)[3] > 0);
        assert_eq!(canvas.image().get_pixel(100, 20)[3], 0);
    }
}
