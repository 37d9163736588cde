//! Color helpers shared by the quantizer, compositor and poster.
//!
//! Hex parsing accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`; formatting always
//! produces lowercase `#rrggbb`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ImagingError, Result};

/// An RGBA color that round-trips through its hex string form in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub [u8; 4]);

impl HexColor {
    pub const WHITE: HexColor = HexColor([255, 255, 255, 255]);
    pub const BLACK: HexColor = HexColor([0, 0, 0, 255]);
    pub const TRANSPARENT: HexColor = HexColor([0, 0, 0, 0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Channels as 0.0-1.0 floats.
    pub fn to_f32(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl FromStr for HexColor {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_color(s).map(HexColor)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ImagingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "{}", to_hex(r, g, b))
        } else {
            write!(f, "{}{:02x}", to_hex(r, g, b), a)
        }
    }
}

/// Parse hex color string to RGBA values
///
/// Supports formats: #RGB, #RRGGBB, #RRGGBBAA
pub fn parse_hex_color(color_str: &str) -> Result<[u8; 4]> {
    let hex = color_str
        .strip_prefix('#')
        .ok_or_else(|| ImagingError::invalid(format!("color '{}' must start with #", color_str)))?;

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ImagingError::invalid(format!(
            "color '{}' contains non-hex digits",
            color_str
        )));
    }

    let channel = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|e| ImagingError::invalid(format!("color '{}': {}", color_str, e)))
    };

    match hex.len() {
        3 => {
            // #RGB -> #RRGGBB
            let r = channel(&hex[0..1].repeat(2))?;
            let g = channel(&hex[1..2].repeat(2))?;
            let b = channel(&hex[2..3].repeat(2))?;
            Ok([r, g, b, 255])
        }
        6 => Ok([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ]),
        8 => Ok([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ]),
        _ => Err(ImagingError::invalid(format!(
            "color '{}' is not #RGB, #RRGGBB or #RRGGBBAA",
            color_str
        ))),
    }
}

pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// HSL with saturation and lightness in percent (0-100), hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;

    if max == min {
        return Hsl {
            hue: 0.0,
            saturation: 0.0,
            lightness: lightness * 100.0,
        };
    }

    let delta = max - min;
    let saturation = if lightness > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let hue = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsl {
        hue: hue * 60.0,
        saturation: saturation * 100.0,
        lightness: lightness * 100.0,
    }
}

/// WCAG 2.x relative luminance of an sRGB color.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

pub fn contrast_ratio(a: [u8; 3], b: [u8; 3]) -> f64 {
    let la = relative_luminance(a[0], a[1], a[2]);
    let lb = relative_luminance(b[0], b[1], b[2]);
    let (light, dark) = if la > lb { (la, lb) } else { (lb, la) };
    (light + 0.05) / (dark + 0.05)
}
