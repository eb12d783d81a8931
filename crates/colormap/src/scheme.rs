//! Color schemes and palette interpolation.
//!
//! A scheme is a list of colors spread evenly over `t ∈ [0, 1]`; values in
//! between are linearly interpolated in RGB.

use serde::{Deserialize, Serialize};

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` value.
    pub const fn from_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Parse `RRGGBB` or `#RRGGBB`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 {
            return None;
        }
        u32::from_str_radix(s, 16).ok().map(Self::from_u32)
    }

    /// Lower-case `rrggbb`.
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Available color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// 29-step blue -> cyan -> green -> yellow -> red ramp for temperature
    Lst,
    /// Blue -> White -> Green
    NdviBlueGreen,
    /// Black -> White
    Grayscale,
}

impl ColorScheme {
    pub const ALL: &[ColorScheme] = &[Self::Lst, Self::NdviBlueGreen, Self::Grayscale];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lst => "LST",
            Self::NdviBlueGreen => "NDVI",
            Self::Grayscale => "Grayscale",
        }
    }

    /// Palette colors from low to high.
    pub fn colors(&self) -> &'static [Rgb] {
        match self {
            Self::Lst => LST_PALETTE,
            Self::NdviBlueGreen => NDVI_PALETTE,
            Self::Grayscale => GRAYSCALE_PALETTE,
        }
    }
}

const LST_PALETTE: &[Rgb] = &[
    Rgb::from_u32(0x040274), Rgb::from_u32(0x040281), Rgb::from_u32(0x0502a3), Rgb::from_u32(0x0502b8),
    Rgb::from_u32(0x0502ce), Rgb::from_u32(0x0502e6), Rgb::from_u32(0x0602ff), Rgb::from_u32(0x235cb1),
    Rgb::from_u32(0x307ef3), Rgb::from_u32(0x269db1), Rgb::from_u32(0x30c8e2), Rgb::from_u32(0x32d3ef),
    Rgb::from_u32(0x3be285), Rgb::from_u32(0x3ff38f), Rgb::from_u32(0x86e26f), Rgb::from_u32(0x3ae237),
    Rgb::from_u32(0xb5e22e), Rgb::from_u32(0xd6e21f), Rgb::from_u32(0xfff705), Rgb::from_u32(0xffd611),
    Rgb::from_u32(0xffb613), Rgb::from_u32(0xff8b13), Rgb::from_u32(0xff6e08), Rgb::from_u32(0xff500d),
    Rgb::from_u32(0xff0000), Rgb::from_u32(0xde0101), Rgb::from_u32(0xc21301), Rgb::from_u32(0xa71001),
    Rgb::from_u32(0x911003),
];

// CSS named colors blue, white, green
const NDVI_PALETTE: &[Rgb] = &[
    Rgb::from_u32(0x0000ff),
    Rgb::from_u32(0xffffff),
    Rgb::from_u32(0x008000),
];

const GRAYSCALE_PALETTE: &[Rgb] = &[Rgb::from_u32(0x000000), Rgb::from_u32(0xffffff)];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

/// Interpolate over colors spaced evenly on `[0, 1]`, clamping outside.
pub fn evenly_spaced(colors: &[Rgb], t: f64) -> Rgb {
    let last = colors.len() - 1;
    if last == 0 || t.is_nan() || t <= 0.0 {
        return colors[0];
    }
    if t >= 1.0 {
        return colors[last];
    }
    let pos = t * last as f64;
    let i = pos.floor() as usize;
    lerp_color(colors[i], colors[i + 1], pos - i as f64)
}

/// Evaluate a color scheme at normalized position `t` ∈ [0, 1].
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    evenly_spaced(scheme.colors(), t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex("040274"), Some(Rgb::new(4, 2, 116)));
        assert_eq!(Rgb::from_hex("#ff0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::from_hex("fff"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
        assert_eq!(Rgb::new(145, 16, 3).to_hex(), "911003");
    }

    #[test]
    fn lst_palette_endpoints() {
        assert_eq!(ColorScheme::Lst.colors().len(), 29);
        assert_eq!(evaluate(ColorScheme::Lst, 0.0), Rgb::from_u32(0x040274));
        assert_eq!(evaluate(ColorScheme::Lst, 1.0), Rgb::from_u32(0x911003));
        // Exactly on the 25th stop (index 24)
        assert_eq!(evaluate(ColorScheme::Lst, 24.0 / 28.0), Rgb::from_u32(0xff0000));
    }

    #[test]
    fn ndvi_palette() {
        assert_eq!(evaluate(ColorScheme::NdviBlueGreen, 0.0), Rgb::new(0, 0, 255));
        assert_eq!(evaluate(ColorScheme::NdviBlueGreen, 0.5), Rgb::new(255, 255, 255));
        assert_eq!(evaluate(ColorScheme::NdviBlueGreen, 1.0), Rgb::new(0, 128, 0));
    }

    #[test]
    fn grayscale_midpoint() {
        let c = evaluate(ColorScheme::Grayscale, 0.5);
        assert_eq!(c, Rgb::new(128, 128, 128));
    }

    #[test]
    fn clamping() {
        assert_eq!(evaluate(ColorScheme::Lst, -0.5), Rgb::from_u32(0x040274));
        assert_eq!(evaluate(ColorScheme::Lst, 1.5), Rgb::from_u32(0x911003));
        assert_eq!(evaluate(ColorScheme::Lst, f64::NAN), Rgb::from_u32(0x040274));
    }
}
