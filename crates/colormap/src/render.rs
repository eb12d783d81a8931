//! Raster-to-RGBA rendering and layer styles.

use crate::scheme::{evaluate, ColorScheme, Rgb};
use lstgis_core::raster::{Raster, RasterElement};
use lstgis_core::Result;
use serde::{Deserialize, Serialize};

/// Parameters for colormap rendering.
#[derive(Debug, Clone)]
pub struct ColormapParams {
    pub scheme: ColorScheme,
    /// Values below this are clamped.
    pub min: f64,
    /// Values above this are clamped.
    pub max: f64,
    /// Color for nodata pixels (RGBA). Default: fully transparent.
    pub nodata_color: [u8; 4],
}

impl ColormapParams {
    pub fn with_range(scheme: ColorScheme, min: f64, max: f64) -> Self {
        Self {
            scheme,
            min,
            max,
            nodata_color: [0, 0, 0, 0],
        }
    }
}

/// Auto-detect min/max from a raster's valid cells.
pub fn auto_params<T: RasterElement>(raster: &Raster<T>, scheme: ColorScheme) -> ColormapParams {
    let stats = raster.statistics();
    let min = stats.min.and_then(|v| v.to_f64()).filter(|v| v.is_finite());
    let max = stats.max.and_then(|v| v.to_f64()).filter(|v| v.is_finite());

    let (min, max) = match (min, max) {
        (Some(lo), Some(hi)) if (hi - lo).abs() < f64::EPSILON => (lo, lo + 1.0),
        (Some(lo), Some(hi)) => (lo, hi),
        _ => (0.0, 1.0),
    };
    ColormapParams::with_range(scheme, min, max)
}

/// Convert a raster to an RGBA pixel buffer.
///
/// Returns `rows * cols * 4` bytes in row-major order. Nodata pixels get
/// `params.nodata_color`.
pub fn raster_to_rgba<T: RasterElement>(raster: &Raster<T>, params: &ColormapParams) -> Vec<u8> {
    let range = params.max - params.min;
    let inv_range = if range.abs() > f64::EPSILON {
        1.0 / range
    } else {
        1.0
    };

    let mut rgba = Vec::with_capacity(raster.len() * 4);
    for &val in raster.data().iter() {
        match val.to_f64() {
            Some(v) if v.is_finite() && !raster.is_nodata(val) => {
                let Rgb { r, g, b } = evaluate(params.scheme, (v - params.min) * inv_range);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
            _ => rgba.extend_from_slice(&params.nodata_color),
        }
    }
    rgba
}

fn stretch(v: f64, min: f64, inv_range: f64) -> u8 {
    ((v - min) * inv_range * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Render three reflectance bands as a true-color RGBA buffer.
///
/// Each band is linearly stretched from `[min, max]` to `[0, 255]`. A pixel
/// missing in any band is transparent.
pub fn true_color_to_rgba(
    red: &Raster<f64>,
    green: &Raster<f64>,
    blue: &Raster<f64>,
    min: f64,
    max: f64,
) -> Result<Vec<u8>> {
    red.check_same_grid(green)?;
    red.check_same_grid(blue)?;

    let range = max - min;
    let inv_range = if range.abs() > f64::EPSILON {
        1.0 / range
    } else {
        1.0
    };

    let mut rgba = Vec::with_capacity(red.len() * 4);
    let bands = red
        .data()
        .iter()
        .zip(green.data().iter())
        .zip(blue.data().iter());
    for ((&r, &g), &b) in bands {
        if red.is_nodata(r) || green.is_nodata(g) || blue.is_nodata(b) {
            rgba.extend_from_slice(&[0, 0, 0, 0]);
        } else {
            rgba.extend_from_slice(&[
                stretch(r, min, inv_range),
                stretch(g, min, inv_range),
                stretch(b, min, inv_range),
                255,
            ]);
        }
    }
    Ok(rgba)
}

/// Display style handed to a map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub name: String,
    pub scheme: ColorScheme,
    pub min: f64,
    pub max: f64,
}

impl LayerStyle {
    /// Land surface temperature, 25 to 41 °C.
    pub fn lst() -> Self {
        Self {
            name: "LST".into(),
            scheme: ColorScheme::Lst,
            min: 25.0,
            max: 41.0,
        }
    }

    /// NDVI over its typical urban range.
    pub fn ndvi() -> Self {
        Self {
            name: "NDVI".into(),
            scheme: ColorScheme::NdviBlueGreen,
            min: -0.0994,
            max: 0.7591,
        }
    }

    pub fn params(&self) -> ColormapParams {
        ColormapParams::with_range(self.scheme, self.min, self.max)
    }

    /// Palette as `rrggbb` strings.
    pub fn palette_hex(&self) -> Vec<String> {
        self.scheme.colors().iter().map(|c| c.to_hex()).collect()
    }

    pub fn render<T: RasterElement>(&self, raster: &Raster<T>) -> Vec<u8> {
        raster_to_rgba(raster, &self.params())
    }

    pub fn color_bar(&self) -> ColorBar {
        ColorBar {
            title: self.name.clone(),
            scheme: self.scheme,
            min: self.min,
            max: self.max,
        }
    }
}

/// Legend for a layer: a palette strip with three tick labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBar {
    pub title: String,
    pub scheme: ColorScheme,
    pub min: f64,
    pub max: f64,
}

impl ColorBar {
    /// Tick values at the low end, middle and high end.
    pub fn labels(&self) -> [f64; 3] {
        [self.min, (self.max - self.min) / 2.0 + self.min, self.max]
    }

    /// One-pixel-high RGBA strip `width` pixels wide.
    pub fn strip(&self, width: usize) -> Vec<u8> {
        let denom = width.saturating_sub(1).max(1) as f64;
        (0..width)
            .flat_map(|i| {
                let Rgb { r, g, b } = evaluate(self.scheme, i as f64 / denom);
                [r, g, b, 255]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lstgis_core::raster::Raster;

    #[test]
    fn raster_to_rgba_basic() {
        let mut r = Raster::from_vec(vec![0.0, 0.5, 1.0, f64::NAN], 2, 2).unwrap();
        r.set_nodata(Some(f64::NAN));

        let params = ColormapParams::with_range(ColorScheme::Grayscale, 0.0, 1.0);
        let rgba = raster_to_rgba(&r, &params);

        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[128, 128, 128, 255]);
        assert_eq!(&rgba[8..12], &[255, 255, 255, 255]);
        assert_eq!(&rgba[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn lst_style_clamps_to_range() {
        let r = Raster::from_vec(vec![20.0, 25.0, 41.0, 50.0], 1, 4).unwrap();
        let rgba = LayerStyle::lst().render(&r);
        assert_eq!(&rgba[0..3], &[0x04, 0x02, 0x74]);
        assert_eq!(&rgba[4..7], &[0x04, 0x02, 0x74]);
        assert_eq!(&rgba[8..11], &[0x91, 0x10, 0x03]);
        assert_eq!(&rgba[12..15], &[0x91, 0x10, 0x03]);
    }

    #[test]
    fn color_bar_labels() {
        assert_eq!(LayerStyle::lst().color_bar().labels(), [25.0, 33.0, 41.0]);

        let labels = LayerStyle::ndvi().color_bar().labels();
        assert!((labels[1] - 0.32985).abs() < 1e-12);
    }

    #[test]
    fn color_bar_strip() {
        let strip = LayerStyle::ndvi().color_bar().strip(3);
        assert_eq!(strip, vec![0, 0, 255, 255, 255, 255, 255, 255, 0, 128, 0, 255]);
    }

    #[test]
    fn palette_hex_matches_definition() {
        let hex = LayerStyle::lst().palette_hex();
        assert_eq!(hex.len(), 29);
        assert_eq!(hex[0], "040274");
        assert_eq!(hex[28], "911003");
    }

    #[test]
    fn true_color_stretch() {
        let red = Raster::from_vec(vec![0.0, 0.2, 0.1], 1, 3).unwrap();
        let green = Raster::from_vec(vec![0.1, 0.3, f64::NAN], 1, 3).unwrap();
        let blue = Raster::from_vec(vec![-0.1, 0.2, 0.1], 1, 3).unwrap();
        let rgba = true_color_to_rgba(&red, &green, &blue, 0.0, 0.2).unwrap();
        assert_eq!(&rgba[0..4], &[0, 128, 0, 255]);
        assert_eq!(&rgba[4..8], &[255, 255, 255, 255]);
        assert_eq!(&rgba[8..12], &[0, 0, 0, 0]);

        let short = Raster::from_vec(vec![0.0, 0.0], 1, 2).unwrap();
        assert!(true_color_to_rgba(&red, &green, &short, 0.0, 0.2).is_err());
    }

    #[test]
    fn auto_params_range() {
        let r = Raster::from_vec(vec![10.0, 50.0, 100.0], 1, 3).unwrap();
        let params = auto_params(&r, ColorScheme::Lst);
        assert!((params.min - 10.0).abs() < f64::EPSILON);
        assert!((params.max - 100.0).abs() < f64::EPSILON);

        let constant = Raster::<f64>::filled(2, 2, 42.0);
        let params = auto_params(&constant, ColorScheme::Lst);
        assert!((params.max - 43.0).abs() < f64::EPSILON);

        let empty = Raster::from_vec(vec![f64::NAN; 2], 1, 2).unwrap();
        let params = auto_params(&empty, ColorScheme::Lst);
        assert_eq!((params.min, params.max), (0.0, 1.0));
    }
}
