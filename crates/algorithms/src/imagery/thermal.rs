//! Thermal products: vegetation proportion, surface emissivity and
//! single-channel land surface temperature.
//!
//! ```text
//! PV  = ((NDVI - NDVI_min) / (NDVI_max - NDVI_min))^2
//! EM  = PV * 0.004 + 0.986
//! LST = T / (1 + (λ * T / ρ) * ln(EM)) - 273.15
//! ```
//!
//! with `T` the at-sensor brightness temperature in Kelvin, `λ = 0.00115`
//! and `ρ = 0.48359547432`.

use crate::imagery::band_math::{band_math, band_math2};
use lstgis_core::raster::Raster;
use lstgis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Fraction of vegetation cover from NDVI scaled against its range.
///
/// Values outside `[min, max]` are not clamped.
pub fn vegetation_proportion(ndvi: &Raster<f64>, min: f64, max: f64) -> Result<Raster<f64>> {
    if !min.is_finite() || !max.is_finite() || max == min {
        return Err(Error::DegenerateRange {
            what: "NDVI".into(),
            min,
            max,
        });
    }
    let range = max - min;
    band_math(ndvi, |v| {
        let scaled = (v - min) / range;
        scaled * scaled
    })
}

/// Linear emissivity model coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissivityParams {
    pub slope: f64,
    pub intercept: f64,
}

impl Default for EmissivityParams {
    fn default() -> Self {
        Self {
            slope: 0.004,
            intercept: 0.986,
        }
    }
}

/// Land surface emissivity from vegetation proportion.
pub fn emissivity(pv: &Raster<f64>, params: EmissivityParams) -> Result<Raster<f64>> {
    let EmissivityParams { slope, intercept } = params;
    band_math(pv, |p| p * slope + intercept)
}

/// Constants of the single-channel LST formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LstParams {
    /// Effective wavelength term λ
    pub wavelength: f64,
    /// ρ = h·c/σ (scaled)
    pub rho: f64,
    /// Subtracted to report Celsius
    pub kelvin_offset: f64,
}

impl Default for LstParams {
    fn default() -> Self {
        Self {
            wavelength: 0.00115,
            rho: 0.48359547432,
            kelvin_offset: 273.15,
        }
    }
}

impl LstParams {
    /// LST in °C for one pixel; NaN when the inputs are outside the
    /// formula's domain.
    #[inline]
    pub fn solve(&self, t: f64, em: f64) -> f64 {
        if !t.is_finite() || !em.is_finite() || em <= 0.0 {
            return f64::NAN;
        }
        let denom = 1.0 + (self.wavelength * (t / self.rho)) * em.ln();
        if denom == 0.0 {
            return f64::NAN;
        }
        t / denom - self.kelvin_offset
    }
}

/// Land surface temperature in °C from brightness temperature (K) and
/// emissivity on the same grid.
pub fn land_surface_temperature(
    thermal: &Raster<f64>,
    em: &Raster<f64>,
    params: LstParams,
) -> Result<Raster<f64>> {
    band_math2(thermal, em, |t, e| params.solve(t, e))
}

/// Brightness temperature converted from Kelvin to °C.
pub fn brightness_temperature_celsius(thermal: &Raster<f64>) -> Result<Raster<f64>> {
    let offset = LstParams::default().kelvin_offset;
    band_math(thermal, |k| k - offset)
}
