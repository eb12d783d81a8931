//! Band math operations
//!
//! Element-wise raster algebra over one or two `f64` rasters. NaN and the
//! inputs' nodata values propagate to NaN in the output; a closure result
//! that is not finite is also stored as NaN.

use crate::maybe_rayon::*;
use lstgis_core::raster::Raster;
use lstgis_core::Result;

pub(crate) fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

fn finite_or_nan(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        f64::NAN
    }
}

/// Apply a unary function to every valid cell in a raster.
///
/// # Example
/// ```ignore
/// let celsius = band_math(&b10, |k| k - 273.15)?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let val = unsafe { raster.get_unchecked(row, col) };
                if is_nodata_f64(val, nodata) {
                    continue;
                }
                row_data[col] = finite_or_nan(f(val));
            }
            row_data
        })
        .collect();

    raster.derive_f64(data)
}

/// Apply a binary function cell-by-cell to two rasters on the same grid.
///
/// Nodata in either input produces NaN in the output.
pub fn band_math2<F>(a: &Raster<f64>, b: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    a.check_same_grid(b)?;

    let (rows, cols) = a.shape();
    let nodata_a = a.nodata();
    let nodata_b = b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };
                if is_nodata_f64(va, nodata_a) || is_nodata_f64(vb, nodata_b) {
                    continue;
                }
                row_data[col] = finite_or_nan(f(va, vb));
            }
            row_data
        })
        .collect();

    a.derive_f64(data)
}
