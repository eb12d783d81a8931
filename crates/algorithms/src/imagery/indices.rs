//! Spectral indices
//!
//! Normalized-difference indices computed from single-band rasters on a
//! shared grid.

use crate::imagery::band_math::is_nodata_f64;
use crate::maybe_rayon::*;
use lstgis_core::raster::Raster;
use lstgis_core::Result;

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in the range [-1, 1] for non-negative inputs. Pixels where
/// the sum is zero, or where either band is nodata, are set to NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    band_a.check_same_grid(band_b)?;

    let (rows, cols) = band_a.shape();
    let nodata_a = band_a.nodata();
    let nodata_b = band_b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if is_nodata_f64(a, nodata_a) || is_nodata_f64(b, nodata_b) {
                    continue;
                }

                let sum = a + b;
                if sum == 0.0 {
                    continue;
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    band_a.derive_f64(data)
}

// ---------------------------------------------------------------------------
// NDVI
// ---------------------------------------------------------------------------

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// For Landsat 8 OLI, NIR is band 5 and Red is band 4.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lstgis_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_ndvi_exact() {
        let nir = make_band(5, 5, 0.3);
        let red = make_band(5, 5, 0.1);

        let val = ndvi(&nir, &red).unwrap().get(2, 2).unwrap();
        let expected = (0.3 - 0.1) / (0.3 + 0.1);
        assert!((val - expected).abs() < 1e-9, "Expected {}, got {}", expected, val);
        assert!((val - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ndvi_water_negative() {
        let nir = make_band(5, 5, 0.05);
        let red = make_band(5, 5, 0.15);

        let val = ndvi(&nir, &red).unwrap().get(2, 2).unwrap();
        assert!(val < 0.0, "Water should have negative NDVI, got {}", val);
    }

    #[test]
    fn test_zero_sum_is_nodata() {
        let nir = make_band(3, 3, 0.0);
        let red = make_band(3, 3, 0.0);

        let result = ndvi(&nir, &red).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert!(result.nodata().unwrap().is_nan());
    }

    #[test]
    fn test_nodata_handling() {
        let mut nir = make_band(5, 5, 0.5);
        nir.set_nodata(Some(-9999.0));
        nir.set(2, 2, -9999.0).unwrap();
        let mut red = make_band(5, 5, 0.1);
        red.set(0, 0, f64::NAN).unwrap();

        let result = ndvi(&nir, &red).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert!(result.get(0, 0).unwrap().is_nan());
        assert!(!result.get(4, 4).unwrap().is_nan());
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = make_band(5, 5, 1.0);
        let b = make_band(5, 10, 1.0);
        assert!(normalized_difference(&a, &b).is_err());
    }

    #[test]
    fn test_ndvi_on_shifted_red_band() {
        let nir = make_band(5, 5, 0.3);
        let mut red = make_band(5, 5, 0.1);
        red.set_transform(GeoTransform::new(30.0, 5.0, 1.0, -1.0));
        assert!(matches!(
            ndvi(&nir, &red),
            Err(lstgis_core::Error::GridMismatch(_))
        ));
    }
}
