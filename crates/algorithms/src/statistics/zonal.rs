//! Zonal reduction over a polygonal region
//!
//! Reduces a raster to a single scalar over the pixels whose centers fall
//! inside a [`Region`]. A nominal sampling `scale` (metres) coarser than the
//! raster's cell size is honoured by striding: every `stride`-th pixel in
//! each direction is sampled, starting at pixel (0, 0), with
//! `stride = max(1, round(scale / cell_size_m))`.

use lstgis_core::raster::Raster;
use lstgis_core::{Error, Region, Result};
use serde::{Deserialize, Serialize};

/// Scalar reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Min,
    Max,
}

/// Parameters for zonal reduction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZonalParams {
    /// Nominal sampling resolution in metres
    pub scale: f64,
    /// Upper bound on in-region samples
    pub max_pixels: u64,
}

impl Default for ZonalParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            max_pixels: 10_000_000_000,
        }
    }
}

/// Minimum and maximum from one sampling pass
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MinMax {
    /// Both bounds, if the region had any valid sample.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((self.min?, self.max?))
    }
}

/// Pixel step used to approximate `scale` on this raster.
pub fn sampling_stride(raster: &Raster<f64>, scale: f64) -> usize {
    let cell = raster.cell_size_meters();
    if !scale.is_finite() || scale <= 0.0 || !cell.is_finite() || cell <= 0.0 {
        return 1;
    }
    ((scale / cell).round() as usize).max(1)
}

/// Visit every valid in-region sample; fails if the number of in-region
/// samples (valid or not) exceeds the pixel cap.
fn for_each_sample<F>(
    raster: &Raster<f64>,
    region: &Region,
    params: &ZonalParams,
    mut visit: F,
) -> Result<()>
where
    F: FnMut(f64),
{
    if params.scale.is_nan() || params.scale <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "scale",
            value: params.scale.to_string(),
            reason: "sampling scale must be positive".into(),
        });
    }

    let stride = sampling_stride(raster, params.scale);
    let (rows, cols) = raster.shape();

    // Skip rows and columns outside the region envelope
    let envelope = region.bbox();

    let mut count: u64 = 0;
    for row in (0..rows).step_by(stride) {
        for col in (0..cols).step_by(stride) {
            let (x, y) = raster.pixel_to_geo(col, row);
            if let Some(bb) = &envelope {
                if x < bb.min_x || x > bb.max_x || y < bb.min_y || y > bb.max_y {
                    continue;
                }
            }
            if !region.contains(x, y) {
                continue;
            }
            count += 1;
            if count > params.max_pixels {
                return Err(Error::PixelCapExceeded {
                    count,
                    max_pixels: params.max_pixels,
                });
            }
            let v = unsafe { raster.get_unchecked(row, col) };
            if !raster.is_nodata(v) {
                visit(v);
            }
        }
    }
    Ok(())
}

/// Reduce the raster over `region` to a single value.
///
/// Returns `Ok(None)` when the region holds no valid sample.
pub fn reduce_region(
    raster: &Raster<f64>,
    region: &Region,
    reducer: Reducer,
    params: &ZonalParams,
) -> Result<Option<f64>> {
    let mm = reduce_region_min_max(raster, region, params)?;
    Ok(match reducer {
        Reducer::Min => mm.min,
        Reducer::Max => mm.max,
    })
}

/// Minimum and maximum over `region` from a single sampling pass.
pub fn reduce_region_min_max(
    raster: &Raster<f64>,
    region: &Region,
    params: &ZonalParams,
) -> Result<MinMax> {
    let mut out = MinMax::default();
    for_each_sample(raster, region, params, |v| {
        out.min = Some(out.min.map_or(v, |m| m.min(v)));
        out.max = Some(out.max.map_or(v, |m| m.max(v)));
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lstgis_core::{GeoTransform, CRS};

    /// 4x4 projected raster, 30 m cells, values 0..16 row-major
    fn ramp() -> Raster<f64> {
        let mut r = Raster::from_vec((0..16).map(f64::from).collect(), 4, 4).unwrap();
        r.set_transform(GeoTransform::new(0.0, 120.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32720)));
        r
    }

    fn whole(r: &Raster<f64>) -> Region {
        let (x0, y0, x1, y1) = r.bounds();
        Region::from_rings(&[[x0, y0], [x1, y0], [x1, y1], [x0, y1]], &[]).unwrap()
    }

    #[test]
    fn test_min_max_whole_raster() {
        let r = ramp();
        let mm = reduce_region_min_max(&r, &whole(&r), &ZonalParams::default()).unwrap();
        assert_eq!(mm.min, Some(0.0));
        assert_eq!(mm.max, Some(15.0));
        assert_eq!(mm.bounds(), Some((0.0, 15.0)));
    }

    #[test]
    fn test_reduce_region_partial() {
        let r = ramp();
        // Left half: columns 0 and 1
        let region =
            Region::from_rings(&[[0.0, 0.0], [60.0, 0.0], [60.0, 120.0], [0.0, 120.0]], &[])
                .unwrap();
        let params = ZonalParams::default();
        assert_eq!(reduce_region(&r, &region, Reducer::Max, &params).unwrap(), Some(13.0));
        assert_eq!(reduce_region(&r, &region, Reducer::Min, &params).unwrap(), Some(0.0));
    }

    #[test]
    fn test_nan_ignored_and_all_nodata_is_none() {
        let mut r = ramp();
        r.set(3, 3, f64::NAN).unwrap();
        let region = whole(&r);
        let params = ZonalParams::default();
        assert_eq!(reduce_region(&r, &region, Reducer::Max, &params).unwrap(), Some(14.0));

        let empty = r.derive_f64(vec![f64::NAN; 16]).unwrap();
        let mm = reduce_region_min_max(&empty, &region, &params).unwrap();
        assert_eq!(mm, MinMax::default());
        assert!(mm.bounds().is_none());
    }

    #[test]
    fn test_stride_from_scale() {
        let r = ramp();
        assert_eq!(sampling_stride(&r, 30.0), 1);
        assert_eq!(sampling_stride(&r, 60.0), 2);
        assert_eq!(sampling_stride(&r, 10.0), 1);

        let params = ZonalParams {
            scale: 60.0,
            ..Default::default()
        };
        // Samples at rows/cols 0 and 2 -> values 0, 2, 8, 10
        let mm = reduce_region_min_max(&r, &whole(&r), &params).unwrap();
        assert_eq!(mm.min, Some(0.0));
        assert_eq!(mm.max, Some(10.0));
    }

    #[test]
    fn test_pixel_cap() {
        let r = ramp();
        let params = ZonalParams {
            scale: 30.0,
            max_pixels: 10,
        };
        match reduce_region_min_max(&r, &whole(&r), &params) {
            Err(Error::PixelCapExceeded { count, max_pixels }) => {
                assert_eq!(count, 11);
                assert_eq!(max_pixels, 10);
            }
            other => panic!("expected PixelCapExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_scale() {
        let r = ramp();
        let params = ZonalParams {
            scale: 0.0,
            ..Default::default()
        };
        assert!(reduce_region_min_max(&r, &whole(&r), &params).is_err());
    }
}
