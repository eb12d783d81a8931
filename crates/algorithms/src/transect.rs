//! Transect sampling
//!
//! Samples one or more rasters at regular steps along a polyline and
//! returns a distance-ordered series per band. Distances are geodesic
//! metres when the rasters are geographic and CRS units otherwise.

use lstgis_core::raster::Raster;
use lstgis_core::vector::distance_between;
use lstgis_core::{Error, Result, Transect};
use serde::{Deserialize, Serialize};

/// Most sample points a single transect may request.
pub const MAX_TRANSECT_SAMPLES: usize = 1_000_000;

/// How the distance coordinate of a sample is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Along the polyline from the first vertex
    #[default]
    AlongLine,
    /// Straight line from the first vertex
    FromStart,
}

/// Parameters for transect sampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransectParams {
    /// Step between samples along the line
    pub spacing: f64,
    pub distance_mode: DistanceMode,
    /// Fill interior gaps by linear interpolation over distance
    pub interpolate_gaps: bool,
}

impl Default for TransectParams {
    fn default() -> Self {
        Self {
            spacing: 100.0,
            distance_mode: DistanceMode::AlongLine,
            interpolate_gaps: true,
        }
    }
}

/// One sample point: its distance and a value per band (`None` = gap).
#[derive(Debug, Clone, PartialEq)]
pub struct TransectSample {
    pub distance: f64,
    pub values: Vec<Option<f64>>,
}

/// Values of one band along the transect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesBand {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Distance-ordered samples for a set of named bands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampledSeries {
    pub distances: Vec<f64>,
    pub bands: Vec<SeriesBand>,
}

impl SampledSeries {
    /// Build a series from unordered samples.
    ///
    /// Samples are sorted ascending by distance; the sort is stable so equal
    /// distances keep their input order.
    pub fn from_samples(names: &[&str], mut samples: Vec<TransectSample>) -> Result<Self> {
        if let Some(bad) = samples.iter().find(|s| s.values.len() != names.len()) {
            return Err(Error::InvalidParameter {
                name: "samples",
                value: format!("{} values", bad.values.len()),
                reason: format!("expected one value per band ({})", names.len()),
            });
        }

        samples.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut bands: Vec<SeriesBand> = names
            .iter()
            .map(|n| SeriesBand {
                name: n.to_string(),
                values: Vec::with_capacity(samples.len()),
            })
            .collect();
        let mut distances = Vec::with_capacity(samples.len());

        for sample in samples {
            distances.push(sample.distance);
            for (band, value) in bands.iter_mut().zip(sample.values) {
                band.values.push(value);
            }
        }

        Ok(Self { distances, bands })
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Values of a band by name.
    pub fn band(&self, name: &str) -> Option<&[Option<f64>]> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.values.as_slice())
    }

    /// Fill interior gaps by linear interpolation over distance.
    ///
    /// Leading and trailing gaps have no bracketing values and stay `None`.
    pub fn interpolate_gaps(&mut self) {
        let distances = &self.distances;
        for band in &mut self.bands {
            let mut prev: Option<usize> = None;
            for i in 0..band.values.len() {
                if band.values[i].is_none() {
                    continue;
                }
                if let Some(p) = prev {
                    if i > p + 1 {
                        fill_between(&mut band.values, distances, p, i);
                    }
                }
                prev = Some(i);
            }
        }
    }
}

fn fill_between(values: &mut [Option<f64>], distances: &[f64], lo: usize, hi: usize) {
    let (Some(v0), Some(v1)) = (values[lo], values[hi]) else {
        return;
    };
    let (d0, d1) = (distances[lo], distances[hi]);
    let span = d1 - d0;
    for k in lo + 1..hi {
        values[k] = Some(if span > 0.0 {
            v0 + (v1 - v0) * (distances[k] - d0) / span
        } else {
            v0
        });
    }
}

/// Distances along the line at which to sample: every `spacing` from zero,
/// plus the line's end.
fn sample_positions(length: f64, spacing: f64) -> Vec<f64> {
    let steps = (length / spacing).floor() as usize;
    let mut out: Vec<f64> = (0..=steps)
        .map(|i| i as f64 * spacing)
        .filter(|&d| d < length)
        .collect();
    out.push(length);
    out
}

/// Sample named rasters along a transect.
///
/// Each raster is sampled at the pixel containing the sample point; points
/// outside a raster or on nodata become gaps. Rasters need not share a grid
/// but must share a CRS; the first raster decides how distance is measured.
pub fn sample_transect(
    bands: &[(&str, &Raster<f64>)],
    transect: &Transect,
    params: &TransectParams,
) -> Result<SampledSeries> {
    if params.spacing.is_nan() || params.spacing <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "spacing",
            value: params.spacing.to_string(),
            reason: "transect spacing must be positive".into(),
        });
    }
    let Some((_, first)) = bands.first() else {
        return Err(Error::InvalidParameter {
            name: "bands",
            value: "0".into(),
            reason: "at least one raster is required".into(),
        });
    };

    let geographic = first.is_geographic();
    let cumulative = transect.cumulative_distances(geographic);
    let length = cumulative.last().copied().unwrap_or(0.0);
    let start = transect.start();

    let steps = (length / params.spacing).floor();
    if !steps.is_finite() || steps >= MAX_TRANSECT_SAMPLES as f64 {
        return Err(Error::InvalidParameter {
            name: "spacing",
            value: params.spacing.to_string(),
            reason: format!(
                "a {:.1} long transect would need more than {} samples",
                length, MAX_TRANSECT_SAMPLES
            ),
        });
    }

    let samples: Vec<TransectSample> = sample_positions(length, params.spacing)
        .into_iter()
        .map(|along| {
            let point = transect.point_at(along, &cumulative);
            let distance = match params.distance_mode {
                DistanceMode::AlongLine => along,
                DistanceMode::FromStart => distance_between(start, point, geographic),
            };
            let values = bands
                .iter()
                .map(|(_, r)| r.value_at(point.x, point.y))
                .collect();
            TransectSample { distance, values }
        })
        .collect();

    let names: Vec<&str> = bands.iter().map(|(n, _)| *n).collect();
    let mut series = SampledSeries::from_samples(&names, samples)?;
    if params.interpolate_gaps {
        series.interpolate_gaps();
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lstgis_core::GeoTransform;

    /// 1 x 10 raster along the x axis, 10-unit cells, value = column index
    fn strip() -> Raster<f64> {
        let mut r = Raster::from_vec((0..10).map(f64::from).collect(), 1, 10).unwrap();
        r.set_transform(GeoTransform::new(0.0, 10.0, 10.0, -10.0));
        r
    }

    fn sample(distance: f64, v: Option<f64>) -> TransectSample {
        TransectSample {
            distance,
            values: vec![v],
        }
    }

    #[test]
    fn test_spacing_too_fine_for_length() {
        let t = Transect::new(&[[0.0, 5.0], [95.0, 5.0]]).unwrap();
        let params = TransectParams {
            spacing: 1e-9,
            ..Default::default()
        };
        let err = sample_transect(&[("v", &strip())], &t, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "spacing", .. }));

        let too_many = TransectParams {
            spacing: 95.0 / (2 * MAX_TRANSECT_SAMPLES) as f64,
            ..Default::default()
        };
        assert!(sample_transect(&[("v", &strip())], &t, &too_many).is_err());

        let coarse = TransectParams {
            spacing: 1.0,
            ..Default::default()
        };
        assert_eq!(sample_transect(&[("v", &strip())], &t, &coarse).unwrap().len(), 96);
    }

    #[test]
    fn test_from_samples_sorts_by_distance() {
        let series = SampledSeries::from_samples(
            &["t"],
            vec![
                sample(250.0, Some(3.0)),
                sample(0.0, Some(1.0)),
                sample(100.0, Some(2.0)),
            ],
        )
        .unwrap();
        assert_eq!(series.distances, vec![0.0, 100.0, 250.0]);
        assert_eq!(series.band("t").unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_from_samples_stable_for_ties() {
        let series = SampledSeries::from_samples(
            &["t"],
            vec![sample(5.0, Some(1.0)), sample(5.0, Some(2.0)), sample(0.0, None)],
        )
        .unwrap();
        assert_eq!(series.band("t").unwrap(), &[None, Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_from_samples_value_count_mismatch() {
        let bad = TransectSample {
            distance: 0.0,
            values: vec![Some(1.0), Some(2.0)],
        };
        assert!(SampledSeries::from_samples(&["t"], vec![bad]).is_err());
    }

    #[test]
    fn test_interpolate_interior_gaps_only() {
        let mut series = SampledSeries::from_samples(
            &["t"],
            vec![
                sample(0.0, None),
                sample(10.0, Some(1.0)),
                sample(20.0, None),
                sample(40.0, Some(4.0)),
                sample(50.0, None),
            ],
        )
        .unwrap();
        series.interpolate_gaps();
        let v = series.band("t").unwrap();
        assert_eq!(v[0], None);
        assert_eq!(v[1], Some(1.0));
        assert_relative_eq!(v[2].unwrap(), 2.0);
        assert_eq!(v[3], Some(4.0));
        assert_eq!(v[4], None);
    }

    #[test]
    fn test_sample_positions_include_end() {
        assert_eq!(sample_positions(25.0, 10.0), vec![0.0, 10.0, 20.0, 25.0]);
        assert_eq!(sample_positions(20.0, 10.0), vec![0.0, 10.0, 20.0]);
        assert_eq!(sample_positions(0.0, 10.0), vec![0.0]);
    }

    #[test]
    fn test_sample_along_strip() {
        let r = strip();
        let transect = Transect::new(&[[5.0, 5.0], [95.0, 5.0]]).unwrap();
        let params = TransectParams {
            spacing: 30.0,
            ..Default::default()
        };
        let series = sample_transect(&[("v", &r)], &transect, &params).unwrap();

        assert_eq!(series.distances, vec![0.0, 30.0, 60.0, 90.0]);
        assert_eq!(
            series.band("v").unwrap(),
            &[Some(0.0), Some(3.0), Some(6.0), Some(9.0)]
        );
    }

    #[test]
    fn test_gaps_outside_and_nodata() {
        let mut r = strip();
        r.set(0, 3, f64::NAN).unwrap();
        // Runs 20 units past the right edge
        let transect = Transect::new(&[[5.0, 5.0], [120.0, 5.0]]).unwrap();
        let params = TransectParams {
            spacing: 10.0,
            interpolate_gaps: false,
            ..Default::default()
        };
        let series = sample_transect(&[("v", &r)], &transect, &params).unwrap();
        let v = series.band("v").unwrap();
        assert_eq!(v[3], None);
        assert_eq!(*v.last().unwrap(), None);

        let params = TransectParams {
            interpolate_gaps: true,
            ..params
        };
        let series = sample_transect(&[("v", &r)], &transect, &params).unwrap();
        let v = series.band("v").unwrap();
        assert_relative_eq!(v[3].unwrap(), 3.0);
        assert_eq!(*v.last().unwrap(), None);
    }

    #[test]
    fn test_from_start_distance_on_bent_line() {
        let r = strip();
        // Out 40 units and back 20
        let transect = Transect::new(&[[5.0, 5.0], [45.0, 5.0], [25.0, 5.0]]).unwrap();
        let params = TransectParams {
            spacing: 20.0,
            distance_mode: DistanceMode::FromStart,
            interpolate_gaps: false,
        };
        let series = sample_transect(&[("v", &r)], &transect, &params).unwrap();
        // Along-line 0, 20, 40, 60 -> straight-line 0, 20, 40, 20; sorted
        assert_eq!(series.distances, vec![0.0, 20.0, 20.0, 40.0]);
        let along = TransectParams {
            distance_mode: DistanceMode::AlongLine,
            ..params
        };
        let series = sample_transect(&[("v", &r)], &transect, &along).unwrap();
        assert_eq!(series.distances, vec![0.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_invalid_spacing() {
        let r = strip();
        let transect = Transect::new(&[[5.0, 5.0], [95.0, 5.0]]).unwrap();
        let params = TransectParams {
            spacing: 0.0,
            ..Default::default()
        };
        assert!(sample_transect(&[("v", &r)], &transect, &params).is_err());
        assert!(sample_transect(&[], &transect, &TransectParams::default()).is_err());
    }
}
