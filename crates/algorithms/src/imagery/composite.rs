//! Cloud masking and per-pixel compositing of scene collections.
//!
//! Masked pixels are NaN, never zero, so they drop out of every reduction.

use std::collections::BTreeMap;

use crate::imagery::band_math::is_nodata_f64;
use crate::imagery::qa::cloud_mask;
use crate::maybe_rayon::*;
use lstgis_core::raster::Raster;
use lstgis_core::{Error, Region, Result, Scene};
use serde::{Deserialize, Serialize};

/// Per-pixel reduction used to collapse a scene stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMethod {
    #[default]
    Median,
    Mean,
}

/// Named bands sharing one grid.
#[derive(Debug, Clone, Default)]
pub struct BandStack {
    bands: BTreeMap<String, Raster<f64>>,
}

impl BandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, raster: Raster<f64>) {
        self.bands.insert(name.into(), raster);
    }

    /// Band by name, or `MissingBand` naming the composite.
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands.get(name).ok_or_else(|| Error::MissingBand {
            scene: "composite".to_string(),
            band: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Set pixels where `mask == 0` to NaN.
pub fn apply_mask(raster: &Raster<f64>, mask: &Raster<u8>) -> Result<Raster<f64>> {
    raster.check_same_grid(mask)?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let keep = unsafe { mask.get_unchecked(row, col) } != 0;
                let v = unsafe { raster.get_unchecked(row, col) };
                if keep && !is_nodata_f64(v, nodata) {
                    row_data[col] = v;
                }
            }
            row_data
        })
        .collect();

    raster.derive_f64(data)
}

/// Apply the combined cloud mask derived from the scene's QA band to every
/// band of the scene.
pub fn mask_scene(scene: &Scene) -> Result<Scene> {
    let mask = cloud_mask(scene.qa()?)?;

    let mut masked = Scene::new(scene.id.clone(), scene.acquired);
    masked.cloud_cover = scene.cloud_cover;
    masked.qa = scene.qa.clone();
    for (name, band) in &scene.bands {
        masked.bands.insert(name.clone(), apply_mask(band, &mask)?);
    }
    Ok(masked)
}

fn check_stack(rasters: &[&Raster<f64>]) -> Result<()> {
    let first = rasters
        .first()
        .ok_or_else(|| Error::EmptyCollection("no rasters to composite".into()))?;
    for r in &rasters[1..] {
        first.check_same_grid(r)?;
    }
    Ok(())
}

fn reduce_stack<F>(rasters: &[&Raster<f64>], reduce: F) -> Result<Raster<f64>>
where
    F: Fn(&mut Vec<f64>) -> f64 + Sync + Send,
{
    check_stack(rasters)?;

    let first = rasters[0];
    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = Vec::with_capacity(rasters.len());
            for col in 0..cols {
                values.clear();
                for r in rasters {
                    let v = unsafe { r.get_unchecked(row, col) };
                    if !is_nodata_f64(v, r.nodata()) {
                        values.push(v);
                    }
                }
                if !values.is_empty() {
                    row_data[col] = reduce(&mut values);
                }
            }
            row_data
        })
        .collect();

    first.derive_f64(data)
}

/// Median of a non-empty slice of finite values; mean of the two middle
/// values for an even count.
fn median_of(values: &mut Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn mean_of(values: &mut Vec<f64>) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-pixel median of the valid values across `rasters`.
///
/// A pixel invalid in every input stays NaN.
pub fn median_composite(rasters: &[&Raster<f64>]) -> Result<Raster<f64>> {
    reduce_stack(rasters, median_of)
}

/// Per-pixel mean of the valid values across `rasters`.
pub fn mean_composite(rasters: &[&Raster<f64>]) -> Result<Raster<f64>> {
    reduce_stack(rasters, mean_of)
}

/// Composite the named bands of a scene collection.
pub fn composite_scenes(
    scenes: &[Scene],
    bands: &[&str],
    method: CompositeMethod,
) -> Result<BandStack> {
    if scenes.is_empty() {
        return Err(Error::EmptyCollection(
            "no scenes matched the collection filter".into(),
        ));
    }

    let mut stack = BandStack::new();
    for &name in bands {
        let layers = scenes
            .iter()
            .map(|s| s.band(name))
            .collect::<Result<Vec<_>>>()?;
        let composite = match method {
            CompositeMethod::Median => median_composite(&layers)?,
            CompositeMethod::Mean => mean_composite(&layers)?,
        };
        stack.insert(name, composite);
    }
    Ok(stack)
}

/// Set pixels whose centers fall outside `region` to NaN.
pub fn clip_to_region(raster: &Raster<f64>, region: &Region) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let v = unsafe { raster.get_unchecked(row, col) };
                if is_nodata_f64(v, nodata) {
                    continue;
                }
                let (x, y) = raster.pixel_to_geo(col, row);
                if region.contains(x, y) {
                    row_data[col] = v;
                }
            }
            row_data
        })
        .collect();

    raster.derive_f64(data)
}
