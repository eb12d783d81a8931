//! End-to-end land surface temperature pipeline
//!
//! Two passes over a [`SceneSource`]:
//!
//! 1. Composite pass: cloud-masked median composite over the region and
//!    composite dates, then NDVI, vegetation proportion, emissivity and LST,
//!    with NDVI and LST ranges reduced over the region.
//! 2. Transect pass: mean brightness temperature (°C) over the transect
//!    dates without cloud filtering, sampled with NDVI along the transect.
//!
//! Everything is driven by a [`PipelineConfig`]; there is no global state.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::imagery::{
    brightness_temperature_celsius, clip_to_region, composite_scenes, emissivity,
    land_surface_temperature, mask_scene, mean_composite, ndvi, vegetation_proportion,
    BandStack, CompositeMethod, EmissivityParams, LstParams,
};
use crate::statistics::{reduce_region_min_max, MinMax, ZonalParams};
use crate::transect::{sample_transect, DistanceMode, SampledSeries, TransectParams};
use lstgis_core::raster::Raster;
use lstgis_core::{
    BBox, CollectionFilter, DateRange, Error, Region, Result, Scene, SceneSource, Transect,
};

/// Landsat 8 Collection 2 Tier 1 top-of-atmosphere reflectance
pub const DEFAULT_COLLECTION: &str = "LANDSAT/LC08/C02/T1_TOA";

/// Profile line across the Santa Cruz de la Sierra urban area (lon, lat)
pub const DEFAULT_TRANSECT: [[f64; 2]; 10] = [
    [-63.2273, -17.8010],
    [-63.2158, -17.7972],
    [-63.2046, -17.7949],
    [-63.1885, -17.7872],
    [-63.1822, -17.7833],
    [-63.1729, -17.7942],
    [-63.1519, -17.7893],
    [-63.0965, -17.7766],
    [-63.0946, -17.7834],
    [-63.0637, -17.7784],
];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Band identifiers in the source collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandNames {
    pub red: String,
    pub nir: String,
    pub thermal: String,
    pub qa: String,
    /// Optional bands composited for a true-color view
    pub green: Option<String>,
    pub blue: Option<String>,
}

impl Default for BandNames {
    fn default() -> Self {
        Self {
            red: "B4".into(),
            nir: "B5".into(),
            thermal: "B10".into(),
            qa: "QA_PIXEL".into(),
            green: Some("B3".into()),
            blue: Some("B2".into()),
        }
    }
}

impl BandNames {
    /// Bands composited in the first pass, in a fixed order.
    pub fn composite_bands(&self) -> Vec<&str> {
        let mut bands = vec![self.red.as_str(), self.nir.as_str(), self.thermal.as_str()];
        bands.extend(self.green.as_deref());
        bands.extend(self.blue.as_deref());
        bands
    }
}

/// Study-area polygon as `[x, y]` rings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub exterior: Vec<[f64; 2]>,
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_transect() -> Vec<[f64; 2]> {
    DEFAULT_TRANSECT.to_vec()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn default_composite_dates() -> DateRange {
    DateRange {
        start: date(2024, 1, 1),
        end: date(2024, 6, 1),
    }
}

fn default_transect_dates() -> DateRange {
    DateRange {
        start: date(2024, 3, 26),
        end: date(2024, 3, 28),
    }
}

fn default_max_cloud_cover() -> f64 {
    3.0
}

fn default_scale() -> f64 {
    30.0
}

fn default_transect_scale() -> f64 {
    100.0
}

fn default_max_pixels() -> u64 {
    10_000_000_000
}

fn default_true() -> bool {
    true
}

/// Pipeline configuration, usually read from a JSON file.
///
/// Only `region` is required; everything else defaults to the Santa Cruz
/// 2024 study setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    pub region: RegionConfig,
    #[serde(default = "default_transect")]
    pub transect: Vec<[f64; 2]>,
    #[serde(default = "default_composite_dates")]
    pub composite_dates: DateRange,
    #[serde(default = "default_transect_dates")]
    pub transect_dates: DateRange,
    /// Exclusive cloud-cover ceiling (percent) for the composite pass
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover: f64,
    /// Zonal reduction scale in metres
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Transect sample spacing in metres
    #[serde(default = "default_transect_scale")]
    pub transect_scale: f64,
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
    #[serde(default)]
    pub bands: BandNames,
    #[serde(default)]
    pub distance_mode: DistanceMode,
    #[serde(default = "default_true")]
    pub interpolate_gaps: bool,
    #[serde(default)]
    pub emissivity: EmissivityParams,
    #[serde(default)]
    pub lst: LstParams,
}

impl PipelineConfig {
    /// Configuration with default settings for the given region exterior.
    pub fn new(region: Vec<[f64; 2]>) -> Self {
        Self {
            collection: default_collection(),
            region: RegionConfig {
                exterior: region,
                holes: Vec::new(),
            },
            transect: default_transect(),
            composite_dates: default_composite_dates(),
            transect_dates: default_transect_dates(),
            max_cloud_cover: default_max_cloud_cover(),
            scale: default_scale(),
            transect_scale: default_transect_scale(),
            max_pixels: default_max_pixels(),
            bands: BandNames::default(),
            distance_mode: DistanceMode::default(),
            interpolate_gaps: true,
            emissivity: EmissivityParams::default(),
            lst: LstParams::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::InvalidParameter {
            name: "config",
            value: format!("line {}, column {}", e.line(), e.column()),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &'static str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidParameter {
                    name,
                    value: v.to_string(),
                    reason: "must be a positive number".into(),
                })
            }
        };
        positive("scale", self.scale)?;
        positive("transect_scale", self.transect_scale)?;
        positive("max_cloud_cover", self.max_cloud_cover)?;
        if self.max_pixels == 0 {
            return Err(Error::InvalidParameter {
                name: "max_pixels",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        for (name, range) in [
            ("composite_dates", &self.composite_dates),
            ("transect_dates", &self.transect_dates),
        ] {
            if range.end <= range.start {
                return Err(Error::InvalidParameter {
                    name,
                    value: format!("{}/{}", range.start, range.end),
                    reason: "end date must be after start date".into(),
                });
            }
        }
        self.region()?;
        self.transect()?;
        Ok(())
    }

    pub fn region(&self) -> Result<Region> {
        Region::from_rings(&self.region.exterior, &self.region.holes)
    }

    pub fn transect(&self) -> Result<Transect> {
        Transect::new(&self.transect)
    }

    fn zonal_params(&self) -> ZonalParams {
        ZonalParams {
            scale: self.scale,
            max_pixels: self.max_pixels,
        }
    }

    fn transect_params(&self) -> TransectParams {
        TransectParams {
            spacing: self.transect_scale,
            distance_mode: self.distance_mode,
            interpolate_gaps: self.interpolate_gaps,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Every intermediate and final product of a run.
#[derive(Debug, Clone)]
pub struct LstReport {
    pub scene_count: usize,
    pub transect_scene_count: usize,
    /// Clipped median composite of the composite bands
    pub composite: BandStack,
    pub ndvi: Raster<f64>,
    pub ndvi_range: MinMax,
    pub vegetation_proportion: Raster<f64>,
    pub emissivity: Raster<f64>,
    /// Land surface temperature in °C
    pub lst: Raster<f64>,
    pub lst_range: MinMax,
    /// Mean transect-pass brightness temperature in °C
    pub brightness_temperature: Raster<f64>,
    pub transect: SampledSeries,
}

/// Serializable scalar results of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub collection: String,
    pub scene_count: usize,
    pub transect_scene_count: usize,
    pub ndvi_range: MinMax,
    pub lst_range: MinMax,
    pub transect: SampledSeries,
}

impl LstReport {
    pub fn summary(&self, config: &PipelineConfig) -> ReportSummary {
        ReportSummary {
            collection: config.collection.clone(),
            scene_count: self.scene_count,
            transect_scene_count: self.transect_scene_count,
            ndvi_range: self.ndvi_range,
            lst_range: self.lst_range,
            transect: self.transect.clone(),
        }
    }

    /// Red, green and blue composites when the true-color bands were requested.
    pub fn true_color<'a>(
        &'a self,
        bands: &BandNames,
    ) -> Option<(&'a Raster<f64>, &'a Raster<f64>, &'a Raster<f64>)> {
        let red = self.composite.band(&bands.red).ok()?;
        let green = self.composite.band(bands.green.as_deref()?).ok()?;
        let blue = self.composite.band(bands.blue.as_deref()?).ok()?;
        Some((red, green, blue))
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// One configured run against a scene source.
pub struct LstPipeline<'a, S: SceneSource + ?Sized> {
    source: &'a S,
    config: &'a PipelineConfig,
}

impl<'a, S: SceneSource + ?Sized> LstPipeline<'a, S> {
    pub fn new(source: &'a S, config: &'a PipelineConfig) -> Self {
        Self { source, config }
    }

    /// Run both passes and return all products.
    pub fn run(&self) -> Result<LstReport> {
        let config = self.config;
        config.validate()?;
        let region = config.region()?;
        let transect = config.transect()?;

        // Composite pass
        let scenes = self.composite_scenes(&region)?;
        let scene_count = scenes.len();

        let masked = scenes.iter().map(mask_scene).collect::<Result<Vec<_>>>()?;
        drop(scenes);

        let bands = config.bands.composite_bands();
        let stack = composite_scenes(&masked, &bands, CompositeMethod::Median)?;
        let mut composite = BandStack::new();
        for name in &bands {
            composite.insert(*name, clip_to_region(stack.band(name)?, &region)?);
        }
        debug!(bands = ?bands, "median composite clipped to region");

        let red = composite.band(&config.bands.red)?;
        let nir = composite.band(&config.bands.nir)?;
        let thermal = composite.band(&config.bands.thermal)?;

        let ndvi = ndvi(nir, red)?;
        let zonal = config.zonal_params();
        let ndvi_range = reduce_region_min_max(&ndvi, &region, &zonal)?;
        let (ndvi_min, ndvi_max) = ndvi_range
            .bounds()
            .ok_or_else(|| Error::NoValidPixels("NDVI".into()))?;
        info!(ndvi_min, ndvi_max, "NDVI range over region");

        let pv = vegetation_proportion(&ndvi, ndvi_min, ndvi_max)?;
        let em = emissivity(&pv, config.emissivity)?;
        let lst = land_surface_temperature(thermal, &em, config.lst)?;

        let lst_range = reduce_region_min_max(&lst, &region, &zonal)?;
        match lst_range.bounds() {
            Some((lst_min, lst_max)) => info!(lst_min, lst_max, "LST range over region (°C)"),
            None => warn!("no valid LST pixels in region"),
        }

        // Transect pass
        let transect_scenes = self.transect_scenes(&transect)?;
        let transect_scene_count = transect_scenes.len();
        let brightness_temperature = self.mean_temperature(&transect_scenes)?;

        let series = sample_transect(
            &[("ndvi", &ndvi), ("temperature", &brightness_temperature)],
            &transect,
            &config.transect_params(),
        )?;
        info!(samples = series.len(), "transect sampled");

        Ok(LstReport {
            scene_count,
            transect_scene_count,
            composite,
            ndvi,
            ndvi_range,
            vegetation_proportion: pv,
            emissivity: em,
            lst,
            lst_range,
            brightness_temperature,
            transect: series,
        })
    }

    fn composite_scenes(&self, region: &Region) -> Result<Vec<Scene>> {
        let config = self.config;
        let bounds = extent(region.bbox(), "region")?;

        let filter = CollectionFilter::new(&config.collection, config.composite_dates, bounds)
            .max_cloud_cover(config.max_cloud_cover)
            .bands(&config.bands.composite_bands())
            .qa_band(&config.bands.qa);

        let scenes = self.source.search(&filter)?;
        info!(
            collection = %config.collection,
            scenes = scenes.len(),
            "composite scenes selected"
        );
        if scenes.is_empty() {
            return Err(Error::EmptyCollection(format!(
                "no {} scenes between {} and {} with cloud cover < {}",
                config.collection,
                config.composite_dates.start,
                config.composite_dates.end,
                config.max_cloud_cover
            )));
        }
        Ok(scenes)
    }

    fn transect_scenes(&self, transect: &Transect) -> Result<Vec<Scene>> {
        let config = self.config;
        let bounds = extent(transect.bbox(), "transect")?;

        let filter = CollectionFilter::new(&config.collection, config.transect_dates, bounds)
            .bands(&[config.bands.thermal.as_str()]);

        let scenes = self.source.search(&filter)?;
        info!(scenes = scenes.len(), "transect scenes selected");
        if scenes.is_empty() {
            return Err(Error::EmptyCollection(format!(
                "no {} scenes along the transect between {} and {}",
                config.collection, config.transect_dates.start, config.transect_dates.end
            )));
        }
        Ok(scenes)
    }

    fn mean_temperature(&self, scenes: &[Scene]) -> Result<Raster<f64>> {
        let celsius = scenes
            .iter()
            .map(|s| brightness_temperature_celsius(s.band(&self.config.bands.thermal)?))
            .collect::<Result<Vec<_>>>()?;
        let layers: Vec<&Raster<f64>> = celsius.iter().collect();
        mean_composite(&layers)
    }
}

/// Envelope of a configured geometry; an empty one is a configuration error.
fn extent(bbox: Option<BBox>, name: &'static str) -> Result<BBox> {
    bbox.ok_or_else(|| Error::InvalidParameter {
        name,
        value: "[]".into(),
        reason: "geometry has no extent".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "region": { "exterior": [[0, 0], [10, 0], [10, 10], [0, 10]] }
    }"#;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.max_cloud_cover, 3.0);
        assert_eq!(config.scale, 30.0);
        assert_eq!(config.transect_scale, 100.0);
        assert_eq!(config.max_pixels, 10_000_000_000);
        assert_eq!(config.bands.nir, "B5");
        assert_eq!(config.bands.qa, "QA_PIXEL");
        assert_eq!(config.transect.len(), 10);
        assert_eq!(config.composite_dates.start, date(2024, 1, 1));
        assert_eq!(config.transect_dates.end, date(2024, 3, 28));
        assert_eq!(config.distance_mode, DistanceMode::AlongLine);
        assert!(config.interpolate_gaps);
        assert_eq!(config.lst, LstParams::default());
    }

    #[test]
    fn test_config_round_trip_and_overrides() {
        let json = r#"{
            "region": { "exterior": [[0, 0], [10, 0], [10, 10]] },
            "composite_dates": { "start": "2023-01-01", "end": "2023-02-01" },
            "distance_mode": "from_start",
            "bands": { "thermal": "ST_B10", "green": null }
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.distance_mode, DistanceMode::FromStart);
        assert_eq!(config.bands.thermal, "ST_B10");
        assert_eq!(config.bands.red, "B4");
        assert_eq!(config.bands.composite_bands(), vec!["B4", "B5", "ST_B10", "B2"]);

        let back = PipelineConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_validation() {
        assert!(PipelineConfig::from_json_str("{}").is_err());
        assert!(PipelineConfig::from_json_str(
            r#"{ "region": { "exterior": [[0, 0], [1, 1]] } }"#
        )
        .is_err());

        let mut config = PipelineConfig::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert!(config.validate().is_ok());
        config.scale = 0.0;
        assert!(config.validate().is_err());
        config.scale = 30.0;
        config.transect = vec![[0.0, 0.0]];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_geometry_is_invalid_parameter() {
        let err = extent(None, "region").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "region", .. }));

        let bbox = BBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(extent(Some(bbox), "transect").unwrap(), bbox);
    }
}
