//! Scene sources: the query interface to a raster collection.
//!
//! A [`SceneSource`] answers a [`CollectionFilter`] (collection id, date
//! range, spatial bounds, cloud-cover ceiling) with fully materialized
//! [`Scene`]s ordered by acquisition time. Every call is blocking; a failure
//! aborts the caller's run and is reported as-is.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::Raster;

// ---------------------------------------------------------------------------
// Bounding box
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box `[min_x, min_y, max_x, max_y]` in CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether the two boxes share any point (touching edges count).
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Half-open UTC date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `end` must be strictly after `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidParameter {
                name: "date_range",
                value: format!("{}/{}", start, end),
                reason: "end date must be after start date".into(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::InvalidParameter {
                name: "date_range",
                value: s.to_string(),
                reason: e.to_string(),
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Whether an acquisition instant falls inside the range.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let date = instant.date_naive();
        date >= self.start && date < self.end
    }
}

// ---------------------------------------------------------------------------
// Collection filter
// ---------------------------------------------------------------------------

/// Query sent to a [`SceneSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFilter {
    /// Collection identifier, e.g. `LANDSAT/LC08/C02/T1_TOA`
    pub collection: String,
    /// Acquisition dates
    pub dates: DateRange,
    /// Scenes whose footprint does not intersect these bounds are dropped
    pub bounds: BBox,
    /// Keep only scenes with cloud cover strictly below this percentage
    pub max_cloud_cover: Option<f64>,
    /// Bands to materialize (empty = all)
    pub bands: Vec<String>,
    /// QA bitmask band to materialize as `u16`
    pub qa_band: Option<String>,
}

impl CollectionFilter {
    pub fn new(collection: impl Into<String>, dates: DateRange, bounds: BBox) -> Self {
        Self {
            collection: collection.into(),
            dates,
            bounds,
            max_cloud_cover: None,
            bands: Vec::new(),
            qa_band: None,
        }
    }

    /// Set the exclusive cloud-cover ceiling (percent).
    pub fn max_cloud_cover(mut self, percent: f64) -> Self {
        self.max_cloud_cover = Some(percent);
        self
    }

    /// Select bands by name.
    pub fn bands(mut self, bands: &[&str]) -> Self {
        self.bands = bands.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Request the QA band.
    pub fn qa_band(mut self, name: &str) -> Self {
        self.qa_band = Some(name.to_string());
        self
    }

    /// Date and cloud-cover test on scene metadata.
    ///
    /// A scene without cloud-cover metadata never passes a cloud-cover filter.
    pub fn matches_metadata(&self, acquired: &DateTime<Utc>, cloud_cover: Option<f64>) -> bool {
        if !self.dates.contains(acquired) {
            return false;
        }
        match (self.max_cloud_cover, cloud_cover) {
            (Some(limit), Some(cc)) => cc < limit,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Spatial test on a scene footprint.
    pub fn matches_footprint(&self, footprint: &BBox) -> bool {
        self.bounds.intersects(footprint)
    }

    /// Whether a band name was requested.
    pub fn wants_band(&self, name: &str) -> bool {
        self.bands.is_empty() || self.bands.iter().any(|b| b == name)
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One acquisition with its bands on a shared grid.
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: String,
    pub acquired: DateTime<Utc>,
    pub cloud_cover: Option<f64>,
    pub bands: BTreeMap<String, Raster<f64>>,
    pub qa: Option<Raster<u16>>,
}

impl Scene {
    pub fn new(id: impl Into<String>, acquired: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            acquired,
            cloud_cover: None,
            bands: BTreeMap::new(),
            qa: None,
        }
    }

    pub fn with_cloud_cover(mut self, percent: f64) -> Self {
        self.cloud_cover = Some(percent);
        self
    }

    pub fn with_band(mut self, name: impl Into<String>, raster: Raster<f64>) -> Self {
        self.bands.insert(name.into(), raster);
        self
    }

    pub fn with_qa(mut self, qa: Raster<u16>) -> Self {
        self.qa = Some(qa);
        self
    }

    /// Band by name, or `MissingBand`.
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands.get(name).ok_or_else(|| Error::MissingBand {
            scene: self.id.clone(),
            band: name.to_string(),
        })
    }

    /// QA band, or `MissingBand`.
    pub fn qa(&self) -> Result<&Raster<u16>> {
        self.qa.as_ref().ok_or_else(|| Error::MissingBand {
            scene: self.id.clone(),
            band: "QA".to_string(),
        })
    }

    /// Footprint of the scene grid (first band, else QA).
    pub fn footprint(&self) -> Option<BBox> {
        self.bands
            .values()
            .next()
            .map(Raster::footprint)
            .or_else(|| self.qa.as_ref().map(Raster::footprint))
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// A queryable raster collection.
pub trait SceneSource {
    /// Return every scene matching `filter`, ordered by acquisition time.
    fn search(&self, filter: &CollectionFilter) -> Result<Vec<Scene>>;
}
