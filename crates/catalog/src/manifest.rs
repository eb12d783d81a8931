//! Scene manifest data types.
//!
//! A manifest is a JSON document listing the scenes of one collection and
//! the GeoTIFF file of each band:
//!
//! ```json
//! {
//!   "collection": "LANDSAT/LC08/C02/T1_TOA",
//!   "scenes": [{
//!     "id": "LC08_231072_20240327",
//!     "datetime": "2024-03-27T14:20:11Z",
//!     "cloud_cover": 1.4,
//!     "epsg": 4326,
//!     "assets": { "B4": "LC08_231072_20240327/B4.tif", "QA_PIXEL": "..." }
//!   }]
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lstgis_core::BBox;
use serde::{Deserialize, Serialize};

/// Manifest document describing one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub collection: String,
    #[serde(default)]
    pub scenes: Vec<SceneEntry>,
}

/// One scene of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    pub id: String,

    /// Acquisition time (RFC 3339)
    pub datetime: DateTime<Utc>,

    /// Percentage of the scene covered by cloud
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,

    /// CRS of the assets when their GeoTIFF keys carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsg: Option<u32>,

    /// Footprint `[min_x, min_y, max_x, max_y]`; read from the first asset
    /// when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,

    /// Band name to file path, relative to the manifest
    pub assets: BTreeMap<String, String>,
}

impl SceneEntry {
    pub fn footprint(&self) -> Option<BBox> {
        self.bbox.map(|[a, b, c, d]| BBox::new(a, b, c, d))
    }

    /// Path of a band asset, if present.
    pub fn asset(&self, band: &str) -> Option<&str> {
        self.assets.get(band).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest() {
        let json = r#"{
            "collection": "LANDSAT/LC08/C02/T1_TOA",
            "scenes": [{
                "id": "a",
                "datetime": "2024-03-27T14:20:11Z",
                "cloud_cover": 1.4,
                "bbox": [-64.0, -18.5, -62.0, -16.5],
                "assets": { "B4": "a/B4.tif" }
            }]
        }"#;
        let m: CatalogManifest = serde_json::from_str(json).unwrap();
        assert_eq!(m.scenes.len(), 1);
        let s = &m.scenes[0];
        assert_eq!(s.cloud_cover, Some(1.4));
        assert_eq!(s.epsg, None);
        assert_eq!(s.asset("B4"), Some("a/B4.tif"));
        assert_eq!(s.footprint(), Some(BBox::new(-64.0, -18.5, -62.0, -16.5)));
    }

    #[test]
    fn missing_scenes_defaults_empty() {
        let m: CatalogManifest = serde_json::from_str(r#"{"collection": "x"}"#).unwrap();
        assert!(m.scenes.is_empty());
    }
}
