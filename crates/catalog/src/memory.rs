//! In-memory scene collection.

use lstgis_core::{CollectionFilter, Error, Result, Scene, SceneSource};

/// Scene source over scenes held in memory, with the same filter
/// semantics as [`crate::LocalCatalog`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    collection: String,
    scenes: Vec<Scene>,
}

impl MemoryCatalog {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scenes: Vec::new(),
        }
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Copy of `scene` restricted to the bands the filter asks for.
    fn select(scene: &Scene, filter: &CollectionFilter) -> Result<Scene> {
        let mut out = Scene::new(scene.id.clone(), scene.acquired);
        out.cloud_cover = scene.cloud_cover;
        for (name, band) in &scene.bands {
            if filter.wants_band(name) {
                out.bands.insert(name.clone(), band.clone());
            }
        }
        for band in &filter.bands {
            if !out.bands.contains_key(band) {
                return Err(Error::MissingBand {
                    scene: scene.id.clone(),
                    band: band.clone(),
                });
            }
        }
        if filter.qa_band.is_some() {
            out.qa = scene.qa.clone();
        }
        Ok(out)
    }
}

impl SceneSource for MemoryCatalog {
    fn search(&self, filter: &CollectionFilter) -> Result<Vec<Scene>> {
        if filter.collection != self.collection {
            return Err(Error::Source(format!(
                "unknown collection '{}' (catalog holds '{}')",
                filter.collection, self.collection
            )));
        }

        let mut scenes = self
            .scenes
            .iter()
            .filter(|s| filter.matches_metadata(&s.acquired, s.cloud_cover))
            .filter(|s| {
                s.footprint()
                    .is_some_and(|fp| filter.matches_footprint(&fp))
            })
            .map(|s| Self::select(s, filter))
            .collect::<Result<Vec<_>>>()?;
        scenes.sort_by_key(|s| s.acquired);
        Ok(scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lstgis_core::{BBox, DateRange, GeoTransform, Raster};

    const COLLECTION: &str = "LANDSAT/LC08/C02/T1_TOA";

    fn band(origin_x: f64) -> Raster<f64> {
        let mut r = Raster::filled(2, 2, 0.2);
        r.set_transform(GeoTransform::new(origin_x, 10.0, 1.0, -1.0));
        r
    }

    fn scene(id: &str, day: u32, cc: Option<f64>, origin_x: f64) -> Scene {
        let mut s = Scene::new(id, Utc.with_ymd_and_hms(2024, 3, day, 14, 0, 0).unwrap())
            .with_band("B4", band(origin_x))
            .with_band("B5", band(origin_x))
            .with_qa(Raster::filled(2, 2, 0x0400u16));
        s.cloud_cover = cc;
        s
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(COLLECTION)
            .with_scene(scene("late", 20, Some(1.0), 0.0))
            .with_scene(scene("early", 2, Some(2.0), 0.0))
            .with_scene(scene("cloudy", 5, Some(3.0), 0.0))
            .with_scene(scene("unknown_cc", 6, None, 0.0))
            .with_scene(scene("far", 7, Some(0.5), 100.0))
            .with_scene(scene("first", 1, Some(0.5), 0.0))
    }

    fn filter() -> CollectionFilter {
        CollectionFilter::new(
            COLLECTION,
            DateRange::parse("2024-03-01", "2024-03-31").unwrap(),
            BBox::new(0.0, 0.0, 5.0, 10.0),
        )
    }

    #[test]
    fn filters_and_orders() {
        let hits = catalog().search(&filter().max_cloud_cover(3.0)).unwrap();
        let ids: Vec<_> = hits.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "early", "late"]);
    }

    #[test]
    fn no_cloud_filter_keeps_unknown_cover() {
        let hits = catalog().search(&filter()).unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().any(|s| s.id == "unknown_cc"));
    }

    #[test]
    fn selects_requested_bands() {
        let hits = catalog().search(&filter().bands(&["B4"])).unwrap();
        assert!(hits.iter().all(|s| s.bands.len() == 1 && s.qa.is_none()));

        let hits = catalog()
            .search(&filter().bands(&["B5"]).qa_band("QA_PIXEL"))
            .unwrap();
        assert!(hits.iter().all(|s| s.qa.is_some()));

        assert!(matches!(
            catalog().search(&filter().bands(&["B10"])),
            Err(Error::MissingBand { .. })
        ));
    }

    #[test]
    fn unknown_collection() {
        let mut f = filter();
        f.collection = "LANDSAT/LC09/C02/T1_TOA".into();
        assert!(matches!(catalog().search(&f), Err(Error::Source(_))));
    }
}
