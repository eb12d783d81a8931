//! Catalog of GeoTIFF scenes on disk described by a JSON manifest.

use std::fs;
use std::path::{Path, PathBuf};

use lstgis_core::io::read_geotiff;
use lstgis_core::raster::{Raster, RasterElement};
use lstgis_core::{CollectionFilter, Error, Result, Scene, SceneSource, CRS};
use tracing::{debug, info};

use crate::manifest::{CatalogManifest, SceneEntry};

/// Scene source backed by a manifest file and GeoTIFF assets.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
    manifest: CatalogManifest,
}

impl LocalCatalog {
    /// Open a manifest; asset paths resolve relative to its directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let manifest: CatalogManifest = serde_json::from_str(&text)
            .map_err(|e| Error::Source(format!("{}: {}", path.display(), e)))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        info!(
            manifest = %path.display(),
            collection = %manifest.collection,
            scenes = manifest.scenes.len(),
            "opened local catalog"
        );
        Ok(Self { root, manifest })
    }

    /// Catalog from an already parsed manifest.
    pub fn from_manifest(root: impl Into<PathBuf>, manifest: CatalogManifest) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    pub fn manifest(&self) -> &CatalogManifest {
        &self.manifest
    }

    fn read_asset<T: RasterElement>(&self, entry: &SceneEntry, band: &str) -> Result<Raster<T>> {
        let rel = entry.asset(band).ok_or_else(|| Error::MissingBand {
            scene: entry.id.clone(),
            band: band.to_string(),
        })?;
        let path = self.root.join(rel);
        debug!(scene = %entry.id, band, path = %path.display(), "reading asset");
        let mut raster: Raster<T> = read_geotiff(&path)
            .map_err(|e| Error::Source(format!("{}: {}", path.display(), e)))?;
        if raster.crs().is_none() {
            raster.set_crs(entry.epsg.map(CRS::from_epsg));
        }
        Ok(raster)
    }

    fn load_scene(&self, entry: &SceneEntry, filter: &CollectionFilter) -> Result<Scene> {
        let mut scene = Scene::new(entry.id.clone(), entry.datetime);
        scene.cloud_cover = entry.cloud_cover;

        let qa_name = filter.qa_band.as_deref();
        for band in entry.assets.keys() {
            if Some(band.as_str()) == qa_name || !filter.wants_band(band) {
                continue;
            }
            scene.bands.insert(band.clone(), self.read_asset(entry, band)?);
        }
        for band in &filter.bands {
            if !scene.bands.contains_key(band) {
                return Err(Error::MissingBand {
                    scene: entry.id.clone(),
                    band: band.clone(),
                });
            }
        }
        if let Some(qa) = qa_name {
            scene.qa = Some(self.read_asset::<u16>(entry, qa)?);
        }
        Ok(scene)
    }
}

impl SceneSource for LocalCatalog {
    fn search(&self, filter: &CollectionFilter) -> Result<Vec<Scene>> {
        if filter.collection != self.manifest.collection {
            return Err(Error::Source(format!(
                "unknown collection '{}' (catalog holds '{}')",
                filter.collection, self.manifest.collection
            )));
        }

        let mut scenes = Vec::new();
        for entry in &self.manifest.scenes {
            if !filter.matches_metadata(&entry.datetime, entry.cloud_cover) {
                continue;
            }
            if let Some(footprint) = entry.footprint() {
                if !filter.matches_footprint(&footprint) {
                    continue;
                }
            }
            let scene = self.load_scene(entry, filter)?;
            if entry.bbox.is_none() {
                match scene.footprint() {
                    Some(fp) if filter.matches_footprint(&fp) => {}
                    _ => continue,
                }
            }
            scenes.push(scene);
        }
        scenes.sort_by_key(|s| s.acquired);

        debug!(
            collection = %filter.collection,
            matched = scenes.len(),
            "local catalog search"
        );
        Ok(scenes)
    }
}
