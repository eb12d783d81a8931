//! # LstGis Catalog
//!
//! [`SceneSource`](lstgis_core::SceneSource) implementations:
//!
//! - [`LocalCatalog`]: a JSON manifest listing GeoTIFF band assets on disk
//! - [`MemoryCatalog`]: scenes held in memory
//!
//! Both apply the same filter semantics: collection id must match, the
//! acquisition date falls in the half-open date range, cloud cover is
//! strictly below the ceiling (unknown cover fails a ceiling), and the
//! scene footprint intersects the filter bounds. Results are ordered by
//! acquisition time.

pub mod local;
pub mod manifest;
pub mod memory;

pub use local::LocalCatalog;
pub use manifest::{CatalogManifest, SceneEntry};
pub use memory::MemoryCatalog;
