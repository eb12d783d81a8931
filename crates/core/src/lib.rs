//! # LstGis Core
//!
//! Core types, traits and I/O for the LstGis land surface temperature toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type with NaN/nodata semantics
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - `Region` / `Transect`: the study-area polygon and the profile line
//! - `SceneSource`: the query interface to a raster collection
//! - GeoTIFF I/O

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod source;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use source::{BBox, CollectionFilter, DateRange, Scene, SceneSource};
pub use vector::{Region, Transect};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::source::{BBox, CollectionFilter, DateRange, Scene, SceneSource};
    pub use crate::vector::{Region, Transect};
}
