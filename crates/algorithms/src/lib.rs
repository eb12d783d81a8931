//! # LstGis Algorithms
//!
//! Land surface temperature algorithms for Landsat 8 imagery.
//!
//! ## Modules
//!
//! - **imagery**: QA cloud masks, compositing, NDVI, emissivity, LST
//! - **statistics**: zonal min/max over a region
//! - **transect**: sampling rasters along a polyline
//! - **pipeline**: the configured two-pass run over a scene source

pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod pipeline;
pub mod statistics;
pub mod transect;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        apply_mask, brightness_temperature_celsius, cloud_mask, composite_scenes, emissivity,
        land_surface_temperature, mask_scene, mean_composite, median_composite, ndvi,
        normalized_difference, vegetation_proportion, BandStack, CompositeMethod,
        EmissivityParams, LstParams, QaBitRange,
    };
    pub use crate::pipeline::{LstPipeline, LstReport, PipelineConfig};
    pub use crate::statistics::{reduce_region, reduce_region_min_max, MinMax, Reducer, ZonalParams};
    pub use crate::transect::{sample_transect, DistanceMode, SampledSeries, TransectParams};
    pub use lstgis_core::prelude::*;
}
