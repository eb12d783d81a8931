//! Statistical reductions for raster data
//!
//! - **zonal**: min/max of a raster over a polygonal region

pub mod zonal;

pub use zonal::{
    reduce_region, reduce_region_min_max, sampling_stride, MinMax, Reducer, ZonalParams,
};
