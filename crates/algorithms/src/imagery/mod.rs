//! Imagery algorithms
//!
//! Per-pixel products for Landsat 8 land surface temperature:
//! - QA bitmask decoding and cloud masks
//! - Masking and median/mean compositing of scene collections
//! - NDVI and generic normalized difference
//! - Vegetation proportion, emissivity and LST
//! - Band math: raster algebra over one or two bands

mod band_math;
mod composite;
mod indices;
mod qa;
mod thermal;

pub use band_math::{band_math, band_math2};
pub use composite::{
    apply_mask, clip_to_region, composite_scenes, mask_scene, mean_composite, median_composite,
    BandStack, CompositeMethod,
};
pub use indices::{ndvi, normalized_difference};
pub use qa::{
    cloud_mask, decode_qa_bits, extract_qa_bits, qa_bit_pattern, qa_mask, qa_mask_all,
    QaBitRange, CLOUD, CLOUD_SHADOW,
};
pub use thermal::{
    brightness_temperature_celsius, emissivity, land_surface_temperature, vegetation_proportion,
    EmissivityParams, LstParams,
};
