//! GeoTIFF reading and writing for scene bands and analysis outputs

mod native;

pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    write_rgba_tiff, GeoTiffOptions,
};
