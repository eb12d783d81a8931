//! Error types for LstGis

use thiserror::Error;

/// Main error type for LstGis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Raster grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Band '{band}' not found in scene '{scene}'")]
    MissingBand { scene: String, band: String },

    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    #[error("No valid pixels in region for {0}")]
    NoValidPixels(String),

    #[error("Degenerate range for {what}: min = {min}, max = {max}")]
    DegenerateRange { what: String, min: f64, max: f64 },

    #[error("Pixel cap exceeded: {count} samples > {max_pixels}")]
    PixelCapExceeded { count: u64, max_pixels: u64 },

    #[error("Scene source error: {0}")]
    Source(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for LstGis operations
pub type Result<T> = std::result::Result<T, Error>;
