//! # LstGis Colormap
//!
//! Palettes and raster-to-RGBA rendering for LstGis layers.
//!
//! The core never draws maps or charts; it hands renderers a [`LayerStyle`]
//! (palette and value range), an RGBA buffer from [`raster_to_rgba`] or
//! [`true_color_to_rgba`], and [`ColorBar`] tick labels.
//!
//! ## Usage
//!
//! ```ignore
//! use lstgis_colormap::LayerStyle;
//!
//! let style = LayerStyle::lst();
//! let rgba = style.render(&lst);
//! let ticks = style.color_bar().labels();
//! ```

mod render;
mod scheme;

pub use render::{
    auto_params, raster_to_rgba, true_color_to_rgba, ColorBar, ColormapParams, LayerStyle,
};
pub use scheme::{evaluate, evenly_spaced, ColorScheme, Rgb};
