//! Image rendering for interpolated scalar fields.
//!
//! Implements:
//! - Named colour palettes with a shared normalization range
//! - Polygon clip masks (multi-part, with holes) and zone underlays
//! - Vertical legends with tick labels
//! - PNG encoding (indexed or RGBA)

pub mod clip;
pub mod frame;
pub mod legend;
pub mod palette;
pub mod png;
pub mod raster;
pub mod surface;

pub use frame::{render_frame, ClipGeometry, FrameRenderer, FrameStyle, OutlineStyle, RenderedFrame};
pub use legend::{render_legend, tick_labels, LegendStyle};
pub use palette::{Color, Palette};
pub use raster::Raster;
