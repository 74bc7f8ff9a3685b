//! Field interpolation.
//!
//! Spatial interpolation turns one time slice of scattered samples into a
//! dense [`SpatialField`](field_common::SpatialField) over a
//! [`Grid`](field_common::Grid):
//!
//! - [`rbf`]: global cubic radial basis fit, exact at the samples
//! - [`idw`]: local inverse-distance weighting, followed by [`smoothing`]
//!
//! Temporal interpolation ([`temporal`]) then produces evenly spaced
//! intermediate fields between the per-slice fields, one frame at a time.

pub mod idw;
pub mod rbf;
pub mod smoothing;
pub mod spatial;
pub mod temporal;

pub use idw::{idw_estimate, idw_grid, IdwKernel};
pub use rbf::{RbfInterpolator, DEFAULT_MAX_RBF_POINTS, MIN_RBF_POINTS};
pub use smoothing::gaussian_filter;
pub use spatial::{build_sequence, interpolate_slice, IdwParams, SpatialStrategy};
pub use temporal::TemporalInterpolator;
