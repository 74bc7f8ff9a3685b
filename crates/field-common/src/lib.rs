//! Common types shared across the field rendering crates.
//!
//! Covers the measurement data model, the sample grid, dense scalar fields,
//! the sequence-wide normalization range and the error taxonomy.

pub mod bbox;
pub mod error;
pub mod field;
pub mod grid;
pub mod measurement;
pub mod range;

pub use bbox::BoundingBox;
pub use error::{FieldError, FieldResult};
pub use field::SpatialField;
pub use grid::Grid;
pub use measurement::{group_by_time, MeasurementPoint, PointAggregate, SampleTime, TimeSlice};
pub use range::{NormalizationRange, RangeSource};
