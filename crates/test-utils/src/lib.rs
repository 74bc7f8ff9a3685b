//! Shared test utilities for the field rendering workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Boundary GeoJSON fixtures (with holes and multiple parts)
//! - Measurement point generators for single and multi-slice scenarios
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
