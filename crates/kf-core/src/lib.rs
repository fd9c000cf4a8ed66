//! kf-core: stable foundation for kinflow.
//!
//! Contains:
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{KfError, KfResult, check_array_size, check_index};
pub use numeric::*;
pub use units::*;
