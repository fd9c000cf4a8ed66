//! kf-rates: pluggable reaction-rate expressions for kinflow.
//!
//! Provides:
//! - RateContext: per-evaluation shared terms (T, P, ln T, 1/RT)
//! - RateExpression trait: forward rate constant + optional exact derivatives
//! - ArrheniusRate and ConstantRate implementations
//! - RateGroup: reactions batched by rate type for one-pass evaluation
//!
//! # Architecture
//!
//! Rate expressions are evaluated in batches, one batch per rate type. The
//! expensive temperature-only terms (logarithm, reciprocals) are computed once
//! per evaluation in a `RateContext` and shared by every expression in every
//! group. New rate families plug in by implementing `RateExpression`; the
//! kinetics manager dispatches on `rate_type()` alone.

pub mod arrhenius;
pub mod context;
pub mod error;
pub mod expression;
pub mod group;

// Re-exports for ergonomics
pub use arrhenius::{ArrheniusRate, ConstantRate};
pub use context::RateContext;
pub use error::{RateError, RateResult};
pub use expression::RateExpression;
pub use group::RateGroup;
