//! Rate expression trait.

use crate::context::RateContext;
use crate::error::RateResult;

/// A forward rate-constant expression for one reaction.
///
/// Implementations are grouped by `rate_type()` and evaluated in batches; the
/// shared temperature terms arrive via `RateContext`. Exact derivatives are
/// optional — when `ddt`/`ddp` return `None`, callers fall back to relative
/// perturbation of `eval`.
pub trait RateExpression: Send + Sync {
    /// Type identifier used for group dispatch (e.g. "Arrhenius").
    fn rate_type(&self) -> &'static str;

    /// Forward rate constant at the given context.
    fn eval(&self, ctx: &RateContext) -> f64;

    /// Exact dk/dT, if the expression supplies one.
    fn ddt(&self, _ctx: &RateContext) -> Option<f64> {
        None
    }

    /// Exact dk/dP, if the expression supplies one.
    fn ddp(&self, _ctx: &RateContext) -> Option<f64> {
        None
    }

    /// Check parameter validity.
    fn validate(&self) -> RateResult<()> {
        Ok(())
    }

    /// Structured parameter description (for reconstruction by callers).
    fn parameters(&self) -> serde_json::Value;

    /// Deep copy, for replacing a reaction's rate in place.
    fn clone_box(&self) -> Box<dyn RateExpression>;
}

impl Clone for Box<dyn RateExpression> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
