//! Reactions batched by rate-expression type.

use std::collections::HashMap;

use crate::context::RateContext;
use crate::error::{RateError, RateResult};
use crate::expression::RateExpression;

/// One batch of reactions sharing a rate-expression type.
///
/// A group is created the first time a reaction of a new type is added and is
/// never destroyed afterwards; members are stored in add order and addressed
/// by their global reaction index. All evaluation methods write into
/// full-length per-reaction buffers, touching only member slots.
pub struct RateGroup {
    rate_type: &'static str,
    indices: Vec<usize>,
    rates: Vec<Box<dyn RateExpression>>,
    slot_of: HashMap<usize, usize>,
}

impl RateGroup {
    pub fn new(rate_type: &'static str) -> Self {
        Self {
            rate_type,
            indices: Vec::new(),
            rates: Vec::new(),
            slot_of: HashMap::new(),
        }
    }

    pub fn rate_type(&self) -> &'static str {
        self.rate_type
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Global reaction indices of the members, in add order.
    pub fn members(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, reaction_index: usize) -> bool {
        self.slot_of.contains_key(&reaction_index)
    }

    /// Add a reaction to the batch.
    pub fn add(
        &mut self,
        reaction_index: usize,
        rate: Box<dyn RateExpression>,
    ) -> RateResult<()> {
        if rate.rate_type() != self.rate_type {
            return Err(RateError::TypeMismatch {
                expected: self.rate_type,
                got: rate.rate_type(),
            });
        }
        rate.validate()?;
        self.slot_of.insert(reaction_index, self.indices.len());
        self.indices.push(reaction_index);
        self.rates.push(rate);
        Ok(())
    }

    /// Replace the rate expression of an existing member in place.
    ///
    /// The new expression must have the same rate type; membership and
    /// ordering are unchanged.
    pub fn replace(
        &mut self,
        reaction_index: usize,
        rate: Box<dyn RateExpression>,
    ) -> RateResult<()> {
        if rate.rate_type() != self.rate_type {
            return Err(RateError::TypeMismatch {
                expected: self.rate_type,
                got: rate.rate_type(),
            });
        }
        rate.validate()?;
        let slot = *self
            .slot_of
            .get(&reaction_index)
            .ok_or(RateError::UnknownReaction {
                index: reaction_index,
            })?;
        self.rates[slot] = rate;
        Ok(())
    }

    /// Parameter description of one member's rate expression.
    pub fn parameters(&self, reaction_index: usize) -> RateResult<serde_json::Value> {
        let slot = *self
            .slot_of
            .get(&reaction_index)
            .ok_or(RateError::UnknownReaction {
                index: reaction_index,
            })?;
        Ok(self.rates[slot].parameters())
    }

    /// Evaluate forward rate constants for all members into `out[global_index]`.
    pub fn eval(&self, ctx: &RateContext, out: &mut [f64]) {
        for (i, rate) in self.indices.iter().zip(&self.rates) {
            out[*i] = rate.eval(ctx);
        }
    }

    /// Evaluate dk/dT for all members, exact where supplied, otherwise by
    /// relative perturbation with tolerance `rtol_delta`.
    pub fn eval_ddt(&self, ctx: &RateContext, rtol_delta: f64, out: &mut [f64]) {
        let (pctx, dt) = ctx.perturbed_temperature(rtol_delta);
        for (i, rate) in self.indices.iter().zip(&self.rates) {
            out[*i] = match rate.ddt(ctx) {
                Some(d) => d,
                None => (rate.eval(&pctx) - rate.eval(ctx)) / dt,
            };
        }
    }

    /// Evaluate dk/dP for all members, exact where supplied, otherwise by
    /// relative perturbation with tolerance `rtol_delta`.
    pub fn eval_ddp(&self, ctx: &RateContext, rtol_delta: f64, out: &mut [f64]) {
        let (pctx, dp) = ctx.perturbed_pressure(rtol_delta);
        for (i, rate) in self.indices.iter().zip(&self.rates) {
            out[*i] = match rate.ddp(ctx) {
                Some(d) => d,
                None => (rate.eval(&pctx) - rate.eval(ctx)) / dp,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrhenius::{ArrheniusRate, ConstantRate};

    #[test]
    fn batch_writes_only_member_slots() {
        let mut group = RateGroup::new("constant");
        group.add(0, Box::new(ConstantRate::new(2.0))).unwrap();
        group.add(2, Box::new(ConstantRate::new(5.0))).unwrap();

        let ctx = RateContext::new(300.0, 101_325.0);
        let mut out = [f64::NAN; 3];
        group.eval(&ctx, &mut out);
        assert_eq!(out[0], 2.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 5.0);
    }

    #[test]
    fn add_rejects_foreign_type() {
        let mut group = RateGroup::new("constant");
        let err = group
            .add(0, Box::new(ArrheniusRate::new(1.0, 0.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, RateError::TypeMismatch { .. }));
    }

    #[test]
    fn replace_updates_in_place() {
        let mut group = RateGroup::new("constant");
        group.add(4, Box::new(ConstantRate::new(1.0))).unwrap();
        group.replace(4, Box::new(ConstantRate::new(3.0))).unwrap();

        let ctx = RateContext::new(300.0, 101_325.0);
        let mut out = [0.0; 5];
        group.eval(&ctx, &mut out);
        assert_eq!(out[4], 3.0);
        assert_eq!(group.members(), &[4]);

        assert!(matches!(
            group.replace(1, Box::new(ConstantRate::new(1.0))),
            Err(RateError::UnknownReaction { index: 1 })
        ));
    }

    #[test]
    fn numeric_fallback_close_to_exact() {
        // An expression that hides its exact derivative
        #[derive(Clone)]
        struct Opaque(ArrheniusRate);
        impl RateExpression for Opaque {
            fn rate_type(&self) -> &'static str {
                "opaque"
            }
            fn eval(&self, ctx: &RateContext) -> f64 {
                self.0.eval(ctx)
            }
            fn parameters(&self) -> serde_json::Value {
                self.0.parameters()
            }
            fn clone_box(&self) -> Box<dyn RateExpression> {
                Box::new(self.clone())
            }
        }

        let inner = ArrheniusRate::new(4.0e9, 0.7, 6.0e7);
        let mut group = RateGroup::new("opaque");
        group.add(0, Box::new(Opaque(inner.clone()))).unwrap();

        let ctx = RateContext::new(1100.0, 101_325.0);
        let mut numeric = [0.0; 1];
        group.eval_ddt(&ctx, 1e-8, &mut numeric);
        let exact = inner.ddt(&ctx).unwrap();
        assert!((numeric[0] - exact).abs() < 1e-5 * exact.abs());
    }
}
