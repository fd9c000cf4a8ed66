//! Modified Arrhenius rate expression.

use serde_json::json;

use crate::context::RateContext;
use crate::error::{RateError, RateResult};
use crate::expression::RateExpression;

/// Modified Arrhenius form k(T) = A·T^b·exp(−Ea/RT).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrheniusRate {
    /// Pre-exponential factor A (units depend on reaction order)
    pub pre_exponential: f64,
    /// Temperature exponent b (dimensionless)
    pub temperature_exponent: f64,
    /// Activation energy Ea [J/kmol]
    pub activation_energy: f64,
}

impl ArrheniusRate {
    pub fn new(pre_exponential: f64, temperature_exponent: f64, activation_energy: f64) -> Self {
        Self {
            pre_exponential,
            temperature_exponent,
            activation_energy,
        }
    }
}

impl RateExpression for ArrheniusRate {
    fn rate_type(&self) -> &'static str {
        "Arrhenius"
    }

    fn eval(&self, ctx: &RateContext) -> f64 {
        self.pre_exponential
            * (self.temperature_exponent * ctx.log_t
                - self.activation_energy * ctx.recip_rt)
                .exp()
    }

    fn ddt(&self, ctx: &RateContext) -> Option<f64> {
        // dk/dT = k·(b + Ea/RT)/T
        let k = self.eval(ctx);
        Some(
            k * (self.temperature_exponent + self.activation_energy * ctx.recip_rt)
                * ctx.recip_t,
        )
    }

    fn ddp(&self, _ctx: &RateContext) -> Option<f64> {
        Some(0.0)
    }

    fn validate(&self) -> RateResult<()> {
        if !self.pre_exponential.is_finite() || self.pre_exponential < 0.0 {
            return Err(RateError::InvalidParameter {
                what: "pre-exponential factor must be finite and non-negative",
            });
        }
        if !self.temperature_exponent.is_finite() || !self.activation_energy.is_finite() {
            return Err(RateError::InvalidParameter {
                what: "temperature exponent and activation energy must be finite",
            });
        }
        Ok(())
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": self.rate_type(),
            "A": self.pre_exponential,
            "b": self.temperature_exponent,
            "Ea": self.activation_energy,
        })
    }

    fn clone_box(&self) -> Box<dyn RateExpression> {
        Box::new(self.clone())
    }
}

/// Temperature-independent rate constant, mostly useful in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantRate {
    pub value: f64,
}

impl ConstantRate {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl RateExpression for ConstantRate {
    fn rate_type(&self) -> &'static str {
        "constant"
    }

    fn eval(&self, _ctx: &RateContext) -> f64 {
        self.value
    }

    fn ddt(&self, _ctx: &RateContext) -> Option<f64> {
        Some(0.0)
    }

    fn ddp(&self, _ctx: &RateContext) -> Option<f64> {
        Some(0.0)
    }

    fn validate(&self) -> RateResult<()> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(RateError::InvalidParameter {
                what: "constant rate must be finite and non-negative",
            });
        }
        Ok(())
    }

    fn parameters(&self) -> serde_json::Value {
        json!({ "type": self.rate_type(), "k": self.value })
    }

    fn clone_box(&self) -> Box<dyn RateExpression> {
        Box::new(self.clone())
    }
}
