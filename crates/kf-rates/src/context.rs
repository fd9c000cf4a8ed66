//! Shared per-evaluation state for batched rate evaluation.

use kf_core::perturbation_step;
use kf_core::units::constants::GAS_CONSTANT;

/// Temperature/pressure terms shared by every rate expression in a batch.
///
/// Computed once per evaluation pass; the logarithm and reciprocals here are
/// the sub-computations amortized across all group members.
#[derive(Clone, Copy, Debug)]
pub struct RateContext {
    /// Temperature [K]
    pub temperature: f64,
    /// Pressure [Pa]
    pub pressure: f64,
    /// ln(T)
    pub log_t: f64,
    /// 1/T [1/K]
    pub recip_t: f64,
    /// 1/(R·T) [kmol/J]
    pub recip_rt: f64,
}

impl RateContext {
    pub fn new(temperature: f64, pressure: f64) -> Self {
        Self {
            temperature,
            pressure,
            log_t: temperature.ln(),
            recip_t: 1.0 / temperature,
            recip_rt: 1.0 / (GAS_CONSTANT * temperature),
        }
    }

    /// Context at `T + dT` for numeric temperature derivatives.
    /// Returns the perturbed context and the step actually taken.
    pub fn perturbed_temperature(&self, rtol: f64) -> (Self, f64) {
        let dt = perturbation_step(self.temperature, rtol);
        (Self::new(self.temperature + dt, self.pressure), dt)
    }

    /// Context at `P + dP` for numeric pressure derivatives.
    /// Returns the perturbed context and the step actually taken.
    pub fn perturbed_pressure(&self, rtol: f64) -> (Self, f64) {
        let dp = perturbation_step(self.pressure, rtol);
        (Self::new(self.temperature, self.pressure + dp), dp)
    }
}
