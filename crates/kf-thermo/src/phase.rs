//! Thermodynamic phase trait consumed by the kinetics layer.

use crate::error::ThermoResult;
use kf_core::units::{Pressure, Temperature};

/// Read-only property interface of a phase.
///
/// The kinetics manager only ever reads phase state; setting temperature,
/// pressure or composition is the owning caller's responsibility before each
/// evaluation. Implementations must be thread-safe (Send + Sync) so distinct
/// manager instances can be used from distinct threads.
///
/// Per-species output buffers must hold at least `n_species()` entries;
/// implementations validate this and fail fast rather than truncate.
pub trait ThermoPhase: Send + Sync {
    /// Phase name (unique within one kinetics manager).
    fn name(&self) -> &str;

    /// Number of species in this phase.
    fn n_species(&self) -> usize;

    /// Species names, in phase order.
    fn species_names(&self) -> &[String];

    /// Index of a species by name within this phase.
    fn species_index(&self, name: &str) -> Option<usize>;

    /// Current temperature.
    fn temperature(&self) -> Temperature;

    /// Current pressure.
    fn pressure(&self) -> Pressure;

    /// Total molar concentration [kmol/m³].
    fn molar_concentration(&self) -> f64;

    /// Standard concentration used for concentration-unit equilibrium
    /// constants [kmol/m³].
    fn standard_concentration(&self) -> f64;

    /// Monotonically increasing stamp, bumped on every state change.
    ///
    /// Lets consumers detect that temperature, pressure or composition
    /// changed since a previous query without polling individual values.
    fn state_stamp(&self) -> u64;

    /// Activity concentrations [kmol/m³], one entry per species.
    fn activity_concentrations(&self, out: &mut [f64]) -> ThermoResult<()>;

    /// Standard-state molar Gibbs energies [J/kmol].
    fn standard_gibbs(&self, out: &mut [f64]) -> ThermoResult<()>;

    /// Standard-state molar enthalpies [J/kmol].
    fn standard_enthalpies(&self, out: &mut [f64]) -> ThermoResult<()>;

    /// Standard-state molar entropies [J/(kmol·K)].
    fn standard_entropies(&self, out: &mut [f64]) -> ThermoResult<()>;

    /// Mixture chemical potentials [J/kmol].
    fn chemical_potentials(&self, out: &mut [f64]) -> ThermoResult<()>;

    /// Partial molar enthalpies [J/kmol].
    fn partial_molar_enthalpies(&self, out: &mut [f64]) -> ThermoResult<()>;

    /// Partial molar entropies [J/(kmol·K)].
    fn partial_molar_entropies(&self, out: &mut [f64]) -> ThermoResult<()>;
}
