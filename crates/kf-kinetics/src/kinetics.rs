//! Kinetics manager trait and the bulk-phase implementation.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use nalgebra_sparse::CscMatrix;
use serde_json::json;
use tracing::debug;

use kf_core::error::{check_array_size, check_index};
use kf_core::units::constants::GAS_CONSTANT;
use kf_rates::{RateContext, RateGroup};
use kf_thermo::{ThermoError, ThermoPhase};

use crate::cache::ValueCache;
use crate::deriv::DerivativeSettings;
use crate::duplicates::ThirdBodyDuplicateHandling;
use crate::error::{KineticsError, KineticsResult, not_implemented};
use crate::index::PhaseIndex;
use crate::reaction::Reaction;
use crate::stoich::{StoichCoeffs, StoichSide};

/// Owning aggregate (e.g. a reactor network) a manager can point back to.
///
/// The back-link is expirable and used for lookups only, never for lifetime
/// management.
pub trait RootAggregate: Send + Sync {
    fn name(&self) -> &str;
}

/// Token identifying one reaction-added subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Common contract of kinetics managers.
///
/// The mandatory core is the mechanism geometry; every evaluation operation
/// has a default body that fails with a not-implemented error naming the
/// operation and the concrete manager type, so probing callers get a uniform
/// reporting path. Concrete managers override what they support.
///
/// All per-reaction outputs have length `n_reactions()`; per-species outputs
/// have length `n_total_species()` and are laid out phase by phase in add
/// order. Buffer sizes are checked and fail fast.
#[allow(unused_variables)]
pub trait Kinetics {
    /// Identifies the kinetics manager type.
    fn kinetics_type(&self) -> &'static str;

    /// Number of reactions in the mechanism.
    fn n_reactions(&self) -> usize;

    /// Number of phases participating in the mechanism.
    fn n_phases(&self) -> usize;

    /// Total species count over all phases.
    fn n_total_species(&self) -> usize;

    // -- Rates of progress ---------------------------------------------------

    /// Forward rates of progress [kmol/m³/s].
    fn fwd_rates_of_progress(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rates_of_progress", self.kinetics_type()))
    }

    /// Reverse rates of progress [kmol/m³/s].
    fn rev_rates_of_progress(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("rev_rates_of_progress", self.kinetics_type()))
    }

    /// Net (forward − reverse) rates of progress [kmol/m³/s].
    fn net_rates_of_progress(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_rates_of_progress", self.kinetics_type()))
    }

    /// Equilibrium constants in concentration units.
    fn equilibrium_constants(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("equilibrium_constants", self.kinetics_type()))
    }

    /// Forward rate constants.
    fn fwd_rate_constants(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rate_constants", self.kinetics_type()))
    }

    /// Reverse rate constants, from detailed balance. Entries for
    /// irreversible reactions are zero unless `include_irreversible`.
    fn rev_rate_constants(
        &mut self,
        out: &mut [f64],
        include_irreversible: bool,
    ) -> KineticsResult<()> {
        Err(not_implemented("rev_rate_constants", self.kinetics_type()))
    }

    /// Effective third-body concentrations; NaN for reactions without a
    /// collider.
    fn third_body_concentrations(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("third_body_concentrations", self.kinetics_type()))
    }

    // -- Species production rates -------------------------------------------

    /// Species creation rates [kmol/m³/s].
    fn creation_rates(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("creation_rates", self.kinetics_type()))
    }

    /// Species destruction rates [kmol/m³/s].
    fn destruction_rates(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("destruction_rates", self.kinetics_type()))
    }

    /// Species net production rates (creation − destruction) [kmol/m³/s].
    fn net_production_rates(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_production_rates", self.kinetics_type()))
    }

    // -- Reaction delta properties ------------------------------------------

    /// Per-reaction delta of an arbitrary species property.
    fn reaction_delta(&self, property: &[f64], delta: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("reaction_delta", self.kinetics_type()))
    }

    /// Per-reaction delta restricted to reversible reactions; irreversible
    /// entries of `delta` are untouched.
    fn rev_reaction_delta(&self, property: &[f64], delta: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("rev_reaction_delta", self.kinetics_type()))
    }

    /// Reaction Gibbs energy change from mixture chemical potentials [J/kmol].
    fn delta_gibbs(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("delta_gibbs", self.kinetics_type()))
    }

    /// Reaction enthalpy change from partial molar enthalpies [J/kmol].
    fn delta_enthalpy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("delta_enthalpy", self.kinetics_type()))
    }

    /// Reaction entropy change from partial molar entropies [J/(kmol·K)].
    fn delta_entropy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("delta_entropy", self.kinetics_type()))
    }

    /// Standard-state reaction Gibbs energy change [J/kmol].
    fn delta_ss_gibbs(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("delta_ss_gibbs", self.kinetics_type()))
    }

    /// Standard-state reaction enthalpy change [J/kmol].
    fn delta_ss_enthalpy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("delta_ss_enthalpy", self.kinetics_type()))
    }

    /// Standard-state reaction entropy change [J/(kmol·K)].
    fn delta_ss_entropy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("delta_ss_entropy", self.kinetics_type()))
    }

    /// Reaction electrochemical free energy change [J/kmol].
    fn delta_electrochem_potentials(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented(
            "delta_electrochem_potentials",
            self.kinetics_type(),
        ))
    }

    // -- Derivative settings -------------------------------------------------

    /// Retrieve derivative-evaluation settings as a key/value document.
    fn derivative_settings(&self) -> KineticsResult<serde_json::Value> {
        Err(not_implemented("derivative_settings", self.kinetics_type()))
    }

    /// Replace derivative-evaluation settings from a key/value document.
    fn set_derivative_settings(&mut self, settings: &serde_json::Value) -> KineticsResult<()> {
        Err(not_implemented("set_derivative_settings", self.kinetics_type()))
    }

    // -- Derivatives: vectors ------------------------------------------------

    /// d(kf)/dT at constant P, C and X.
    fn fwd_rate_constants_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rate_constants_ddt", self.kinetics_type()))
    }

    /// d(kf)/dP at constant T, C and X.
    fn fwd_rate_constants_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rate_constants_ddp", self.kinetics_type()))
    }

    /// d(kf)/dC at constant T, P and X.
    fn fwd_rate_constants_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rate_constants_ddc", self.kinetics_type()))
    }

    /// d(fwd ROP)/dT at constant P, C and X.
    fn fwd_rates_of_progress_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rates_of_progress_ddt", self.kinetics_type()))
    }

    /// d(fwd ROP)/dP at constant T, C and X.
    fn fwd_rates_of_progress_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rates_of_progress_ddp", self.kinetics_type()))
    }

    /// d(fwd ROP)/dC at constant T, P and X.
    fn fwd_rates_of_progress_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("fwd_rates_of_progress_ddc", self.kinetics_type()))
    }

    /// d(rev ROP)/dT at constant P, C and X.
    fn rev_rates_of_progress_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("rev_rates_of_progress_ddt", self.kinetics_type()))
    }

    /// d(rev ROP)/dP at constant T, C and X.
    fn rev_rates_of_progress_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("rev_rates_of_progress_ddp", self.kinetics_type()))
    }

    /// d(rev ROP)/dC at constant T, P and X.
    fn rev_rates_of_progress_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("rev_rates_of_progress_ddc", self.kinetics_type()))
    }

    /// d(net ROP)/dT at constant P, C and X.
    fn net_rates_of_progress_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_rates_of_progress_ddt", self.kinetics_type()))
    }

    /// d(net ROP)/dP at constant T, C and X.
    fn net_rates_of_progress_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_rates_of_progress_ddp", self.kinetics_type()))
    }

    /// d(net ROP)/dC at constant T, P and X.
    fn net_rates_of_progress_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_rates_of_progress_ddc", self.kinetics_type()))
    }

    /// d(creation rates)/dT.
    fn creation_rates_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("creation_rates_ddt", self.kinetics_type()))
    }

    /// d(creation rates)/dP.
    fn creation_rates_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("creation_rates_ddp", self.kinetics_type()))
    }

    /// d(creation rates)/dC.
    fn creation_rates_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("creation_rates_ddc", self.kinetics_type()))
    }

    /// d(destruction rates)/dT.
    fn destruction_rates_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("destruction_rates_ddt", self.kinetics_type()))
    }

    /// d(destruction rates)/dP.
    fn destruction_rates_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("destruction_rates_ddp", self.kinetics_type()))
    }

    /// d(destruction rates)/dC.
    fn destruction_rates_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("destruction_rates_ddc", self.kinetics_type()))
    }

    /// d(net production rates)/dT.
    fn net_production_rates_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_production_rates_ddt", self.kinetics_type()))
    }

    /// d(net production rates)/dP.
    fn net_production_rates_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_production_rates_ddp", self.kinetics_type()))
    }

    /// d(net production rates)/dC.
    fn net_production_rates_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        Err(not_implemented("net_production_rates_ddc", self.kinetics_type()))
    }

    // -- Derivatives: sparse matrices ---------------------------------------

    /// d(fwd ROP)/dX, shape nReactions × nTotalSpecies. Each column holds all
    /// other mole fractions fixed (no renormalization).
    fn fwd_rates_of_progress_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("fwd_rates_of_progress_ddx", self.kinetics_type()))
    }

    /// d(fwd ROP)/dCi, shape nReactions × nTotalSpecies.
    fn fwd_rates_of_progress_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("fwd_rates_of_progress_ddci", self.kinetics_type()))
    }

    /// d(rev ROP)/dX, shape nReactions × nTotalSpecies.
    fn rev_rates_of_progress_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("rev_rates_of_progress_ddx", self.kinetics_type()))
    }

    /// d(rev ROP)/dCi, shape nReactions × nTotalSpecies.
    fn rev_rates_of_progress_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("rev_rates_of_progress_ddci", self.kinetics_type()))
    }

    /// d(net ROP)/dX, shape nReactions × nTotalSpecies.
    fn net_rates_of_progress_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("net_rates_of_progress_ddx", self.kinetics_type()))
    }

    /// d(net ROP)/dCi, shape nReactions × nTotalSpecies.
    fn net_rates_of_progress_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("net_rates_of_progress_ddci", self.kinetics_type()))
    }

    /// d(creation rates)/dX, square over species.
    fn creation_rates_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("creation_rates_ddx", self.kinetics_type()))
    }

    /// d(creation rates)/dCi, square over species.
    fn creation_rates_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("creation_rates_ddci", self.kinetics_type()))
    }

    /// d(destruction rates)/dX, square over species.
    fn destruction_rates_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("destruction_rates_ddx", self.kinetics_type()))
    }

    /// d(destruction rates)/dCi, square over species.
    fn destruction_rates_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("destruction_rates_ddci", self.kinetics_type()))
    }

    /// d(net production rates)/dX, square over species.
    fn net_production_rates_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("net_production_rates_ddx", self.kinetics_type()))
    }

    /// d(net production rates)/dCi, square over species.
    fn net_production_rates_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        Err(not_implemented("net_production_rates_ddci", self.kinetics_type()))
    }
}

/// Effective third-body specification resolved to global species indices.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedThirdBody {
    /// (species, efficiency − default) for species with overridden efficiency
    deltas: Vec<(usize, f64)>,
    default_efficiency: f64,
    /// Explicit single collider, if any
    pub(crate) explicit: Option<usize>,
}

impl ResolvedThirdBody {
    pub(crate) fn efficiency_of(&self, k: usize) -> f64 {
        if let Some(x) = self.explicit {
            return if x == k { 1.0 } else { 0.0 };
        }
        self.default_efficiency
            + self
                .deltas
                .iter()
                .find(|(j, _)| *j == k)
                .map(|(_, d)| *d)
                .unwrap_or(0.0)
    }

    pub(crate) fn concentration(&self, conc: &[f64], ctot: f64) -> f64 {
        if let Some(x) = self.explicit {
            return conc[x];
        }
        let mut cm = self.default_efficiency * ctot;
        for (k, d) in &self.deltas {
            cm += d * conc[*k];
        }
        cm
    }

    pub(crate) fn set_efficiency(&mut self, k: usize, efficiency: f64) {
        let delta = efficiency - self.default_efficiency;
        if let Some(entry) = self.deltas.iter_mut().find(|(j, _)| *j == k) {
            entry.1 = delta;
        } else {
            self.deltas.push((k, delta));
        }
    }
}

/// Kinetics manager for homogeneous chemistry in bulk phases.
///
/// Constructed empty, populated with `add_phase` then `add_reaction` calls;
/// the phase/species layout freezes once the first reaction is added.
#[derive(Default)]
pub struct BulkKinetics {
    pub(crate) phases: PhaseIndex,
    pub(crate) reactions: Vec<Reaction>,
    pub(crate) stoich: StoichCoeffs,
    groups: Vec<RateGroup>,
    group_of_type: HashMap<&'static str, usize>,
    group_of_reaction: Vec<usize>,
    pub(crate) multipliers: Vec<f64>,
    rev_indices: Vec<usize>,
    irrev_indices: Vec<usize>,
    pub(crate) third_bodies: Vec<Option<ResolvedThirdBody>>,
    /// Σ ν′ per reaction (nominal forward order)
    pub(crate) fwd_orders: Vec<f64>,
    /// Σ ν″ per reaction over reversible products
    pub(crate) rev_orders: Vec<f64>,
    /// Σ ν_net per reaction (Δν, for concentration-unit Kc)
    pub(crate) net_sums: Vec<f64>,
    pub(crate) cache: ValueCache,
    pub(crate) settings: DerivativeSettings,
    skip_undeclared_species: bool,
    skip_undeclared_third_bodies: bool,
    has_undeclared_third_bodies: bool,
    pub(crate) third_body_duplicate_handling: ThirdBodyDuplicateHandling,
    ready: bool,
    callbacks: Vec<(CallbackId, Box<dyn Fn() + Send>)>,
    next_callback: u64,
    root: Option<Weak<dyn RootAggregate>>,
}

impl BulkKinetics {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Phase and species geometry -----------------------------------------

    /// Append a phase. Must precede every `add_reaction` call.
    pub fn add_phase(&mut self, phase: Arc<dyn ThermoPhase>) -> KineticsResult<usize> {
        if self.ready {
            return Err(KineticsError::InvalidOperation {
                what: "phases cannot be added after reactions",
            });
        }
        let n = self.phases.add_phase(phase)?;
        self.resize_species();
        Ok(n)
    }

    /// Commit to the current phase/species layout. Idempotent; invoked
    /// automatically by the first `add_reaction`.
    pub fn init(&mut self) -> KineticsResult<()> {
        if self.ready {
            return Ok(());
        }
        if self.phases.n_phases() == 0 {
            return Err(KineticsError::InvalidOperation {
                what: "at least one phase must be added before reactions",
            });
        }
        self.resize_species();
        self.ready = true;
        Ok(())
    }

    /// Resize per-species storage after phase additions. Repeat-safe.
    pub fn resize_species(&mut self) {
        let kk = self.phases.n_total_species();
        self.stoich.resize_species(kk);
        self.stoich.rebuild();
        self.cache.invalidate();
    }

    /// Finalize per-reaction storage: rebuild stoichiometry matrices and the
    /// per-reaction order sums, zero-extend the multiplier vector.
    /// Repeat-safe.
    pub fn resize_reactions(&mut self) -> KineticsResult<()> {
        let nr = self.stoich.n_reactions();
        self.multipliers.resize(nr, 1.0);
        self.stoich.rebuild();
        self.fwd_orders = self.stoich.order_sums(StoichSide::Reactant)?;
        self.rev_orders = self.stoich.order_sums(StoichSide::RevProduct)?;
        self.net_sums = self.stoich.order_sums(StoichSide::Net)?;
        self.cache.invalidate();
        debug!(n_reactions = nr, "resized reaction arrays");
        Ok(())
    }

    pub fn phase(&self, n: usize) -> KineticsResult<&Arc<dyn ThermoPhase>> {
        self.phases.phase(n)
    }

    pub fn phase_index(&self, name: &str) -> Option<usize> {
        self.phases.phase_index(name)
    }

    pub fn kinetics_species_index(&self, k: usize, n: usize) -> KineticsResult<usize> {
        self.phases.kinetics_species_index(k, n)
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.phases.species_index(name)
    }

    pub fn kinetics_species_name(&self, k: usize) -> String {
        self.phases.kinetics_species_name(k)
    }

    pub fn species_phase_index(&self, k: usize) -> KineticsResult<usize> {
        self.phases.species_phase_index(k)
    }

    /// Phase owning the named species.
    pub fn species_phase(&self, name: &str) -> KineticsResult<&Arc<dyn ThermoPhase>> {
        let k = self
            .species_index(name)
            .ok_or(KineticsError::InvalidOperation {
                what: "species not found in any phase",
            })?;
        self.phases.phase(self.phases.species_phase_index(k)?)
    }

    pub fn check_reaction_index(&self, i: usize) -> KineticsResult<()> {
        check_index("reaction", i, self.reactions.len())?;
        Ok(())
    }

    pub fn check_reaction_array(&self, len: usize) -> KineticsResult<()> {
        check_array_size("per-reaction array", len, self.reactions.len())?;
        Ok(())
    }

    pub fn check_species_index(&self, k: usize) -> KineticsResult<()> {
        self.phases.check_species_index(k)
    }

    pub fn check_species_array(&self, len: usize) -> KineticsResult<()> {
        self.phases.check_species_array(len)
    }

    pub fn check_phase_index(&self, n: usize) -> KineticsResult<()> {
        self.phases.check_phase_index(n)
    }

    // -- Mechanism construction ---------------------------------------------

    /// Add a reaction. Returns `false` if it was skipped because it
    /// references species undeclared in every phase and the skip policy is
    /// active.
    pub fn add_reaction(&mut self, reaction: Reaction, resize: bool) -> KineticsResult<bool> {
        self.init()?;

        let Some((reactant_idx, product_idx)) = self.resolve_species(&reaction)? else {
            return Ok(false);
        };
        let third_body = match self.resolve_third_body(&reaction)? {
            ThirdBodyResolution::NotPresent => None,
            ThirdBodyResolution::Resolved(tb) => Some(tb),
            ThirdBodyResolution::SkipReaction => return Ok(false),
        };

        let i = self.reactions.len();
        self.stoich
            .add_reaction(i, &reactant_idx, &product_idx, reaction.reversible)?;

        let rate_type = reaction.rate.rate_type();
        let slot = match self.group_of_type.get(rate_type) {
            Some(slot) => *slot,
            None => {
                let slot = self.groups.len();
                self.groups.push(RateGroup::new(rate_type));
                self.group_of_type.insert(rate_type, slot);
                slot
            }
        };
        self.groups[slot].add(i, reaction.rate.clone_box())?;
        self.group_of_reaction.push(slot);

        if reaction.reversible {
            self.rev_indices.push(i);
        } else {
            self.irrev_indices.push(i);
        }
        self.third_bodies.push(third_body);
        self.multipliers.push(1.0);
        self.reactions.push(reaction);

        if resize {
            self.resize_reactions()?;
        } else {
            self.cache.invalidate();
        }
        for (_, callback) in &self.callbacks {
            callback();
        }
        Ok(true)
    }

    /// Replace the rate expression of reaction i. Everything but the rate
    /// parameters (stoichiometry, reversibility, third body, rate type) must
    /// be unchanged.
    pub fn modify_reaction(&mut self, i: usize, reaction: Reaction) -> KineticsResult<()> {
        self.check_reaction_index(i)?;
        if !self.reactions[i].same_structure(&reaction) {
            return Err(KineticsError::InvalidOperation {
                what: "modify_reaction may only change rate-expression parameters",
            });
        }
        let slot = self.group_of_reaction[i];
        self.groups[slot].replace(i, reaction.rate.clone_box())?;
        self.reactions[i] = reaction;
        self.cache.invalidate();
        Ok(())
    }

    /// The reaction record for reaction i.
    pub fn reaction(&self, i: usize) -> KineticsResult<&Reaction> {
        self.check_reaction_index(i)?;
        Ok(&self.reactions[i])
    }

    /// Whether reaction i was declared reversible.
    pub fn is_reversible(&self, i: usize) -> KineticsResult<bool> {
        self.check_reaction_index(i)?;
        Ok(self.reactions[i].reversible)
    }

    fn resolve_species(
        &self,
        reaction: &Reaction,
    ) -> KineticsResult<Option<(Vec<(usize, f64)>, Vec<(usize, f64)>)>> {
        let Some(reactants) = self.resolve_side(&reaction.reactants, reaction)? else {
            return Ok(None);
        };
        let Some(products) = self.resolve_side(&reaction.products, reaction)? else {
            return Ok(None);
        };
        Ok(Some((reactants, products)))
    }

    fn resolve_side(
        &self,
        side: &std::collections::BTreeMap<String, f64>,
        reaction: &Reaction,
    ) -> KineticsResult<Option<Vec<(usize, f64)>>> {
        let mut resolved = Vec::with_capacity(side.len());
        for (name, nu) in side {
            match self.phases.species_index(name) {
                Some(k) => resolved.push((k, *nu)),
                None if self.skip_undeclared_species => return Ok(None),
                None => {
                    return Err(KineticsError::UndeclaredSpecies {
                        species: name.clone(),
                        equation: reaction.equation(),
                    });
                }
            }
        }
        Ok(Some(resolved))
    }

    fn resolve_third_body(&mut self, reaction: &Reaction) -> KineticsResult<ThirdBodyResolution> {
        let Some(tb) = &reaction.third_body else {
            return Ok(ThirdBodyResolution::NotPresent);
        };
        let explicit = match &tb.explicit_collider {
            Some(name) => match self.phases.species_index(name) {
                Some(k) => Some(k),
                None if self.skip_undeclared_species => {
                    return Ok(ThirdBodyResolution::SkipReaction);
                }
                None => {
                    return Err(KineticsError::UndeclaredThirdBody {
                        species: name.clone(),
                        equation: reaction.equation(),
                    });
                }
            },
            None => None,
        };
        let mut deltas = Vec::with_capacity(tb.efficiencies.len());
        for (name, eff) in &tb.efficiencies {
            match self.phases.species_index(name) {
                Some(k) => deltas.push((k, eff - tb.default_efficiency)),
                None if self.skip_undeclared_third_bodies => {
                    self.has_undeclared_third_bodies = true;
                }
                None => {
                    return Err(KineticsError::UndeclaredThirdBody {
                        species: name.clone(),
                        equation: reaction.equation(),
                    });
                }
            }
        }
        Ok(ThirdBodyResolution::Resolved(ResolvedThirdBody {
            deltas,
            default_efficiency: tb.default_efficiency,
            explicit,
        }))
    }

    // -- Policies ------------------------------------------------------------

    pub fn skip_undeclared_species(&self) -> bool {
        self.skip_undeclared_species
    }

    pub fn set_skip_undeclared_species(&mut self, skip: bool) {
        self.skip_undeclared_species = skip;
    }

    pub fn skip_undeclared_third_bodies(&self) -> bool {
        self.skip_undeclared_third_bodies
    }

    pub fn set_skip_undeclared_third_bodies(&mut self, skip: bool) {
        self.skip_undeclared_third_bodies = skip;
    }

    pub fn has_undeclared_third_bodies(&self) -> bool {
        self.has_undeclared_third_bodies
    }

    pub fn third_body_duplicate_handling(&self) -> ThirdBodyDuplicateHandling {
        self.third_body_duplicate_handling
    }

    pub fn set_third_body_duplicate_handling(&mut self, handling: ThirdBodyDuplicateHandling) {
        self.third_body_duplicate_handling = handling;
    }

    // -- Rate multipliers ----------------------------------------------------

    /// Current rate-of-progress multiplier of reaction i.
    pub fn multiplier(&self, i: usize) -> KineticsResult<f64> {
        self.check_reaction_index(i)?;
        Ok(self.multipliers[i])
    }

    /// Scale reaction i's rate of progress by `f` (0 disables the reaction).
    pub fn set_multiplier(&mut self, i: usize, f: f64) -> KineticsResult<()> {
        self.check_reaction_index(i)?;
        self.multipliers[i] = f;
        self.cache.invalidate();
        Ok(())
    }

    /// Drop all memoized evaluation results.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    // -- Stoichiometry accessors --------------------------------------------

    pub fn reactant_stoich_coeff(&self, k: usize, i: usize) -> KineticsResult<f64> {
        self.check_species_index(k)?;
        self.check_reaction_index(i)?;
        Ok(self.stoich.reactant_coeff(k, i))
    }

    pub fn product_stoich_coeff(&self, k: usize, i: usize) -> KineticsResult<f64> {
        self.check_species_index(k)?;
        self.check_reaction_index(i)?;
        Ok(self.stoich.product_coeff(k, i))
    }

    pub fn net_stoich_coeff(&self, k: usize, i: usize) -> KineticsResult<f64> {
        self.check_species_index(k)?;
        self.check_reaction_index(i)?;
        Ok(self.stoich.net_coeff(k, i))
    }

    /// Nominal forward reaction order of species k in reaction i.
    pub fn reactant_order(&self, k: usize, i: usize) -> KineticsResult<f64> {
        self.reactant_stoich_coeff(k, i)
    }

    pub fn reactant_stoich_coeffs(&self) -> KineticsResult<&CscMatrix<f64>> {
        Ok(self.stoich.matrix(StoichSide::Reactant)?)
    }

    pub fn product_stoich_coeffs(&self) -> KineticsResult<&CscMatrix<f64>> {
        Ok(self.stoich.matrix(StoichSide::Product)?)
    }

    pub fn rev_product_stoich_coeffs(&self) -> KineticsResult<&CscMatrix<f64>> {
        Ok(self.stoich.matrix(StoichSide::RevProduct)?)
    }

    pub fn net_stoich_coeffs(&self) -> KineticsResult<&CscMatrix<f64>> {
        Ok(self.stoich.matrix(StoichSide::Net)?)
    }

    // -- Observers and root link --------------------------------------------

    /// Register a callback invoked after every reaction addition.
    pub fn register_reaction_added_callback(
        &mut self,
        callback: Box<dyn Fn() + Send>,
    ) -> CallbackId {
        let id = CallbackId(self.next_callback);
        self.next_callback += 1;
        self.callbacks.push((id, callback));
        id
    }

    /// Remove a subscription; a no-op for unknown or already-removed tokens.
    pub fn remove_reaction_added_callback(&mut self, id: CallbackId) {
        self.callbacks.retain(|(cid, _)| *cid != id);
    }

    /// Point back at the owning aggregate. The link never extends the
    /// aggregate's lifetime.
    pub fn set_root(&mut self, root: &Arc<dyn RootAggregate>) {
        self.root = Some(Arc::downgrade(root));
    }

    /// The owning aggregate, if it is still alive.
    pub fn root(&self) -> Option<Arc<dyn RootAggregate>> {
        self.root.as_ref().and_then(Weak::upgrade)
    }

    /// Configuration sufficient to reconstruct the phase/kinetics-type
    /// linkage. Reaction definitions are serialized separately by the caller.
    pub fn parameters(&self) -> serde_json::Value {
        let phase_names: Vec<&str> = self
            .phases
            .phases()
            .iter()
            .map(|p| p.name())
            .collect();
        json!({
            "kinetics": self.kinetics_type(),
            "phases": phase_names,
            "skip-undeclared-species": self.skip_undeclared_species,
            "skip-undeclared-third-bodies": self.skip_undeclared_third_bodies,
            "explicit-third-body-duplicates": self.third_body_duplicate_handling.as_str(),
        })
    }

    // -- Evaluation pipeline -------------------------------------------------

    /// Stamps of the external thermodynamic state, one per phase.
    pub(crate) fn external_state(&self) -> Vec<u64> {
        self.phases.phases().iter().map(|p| p.state_stamp()).collect()
    }

    pub(crate) fn rate_context(&self) -> KineticsResult<RateContext> {
        let phase = self.phases.phase(0)?;
        Ok(RateContext::new(
            phase.temperature().value,
            phase.pressure().value,
        ))
    }

    /// Gather a per-species property across all phases into one flat vector.
    pub(crate) fn gather_species<F>(&self, f: F) -> KineticsResult<Vec<f64>>
    where
        F: Fn(&dyn ThermoPhase, &mut [f64]) -> Result<(), ThermoError>,
    {
        let mut out = vec![0.0; self.phases.n_total_species()];
        for (n, phase) in self.phases.phases().iter().enumerate() {
            let start = self.phases.start(n)?;
            f(phase.as_ref(), &mut out[start..start + phase.n_species()])?;
        }
        Ok(out)
    }

    /// Fetch a cached quantity that `update_rop` is guaranteed to have stored.
    pub(crate) fn cached(&self, quantity: &'static str) -> KineticsResult<&[f64]> {
        self.cache
            .lookup(quantity, &self.external_state())
            .ok_or(KineticsError::Core(kf_core::KfError::Invariant {
                what: "expected cached quantity missing",
            }))
    }

    /// Compute and memoize rate constants, third-body terms and rates of
    /// progress for the current external state. A no-op when the cache is
    /// already current.
    pub(crate) fn update_rop(&mut self) -> KineticsResult<()> {
        let ext = self.external_state();
        if self.cache.contains("ropnet", &ext) {
            return Ok(());
        }
        if self.reactions.is_empty() {
            self.init()?;
        }

        let nr = self.reactions.len();
        let ctx = self.rate_context()?;

        let conc = self.gather_species(|p, out| p.activity_concentrations(out))?;
        let ctot: f64 = conc.iter().sum();

        let mut kf = vec![0.0; nr];
        for group in &self.groups {
            group.eval(&ctx, &mut kf);
        }

        let mut tbf = vec![1.0; nr];
        let mut concm = vec![f64::NAN; nr];
        for (i, tb) in self.third_bodies.iter().enumerate() {
            if let Some(tb) = tb {
                let cm = tb.concentration(&conc, ctot);
                tbf[i] = cm;
                concm[i] = cm;
            }
        }

        // Equilibrium constants in concentration units, for every reaction
        let g0 = self.gather_species(|p, out| p.standard_gibbs(out))?;
        let mut delta_g0 = vec![0.0; nr];
        self.stoich.reaction_delta(&g0, &mut delta_g0)?;
        let rt = GAS_CONSTANT * ctx.temperature;
        let c0 = self.phases.phase(0)?.standard_concentration();
        let mut kc = vec![0.0; nr];
        for i in 0..nr {
            kc[i] = (-delta_g0[i] / rt).exp() * c0.powf(self.net_sums[i]);
        }
        let mut rkcn = vec![0.0; nr];
        for &i in &self.rev_indices {
            rkcn[i] = 1.0 / kc[i];
        }

        let mut cf = vec![0.0; nr];
        self.stoich
            .concentration_products(StoichSide::Reactant, &conc, &mut cf)?;
        let mut cr = vec![0.0; nr];
        self.stoich
            .concentration_products(StoichSide::RevProduct, &conc, &mut cr)?;

        let mut ropf = vec![0.0; nr];
        let mut ropr = vec![0.0; nr];
        let mut ropnet = vec![0.0; nr];
        for i in 0..nr {
            ropf[i] = self.multipliers[i] * kf[i] * tbf[i] * cf[i];
            ropr[i] = self.multipliers[i] * kf[i] * rkcn[i] * tbf[i] * cr[i];
            ropnet[i] = ropf[i] - ropr[i];
        }

        self.cache.store("cf", &ext, cf);
        self.cache.store("cr", &ext, cr);
        self.cache.store("conc", &ext, conc);
        self.cache.store("ctot", &ext, vec![ctot]);
        self.cache.store("kf", &ext, kf);
        self.cache.store("kc", &ext, kc);
        self.cache.store("rkcn", &ext, rkcn);
        self.cache.store("tbf", &ext, tbf);
        self.cache.store("concm", &ext, concm);
        self.cache.store("ropf", &ext, ropf);
        self.cache.store("ropr", &ext, ropr);
        self.cache.store("ropnet", &ext, ropnet);
        Ok(())
    }

    fn copy_cached(&self, quantity: &'static str, out: &mut [f64]) -> KineticsResult<()> {
        let values = self.cached(quantity)?;
        out[..values.len()].copy_from_slice(values);
        Ok(())
    }

    fn species_rates(
        &mut self,
        fwd_side: StoichSide,
        rev_side: StoichSide,
        out: &mut [f64],
    ) -> KineticsResult<()> {
        self.check_species_array(out.len())?;
        self.update_rop()?;
        out[..self.phases.n_total_species()].fill(0.0);
        let ropf = self.cached("ropf")?.to_vec();
        let ropr = self.cached("ropr")?.to_vec();
        self.stoich.species_multiply_acc(fwd_side, &ropf, out)?;
        self.stoich.species_multiply_acc(rev_side, &ropr, out)?;
        Ok(())
    }
}

enum ThirdBodyResolution {
    NotPresent,
    Resolved(ResolvedThirdBody),
    SkipReaction,
}

impl Kinetics for BulkKinetics {
    fn kinetics_type(&self) -> &'static str {
        "bulk"
    }

    fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    fn n_phases(&self) -> usize {
        self.phases.n_phases()
    }

    fn n_total_species(&self) -> usize {
        self.phases.n_total_species()
    }

    fn fwd_rates_of_progress(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        self.copy_cached("ropf", out)
    }

    fn rev_rates_of_progress(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        self.copy_cached("ropr", out)
    }

    fn net_rates_of_progress(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        self.copy_cached("ropnet", out)
    }

    fn equilibrium_constants(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        self.copy_cached("kc", out)
    }

    fn fwd_rate_constants(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        self.copy_cached("kf", out)
    }

    fn rev_rate_constants(
        &mut self,
        out: &mut [f64],
        include_irreversible: bool,
    ) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        let kf = self.cached("kf")?;
        let kc = self.cached("kc")?;
        for i in 0..self.reactions.len() {
            out[i] = kf[i] / kc[i];
        }
        if !include_irreversible {
            for &i in &self.irrev_indices {
                out[i] = 0.0;
            }
        }
        Ok(())
    }

    fn third_body_concentrations(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        self.update_rop()?;
        self.copy_cached("concm", out)
    }

    fn creation_rates(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        // forward direction creates products, reverse direction creates reactants
        self.species_rates(StoichSide::Product, StoichSide::Reactant, out)
    }

    fn destruction_rates(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.species_rates(StoichSide::Reactant, StoichSide::Product, out)
    }

    fn net_production_rates(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_species_array(out.len())?;
        self.update_rop()?;
        let kk = self.phases.n_total_species();
        out[..kk].fill(0.0);
        let ropf = self.cached("ropf")?.to_vec();
        let ropr = self.cached("ropr")?.to_vec();
        // creation − destruction term by term, so the decomposition identity
        // holds without tolerance
        let mut ddot = vec![0.0; kk];
        self.stoich
            .species_multiply_acc(StoichSide::Product, &ropf, out)?;
        self.stoich
            .species_multiply_acc(StoichSide::Reactant, &ropr, out)?;
        self.stoich
            .species_multiply_acc(StoichSide::Reactant, &ropf, &mut ddot)?;
        self.stoich
            .species_multiply_acc(StoichSide::Product, &ropr, &mut ddot)?;
        for k in 0..kk {
            out[k] -= ddot[k];
        }
        Ok(())
    }

    fn reaction_delta(&self, property: &[f64], delta: &mut [f64]) -> KineticsResult<()> {
        Ok(self.stoich.reaction_delta(property, delta)?)
    }

    fn rev_reaction_delta(&self, property: &[f64], delta: &mut [f64]) -> KineticsResult<()> {
        Ok(self.stoich.rev_reaction_delta(property, delta)?)
    }

    fn delta_gibbs(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let mu = self.gather_species(|p, buf| p.chemical_potentials(buf))?;
        self.stoich.reaction_delta(&mu, out)?;
        Ok(())
    }

    fn delta_enthalpy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let h = self.gather_species(|p, buf| p.partial_molar_enthalpies(buf))?;
        self.stoich.reaction_delta(&h, out)?;
        Ok(())
    }

    fn delta_entropy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let s = self.gather_species(|p, buf| p.partial_molar_entropies(buf))?;
        self.stoich.reaction_delta(&s, out)?;
        Ok(())
    }

    fn delta_ss_gibbs(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let g0 = self.gather_species(|p, buf| p.standard_gibbs(buf))?;
        self.stoich.reaction_delta(&g0, out)?;
        Ok(())
    }

    fn delta_ss_enthalpy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let h0 = self.gather_species(|p, buf| p.standard_enthalpies(buf))?;
        self.stoich.reaction_delta(&h0, out)?;
        Ok(())
    }

    fn delta_ss_entropy(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let s0 = self.gather_species(|p, buf| p.standard_entropies(buf))?;
        self.stoich.reaction_delta(&s0, out)?;
        Ok(())
    }

    fn derivative_settings(&self) -> KineticsResult<serde_json::Value> {
        self.settings.to_value()
    }

    fn set_derivative_settings(&mut self, settings: &serde_json::Value) -> KineticsResult<()> {
        self.settings = DerivativeSettings::from_value(settings)?;
        self.cache.invalidate();
        Ok(())
    }

    fn fwd_rate_constants_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let ctx = self.rate_context()?;
        for group in &self.groups {
            group.eval_ddt(&ctx, self.settings.rtol_delta, out);
        }
        Ok(())
    }

    fn fwd_rate_constants_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let ctx = self.rate_context()?;
        for group in &self.groups {
            group.eval_ddp(&ctx, self.settings.rtol_delta, out);
        }
        Ok(())
    }

    fn fwd_rate_constants_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        // rate constants of this manager's rate families carry no
        // concentration dependence
        self.check_reaction_array(out.len())?;
        out[..self.reactions.len()].fill(0.0);
        Ok(())
    }

    fn fwd_rates_of_progress_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (fwd, _) = self.rop_ddt_components()?;
        out[..fwd.len()].copy_from_slice(&fwd);
        Ok(())
    }

    fn fwd_rates_of_progress_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (fwd, _) = self.rop_ddp_components()?;
        out[..fwd.len()].copy_from_slice(&fwd);
        Ok(())
    }

    fn fwd_rates_of_progress_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (fwd, _) = self.rop_ddc_components()?;
        out[..fwd.len()].copy_from_slice(&fwd);
        Ok(())
    }

    fn rev_rates_of_progress_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (_, rev) = self.rop_ddt_components()?;
        out[..rev.len()].copy_from_slice(&rev);
        Ok(())
    }

    fn rev_rates_of_progress_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (_, rev) = self.rop_ddp_components()?;
        out[..rev.len()].copy_from_slice(&rev);
        Ok(())
    }

    fn rev_rates_of_progress_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (_, rev) = self.rop_ddc_components()?;
        out[..rev.len()].copy_from_slice(&rev);
        Ok(())
    }

    fn net_rates_of_progress_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (fwd, rev) = self.rop_ddt_components()?;
        for i in 0..fwd.len() {
            out[i] = fwd[i] - rev[i];
        }
        Ok(())
    }

    fn net_rates_of_progress_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (fwd, rev) = self.rop_ddp_components()?;
        for i in 0..fwd.len() {
            out[i] = fwd[i] - rev[i];
        }
        Ok(())
    }

    fn net_rates_of_progress_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_reaction_array(out.len())?;
        let (fwd, rev) = self.rop_ddc_components()?;
        for i in 0..fwd.len() {
            out[i] = fwd[i] - rev[i];
        }
        Ok(())
    }

    fn creation_rates_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        let (fwd, rev) = self.rop_ddt_components()?;
        self.species_derivative(StoichSide::Product, &fwd, StoichSide::Reactant, &rev, out)
    }

    fn creation_rates_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        let (fwd, rev) = self.rop_ddp_components()?;
        self.species_derivative(StoichSide::Product, &fwd, StoichSide::Reactant, &rev, out)
    }

    fn creation_rates_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        let (fwd, rev) = self.rop_ddc_components()?;
        self.species_derivative(StoichSide::Product, &fwd, StoichSide::Reactant, &rev, out)
    }

    fn destruction_rates_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        let (fwd, rev) = self.rop_ddt_components()?;
        self.species_derivative(StoichSide::Reactant, &fwd, StoichSide::Product, &rev, out)
    }

    fn destruction_rates_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        let (fwd, rev) = self.rop_ddp_components()?;
        self.species_derivative(StoichSide::Reactant, &fwd, StoichSide::Product, &rev, out)
    }

    fn destruction_rates_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        let (fwd, rev) = self.rop_ddc_components()?;
        self.species_derivative(StoichSide::Reactant, &fwd, StoichSide::Product, &rev, out)
    }

    fn net_production_rates_ddt(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_species_array(out.len())?;
        let (fwd, rev) = self.rop_ddt_components()?;
        let net: Vec<f64> = fwd.iter().zip(&rev).map(|(f, r)| f - r).collect();
        out[..self.phases.n_total_species()].fill(0.0);
        self.stoich.species_multiply_acc(StoichSide::Net, &net, out)?;
        Ok(())
    }

    fn net_production_rates_ddp(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_species_array(out.len())?;
        let (fwd, rev) = self.rop_ddp_components()?;
        let net: Vec<f64> = fwd.iter().zip(&rev).map(|(f, r)| f - r).collect();
        out[..self.phases.n_total_species()].fill(0.0);
        self.stoich.species_multiply_acc(StoichSide::Net, &net, out)?;
        Ok(())
    }

    fn net_production_rates_ddc(&mut self, out: &mut [f64]) -> KineticsResult<()> {
        self.check_species_array(out.len())?;
        let (fwd, rev) = self.rop_ddc_components()?;
        let net: Vec<f64> = fwd.iter().zip(&rev).map(|(f, r)| f - r).collect();
        out[..self.phases.n_total_species()].fill(0.0);
        self.stoich.species_multiply_acc(StoichSide::Net, &net, out)?;
        Ok(())
    }

    fn fwd_rates_of_progress_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.rop_jacobian(RopDirection::Forward, DerivVariable::MoleFraction)
    }

    fn fwd_rates_of_progress_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.rop_jacobian(RopDirection::Forward, DerivVariable::Concentration)
    }

    fn rev_rates_of_progress_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.rop_jacobian(RopDirection::Reverse, DerivVariable::MoleFraction)
    }

    fn rev_rates_of_progress_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.rop_jacobian(RopDirection::Reverse, DerivVariable::Concentration)
    }

    fn net_rates_of_progress_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        let fwd = self.rop_jacobian(RopDirection::Forward, DerivVariable::MoleFraction)?;
        let rev = self.rop_jacobian(RopDirection::Reverse, DerivVariable::MoleFraction)?;
        Ok(crate::deriv::sp_sub(&fwd, &rev))
    }

    fn net_rates_of_progress_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        let fwd = self.rop_jacobian(RopDirection::Forward, DerivVariable::Concentration)?;
        let rev = self.rop_jacobian(RopDirection::Reverse, DerivVariable::Concentration)?;
        Ok(crate::deriv::sp_sub(&fwd, &rev))
    }

    fn creation_rates_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.species_jacobian(SpeciesRate::Creation, DerivVariable::MoleFraction)
    }

    fn creation_rates_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.species_jacobian(SpeciesRate::Creation, DerivVariable::Concentration)
    }

    fn destruction_rates_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.species_jacobian(SpeciesRate::Destruction, DerivVariable::MoleFraction)
    }

    fn destruction_rates_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.species_jacobian(SpeciesRate::Destruction, DerivVariable::Concentration)
    }

    fn net_production_rates_ddx(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.species_jacobian(SpeciesRate::NetProduction, DerivVariable::MoleFraction)
    }

    fn net_production_rates_ddci(&mut self) -> KineticsResult<CscMatrix<f64>> {
        self.species_jacobian(SpeciesRate::NetProduction, DerivVariable::Concentration)
    }
}

/// Direction of a rate-of-progress derivative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RopDirection {
    Forward,
    Reverse,
}

/// Independent variable of a species-resolved derivative matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DerivVariable {
    MoleFraction,
    Concentration,
}

/// Species-level rate family for Jacobian assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SpeciesRate {
    Creation,
    Destruction,
    NetProduction,
}
