//! Ideal-gas reference phase with settable state.

use std::sync::RwLock;

use crate::error::{ThermoError, ThermoResult};
use crate::phase::ThermoPhase;
use crate::species::SpeciesDef;
use kf_core::check_array_size;
use kf_core::units::constants::{GAS_CONSTANT, ONE_ATM};
use kf_core::units::{Pressure, Temperature, k, pa};

/// Mole fractions below this floor are clipped before taking logarithms.
const X_SMALL: f64 = 1e-300;

#[derive(Debug, Clone)]
struct GasState {
    t: f64,
    p: f64,
    x: Vec<f64>,
    stamp: u64,
}

/// Ideal-gas phase over constant-cp species.
///
/// State (T, P, X) lives behind a lock so the phase can be shared between a
/// kinetics manager (reader) and its owning aggregate (writer) without either
/// holding exclusive ownership.
pub struct IdealGasPhase {
    name: String,
    species: Vec<SpeciesDef>,
    names: Vec<String>,
    state: RwLock<GasState>,
}

impl IdealGasPhase {
    /// Create a phase at 300 K, 1 atm, with a uniform composition.
    pub fn new(name: impl Into<String>, species: Vec<SpeciesDef>) -> ThermoResult<Self> {
        if species.is_empty() {
            return Err(ThermoError::InvalidArg {
                what: "phase needs at least one species",
            });
        }
        let names: Vec<String> = species.iter().map(|s| s.name.clone()).collect();
        for (i, n) in names.iter().enumerate() {
            if names[..i].contains(n) {
                return Err(ThermoError::InvalidArg {
                    what: "duplicate species name in phase",
                });
            }
        }
        let n = species.len();
        Ok(Self {
            name: name.into(),
            species,
            names,
            state: RwLock::new(GasState {
                t: 300.0,
                p: ONE_ATM,
                x: vec![1.0 / n as f64; n],
                stamp: 0,
            }),
        })
    }

    /// Set temperature [K], pressure [Pa] and mole fractions.
    ///
    /// Fractions are normalized; every call bumps the state stamp.
    pub fn set_state_tpx(&self, t: f64, p: f64, x: &[f64]) -> ThermoResult<()> {
        if !t.is_finite() || t <= 0.0 {
            return Err(ThermoError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        if !p.is_finite() || p <= 0.0 {
            return Err(ThermoError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        if x.len() != self.species.len() {
            return Err(ThermoError::InvalidArg {
                what: "mole fraction array length mismatch",
            });
        }
        let mut sum = 0.0;
        for &xi in x {
            if !xi.is_finite() || xi < 0.0 {
                return Err(ThermoError::NonPhysical {
                    what: "mole fractions must be finite and non-negative",
                });
            }
            sum += xi;
        }
        if sum <= 0.0 {
            return Err(ThermoError::NonPhysical {
                what: "mole fractions sum to zero",
            });
        }

        let mut state = self.state.write().expect("phase state lock poisoned");
        state.t = t;
        state.p = p;
        state.x = x.iter().map(|xi| xi / sum).collect();
        state.stamp += 1;
        Ok(())
    }

    /// Access to the species records (for inspection).
    pub fn species(&self) -> &[SpeciesDef] {
        &self.species
    }

    fn snapshot(&self) -> GasState {
        self.state.read().expect("phase state lock poisoned").clone()
    }

    fn check_out(&self, out: &[f64]) -> ThermoResult<()> {
        check_array_size("per-species buffer", out.len(), self.species.len())?;
        Ok(())
    }
}

impl ThermoPhase for IdealGasPhase {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_species(&self) -> usize {
        self.species.len()
    }

    fn species_names(&self) -> &[String] {
        &self.names
    }

    fn species_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn temperature(&self) -> Temperature {
        k(self.snapshot().t)
    }

    fn pressure(&self) -> Pressure {
        pa(self.snapshot().p)
    }

    fn molar_concentration(&self) -> f64 {
        let s = self.snapshot();
        s.p / (GAS_CONSTANT * s.t)
    }

    fn standard_concentration(&self) -> f64 {
        let s = self.snapshot();
        ONE_ATM / (GAS_CONSTANT * s.t)
    }

    fn state_stamp(&self) -> u64 {
        self.state.read().expect("phase state lock poisoned").stamp
    }

    fn activity_concentrations(&self, out: &mut [f64]) -> ThermoResult<()> {
        self.check_out(out)?;
        let s = self.snapshot();
        let ctot = s.p / (GAS_CONSTANT * s.t);
        for (o, xi) in out.iter_mut().zip(&s.x) {
            *o = xi * ctot;
        }
        Ok(())
    }

    fn standard_gibbs(&self, out: &mut [f64]) -> ThermoResult<()> {
        self.check_out(out)?;
        let t = self.snapshot().t;
        for (o, sp) in out.iter_mut().zip(&self.species) {
            *o = sp.gibbs_mole(t);
        }
        Ok(())
    }

    fn standard_enthalpies(&self, out: &mut [f64]) -> ThermoResult<()> {
        self.check_out(out)?;
        let t = self.snapshot().t;
        for (o, sp) in out.iter_mut().zip(&self.species) {
            *o = sp.enthalpy_mole(t);
        }
        Ok(())
    }

    fn standard_entropies(&self, out: &mut [f64]) -> ThermoResult<()> {
        self.check_out(out)?;
        let t = self.snapshot().t;
        for (o, sp) in out.iter_mut().zip(&self.species) {
            *o = sp.entropy_mole(t);
        }
        Ok(())
    }

    fn chemical_potentials(&self, out: &mut [f64]) -> ThermoResult<()> {
        self.check_out(out)?;
        let s = self.snapshot();
        let rt = GAS_CONSTANT * s.t;
        for ((o, sp), xi) in out.iter_mut().zip(&self.species).zip(&s.x) {
            *o = sp.gibbs_mole(s.t) + rt * (xi.max(X_SMALL) * s.p / ONE_ATM).ln();
        }
        Ok(())
    }

    fn partial_molar_enthalpies(&self, out: &mut [f64]) -> ThermoResult<()> {
        // Ideal gas: composition-independent
        self.standard_enthalpies(out)
    }

    fn partial_molar_entropies(&self, out: &mut [f64]) -> ThermoResult<()> {
        self.check_out(out)?;
        let s = self.snapshot();
        for ((o, sp), xi) in out.iter_mut().zip(&self.species).zip(&s.x) {
            *o = sp.entropy_mole(s.t)
                - GAS_CONSTANT * (xi.max(X_SMALL) * s.p / ONE_ATM).ln();
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn concentrations_always_sum_to_total(
            fracs in prop::collection::vec(1e-6_f64..1.0, 3),
            t in 200.0_f64..3000.0,
            p in 1e3_f64..1e7,
        ) {
            let gas = IdealGasPhase::new(
                "gas",
                vec![
                    SpeciesDef::new("A", 10.0).unwrap(),
                    SpeciesDef::new("B", 20.0).unwrap(),
                    SpeciesDef::new("C", 30.0).unwrap(),
                ],
            )
            .unwrap();
            gas.set_state_tpx(t, p, &fracs).unwrap();
            let mut c = [0.0; 3];
            gas.activity_concentrations(&mut c).unwrap();
            let sum: f64 = c.iter().sum();
            let ctot = gas.molar_concentration();
            prop_assert!((sum - ctot).abs() <= 1e-9 * ctot.abs());
        }
    }
}
