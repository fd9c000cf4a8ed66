//! Chemical species records.

use crate::error::{ThermoError, ThermoResult};
use kf_core::units::constants::{GAS_CONSTANT, T_REF};

/// A chemical species with constant-cp reference thermodynamics.
///
/// Reference properties are taken at 298.15 K and one standard atmosphere.
/// The constant heat capacity keeps the ideal-gas phase model closed-form;
/// polynomial-fit backends live outside this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesDef {
    /// Species name, e.g. "H2O"
    pub name: String,
    /// Molar mass [kg/kmol]
    pub molar_mass: f64,
    /// Molar heat capacity at constant pressure [J/(kmol·K)]
    pub cp_mole: f64,
    /// Molar enthalpy of formation at 298.15 K [J/kmol]
    pub h298: f64,
    /// Standard molar entropy at 298.15 K [J/(kmol·K)]
    pub s298: f64,
}

impl SpeciesDef {
    /// Create a species with default (diatomic-like) reference thermo.
    pub fn new(name: impl Into<String>, molar_mass: f64) -> ThermoResult<Self> {
        if !molar_mass.is_finite() || molar_mass <= 0.0 {
            return Err(ThermoError::NonPhysical {
                what: "molar mass must be positive and finite",
            });
        }
        Ok(Self {
            name: name.into(),
            molar_mass,
            cp_mole: 3.5 * GAS_CONSTANT,
            h298: 0.0,
            s298: 0.0,
        })
    }

    /// Override the reference thermo (cp [J/kmol/K], h298 [J/kmol], s298 [J/kmol/K]).
    pub fn with_thermo(mut self, cp_mole: f64, h298: f64, s298: f64) -> ThermoResult<Self> {
        if !cp_mole.is_finite() || cp_mole <= 0.0 {
            return Err(ThermoError::NonPhysical {
                what: "cp must be positive and finite",
            });
        }
        if !h298.is_finite() || !s298.is_finite() {
            return Err(ThermoError::NonPhysical {
                what: "reference enthalpy/entropy must be finite",
            });
        }
        self.cp_mole = cp_mole;
        self.h298 = h298;
        self.s298 = s298;
        Ok(self)
    }

    /// Standard-state molar enthalpy at temperature `t` [J/kmol].
    pub fn enthalpy_mole(&self, t: f64) -> f64 {
        self.h298 + self.cp_mole * (t - T_REF)
    }

    /// Standard-state molar entropy at temperature `t` [J/(kmol·K)].
    pub fn entropy_mole(&self, t: f64) -> f64 {
        self.s298 + self.cp_mole * (t / T_REF).ln()
    }

    /// Standard-state molar Gibbs energy at temperature `t` [J/kmol].
    pub fn gibbs_mole(&self, t: f64) -> f64 {
        self.enthalpy_mole(t) - t * self.entropy_mole(t)
    }
}
