//! kf-thermo: thermodynamic property collaborator for kinflow.
//!
//! Provides:
//! - Species records (name, molar mass, constant-cp reference thermo)
//! - ThermoPhase trait: the read-only property interface the kinetics
//!   manager consumes (temperature, pressure, activity concentrations,
//!   standard-state and mixture molar properties)
//! - IdealGasPhase: reference implementation with a settable state
//!
//! # Architecture
//!
//! This crate defines a stable API (`ThermoPhase` trait) that isolates the
//! kinetics layer from property backends. The in-tree `IdealGasPhase` covers
//! testing and simple gas-phase work; real-fluid or surface-phase backends
//! implement the same trait externally.

pub mod error;
pub mod ideal_gas;
pub mod phase;
pub mod species;

// Re-exports for ergonomics
pub use error::{ThermoError, ThermoResult};
pub use ideal_gas::IdealGasPhase;
pub use phase::ThermoPhase;
pub use species::SpeciesDef;
