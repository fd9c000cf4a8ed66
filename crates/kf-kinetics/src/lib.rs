//! kf-kinetics: the kinetics manager for kinflow.
//!
//! Provides:
//! - Reaction records with third-body specifications
//! - PhaseIndex: flat species indexing across phases
//! - StoichCoeffs: sparse stoichiometry matrices
//! - Duplicate-reaction detection with configurable handling
//! - ValueCache: memoized per-state evaluation results
//! - Derivative engine (T/P/C vectors, sparse X/Ci Jacobians)
//! - The Kinetics trait and the BulkKinetics manager
//!
//! # Architecture
//!
//! A kinetics manager computes rates of progress, species production rates
//! and their derivatives for one mechanism. Reactions are batched by
//! rate-expression type so shared temperature terms are evaluated once per
//! pass; rate-of-progress vectors become species source terms through sparse
//! stoichiometric matrices. Thermodynamic state is read from `ThermoPhase`
//! collaborators that the owning caller mutates between evaluations.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kf_kinetics::{BulkKinetics, Kinetics, Reaction};
//! use kf_rates::ArrheniusRate;
//! use kf_thermo::{IdealGasPhase, SpeciesDef};
//!
//! let gas = Arc::new(IdealGasPhase::new(
//!     "gas",
//!     vec![
//!         SpeciesDef::new("H2", 2.016).unwrap(),
//!         SpeciesDef::new("O2", 31.999).unwrap(),
//!         SpeciesDef::new("H2O", 18.015).unwrap(),
//!     ],
//! ).unwrap());
//!
//! let mut kin = BulkKinetics::new();
//! kin.add_phase(gas.clone()).unwrap();
//! kin.add_reaction(
//!     Reaction::new(
//!         &[("H2", 2.0), ("O2", 1.0)],
//!         &[("H2O", 2.0)],
//!         Box::new(ArrheniusRate::new(1.0e8, 0.0, 8.0e7)),
//!     ).unwrap(),
//!     true,
//! ).unwrap();
//!
//! let mut wdot = vec![0.0; kin.n_total_species()];
//! kin.net_production_rates(&mut wdot).unwrap();
//! ```

pub mod cache;
pub mod deriv;
pub mod duplicates;
pub mod error;
pub mod index;
pub mod kinetics;
pub mod reaction;
pub mod stoich;

// Re-exports for ergonomics
pub use cache::ValueCache;
pub use deriv::DerivativeSettings;
pub use duplicates::{ThirdBodyDuplicateHandling, check_duplicate_stoich};
pub use error::{KineticsError, KineticsResult};
pub use index::PhaseIndex;
pub use kinetics::{BulkKinetics, CallbackId, Kinetics, RootAggregate};
pub use reaction::{Reaction, ThirdBody};
pub use stoich::{StoichCoeffs, StoichSide};
