//! Error types for thermodynamic property evaluation.

use kf_core::KfError;
use thiserror::Error;

/// Errors that can occur in phase construction or property evaluation.
#[derive(Error, Debug)]
pub enum ThermoError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Unknown species '{name}' in phase '{phase}'")]
    UnknownSpecies { name: String, phase: String },

    #[error("Core error: {0}")]
    Core(#[from] KfError),
}

pub type ThermoResult<T> = Result<T, ThermoError>;
