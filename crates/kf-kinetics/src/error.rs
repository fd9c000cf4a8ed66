//! Error types for kinetics-manager operations.

use kf_core::KfError;
use kf_rates::RateError;
use kf_thermo::ThermoError;
use thiserror::Error;

/// Errors raised by a kinetics manager.
#[derive(Error, Debug)]
pub enum KineticsError {
    #[error(transparent)]
    Core(#[from] KfError),

    #[error("Thermo error: {0}")]
    Thermo(#[from] ThermoError),

    #[error("Rate error: {0}")]
    Rate(#[from] RateError),

    #[error("Operation '{operation}' not implemented for kinetics type '{kinetics_type}'")]
    NotImplemented {
        operation: &'static str,
        kinetics_type: &'static str,
    },

    #[error("Undeclared species '{species}' in reaction '{equation}'")]
    UndeclaredSpecies { species: String, equation: String },

    #[error("Undeclared third-body collider '{species}' in reaction '{equation}'")]
    UndeclaredThirdBody { species: String, equation: String },

    #[error("Duplicate reaction conflict: {what} (reactions {first} and {second})")]
    DuplicateConflict {
        what: &'static str,
        first: usize,
        second: usize,
    },

    #[error("Reaction {index} marked duplicate has no matching reaction: {equation}")]
    UnmatchedDuplicate { index: usize, equation: String },

    #[error("Invalid reaction: {what}")]
    InvalidReaction { what: &'static str },

    #[error("Invalid derivative settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Invalid operation: {what}")]
    InvalidOperation { what: &'static str },
}

pub type KineticsResult<T> = Result<T, KineticsError>;

pub(crate) fn not_implemented(
    operation: &'static str,
    kinetics_type: &'static str,
) -> KineticsError {
    KineticsError::NotImplemented {
        operation,
        kinetics_type,
    }
}
