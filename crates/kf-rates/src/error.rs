//! Error types for rate-expression handling.

use thiserror::Error;

/// Errors that can occur when building or batching rate expressions.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Invalid rate parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("Rate type mismatch: group holds '{expected}', got '{got}'")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Reaction {index} is not a member of this rate group")]
    UnknownReaction { index: usize },
}

pub type RateResult<T> = Result<T, RateError>;
