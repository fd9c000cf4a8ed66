use thiserror::Error;

pub type KfResult<T> = Result<T, KfError>;

#[derive(Error, Debug)]
pub enum KfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Array too small for {what}: got {got}, need at least {need}")]
    ArraySize {
        what: &'static str,
        got: usize,
        need: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}

/// Check that `index < len`, reporting `what` on failure.
pub fn check_index(what: &'static str, index: usize, len: usize) -> KfResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(KfError::IndexOob { what, index, len })
    }
}

/// Check that a bulk array argument holds at least `need` entries.
pub fn check_array_size(what: &'static str, got: usize, need: usize) -> KfResult<()> {
    if got >= need {
        Ok(())
    } else {
        Err(KfError::ArraySize { what, got, need })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_check_boundaries() {
        assert!(check_index("reaction", 0, 1).is_ok());
        assert!(check_index("reaction", 1, 1).is_err());
        assert!(check_index("reaction", 0, 0).is_err());
    }

    #[test]
    fn array_size_check() {
        assert!(check_array_size("wdot", 5, 5).is_ok());
        assert!(check_array_size("wdot", 6, 5).is_ok());
        let err = check_array_size("wdot", 4, 5).unwrap_err();
        assert!(format!("{err}").contains("wdot"));
    }
}
