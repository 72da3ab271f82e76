//! Fluid property errors.

use pf_core::PfError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur while building or loading fluid definitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative density, viscosity, ...).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Malformed property table.
    #[error("Invalid property table for {what}: {reason}")]
    InvalidTable { what: &'static str, reason: String },

    /// Gas fluids need a compressibility law.
    #[error("Fluid {name} is a gas but has no compressibility")]
    MissingCompressibility { name: String },

    /// Definition file could not be parsed.
    #[error("Failed to parse fluid definition: {message}")]
    Parse { message: String },
}

impl From<FluidError> for PfError {
    fn from(err: FluidError) -> Self {
        PfError::InvalidArg {
            what: format!("fluid: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FluidError::NonPhysical { what: "density" };
        assert!(err.to_string().contains("density"));
    }

    #[test]
    fn error_to_pf_error() {
        let fluid_err = FluidError::MissingCompressibility {
            name: "lgas".into(),
        };
        let pf_err: PfError = fluid_err.into();
        assert!(matches!(pf_err, PfError::InvalidArg { .. }));
    }
}
