//! Error types for pipeflow runs.

use pf_components::ComponentError;
use pf_core::PfError;
use pf_net::NetError;
use pf_pit::PitError;
use thiserror::Error;

/// Errors that abort a pipeflow run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The run cannot produce a solution; no results are written.
    #[error("Pipeflow did not converge: {what}")]
    NotConverged { what: String },

    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Internal table error: {0}")]
    Pit(PitError),

    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// True for the distinguished "not converged" failure.
    pub fn is_not_converged(&self) -> bool {
        matches!(self, SolverError::NotConverged { .. })
    }
}

impl From<PitError> for SolverError {
    fn from(err: PitError) -> Self {
        match err {
            PitError::NoSupply { mode } => SolverError::NotConverged {
                what: format!(
                    "no node is connected to a slack in the {mode} calculation. \
                     Have you forgotten to define an external grid?"
                ),
            },
            other => SolverError::Pit(other),
        }
    }
}

impl From<SolverError> for PfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Component(inner) => inner.into(),
            SolverError::Pit(inner) => inner.into(),
            SolverError::Net(inner) => inner.into(),
            SolverError::InvalidState { what } => PfError::Invariant { what },
            other => PfError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_supply_is_not_converged() {
        let err: SolverError = PitError::NoSupply { mode: "hydraulics" }.into();
        assert!(err.is_not_converged());
        assert!(err.to_string().contains("external grid"));
    }

    #[test]
    fn symmetry_violation_stays_internal() {
        let err: SolverError = PitError::ConnectivitySymmetry { mode: "hydraulics" }.into();
        assert!(!err.is_not_converged());
        let pf: PfError = err.into();
        assert!(matches!(pf, PfError::Invariant { .. }));
    }
}
