//! Pit construction and connectivity errors.

use pf_core::PfError;
use thiserror::Error;

pub type PitResult<T> = Result<T, PitError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PitError {
    #[error("Connectivity of from and to nodes differs for active branches in mode {mode}")]
    ConnectivitySymmetry { mode: &'static str },

    #[error("Out of service nodes are connected to slack nodes in mode {mode}: {nodes}")]
    InconsistentConnectivity { mode: &'static str, nodes: String },

    #[error("No node is connected to a slack node in mode {mode}")]
    NoSupply { mode: &'static str },

    #[error("Table {name} is not registered")]
    UnknownTable { name: String },

    #[error("Table {name} is already registered")]
    DuplicateTable { name: String },

    #[error("Shape mismatch for {what}: expected {expected}, got {got}")]
    Shape {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}

impl From<PitError> for PfError {
    fn from(err: PitError) -> Self {
        PfError::Invariant {
            what: err.to_string(),
        }
    }
}
