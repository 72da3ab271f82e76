//! Network input errors.

use pf_core::PfError;
use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("Duplicate index {index} in table {table}")]
    DuplicateIndex { table: &'static str, index: usize },

    #[error("Element {element} of table {table} references unknown junction {junction}")]
    UnknownJunction {
        table: &'static str,
        element: usize,
        junction: usize,
    },

    #[error("Element {element} of table {table}: {what}")]
    InvalidParameter {
        table: &'static str,
        element: usize,
        what: &'static str,
    },
}

impl From<NetError> for PfError {
    fn from(err: NetError) -> Self {
        PfError::InvalidArg {
            what: err.to_string(),
        }
    }
}
