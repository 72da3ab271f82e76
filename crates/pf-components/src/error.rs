//! Error types for component contributions.

use pf_core::PfError;
use pf_pit::PitError;
use thiserror::Error;

/// Errors raised while filling pits, applying overrides or extracting results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Element {element} of table {table} references junction {junction} without pit row")]
    UnknownJunction {
        table: &'static str,
        element: usize,
        junction: usize,
    },

    #[error("Table {name} has no rows in the pit lookups")]
    MissingTable { name: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error(transparent)]
    Pit(#[from] PitError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for PfError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::Pit(inner) => inner.into(),
            other => PfError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}
