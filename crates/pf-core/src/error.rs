use thiserror::Error;

pub type PfResult<T> = Result<T, PfError>;

/// Crate-agnostic error every layer of the pipeflow stack converts into.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PfError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}
