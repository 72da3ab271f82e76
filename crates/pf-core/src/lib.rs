//! pf-core: stable foundation for pipeflow.
//!
//! Contains:
//! - units (uom SI types + constructors, bar/kelvin conversions)
//! - numeric (Real + the mean norm used by convergence checks)
//! - constants (gravity, normal conditions, pressure conversion)
//! - error (shared error types)

pub mod constants;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PfError, PfResult};
pub use numeric::*;
pub use units::*;
