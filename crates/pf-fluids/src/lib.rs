//! pf-fluids: fluid property provision for pipeflow.
//!
//! The solver treats fluid properties as a black box behind the
//! [`FluidProvider`] trait. This crate ships one implementation, [`Fluid`],
//! that is built from simple property laws (constant, linear, or tabulated
//! with linear inter-/extrapolation) and two presets: liquid water and a
//! high-calorific natural gas.
//!
//! # Example
//!
//! ```
//! use pf_fluids::{Fluid, FluidProvider};
//!
//! let water = Fluid::water();
//! assert!(!water.is_gas());
//! let rho = water.density(293.15);
//! assert!(rho > 990.0 && rho < 1000.0);
//! ```

pub mod error;
pub mod fluid;
pub mod property;
pub mod provider;

// Re-exports for ergonomics
pub use error::{FluidError, FluidResult};
pub use fluid::{Fluid, Phase};
pub use property::FluidProperty;
pub use provider::FluidProvider;
