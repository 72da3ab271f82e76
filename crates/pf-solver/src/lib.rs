//! Steady-state pipeflow solver for pipe networks.
//!
//! Builds the internal node and branch tables from a [`pf_net::Net`], derives
//! the connected part of the network per mode and solves the hydraulic
//! (pressures, mass flows) and thermal (temperatures) equations with a damped
//! Newton iteration on a sparse Jacobian.
//!
//! [`PipeflowContext`] is the entry point; it keeps the stored options, the
//! component registry and the pits of the last successful run.

pub mod context;
pub mod derivatives;
pub mod error;
pub mod friction;
pub mod heat;
pub mod hydraulics;
pub mod kernel;
pub mod linear;
pub mod newton;
pub mod options;
pub mod pipeflow;
pub mod setup;
pub mod system;

pub use context::PipeflowContext;
pub use error::{SolverError, SolverResult};
pub use kernel::{DerivativeKernel, ParallelKernel, SerialKernel, select_kernel};
pub use linear::{DenseLu, LinearSolver, SparseLu, select_linear_solver};
pub use newton::{NewtonConfig, NewtonResult};
pub use options::{
    ConvergenceCriterion, FrictionModel, LinearSolverKind, NonlinearMethod, OptionsOverride,
    PipeflowOptions, SolveMode,
};
pub use pipeflow::{ModeReport, PipeflowState, SolveReport, run_pipeflow};
