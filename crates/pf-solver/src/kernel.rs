//! Derivative kernels: how the per-branch equations are evaluated.
//!
//! Both kernels call the same scalar functions per branch and only differ in
//! scheduling, so their results are identical.

use rayon::prelude::*;

use crate::derivatives::{
    FlowEquations, HydraulicInput, HydraulicOutput, ThermalInput, ThermalOutput, hydraulic_branch,
    thermal_branch,
};
use crate::error::SolverResult;

pub trait DerivativeKernel: Send + Sync {
    fn name(&self) -> &'static str;

    fn hydraulic(
        &self,
        inputs: &[HydraulicInput],
        eq: &FlowEquations<'_>,
    ) -> SolverResult<Vec<HydraulicOutput>>;

    fn thermal(&self, inputs: &[ThermalInput]) -> Vec<ThermalOutput>;
}

/// Reference kernel, one branch after the other.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialKernel;

impl DerivativeKernel for SerialKernel {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn hydraulic(
        &self,
        inputs: &[HydraulicInput],
        eq: &FlowEquations<'_>,
    ) -> SolverResult<Vec<HydraulicOutput>> {
        inputs.iter().map(|i| hydraulic_branch(i, eq)).collect()
    }

    fn thermal(&self, inputs: &[ThermalInput]) -> Vec<ThermalOutput> {
        inputs.iter().map(thermal_branch).collect()
    }
}

/// Branches evaluated on the rayon pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelKernel;

impl DerivativeKernel for ParallelKernel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn hydraulic(
        &self,
        inputs: &[HydraulicInput],
        eq: &FlowEquations<'_>,
    ) -> SolverResult<Vec<HydraulicOutput>> {
        inputs.par_iter().map(|i| hydraulic_branch(i, eq)).collect()
    }

    fn thermal(&self, inputs: &[ThermalInput]) -> Vec<ThermalOutput> {
        inputs.par_iter().map(thermal_branch).collect()
    }
}

/// Kernel for the `use_parallel_kernels` option.
pub fn select_kernel(parallel: bool) -> Box<dyn DerivativeKernel> {
    if parallel {
        Box::new(ParallelKernel)
    } else {
        Box::new(SerialKernel)
    }
}
