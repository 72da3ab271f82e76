//! Mode orchestration of one pipeflow run.
//!
//! A run builds fresh pits from the network, then for each mode derives the
//! connectivity, reduces the pits, iterates on the reduced view and scatters
//! the solution back. Rows outside the connectivity keep NaN.

use pf_components::ComponentRegistry;
use pf_core::numeric::mean_norm;
use pf_fluids::FluidProvider;
use pf_net::Net;
use pf_pit::columns::{branch, node};
use pf_pit::{Connectivity, Lookups, Pit, heat_connectivity, hydraulic_connectivity, reduce_pit, scatter_back};
use tracing::{debug, info, info_span};

use crate::derivatives::FlowEquations;
use crate::error::{SolverError, SolverResult};
use crate::heat::HeatSystem;
use crate::hydraulics::HydraulicSystem;
use crate::kernel::{DerivativeKernel, select_kernel};
use crate::linear::{LinearSolver, select_linear_solver};
use crate::newton::{NewtonConfig, NewtonResult, newton_solve};
use crate::options::{PipeflowOptions, SolveMode};
use crate::setup::{check_indices, create_lookups, ensure_nodes, initialize_pit};

/// Full pits and lookups of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeflowState {
    pub lookups: Lookups,
    pub node: Pit,
    pub branch: Pit,
    /// Connectivity of the last hydraulic calculation.
    pub hydraulics: Option<Connectivity>,
    /// Connectivity of the last thermal calculation.
    pub heat: Option<Connectivity>,
}

/// Iteration summary of one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeReport {
    pub iterations: usize,
    pub residual_norm: f64,
    pub alpha: f64,
    pub converged: bool,
}

impl From<&NewtonResult> for ModeReport {
    fn from(r: &NewtonResult) -> Self {
        Self {
            iterations: r.iterations,
            residual_norm: r.residual_norm,
            alpha: r.alpha,
            converged: r.converged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolveReport {
    pub mode: SolveMode,
    pub hydraulics: Option<ModeReport>,
    pub heat: Option<ModeReport>,
    /// Outer passes of the bidirectional mode.
    pub bidirectional_iterations: usize,
    pub converged: bool,
}

struct Engine<'a> {
    net: &'a Net,
    registry: &'a ComponentRegistry,
    fluid: &'a dyn FluidProvider,
    options: &'a PipeflowOptions,
    kernel: Box<dyn DerivativeKernel>,
    linear: Box<dyn LinearSolver>,
}

impl Engine<'_> {
    fn config(&self, max_iterations: usize) -> NewtonConfig {
        NewtonConfig {
            max_iterations,
            alpha: self.options.alpha,
            method: self.options.nonlinear_method,
            criterion: self.options.convergence_criterion,
            tol_res: self.options.tol_res,
        }
    }

    fn hydraulics(&self, state: &mut PipeflowState) -> SolverResult<NewtonResult> {
        let opts = self.options.connectivity_options();
        let conn = hydraulic_connectivity(&state.node, &state.branch, &state.lookups, &opts)?;
        let mut view = reduce_pit(&state.node, &state.branch, &conn, &state.lookups)?;
        debug!(
            nodes = view.node.rows(),
            branches = view.branch.rows(),
            "reduced hydraulic system"
        );
        let eq = FlowEquations {
            fluid: self.fluid,
            friction_model: self.options.friction_model,
            max_iter_colebrook: self.options.max_iter_colebrook,
        };
        let result = {
            let mut system = HydraulicSystem::new(
                self.net,
                self.registry,
                &mut view,
                eq,
                self.kernel.as_ref(),
                self.options.tol_p,
                self.options.tol_m,
            );
            newton_solve(&mut system, self.linear.as_ref(), &self.config(self.options.max_iter_hyd))?
        };
        scatter_back(&view, &mut state.node, &mut state.branch);
        state.hydraulics = Some(conn);
        info!(
            iterations = result.iterations,
            residual_norm = result.residual_norm,
            "hydraulic calculation converged"
        );
        Ok(result)
    }

    fn heat(&self, state: &mut PipeflowState) -> SolverResult<NewtonResult> {
        let hydraulics = state.hydraulics.as_ref().ok_or_else(|| SolverError::InvalidState {
            what: "the heat transfer calculation needs a hydraulic solution".into(),
        })?;
        let opts = self.options.connectivity_options();
        let conn = heat_connectivity(&state.node, &state.branch, hydraulics, &state.lookups, &opts)?;
        let mut view = reduce_pit(&state.node, &state.branch, &conn, &state.lookups)?;
        let result = {
            let mut system = HeatSystem::new(
                self.net,
                self.registry,
                &mut view,
                self.fluid,
                self.kernel.as_ref(),
                self.options.tol_t,
            );
            newton_solve(&mut system, self.linear.as_ref(), &self.config(self.options.max_iter_therm))?
        };
        scatter_back(&view, &mut state.node, &mut state.branch);
        state.heat = Some(conn);
        info!(
            iterations = result.iterations,
            residual_norm = result.residual_norm,
            "heat transfer calculation converged"
        );
        Ok(result)
    }

    /// Alternate both calculations until a pass leaves pressures and
    /// temperatures unchanged within `tol_p` and `tol_t`.
    fn bidirectional(&self, state: &mut PipeflowState, report: &mut SolveReport) -> SolverResult<()> {
        for pass in 1..=self.options.max_iter_bidirect {
            let p_before = state.node.column(node::PINIT);
            let t_before = state.node.column(node::TINIT);

            let hyd = self.hydraulics(state)?;
            let heat = self.heat(state)?;
            report.hydraulics = Some(ModeReport::from(&hyd));
            report.heat = Some(ModeReport::from(&heat));
            report.bidirectional_iterations = pass;

            let connected = state.hydraulics.as_ref().map(|c| c.nodes.as_slice()).unwrap_or(&[]);
            let dp = masked_change(&p_before, &state.node.column(node::PINIT), connected);
            let dt = masked_change(&t_before, &state.node.column(node::TINIT), connected);
            debug!(pass, dp, dt, "bidirectional pass");
            if dp <= self.options.tol_p && dt <= self.options.tol_t {
                info!(passes = pass, "bidirectional calculation converged");
                return Ok(());
            }
        }
        Err(SolverError::NotConverged {
            what: format!(
                "the bidirectional calculation did not converge within {} iterations",
                self.options.max_iter_bidirect
            ),
        })
    }
}

/// Mean norm of the change over connected rows; a NaN start counts as a
/// full change.
fn masked_change(before: &[f64], after: &[f64], connected: &[bool]) -> f64 {
    let diffs = before
        .iter()
        .zip(after)
        .zip(connected)
        .filter(|&(_, &c)| c)
        .map(|((&b, &a), _)| if b.is_finite() { a - b } else { a });
    mean_norm(diffs)
}

/// Take pressures and mass flows of a previous hydraulic run.
fn adopt_hydraulics(state: &mut PipeflowState, previous: Option<&PipeflowState>) -> SolverResult<()> {
    let Some(prev) = previous else {
        return Err(SolverError::InvalidState {
            what: "heat mode needs a previous hydraulic calculation of this network".into(),
        });
    };
    let Some(conn) = prev.hydraulics.as_ref() else {
        return Err(SolverError::InvalidState {
            what: "the previous calculation has no hydraulic solution".into(),
        });
    };
    if prev.lookups != state.lookups
        || prev.node.rows() != state.node.rows()
        || prev.branch.rows() != state.branch.rows()
    {
        return Err(SolverError::InvalidState {
            what: "the network changed since the last hydraulic calculation".into(),
        });
    }
    for r in 0..state.node.rows() {
        state.node.set(r, node::PINIT, prev.node.get(r, node::PINIT));
        state.node.set(r, node::MDOTSLACKINIT, prev.node.get(r, node::MDOTSLACKINIT));
        state.node.set(r, node::RHO, prev.node.get(r, node::RHO));
    }
    for r in 0..state.branch.rows() {
        for col in [branch::MDOTINIT, branch::RE, branch::LAMBDA, branch::RHO, branch::ETA] {
            state.branch.set(r, col, prev.branch.get(r, col));
        }
    }
    state.hydraulics = Some(conn.clone());
    Ok(())
}

/// Run one pipeflow with fully layered options.
///
/// `previous` is the state of the last successful run on the same network;
/// only the heat mode reads it.
pub fn run_pipeflow(
    net: &Net,
    registry: &ComponentRegistry,
    options: &PipeflowOptions,
    previous: Option<&PipeflowState>,
) -> SolverResult<(PipeflowState, SolveReport)> {
    options.validate()?;
    let mode = options.mode.normalized();
    let span = info_span!("pipeflow", mode = mode.name());
    let _guard = span.enter();

    let fluid = net.fluid.clone().ok_or_else(|| SolverError::ProblemSetup {
        what: "the network has no fluid".into(),
    })?;
    net.validate()?;
    check_indices(net);

    let lookups = create_lookups(net, registry)?;
    ensure_nodes(&lookups)?;
    let settings = options.component_settings();
    let (node_pit, branch_pit) = initialize_pit(net, fluid.as_ref(), registry, &settings, &lookups)?;
    let mut state = PipeflowState {
        lookups,
        node: node_pit,
        branch: branch_pit,
        hydraulics: None,
        heat: None,
    };

    let engine = Engine {
        net,
        registry,
        fluid: fluid.as_ref(),
        options,
        kernel: select_kernel(options.use_parallel_kernels),
        linear: select_linear_solver(options.linear_solver),
    };
    debug!(
        kernel = engine.kernel.name(),
        linear_solver = engine.linear.name(),
        "solver strategies"
    );

    let mut report = SolveReport {
        mode,
        ..SolveReport::default()
    };
    match mode {
        SolveMode::Hydraulics => {
            report.hydraulics = Some(ModeReport::from(&engine.hydraulics(&mut state)?));
        }
        SolveMode::Heat => {
            adopt_hydraulics(&mut state, previous)?;
            report.heat = Some(ModeReport::from(&engine.heat(&mut state)?));
        }
        SolveMode::Sequential | SolveMode::All => {
            report.hydraulics = Some(ModeReport::from(&engine.hydraulics(&mut state)?));
            report.heat = Some(ModeReport::from(&engine.heat(&mut state)?));
        }
        SolveMode::Bidirectional => engine.bidirectional(&mut state, &mut report)?,
    }
    report.converged = true;
    Ok((state, report))
}
