//! Per-network solver context.

use pf_components::{ComponentRegistry, ResultContext, ResultTable};
use pf_net::Net;
use pf_pit::{Lookups, Pit};
use tracing::warn;

use crate::error::{SolverError, SolverResult};
use crate::options::{OptionsOverride, PipeflowOptions};
use crate::pipeflow::{PipeflowState, SolveReport, run_pipeflow};

/// Holds the registry, the stored user options and the pits of the last
/// successful run of one network.
///
/// ```no_run
/// use pf_solver::{OptionsOverride, PipeflowContext, SolveMode};
/// # fn demo(net: &pf_net::Net) -> pf_solver::SolverResult<()> {
/// let mut ctx = PipeflowContext::new();
/// ctx.pipeflow(net, &OptionsOverride::default().mode(SolveMode::Sequential))?;
/// let junctions = ctx.result(net, "junction")?;
/// # let _ = junctions;
/// # Ok(())
/// # }
/// ```
pub struct PipeflowContext {
    registry: ComponentRegistry,
    user_options: OptionsOverride,
    options: PipeflowOptions,
    state: Option<PipeflowState>,
    report: SolveReport,
}

impl Default for PipeflowContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PipeflowContext {
    pub fn new() -> Self {
        Self::with_registry(ComponentRegistry::standard())
    }

    pub fn with_registry(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            user_options: OptionsOverride::default(),
            options: PipeflowOptions::default(),
            state: None,
            report: SolveReport::default(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Options applied to every later run, below the per-call overrides.
    pub fn set_user_options(&mut self, options: OptionsOverride) {
        self.user_options = options;
    }

    pub fn user_options(&self) -> &OptionsOverride {
        &self.user_options
    }

    /// Options of the last run.
    pub fn options(&self) -> &PipeflowOptions {
        &self.options
    }

    /// Solve the network.
    ///
    /// On failure the previous results are discarded, so no partial solution
    /// can be read afterwards.
    pub fn pipeflow(&mut self, net: &Net, overrides: &OptionsOverride) -> SolverResult<&SolveReport> {
        let layered = PipeflowOptions::default().layered(&self.user_options.merged(overrides));
        match run_pipeflow(net, &self.registry, &layered, self.state.as_ref()) {
            Ok((state, report)) => {
                self.options = layered;
                self.state = Some(state);
                self.report = report;
                Ok(&self.report)
            }
            Err(err) => {
                warn!(error = %err, "pipeflow failed");
                self.options = layered;
                self.state = None;
                self.report = SolveReport {
                    mode: self.options.mode.normalized(),
                    ..SolveReport::default()
                };
                Err(err)
            }
        }
    }

    pub fn report(&self) -> &SolveReport {
        &self.report
    }

    pub fn state(&self) -> Option<&PipeflowState> {
        self.state.as_ref()
    }

    pub fn node_pit(&self) -> Option<&Pit> {
        self.state.as_ref().map(|s| &s.node)
    }

    pub fn branch_pit(&self) -> Option<&Pit> {
        self.state.as_ref().map(|s| &s.branch)
    }

    pub fn lookups(&self) -> Option<&Lookups> {
        self.state.as_ref().map(|s| &s.lookups)
    }

    /// Result tables of all components, in registry order.
    pub fn results(&self, net: &Net) -> SolverResult<Vec<ResultTable>> {
        let state = self.solved()?;
        let ctx = ResultContext {
            net,
            lookups: &state.lookups,
            node: &state.node,
            branch: &state.branch,
            hydraulics: state.hydraulics.as_ref(),
            heat: state.heat.as_ref(),
        };
        let mut tables = Vec::new();
        for c in self.registry.iter() {
            if let Some(table) = c.extract_results(&ctx)? {
                tables.push(table);
            }
        }
        Ok(tables)
    }

    /// Result table of one element table.
    pub fn result(&self, net: &Net, table: &str) -> SolverResult<ResultTable> {
        let state = self.solved()?;
        let component = self.registry.get(table).ok_or_else(|| SolverError::ProblemSetup {
            what: format!("no component is registered for table {table}"),
        })?;
        let ctx = ResultContext {
            net,
            lookups: &state.lookups,
            node: &state.node,
            branch: &state.branch,
            hydraulics: state.hydraulics.as_ref(),
            heat: state.heat.as_ref(),
        };
        component
            .extract_results(&ctx)?
            .ok_or_else(|| SolverError::ProblemSetup {
                what: format!("table {table} has no results"),
            })
    }

    fn solved(&self) -> SolverResult<&PipeflowState> {
        self.state.as_ref().ok_or_else(|| SolverError::InvalidState {
            what: "no successful pipeflow has been run".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_need_a_solved_network() {
        let ctx = PipeflowContext::new();
        let net = Net::new("empty");
        assert!(matches!(ctx.results(&net), Err(SolverError::InvalidState { .. })));
        assert!(ctx.node_pit().is_none());
        assert!(!ctx.report().converged);
    }

    #[test]
    fn failed_run_clears_state() {
        let mut ctx = PipeflowContext::new();
        let net = Net::new("no fluid");
        let err = ctx.pipeflow(&net, &OptionsOverride::default()).unwrap_err();
        assert!(matches!(err, SolverError::ProblemSetup { .. }));
        assert!(ctx.state().is_none());
    }
}
