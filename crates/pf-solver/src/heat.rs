//! Thermal Newton system on a reduced view.

use pf_components::ComponentRegistry;
use pf_fluids::FluidProvider;
use pf_net::Net;
use pf_pit::columns::{branch, node};
use pf_pit::{Mode, ReducedView};

use crate::derivatives::{calculate_derivatives_thermal, check_infeed_number, update_fluid_properties};
use crate::error::SolverResult;
use crate::kernel::DerivativeKernel;
use crate::newton::{Change, NewtonSystem};
use crate::system::{LinearSystem, ThermalLayout, assemble_thermal};

pub struct HeatSystem<'a> {
    net: &'a Net,
    registry: &'a ComponentRegistry,
    view: &'a mut ReducedView,
    fluid: &'a dyn FluidProvider,
    kernel: &'a dyn DerivativeKernel,
    layout: ThermalLayout,
    tol_t: f64,
    infeed_checked: bool,
}

impl<'a> HeatSystem<'a> {
    pub fn new(
        net: &'a Net,
        registry: &'a ComponentRegistry,
        view: &'a mut ReducedView,
        fluid: &'a dyn FluidProvider,
        kernel: &'a dyn DerivativeKernel,
        tol_t: f64,
    ) -> Self {
        let layout = ThermalLayout::new(&view.node, &view.branch);
        Self {
            net,
            registry,
            view,
            fluid,
            kernel,
            layout,
            tol_t,
            infeed_checked: false,
        }
    }

    fn evaluate(&mut self) -> SolverResult<()> {
        calculate_derivatives_thermal(
            &mut self.view.node,
            &mut self.view.branch,
            self.fluid,
            self.kernel,
        );
        if !self.infeed_checked {
            check_infeed_number(&mut self.view.node);
            self.infeed_checked = true;
        }
        for c in self.registry.iter() {
            c.adaption_after_derivatives_thermal(self.net, self.view)?;
        }
        Ok(())
    }
}

impl NewtonSystem for HeatSystem<'_> {
    fn mode(&self) -> Mode {
        Mode::HeatTransfer
    }

    fn assemble(&mut self) -> SolverResult<LinearSystem> {
        self.evaluate()?;
        Ok(assemble_thermal(&self.view.node, &self.view.branch, &self.layout))
    }

    fn apply(&mut self, dx: &[f64], alpha: f64) -> Vec<Change> {
        let layout = self.layout;
        let node_pit = &mut self.view.node;
        let branch_pit = &mut self.view.branch;

        let mut dt = Vec::with_capacity(layout.n_nodes);
        let mut t = Vec::with_capacity(layout.n_nodes);
        for r in 0..layout.n_nodes {
            let step = alpha * dx[layout.t_col(r)];
            let value = node_pit.get(r, node::TINIT) + step;
            node_pit.set(r, node::TINIT, value);
            dt.push(step);
            t.push(value);
        }

        let mut dt_out = Vec::with_capacity(layout.n_branches);
        let mut t_out = Vec::with_capacity(layout.n_branches);
        for b in 0..layout.n_branches {
            let step = alpha * dx[layout.tout_col(b)];
            let value = branch_pit.get(b, branch::TOUTINIT) + step;
            branch_pit.set(b, branch::TOUTINIT, value);
            dt_out.push(step);
            t_out.push(value);
        }

        vec![
            Change::measure("t", &dt, &t, self.tol_t),
            Change::measure("t_out", &dt_out, &t_out, self.tol_t),
        ]
    }

    /// Densities and viscosities follow the solved temperatures.
    fn finish(&mut self) -> SolverResult<()> {
        update_fluid_properties(&mut self.view.node, &mut self.view.branch, self.fluid);
        Ok(())
    }
}
