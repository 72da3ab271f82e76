//! Hydraulic Newton system on a reduced view.

use pf_components::ComponentRegistry;
use pf_net::Net;
use pf_pit::columns::{branch, node};
use pf_pit::{Mode, ReducedView};

use crate::derivatives::{FlowEquations, calculate_derivatives_hydraulic};
use crate::error::SolverResult;
use crate::kernel::DerivativeKernel;
use crate::newton::{Change, NewtonSystem};
use crate::system::{HydraulicLayout, LinearSystem, assemble_hydraulic};

pub struct HydraulicSystem<'a> {
    net: &'a Net,
    registry: &'a ComponentRegistry,
    view: &'a mut ReducedView,
    eq: FlowEquations<'a>,
    kernel: &'a dyn DerivativeKernel,
    layout: HydraulicLayout,
    tol_p: f64,
    tol_m: f64,
}

impl<'a> HydraulicSystem<'a> {
    pub fn new(
        net: &'a Net,
        registry: &'a ComponentRegistry,
        view: &'a mut ReducedView,
        eq: FlowEquations<'a>,
        kernel: &'a dyn DerivativeKernel,
        tol_p: f64,
        tol_m: f64,
    ) -> Self {
        let layout = HydraulicLayout::new(&view.node, &view.branch);
        Self {
            net,
            registry,
            view,
            eq,
            kernel,
            layout,
            tol_p,
            tol_m,
        }
    }

    pub fn layout(&self) -> &HydraulicLayout {
        &self.layout
    }

    /// Hooks before, generic derivatives, hooks after.
    fn evaluate(&mut self) -> SolverResult<()> {
        for c in self.registry.iter() {
            c.adaption_before_derivatives_hydraulic(self.net, self.view)?;
        }
        calculate_derivatives_hydraulic(
            &mut self.view.node,
            &mut self.view.branch,
            &self.eq,
            self.kernel,
        )?;
        for c in self.registry.iter() {
            c.adaption_after_derivatives_hydraulic(self.net, self.view)?;
        }
        Ok(())
    }
}

impl NewtonSystem for HydraulicSystem<'_> {
    fn mode(&self) -> Mode {
        Mode::Hydraulics
    }

    fn assemble(&mut self) -> SolverResult<LinearSystem> {
        self.evaluate()?;
        Ok(assemble_hydraulic(&self.view.node, &self.view.branch, &self.layout))
    }

    fn apply(&mut self, dx: &[f64], alpha: f64) -> Vec<Change> {
        let layout = &self.layout;
        let node_pit = &mut self.view.node;
        let branch_pit = &mut self.view.branch;

        let mut dp = Vec::with_capacity(layout.n_nodes);
        let mut p = Vec::with_capacity(layout.n_nodes);
        for r in 0..layout.n_nodes {
            let step = alpha * dx[layout.p_col(r)];
            let value = node_pit.get(r, node::PINIT) + step;
            node_pit.set(r, node::PINIT, value);
            dp.push(step);
            p.push(value);
        }

        let mut dm = Vec::with_capacity(layout.n_branches);
        let mut m = Vec::with_capacity(layout.n_branches);
        for b in 0..layout.n_branches {
            let step = alpha * dx[layout.m_col(b)];
            let value = branch_pit.get(b, branch::MDOTINIT) + step;
            branch_pit.set(b, branch::MDOTINIT, value);
            dm.push(step);
            m.push(value);
        }

        for (i, &r) in layout.slack_nodes.iter().enumerate() {
            let value = node_pit.get(r, node::MDOTSLACKINIT) + alpha * dx[layout.slack_col(i)];
            node_pit.set(r, node::MDOTSLACKINIT, value);
        }

        vec![
            Change::measure("p", &dp, &p, self.tol_p),
            Change::measure("m", &dm, &m, self.tol_m),
        ]
    }

    fn finish(&mut self) -> SolverResult<()> {
        self.evaluate()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use pf_fluids::Fluid;
    use pf_pit::{BranchType, Connectivity, Lookups, NodeType, NodeTypeT, Pit, reduce_pit};

    use super::*;
    use crate::kernel::SerialKernel;
    use crate::linear::SparseLu;
    use crate::newton::{NewtonConfig, newton_solve};
    use crate::options::{ConvergenceCriterion, FrictionModel, NonlinearMethod};

    /// Slack 0 at 2 bar feeding a 1 kg/s load at node 1 through 200 m of pipe.
    fn view() -> ReducedView {
        let mut node_pit = Pit::nan(2, node::COUNT);
        for r in 0..2 {
            node_pit.set(r, node::NODE_TYPE, NodeType::L.code());
            node_pit.set(r, node::NODE_TYPE_T, NodeTypeT::L.code());
            node_pit.set(r, node::PINIT, 2.0);
            node_pit.set(r, node::TINIT, 293.15);
            node_pit.set(r, node::PAMB, 1.01325);
            node_pit.set(r, node::HEIGHT, 0.0);
            node_pit.set(r, node::LOAD, 0.0);
            node_pit.set(r, node::MDOTSLACKINIT, 0.0);
            node_pit.set_flag(r, node::ACTIVE, true);
        }
        node_pit.set(0, node::NODE_TYPE, NodeType::P.code());
        node_pit.set(1, node::LOAD, 1.0);

        let d: f64 = 0.05;
        let mut branch_pit = Pit::nan(1, branch::COUNT);
        for (col, v) in [
            (branch::FROM_NODE, 0.0),
            (branch::TO_NODE, 1.0),
            (branch::LENGTH, 200.0),
            (branch::D, d),
            (branch::AREA, PI * d * d / 4.0),
            (branch::K, 1e-4),
            (branch::LC, 0.0),
            (branch::PL, 0.0),
            (branch::MDOTINIT, 0.1),
            (branch::BRANCH_TYPE, BranchType::Normal.code()),
            (branch::CTRL_NODE, -1.0),
        ] {
            branch_pit.set(0, col, v);
        }
        branch_pit.set_flag(0, branch::ACTIVE, true);
        branch_pit.set_flag(0, branch::CONTROL_ACTIVE, false);

        let conn = Connectivity {
            mode: Mode::Hydraulics,
            nodes: vec![true; 2],
            branches: vec![true],
        };
        reduce_pit(&node_pit, &branch_pit, &conn, &Lookups::default()).unwrap()
    }

    #[test]
    fn single_pipe_balances_mass_and_momentum() {
        let water = Fluid::water();
        let net = Net::new("unit");
        let registry = ComponentRegistry::empty();
        let mut view = view();
        let eq = FlowEquations {
            fluid: &water,
            friction_model: FrictionModel::Nikuradse,
            max_iter_colebrook: 10,
        };
        let config = NewtonConfig {
            max_iterations: 20,
            alpha: 1.0,
            method: NonlinearMethod::Constant,
            criterion: ConvergenceCriterion::Combined,
            tol_res: 1e-8,
        };
        {
            let mut sys = HydraulicSystem::new(&net, &registry, &mut view, eq, &SerialKernel, 1e-8, 1e-8);
            let result = newton_solve(&mut sys, &SparseLu, &config).unwrap();
            assert!(result.converged);
        }
        assert!((view.branch.get(0, branch::MDOTINIT) - 1.0).abs() < 1e-8);
        assert!((view.node.get(0, node::MDOTSLACKINIT) - 1.0).abs() < 1e-8);
        assert_eq!(view.node.get(0, node::PINIT), 2.0);
        assert!(view.node.get(1, node::PINIT) < 2.0);
        assert!(view.branch.get(0, branch::LOAD_VEC_BRANCHES).abs() < 1e-8);
    }
}
