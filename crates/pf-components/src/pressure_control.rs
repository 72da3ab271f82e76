//! Pressure controls: branches that hold the pressure of a controlled junction.

use pf_net::Net;
use pf_pit::columns::{branch, node};
use pf_pit::{BranchType, Lookups, NodeType, ReducedView};
use tracing::debug;

use crate::common::{
    BranchInit, DEFAULT_DIAMETER, branch_results, element_rows, init_branch_row, junction_row,
    single_row_branch_lookup,
};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "pressure_control";

/// While controlling, the momentum equation of the branch is replaced by
/// `p(controlled junction) - setpoint = 0`; the branch mass flow follows from
/// the node balances. The controlled junction is marked `NodeType::Pc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PressureControlComponent;

impl Component for PressureControlComponent {
    fn table_name(&self) -> &'static str {
        TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Branch
    }

    fn from_to_node_cols(&self) -> Option<(&'static str, &'static str)> {
        Some(("from_junction", "to_junction"))
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        &[
            ("from_junction", DType::Index),
            ("to_junction", DType::Index),
            ("controlled_junction", DType::Index),
            ("controlled_p_bar", DType::Float),
            ("control_active", DType::Bool),
            ("loss_coefficient", DType::Float),
            ("in_service", DType::Bool),
        ]
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.pressure_control.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(lookups, TABLE, net.pressure_control.indices().iter().copied())
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let net = ctx.net;
        for (element, pc) in net.pressure_control.iter() {
            if !(pc.in_service && pc.control_active) {
                continue;
            }
            let row = junction_row(ctx.lookups, TABLE, element, pc.controlled_junction)?;
            ctx.node.set(row, node::NODE_TYPE, NodeType::Pc.code());
            ctx.node.set(row, node::PINIT, pc.controlled_p_bar);
        }
        Ok(())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let range = ctx
            .lookups
            .branch
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let net = ctx.net;
        for (row, (element, pc)) in range.zip(net.pressure_control.iter()) {
            let from = junction_row(ctx.lookups, TABLE, element, pc.from_junction)?;
            let to = junction_row(ctx.lookups, TABLE, element, pc.to_junction)?;
            let ctrl = junction_row(ctx.lookups, TABLE, element, pc.controlled_junction)?;
            let mut init = BranchInit::lumped(
                element,
                from,
                to,
                pc.in_service,
                DEFAULT_DIAMETER,
                ctx.settings.ambient_temperature,
            );
            init.lc = pc.loss_coefficient;
            init.branch_type = BranchType::Pc;
            init_branch_row(ctx, TABLE, row, &init)?;

            let b = &mut *ctx.branch;
            b.set(row, branch::CTRL_NODE, ctrl as f64);
            b.set(row, branch::SETPOINT, pc.controlled_p_bar);
            b.set_flag(row, branch::CONTROL_ACTIVE, pc.control_active);
        }
        Ok(())
    }

    /// Rows whose controlled junction is not part of the view keep the
    /// generic momentum equation.
    fn adaption_after_derivatives_hydraulic(
        &self,
        _net: &Net,
        view: &mut ReducedView,
    ) -> ComponentResult<()> {
        let Some(range) = view.active.branch.range(TABLE) else {
            return Ok(());
        };
        for row in range {
            if !view.branch.flag(row, branch::CONTROL_ACTIVE) {
                continue;
            }
            let Some(ctrl) = view.branch.get_index(row, branch::CTRL_NODE) else {
                debug!(row, "controlled junction outside the view, keeping the momentum row");
                continue;
            };
            let p_ctrl = view.node.get(ctrl, node::PINIT);
            let setpoint = view.branch.get(row, branch::SETPOINT);
            view.branch.set(row, branch::JAC_DERIV_DM, 0.0);
            view.branch.set(row, branch::JAC_DERIV_DP, 0.0);
            view.branch.set(row, branch::JAC_DERIV_DP1, 0.0);
            view.branch
                .set(row, branch::LOAD_VEC_BRANCHES, p_ctrl - setpoint);
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let rows = element_rows(ctx.lookups, TABLE, ctx.net.pressure_control.indices());
        let mut out = branch_results(ctx, TABLE, &rows);
        let deltap = match (out.column("p_from_bar"), out.column("p_to_bar")) {
            (Some(pf), Some(pt)) => pf.iter().zip(pt).map(|(a, b)| b - a).collect(),
            _ => vec![f64::NAN; rows.len()],
        };
        out.push_column("deltap_bar", deltap);
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_pit::lookup::{ActiveLookups, TableLookup};
    use pf_pit::types::Mode;
    use pf_pit::{Connectivity, Pit};

    fn view() -> ReducedView {
        let mut branch_lookup = TableLookup::default();
        branch_lookup.add_table(TABLE, 1).unwrap();
        let mut node_pit = Pit::nan(2, node::COUNT);
        node_pit.set(1, node::PINIT, 2.5);
        let mut branch_pit = Pit::nan(1, branch::COUNT);
        branch_pit.set(0, branch::FROM_NODE, 0.0);
        branch_pit.set(0, branch::TO_NODE, 1.0);
        branch_pit.set(0, branch::CTRL_NODE, 1.0);
        branch_pit.set(0, branch::SETPOINT, 2.0);
        branch_pit.set_flag(0, branch::CONTROL_ACTIVE, true);
        branch_pit.set(0, branch::JAC_DERIV_DM, -0.3);
        branch_pit.set(0, branch::JAC_DERIV_DP, 1.0);
        branch_pit.set(0, branch::JAC_DERIV_DP1, -1.0);
        branch_pit.set(0, branch::LOAD_VEC_BRANCHES, 0.7);
        ReducedView {
            node: node_pit,
            branch: branch_pit,
            node_rows: vec![0, 1],
            branch_rows: vec![0],
            active: ActiveLookups {
                connectivity: Connectivity {
                    mode: Mode::Hydraulics,
                    nodes: vec![true; 2],
                    branches: vec![true],
                },
                node: TableLookup::default(),
                branch: branch_lookup,
            },
        }
    }

    #[test]
    fn override_is_idempotent() {
        let net = Net::new("pc");
        let pc = PressureControlComponent;

        let mut once = view();
        pc.adaption_after_derivatives_hydraulic(&net, &mut once)
            .unwrap();
        let mut twice = view();
        pc.adaption_after_derivatives_hydraulic(&net, &mut twice)
            .unwrap();
        pc.adaption_after_derivatives_hydraulic(&net, &mut twice)
            .unwrap();

        assert_eq!(once.branch, twice.branch);
        assert_eq!(once.branch.get(0, branch::JAC_DERIV_DM), 0.0);
        assert_eq!(once.branch.get(0, branch::JAC_DERIV_DP), 0.0);
        assert_eq!(once.branch.get(0, branch::JAC_DERIV_DP1), 0.0);
        assert!((once.branch.get(0, branch::LOAD_VEC_BRANCHES) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_controlled_node_keeps_momentum_row() {
        let net = Net::new("pc");
        let mut v = view();
        v.branch.set(0, branch::CTRL_NODE, -1.0);
        PressureControlComponent
            .adaption_after_derivatives_hydraulic(&net, &mut v)
            .unwrap();
        assert_eq!(v.branch.get(0, branch::JAC_DERIV_DM), -0.3);
        assert_eq!(v.branch.get(0, branch::LOAD_VEC_BRANCHES), 0.7);
    }
}
