//! Flow controls: branches that impose their mass flow while controlling.

use pf_net::Net;
use pf_pit::columns::branch;
use pf_pit::{Lookups, ReducedView};

use crate::common::{
    BranchInit, active_rows, branch_results, element_rows, fix_mass_flow, init_branch_row,
    junction_row, single_row_branch_lookup,
};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "flow_control";

/// With `control_active` unset the element acts like an open valve.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlowControlComponent;

impl Component for FlowControlComponent {
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
            ("controlled_mdot_kg_per_s", DType::Float),
            ("diameter_m", DType::Float),
            ("control_active", DType::Bool),
            ("in_service", DType::Bool),
        ]
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.flow_control.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(lookups, TABLE, net.flow_control.indices().iter().copied())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let range = ctx
            .lookups
            .branch
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let net = ctx.net;
        for (row, (element, fc)) in range.zip(net.flow_control.iter()) {
            let from = junction_row(ctx.lookups, TABLE, element, fc.from_junction)?;
            let to = junction_row(ctx.lookups, TABLE, element, fc.to_junction)?;
            let init = BranchInit::lumped(
                element,
                from,
                to,
                fc.in_service,
                fc.diameter_m,
                ctx.settings.ambient_temperature,
            );
            init_branch_row(ctx, TABLE, row, &init)?;

            let b = &mut *ctx.branch;
            b.set(row, branch::SETPOINT, fc.controlled_mdot_kg_per_s);
            b.set_flag(row, branch::CONTROL_ACTIVE, fc.control_active);
            if fc.control_active {
                b.set(row, branch::MDOTINIT, fc.controlled_mdot_kg_per_s);
            }
        }
        Ok(())
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        _net: &Net,
        view: &mut ReducedView,
    ) -> ComponentResult<()> {
        let Some(mut rows) = active_rows(view, TABLE) else {
            return Ok(());
        };
        for local in 0..rows.len() {
            if rows.flag(local, branch::CONTROL_ACTIVE) {
                fix_mass_flow(&mut rows, local);
            }
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let rows = element_rows(ctx.lookups, TABLE, ctx.net.flow_control.indices());
        Ok(Some(branch_results(ctx, TABLE, &rows)))
    }
}
