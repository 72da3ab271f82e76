//! Valves: lumped loss branches that are switched off when closed.

use pf_net::Net;
use pf_pit::Lookups;

use crate::common::{
    BranchInit, branch_results, element_rows, init_branch_row, junction_row,
    single_row_branch_lookup,
};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "valve";

#[derive(Debug, Default, Clone, Copy)]
pub struct ValveComponent;

impl Component for ValveComponent {
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
            ("diameter_m", DType::Float),
            ("opened", DType::Bool),
            ("loss_coefficient", DType::Float),
            ("in_service", DType::Bool),
        ]
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.valve.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(lookups, TABLE, net.valve.indices().iter().copied())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let range = ctx
            .lookups
            .branch
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let net = ctx.net;
        for (row, (element, v)) in range.zip(net.valve.iter()) {
            let from = junction_row(ctx.lookups, TABLE, element, v.from_junction)?;
            let to = junction_row(ctx.lookups, TABLE, element, v.to_junction)?;
            let mut init = BranchInit::lumped(
                element,
                from,
                to,
                v.in_service && v.opened,
                v.diameter_m,
                ctx.settings.ambient_temperature,
            );
            init.lc = v.loss_coefficient;
            init_branch_row(ctx, TABLE, row, &init)?;
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let rows = element_rows(ctx.lookups, TABLE, ctx.net.valve.indices());
        Ok(Some(branch_results(ctx, TABLE, &rows)))
    }
}
