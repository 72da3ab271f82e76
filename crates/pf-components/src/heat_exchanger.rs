//! Heat exchangers: lumped branches extracting a fixed heat flow.

use pf_net::Net;
use pf_pit::Lookups;
use pf_pit::columns::branch;

use crate::common::{
    BranchInit, branch_results, element_rows, init_branch_row, junction_row,
    single_row_branch_lookup,
};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "heat_exchanger";

#[derive(Debug, Default, Clone, Copy)]
pub struct HeatExchangerComponent;

impl Component for HeatExchangerComponent {
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
            ("qext_w", DType::Float),
            ("loss_coefficient", DType::Float),
            ("in_service", DType::Bool),
        ]
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.heat_exchanger.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(lookups, TABLE, net.heat_exchanger.indices().iter().copied())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let range = ctx
            .lookups
            .branch
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let net = ctx.net;
        for (row, (element, hx)) in range.zip(net.heat_exchanger.iter()) {
            let from = junction_row(ctx.lookups, TABLE, element, hx.from_junction)?;
            let to = junction_row(ctx.lookups, TABLE, element, hx.to_junction)?;
            let mut init = BranchInit::lumped(
                element,
                from,
                to,
                hx.in_service,
                hx.diameter_m,
                ctx.settings.ambient_temperature,
            );
            init.lc = hx.loss_coefficient;
            init.qext = hx.qext_w;
            init_branch_row(ctx, TABLE, row, &init)?;
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let rows = element_rows(ctx.lookups, TABLE, ctx.net.heat_exchanger.indices());
        let mut out = branch_results(ctx, TABLE, &rows);
        let qext = rows
            .iter()
            .map(|&(_, r, _)| {
                if ctx.branch_hydraulic(r) {
                    ctx.branch.get(r, branch::QEXT)
                } else {
                    f64::NAN
                }
            })
            .collect();
        out.push_column("qext_w", qext);
        Ok(Some(out))
    }
}
