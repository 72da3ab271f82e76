//! Pumps with a quadratic pressure lift characteristic.

use pf_net::Net;
use pf_pit::columns::branch;
use pf_pit::{Lookups, ReducedView};

use crate::common::{
    BranchInit, DEFAULT_DIAMETER, active_rows, branch_results, element_rows, init_branch_row,
    junction_row, single_row_branch_lookup,
};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "pump";

/// The pump curve is re-evaluated before every hydraulic iteration at the
/// current volume flow.
#[derive(Debug, Default, Clone, Copy)]
pub struct PumpComponent;

impl Component for PumpComponent {
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
            ("c0", DType::Float),
            ("c1", DType::Float),
            ("c2", DType::Float),
            ("t_lift_k", DType::Float),
            ("in_service", DType::Bool),
        ]
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.pump.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(lookups, TABLE, net.pump.indices().iter().copied())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let range = ctx
            .lookups
            .branch
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let net = ctx.net;
        for (row, (element, pump)) in range.zip(net.pump.iter()) {
            let from = junction_row(ctx.lookups, TABLE, element, pump.from_junction)?;
            let to = junction_row(ctx.lookups, TABLE, element, pump.to_junction)?;
            let init = BranchInit::lumped(
                element,
                from,
                to,
                pump.in_service,
                DEFAULT_DIAMETER,
                ctx.settings.ambient_temperature,
            );
            init_branch_row(ctx, TABLE, row, &init)?;
            ctx.branch.set(row, branch::TL, pump.t_lift_k);
        }
        Ok(())
    }

    fn adaption_before_derivatives_hydraulic(
        &self,
        net: &Net,
        view: &mut ReducedView,
    ) -> ComponentResult<()> {
        let Some(mut rows) = active_rows(view, TABLE) else {
            return Ok(());
        };
        for local in 0..rows.len() {
            let Some(element) = rows.get_index(local, branch::ELEMENT_IDX) else {
                continue;
            };
            let Some(pump) = net.pump.get(element) else {
                continue;
            };
            let vdot_m3_per_h =
                rows.get(local, branch::MDOTINIT) / rows.get(local, branch::RHO) * 3600.0;
            rows.set(local, branch::PL, pump.curve.pressure_lift(vdot_m3_per_h));
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let rows = element_rows(ctx.lookups, TABLE, ctx.net.pump.indices());
        let mut out = branch_results(ctx, TABLE, &rows);
        let lift = rows
            .iter()
            .map(|&(_, r, _)| {
                if ctx.branch_hydraulic(r) {
                    ctx.branch.get(r, branch::PL)
                } else {
                    f64::NAN
                }
            })
            .collect();
        out.push_column("deltap_bar", lift);
        Ok(Some(out))
    }
}
