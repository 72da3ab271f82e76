//! External grids: pressure and/or temperature slacks at junctions.

use pf_pit::columns::node;
use pf_pit::{NodeType, NodeTypeT};

use crate::common::junction_row;
use crate::context::{BuildContext, ResultContext};
use crate::error::ComponentResult;
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "ext_grid";

/// Several grids on one junction share the slack mass flow equally. The
/// reported `mdot_kg_per_s` is negative when the grid feeds the network and
/// NaN for `t` grids.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtGridComponent;

impl Component for ExtGridComponent {
    fn table_name(&self) -> &'static str {
        TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::NodeElement
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        &[
            ("junction", DType::Index),
            ("p_bar", DType::Float),
            ("t_k", DType::Float),
            ("type", DType::Str),
            ("in_service", DType::Bool),
        ]
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let net = ctx.net;
        for (element, eg) in net.ext_grid.iter().filter(|(_, eg)| eg.in_service) {
            let row = junction_row(ctx.lookups, TABLE, element, eg.junction)?;
            let n = &mut *ctx.node;
            if eg.kind.fixes_pressure() {
                n.set(row, node::NODE_TYPE, NodeType::P.code());
                n.set(row, node::PINIT, eg.p_bar);
                n.set_flag(row, node::VAR_MASS_SLACK, true);
                n.set(row, node::EXT_GRID_OCCURENCE, n.get(row, node::EXT_GRID_OCCURENCE) + 1.0);
            }
            if eg.kind.fixes_temperature() {
                n.set(row, node::NODE_TYPE_T, NodeTypeT::T.code());
                n.set(row, node::TINIT, eg.t_k);
                n.set(
                    row,
                    node::EXT_GRID_OCCURENCE_T,
                    n.get(row, node::EXT_GRID_OCCURENCE_T) + 1.0,
                );
            }
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let index: Vec<usize> = ctx.net.ext_grid.indices().to_vec();
        let mdot = ctx
            .net
            .ext_grid
            .iter()
            .map(|(_, eg)| {
                let row = ctx.lookups.node.row_of("junction", eg.junction);
                // Temperature-only grids carry no slack flow.
                match row {
                    Some(r) if eg.in_service && eg.kind.fixes_pressure() && ctx.node_hydraulic(r) => {
                        let share = ctx.node.get(r, node::EXT_GRID_OCCURENCE).max(1.0);
                        -ctx.node.get(r, node::MDOTSLACKINIT) / share
                    }
                    _ => f64::NAN,
                }
            })
            .collect();
        let mut out = ResultTable::new(TABLE, index);
        out.push_column("mdot_kg_per_s", mdot);
        Ok(Some(out))
    }
}
