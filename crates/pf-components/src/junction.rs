//! Junctions: the node table.

use pf_core::constants::p_correction_height_air;
use pf_net::Net;
use pf_pit::columns::node;
use pf_pit::{Lookups, NodeType, NodeTypeT};

use crate::common::index_lookup;
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "junction";

#[derive(Debug, Default, Clone, Copy)]
pub struct JunctionComponent;

impl Component for JunctionComponent {
    fn table_name(&self) -> &'static str {
        TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Node
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        &[
            ("name", DType::Str),
            ("pn_bar", DType::Float),
            ("tfluid_k", DType::Float),
            ("height_m", DType::Float),
            ("in_service", DType::Bool),
        ]
    }

    fn node_pit_rows(&self, net: &Net) -> usize {
        net.junction.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        let range = lookups
            .node
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let lookup = index_lookup(range.start, net.junction.indices().iter().map(|&e| (e, 1)));
        lookups.node.set_index(TABLE, lookup);
        Ok(())
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let range = ctx
            .lookups
            .node
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let table_id = ctx
            .lookups
            .node
            .registry
            .id(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;

        let mut rows = ctx.node.slice_mut(range);
        for (local, (element, j)) in ctx.net.junction.iter().enumerate() {
            rows.set(local, node::TABLE_IDX, table_id as f64);
            rows.set(local, node::ELEMENT_IDX, element as f64);
            rows.set(local, node::NODE_TYPE, NodeType::L.code());
            rows.set_flag(local, node::ACTIVE, j.in_service);
            rows.set(local, node::RHO, ctx.fluid.density(j.tfluid_k));
            rows.set(local, node::PINIT, j.pn_bar);
            rows.set(local, node::LOAD, 0.0);
            rows.set(local, node::HEIGHT, j.height_m);
            rows.set(local, node::TINIT, j.tfluid_k);
            rows.set(local, node::PAMB, p_correction_height_air(j.height_m));
            rows.set(local, node::LOAD_T, 0.0);
            rows.set(local, node::NODE_TYPE_T, NodeTypeT::L.code());
            rows.set(local, node::MDOTSLACKINIT, 0.0);
            rows.set(local, node::VAR_MASS_SLACK, 0.0);
            rows.set(local, node::EXT_GRID_OCCURENCE, 0.0);
            rows.set(local, node::EXT_GRID_OCCURENCE_T, 0.0);
            rows.set(local, node::INFEED, 0.0);
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let index: Vec<usize> = ctx.net.junction.indices().to_vec();
        let mut p = Vec::with_capacity(index.len());
        let mut t = Vec::with_capacity(index.len());
        for &e in &index {
            let row = ctx.lookups.node.row_of(TABLE, e);
            p.push(match row {
                Some(r) if ctx.node_hydraulic(r) => ctx.node.get(r, node::PINIT),
                _ => f64::NAN,
            });
            t.push(match row {
                Some(r) if ctx.node_thermal(r) => ctx.node.get(r, node::TINIT),
                _ => f64::NAN,
            });
        }
        let mut out = ResultTable::new(TABLE, index);
        out.push_column("p_bar", p);
        out.push_column("t_k", t);
        Ok(Some(out))
    }
}
