//! Sinks and sources: fixed mass withdrawal or injection at junctions.

use pf_pit::columns::node;

use crate::common::junction_row;
use crate::context::{BuildContext, ResultContext};
use crate::error::ComponentResult;
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const SINK_TABLE: &str = "sink";
pub const SOURCE_TABLE: &str = "source";

const SCHEMA: &[(&str, DType)] = &[
    ("junction", DType::Index),
    ("mdot_kg_per_s", DType::Float),
    ("scaling", DType::Float),
    ("in_service", DType::Bool),
];

fn add_load(
    ctx: &mut BuildContext<'_>,
    table: &'static str,
    element: usize,
    junction: usize,
    mdot: f64,
) -> ComponentResult<()> {
    let row = junction_row(ctx.lookups, table, element, junction)?;
    let load = ctx.node.get(row, node::LOAD);
    ctx.node.set(row, node::LOAD, load + mdot);
    Ok(())
}

/// `mdot_kg_per_s` as demanded for elements at hydraulically connected
/// junctions, NaN otherwise.
fn load_results(
    ctx: &ResultContext<'_>,
    table: &'static str,
    elements: impl Iterator<Item = (usize, usize, f64, bool)>,
) -> ResultTable {
    let mut index = Vec::new();
    let mut mdot = Vec::new();
    for (element, junction, value, in_service) in elements {
        index.push(element);
        let row = ctx.lookups.node.row_of("junction", junction);
        mdot.push(match row {
            Some(r) if in_service && ctx.node_hydraulic(r) => value,
            _ => f64::NAN,
        });
    }
    let mut out = ResultTable::new(table, index);
    out.push_column("mdot_kg_per_s", mdot);
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SinkComponent;

impl Component for SinkComponent {
    fn table_name(&self) -> &'static str {
        SINK_TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::NodeElement
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        SCHEMA
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let net = ctx.net;
        for (element, s) in net.sink.iter().filter(|(_, s)| s.in_service) {
            add_load(ctx, SINK_TABLE, element, s.junction, s.mdot_kg_per_s * s.scaling)?;
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let elements = ctx
            .net
            .sink
            .iter()
            .map(|(e, s)| (e, s.junction, s.mdot_kg_per_s * s.scaling, s.in_service));
        Ok(Some(load_results(ctx, SINK_TABLE, elements)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SourceComponent;

impl Component for SourceComponent {
    fn table_name(&self) -> &'static str {
        SOURCE_TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::NodeElement
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        SCHEMA
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let net = ctx.net;
        for (element, s) in net.source.iter().filter(|(_, s)| s.in_service) {
            add_load(ctx, SOURCE_TABLE, element, s.junction, -s.mdot_kg_per_s * s.scaling)?;
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let elements = ctx
            .net
            .source
            .iter()
            .map(|(e, s)| (e, s.junction, s.mdot_kg_per_s * s.scaling, s.in_service));
        Ok(Some(load_results(ctx, SOURCE_TABLE, elements)))
    }
}
