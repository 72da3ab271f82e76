//! Circulation pumps connecting a return junction to a flow junction.
//!
//! The flow junction is a slack (pressure and/or temperature, per pump type)
//! with a variable mass slack. The pump itself is a circulation branch from
//! the return to the flow junction that is left out of the hydraulic
//! reachability search. Two variants exist:
//! - pressure: the branch imposes the lift `p_flow - p_return = plift`
//! - mass: the branch imposes the circulated mass flow

use pf_net::{ExtGridType, Net};
use pf_pit::columns::{branch, node};
use pf_pit::{BranchType, Lookups, NodeType, NodeTypeT, ReducedView};

use crate::common::{
    BranchInit, DEFAULT_DIAMETER, active_rows, branch_results, element_rows, fix_mass_flow,
    init_branch_row, junction_row, single_row_branch_lookup,
};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const PRESSURE_TABLE: &str = "circ_pump_pressure";
pub const MASS_TABLE: &str = "circ_pump_mass";

/// Common view on both pump variants.
struct CircRow {
    element: usize,
    return_junction: usize,
    flow_junction: usize,
    p_flow_bar: f64,
    t_flow_k: f64,
    kind: ExtGridType,
    in_service: bool,
    /// Pressure lift [bar] or mass flow [kg/s], depending on the variant.
    setpoint: f64,
}

fn pressure_rows(net: &Net) -> Vec<CircRow> {
    net.circ_pump_pressure
        .iter()
        .map(|(element, c)| CircRow {
            element,
            return_junction: c.return_junction,
            flow_junction: c.flow_junction,
            p_flow_bar: c.p_flow_bar,
            t_flow_k: c.t_flow_k,
            kind: c.kind,
            in_service: c.in_service,
            setpoint: c.plift_bar,
        })
        .collect()
}

fn mass_rows(net: &Net) -> Vec<CircRow> {
    net.circ_pump_mass
        .iter()
        .map(|(element, c)| CircRow {
            element,
            return_junction: c.return_junction,
            flow_junction: c.flow_junction,
            p_flow_bar: c.p_flow_bar,
            t_flow_k: c.t_flow_k,
            kind: c.kind,
            in_service: c.in_service,
            setpoint: c.mdot_flow_kg_per_s,
        })
        .collect()
}

const SCHEMA: &[(&str, DType)] = &[
    ("return_junction", DType::Index),
    ("flow_junction", DType::Index),
    ("p_flow_bar", DType::Float),
    ("t_flow_k", DType::Float),
    ("setpoint", DType::Float),
    ("kind", DType::Str),
    ("in_service", DType::Bool),
];

/// Slack entries at the flow junction.
fn write_flow_junction(
    ctx: &mut BuildContext<'_>,
    table: &'static str,
    pump: &CircRow,
) -> ComponentResult<()> {
    let row = junction_row(ctx.lookups, table, pump.element, pump.flow_junction)?;
    let n = &mut *ctx.node;
    if pump.kind.fixes_pressure() {
        n.set(row, node::NODE_TYPE, NodeType::P.code());
        n.set(row, node::PINIT, pump.p_flow_bar);
        n.set_flag(row, node::VAR_MASS_SLACK, true);
        n.set(row, node::EXT_GRID_OCCURENCE, n.get(row, node::EXT_GRID_OCCURENCE) + 1.0);
    }
    if pump.kind.fixes_temperature() {
        n.set(row, node::NODE_TYPE_T, NodeTypeT::T.code());
        n.set(row, node::TINIT, pump.t_flow_k);
        n.set(row, node::EXT_GRID_OCCURENCE_T, n.get(row, node::EXT_GRID_OCCURENCE_T) + 1.0);
    }
    Ok(())
}

fn write_branches(
    ctx: &mut BuildContext<'_>,
    table: &'static str,
    pumps: &[CircRow],
    lift: bool,
) -> ComponentResult<()> {
    let range = ctx
        .lookups
        .branch
        .range(table)
        .ok_or(ComponentError::MissingTable { name: table })?;
    for (row, pump) in range.zip(pumps) {
        let from = junction_row(ctx.lookups, table, pump.element, pump.return_junction)?;
        let to = junction_row(ctx.lookups, table, pump.element, pump.flow_junction)?;
        let mut init = BranchInit::lumped(
            pump.element,
            from,
            to,
            pump.in_service,
            DEFAULT_DIAMETER,
            ctx.settings.ambient_temperature,
        );
        init.branch_type = BranchType::Circ;
        init_branch_row(ctx, table, row, &init)?;

        let b = &mut *ctx.branch;
        b.set(row, branch::SETPOINT, pump.setpoint);
        b.set_flag(row, branch::CONTROL_ACTIVE, true);
        if lift {
            b.set(row, branch::PL, pump.setpoint);
        } else {
            b.set(row, branch::MDOTINIT, pump.setpoint);
        }
    }
    Ok(())
}

fn circ_results(
    ctx: &ResultContext<'_>,
    table: &'static str,
    elements: &[usize],
) -> ResultTable {
    let rows = element_rows(ctx.lookups, table, elements);
    let mut out = branch_results(ctx, table, &rows);
    let mut deltap = Vec::with_capacity(rows.len());
    let mut deltat = Vec::with_capacity(rows.len());
    for &(_, r, _) in &rows {
        let ends = ctx
            .branch
            .get_index(r, branch::FROM_NODE)
            .zip(ctx.branch.get_index(r, branch::TO_NODE));
        match ends {
            Some((ret, flow)) if ctx.branch_hydraulic(r) => {
                deltap.push(ctx.node.get(flow, node::PINIT) - ctx.node.get(ret, node::PINIT));
                deltat.push(if ctx.node_thermal(ret) && ctx.node_thermal(flow) {
                    ctx.node.get(flow, node::TINIT) - ctx.node.get(ret, node::TINIT)
                } else {
                    f64::NAN
                });
            }
            _ => {
                deltap.push(f64::NAN);
                deltat.push(f64::NAN);
            }
        }
    }
    out.push_column("deltap_bar", deltap);
    out.push_column("deltat_k", deltat);
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CircPumpPressureComponent;

impl Component for CircPumpPressureComponent {
    fn table_name(&self) -> &'static str {
        PRESSURE_TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Branch
    }

    fn from_to_node_cols(&self) -> Option<(&'static str, &'static str)> {
        Some(("return_junction", "flow_junction"))
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        SCHEMA
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.circ_pump_pressure.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(
            lookups,
            PRESSURE_TABLE,
            net.circ_pump_pressure.indices().iter().copied(),
        )
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        for pump in pressure_rows(ctx.net).iter().filter(|p| p.in_service) {
            write_flow_junction(ctx, PRESSURE_TABLE, pump)?;
            let ret = junction_row(ctx.lookups, PRESSURE_TABLE, pump.element, pump.return_junction)?;
            ctx.node
                .set(ret, node::PINIT, pump.p_flow_bar - pump.setpoint);
        }
        Ok(())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let pumps = pressure_rows(ctx.net);
        write_branches(ctx, PRESSURE_TABLE, &pumps, true)
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        _net: &Net,
        view: &mut ReducedView,
    ) -> ComponentResult<()> {
        let Some(range) = view.active.branch.range(PRESSURE_TABLE) else {
            return Ok(());
        };
        for row in range {
            let ends = view
                .branch
                .get_index(row, branch::FROM_NODE)
                .zip(view.branch.get_index(row, branch::TO_NODE));
            let Some((from, to)) = ends else {
                continue;
            };
            let p_from = view.node.get(from, node::PINIT);
            let p_to = view.node.get(to, node::PINIT);
            let plift = view.branch.get(row, branch::SETPOINT);
            view.branch.set(row, branch::JAC_DERIV_DP, 1.0);
            view.branch.set(row, branch::JAC_DERIV_DP1, -1.0);
            view.branch.set(row, branch::JAC_DERIV_DM, 0.0);
            view.branch
                .set(row, branch::LOAD_VEC_BRANCHES, p_from - p_to + plift);
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        Ok(Some(circ_results(
            ctx,
            PRESSURE_TABLE,
            ctx.net.circ_pump_pressure.indices(),
        )))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CircPumpMassComponent;

impl Component for CircPumpMassComponent {
    fn table_name(&self) -> &'static str {
        MASS_TABLE
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Branch
    }

    fn from_to_node_cols(&self) -> Option<(&'static str, &'static str)> {
        Some(("return_junction", "flow_junction"))
    }

    fn input_schema(&self) -> &'static [(&'static str, DType)] {
        SCHEMA
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.circ_pump_mass.len()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        single_row_branch_lookup(lookups, MASS_TABLE, net.circ_pump_mass.indices().iter().copied())
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        for pump in mass_rows(ctx.net).iter().filter(|p| p.in_service) {
            write_flow_junction(ctx, MASS_TABLE, pump)?;
        }
        Ok(())
    }

    fn create_pit_branch_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let pumps = mass_rows(ctx.net);
        write_branches(ctx, MASS_TABLE, &pumps, false)
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        _net: &Net,
        view: &mut ReducedView,
    ) -> ComponentResult<()> {
        let Some(mut rows) = active_rows(view, MASS_TABLE) else {
            return Ok(());
        };
        for local in 0..rows.len() {
            fix_mass_flow(&mut rows, local);
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        Ok(Some(circ_results(ctx, MASS_TABLE, ctx.net.circ_pump_mass.indices())))
    }
}
