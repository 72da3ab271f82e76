//! Shared helpers for component contributions.

use std::f64::consts::PI;

use pf_pit::columns::{branch, node};
use pf_pit::{BranchType, IndexLookup, Lookups, PitSliceMut, ReducedView};

use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;

/// Default diameter of branches without geometry (pumps, circulation pumps) [m].
pub const DEFAULT_DIAMETER: f64 = 0.1;

pub fn circle_area(d: f64) -> f64 {
    PI * d * d / 4.0
}

/// Full node pit row of a junction.
pub fn junction_row(
    lookups: &Lookups,
    table: &'static str,
    element: usize,
    junction: usize,
) -> ComponentResult<usize> {
    lookups
        .node
        .row_of("junction", junction)
        .ok_or(ComponentError::UnknownJunction {
            table,
            element,
            junction,
        })
}

/// Element -> first row lookup for tables whose elements own `rows` rows each.
pub fn index_lookup(start: usize, elements: impl Iterator<Item = (usize, usize)>) -> IndexLookup {
    let mut lookup = IndexLookup::default();
    let mut row = start;
    for (element, rows) in elements {
        lookup.insert(element, row);
        row += rows;
    }
    lookup
}

/// Register the index lookup of a branch table with one row per element.
pub fn single_row_branch_lookup(
    lookups: &mut Lookups,
    table: &'static str,
    elements: impl Iterator<Item = usize>,
) -> ComponentResult<()> {
    let range = lookups
        .branch
        .range(table)
        .ok_or(ComponentError::MissingTable { name: table })?;
    lookups
        .branch
        .set_index(table, index_lookup(range.start, elements.map(|e| (e, 1))));
    Ok(())
}

/// Geometry and type of one branch row.
#[derive(Debug, Clone, Copy)]
pub struct BranchInit {
    pub element: usize,
    pub from: usize,
    pub to: usize,
    pub active: bool,
    pub length: f64,
    pub d: f64,
    pub k: f64,
    pub lc: f64,
    pub alpha: f64,
    pub text: f64,
    pub qext: f64,
    pub branch_type: BranchType,
}

impl BranchInit {
    /// Zero length branch of diameter `d` between two node rows.
    pub fn lumped(element: usize, from: usize, to: usize, active: bool, d: f64, text: f64) -> Self {
        Self {
            element,
            from,
            to,
            active,
            length: 0.0,
            d,
            k: 0.0,
            lc: 0.0,
            alpha: 0.0,
            text,
            qext: 0.0,
            branch_type: BranchType::Normal,
        }
    }
}

/// Fill every column of a branch row with its initial value.
pub fn init_branch_row(
    ctx: &mut BuildContext<'_>,
    table: &'static str,
    row: usize,
    init: &BranchInit,
) -> ComponentResult<()> {
    let table_id = ctx
        .lookups
        .branch
        .registry
        .id(table)
        .ok_or(ComponentError::MissingTable { name: table })?;

    let t_from = ctx.node.get(init.from, node::TINIT);
    let t_to = ctx.node.get(init.to, node::TINIT);
    let t_mean = 0.5 * (t_from + t_to);
    let rho = ctx.fluid.density(t_mean);
    let area = circle_area(init.d);
    let b = &mut *ctx.branch;

    b.set(row, branch::TABLE_IDX, table_id as f64);
    b.set(row, branch::ELEMENT_IDX, init.element as f64);
    b.set(row, branch::FROM_NODE, init.from as f64);
    b.set(row, branch::TO_NODE, init.to as f64);
    b.set_flag(row, branch::ACTIVE, init.active);
    b.set(row, branch::LENGTH, init.length);
    b.set(row, branch::D, init.d);
    b.set(row, branch::AREA, area);
    b.set(row, branch::K, init.k);
    b.set(row, branch::LC, init.lc);
    b.set(row, branch::RHO, rho);
    b.set(row, branch::ETA, ctx.fluid.viscosity(t_mean));
    b.set(row, branch::RE, 0.0);
    b.set(row, branch::LAMBDA, 0.0);
    b.set(
        row,
        branch::MDOTINIT,
        ctx.settings.initial_velocity * rho * area,
    );
    b.set(row, branch::PL, 0.0);
    b.set(row, branch::TL, 0.0);
    b.set(row, branch::ALPHA, init.alpha);
    b.set(row, branch::TEXT, init.text);
    b.set(row, branch::QEXT, init.qext);
    b.set(row, branch::TOUTINIT, t_to);
    b.set(row, branch::BRANCH_TYPE, init.branch_type.code());
    b.set_flag(row, branch::FLOW_RETURN_CONNECT, init.branch_type == BranchType::Circ);
    b.set(row, branch::CTRL_NODE, -1.0);
    b.set(row, branch::SETPOINT, f64::NAN);
    b.set_flag(row, branch::CONTROL_ACTIVE, false);
    for col in branch::LOAD_VEC_BRANCHES..branch::COUNT {
        b.set(row, col, 0.0);
    }
    Ok(())
}

/// Active rows of `table` in a reduced view, `None` when the table has none.
pub fn active_rows<'v>(view: &'v mut ReducedView, table: &str) -> Option<PitSliceMut<'v>> {
    let range = view.active.branch.range(table)?;
    if range.is_empty() {
        return None;
    }
    Some(view.branch.slice_mut(range))
}

/// Replace the momentum equation of a row by `m - m_set = 0`.
pub fn fix_mass_flow(rows: &mut PitSliceMut<'_>, local: usize) {
    let m = rows.get(local, branch::MDOTINIT);
    let m_set = rows.get(local, branch::SETPOINT);
    rows.set(local, branch::JAC_DERIV_DM, 1.0);
    rows.set(local, branch::JAC_DERIV_DP, 0.0);
    rows.set(local, branch::JAC_DERIV_DP1, 0.0);
    rows.set(local, branch::LOAD_VEC_BRANCHES, m - m_set);
}

/// Element rows of a branch table: `(element, first row, last row)`.
pub fn element_rows(lookups: &Lookups, table: &str, elements: &[usize]) -> Vec<(usize, usize, usize)> {
    elements
        .iter()
        .filter_map(|&e| lookups.branch.row_of(table, e).map(|r| (e, r, r)))
        .collect()
}

/// Standard branch results for elements spanning `first..=last` rows.
pub fn branch_results(
    ctx: &ResultContext<'_>,
    table: &'static str,
    rows: &[(usize, usize, usize)],
) -> ResultTable {
    let mut out = ResultTable::new(table, rows.iter().map(|r| r.0).collect());
    let n = rows.len();
    let mut v_mean = vec![f64::NAN; n];
    let mut p_from = vec![f64::NAN; n];
    let mut p_to = vec![f64::NAN; n];
    let mut t_from = vec![f64::NAN; n];
    let mut t_to = vec![f64::NAN; n];
    let mut mdot_from = vec![f64::NAN; n];
    let mut mdot_to = vec![f64::NAN; n];
    let mut vdot = vec![f64::NAN; n];
    let mut re = vec![f64::NAN; n];
    let mut lambda = vec![f64::NAN; n];

    let b = ctx.branch;
    for (i, &(_, first, last)) in rows.iter().enumerate() {
        if !ctx.branch_hydraulic(first) {
            continue;
        }
        let (Some(fnode), Some(tnode)) = (
            b.get_index(first, branch::FROM_NODE),
            b.get_index(last, branch::TO_NODE),
        ) else {
            continue;
        };
        let m = b.get(first, branch::MDOTINIT);
        let rho = b.get(first, branch::RHO);
        let area = b.get(first, branch::AREA);
        v_mean[i] = m / (rho * area);
        vdot[i] = m / rho;
        mdot_from[i] = m;
        mdot_to[i] = -m;
        p_from[i] = ctx.node.get(fnode, node::PINIT);
        p_to[i] = ctx.node.get(tnode, node::PINIT);
        re[i] = b.get(first, branch::RE);
        lambda[i] = b.get(first, branch::LAMBDA);

        if ctx.branch_thermal(first) {
            if m >= 0.0 {
                t_from[i] = ctx.node.get(fnode, node::TINIT);
                t_to[i] = b.get(last, branch::TOUTINIT);
            } else {
                t_from[i] = b.get(first, branch::TOUTINIT);
                t_to[i] = ctx.node.get(tnode, node::TINIT);
            }
        }
    }

    out.push_column("v_mean_m_per_s", v_mean);
    out.push_column("p_from_bar", p_from);
    out.push_column("p_to_bar", p_to);
    out.push_column("t_from_k", t_from);
    out.push_column("t_to_k", t_to);
    out.push_column("mdot_from_kg_per_s", mdot_from);
    out.push_column("mdot_to_kg_per_s", mdot_to);
    out.push_column("vdot_m3_per_s", vdot);
    out.push_column("reynolds", re);
    out.push_column("lambda", lambda);
    out
}
