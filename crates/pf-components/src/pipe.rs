//! Pipes, optionally split into sections with internal nodes.

use pf_core::constants::p_correction_height_air;
use pf_net::Net;
use pf_pit::columns::node;
use pf_pit::{BranchType, Lookups, NodeType, NodeTypeT};

use crate::common::{BranchInit, branch_results, index_lookup, init_branch_row, junction_row};
use crate::context::{BuildContext, ResultContext};
use crate::error::{ComponentError, ComponentResult};
use crate::results::ResultTable;
use crate::traits::{Component, ComponentKind, DType};

pub const TABLE: &str = "pipe";

/// A pipe of `n` sections owns `n` branch rows and `n - 1` internal nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipeComponent;

impl Component for PipeComponent {
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
            ("length_m", DType::Float),
            ("diameter_m", DType::Float),
            ("k_m", DType::Float),
            ("loss_coefficient", DType::Float),
            ("alpha_w_per_m2k", DType::Float),
            ("text_k", DType::Float),
            ("qext_w", DType::Float),
            ("sections", DType::Index),
            ("in_service", DType::Bool),
        ]
    }

    fn node_pit_rows(&self, net: &Net) -> usize {
        net.pipe.rows().iter().map(|p| p.sections.max(1) - 1).sum()
    }

    fn branch_pit_rows(&self, net: &Net) -> usize {
        net.pipe.rows().iter().map(|p| p.sections.max(1)).sum()
    }

    fn create_lookups(&self, net: &Net, lookups: &mut Lookups) -> ComponentResult<()> {
        let range = lookups
            .branch
            .range(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;
        let lookup = index_lookup(
            range.start,
            net.pipe.iter().map(|(e, p)| (e, p.sections.max(1))),
        );
        lookups.branch.set_index(TABLE, lookup);
        Ok(())
    }

    fn create_pit_node_entries(&self, ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        let Some(range) = ctx.lookups.node.range(TABLE) else {
            return Ok(());
        };
        let table_id = ctx
            .lookups
            .node
            .registry
            .id(TABLE)
            .ok_or(ComponentError::MissingTable { name: TABLE })?;

        let net = ctx.net;
        let mut row = range.start;
        for (element, pipe) in net.pipe.iter() {
            let sections = pipe.sections.max(1);
            if sections == 1 {
                continue;
            }
            let jf = junction_row(ctx.lookups, TABLE, element, pipe.from_junction)?;
            let jt = junction_row(ctx.lookups, TABLE, element, pipe.to_junction)?;
            let interp = |col: usize, frac: f64| {
                let a = ctx.node.get(jf, col);
                let b = ctx.node.get(jt, col);
                a + frac * (b - a)
            };
            let values: Vec<(f64, f64, f64)> = (1..sections)
                .map(|s| {
                    let frac = s as f64 / sections as f64;
                    (
                        interp(node::PINIT, frac),
                        interp(node::TINIT, frac),
                        interp(node::HEIGHT, frac),
                    )
                })
                .collect();

            for (p, t, h) in values {
                let n = &mut *ctx.node;
                n.set(row, node::TABLE_IDX, table_id as f64);
                n.set(row, node::ELEMENT_IDX, element as f64);
                n.set(row, node::NODE_TYPE, NodeType::L.code());
                n.set_flag(row, node::ACTIVE, pipe.in_service);
                n.set(row, node::RHO, ctx.fluid.density(t));
                n.set(row, node::PINIT, p);
                n.set(row, node::LOAD, 0.0);
                n.set(row, node::HEIGHT, h);
                n.set(row, node::TINIT, t);
                n.set(row, node::PAMB, p_correction_height_air(h));
                n.set(row, node::LOAD_T, 0.0);
                n.set(row, node::NODE_TYPE_T, NodeTypeT::L.code());
                for col in [
                    node::MDOTSLACKINIT,
                    node::VAR_MASS_SLACK,
                    node::EXT_GRID_OCCURENCE,
                    node::EXT_GRID_OCCURENCE_T,
                    node::INFEED,
                ] {
                    n.set(row, col, 0.0);
                }
                row += 1;
            }
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
        let mut internal = ctx.lookups.node.range(TABLE).map_or(0, |r| r.start);
        let mut row = range.start;

        for (element, pipe) in net.pipe.iter() {
            let sections = pipe.sections.max(1);
            let jf = junction_row(ctx.lookups, TABLE, element, pipe.from_junction)?;
            let jt = junction_row(ctx.lookups, TABLE, element, pipe.to_junction)?;
            let text = pipe.text_k.unwrap_or(ctx.settings.ambient_temperature);
            let n_sec = sections as f64;

            for s in 0..sections {
                let from = if s == 0 { jf } else { internal + s - 1 };
                let to = if s + 1 == sections { jt } else { internal + s };
                let init = BranchInit {
                    element,
                    from,
                    to,
                    active: pipe.in_service,
                    length: pipe.length_m / n_sec,
                    d: pipe.diameter_m,
                    k: pipe.k_m,
                    lc: pipe.loss_coefficient / n_sec,
                    alpha: pipe.alpha_w_per_m2k,
                    text,
                    qext: pipe.qext_w / n_sec,
                    branch_type: BranchType::Normal,
                };
                init_branch_row(ctx, TABLE, row, &init)?;
                row += 1;
            }
            internal += sections - 1;
        }
        Ok(())
    }

    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>> {
        let rows: Vec<(usize, usize, usize)> = ctx
            .net
            .pipe
            .iter()
            .filter_map(|(e, p)| {
                let first = ctx.lookups.branch.row_of(TABLE, e)?;
                Some((e, first, first + p.sections.max(1) - 1))
            })
            .collect();
        Ok(Some(branch_results(ctx, TABLE, &rows)))
    }
}
