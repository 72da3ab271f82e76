//! The component contributor interface.

use pf_net::Net;
use pf_pit::ReducedView;

use crate::context::{BuildContext, ResultContext};
use crate::error::ComponentResult;
use crate::results::ResultTable;

/// Where a component lives in the pits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Owns node pit rows (junctions).
    Node,
    /// Owns branch pit rows (pipes, valves, ...).
    Branch,
    /// Writes into the node rows of the junctions it is attached to.
    NodeElement,
}

/// Declared type of an input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Bool,
    Index,
    Float,
    Str,
}

/// Contribution of one element table to the pipeflow.
///
/// A [`ComponentRegistry`](crate::ComponentRegistry) holds the components in
/// pit order. Row counts are queried once when the lookups are created; the
/// entry routines then fill exactly those rows. The adaption hooks run on the
/// reduced view of the current mode and must be idempotent.
pub trait Component: Send + Sync {
    /// Name of the element table (also the pit table name).
    fn table_name(&self) -> &'static str;

    fn kind(&self) -> ComponentKind;

    /// Input column holding the in/out of service flag.
    fn active_identifier(&self) -> &'static str {
        "in_service"
    }

    /// Input columns holding the connected junctions of a branch.
    fn from_to_node_cols(&self) -> Option<(&'static str, &'static str)> {
        None
    }

    /// Node table the component connects to.
    fn connected_node_table(&self) -> &'static str {
        "junction"
    }

    /// `(column, dtype)` pairs of the input table.
    fn input_schema(&self) -> &'static [(&'static str, DType)];

    /// Node pit rows owned by this table.
    fn node_pit_rows(&self, _net: &Net) -> usize {
        0
    }

    /// Branch pit rows owned by this table.
    fn branch_pit_rows(&self, _net: &Net) -> usize {
        0
    }

    /// Element index -> first row lookups, written once the ranges are known.
    fn create_lookups(
        &self,
        _net: &Net,
        _lookups: &mut pf_pit::Lookups,
    ) -> ComponentResult<()> {
        Ok(())
    }

    fn create_pit_node_entries(&self, _ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        Ok(())
    }

    fn create_pit_branch_entries(&self, _ctx: &mut BuildContext<'_>) -> ComponentResult<()> {
        Ok(())
    }

    /// Runs before the hydraulic derivatives of every iteration.
    fn adaption_before_derivatives_hydraulic(
        &self,
        _net: &Net,
        _view: &mut ReducedView,
    ) -> ComponentResult<()> {
        Ok(())
    }

    /// Runs after the generic hydraulic derivatives of every iteration.
    fn adaption_after_derivatives_hydraulic(
        &self,
        _net: &Net,
        _view: &mut ReducedView,
    ) -> ComponentResult<()> {
        Ok(())
    }

    /// Runs after the generic thermal derivatives of every iteration.
    fn adaption_after_derivatives_thermal(
        &self,
        _net: &Net,
        _view: &mut ReducedView,
    ) -> ComponentResult<()> {
        Ok(())
    }

    /// Result table of the element table, `None` for tables without results.
    fn extract_results(&self, ctx: &ResultContext<'_>) -> ComponentResult<Option<ResultTable>>;
}
