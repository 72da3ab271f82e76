//! Projection of the full pits onto the connected rows of one mode.

use crate::columns::branch;
use crate::connectivity::Connectivity;
use crate::error::PitResult;
use crate::lookup::{ActiveLookups, IndexLookup, Lookups, TableLookup};
use crate::pit::Pit;

/// Reduced pits of one mode together with the row maps back to the full pits.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedView {
    pub node: Pit,
    pub branch: Pit,
    /// Full pit row of every reduced node row.
    pub node_rows: Vec<usize>,
    /// Full pit row of every reduced branch row.
    pub branch_rows: Vec<usize>,
    pub active: ActiveLookups,
}

/// Keep the connected rows and remap node references to the compacted rows.
///
/// `CTRL_NODE` entries pointing at a pruned node become -1. When nothing is
/// pruned the pits are copied unchanged.
pub fn reduce_pit(
    node_pit: &Pit,
    branch_pit: &Pit,
    conn: &Connectivity,
    lookups: &Lookups,
) -> PitResult<ReducedView> {
    let node_rows: Vec<usize> = (0..node_pit.rows()).filter(|&r| conn.nodes[r]).collect();
    let branch_rows: Vec<usize> = (0..branch_pit.rows())
        .filter(|&r| conn.branches[r])
        .collect();

    let active = ActiveLookups {
        connectivity: conn.clone(),
        node: reduced_lookup(&lookups.node, &conn.nodes)?,
        branch: reduced_lookup(&lookups.branch, &conn.branches)?,
    };

    if conn.is_complete() {
        return Ok(ReducedView {
            node: node_pit.clone(),
            branch: branch_pit.clone(),
            node_rows,
            branch_rows,
            active,
        });
    }

    let remap = cumulative_remap(&conn.nodes);
    let node = node_pit.select_rows(&node_rows);
    let mut reduced_branch = branch_pit.select_rows(&branch_rows);
    for r in 0..reduced_branch.rows() {
        for col in branch::NODE_REFERENCES {
            let mapped = reduced_branch
                .get_index(r, col)
                .and_then(|full| remap.get(full).copied().flatten());
            reduced_branch.set(r, col, mapped.map_or(-1.0, |m| m as f64));
        }
    }

    Ok(ReducedView {
        node,
        branch: reduced_branch,
        node_rows,
        branch_rows,
        active,
    })
}

/// Write the reduced rows back into the full pits.
///
/// Rows that are not part of the view keep their values; node reference
/// columns of branches keep their full-pit numbering.
pub fn scatter_back(view: &ReducedView, node_pit: &mut Pit, branch_pit: &mut Pit) {
    for (i, &full) in view.node_rows.iter().enumerate() {
        node_pit.copy_row_from(full, &view.node, i, &[]);
    }
    for (i, &full) in view.branch_rows.iter().enumerate() {
        branch_pit.copy_row_from(full, &view.branch, i, &branch::NODE_REFERENCES);
    }
}

/// New row of every connected row (cumulative count minus one).
fn cumulative_remap(mask: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    mask.iter()
        .map(|&keep| {
            keep.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

fn reduced_lookup(full: &TableLookup, mask: &[bool]) -> PitResult<TableLookup> {
    let remap = cumulative_remap(mask);
    let mut reduced = TableLookup::with_registry(full.registry.clone());
    for (name, range) in full.from_to.iter() {
        let kept = range.filter(|&r| mask[r]).count();
        reduced.from_to.push(name, kept)?;
    }
    for (name, index) in full.index_tables() {
        let mut lookup = IndexLookup::default();
        for (element, row) in index.iter() {
            if let Some(new_row) = remap.get(row).copied().flatten() {
                lookup.insert(element, new_row);
            }
        }
        reduced.set_index(name, lookup);
    }
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::node;
    use crate::types::Mode;

    fn fixture() -> (Pit, Pit, Lookups) {
        let mut lookups = Lookups::default();
        lookups.node.add_table("junction", 4).unwrap();
        let mut jl = IndexLookup::default();
        for e in 0..4 {
            jl.insert(e, e);
        }
        lookups.node.set_index("junction", jl);
        lookups.branch.add_table("pipe", 2).unwrap();
        lookups.branch.add_table("valve", 1).unwrap();

        let mut nodes = Pit::nan(4, node::COUNT);
        nodes.set_column(node::PINIT, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut branches = Pit::nan(3, branch::COUNT);
        branches.set_column(branch::FROM_NODE, &[0.0, 2.0, 1.0]).unwrap();
        branches.set_column(branch::TO_NODE, &[2.0, 3.0, 3.0]).unwrap();
        branches.set_column(branch::CTRL_NODE, &[-1.0, 3.0, 1.0]).unwrap();
        (nodes, branches, lookups)
    }

    #[test]
    fn remaps_node_references() {
        let (nodes, branches, lookups) = fixture();
        let conn = Connectivity {
            mode: Mode::Hydraulics,
            nodes: vec![true, false, true, true],
            branches: vec![true, true, false],
        };
        let view = reduce_pit(&nodes, &branches, &conn, &lookups).unwrap();
        assert_eq!(view.node.column(node::PINIT), vec![1.0, 3.0, 4.0]);
        assert_eq!(view.branch.column(branch::FROM_NODE), vec![0.0, 1.0]);
        assert_eq!(view.branch.column(branch::TO_NODE), vec![1.0, 2.0]);
        assert_eq!(view.branch.column(branch::CTRL_NODE), vec![-1.0, 2.0]);
        assert_eq!(view.active.branch.range("valve"), Some(2..2));
        assert_eq!(view.active.node.row_of("junction", 1), None);
        assert_eq!(view.active.node.row_of("junction", 3), Some(2));
    }

    #[test]
    fn complete_connectivity_copies() {
        let (nodes, branches, lookups) = fixture();
        let conn = Connectivity {
            mode: Mode::Hydraulics,
            nodes: vec![true; 4],
            branches: vec![true; 3],
        };
        let view = reduce_pit(&nodes, &branches, &conn, &lookups).unwrap();
        assert_eq!(view.node, nodes);
        assert_eq!(view.branch, branches);
        assert_eq!(view.active.node, lookups.node);
    }

    #[test]
    fn scatter_back_leaves_pruned_rows() {
        let (mut nodes, mut branches, lookups) = fixture();
        let conn = Connectivity {
            mode: Mode::Hydraulics,
            nodes: vec![true, false, true, true],
            branches: vec![true, true, false],
        };
        let mut view = reduce_pit(&nodes, &branches, &conn, &lookups).unwrap();
        view.node.fill_column(node::PINIT, 9.0);
        view.branch.fill_column(branch::MDOTINIT, 0.5);
        scatter_back(&view, &mut nodes, &mut branches);

        assert_eq!(nodes.column(node::PINIT), vec![9.0, 2.0, 9.0, 9.0]);
        assert_eq!(branches.get(0, branch::MDOTINIT), 0.5);
        assert!(branches.get(2, branch::MDOTINIT).is_nan());
        // Full numbering is preserved.
        assert_eq!(branches.column(branch::TO_NODE), vec![2.0, 3.0, 3.0]);
    }
}
