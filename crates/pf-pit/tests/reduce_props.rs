//! Property tests for table reduction.

use pf_pit::columns::{branch, node};
use pf_pit::types::Mode;
use pf_pit::{Connectivity, Lookups, Pit, reduce_pit, scatter_back};
use proptest::prelude::*;

/// A path graph over `mask.len()` nodes. Branch i joins nodes i and i+1 and is
/// connected when both of its nodes are.
fn path_pits(mask: &[bool]) -> (Pit, Pit, Connectivity, Lookups) {
    let n = mask.len();
    let mut lookups = Lookups::default();
    lookups.node.add_table("junction", n).unwrap();
    lookups.branch.add_table("pipe", n - 1).unwrap();

    let mut nodes = Pit::nan(n, node::COUNT);
    for r in 0..n {
        nodes.set(r, node::PINIT, r as f64);
    }
    let mut branches = Pit::nan(n - 1, branch::COUNT);
    let mut branch_mask = Vec::with_capacity(n - 1);
    for b in 0..n - 1 {
        branches.set(b, branch::FROM_NODE, b as f64);
        branches.set(b, branch::TO_NODE, (b + 1) as f64);
        branches.set(b, branch::CTRL_NODE, -1.0);
        branches.set(b, branch::MDOTINIT, b as f64 * 0.5);
        branch_mask.push(mask[b] && mask[b + 1]);
    }
    let conn = Connectivity {
        mode: Mode::Hydraulics,
        nodes: mask.to_vec(),
        branches: branch_mask,
    };
    (nodes, branches, conn, lookups)
}

proptest! {
    #[test]
    fn remap_is_monotonic(mask in prop::collection::vec(any::<bool>(), 2..40)) {
        let (nodes, branches, conn, lookups) = path_pits(&mask);
        let view = reduce_pit(&nodes, &branches, &conn, &lookups).unwrap();

        prop_assert_eq!(view.node.rows(), conn.n_nodes());
        prop_assert_eq!(view.branch.rows(), conn.n_branches());
        // Kept nodes stay in order, so their original PINIT is increasing.
        let p = view.node.column(node::PINIT);
        prop_assert!(p.windows(2).all(|w| w[0] < w[1]));
        for r in 0..view.branch.rows() {
            let f = view.branch.get_index(r, branch::FROM_NODE).unwrap();
            let t = view.branch.get_index(r, branch::TO_NODE).unwrap();
            prop_assert!(f < view.node.rows() && t < view.node.rows());
            prop_assert_eq!(t, f + 1);
        }
    }

    #[test]
    fn scatter_back_round_trip(
        mask in prop::collection::vec(any::<bool>(), 2..40),
        solved in -10.0f64..10.0,
    ) {
        let (mut nodes, mut branches, conn, lookups) = path_pits(&mask);
        let before_nodes = nodes.clone();
        let before_branches = branches.clone();

        let mut view = reduce_pit(&nodes, &branches, &conn, &lookups).unwrap();
        view.node.fill_column(node::PINIT, solved);
        view.branch.fill_column(branch::MDOTINIT, solved);
        scatter_back(&view, &mut nodes, &mut branches);

        for r in 0..nodes.rows() {
            let expected = if mask[r] { solved } else { before_nodes.get(r, node::PINIT) };
            prop_assert_eq!(nodes.get(r, node::PINIT), expected);
        }
        for b in 0..branches.rows() {
            let expected = if conn.branches[b] {
                solved
            } else {
                before_branches.get(b, branch::MDOTINIT)
            };
            prop_assert_eq!(branches.get(b, branch::MDOTINIT), expected);
            prop_assert_eq!(
                branches.get(b, branch::FROM_NODE),
                before_branches.get(b, branch::FROM_NODE)
            );
        }
    }
}
