//! Reachability of nodes and branches from slack nodes.
//!
//! An undirected graph is built from the active branches plus one virtual
//! super-node that is joined to every slack node. A breadth-first search from
//! the super-node marks the connected nodes; a branch is connected when it is
//! active and its from-node is connected.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use tracing::info;

use crate::columns::{branch, node};
use crate::error::{PitError, PitResult};
use crate::lookup::Lookups;
use crate::pit::Pit;
use crate::types::{Mode, NodeType, NodeTypeT};

/// Mass flows at or below this magnitude carry no heat.
pub const FLOW_ATOL: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityOptions {
    /// Run the graph search; otherwise only the active flags are used.
    pub check_connectivity: bool,
    /// Fail instead of reactivating out of service nodes that are reachable.
    pub quit_on_inconsistency: bool,
    /// Without graph search, a node is thermally active when the number of
    /// incident flow carrying branches exceeds this value.
    pub thermal_flow_count_threshold: f64,
}

impl Default for ConnectivityOptions {
    fn default() -> Self {
        Self {
            check_connectivity: true,
            quit_on_inconsistency: false,
            thermal_flow_count_threshold: 0.1,
        }
    }
}

/// Connected masks over the full pits.
#[derive(Debug, Clone, PartialEq)]
pub struct Connectivity {
    pub mode: Mode,
    pub nodes: Vec<bool>,
    pub branches: Vec<bool>,
}

impl Connectivity {
    pub fn n_nodes(&self) -> usize {
        self.nodes.iter().filter(|&&c| c).count()
    }

    pub fn n_branches(&self) -> usize {
        self.branches.iter().filter(|&&c| c).count()
    }

    /// True when nothing is pruned.
    pub fn is_complete(&self) -> bool {
        self.nodes.iter().all(|&c| c) && self.branches.iter().all(|&c| c)
    }
}

/// Hydraulic connectivity: slack nodes are active pressure nodes.
///
/// Circulation branches are left out of the search and reinstated when both
/// of their nodes are connected.
pub fn hydraulic_connectivity(
    node_pit: &Pit,
    branch_pit: &Pit,
    lookups: &Lookups,
    opts: &ConnectivityOptions,
) -> PitResult<Connectivity> {
    let mode = Mode::Hydraulics;
    let active_nodes: Vec<bool> = (0..node_pit.rows())
        .map(|r| node_pit.flag(r, node::ACTIVE))
        .collect();
    let active_branches: Vec<bool> = (0..branch_pit.rows())
        .map(|r| branch_pit.flag(r, branch::ACTIVE) && endpoints(branch_pit, r).is_some())
        .collect();

    let conn = if opts.check_connectivity {
        let circ: Vec<bool> = (0..branch_pit.rows())
            .map(|r| branch_pit.flag(r, branch::FLOW_RETURN_CONNECT))
            .collect();
        let searched: Vec<bool> = active_branches
            .iter()
            .zip(&circ)
            .map(|(&a, &c)| a && !c)
            .collect();
        let slack: Vec<usize> = (0..node_pit.rows())
            .filter(|&r| {
                active_nodes[r]
                    && NodeType::from_code(node_pit.get(r, node::NODE_TYPE)) == Some(NodeType::P)
            })
            .collect();

        let mut conn = search(
            mode,
            node_pit,
            branch_pit,
            lookups,
            &active_nodes,
            &searched,
            &slack,
            opts,
        )?;
        for (b, &is_circ) in circ.iter().enumerate() {
            if !is_circ {
                continue;
            }
            conn.branches[b] = active_branches[b]
                && endpoints(branch_pit, b).is_some_and(|(f, t)| conn.nodes[f] && conn.nodes[t]);
        }
        conn
    } else {
        let branches = (0..branch_pit.rows())
            .map(|b| {
                active_branches[b]
                    && endpoints(branch_pit, b)
                        .is_some_and(|(f, t)| active_nodes[f] && active_nodes[t])
            })
            .collect();
        Connectivity {
            mode,
            nodes: active_nodes,
            branches,
        }
    };

    ensure_supply(conn)
}

/// Thermal connectivity on top of a hydraulic result.
///
/// Only hydraulically connected branches with a non-negligible mass flow
/// (`MDOTINIT`) transport heat. Slack nodes are hydraulically connected
/// temperature nodes.
pub fn heat_connectivity(
    node_pit: &Pit,
    branch_pit: &Pit,
    hydraulic: &Connectivity,
    lookups: &Lookups,
    opts: &ConnectivityOptions,
) -> PitResult<Connectivity> {
    let mode = Mode::HeatTransfer;
    let flow_branches: Vec<bool> = (0..branch_pit.rows())
        .map(|b| {
            let m = branch_pit.get(b, branch::MDOTINIT);
            hydraulic.branches[b] && m.is_finite() && m.abs() > FLOW_ATOL
        })
        .collect();
    let active_nodes = hydraulic.nodes.clone();

    let conn = if opts.check_connectivity {
        let slack: Vec<usize> = (0..node_pit.rows())
            .filter(|&r| {
                active_nodes[r]
                    && NodeTypeT::from_code(node_pit.get(r, node::NODE_TYPE_T))
                        == Some(NodeTypeT::T)
            })
            .collect();
        search(
            mode,
            node_pit,
            branch_pit,
            lookups,
            &active_nodes,
            &flow_branches,
            &slack,
            opts,
        )?
    } else {
        let mut count = vec![0usize; node_pit.rows()];
        for b in (0..branch_pit.rows()).filter(|&b| flow_branches[b]) {
            if let Some((f, t)) = endpoints(branch_pit, b) {
                count[f] += 1;
                count[t] += 1;
            }
        }
        let nodes: Vec<bool> = active_nodes
            .iter()
            .zip(&count)
            .map(|(&a, &c)| a && c as f64 > opts.thermal_flow_count_threshold)
            .collect();
        let branches = (0..branch_pit.rows())
            .map(|b| {
                flow_branches[b]
                    && endpoints(branch_pit, b).is_some_and(|(f, t)| nodes[f] && nodes[t])
            })
            .collect();
        Connectivity {
            mode,
            nodes,
            branches,
        }
    };

    ensure_supply(conn)
}

fn endpoints(branch_pit: &Pit, b: usize) -> Option<(usize, usize)> {
    let f = branch_pit.get_index(b, branch::FROM_NODE)?;
    let t = branch_pit.get_index(b, branch::TO_NODE)?;
    Some((f, t))
}

fn ensure_supply(conn: Connectivity) -> PitResult<Connectivity> {
    if conn.nodes.iter().any(|&c| c) {
        Ok(conn)
    } else {
        Err(PitError::NoSupply {
            mode: conn.mode.name(),
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn search(
    mode: Mode,
    node_pit: &Pit,
    branch_pit: &Pit,
    lookups: &Lookups,
    active_nodes: &[bool],
    active_branches: &[bool],
    slack: &[usize],
    opts: &ConnectivityOptions,
) -> PitResult<Connectivity> {
    let n = node_pit.rows();
    let mut graph: UnGraph<(), ()> = UnGraph::with_capacity(n + 1, branch_pit.rows() + slack.len());
    for _ in 0..=n {
        graph.add_node(());
    }
    let root = NodeIndex::new(n);

    for b in (0..branch_pit.rows()).filter(|&b| active_branches[b]) {
        if let Some((f, t)) = endpoints(branch_pit, b) {
            graph.add_edge(NodeIndex::new(f), NodeIndex::new(t), ());
        }
    }
    for &s in slack {
        graph.add_edge(root, NodeIndex::new(s), ());
    }

    let mut reached = vec![false; n];
    let mut bfs = Bfs::new(&graph, root);
    while let Some(nx) = bfs.next(&graph) {
        if nx != root {
            reached[nx.index()] = true;
        }
    }

    let mut branches = vec![false; branch_pit.rows()];
    for b in (0..branch_pit.rows()).filter(|&b| active_branches[b]) {
        if let Some((f, t)) = endpoints(branch_pit, b) {
            if reached[f] != reached[t] {
                return Err(PitError::ConnectivitySymmetry { mode: mode.name() });
            }
            branches[b] = reached[f];
        }
    }

    let reactivated: Vec<usize> = (0..n).filter(|&r| reached[r] && !active_nodes[r]).collect();
    if !reactivated.is_empty() {
        let nodes = describe_nodes(node_pit, lookups, &reactivated);
        if opts.quit_on_inconsistency {
            return Err(PitError::InconsistentConnectivity {
                mode: mode.name(),
                nodes,
            });
        }
        info!(
            mode = mode.name(),
            "Some nodes are set out of service but are connected to slack nodes. \
             They are activated: {nodes}"
        );
    }

    let deactivated: Vec<usize> = (0..n).filter(|&r| !reached[r] && active_nodes[r]).collect();
    if !deactivated.is_empty() {
        info!(
            mode = mode.name(),
            "Nodes without connection to a slack node are set inactive: {}",
            describe_nodes(node_pit, lookups, &deactivated)
        );
    }

    Ok(Connectivity {
        mode,
        nodes: reached,
        branches,
    })
}

/// "in table junction: [1, 4]; in table pipe: [0]" (element indices).
fn describe_nodes(node_pit: &Pit, lookups: &Lookups, rows: &[usize]) -> String {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for &r in rows {
        let table = node_pit
            .get_index(r, node::TABLE_IDX)
            .and_then(|id| lookups.node.registry.name(id))
            .unwrap_or("unknown")
            .to_owned();
        let element = node_pit.get_index(r, node::ELEMENT_IDX).unwrap_or(r);
        match groups.iter_mut().find(|(t, _)| *t == table) {
            Some((_, v)) => v.push(element),
            None => groups.push((table, vec![element])),
        }
    }
    groups
        .iter()
        .map(|(t, v)| format!("in table {t}: {v:?}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BranchType;

    /// Chain 0 - 1 - 2 plus an isolated node 3; slack at node 0.
    fn chain() -> (Pit, Pit, Lookups) {
        let mut lookups = Lookups::default();
        let (jid, _) = lookups.node.add_table("junction", 4).unwrap();
        let (pid, _) = lookups.branch.add_table("pipe", 2).unwrap();

        let mut nodes = Pit::nan(4, node::COUNT);
        for r in 0..4 {
            nodes.set(r, node::TABLE_IDX, jid as f64);
            nodes.set(r, node::ELEMENT_IDX, r as f64);
            nodes.set_flag(r, node::ACTIVE, true);
            nodes.set(r, node::NODE_TYPE, NodeType::L.code());
            nodes.set(r, node::NODE_TYPE_T, NodeTypeT::L.code());
        }
        nodes.set(0, node::NODE_TYPE, NodeType::P.code());
        nodes.set(0, node::NODE_TYPE_T, NodeTypeT::T.code());

        let mut branches = Pit::nan(2, branch::COUNT);
        for (b, (f, t)) in [(0, 1), (1, 2)].into_iter().enumerate() {
            branches.set(b, branch::TABLE_IDX, pid as f64);
            branches.set(b, branch::FROM_NODE, f as f64);
            branches.set(b, branch::TO_NODE, t as f64);
            branches.set_flag(b, branch::ACTIVE, true);
            branches.set_flag(b, branch::FLOW_RETURN_CONNECT, false);
            branches.set(b, branch::BRANCH_TYPE, BranchType::Normal.code());
            branches.set(b, branch::MDOTINIT, 1.0);
        }
        (nodes, branches, lookups)
    }

    #[test]
    fn unreachable_node_is_inactive() {
        let (nodes, branches, lookups) = chain();
        let c = hydraulic_connectivity(&nodes, &branches, &lookups, &Default::default()).unwrap();
        assert_eq!(c.nodes, vec![true, true, true, false]);
        assert_eq!(c.branches, vec![true, true]);
    }

    #[test]
    fn out_of_service_but_reachable_node_is_reactivated() {
        let (mut nodes, branches, lookups) = chain();
        nodes.set_flag(2, node::ACTIVE, false);
        let c = hydraulic_connectivity(&nodes, &branches, &lookups, &Default::default()).unwrap();
        assert!(c.nodes[2]);

        let strict = ConnectivityOptions {
            quit_on_inconsistency: true,
            ..Default::default()
        };
        let err = hydraulic_connectivity(&nodes, &branches, &lookups, &strict).unwrap_err();
        match err {
            PitError::InconsistentConnectivity { nodes, .. } => {
                assert_eq!(nodes, "in table junction: [2]")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn no_slack_is_fatal() {
        let (mut nodes, branches, lookups) = chain();
        nodes.set(0, node::NODE_TYPE, NodeType::L.code());
        let err = hydraulic_connectivity(&nodes, &branches, &lookups, &Default::default());
        assert_eq!(err, Err(PitError::NoSupply { mode: "hydraulics" }));
    }

    #[test]
    fn circulation_branch_does_not_connect() {
        let (nodes, mut branches, lookups) = chain();
        // Node 3 only reachable through a circulation branch.
        branches.set(1, branch::TO_NODE, 3.0);
        branches.set_flag(1, branch::FLOW_RETURN_CONNECT, true);
        let c = hydraulic_connectivity(&nodes, &branches, &lookups, &Default::default()).unwrap();
        assert!(!c.nodes[3]);
        assert!(!c.branches[1]);
    }

    #[test]
    fn zero_flow_branch_is_thermally_inactive() {
        let (nodes, mut branches, lookups) = chain();
        branches.set(1, branch::MDOTINIT, 0.0);
        let opts = ConnectivityOptions::default();
        let h = hydraulic_connectivity(&nodes, &branches, &lookups, &opts).unwrap();
        let t = heat_connectivity(&nodes, &branches, &h, &lookups, &opts).unwrap();
        assert_eq!(t.nodes, vec![true, true, false, false]);
        assert_eq!(t.branches, vec![true, false]);

        let counted = ConnectivityOptions {
            check_connectivity: false,
            ..opts
        };
        let t2 = heat_connectivity(&nodes, &branches, &h, &lookups, &counted).unwrap();
        assert_eq!(t2.nodes, t.nodes);
    }
}
