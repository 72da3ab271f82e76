//! Assembly of the Newton systems from the derivative columns.
//!
//! Entries are pushed as coordinate triplets and summed on conversion to
//! compressed columns.

use nalgebra_sparse::{CooMatrix, CscMatrix};
use pf_pit::columns::{branch, node};
use pf_pit::{BranchType, NodeType, NodeTypeT, Pit};

use crate::derivatives::flow_ends;

/// Jacobian and residual of one Newton step.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub jacobian: CscMatrix<f64>,
    pub residual: Vec<f64>,
}

impl LinearSystem {
    pub fn size(&self) -> usize {
        self.residual.len()
    }
}

/// Unknowns of the hydraulic system: node pressures, branch mass flows and
/// one mass slack per pressure node.
#[derive(Debug, Clone, PartialEq)]
pub struct HydraulicLayout {
    pub n_nodes: usize,
    pub n_branches: usize,
    /// Reduced node rows with a fixed pressure.
    pub slack_nodes: Vec<usize>,
}

impl HydraulicLayout {
    pub fn new(node_pit: &Pit, branch_pit: &Pit) -> Self {
        let slack_nodes = (0..node_pit.rows())
            .filter(|&r| NodeType::from_code(node_pit.get(r, node::NODE_TYPE)) == Some(NodeType::P))
            .collect();
        Self {
            n_nodes: node_pit.rows(),
            n_branches: branch_pit.rows(),
            slack_nodes,
        }
    }

    pub fn size(&self) -> usize {
        self.n_nodes + self.n_branches + self.slack_nodes.len()
    }

    pub fn p_col(&self, node_row: usize) -> usize {
        node_row
    }

    pub fn m_col(&self, branch_row: usize) -> usize {
        self.n_nodes + branch_row
    }

    /// Column of the `i`-th slack mass flow.
    pub fn slack_col(&self, i: usize) -> usize {
        self.n_nodes + self.n_branches + i
    }
}

/// Momentum rows, then node mass balances, then the fixed pressure rows.
pub fn assemble_hydraulic(node_pit: &Pit, branch_pit: &Pit, layout: &HydraulicLayout) -> LinearSystem {
    let n = layout.size();
    let nb = layout.n_branches;
    let mut coo = CooMatrix::new(n, n);
    let mut residual = vec![0.0; n];

    for b in 0..nb {
        let (Some(from), Some(to)) = (
            branch_pit.get_index(b, branch::FROM_NODE),
            branch_pit.get_index(b, branch::TO_NODE),
        ) else {
            // Row without both ends: keep the system regular.
            coo.push(b, layout.m_col(b), 1.0);
            continue;
        };
        residual[b] = branch_pit.get(b, branch::LOAD_VEC_BRANCHES);
        coo.push(b, layout.m_col(b), branch_pit.get(b, branch::JAC_DERIV_DM));
        coo.push(b, layout.p_col(from), branch_pit.get(b, branch::JAC_DERIV_DP));
        coo.push(b, layout.p_col(to), branch_pit.get(b, branch::JAC_DERIV_DP1));

        let is_pc = BranchType::from_code(branch_pit.get(b, branch::BRANCH_TYPE)) == Some(BranchType::Pc);
        if is_pc && branch_pit.flag(b, branch::CONTROL_ACTIVE) {
            if let Some(ctrl) = branch_pit.get_index(b, branch::CTRL_NODE) {
                coo.push(b, layout.p_col(ctrl), 1.0);
            }
        }

        let dm_node = branch_pit.get(b, branch::JAC_DERIV_DM_NODE);
        residual[nb + from] += branch_pit.get(b, branch::LOAD_VEC_NODES_FROM);
        residual[nb + to] += branch_pit.get(b, branch::LOAD_VEC_NODES_TO);
        coo.push(nb + from, layout.m_col(b), -dm_node);
        coo.push(nb + to, layout.m_col(b), dm_node);
    }

    for r in 0..layout.n_nodes {
        residual[nb + r] -= node_pit.get(r, node::LOAD);
    }

    let first_slack_row = nb + layout.n_nodes;
    for (i, &r) in layout.slack_nodes.iter().enumerate() {
        residual[nb + r] += node_pit.get(r, node::MDOTSLACKINIT);
        coo.push(nb + r, layout.slack_col(i), 1.0);
        coo.push(first_slack_row + i, layout.p_col(r), 1.0);
    }

    LinearSystem {
        jacobian: CscMatrix::from(&coo),
        residual,
    }
}

/// Unknowns of the thermal system: node temperatures, then branch outlet
/// temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalLayout {
    pub n_nodes: usize,
    pub n_branches: usize,
}

impl ThermalLayout {
    pub fn new(node_pit: &Pit, branch_pit: &Pit) -> Self {
        Self {
            n_nodes: node_pit.rows(),
            n_branches: branch_pit.rows(),
        }
    }

    pub fn size(&self) -> usize {
        self.n_nodes + self.n_branches
    }

    pub fn t_col(&self, node_row: usize) -> usize {
        node_row
    }

    pub fn tout_col(&self, branch_row: usize) -> usize {
        self.n_nodes + branch_row
    }
}

/// Energy rows of branches, then node mixing rows.
///
/// Temperature slacks and nodes without inflow keep their temperature.
pub fn assemble_thermal(node_pit: &Pit, branch_pit: &Pit, layout: &ThermalLayout) -> LinearSystem {
    let n = layout.size();
    let nb = layout.n_branches;
    let mut coo = CooMatrix::new(n, n);
    let mut residual = vec![0.0; n];

    let fixed: Vec<bool> = (0..layout.n_nodes)
        .map(|r| NodeTypeT::from_code(node_pit.get(r, node::NODE_TYPE_T)) == Some(NodeTypeT::T))
        .collect();
    let mut has_inflow = vec![false; layout.n_nodes];

    for b in 0..nb {
        let Some((inlet, outlet)) = flow_ends(branch_pit, b) else {
            coo.push(b, layout.tout_col(b), 1.0);
            continue;
        };
        residual[b] = branch_pit.get(b, branch::LOAD_VEC_BRANCHES_T);
        coo.push(b, layout.t_col(inlet), branch_pit.get(b, branch::JAC_DERIV_DT));
        coo.push(b, layout.tout_col(b), branch_pit.get(b, branch::JAC_DERIV_DTOUT));

        has_inflow[outlet] = true;
        if fixed[outlet] {
            continue;
        }
        residual[nb + outlet] += branch_pit.get(b, branch::LOAD_VEC_NODES_TO_T);
        coo.push(nb + outlet, layout.t_col(outlet), branch_pit.get(b, branch::JAC_DERIV_DT_NODE));
        coo.push(nb + outlet, layout.tout_col(b), branch_pit.get(b, branch::JAC_DERIV_DTOUT_NODE));
    }

    for r in 0..layout.n_nodes {
        if fixed[r] || !has_inflow[r] {
            residual[nb + r] = 0.0;
            coo.push(nb + r, layout.t_col(r), 1.0);
        }
    }

    LinearSystem {
        jacobian: CscMatrix::from(&coo),
        residual,
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DMatrix;

    use super::*;

    /// Slack node 0, one branch 0 -> 1, load 0.5 at node 1.
    fn two_node_pits() -> (Pit, Pit) {
        let mut node_pit = Pit::nan(2, node::COUNT);
        for r in 0..2 {
            node_pit.set(r, node::NODE_TYPE, NodeType::L.code());
            node_pit.set(r, node::NODE_TYPE_T, NodeTypeT::L.code());
            node_pit.set(r, node::LOAD, 0.0);
            node_pit.set(r, node::MDOTSLACKINIT, 0.0);
            node_pit.set(r, node::TINIT, 330.0);
        }
        node_pit.set(0, node::NODE_TYPE, NodeType::P.code());
        node_pit.set(0, node::NODE_TYPE_T, NodeTypeT::T.code());
        node_pit.set(1, node::LOAD, 0.5);

        let mut branch_pit = Pit::nan(1, branch::COUNT);
        branch_pit.set(0, branch::FROM_NODE, 0.0);
        branch_pit.set(0, branch::TO_NODE, 1.0);
        branch_pit.set(0, branch::BRANCH_TYPE, BranchType::Normal.code());
        branch_pit.set(0, branch::MDOTINIT, 0.2);
        branch_pit.set(0, branch::LOAD_VEC_BRANCHES, 0.1);
        branch_pit.set(0, branch::JAC_DERIV_DM, -0.3);
        branch_pit.set(0, branch::JAC_DERIV_DP, 1.0);
        branch_pit.set(0, branch::JAC_DERIV_DP1, -1.0);
        branch_pit.set(0, branch::LOAD_VEC_NODES_FROM, -0.2);
        branch_pit.set(0, branch::LOAD_VEC_NODES_TO, 0.2);
        branch_pit.set(0, branch::JAC_DERIV_DM_NODE, 1.0);
        (node_pit, branch_pit)
    }

    #[test]
    fn hydraulic_layout_and_entries() {
        let (node_pit, branch_pit) = two_node_pits();
        let layout = HydraulicLayout::new(&node_pit, &branch_pit);
        assert_eq!(layout.slack_nodes, vec![0]);
        assert_eq!(layout.size(), 4);

        let sys = assemble_hydraulic(&node_pit, &branch_pit, &layout);
        let j = DMatrix::from(&sys.jacobian);
        // columns: p0, p1, m0, slack0; rows: branch, node 0, node 1, p fix
        assert_eq!(j[(0, 0)], 1.0);
        assert_eq!(j[(0, 1)], -1.0);
        assert_eq!(j[(0, 2)], -0.3);
        assert_eq!(j[(1, 2)], -1.0);
        assert_eq!(j[(1, 3)], 1.0);
        assert_eq!(j[(2, 2)], 1.0);
        assert_eq!(j[(3, 0)], 1.0);
        assert_eq!(sys.residual, vec![0.1, -0.2, 0.2 - 0.5, 0.0]);
    }

    #[test]
    fn thermal_slack_rows_are_fixed() {
        let (node_pit, mut branch_pit) = two_node_pits();
        branch_pit.set(0, branch::LOAD_VEC_BRANCHES_T, 5.0);
        branch_pit.set(0, branch::JAC_DERIV_DT, -10.0);
        branch_pit.set(0, branch::JAC_DERIV_DTOUT, 11.0);
        branch_pit.set(0, branch::JAC_DERIV_DT_NODE, -10.5);
        branch_pit.set(0, branch::JAC_DERIV_DTOUT_NODE, 10.5);
        branch_pit.set(0, branch::LOAD_VEC_NODES_TO_T, 2.0);

        let layout = ThermalLayout::new(&node_pit, &branch_pit);
        let sys = assemble_thermal(&node_pit, &branch_pit, &layout);
        let j = DMatrix::from(&sys.jacobian);
        // columns: t0, t1, tout0; rows: branch, node 0, node 1
        assert_eq!(j[(0, 0)], -10.0);
        assert_eq!(j[(0, 2)], 11.0);
        assert_eq!(j[(1, 0)], 1.0);
        assert_eq!(j[(2, 1)], -10.5);
        assert_eq!(j[(2, 2)], 10.5);
        assert_eq!(sys.residual, vec![5.0, 0.0, 2.0]);
    }
}
