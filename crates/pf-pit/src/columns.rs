//! Column layout of the node and branch pits.
//!
//! Units: pressures in bar (gauge), temperatures in K, mass flows in kg/s,
//! lengths in m, heat in W. Flags are stored as 0.0 / 1.0.

/// Node pit columns.
pub mod node {
    pub const TABLE_IDX: usize = 0;
    pub const ELEMENT_IDX: usize = 1;
    pub const NODE_TYPE: usize = 2;
    pub const ACTIVE: usize = 3;
    pub const RHO: usize = 4;
    pub const PINIT: usize = 5;
    /// Mass withdrawal (sinks positive, sources negative).
    pub const LOAD: usize = 6;
    pub const HEIGHT: usize = 7;
    pub const TINIT: usize = 8;
    /// Ambient pressure at the node height [bar, absolute].
    pub const PAMB: usize = 9;
    /// Heat withdrawal at the node [W].
    pub const LOAD_T: usize = 10;
    pub const NODE_TYPE_T: usize = 11;
    /// Slack mass flow injected at pressure slack nodes.
    pub const MDOTSLACKINIT: usize = 12;
    pub const VAR_MASS_SLACK: usize = 13;
    pub const EXT_GRID_OCCURENCE: usize = 14;
    pub const EXT_GRID_OCCURENCE_T: usize = 15;
    pub const INFEED: usize = 16;

    pub const COUNT: usize = 17;
}

/// Branch pit columns.
pub mod branch {
    pub const TABLE_IDX: usize = 0;
    pub const ELEMENT_IDX: usize = 1;
    pub const FROM_NODE: usize = 2;
    pub const TO_NODE: usize = 3;
    pub const ACTIVE: usize = 4;
    pub const LENGTH: usize = 5;
    pub const D: usize = 6;
    pub const AREA: usize = 7;
    /// Absolute roughness [m].
    pub const K: usize = 8;
    pub const LC: usize = 9;
    pub const RHO: usize = 10;
    pub const ETA: usize = 11;
    pub const RE: usize = 12;
    pub const LAMBDA: usize = 13;
    pub const MDOTINIT: usize = 14;
    /// Pressure lift [bar].
    pub const PL: usize = 15;
    /// Temperature lift [K].
    pub const TL: usize = 16;
    /// Heat transfer coefficient [W/(m²K)].
    pub const ALPHA: usize = 17;
    pub const TEXT: usize = 18;
    /// Heat extracted from the fluid [W].
    pub const QEXT: usize = 19;
    pub const TOUTINIT: usize = 20;
    pub const BRANCH_TYPE: usize = 21;
    pub const FLOW_RETURN_CONNECT: usize = 22;
    /// Pit row of the node governed by a control branch, -1 if none.
    pub const CTRL_NODE: usize = 23;
    pub const SETPOINT: usize = 24;
    pub const CONTROL_ACTIVE: usize = 25;
    pub const LOAD_VEC_BRANCHES: usize = 26;
    pub const JAC_DERIV_DM: usize = 27;
    pub const JAC_DERIV_DP: usize = 28;
    pub const JAC_DERIV_DP1: usize = 29;
    pub const LOAD_VEC_NODES_FROM: usize = 30;
    pub const LOAD_VEC_NODES_TO: usize = 31;
    pub const JAC_DERIV_DM_NODE: usize = 32;
    pub const LOAD_VEC_BRANCHES_T: usize = 33;
    pub const JAC_DERIV_DT: usize = 34;
    pub const JAC_DERIV_DTOUT: usize = 35;
    pub const JAC_DERIV_DT_NODE: usize = 36;
    pub const JAC_DERIV_DTOUT_NODE: usize = 37;
    pub const LOAD_VEC_NODES_FROM_T: usize = 38;
    pub const LOAD_VEC_NODES_TO_T: usize = 39;

    pub const COUNT: usize = 40;

    /// Columns that hold node pit rows and are remapped on reduction.
    pub const NODE_REFERENCES: [usize; 3] = [FROM_NODE, TO_NODE, CTRL_NODE];
}
