//! Generic residuals and Jacobian entries of the branch equations.
//!
//! Residual convention: `LOAD_VEC_*` columns hold the residual `F` of an
//! equation at the current state, `JAC_DERIV_*` columns its partial
//! derivatives. The Newton step solves `J dx = -F`.
//!
//! Hydraulic branch residual [bar]:
//!
//! `F = p_from - p_to + PL + ρ g (h_from - h_to) / 1e5 - (λ L / D + LC) m|m| G`
//!
//! with `G = 1 / (2 ρ A² 1e5)` for liquids. For gases `ρ` is the normal
//! density and `G = p_n T Z(p_m) / (2 A² ρ_n T_n p_m 1e5)` on the absolute
//! mean pressure `p_m`, which makes the pressure derivatives depend on `Z'`.
//!
//! Thermal branch residual [W]:
//!
//! `F = cp |m| (T_out - T_in - TL) - α π D L (T_amb - (T_in + T_out) / 2) + QEXT`

use std::f64::consts::PI;

use pf_core::constants::{GRAVITATION_CONSTANT, NORMAL_PRESSURE, NORMAL_TEMPERATURE, P_CONVERSION};
use pf_fluids::FluidProvider;
use pf_pit::columns::{branch, node};
use pf_pit::{BranchType, NodeTypeT, Pit};
use tracing::warn;

use crate::error::SolverResult;
use crate::friction::{FrictionInput, M_FLOOR, friction};
use crate::kernel::DerivativeKernel;
use crate::options::FrictionModel;

/// Fluid and friction settings shared by all branches of one evaluation.
#[derive(Clone, Copy)]
pub struct FlowEquations<'a> {
    pub fluid: &'a dyn FluidProvider,
    pub friction_model: FrictionModel,
    pub max_iter_colebrook: usize,
}

/// State of one branch as seen by the hydraulic equations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicInput {
    pub m: f64,
    pub length: f64,
    pub d: f64,
    pub area: f64,
    pub k: f64,
    pub lc: f64,
    pub pl: f64,
    pub rho: f64,
    pub eta: f64,
    /// Gauge pressures of the end nodes [bar].
    pub p_from: f64,
    pub p_to: f64,
    /// Ambient pressures of the end nodes [bar].
    pub pamb_from: f64,
    pub pamb_to: f64,
    pub h_from: f64,
    pub h_to: f64,
    /// Mean fluid temperature [K].
    pub t_mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicOutput {
    pub re: f64,
    pub lambda: f64,
    pub load: f64,
    pub dm: f64,
    pub dp: f64,
    pub dp1: f64,
}

/// Absolute mean pressure of a gas pipe and its partial derivatives.
pub fn mean_pressure(a: f64, b: f64) -> (f64, f64, f64) {
    let s = a + b;
    let pm = 2.0 / 3.0 * (a * a + a * b + b * b) / s;
    let dpm_da = 2.0 / 3.0 * (a * a + 2.0 * a * b) / (s * s);
    let dpm_db = 2.0 / 3.0 * (b * b + 2.0 * a * b) / (s * s);
    (pm, dpm_da, dpm_db)
}

/// Residual and derivatives of one branch momentum equation.
///
/// λ only enters through `L / D`, so zero-length branches (valves, pumps,
/// controls) skip the colebrook iteration and keep the nikuradse value.
pub fn hydraulic_branch(input: &HydraulicInput, eq: &FlowEquations<'_>) -> SolverResult<HydraulicOutput> {
    let model = match eq.friction_model {
        FrictionModel::Colebrook if input.length == 0.0 => FrictionModel::Nikuradse,
        model => model,
    };
    let f = friction(
        model,
        &FrictionInput {
            m: input.m,
            d: input.d,
            area: input.area,
            k: input.k,
            eta: input.eta,
        },
        eq.max_iter_colebrook,
    )?;

    let m = input.m;
    let m_abs = m.abs();
    let l_over_d = if input.d > 0.0 { input.length / input.d } else { 0.0 };
    let zeta = f.lambda * l_over_d + input.lc;
    // d(zeta m|m|)/dm
    let dzeta_mm = l_over_d * f.der_lambda * m * m_abs + 2.0 * zeta * m_abs.max(M_FLOOR);
    let height = input.rho * GRAVITATION_CONSTANT * (input.h_from - input.h_to) / P_CONVERSION;
    let a2 = input.area * input.area;

    let (g, dg_dp_from, dg_dp_to) = if eq.fluid.is_gas() {
        let (pm, dpm_da, dpm_db) =
            mean_pressure(input.p_from + input.pamb_from, input.p_to + input.pamb_to);
        let c = NORMAL_PRESSURE * input.t_mean
            / (2.0 * a2 * input.rho * NORMAL_TEMPERATURE * P_CONVERSION);
        let z = eq.fluid.compressibility(pm);
        let dz = eq.fluid.der_compressibility(pm);
        let g = c * z / pm;
        let dg = c * (dz * pm - z) / (pm * pm);
        (g, dg * dpm_da, dg * dpm_db)
    } else {
        (1.0 / (2.0 * input.rho * a2 * P_CONVERSION), 0.0, 0.0)
    };

    let loss = zeta * m * m_abs;
    Ok(HydraulicOutput {
        re: f.re,
        lambda: f.lambda,
        load: input.p_from - input.p_to + input.pl + height - loss * g,
        dm: -dzeta_mm * g,
        dp: 1.0 - loss * dg_dp_from,
        dp1: -1.0 - loss * dg_dp_to,
    })
}

/// State of one branch as seen by the energy equation, in flow direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalInput {
    /// Mass flow magnitude [kg/s].
    pub m_abs: f64,
    pub cp: f64,
    pub alpha: f64,
    pub d: f64,
    pub length: f64,
    pub t_in: f64,
    pub t_out: f64,
    pub t_amb: f64,
    pub tl: f64,
    pub qext: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalOutput {
    pub load: f64,
    pub d_tin: f64,
    pub d_tout: f64,
}

pub fn thermal_branch(input: &ThermalInput) -> ThermalOutput {
    let mcp = input.cp * input.m_abs;
    let k_loss = input.alpha * PI * input.d * input.length;
    let t_mean = 0.5 * (input.t_in + input.t_out);
    ThermalOutput {
        load: mcp * (input.t_out - input.t_in - input.tl) - k_loss * (input.t_amb - t_mean)
            + input.qext,
        d_tin: -mcp + 0.5 * k_loss,
        d_tout: mcp + 0.5 * k_loss,
    }
}

/// Inlet, outlet node of a branch according to its current flow direction.
pub fn flow_ends(branch_pit: &Pit, row: usize) -> Option<(usize, usize)> {
    let from = branch_pit.get_index(row, branch::FROM_NODE)?;
    let to = branch_pit.get_index(row, branch::TO_NODE)?;
    if branch_pit.get(row, branch::MDOTINIT) >= 0.0 {
        Some((from, to))
    } else {
        Some((to, from))
    }
}

fn ends(branch_pit: &Pit, row: usize) -> Option<(usize, usize)> {
    Some((
        branch_pit.get_index(row, branch::FROM_NODE)?,
        branch_pit.get_index(row, branch::TO_NODE)?,
    ))
}

/// Refresh the temperature dependent fluid properties of nodes and branches.
pub fn update_fluid_properties(node_pit: &mut Pit, branch_pit: &mut Pit, fluid: &dyn FluidProvider) {
    for r in 0..node_pit.rows() {
        let t = node_pit.get(r, node::TINIT);
        node_pit.set(r, node::RHO, fluid.density(t));
    }
    for r in 0..branch_pit.rows() {
        let Some((f, t)) = ends(branch_pit, r) else {
            continue;
        };
        let t_mean = 0.5 * (node_pit.get(f, node::TINIT) + node_pit.get(t, node::TINIT));
        branch_pit.set(r, branch::RHO, fluid.density(t_mean));
        branch_pit.set(r, branch::ETA, fluid.viscosity(t_mean));
    }
}

/// Generic hydraulic pass over all branch rows of a reduced view.
pub fn calculate_derivatives_hydraulic(
    node_pit: &mut Pit,
    branch_pit: &mut Pit,
    eq: &FlowEquations<'_>,
    kernel: &dyn DerivativeKernel,
) -> SolverResult<()> {
    update_fluid_properties(node_pit, branch_pit, eq.fluid);

    let rows: Vec<(usize, usize, usize)> = (0..branch_pit.rows())
        .filter_map(|r| ends(branch_pit, r).map(|(f, t)| (r, f, t)))
        .collect();
    let inputs: Vec<HydraulicInput> = rows
        .iter()
        .map(|&(r, f, t)| HydraulicInput {
            m: branch_pit.get(r, branch::MDOTINIT),
            length: branch_pit.get(r, branch::LENGTH),
            d: branch_pit.get(r, branch::D),
            area: branch_pit.get(r, branch::AREA),
            k: branch_pit.get(r, branch::K),
            lc: branch_pit.get(r, branch::LC),
            pl: branch_pit.get(r, branch::PL),
            rho: branch_pit.get(r, branch::RHO),
            eta: branch_pit.get(r, branch::ETA),
            p_from: node_pit.get(f, node::PINIT),
            p_to: node_pit.get(t, node::PINIT),
            pamb_from: node_pit.get(f, node::PAMB),
            pamb_to: node_pit.get(t, node::PAMB),
            h_from: node_pit.get(f, node::HEIGHT),
            h_to: node_pit.get(t, node::HEIGHT),
            t_mean: 0.5 * (node_pit.get(f, node::TINIT) + node_pit.get(t, node::TINIT)),
        })
        .collect();

    let outputs = kernel.hydraulic(&inputs, eq)?;

    for (&(r, _, _), out) in rows.iter().zip(&outputs) {
        let m = branch_pit.get(r, branch::MDOTINIT);
        branch_pit.set(r, branch::RE, out.re);
        branch_pit.set(r, branch::LAMBDA, out.lambda);
        branch_pit.set(r, branch::LOAD_VEC_BRANCHES, out.load);
        branch_pit.set(r, branch::JAC_DERIV_DM, out.dm);
        branch_pit.set(r, branch::JAC_DERIV_DP, out.dp);
        branch_pit.set(r, branch::JAC_DERIV_DP1, out.dp1);
        branch_pit.set(r, branch::LOAD_VEC_NODES_FROM, -m);
        branch_pit.set(r, branch::LOAD_VEC_NODES_TO, m);
        branch_pit.set(r, branch::JAC_DERIV_DM_NODE, 1.0);
    }
    Ok(())
}

/// Generic thermal pass over all branch rows of a reduced view.
pub fn calculate_derivatives_thermal(
    node_pit: &mut Pit,
    branch_pit: &mut Pit,
    fluid: &dyn FluidProvider,
    kernel: &dyn DerivativeKernel,
) {
    let rows: Vec<(usize, usize, usize)> = (0..branch_pit.rows())
        .filter_map(|r| flow_ends(branch_pit, r).map(|(i, o)| (r, i, o)))
        .collect();
    let inputs: Vec<ThermalInput> = rows
        .iter()
        .map(|&(r, i, o)| {
            let t_in = node_pit.get(i, node::TINIT);
            let t_out = branch_pit.get(r, branch::TOUTINIT);
            ThermalInput {
                m_abs: branch_pit.get(r, branch::MDOTINIT).abs(),
                cp: fluid.heat_capacity(0.5 * (t_in + node_pit.get(o, node::TINIT))),
                alpha: branch_pit.get(r, branch::ALPHA),
                d: branch_pit.get(r, branch::D),
                length: branch_pit.get(r, branch::LENGTH),
                t_in,
                t_out,
                t_amb: branch_pit.get(r, branch::TEXT),
                tl: branch_pit.get(r, branch::TL),
                qext: branch_pit.get(r, branch::QEXT),
            }
        })
        .collect();

    let outputs = kernel.thermal(&inputs);

    for ((&(r, _, o), input), out) in rows.iter().zip(&inputs).zip(&outputs) {
        let mcp = input.m_abs * input.cp;
        branch_pit.set(r, branch::LOAD_VEC_BRANCHES_T, out.load);
        branch_pit.set(r, branch::JAC_DERIV_DT, out.d_tin);
        branch_pit.set(r, branch::JAC_DERIV_DTOUT, out.d_tout);
        branch_pit.set(r, branch::JAC_DERIV_DT_NODE, -mcp);
        branch_pit.set(r, branch::JAC_DERIV_DTOUT_NODE, mcp);
        branch_pit.set(r, branch::LOAD_VEC_NODES_FROM_T, 0.0);
        branch_pit.set(
            r,
            branch::LOAD_VEC_NODES_TO_T,
            mcp * (input.t_out - node_pit.get(o, node::TINIT)),
        );
    }

    mark_infeed(node_pit, branch_pit);
}

/// Flag inlet nodes of ordinary branches that no branch flows into.
pub fn mark_infeed(node_pit: &mut Pit, branch_pit: &Pit) {
    let mut is_inlet = vec![false; node_pit.rows()];
    let mut is_outlet = vec![false; node_pit.rows()];
    for r in 0..branch_pit.rows() {
        if BranchType::from_code(branch_pit.get(r, branch::BRANCH_TYPE)) == Some(BranchType::Circ) {
            continue;
        }
        if let Some((i, o)) = flow_ends(branch_pit, r) {
            is_inlet[i] = true;
            is_outlet[o] = true;
        }
    }
    for (n, (&inlet, &outlet)) in is_inlet.iter().zip(&is_outlet).enumerate() {
        node_pit.set_flag(n, node::INFEED, inlet && !outlet);
    }
}

/// Compare infeed nodes with temperature slacks.
///
/// Returns true when the counts match. When every node is a temperature
/// slack, all of them count as infeed.
pub fn check_infeed_number(node_pit: &mut Pit) -> bool {
    let slack: Vec<bool> = (0..node_pit.rows())
        .map(|r| NodeTypeT::from_code(node_pit.get(r, node::NODE_TYPE_T)) == Some(NodeTypeT::T))
        .collect();
    if slack.iter().all(|&s| s) {
        for r in 0..node_pit.rows() {
            node_pit.set_flag(r, node::INFEED, true);
        }
    }
    let n_infeed = (0..node_pit.rows())
        .filter(|&r| node_pit.flag(r, node::INFEED))
        .count();
    let n_slack = slack.iter().filter(|&&s| s).count();
    if n_infeed != n_slack {
        warn!(
            infeed = n_infeed,
            slacks = n_slack,
            "the number of infeeding nodes and temperature slacks does not match"
        );
        return false;
    }
    true
}
