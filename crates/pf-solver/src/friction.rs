//! Darcy friction factor models and their derivative with respect to the
//! mass flow.
//!
//! All models work on one branch at a time so that a derivative kernel can
//! evaluate branches independently. Mass flows below [`M_FLOOR`] are lifted
//! to it for the Reynolds number; the derivative is zero there.

use std::f64::consts::LN_10;

use crate::error::{SolverError, SolverResult};
use crate::options::FrictionModel;

/// Smallest mass flow magnitude entering the Reynolds number [kg/s].
pub const M_FLOOR: f64 = 1e-6;

/// Relative change of λ that ends the colebrook iteration.
pub const COLEBROOK_RTOL: f64 = 1e-5;

/// Geometry and viscosity of one branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionInput {
    /// Mass flow [kg/s].
    pub m: f64,
    /// Inner diameter [m].
    pub d: f64,
    /// Cross-section [m²].
    pub area: f64,
    /// Absolute roughness [m].
    pub k: f64,
    /// Dynamic viscosity [Pa·s].
    pub eta: f64,
}

impl FrictionInput {
    /// Reynolds number of the floored flow.
    pub fn reynolds(&self) -> f64 {
        self.m.abs().max(M_FLOOR) * self.d / (self.eta * self.area)
    }

    /// dRe/dm, zero below the floor.
    fn der_reynolds(&self) -> f64 {
        if self.m.abs() < M_FLOOR {
            0.0
        } else {
            self.m.signum() * self.d / (self.eta * self.area)
        }
    }

    fn relative_roughness(&self) -> f64 {
        self.k / self.d
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Friction {
    pub re: f64,
    pub lambda: f64,
    /// dλ/dm [s/kg].
    pub der_lambda: f64,
}

/// λ of the laminar/rough-turbulent blend.
pub fn nikuradse(input: &FrictionInput) -> Friction {
    let re = input.reynolds();
    let rough = nikuradse_rough(input.relative_roughness());
    Friction {
        re,
        lambda: 64.0 / re + rough,
        der_lambda: -64.0 / (re * re) * input.der_reynolds(),
    }
}

/// Fully rough limit `1 / (-2 log10(k / 3.71 d))²`.
fn nikuradse_rough(rel_k: f64) -> f64 {
    if rel_k <= 0.0 {
        return 0.0;
    }
    let l = -2.0 * (rel_k / 3.71).log10();
    1.0 / (l * l)
}

/// Closed form approximation of colebrook.
pub fn swamee_jain(input: &FrictionInput) -> Friction {
    let re = input.reynolds();
    let x = input.relative_roughness() / 3.7 + 5.74 / re.powf(0.9);
    let l = x.log10();
    let lambda = 0.25 / (l * l);
    let dx_dre = -0.9 * 5.74 * re.powf(-1.9);
    let dl_dre = dx_dre / (x * LN_10);
    Friction {
        re,
        lambda,
        der_lambda: -0.5 / (l * l * l) * dl_dre * input.der_reynolds(),
    }
}

/// Residual of `1/√λ = -2 log10(2.51 / (Re √λ) + k / 3.71 d)`.
fn colebrook_argument(re: f64, rel_k: f64, lambda: f64) -> f64 {
    2.51 / (re * lambda.sqrt()) + rel_k / 3.71
}

/// Fixed-point solution of colebrook started from `lambda0`.
///
/// Returns λ and the number of iterations, or `None` when the relative
/// change is still above [`COLEBROOK_RTOL`] after `max_iter` steps.
pub fn colebrook_lambda(re: f64, rel_k: f64, lambda0: f64, max_iter: usize) -> Option<(f64, usize)> {
    let mut lambda = lambda0;
    for iter in 1..=max_iter {
        let l = -2.0 * colebrook_argument(re, rel_k, lambda).log10();
        let next = 1.0 / (l * l);
        if !next.is_finite() || next <= 0.0 {
            return None;
        }
        let rel = ((next - lambda) / next).abs();
        lambda = next;
        if rel < COLEBROOK_RTOL {
            return Some((lambda, iter));
        }
    }
    None
}

/// Colebrook with dλ/dm from implicit differentiation.
pub fn colebrook(input: &FrictionInput, max_iter: usize) -> SolverResult<Friction> {
    let start = nikuradse(input);
    let re = start.re;
    let rel_k = input.relative_roughness();
    let (lambda, _) = colebrook_lambda(re, rel_k, start.lambda, max_iter).ok_or_else(|| {
        SolverError::NotConverged {
            what: format!(
                "the colebrook friction factor did not converge in {max_iter} iterations (Re = {re:.3e})"
            ),
        }
    })?;

    // g(λ, Re) = 1/√λ + 2 log10(u) with u = 2.51/(Re √λ) + k/3.71d
    let u = colebrook_argument(re, rel_k, lambda);
    let s3 = lambda.powf(1.5);
    let dg_dlambda = -0.5 / s3 * (1.0 + 2.0 * 2.51 / (u * LN_10 * re));
    let dg_dre = -2.0 * 2.51 / (u * LN_10 * re * re * lambda.sqrt());
    Ok(Friction {
        re,
        lambda,
        der_lambda: -dg_dre / dg_dlambda * input.der_reynolds(),
    })
}

/// λ of the selected model.
pub fn friction(model: FrictionModel, input: &FrictionInput, max_iter_colebrook: usize) -> SolverResult<Friction> {
    match model {
        FrictionModel::Nikuradse => Ok(nikuradse(input)),
        FrictionModel::SwameeJain => Ok(swamee_jain(input)),
        FrictionModel::Colebrook => colebrook(input, max_iter_colebrook),
    }
}
