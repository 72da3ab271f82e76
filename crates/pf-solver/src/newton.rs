//! Damped Newton iteration shared by the hydraulic and thermal calculations.

use pf_core::numeric::mean_norm;
use pf_pit::Mode;
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::linear::LinearSolver;
use crate::options::{ConvergenceCriterion, NonlinearMethod};
use crate::system::LinearSystem;

/// Smallest damping factor of the automatic method.
pub const ALPHA_MIN: f64 = 1e-3;

/// Newton iteration configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Initial (or constant) damping factor
    pub alpha: f64,
    pub method: NonlinearMethod,
    pub criterion: ConvergenceCriterion,
    /// Tolerance of the residual norm
    pub tol_res: f64,
}

/// Mean norm of the update of one group of unknowns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub name: &'static str,
    pub abs: f64,
    pub rel: f64,
    pub tol: f64,
}

impl Change {
    /// Norms of the applied update `step` on the new values `x`.
    pub fn measure(name: &'static str, step: &[f64], x: &[f64], tol: f64) -> Self {
        let rel = step.iter().zip(x).map(|(&d, &v)| {
            if v.abs() > f64::EPSILON {
                d / v
            } else {
                d
            }
        });
        Self {
            name,
            abs: mean_norm(step.iter().copied()),
            rel: mean_norm(rel),
            tol,
        }
    }
}

/// One mode's nonlinear system as seen by the iteration.
pub trait NewtonSystem {
    fn mode(&self) -> Mode;

    /// Run the hooks and derivatives at the current state and assemble.
    fn assemble(&mut self) -> SolverResult<LinearSystem>;

    /// Apply `alpha * dx` and report the change per group of unknowns.
    fn apply(&mut self, dx: &[f64], alpha: f64) -> Vec<Change>;

    /// Bring derived quantities in line with the final state.
    fn finish(&mut self) -> SolverResult<()> {
        Ok(())
    }
}

/// Outcome of a converged iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonResult {
    pub mode: Mode,
    pub iterations: usize,
    /// Residual norm of the last assembled system
    pub residual_norm: f64,
    pub changes: Vec<Change>,
    /// Damping factor of the last step
    pub alpha: f64,
    pub converged: bool,
}

fn is_converged(criterion: ConvergenceCriterion, changes: &[Change], residual: f64, tol_res: f64) -> bool {
    let change_ok = changes.iter().all(|c| c.abs <= c.tol);
    let relative_ok = changes.iter().all(|c| c.rel <= c.tol);
    let residual_ok = residual <= tol_res;
    match criterion {
        ConvergenceCriterion::Change => change_ok,
        ConvergenceCriterion::RelativeChange => relative_ok,
        ConvergenceCriterion::Residual => residual_ok,
        ConvergenceCriterion::Combined => change_ok && residual_ok,
    }
}

/// Next damping factor: shrink when any error grew, grow otherwise.
pub fn adapt_alpha(alpha: f64, previous: &[f64], current: &[f64]) -> f64 {
    let grew = previous.iter().zip(current).any(|(p, c)| c > p);
    if grew {
        (alpha / 10.0).max(ALPHA_MIN)
    } else {
        (alpha * 10.0).min(1.0)
    }
}

/// Iterate until the configured criterion holds.
///
/// Fails with [`SolverError::NotConverged`] when the iteration cap is hit.
pub fn newton_solve<S: NewtonSystem>(
    system: &mut S,
    linear: &dyn LinearSolver,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult> {
    let mode = system.mode();
    let mut alpha = config.alpha;
    let mut previous_errors: Option<Vec<f64>> = None;

    for iteration in 1..=config.max_iterations {
        let sys = system.assemble()?;
        let residual_norm = mean_norm(sys.residual.iter().copied());
        let rhs: Vec<f64> = sys.residual.iter().map(|v| -v).collect();
        let dx = linear.solve(&sys.jacobian, &rhs)?;
        let changes = system.apply(&dx, alpha);

        debug!(
            mode = mode.name(),
            iteration,
            residual_norm,
            alpha,
            changes = ?changes.iter().map(|c| (c.name, c.abs)).collect::<Vec<_>>(),
            "newton iteration"
        );

        if is_converged(config.criterion, &changes, residual_norm, config.tol_res) {
            system.finish()?;
            return Ok(NewtonResult {
                mode,
                iterations: iteration,
                residual_norm,
                changes,
                alpha,
                converged: true,
            });
        }

        if config.method == NonlinearMethod::Automatic {
            let errors: Vec<f64> = changes
                .iter()
                .map(|c| c.abs)
                .chain(std::iter::once(residual_norm))
                .collect();
            if let Some(prev) = &previous_errors {
                alpha = adapt_alpha(alpha, prev, &errors);
            }
            previous_errors = Some(errors);
        }
    }

    Err(SolverError::NotConverged {
        what: format!(
            "the {} calculation did not converge within {} iterations",
            mode.name(),
            config.max_iterations
        ),
    })
}

#[cfg(test)]
mod tests {
    use nalgebra_sparse::{CooMatrix, CscMatrix};

    use super::*;
    use crate::linear::DenseLu;

    /// x² - 4 = 0
    struct Quadratic {
        x: f64,
    }

    impl NewtonSystem for Quadratic {
        fn mode(&self) -> Mode {
            Mode::Hydraulics
        }

        fn assemble(&mut self) -> SolverResult<LinearSystem> {
            let mut coo = CooMatrix::new(1, 1);
            coo.push(0, 0, 2.0 * self.x);
            Ok(LinearSystem {
                jacobian: CscMatrix::from(&coo),
                residual: vec![self.x * self.x - 4.0],
            })
        }

        fn apply(&mut self, dx: &[f64], alpha: f64) -> Vec<Change> {
            let step = [alpha * dx[0]];
            self.x += step[0];
            vec![Change::measure("x", &step, &[self.x], 1e-10)]
        }
    }

    fn config(max_iterations: usize) -> NewtonConfig {
        NewtonConfig {
            max_iterations,
            alpha: 1.0,
            method: NonlinearMethod::Constant,
            criterion: ConvergenceCriterion::Combined,
            tol_res: 1e-10,
        }
    }

    #[test]
    fn simple_quadratic() {
        let mut sys = Quadratic { x: 1.0 };
        let result = newton_solve(&mut sys, &DenseLu, &config(50)).unwrap();
        assert!(result.converged);
        assert!((sys.x - 2.0).abs() < 1e-10);
    }

    #[test]
    fn iteration_cap_is_not_converged() {
        let mut sys = Quadratic { x: 100.0 };
        let err = newton_solve(&mut sys, &DenseLu, &config(2)).unwrap_err();
        assert!(err.is_not_converged());
        assert!(err.to_string().contains("hydraulics"));
    }

    #[test]
    fn alpha_adaption() {
        assert_eq!(adapt_alpha(1.0, &[1.0, 1.0], &[0.5, 2.0]), 0.1);
        assert_eq!(adapt_alpha(0.1, &[1.0], &[0.5]), 1.0);
        assert_eq!(adapt_alpha(1e-3, &[1.0], &[2.0]), ALPHA_MIN);
    }

    #[test]
    fn residual_criterion_ignores_changes() {
        let changes = [Change {
            name: "p",
            abs: 1.0,
            rel: 1.0,
            tol: 1e-5,
        }];
        assert!(is_converged(ConvergenceCriterion::Residual, &changes, 1e-6, 1e-3));
        assert!(!is_converged(ConvergenceCriterion::Combined, &changes, 1e-6, 1e-3));
        assert!(!is_converged(ConvergenceCriterion::Change, &changes, 1e-6, 1e-3));
    }
}
