//! Linear solvers for the Newton step.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;
use rsparse::data::Sprs;
use rsparse::{lsolve, lu, sqr, usolve};

use crate::error::{SolverError, SolverResult};
use crate::options::LinearSolverKind;

/// Threshold partial pivoting; 1.0 always takes the largest pivot.
const PIVOT_TOLERANCE: f64 = 1.0;

pub trait LinearSolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Solve `a x = b` for a square system.
    fn solve(&self, a: &CscMatrix<f64>, b: &[f64]) -> SolverResult<Vec<f64>>;
}

/// Sparse LU factorisation (symbolic analysis with column ordering, then
/// numeric factorisation).
#[derive(Debug, Default, Clone, Copy)]
pub struct SparseLu;

impl LinearSolver for SparseLu {
    fn name(&self) -> &'static str {
        "sparse-lu"
    }

    fn solve(&self, a: &CscMatrix<f64>, b: &[f64]) -> SolverResult<Vec<f64>> {
        let n = check_square(a, b)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let p: Vec<isize> = a.col_offsets().iter().map(|&v| v as isize).collect();
        let sprs = Sprs {
            m: n,
            n,
            i: a.row_indices().to_vec(),
            p,
            x: a.values().to_vec(),
            nzmax: a.nnz(),
        };
        let mut symbolic = sqr(&sprs, 1, false);
        let numeric = lu(&sprs, &mut symbolic, PIVOT_TOLERANCE).map_err(|_| singular())?;

        let mut x = vec![0.0; n];
        let mut out = vec![0.0; n];
        ipvec(&numeric.pinv, b, &mut x);
        lsolve(&numeric.l, &mut x);
        usolve(&numeric.u, &mut x);
        ipvec(&symbolic.q, &x, &mut out);
        finite(out)
    }
}

/// Dense LU of the assembled Jacobian, for small systems and cross checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenseLu;

impl LinearSolver for DenseLu {
    fn name(&self) -> &'static str {
        "dense-lu"
    }

    fn solve(&self, a: &CscMatrix<f64>, b: &[f64]) -> SolverResult<Vec<f64>> {
        check_square(a, b)?;
        let dense = DMatrix::from(a);
        let rhs = DVector::from_column_slice(b);
        let x = dense.lu().solve(&rhs).ok_or_else(singular)?;
        finite(x.as_slice().to_vec())
    }
}

/// Solver for the `linear_solver` option.
pub fn select_linear_solver(kind: LinearSolverKind) -> Box<dyn LinearSolver> {
    match kind {
        LinearSolverKind::SparseLu => Box::new(SparseLu),
        LinearSolverKind::DenseLu => Box::new(DenseLu),
    }
}

/// `x[p[k]] = b[k]`, or a copy without permutation.
fn ipvec(p: &Option<Vec<isize>>, b: &[f64], x: &mut [f64]) {
    match p {
        Some(perm) => {
            for (k, &pk) in perm.iter().enumerate().take(b.len()) {
                x[pk as usize] = b[k];
            }
        }
        None => x.copy_from_slice(b),
    }
}

fn check_square(a: &CscMatrix<f64>, b: &[f64]) -> SolverResult<usize> {
    if a.nrows() != a.ncols() || a.nrows() != b.len() {
        return Err(SolverError::Numeric {
            what: format!(
                "linear system of shape {}x{} with right hand side of length {}",
                a.nrows(),
                a.ncols(),
                b.len()
            ),
        });
    }
    Ok(a.nrows())
}

fn singular() -> SolverError {
    SolverError::NotConverged {
        what: "the Jacobian is singular".into(),
    }
}

fn finite(x: Vec<f64>) -> SolverResult<Vec<f64>> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(SolverError::NotConverged {
            what: "the Newton step is not finite, the Jacobian is singular".into(),
        })
    }
}
