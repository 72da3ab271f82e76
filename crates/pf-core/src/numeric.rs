/// Floating point type used throughout system
pub type Real = f64;

/// Euclidean norm divided by the number of entries (0 for empty input).
///
/// This is the norm every convergence check in the solver is measured in,
/// so a tolerance on it tightens as the network grows.
pub fn mean_norm(values: impl IntoIterator<Item = Real>) -> Real {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v * v;
        n += 1;
    }
    if n == 0 { 0.0 } else { sum.sqrt() / n as Real }
}
