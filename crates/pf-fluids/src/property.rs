//! Scalar property laws.

use crate::error::{FluidError, FluidResult};
use serde::{Deserialize, Serialize};

/// A property as a function of one variable (temperature or pressure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FluidProperty {
    Constant { value: f64 },
    /// `offset + slope * x`
    Linear { offset: f64, slope: f64 },
    /// Piecewise linear through the sample points, extrapolated with the
    /// outermost segments.
    Interpolated { x: Vec<f64>, y: Vec<f64> },
}

impl FluidProperty {
    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    pub fn linear(offset: f64, slope: f64) -> Self {
        Self::Linear { offset, slope }
    }

    /// Tabulated property; `x` must be strictly increasing.
    pub fn interpolated(
        what: &'static str,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> FluidResult<Self> {
        let prop = Self::Interpolated { x, y };
        prop.validate(what)?;
        Ok(prop)
    }

    pub fn validate(&self, what: &'static str) -> FluidResult<()> {
        match self {
            Self::Constant { value } if !value.is_finite() => Err(FluidError::InvalidTable {
                what,
                reason: "constant is not finite".into(),
            }),
            Self::Linear { offset, slope } if !(offset.is_finite() && slope.is_finite()) => {
                Err(FluidError::InvalidTable {
                    what,
                    reason: "linear coefficients are not finite".into(),
                })
            }
            Self::Interpolated { x, y } => {
                if x.len() != y.len() {
                    return Err(FluidError::InvalidTable {
                        what,
                        reason: format!("{} x values but {} y values", x.len(), y.len()),
                    });
                }
                if x.len() < 2 {
                    return Err(FluidError::InvalidTable {
                        what,
                        reason: "at least two samples are required".into(),
                    });
                }
                if x.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(FluidError::InvalidTable {
                        what,
                        reason: "x values must be strictly increasing".into(),
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Evaluate the property at `at`.
    pub fn value(&self, at: f64) -> f64 {
        match self {
            Self::Constant { value } => *value,
            Self::Linear { offset, slope } => offset + slope * at,
            Self::Interpolated { x, y } => {
                let i = segment(x, at);
                let t = (at - x[i]) / (x[i + 1] - x[i]);
                y[i] + t * (y[i + 1] - y[i])
            }
        }
    }

    /// First derivative with respect to the argument.
    pub fn derivative(&self, at: f64) -> f64 {
        match self {
            Self::Constant { .. } => 0.0,
            Self::Linear { slope, .. } => *slope,
            Self::Interpolated { x, y } => {
                let i = segment(x, at);
                (y[i + 1] - y[i]) / (x[i + 1] - x[i])
            }
        }
    }
}

/// Index of the segment `[x[i], x[i+1]]` used for `at` (clamped to the ends).
fn segment(x: &[f64], at: f64) -> usize {
    let last = x.len() - 2;
    match x.iter().position(|&xi| xi > at) {
        Some(0) => 0,
        Some(p) => (p - 1).min(last),
        None => last,
    }
}
