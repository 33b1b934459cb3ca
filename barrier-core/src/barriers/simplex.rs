//! Simplex barrier.
//!
//! The `d`-simplex `{x ≥ 0, ∑ xᵢ ≤ 1}` parameterised in ℝ^d, with the
//! `(d+1)`-th barycentric coordinate `1 − ∑ xᵢ` implicit:
//!
//! φ(x) = -∑ᵢ log(xᵢ) − log(1 − ∑ᵢ xᵢ)
//!
//! # Derivatives
//!
//! - Gradient: (∇φ)ᵢ = −1/xᵢ + 1/(1 − ∑ x)
//! - Hessian: diag(1/xᵢ²) + 𝟙𝟙ᵀ/(1 − ∑ x)², diagonal plus rank one, returned
//!   dense since the rank-one term couples every coordinate pair.
//!
//! The gradient map has no closed-form inverse. Substituting the ansatz
//! `xⱼ = c/(1 − c·yⱼ)` elementwise reduces `∇φ(x) = y` to a scalar root-find
//! in `c`, solved by bisection on a fixed budget (the residual is monotone on
//! the bracket).

use std::sync::OnceLock;

use nalgebra::{DMatrix, DVector};

use super::traits::{Barrier, BarrierError, Hessian};
use crate::util::numerics::SLACK_FLOOR;

fn bisection_trace_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        if let Ok(v) = std::env::var("BARRIER_VERBOSE") {
            if let Ok(n) = v.parse::<u8>() {
                return n >= 4;
            }
        }
        false
    })
}

/// Simplex `{x : xᵢ ≥ 0 for all i, ∑ xᵢ ≤ 1}` in ℝ^d.
#[derive(Debug, Clone)]
pub struct SimplexBarrier {
    dimension: usize,
}

impl SimplexBarrier {
    /// Create a simplex barrier of the given parameterisation dimension.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "simplex must have positive dimension");
        Self { dimension }
    }

    /// Ceiling on Hessian entries near the boundary.
    const HESS_CLAMP_MAX: f64 = 1e8;
    /// Bisection budget for the inverse-gradient solve. Each step halves a
    /// bracket contained in [0, 1], so the root is resolved to ~3e-11.
    const BISECTION_ITERS: usize = 35;

    /// `1 − ∑ xᵢ` per row, floored away from zero at the facet.
    fn safe_interior(&self, x: &DMatrix<f64>) -> DVector<f64> {
        assert_eq!(x.ncols(), self.dimension);
        DVector::from_iterator(
            x.nrows(),
            (0..x.nrows()).map(|i| (1.0 - x.row(i).iter().sum::<f64>()).max(SLACK_FLOOR)),
        )
    }
}

impl Barrier for SimplexBarrier {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "SimplexBarrier"
    }

    fn feasibility(&self, x: &DMatrix<f64>) -> Vec<bool> {
        assert_eq!(x.ncols(), self.dimension);
        (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                row.iter().sum::<f64>() <= 1.0 && row.iter().all(|&v| v >= 0.0)
            })
            .collect()
    }

    fn value(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let interior = self.safe_interior(x);
        DVector::from_iterator(
            x.nrows(),
            (0..x.nrows()).map(|i| {
                let coord_sum: f64 = x.row(i).iter().map(|&v| v.max(SLACK_FLOOR).ln()).sum();
                -coord_sum - interior[i].ln()
            }),
        )
    }

    fn gradient(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let interior = self.safe_interior(x);
        DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            -1.0 / x[(i, j)].max(SLACK_FLOOR) + 1.0 / interior[i]
        })
    }

    fn hessian(&self, x: &DMatrix<f64>) -> Hessian {
        let interior = self.safe_interior(x);
        let mats = (0..x.nrows())
            .map(|i| {
                let shared = (1.0 / (interior[i] * interior[i])).min(Self::HESS_CLAMP_MAX);
                DMatrix::from_fn(self.dimension, self.dimension, |r, c| {
                    if r == c {
                        let xr = x[(i, r)];
                        shared + (1.0 / (xr * xr)).min(Self::HESS_CLAMP_MAX)
                    } else {
                        shared
                    }
                })
            })
            .collect();
        Hessian::Full(mats)
    }

    fn inverse_gradient(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, BarrierError> {
        assert_eq!(y.ncols(), self.dimension);
        let mut out = DMatrix::zeros(y.nrows(), y.ncols());
        let trace = bisection_trace_enabled();

        for i in 0..y.nrows() {
            let row = y.row(i);
            let y_max = row.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

            // Bracket [0, c_upper]: the root satisfies c·y_j < 1 for all j,
            // so 1/max(y) bounds it from above when max(y) is positive.
            let mut c_upper = (1.0 / y_max).min(1.0);
            if c_upper < 0.0 {
                c_upper = 1.0;
            }
            let mut c_lower = 0.0f64;

            let residual = |c: f64| -> f64 {
                let s: f64 = row.iter().map(|&yj| 1.0 / (1.0 - c * yj)).sum();
                c + c * s - 1.0
            };

            for _ in 0..Self::BISECTION_ITERS {
                let c_middle = 0.5 * (c_lower + c_upper);
                if residual(c_middle) > 0.0 {
                    c_upper = c_middle;
                } else {
                    c_lower = c_middle;
                }
            }

            if trace {
                eprintln!(
                    "simplex bisection: row={}, c={:.6e}, residual={:.3e}",
                    i,
                    c_upper,
                    residual(c_upper)
                );
            }

            for j in 0..y.ncols() {
                out[(i, j)] = (c_upper / (1.0 - c_upper * row[j])).max(SLACK_FLOOR);
            }
        }
        Ok(out)
    }

    fn boundary_to_interior_half(&self, x: &DMatrix<f64>) -> Result<Vec<bool>, BarrierError> {
        assert_eq!(x.ncols(), self.dimension);
        // The simplex scaled by c has volume c^d, so the half-volume shell is
        // where the coordinate sum exceeds 0.5^(1/d).
        let threshold = 0.5f64.powf(1.0 / self.dimension as f64);
        Ok((0..x.nrows())
            .map(|i| x.row(i).iter().sum::<f64>() > threshold)
            .collect())
    }
}
