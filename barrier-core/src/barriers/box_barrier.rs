//! Axis-aligned box barrier.
//!
//! The box `[-a_1, a_1] × ... × [-a_d, a_d]` carries the log barrier
//!
//! φ(x) = -∑ᵢ log(aᵢ² − xᵢ²)
//!
//! # Derivatives
//!
//! - Gradient: (∇φ)ᵢ = 2xᵢ / (aᵢ² − xᵢ²)
//! - Hessian: diagonal, (∇²φ)ᵢᵢ = 2/(aᵢ² − xᵢ²) + 4xᵢ²/(aᵢ² − xᵢ²)²
//!
//! Everything separates per coordinate, so the gradient map inverts in closed
//! form coordinate-wise: solving `y = 2x/(a² − x²)` for the root inside
//! `(-a, a)` gives `x = (−1 + √(1 + a²y²)) / y`, with `x = 0` at `y = 0`.

use nalgebra::{DMatrix, DVector};

use super::traits::{Barrier, BarrierError, Hessian};
use crate::util::numerics::{close_to, SLACK_FLOOR};

/// Axis-aligned box `{x : |xᵢ| ≤ aᵢ for all i}`.
///
/// Parameterised by the positive half-widths `a`; the box is always centred
/// at the origin.
#[derive(Debug, Clone)]
pub struct BoxBarrier {
    /// Half-width per axis, all entries positive
    bounds: DVector<f64>,
}

impl BoxBarrier {
    /// Create a box barrier from per-axis half-widths.
    pub fn new(bounds: DVector<f64>) -> Self {
        assert!(!bounds.is_empty(), "box must have positive dimension");
        assert!(
            bounds.iter().all(|&a| a > 0.0),
            "box half-widths must be positive"
        );
        Self { bounds }
    }

    /// Ceiling on Hessian entries near the boundary.
    const HESS_CLAMP_MAX: f64 = 1e7;
    /// Tolerances for the `y ≈ 0` special case of the inverse gradient.
    const ZERO_RTOL: f64 = 1e-5;
    const ZERO_ATOL: f64 = 1e-7;

    /// Per-axis half-widths.
    pub fn bounds(&self) -> &DVector<f64> {
        &self.bounds
    }

    /// `aᵢ² − xᵢ²`, floored away from zero at the boundary.
    fn safe_diff(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(x.ncols(), self.dimension());
        DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            let a = self.bounds[j];
            let xij = x[(i, j)];
            (a * a - xij * xij).max(SLACK_FLOOR)
        })
    }
}

impl Barrier for BoxBarrier {
    fn dimension(&self) -> usize {
        self.bounds.len()
    }

    fn name(&self) -> &'static str {
        "BoxBarrier"
    }

    fn diag_hess(&self) -> bool {
        true
    }

    fn feasibility(&self, x: &DMatrix<f64>) -> Vec<bool> {
        assert_eq!(x.ncols(), self.dimension());
        (0..x.nrows())
            .map(|i| (0..x.ncols()).all(|j| x[(i, j)].abs() <= self.bounds[j]))
            .collect()
    }

    fn value(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let diff = self.safe_diff(x);
        DVector::from_iterator(
            x.nrows(),
            (0..x.nrows()).map(|i| -diff.row(i).iter().map(|v| v.ln()).sum::<f64>()),
        )
    }

    fn gradient(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let diff = self.safe_diff(x);
        x.zip_map(&diff, |xij, s| 2.0 * xij / s)
    }

    fn inverse_gradient(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, BarrierError> {
        assert_eq!(y.ncols(), self.dimension());
        Ok(DMatrix::from_fn(y.nrows(), y.ncols(), |i, j| {
            let yij = y[(i, j)];
            if close_to(yij, 0.0, Self::ZERO_RTOL, Self::ZERO_ATOL) {
                // the closed form is 0/0 at y = 0; the limit is x = 0
                0.0
            } else {
                let ay = self.bounds[j] * yij;
                (-1.0 + (1.0 + ay * ay).sqrt()) / yij
            }
        }))
    }

    fn hessian(&self, x: &DMatrix<f64>) -> Hessian {
        let diff = self.safe_diff(x);
        Hessian::Diag(x.zip_map(&diff, |xij, s| {
            let r = 1.0 / s;
            (2.0 * r + 4.0 * (xij * r) * (xij * r)).min(Self::HESS_CLAMP_MAX)
        }))
    }

    fn boundary_to_interior_half(&self, x: &DMatrix<f64>) -> Result<Vec<bool>, BarrierError> {
        assert_eq!(x.ncols(), self.dimension());
        // Scaling each axis by c scales the volume by c^d, so the inner box
        // holding half the volume has half-widths a · 0.5^(1/d).
        let shrink = 0.5f64.powf(1.0 / self.dimension() as f64);
        Ok((0..x.nrows())
            .map(|i| (0..x.ncols()).any(|j| x[(i, j)].abs() > self.bounds[j] * shrink))
            .collect())
    }
}
