//! Ellipsoid barrier.
//!
//! The ellipsoid `{x : ⟨x, Mx⟩ ≤ 1}` with `M` positive definite carries the
//! log barrier
//!
//! φ(x) = -log(1 − ⟨x, Mx⟩)
//!
//! `M` is supplied through its eigendecomposition `M = U·diag(λ)·Uᵀ`, and all
//! operations are expressed through the two primitives `x ↦ Mx` and
//! `y ↦ M⁻¹y`, each two matrix contractions against `U` with a diagonal
//! rescale in between. `M` itself is only formed by `hessian`, which has to
//! produce a dense matrix per point anyway.
//!
//! # Derivatives
//!
//! - Gradient: ∇φ(x) = 2Mx / (1 − ⟨x, Mx⟩)
//! - Hessian: ∇²φ(x) = 2M/(1 − ⟨x, Mx⟩) + 4(Mx)(Mx)ᵀ/(1 − ⟨x, Mx⟩)²
//!
//! The gradient map inverts in closed form. For `g(x) = x/(1 − ⟨x, Mx⟩)` one
//! has `g⁻¹(z) = λ(z)·z` with `λ(z) = (−1 + √(4⟨z, Mz⟩ + 1))/(2⟨z, Mz⟩)`;
//! since ∇φ = 2M·g, composing `g⁻¹` with `y ↦ M⁻¹y/2` and simplifying leaves
//!
//! ∇φ⁻¹(y) = (−1 + √(1 + ⟨y, M⁻¹y⟩)) / ⟨y, M⁻¹y⟩ · M⁻¹y

use nalgebra::{DMatrix, DVector};

use super::traits::{Barrier, BarrierError, Hessian};
use crate::util::numerics::SLACK_FLOOR;

/// Eigendecomposition `M = rot · diag(eigvals) · rotᵀ` of a positive definite
/// matrix, fixed at construction.
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    /// Orthogonal `d × d` matrix of eigenvectors (one per column)
    pub rot: DMatrix<f64>,
    /// Positive eigenvalues, length `d`
    pub eigvals: DVector<f64>,
}

/// Ellipsoid `{x : ⟨x, Mx⟩ ≤ 1}`.
#[derive(Debug, Clone)]
pub struct EllipsoidBarrier {
    ellipsoid: Ellipsoid,
}

impl EllipsoidBarrier {
    /// Create an ellipsoid barrier from the eigendecomposition of `M`.
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        let d = ellipsoid.eigvals.len();
        assert!(d > 0, "ellipsoid must have positive dimension");
        assert_eq!(
            ellipsoid.rot.shape(),
            (d, d),
            "rotation must be square and match the eigenvalue count"
        );
        assert!(
            ellipsoid.eigvals.iter().all(|&l| l > 0.0),
            "ellipsoid eigenvalues must be positive"
        );
        Self { ellipsoid }
    }

    /// The eigendecomposition this barrier was built from.
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Rows `Uᵀxᵢ` for the whole batch: `X · U`.
    fn rotate(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(x.ncols(), self.dimension());
        x * &self.ellipsoid.rot
    }

    /// `⟨xᵢ, Mxᵢ⟩` per row.
    pub fn inner_product(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let utx = self.rotate(x);
        DVector::from_iterator(
            x.nrows(),
            (0..x.nrows()).map(|i| {
                utx.row(i)
                    .iter()
                    .zip(self.ellipsoid.eigvals.iter())
                    .map(|(v, l)| v * v * l)
                    .sum::<f64>()
            }),
        )
    }

    /// `⟨yᵢ, M⁻¹yᵢ⟩` per row.
    pub fn inverse_inner_product(&self, y: &DMatrix<f64>) -> DVector<f64> {
        let uty = self.rotate(y);
        DVector::from_iterator(
            y.nrows(),
            (0..y.nrows()).map(|i| {
                uty.row(i)
                    .iter()
                    .zip(self.ellipsoid.eigvals.iter())
                    .map(|(v, l)| v * v / l)
                    .sum::<f64>()
            }),
        )
    }

    /// `Mxᵢ` per row, via `(X·U)·diag(λ)·Uᵀ`.
    pub fn ellipsoid_map(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut utx = self.rotate(x);
        for (j, mut col) in utx.column_iter_mut().enumerate() {
            col *= self.ellipsoid.eigvals[j];
        }
        utx * self.ellipsoid.rot.transpose()
    }

    /// `M⁻¹yᵢ` per row, via `(Y·U)·diag(λ⁻¹)·Uᵀ`.
    pub fn inverse_ellipsoid_map(&self, y: &DMatrix<f64>) -> DMatrix<f64> {
        let mut uty = self.rotate(y);
        for (j, mut col) in uty.column_iter_mut().enumerate() {
            col *= 1.0 / self.ellipsoid.eigvals[j];
        }
        uty * self.ellipsoid.rot.transpose()
    }
}

impl Barrier for EllipsoidBarrier {
    fn dimension(&self) -> usize {
        self.ellipsoid.eigvals.len()
    }

    fn name(&self) -> &'static str {
        "EllipsoidBarrier"
    }

    fn feasibility(&self, x: &DMatrix<f64>) -> Vec<bool> {
        self.inner_product(x).iter().map(|&p| p <= 1.0).collect()
    }

    fn value(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let ip = self.inner_product(x);
        // Points on or outside the boundary contribute zero instead of a
        // non-finite log; feasibility is the membership test, not `value`.
        DVector::from_iterator(
            x.nrows(),
            ip.iter().map(|&p| {
                let p = if p >= 1.0 { 0.0 } else { p };
                -(-p).ln_1p()
            }),
        )
    }

    fn gradient(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let ip = self.inner_product(x);
        let mut mx = self.ellipsoid_map(x);
        for i in 0..x.nrows() {
            let one_minus = (1.0 - ip[i]).max(SLACK_FLOOR);
            let mut row = mx.row_mut(i);
            row *= 2.0 / one_minus;
        }
        mx
    }

    fn inverse_gradient(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, BarrierError> {
        // Floored so y = 0 maps to the centre instead of 0/0
        let yiy = self.inverse_inner_product(y);
        let mut inv = self.inverse_ellipsoid_map(y);
        for i in 0..y.nrows() {
            let q = yiy[i].max(SLACK_FLOOR);
            let lambda = (-1.0 + (1.0 + q).sqrt()) / q;
            let mut row = inv.row_mut(i);
            row *= lambda;
        }
        Ok(inv)
    }

    fn hessian(&self, x: &DMatrix<f64>) -> Hessian {
        let ip = self.inner_product(x);
        let mx = self.ellipsoid_map(x);

        // M = U·diag(λ)·Uᵀ, formed once per call
        let mut scaled = self.ellipsoid.rot.clone();
        for (j, mut col) in scaled.column_iter_mut().enumerate() {
            col *= self.ellipsoid.eigvals[j];
        }
        let m = scaled * self.ellipsoid.rot.transpose();

        let mats = (0..x.nrows())
            .map(|i| {
                let one_minus = (1.0 - ip[i]).max(SLACK_FLOOR);
                let scaled_mx = mx.row(i).transpose() * (2.0 / one_minus);
                let mut h = &m * (2.0 / one_minus);
                h += &scaled_mx * scaled_mx.transpose();
                h
            })
            .collect();
        Hessian::Full(mats)
    }

    fn boundary_to_interior_half(&self, x: &DMatrix<f64>) -> Result<Vec<bool>, BarrierError> {
        // Volume scales with the d/2 power of the squared-radius threshold
        let threshold = 0.5f64.powf(2.0 / self.dimension() as f64);
        Ok(self.inner_product(x).iter().map(|&p| p > threshold).collect())
    }
}
