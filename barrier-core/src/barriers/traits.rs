//! Barrier contract definition.
//!
//! This module defines the core interface that all barrier implementations
//! must satisfy: feasibility tests, barrier value, gradient, Hessian, the
//! inverse-gradient (mirror) map, and the boundary-half predicate.
//!
//! # Barrier Function
//!
//! A barrier is a Legendre-type convex function φ over an open convex domain:
//! finite inside, tending to +∞ toward the boundary, with a gradient map that
//! is a bijection from the domain onto ℝ^d. The inverse of that bijection is
//! what mirror-descent-style samplers step through, so it is part of the
//! contract wherever an implementation exists.
//!
//! # Coordinate Convention
//!
//! All methods operate on batches: an `n × d` matrix holds `n` query points,
//! one per row, with the trailing (column) axis as the ambient coordinate.
//! Methods are independent per row and never retain the batch.
//!
//! # Safety and Numerical Stability
//!
//! Barrier derivatives are mathematically defined only in the strict interior.
//! Implementations must still return finite values for boundary or exterior
//! points, by flooring slacks at [`crate::util::numerics::SLACK_FLOOR`] and
//! capping Hessian entries; callers that need exactness must keep their points
//! interior via `feasibility`.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Barrier errors.
#[derive(Error, Debug)]
pub enum BarrierError {
    /// The barrier does not implement the requested operation.
    ///
    /// Signals a capability gap, not a data problem: e.g. the polytope
    /// gradient map has no known closed-form inverse, and compositions have
    /// no joint inverse at all.
    #[error("`{op}` is not implemented for {barrier}")]
    Unsupported {
        /// Barrier that was queried
        barrier: &'static str,
        /// Operation that is missing
        op: &'static str,
    },

    /// Construction-time parameter validation failure.
    #[error("invalid barrier parameters: {0}")]
    InvalidArgument(String),
}

/// Batched Hessian of a barrier.
///
/// Barriers whose Hessian is diagonal (box, diagonal-matrix polytopes) return
/// the `Diag` variant and avoid materializing `d × d` matrices; everything
/// else returns one dense matrix per batch element. A barrier's
/// [`Barrier::diag_hess`] flag declares which variant its `hessian` produces.
#[derive(Debug, Clone)]
pub enum Hessian {
    /// `n × d` matrix; row `i` is the diagonal of `∇²φ(x_i)`.
    Diag(DMatrix<f64>),
    /// One dense `d × d` matrix per batch element.
    Full(Vec<DMatrix<f64>>),
}

impl Hessian {
    /// Number of batch elements covered.
    pub fn len(&self) -> usize {
        match self {
            Hessian::Diag(rows) => rows.nrows(),
            Hessian::Full(mats) => mats.len(),
        }
    }

    /// True when the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Densify into one `d × d` matrix per batch element.
    pub fn into_full(self) -> Vec<DMatrix<f64>> {
        match self {
            Hessian::Diag(rows) => (0..rows.nrows())
                .map(|i| DMatrix::from_diagonal(&rows.row(i).transpose()))
                .collect(),
            Hessian::Full(mats) => mats,
        }
    }

    /// Apply the Hessian of batch element `i` to a direction `v`.
    pub fn apply(&self, i: usize, v: &DVector<f64>) -> DVector<f64> {
        match self {
            Hessian::Diag(rows) => rows.row(i).transpose().component_mul(v),
            Hessian::Full(mats) => &mats[i] * v,
        }
    }
}

/// Core barrier interface.
///
/// All domain types (box, ellipsoid, simplex, polytope, compositions) implement
/// this trait to be used by samplers. Implementations are pure functions of
/// the query batch and the parameters fixed at construction, so a single
/// instance can be shared across threads for concurrent read-only queries.
pub trait Barrier: Send + Sync {
    /// Ambient dimension `d` of the domain.
    fn dimension(&self) -> usize;

    /// Barrier name used in error messages.
    fn name(&self) -> &'static str;

    /// True when `hessian` returns the diagonal variant.
    fn diag_hess(&self) -> bool {
        false
    }

    /// Membership test for the closed domain (boundary inclusive), per row.
    fn feasibility(&self, x: &DMatrix<f64>) -> Vec<bool>;

    /// Barrier potential φ(x), one entry per row.
    fn value(&self, x: &DMatrix<f64>) -> DVector<f64>;

    /// Gradient ∇φ(x), one row per query row.
    fn gradient(&self, x: &DMatrix<f64>) -> DMatrix<f64>;

    /// Hessian ∇²φ(x); diagonal variant iff `diag_hess` is true.
    fn hessian(&self, x: &DMatrix<f64>) -> Hessian;

    /// Inverse of the gradient map: the unique `x` with `∇φ(x) = y`, per row.
    ///
    /// Errs with [`BarrierError::Unsupported`] where no implementation
    /// exists; callers must check capability before relying on it.
    fn inverse_gradient(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, BarrierError> {
        let _ = y;
        Err(BarrierError::Unsupported {
            barrier: self.name(),
            op: "inverse_gradient",
        })
    }

    /// True per row iff the point lies in the boundary-adjacent shell holding
    /// exactly half the domain's volume under the uniform distribution.
    fn boundary_to_interior_half(&self, x: &DMatrix<f64>) -> Result<Vec<bool>, BarrierError> {
        let _ = x;
        Err(BarrierError::Unsupported {
            barrier: self.name(),
            op: "boundary_to_interior_half",
        })
    }
}
