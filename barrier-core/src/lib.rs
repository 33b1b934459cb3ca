//! Barrier-core: self-concordant barrier functions for constrained sampling.
//!
//! This library provides barrier functions over convex domains, the numeric
//! primitive consumed by constrained-sampling algorithms (Dikin walks,
//! mirror-Langevin, hit-and-run) that draw points from a convex body's
//! interior. Supported domains:
//!
//! - **Box**: axis-aligned boxes `[-a_1, a_1] × ... × [-a_d, a_d]`
//! - **Ellipsoid**: `{x : ⟨x, Mx⟩ ≤ 1}` with `M` given by its eigendecomposition
//! - **Simplex**: `{x ≥ 0, ∑ x_i ≤ 1}` in a `d`-dimensional parameterisation
//! - **Polytope**: `{x : Ax ≤ b}`, optionally weighted per constraint
//! - **Compositions**: intersections of the above over a shared ambient space
//!
//! Every barrier is a Legendre-type function: its gradient is a bijection from
//! the open domain onto ℝ^d, so it also exposes the inverse-gradient (mirror)
//! map where a closed form or a cheap iterative solve exists.
//!
//! # Batch convention
//!
//! All operations are batched: a set of `n` points in ℝ^d is a `DMatrix<f64>`
//! with one point per row. Scalar-per-point results come back as length-`n`
//! vectors, vector-per-point results as `n × d` matrices, and Hessians as a
//! [`Hessian`] that is either one diagonal per row or one dense `d × d` matrix
//! per point.
//!
//! # Example
//!
//! ```ignore
//! use barrier_core::{Barrier, BoxBarrier};
//! use nalgebra::{DMatrix, DVector};
//!
//! // The box [-1, 1]²
//! let barrier = BoxBarrier::new(DVector::from_element(2, 1.0));
//!
//! // Three query points, one per row
//! let x = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 0.5, -0.25, 0.9, 0.9]);
//!
//! let feas = barrier.feasibility(&x);   // [true, true, true]
//! let phi = barrier.value(&x);          // length-3 vector
//! let grad = barrier.gradient(&x);      // 3 × 2 matrix
//! ```
//!
//! # Numerical conventions
//!
//! Everything is `f64`. Barrier values, gradients, and Hessians are only
//! defined strictly inside each domain; rather than propagating NaN/Inf for
//! boundary or exterior points, slack-like quantities are floored at a small
//! positive constant and Hessian entries are capped near the boundary. See
//! [`util::numerics`] and the per-barrier documentation for the exact policy.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod barriers;
pub mod util;

// Re-export main types
pub use barriers::{
    Barrier, BarrierError, BoxBarrier, ComposeBarrier, ConstraintMatrix, Ellipsoid,
    EllipsoidBarrier, Hessian, Polytope, PolytopeBarrier, SimplexBarrier,
};
