//! Polytope barrier.
//!
//! The polytope `{x : Ax ≤ b}` with `m` half-space constraints carries the
//! (optionally weighted) log barrier
//!
//! φ(x) = -∑ᵢ wᵢ · log(bᵢ − ⟨Aᵢ, x⟩)
//!
//! with weights defaulting to 1. `A` may be given as a dense `m × d` matrix
//! or, for axis-aligned constraint normals, as a length-`d` diagonal; the
//! diagonal form keeps every operation elementwise and the Hessian diagonal.
//!
//! # Derivatives
//!
//! - Gradient: ∇φ(x) = ∑ᵢ Aᵢ · wᵢ/(bᵢ − ⟨Aᵢ, x⟩)
//! - Hessian: ∇²φ(x) = ∑ᵢ AᵢAᵢᵀ · wᵢ/(bᵢ − ⟨Aᵢ, x⟩)², a rank-one sum over
//!   constraints
//!
//! The gradient map (a sum of rational functions of `x`) has no known
//! closed-form inverse, so `inverse_gradient` is unsupported here.

use nalgebra::{DMatrix, DVector};

use super::traits::{Barrier, BarrierError, Hessian};
use crate::util::numerics::SLACK_FLOOR;

/// Constraint matrix of a polytope.
#[derive(Debug, Clone)]
pub enum ConstraintMatrix {
    /// Dense `m × d` matrix, one constraint normal per row
    Dense(DMatrix<f64>),
    /// Length-`d` diagonal: constraint `i` reads `aᵢ·xᵢ ≤ bᵢ`
    Diag(DVector<f64>),
}

/// Half-space description `{x : Ax ≤ b}`, fixed at construction.
#[derive(Debug, Clone)]
pub struct Polytope {
    /// Constraint normals
    pub a: ConstraintMatrix,
    /// Constraint offsets, length `m`
    pub b: DVector<f64>,
}

/// Polytope `{x : Ax ≤ b}` with optional per-constraint weights.
#[derive(Debug, Clone)]
pub struct PolytopeBarrier {
    polytope: Polytope,
    weights: Option<DVector<f64>>,
    dimension: usize,
    diag_hess: bool,
}

impl PolytopeBarrier {
    /// Create a polytope barrier, optionally weighting each constraint.
    ///
    /// Errs with [`BarrierError::InvalidArgument`] when `weights` is given
    /// with a length different from the constraint count.
    pub fn new(polytope: Polytope, weights: Option<DVector<f64>>) -> Result<Self, BarrierError> {
        let (constraints, dimension, diag_hess) = match &polytope.a {
            ConstraintMatrix::Dense(a) => (a.nrows(), a.ncols(), false),
            ConstraintMatrix::Diag(a) => (a.len(), a.len(), true),
        };
        assert!(dimension > 0, "polytope must have positive dimension");
        assert_eq!(
            polytope.b.len(),
            constraints,
            "constraint offsets must match the constraint count"
        );
        if let Some(w) = &weights {
            if w.len() != polytope.b.len() {
                return Err(BarrierError::InvalidArgument(
                    "if weights is passed, then it should be the same length \
                     as the number of constraints"
                        .to_string(),
                ));
            }
        }
        Ok(Self {
            polytope,
            weights,
            dimension,
            diag_hess,
        })
    }

    /// `Aᵢxᵢ` per row: `n × m` for dense `A`, elementwise `n × d` for diagonal.
    fn constraint_products(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(x.ncols(), self.dimension);
        match &self.polytope.a {
            ConstraintMatrix::Dense(a) => x * a.transpose(),
            ConstraintMatrix::Diag(a) => {
                DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| a[j] * x[(i, j)])
            }
        }
    }

    /// `bᵢ − ⟨Aᵢ, x⟩` per constraint, floored away from zero at the facets.
    fn safe_slack(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let products = self.constraint_products(x);
        DMatrix::from_fn(products.nrows(), products.ncols(), |i, k| {
            (self.polytope.b[k] - products[(i, k)]).max(SLACK_FLOOR)
        })
    }
}

impl Barrier for PolytopeBarrier {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "PolytopeBarrier"
    }

    fn diag_hess(&self) -> bool {
        self.diag_hess
    }

    fn feasibility(&self, x: &DMatrix<f64>) -> Vec<bool> {
        let products = self.constraint_products(x);
        (0..products.nrows())
            .map(|i| (0..products.ncols()).all(|k| products[(i, k)] <= self.polytope.b[k]))
            .collect()
    }

    fn value(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let slack = self.safe_slack(x);
        DVector::from_iterator(
            x.nrows(),
            (0..x.nrows()).map(|i| {
                -(0..slack.ncols())
                    .map(|k| {
                        let term = slack[(i, k)].ln();
                        match &self.weights {
                            Some(w) => term * w[k],
                            None => term,
                        }
                    })
                    .sum::<f64>()
            }),
        )
    }

    fn gradient(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut slack = self.safe_slack(x);
        if let Some(w) = &self.weights {
            for (k, mut col) in slack.column_iter_mut().enumerate() {
                col *= 1.0 / w[k];
            }
        }
        match &self.polytope.a {
            ConstraintMatrix::Dense(a) => {
                // rows ∑ₖ Aₖ / slackₖ as a single contraction
                let inv_slack = slack.map(|s| 1.0 / s);
                inv_slack * a
            }
            ConstraintMatrix::Diag(a) => {
                DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| a[j] / slack[(i, j)])
            }
        }
    }

    fn hessian(&self, x: &DMatrix<f64>) -> Hessian {
        let mut slack = self.safe_slack(x);
        if let Some(w) = &self.weights {
            for (k, mut col) in slack.column_iter_mut().enumerate() {
                col *= 1.0 / w[k].sqrt();
            }
        }
        match &self.polytope.a {
            ConstraintMatrix::Dense(a) => {
                let mats = (0..x.nrows())
                    .map(|i| {
                        // rows Aₖ / slackᵢₖ; the Hessian is CᵀC
                        let scaled = DMatrix::from_fn(a.nrows(), a.ncols(), |k, j| {
                            a[(k, j)] / slack[(i, k)]
                        });
                        scaled.transpose() * scaled
                    })
                    .collect();
                Hessian::Full(mats)
            }
            ConstraintMatrix::Diag(a) => Hessian::Diag(DMatrix::from_fn(
                x.nrows(),
                x.ncols(),
                |i, j| {
                    let r = a[j] / slack[(i, j)];
                    r * r
                },
            )),
        }
    }

    fn inverse_gradient(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, BarrierError> {
        // A sum of rational constraint terms has no known closed-form inverse
        // and no iterative fallback is provided here.
        let _ = y;
        Err(BarrierError::Unsupported {
            barrier: self.name(),
            op: "inverse_gradient",
        })
    }
}
