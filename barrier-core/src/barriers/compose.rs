//! Barrier composition.
//!
//! Intersects the domains of a list of barriers over the same ambient space:
//! a point is feasible iff it is feasible for every constituent, and the
//! composed potential is the sum of the constituents' potentials, so value,
//! gradient, and Hessian all add.
//!
//! The Hessian sum is evaluated in two passes: diagonal constituents are
//! accumulated first as a vector, and only if some constituent is dense does
//! the accumulated diagonal get embedded into dense matrices — exactly once,
//! no matter how many constituents of each kind are composed.
//!
//! A composed gradient has no closed-form joint inverse, so
//! `inverse_gradient` and `boundary_to_interior_half` stay unsupported at
//! this level; callers needing them must address a single constituent.

use nalgebra::{DMatrix, DVector};

use super::traits::{Barrier, Hessian};

/// Intersection of a list of barriers over a shared ambient space.
pub struct ComposeBarrier {
    barriers: Vec<Box<dyn Barrier>>,
    dimension: usize,
    diag_hess: bool,
    /// Constituent indices with a diagonal Hessian, evaluated first
    diag_order: Vec<usize>,
    /// Constituent indices with a dense Hessian, evaluated after embedding
    dense_order: Vec<usize>,
}

impl ComposeBarrier {
    /// Compose a non-empty list of barriers over the same ambient dimension.
    pub fn new(barriers: Vec<Box<dyn Barrier>>) -> Self {
        assert!(
            !barriers.is_empty(),
            "composition needs at least one barrier"
        );
        let dimension = barriers[0].dimension();
        assert!(
            barriers.iter().all(|b| b.dimension() == dimension),
            "composed barriers must share the ambient dimension"
        );

        let mut diag_order = Vec::new();
        let mut dense_order = Vec::new();
        for (i, barrier) in barriers.iter().enumerate() {
            if barrier.diag_hess() {
                diag_order.push(i);
            } else {
                dense_order.push(i);
            }
        }
        let diag_hess = dense_order.is_empty();

        Self {
            barriers,
            dimension,
            diag_hess,
            diag_order,
            dense_order,
        }
    }

    /// The composed constituents, in construction order.
    pub fn barriers(&self) -> &[Box<dyn Barrier>] {
        &self.barriers
    }
}

impl Barrier for ComposeBarrier {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "ComposeBarrier"
    }

    fn diag_hess(&self) -> bool {
        self.diag_hess
    }

    fn feasibility(&self, x: &DMatrix<f64>) -> Vec<bool> {
        let mut check = vec![true; x.nrows()];
        for barrier in &self.barriers {
            for (acc, feasible) in check.iter_mut().zip(barrier.feasibility(x)) {
                *acc = *acc && feasible;
            }
        }
        check
    }

    fn value(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let mut value = DVector::zeros(x.nrows());
        for barrier in &self.barriers {
            value += barrier.value(x);
        }
        value
    }

    fn gradient(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut gradient = DMatrix::zeros(x.nrows(), x.ncols());
        for barrier in &self.barriers {
            gradient += barrier.gradient(x);
        }
        gradient
    }

    fn hessian(&self, x: &DMatrix<f64>) -> Hessian {
        let mut diag = DMatrix::zeros(x.nrows(), x.ncols());
        for &idx in &self.diag_order {
            match self.barriers[idx].hessian(x) {
                Hessian::Diag(h) => diag += h,
                Hessian::Full(_) => panic!(
                    "barrier `{}` declares a diagonal Hessian but returned a dense one",
                    self.barriers[idx].name()
                ),
            }
        }
        if self.diag_hess {
            return Hessian::Diag(diag);
        }

        // one embedding, regardless of the number of constituents
        let mut full = Hessian::Diag(diag).into_full();
        for &idx in &self.dense_order {
            match self.barriers[idx].hessian(x) {
                Hessian::Full(mats) => {
                    for (acc, h) in full.iter_mut().zip(mats) {
                        *acc += h;
                    }
                }
                Hessian::Diag(_) => panic!(
                    "barrier `{}` declares a dense Hessian but returned a diagonal one",
                    self.barriers[idx].name()
                ),
            }
        }
        Hessian::Full(full)
    }
}
