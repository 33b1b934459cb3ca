//! Barrier implementations.
//!
//! This module provides the barrier contract (feasibility, value, gradient,
//! Hessian, inverse-gradient, boundary-half predicate) and its implementations
//! for all supported convex domains.

pub mod box_barrier;
pub mod compose;
pub mod ellipsoid;
pub mod polytope;
pub mod simplex;
pub mod traits;

pub use box_barrier::BoxBarrier;
pub use compose::ComposeBarrier;
pub use ellipsoid::{Ellipsoid, EllipsoidBarrier};
pub use polytope::{ConstraintMatrix, Polytope, PolytopeBarrier};
pub use simplex::SimplexBarrier;
pub use traits::{Barrier, BarrierError, Hessian};
