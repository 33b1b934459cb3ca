//! Cross-barrier property tests.
//!
//! Feasibility consistency, gradient/inverse-gradient round trips across
//! dimensions, diagonal/full polytope equivalence, composition additivity,
//! and the boundary-half partition laws.

use barrier_core::{
    Barrier, BarrierError, BoxBarrier, ComposeBarrier, ConstraintMatrix, Ellipsoid,
    EllipsoidBarrier, Hessian, Polytope, PolytopeBarrier, SimplexBarrier,
};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Round-trip tolerances
const RTOL: f64 = 1e-4;
const ATOL: f64 = 1e-6;

/// Dimensions exercised by the cross-dimension suites
const DIMENSIONS: [usize; 4] = [3, 5, 7, 11];

fn max_abs_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f64, f64::max)
}

fn allclose(a: &DMatrix<f64>, b: &DMatrix<f64>, rtol: f64, atol: f64) -> bool {
    assert_eq!(a.shape(), b.shape());
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs())
}

/// Random rotation via QR of a random square matrix.
fn random_orthogonal(rng: &mut ChaCha8Rng, dim: usize) -> DMatrix<f64> {
    let raw = DMatrix::from_fn(dim, dim, |_, _| rng.gen_range(-1.0..1.0));
    raw.qr().q()
}

fn define_ellipsoid(rng: &mut ChaCha8Rng, dim: usize) -> Ellipsoid {
    Ellipsoid {
        rot: random_orthogonal(rng, dim),
        eigvals: DVector::from_fn(dim, |_, _| rng.gen_range(0.5..2.5)),
    }
}

// ============================================================================
// Feasibility consistency
// ============================================================================

#[test]
fn test_box_feasibility() {
    let mut rng = ChaCha8Rng::seed_from_u64(97);
    for dim in DIMENSIONS {
        let bounds = DVector::from_fn(dim, |_, _| rng.gen_range(0.1..4.1));
        let barrier = BoxBarrier::new(bounds.clone());

        // uniform inside the box
        let x = DMatrix::from_fn(2, dim, |_, j| rng.gen_range(-1.0..1.0) * bounds[j]);
        assert!(
            barrier.feasibility(&x).iter().all(|&f| f),
            "interior points must be feasible"
        );

        // both corners pushed past the bounds
        let y = DMatrix::from_fn(2, dim, |i, j| {
            let sign = if i == 0 { -1.0 } else { 1.0 };
            sign * (bounds[j] + 1.0)
        });
        assert!(
            barrier.feasibility(&y).iter().all(|&f| !f),
            "exterior points must be infeasible"
        );
    }
}

#[test]
fn test_ellipsoid_feasibility() {
    let mut rng = ChaCha8Rng::seed_from_u64(97);
    for dim in DIMENSIONS {
        let barrier = EllipsoidBarrier::new(define_ellipsoid(&mut rng, dim));

        let raw = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(-1.0..1.0));
        let norms = barrier.inner_product(&raw);

        // shrink each row onto an interior shell, stretch onto an exterior one
        let shrink: Vec<f64> = (0..2).map(|_| rng.gen_range(0.05..0.95)).collect();
        let interior =
            DMatrix::from_fn(2, dim, |i, j| raw[(i, j)] / norms[i].sqrt() * shrink[i]);
        assert!(barrier.feasibility(&interior).iter().all(|&f| f));

        let stretch: Vec<f64> = (0..2).map(|_| rng.gen_range(1.05..2.0)).collect();
        let exterior =
            DMatrix::from_fn(2, dim, |i, j| raw[(i, j)] / norms[i].sqrt() * stretch[i]);
        assert!(barrier.feasibility(&exterior).iter().all(|&f| !f));
    }
}

#[test]
fn test_simplex_feasibility() {
    let mut rng = ChaCha8Rng::seed_from_u64(97);
    for dim in DIMENSIONS {
        let barrier = SimplexBarrier::new(dim);

        let raw = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(0.0..1.0));
        let sums: Vec<f64> = (0..2).map(|i| raw.row(i).iter().sum()).collect();

        let interior =
            DMatrix::from_fn(2, dim, |i, j| raw[(i, j)] / sums[i] * rng.gen_range(0.1..1.0));
        assert!(barrier.feasibility(&interior).iter().all(|&f| f));

        let exterior =
            DMatrix::from_fn(2, dim, |i, j| raw[(i, j)] / sums[i] * rng.gen_range(1.1..2.1));
        assert!(barrier.feasibility(&exterior).iter().all(|&f| !f));
    }
}

// ============================================================================
// Gradient / inverse-gradient round trips
// ============================================================================

#[test]
fn test_box_gradient_inverse_gradient() {
    let mut rng = ChaCha8Rng::seed_from_u64(101);
    for dim in DIMENSIONS {
        let bounds = DVector::from_fn(dim, |_, _| rng.gen_range(0.1..4.1));
        let barrier = BoxBarrier::new(bounds.clone());

        for _ in 0..13 {
            let x = DMatrix::from_fn(2, dim, |_, j| rng.gen_range(-0.999..0.999) * bounds[j]);
            let y = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(-2.0..2.0));

            let grad = barrier.gradient(&x);
            let inv_grad = barrier.inverse_gradient(&y).unwrap();

            let x_back = barrier.inverse_gradient(&grad).unwrap();
            assert!(
                allclose(&x_back, &x, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&x_back, &x)
            );

            let y_back = barrier.gradient(&inv_grad);
            assert!(
                allclose(&y_back, &y, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&y_back, &y)
            );
        }
    }
}

#[test]
fn test_ellipsoid_map_inverse_map() {
    let mut rng = ChaCha8Rng::seed_from_u64(211);
    for dim in DIMENSIONS {
        let barrier = EllipsoidBarrier::new(define_ellipsoid(&mut rng, dim));

        for _ in 0..13 {
            let x = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(-2.0..2.0));

            let mapped = barrier.ellipsoid_map(&x);
            let unmapped = barrier.inverse_ellipsoid_map(&x);

            let x_back = barrier.inverse_ellipsoid_map(&mapped);
            assert!(
                allclose(&x_back, &x, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&x_back, &x)
            );

            let x_forward = barrier.ellipsoid_map(&unmapped);
            assert!(
                allclose(&x_forward, &x, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&x_forward, &x)
            );
        }
    }
}

#[test]
fn test_ellipsoid_gradient_inverse_gradient() {
    let mut rng = ChaCha8Rng::seed_from_u64(307);
    for dim in DIMENSIONS {
        let barrier = EllipsoidBarrier::new(define_ellipsoid(&mut rng, dim));

        for _ in 0..13 {
            let raw = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(-1.0..1.0));
            let norms = barrier.inner_product(&raw);
            let shrink: Vec<f64> = (0..2).map(|_| rng.gen_range(0.05..0.95)).collect();
            let x =
                DMatrix::from_fn(2, dim, |i, j| raw[(i, j)] / norms[i].sqrt() * shrink[i]);
            let y = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(-2.0..2.0));

            let grad = barrier.gradient(&x);
            let inv_grad = barrier.inverse_gradient(&y).unwrap();

            let x_back = barrier.inverse_gradient(&grad).unwrap();
            assert!(
                allclose(&x_back, &x, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&x_back, &x)
            );

            let y_back = barrier.gradient(&inv_grad);
            assert!(
                allclose(&y_back, &y, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&y_back, &y)
            );
        }
    }
}

#[test]
fn test_simplex_gradient_inverse_gradient() {
    let mut rng = ChaCha8Rng::seed_from_u64(401);
    for dim in DIMENSIONS {
        let barrier = SimplexBarrier::new(dim);

        for _ in 0..13 {
            // one batch row well inside, one close to the facet
            let raw = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(0.05..1.0));
            let sums: Vec<f64> = (0..2).map(|i| raw.row(i).iter().sum()).collect();
            let scales = [0.5, 0.99];
            let x = DMatrix::from_fn(2, dim, |i, j| raw[(i, j)] / sums[i] * scales[i]);
            let y = DMatrix::from_fn(2, dim, |_, _| rng.gen_range(-2.0..2.0));

            let grad = barrier.gradient(&x);
            let inv_grad = barrier.inverse_gradient(&y).unwrap();

            let x_back = barrier.inverse_gradient(&grad).unwrap();
            assert!(
                allclose(&x_back, &x, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&x_back, &x)
            );

            let y_back = barrier.gradient(&inv_grad);
            assert!(
                allclose(&y_back, &y, RTOL, ATOL),
                "max diff {}",
                max_abs_diff(&y_back, &y)
            );
        }
    }
}

// ============================================================================
// Diagonal / full polytope equivalence
// ============================================================================

#[test]
fn test_polytope_diag_full_equivalence() {
    let mut rng = ChaCha8Rng::seed_from_u64(509);
    for dim in [5usize, 7, 9, 11] {
        let a = DVector::from_fn(dim, |_, _| {
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            sign * rng.gen_range(1.0..4.0)
        });
        let b = DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..1.0));

        let full = PolytopeBarrier::new(
            Polytope {
                a: ConstraintMatrix::Dense(DMatrix::from_diagonal(&a)),
                b: b.clone(),
            },
            None,
        )
        .unwrap();
        let diag = PolytopeBarrier::new(
            Polytope {
                a: ConstraintMatrix::Diag(a.clone()),
                b: b.clone(),
            },
            None,
        )
        .unwrap();

        // a_j x_j ≤ b_j: feasible below the bound for a_j > 0, above for a_j < 0
        let x = DMatrix::from_fn(23, dim, |_, j| {
            let bound = b[j] / a[j];
            if a[j] > 0.0 {
                bound - rng.gen_range(0.0..2.0)
            } else {
                bound + rng.gen_range(0.0..2.0)
            }
        });
        let y = DMatrix::from_fn(23, dim, |_, j| {
            let bound = b[j] / a[j];
            if a[j] > 0.0 {
                bound + 1.0
            } else {
                bound - 1.0
            }
        });

        for (name, poly) in [("full", &full), ("diag", &diag)] {
            assert!(
                poly.feasibility(&x).iter().all(|&f| f),
                "{} polytope feasibility fail",
                name
            );
            assert!(
                poly.feasibility(&y).iter().all(|&f| !f),
                "{} polytope infeasibility fail",
                name
            );
        }

        let value_full = full.value(&x);
        let value_diag = diag.value(&x);
        for (a_val, b_val) in value_full.iter().zip(value_diag.iter()) {
            assert!(
                (a_val - b_val).abs() <= ATOL + RTOL * b_val.abs(),
                "value mismatch between diag and full versions"
            );
        }

        let hess_full = full.hessian(&x).into_full();
        let hess_diag = diag.hessian(&x).into_full();
        for (hf, hd) in hess_full.iter().zip(hess_diag.iter()) {
            assert!(
                allclose(hf, hd, RTOL, ATOL),
                "hessian mismatch between diag and full versions"
            );
        }
    }
}

// ============================================================================
// Composition
// ============================================================================

fn ball_in_box(dim: usize) -> ComposeBarrier {
    ComposeBarrier::new(vec![
        Box::new(BoxBarrier::new(DVector::from_element(dim, 1.0))),
        Box::new(EllipsoidBarrier::new(Ellipsoid {
            rot: DMatrix::identity(dim, dim),
            eigvals: DVector::from_element(dim, 1.0),
        })),
    ])
}

#[test]
fn test_compose_feasibility() {
    let dim = 43;
    let mut rng = ChaCha8Rng::seed_from_u64(601);
    let composed = ball_in_box(dim);

    // the unit ball lies inside the unit box, so ball-interior points pass both
    let raw = DMatrix::from_fn(19, dim, |_, _| rng.gen_range(-1.0..1.0));
    let shrink: Vec<f64> = (0..19).map(|_| rng.gen_range(0.05..0.95)).collect();
    let interior = DMatrix::from_fn(19, dim, |i, j| {
        let norm = raw.row(i).iter().map(|v| v * v).sum::<f64>().sqrt();
        raw[(i, j)] / norm * shrink[i]
    });
    assert!(
        composed.feasibility(&interior).iter().all(|&f| f),
        "invalid check for feasibility"
    );

    // inside the box but outside the ball: the intersection must reject it
    let mut outside_ball = DMatrix::zeros(1, dim);
    outside_ball[(0, 0)] = 0.9;
    outside_ball[(0, 1)] = 0.9;
    assert!(composed.barriers()[0].feasibility(&outside_ball)[0]);
    assert!(!composed.barriers()[1].feasibility(&outside_ball)[0]);
    assert!(
        !composed.feasibility(&outside_ball)[0],
        "invalid check for feasibility"
    );
}

#[test]
fn test_compose_hessian() {
    let dim = 43;
    let mut rng = ChaCha8Rng::seed_from_u64(701);
    let composed = ball_in_box(dim);

    let raw = DMatrix::from_fn(19, dim, |_, _| rng.gen_range(-1.0..1.0));
    let shrink: Vec<f64> = (0..19).map(|_| rng.gen_range(0.05..0.95)).collect();
    let x = DMatrix::from_fn(19, dim, |i, j| {
        let norm = raw.row(i).iter().map(|v| v * v).sum::<f64>().sqrt();
        raw[(i, j)] / norm * shrink[i]
    });

    let composed_hessian = match composed.hessian(&x) {
        Hessian::Full(mats) => mats,
        Hessian::Diag(_) => panic!("box + ellipsoid must compose to a dense Hessian"),
    };

    // the box diagonal embedded as a matrix plus the ellipsoid's dense Hessian
    let manual_box = composed.barriers()[0].hessian(&x).into_full();
    let manual_ellipsoid = composed.barriers()[1].hessian(&x).into_full();
    for i in 0..x.nrows() {
        let expected = &manual_box[i] + &manual_ellipsoid[i];
        assert!(
            allclose(&composed_hessian[i], &expected, RTOL, ATOL),
            "invalid composed Hessian"
        );
    }
}

// ============================================================================
// Boundary-half partition
// ============================================================================

#[test]
fn test_box_boundary_half_scaling_law() {
    // d = 2: the half-volume inner box has half-width 0.5^(1/2) ≈ 0.7071
    let barrier = BoxBarrier::new(DVector::from_element(2, 1.0));
    let x = DMatrix::from_row_slice(3, 2, &[0.8, 0.0, 0.5, 0.5, 0.71, 0.0]);
    let shell = barrier.boundary_to_interior_half(&x).unwrap();
    assert_eq!(shell, vec![true, false, true]);
}

#[test]
fn test_simplex_boundary_half_scaling_law() {
    // d = 2: shell is where the coordinate sum exceeds 0.5^(1/2)
    let barrier = SimplexBarrier::new(2);
    let x = DMatrix::from_row_slice(3, 2, &[0.5, 0.4, 0.1, 0.2, 0.36, 0.36]);
    let shell = barrier.boundary_to_interior_half(&x).unwrap();
    assert_eq!(shell, vec![true, false, true]);
}

#[test]
fn test_ellipsoid_boundary_half_scaling_law() {
    // d = 2: shell is ⟨x, Mx⟩ > 0.5^(2/2) = 0.5
    let barrier = EllipsoidBarrier::new(Ellipsoid {
        rot: DMatrix::identity(2, 2),
        eigvals: DVector::from_element(2, 1.0),
    });
    let x = DMatrix::from_row_slice(2, 2, &[0.8, 0.0, 0.5, 0.0]);
    let shell = barrier.boundary_to_interior_half(&x).unwrap();
    assert_eq!(shell, vec![true, false]);
}

// ============================================================================
// Error signaling and the ellipsoid value asymmetry
// ============================================================================

#[test]
fn test_polytope_inverse_gradient_unsupported() {
    let barrier = PolytopeBarrier::new(
        Polytope {
            a: ConstraintMatrix::Diag(DVector::from_element(3, 1.0)),
            b: DVector::from_element(3, 1.0),
        },
        None,
    )
    .unwrap();
    let y = DMatrix::from_fn(2, 3, |i, j| (i + j) as f64);
    let err = barrier.inverse_gradient(&y).unwrap_err();
    assert!(matches!(
        err,
        BarrierError::Unsupported {
            barrier: "PolytopeBarrier",
            op: "inverse_gradient"
        }
    ));
}

#[test]
fn test_compose_unsupported_operations() {
    let composed = ball_in_box(3);
    let y = DMatrix::zeros(1, 3);
    assert!(composed.inverse_gradient(&y).is_err());
    assert!(composed.boundary_to_interior_half(&y).is_err());
}

#[test]
fn test_ellipsoid_value_boundary_asymmetry() {
    // Documented asymmetry: the ellipsoid zeroes the value contribution at or
    // past the boundary, while box/simplex/polytope floor the slack and stay
    // large-but-finite. Samplers compare values across proposals, so both
    // behaviors are pinned here.
    let dim = 3;
    let ellipsoid = EllipsoidBarrier::new(Ellipsoid {
        rot: DMatrix::identity(dim, dim),
        eigvals: DVector::from_element(dim, 1.0),
    });
    let boxed = BoxBarrier::new(DVector::from_element(dim, 1.0));

    let outside = DMatrix::from_fn(1, dim, |_, _| 2.0);
    assert_eq!(ellipsoid.value(&outside)[0], 0.0);

    let box_value = boxed.value(&outside)[0];
    assert!(box_value.is_finite());
    assert!(box_value > 0.0);
}
