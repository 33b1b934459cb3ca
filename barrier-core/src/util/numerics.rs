//! Shared numerical constants and helpers.
//!
//! The barriers in this crate never signal numeric near-singularity as an
//! error. Any quantity that would be divided by, or passed to a logarithm,
//! while non-positive is first floored at [`SLACK_FLOOR`]; Hessian entries are
//! capped per-barrier near the boundary. Samplers consuming these barriers
//! rely on the resulting values staying finite, so the constants here are part
//! of the observable contract, not tuning knobs.

/// Floor applied to slack-like quantities (`a² − x²`, `1 − ⟨x, Mx⟩`,
/// `b − Ax`, simplex coordinates) before division or `log`.
pub const SLACK_FLOOR: f64 = 1e-8;

/// Approximate equality with the usual mixed-tolerance semantics:
/// `|a − b| ≤ atol + rtol·|b|`.
#[inline]
pub fn close_to(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + rtol * b.abs()
}
