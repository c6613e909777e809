//! Numerical primitives shared by the pricer and the implied-vol solver.
//!
//! The normal distribution functions route through `statrs`' complementary error
//! function, which is accurate to near machine precision in both tails. Root
//! finding delegates to the Brent implementation of the `roots` crate behind a
//! small adapter that reports bracketing and convergence failures separately.

use std::cell::Cell;
use std::f64::consts::FRAC_1_SQRT_2;

use roots::{Convergency, SearchError, find_root_brent};
use statrs::function::erf::erfc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    /// The objective has the same sign at both ends of the search interval.
    #[error("no sign change on [{lower}, {upper}]: f(lower)={f_lower}, f(upper)={f_upper}")]
    NoBracketing {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
    /// Iteration budget exhausted before the tolerance was met.
    #[error("no convergence after {iterations} iterations")]
    NonConvergence { iterations: usize },
    /// The objective produced NaN or an infinity.
    #[error("objective is not finite at x={x}")]
    NonFinite { x: f64 },
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Stopping rule for [`brent_root`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootTolerance {
    /// Accept `x` once `|f(x)|` falls below this value.
    pub residual: f64,
    /// Accept once the bracket is narrower than this value.
    pub bracket_width: f64,
    /// Iteration cap; exceeding it is a convergence failure.
    pub max_iterations: usize,
}

impl Default for RootTolerance {
    fn default() -> Self {
        Self {
            residual: 1e-10,
            bracket_width: 2e-12,
            max_iterations: 100,
        }
    }
}

struct Budget {
    tolerance: RootTolerance,
    iterations: usize,
}

impl Convergency<f64> for Budget {
    fn is_root_found(&mut self, y: f64) -> bool {
        y.abs() < self.tolerance.residual
    }

    fn is_converged(&mut self, x1: f64, x2: f64) -> bool {
        (x1 - x2).abs() < self.tolerance.bracket_width
    }

    fn is_iteration_limit_reached(&mut self, iter: usize) -> bool {
        self.iterations = iter;
        iter >= self.tolerance.max_iterations
    }
}

/// Finds a root of `f` on `[lower, upper]` with Brent's method.
///
/// Both endpoints are evaluated first so that a missing sign change is reported
/// as [`MathError::NoBracketing`] with the endpoint values attached. Any
/// non-finite objective value seen during the search aborts with
/// [`MathError::NonFinite`].
///
/// # Examples
/// ```
/// use volsurface::math::{RootTolerance, brent_root};
///
/// let tol = RootTolerance { residual: 1e-12, ..RootTolerance::default() };
/// let root = brent_root(|x| x * x - 2.0, 0.0, 2.0, tol).unwrap();
/// assert!((root - 2.0_f64.sqrt()).abs() < 1e-9);
/// ```
pub fn brent_root<F>(f: F, lower: f64, upper: f64, tolerance: RootTolerance) -> Result<f64, MathError>
where
    F: Fn(f64) -> f64,
{
    if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
        return Err(MathError::InvalidInput("bracket must be finite with lower < upper"));
    }
    if tolerance.residual <= 0.0 || tolerance.bracket_width <= 0.0 {
        return Err(MathError::InvalidInput("tolerances must be positive"));
    }
    if tolerance.max_iterations == 0 {
        return Err(MathError::InvalidInput("max_iterations must be > 0"));
    }

    let f_lower = f(lower);
    let f_upper = f(upper);
    if !f_lower.is_finite() {
        return Err(MathError::NonFinite { x: lower });
    }
    if !f_upper.is_finite() {
        return Err(MathError::NonFinite { x: upper });
    }
    if f_lower.signum() == f_upper.signum() && f_lower != 0.0 && f_upper != 0.0 {
        return Err(MathError::NoBracketing {
            lower,
            upper,
            f_lower,
            f_upper,
        });
    }

    let bad_point = Cell::new(None);
    let guarded = |x: f64| {
        let y = f(x);
        if !y.is_finite() && bad_point.get().is_none() {
            bad_point.set(Some(x));
        }
        y
    };

    let mut budget = Budget {
        tolerance,
        iterations: 0,
    };
    let result = find_root_brent(lower, upper, &guarded, &mut budget);

    if let Some(x) = bad_point.get() {
        return Err(MathError::NonFinite { x });
    }

    match result {
        Ok(root) if root.is_finite() => Ok(root),
        Ok(root) => Err(MathError::NonFinite { x: root }),
        Err(SearchError::NoBracketing) => Err(MathError::NoBracketing {
            lower,
            upper,
            f_lower,
            f_upper,
        }),
        Err(_) => Err(MathError::NonConvergence {
            iterations: budget.iterations,
        }),
    }
}
