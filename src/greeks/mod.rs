//! Closed-form Black-Scholes-Merton sensitivities.
//!
//! Every function here assumes `T > 0` and `sigma > 0`. For degenerate inputs
//! (expired contract, zero vol, non-positive spot) they return `0.0` instead of
//! propagating a division by zero; the Greeks of an expired contract are not
//! meaningful and callers should not rely on those zeros.
//!
//! Theta follows the calendar convention: it is `-dV/dT` divided by 365, i.e.
//! value change per day.

use crate::core::{Greeks, OptionParams, OptionType};
use crate::math::{normal_cdf, normal_pdf};
use crate::pricing::european::d1_d2;

const DAYS_PER_YEAR: f64 = 365.0;

#[inline]
fn degenerate(params: &OptionParams) -> bool {
    params.time_to_expiry <= 0.0 || params.volatility <= 0.0 || params.spot <= 0.0
}

pub fn delta(params: &OptionParams) -> f64 {
    if degenerate(params) {
        return 0.0;
    }
    let (d1, _) = d1_d2(params);
    let df_q = (-params.dividend_yield * params.time_to_expiry).exp();
    match params.option_type {
        OptionType::Call => df_q * normal_cdf(d1),
        OptionType::Put => df_q * (normal_cdf(d1) - 1.0),
    }
}

/// Second derivative to spot; identical for calls and puts.
pub fn gamma(params: &OptionParams) -> f64 {
    if degenerate(params) {
        return 0.0;
    }
    let (d1, _) = d1_d2(params);
    let df_q = (-params.dividend_yield * params.time_to_expiry).exp();
    df_q * normal_pdf(d1) / (params.spot * params.volatility * params.time_to_expiry.sqrt())
}

/// Sensitivity to a unit (100 vol point) change in volatility.
pub fn vega(params: &OptionParams) -> f64 {
    if degenerate(params) {
        return 0.0;
    }
    let (d1, _) = d1_d2(params);
    let df_q = (-params.dividend_yield * params.time_to_expiry).exp();
    params.spot * df_q * normal_pdf(d1) * params.time_to_expiry.sqrt()
}

/// Daily theta.
pub fn theta(params: &OptionParams) -> f64 {
    if degenerate(params) {
        return 0.0;
    }
    let (d1, d2) = d1_d2(params);
    annual_theta(params, d1, d2) / DAYS_PER_YEAR
}

pub fn rho(params: &OptionParams) -> f64 {
    if degenerate(params) {
        return 0.0;
    }
    let (_, d2) = d1_d2(params);
    let t = params.time_to_expiry;
    let df_r = (-params.risk_free_rate * t).exp();
    match params.option_type {
        OptionType::Call => params.strike * t * df_r * normal_cdf(d2),
        OptionType::Put => -params.strike * t * df_r * normal_cdf(-d2),
    }
}

fn annual_theta(params: &OptionParams, d1: f64, d2: f64) -> f64 {
    let s = params.spot;
    let k = params.strike;
    let r = params.risk_free_rate;
    let q = params.dividend_yield;
    let t = params.time_to_expiry;
    let df_q = (-q * t).exp();
    let df_r = (-r * t).exp();
    let decay = -s * df_q * normal_pdf(d1) * params.volatility / (2.0 * t.sqrt());

    match params.option_type {
        OptionType::Call => decay - r * k * df_r * normal_cdf(d2) + q * s * df_q * normal_cdf(d1),
        OptionType::Put => decay + r * k * df_r * normal_cdf(-d2) - q * s * df_q * normal_cdf(-d1),
    }
}

/// Computes all Greeks from a single `d1`/`d2` evaluation.
///
/// # Examples
/// ```rust
/// use volsurface::core::{OptionParams, OptionType};
/// use volsurface::greeks::black_scholes_greeks;
///
/// let g = black_scholes_greeks(&OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.20));
/// assert!(g.delta > 0.0 && g.gamma > 0.0 && g.vega > 0.0 && g.theta < 0.0);
/// ```
pub fn black_scholes_greeks(params: &OptionParams) -> Greeks {
    if degenerate(params) {
        return Greeks {
            delta: 0.0,
            gamma: 0.0,
            vega: 0.0,
            theta: 0.0,
            rho: 0.0,
        };
    }

    let (d1, d2) = d1_d2(params);
    let s = params.spot;
    let t = params.time_to_expiry;
    let sqrt_t = t.sqrt();
    let df_q = (-params.dividend_yield * t).exp();
    let df_r = (-params.risk_free_rate * t).exp();
    let pdf_d1 = normal_pdf(d1);

    let (delta, rho) = match params.option_type {
        OptionType::Call => (
            df_q * normal_cdf(d1),
            params.strike * t * df_r * normal_cdf(d2),
        ),
        OptionType::Put => (
            df_q * (normal_cdf(d1) - 1.0),
            -params.strike * t * df_r * normal_cdf(-d2),
        ),
    };

    Greeks {
        delta,
        gamma: df_q * pdf_d1 / (s * params.volatility * sqrt_t),
        vega: s * df_q * pdf_d1 * sqrt_t,
        theta: annual_theta(params, d1, d2) / DAYS_PER_YEAR,
        rho,
    }
}
