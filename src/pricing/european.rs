//! Module `pricing::european`.
//!
//! Closed-form Black-Scholes-Merton valuation of European options with a
//! continuous dividend yield.
//!
//! References: Hull (11th ed.), Ch. 15 and 17 (continuous dividend yield).
//!
//! Numerical considerations: `T <= 0` short-circuits to intrinsic value so the
//! `sigma * sqrt(T)` denominator is never zero; `sigma <= 0` with positive `T`
//! collapses to the discounted forward payoff.
use crate::core::{OptionParams, OptionType};
use crate::math::normal_cdf;

/// `(d1, d2)` for the given state. Callers guarantee `T > 0` and `sigma > 0`.
#[inline]
pub fn d1_d2(params: &OptionParams) -> (f64, f64) {
    let sig_sqrt_t = params.volatility * params.time_to_expiry.sqrt();
    let d1 = ((params.spot / params.strike).ln()
        + (params.risk_free_rate - params.dividend_yield
            + 0.5 * params.volatility * params.volatility)
            * params.time_to_expiry)
        / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

/// Black-Scholes-Merton option price.
///
/// Edge cases:
/// - `time_to_expiry <= 0` returns the intrinsic value exactly.
/// - `volatility <= 0` returns the discounted forward intrinsic value.
///
/// # Examples
/// ```rust
/// use volsurface::core::{OptionParams, OptionType};
/// use volsurface::pricing::european::black_scholes_price;
///
/// let call = black_scholes_price(&OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.2));
/// let put = black_scholes_price(&OptionParams::new(OptionType::Put, 100.0, 100.0, 1.0, 0.05, 0.2));
/// assert!((call - 10.4506).abs() < 1e-4);
/// assert!(call > put);
/// ```
#[inline]
pub fn black_scholes_price(params: &OptionParams) -> f64 {
    if params.time_to_expiry <= 0.0 {
        return params.intrinsic();
    }
    let t = params.time_to_expiry;
    let df_r = (-params.risk_free_rate * t).exp();
    let df_q = (-params.dividend_yield * t).exp();
    if params.volatility <= 0.0 {
        return match params.option_type {
            OptionType::Call => (params.spot * df_q - params.strike * df_r).max(0.0),
            OptionType::Put => (params.strike * df_r - params.spot * df_q).max(0.0),
        };
    }

    let (d1, d2) = d1_d2(params);
    match params.option_type {
        OptionType::Call => call_price(params.spot * df_q, params.strike * df_r, d1, d2),
        OptionType::Put => put_price(params.spot * df_q, params.strike * df_r, d1, d2),
    }
}

#[inline]
fn call_price(fwd_spot: f64, pv_strike: f64, d1: f64, d2: f64) -> f64 {
    fwd_spot * normal_cdf(d1) - pv_strike * normal_cdf(d2)
}

#[inline]
fn put_price(fwd_spot: f64, pv_strike: f64, d1: f64, d2: f64) -> f64 {
    pv_strike * normal_cdf(-d2) - fwd_spot * normal_cdf(-d1)
}

/// Right-hand side of put-call parity, `S e^{-qT} - K e^{-rT}`.
pub fn parity_forward_value(params: &OptionParams) -> f64 {
    let t = params.time_to_expiry;
    params.spot * (-params.dividend_yield * t).exp()
        - params.strike * (-params.risk_free_rate * t).exp()
}
