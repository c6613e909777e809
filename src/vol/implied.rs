//! Black-Scholes implied-volatility inversion.
//!
//! [`ImpliedVolSolver`] recovers the volatility that reprices an observed
//! premium by bracketing the root of `price(sigma) - market_price` on a fixed
//! volatility interval and running Brent's method inside it. Inputs are screened
//! before any pricing happens: range checks first, then a tolerance-adjusted
//! intrinsic-value floor, and only then the root search.
//!
//! The solver owns plain success/failure counters. `calculate_iv` takes
//! `&mut self`, so an instance serves one caller at a time; parallel batch code
//! gives every worker its own solver and merges [`SolverStatistics`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::{MarketQuote, OptionType};
use crate::math::{MathError, RootTolerance, brent_root};
use crate::pricing::european::black_scholes_price;

/// Bounds, tolerances and input floors used by [`ImpliedVolSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Lower end of the volatility search interval.
    pub vol_lower: f64,
    /// Upper end of the volatility search interval (5.0 = 500%).
    pub vol_upper: f64,
    /// Accepted absolute price residual. Kept far below quote precision so
    /// that the volatility bracket width, not the residual, bounds the error
    /// on low-vega contracts.
    pub price_tolerance: f64,
    /// Accepted width of the volatility bracket.
    pub bracket_tolerance: f64,
    /// Brent iteration cap.
    pub max_iterations: usize,
    /// Market price may sit this fraction of intrinsic value before rejection.
    pub intrinsic_tolerance: f64,
    pub min_spot: f64,
    pub min_strike: f64,
    pub min_time_to_expiry: f64,
    pub min_market_price: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub min_dividend_yield: f64,
    pub max_dividend_yield: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            vol_lower: 1e-6,
            vol_upper: 5.0,
            price_tolerance: 1e-10,
            bracket_tolerance: 2e-12,
            max_iterations: 100,
            intrinsic_tolerance: 0.99,
            min_spot: 0.01,
            min_strike: 0.01,
            min_time_to_expiry: 1e-6,
            min_market_price: 0.01,
            min_rate: 0.0,
            max_rate: 1.0,
            min_dividend_yield: 0.0,
            max_dividend_yield: 1.0,
        }
    }
}

impl SolverConfig {
    fn root_tolerance(&self) -> RootTolerance {
        RootTolerance {
            residual: self.price_tolerance,
            bracket_width: self.bracket_tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

/// Why an inversion produced no volatility.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IvError {
    /// An input is non-finite or outside its accepted range.
    #[error("validation failed: {reason}")]
    Validation { reason: String },
    /// Market price below the tolerance-adjusted intrinsic value.
    #[error(
        "arbitrage violation: market price {market_price} is below {tolerance} x intrinsic value {intrinsic}"
    )]
    Arbitrage {
        market_price: f64,
        intrinsic: f64,
        tolerance: f64,
    },
    /// The objective does not change sign over the volatility interval.
    #[error(
        "bracketing error: no sign change on [{vol_lower}, {vol_upper}] (residual {f_lower} at lower, {f_upper} at upper)"
    )]
    Bracketing {
        vol_lower: f64,
        vol_upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
    /// Iteration cap reached before the tolerance was met.
    #[error("convergence error: tolerance not met after {iterations} iterations")]
    Convergence { iterations: usize },
    /// Unexpected numerical trouble during the root search.
    #[error("numerical error: {reason}")]
    Numerical { reason: String },
}

impl IvError {
    /// Short stable tag, suitable for log fields and failure histograms.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Arbitrage { .. } => "arbitrage",
            Self::Bracketing { .. } => "bracketing",
            Self::Convergence { .. } => "convergence",
            Self::Numerical { .. } => "numerical",
        }
    }

    fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

impl From<MathError> for IvError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::NoBracketing {
                lower,
                upper,
                f_lower,
                f_upper,
            } => Self::Bracketing {
                vol_lower: lower,
                vol_upper: upper,
                f_lower,
                f_upper,
            },
            MathError::NonConvergence { iterations } => Self::Convergence { iterations },
            other => Self::Numerical {
                reason: other.to_string(),
            },
        }
    }
}

/// Snapshot of a solver's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverStatistics {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    /// Percentage of successful calls, `0.0` before the first call.
    pub success_rate: f64,
}

impl SolverStatistics {
    pub fn from_counts(total: u64, failed: u64) -> Self {
        let successful = total.saturating_sub(failed);
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        };
        Self {
            total,
            successful,
            failed,
            success_rate,
        }
    }

    /// Combines counters from independent solvers.
    pub fn merge(self, other: Self) -> Self {
        Self::from_counts(self.total + other.total, self.failed + other.failed)
    }
}

/// Implied-volatility engine with per-instance call statistics.
///
/// # Examples
/// ```
/// use volsurface::core::{MarketQuote, OptionParams, OptionType};
/// use volsurface::pricing::european::black_scholes_price;
/// use volsurface::vol::implied::ImpliedVolSolver;
///
/// let params = OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.015, 0.20)
///     .with_dividend_yield(0.013);
/// let price = black_scholes_price(&params);
///
/// let mut solver = ImpliedVolSolver::default();
/// let quote = MarketQuote::new(OptionType::Call, 100.0, 100.0, 1.0, 0.015, price)
///     .with_dividend_yield(0.013);
/// let iv = solver.calculate_iv(&quote).unwrap();
/// assert!((iv - 0.20).abs() < 1e-4);
/// assert_eq!(solver.statistics().successful, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImpliedVolSolver {
    config: SolverConfig,
    total_calls: u64,
    failed_calls: u64,
}

impl ImpliedVolSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            total_calls: 0,
            failed_calls: 0,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Inverts `quote.market_price` for volatility.
    ///
    /// Every call counts towards `total`; every `Err` counts towards `failed`.
    ///
    /// # Errors
    /// - [`IvError::Validation`] for non-finite or out-of-range inputs.
    /// - [`IvError::Arbitrage`] when the premium is below
    ///   `intrinsic_tolerance * intrinsic`.
    /// - [`IvError::Bracketing`] when no volatility in the search interval
    ///   reproduces the premium.
    /// - [`IvError::Convergence`] when Brent exhausts its iteration cap.
    /// - [`IvError::Numerical`] for non-finite intermediate values.
    pub fn calculate_iv(&mut self, quote: &MarketQuote) -> Result<f64, IvError> {
        self.total_calls += 1;
        let outcome = self.solve(quote);
        match &outcome {
            Ok(iv) => trace!(
                option_type = %quote.option_type,
                spot = quote.spot,
                strike = quote.strike,
                time_to_expiry = quote.time_to_expiry,
                market_price = quote.market_price,
                implied_vol = iv,
                "implied vol solved"
            ),
            Err(err) => {
                self.failed_calls += 1;
                debug!(
                    option_type = %quote.option_type,
                    spot = quote.spot,
                    strike = quote.strike,
                    time_to_expiry = quote.time_to_expiry,
                    risk_free_rate = quote.risk_free_rate,
                    dividend_yield = quote.dividend_yield,
                    market_price = quote.market_price,
                    failure = err.kind(),
                    reason = %err,
                    "implied vol failed"
                );
            }
        }
        outcome
    }

    /// Same as [`Self::calculate_iv`] with a textual option kind, parsed
    /// case-insensitively. An unknown kind is a validation failure and is
    /// counted like any other.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_iv_for_kind(
        &mut self,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        market_price: f64,
        dividend_yield: f64,
        option_kind: &str,
    ) -> Result<f64, IvError> {
        match option_kind.parse::<OptionType>() {
            Ok(option_type) => {
                let quote = MarketQuote::new(
                    option_type,
                    spot,
                    strike,
                    time_to_expiry,
                    risk_free_rate,
                    market_price,
                )
                .with_dividend_yield(dividend_yield);
                self.calculate_iv(&quote)
            }
            Err(err) => {
                self.total_calls += 1;
                self.failed_calls += 1;
                debug!(option_kind, failure = "validation", "implied vol failed");
                Err(IvError::validation(err.to_string()))
            }
        }
    }

    fn solve(&self, quote: &MarketQuote) -> Result<f64, IvError> {
        self.validate(quote)?;
        self.check_intrinsic(quote)?;

        let target = quote.market_price;
        let objective = |sigma: f64| black_scholes_price(&quote.params_at(sigma)) - target;
        let iv = brent_root(
            objective,
            self.config.vol_lower,
            self.config.vol_upper,
            self.config.root_tolerance(),
        )?;
        Ok(iv)
    }

    /// Range checks applied before any pricing.
    fn validate(&self, quote: &MarketQuote) -> Result<(), IvError> {
        let cfg = &self.config;
        let fields = [
            ("spot", quote.spot),
            ("strike", quote.strike),
            ("time_to_expiry", quote.time_to_expiry),
            ("risk_free_rate", quote.risk_free_rate),
            ("dividend_yield", quote.dividend_yield),
            ("market_price", quote.market_price),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(IvError::validation(format!("{name} must be finite, got {value}")));
        }

        if quote.spot < cfg.min_spot {
            return Err(IvError::validation(format!(
                "spot {} below minimum {}",
                quote.spot, cfg.min_spot
            )));
        }
        if quote.strike < cfg.min_strike {
            return Err(IvError::validation(format!(
                "strike {} below minimum {}",
                quote.strike, cfg.min_strike
            )));
        }
        if quote.time_to_expiry < cfg.min_time_to_expiry {
            return Err(IvError::validation(format!(
                "time_to_expiry {} below minimum {}",
                quote.time_to_expiry, cfg.min_time_to_expiry
            )));
        }
        if quote.market_price < cfg.min_market_price {
            return Err(IvError::validation(format!(
                "market_price {} below minimum {}",
                quote.market_price, cfg.min_market_price
            )));
        }
        if !(cfg.min_rate..=cfg.max_rate).contains(&quote.risk_free_rate) {
            return Err(IvError::validation(format!(
                "risk_free_rate {} outside [{}, {}]",
                quote.risk_free_rate, cfg.min_rate, cfg.max_rate
            )));
        }
        if !(cfg.min_dividend_yield..=cfg.max_dividend_yield).contains(&quote.dividend_yield) {
            return Err(IvError::validation(format!(
                "dividend_yield {} outside [{}, {}]",
                quote.dividend_yield, cfg.min_dividend_yield, cfg.max_dividend_yield
            )));
        }
        Ok(())
    }

    fn check_intrinsic(&self, quote: &MarketQuote) -> Result<(), IvError> {
        let intrinsic = quote.option_type.intrinsic(quote.spot, quote.strike);
        if quote.market_price < intrinsic * self.config.intrinsic_tolerance {
            return Err(IvError::Arbitrage {
                market_price: quote.market_price,
                intrinsic,
                tolerance: self.config.intrinsic_tolerance,
            });
        }
        Ok(())
    }

    /// Current counters; does not mutate them.
    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics::from_counts(self.total_calls, self.failed_calls)
    }

    pub fn reset_statistics(&mut self) {
        self.total_calls = 0;
        self.failed_calls = 0;
    }
}
