//! Module `vol::surface`.
//!
//! Scattered implied-volatility surface assembled from per-contract inversions,
//! plus the summary figures analysts read off it (ATM level, put/call skew,
//! term structure).
//!
//! Numerical considerations: no interpolation or smoothing happens here. A
//! contract whose inversion fails is excluded from the points and recorded as
//! a [`SurfaceFailure`]; a batch never aborts on a single bad contract.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{MarketQuote, OptionType};
use crate::vol::implied::{ImpliedVolSolver, IvError, SolverStatistics};
#[cfg(feature = "parallel")]
use crate::vol::implied::SolverConfig;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One solved `(strike, expiry, vol)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub option_type: OptionType,
    pub strike: f64,
    pub time_to_expiry: f64,
    /// Strike over spot.
    pub moneyness: f64,
    pub implied_vol: f64,
}

/// A contract excluded from the surface and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceFailure {
    /// Position of the quote in the input batch.
    pub index: usize,
    pub quote: MarketQuote,
    /// Stable failure tag, see [`IvError::kind`].
    pub kind: &'static str,
    pub reason: String,
    #[serde(skip)]
    pub error: IvError,
}

/// Points and exclusions from one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpliedSurface {
    pub points: Vec<SurfacePoint>,
    pub failures: Vec<SurfaceFailure>,
}

impl ImpliedSurface {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether enough contracts solved for the surface to be worth using.
    pub fn meets_minimum(&self, min_valid_options: usize) -> bool {
        self.points.len() >= min_valid_options
    }

    fn assemble(quotes: &[MarketQuote], outcomes: Vec<Result<f64, IvError>>) -> Self {
        let mut surface = Self::default();
        for (index, (quote, outcome)) in quotes.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(implied_vol) => surface.points.push(SurfacePoint {
                    option_type: quote.option_type,
                    strike: quote.strike,
                    time_to_expiry: quote.time_to_expiry,
                    moneyness: quote.moneyness(),
                    implied_vol,
                }),
                Err(error) => surface.failures.push(SurfaceFailure {
                    index,
                    quote: *quote,
                    kind: error.kind(),
                    reason: error.to_string(),
                    error,
                }),
            }
        }
        surface
    }

    fn log_summary(&self, stats: &SolverStatistics) {
        info!(
            points = self.points.len(),
            excluded = self.failures.len(),
            solver_total = stats.total,
            solver_success_rate = stats.success_rate,
            "implied vol surface built"
        );
    }
}

/// Inverts every quote with `solver` and collects the solved points.
///
/// # Examples
/// ```
/// use volsurface::core::{MarketQuote, OptionType};
/// use volsurface::vol::implied::ImpliedVolSolver;
/// use volsurface::vol::surface::build_surface;
///
/// let quotes = [
///     MarketQuote::new(OptionType::Call, 100.0, 100.0, 0.5, 0.02, 6.1),
///     MarketQuote::new(OptionType::Call, 100.0, 90.0, 1.0, 0.05, 5.0),
/// ];
/// let mut solver = ImpliedVolSolver::default();
/// let surface = build_surface(&mut solver, &quotes);
/// assert_eq!(surface.points.len(), 1);
/// assert_eq!(surface.failures[0].kind, "arbitrage");
/// ```
pub fn build_surface(solver: &mut ImpliedVolSolver, quotes: &[MarketQuote]) -> ImpliedSurface {
    let outcomes = quotes.iter().map(|q| solver.calculate_iv(q)).collect();
    let surface = ImpliedSurface::assemble(quotes, outcomes);
    surface.log_summary(&solver.statistics());
    surface
}

/// Parallel [`build_surface`]: each Rayon worker owns a solver built from
/// `config`, and their counters are merged into the returned statistics.
#[cfg(feature = "parallel")]
pub fn build_surface_parallel(
    config: SolverConfig,
    quotes: &[MarketQuote],
) -> (ImpliedSurface, SolverStatistics) {
    let (stats, mut indexed) = quotes
        .par_iter()
        .enumerate()
        .fold(
            || (ImpliedVolSolver::new(config), Vec::new()),
            |(mut solver, mut out), (i, quote)| {
                let outcome = solver.calculate_iv(quote);
                out.push((i, outcome));
                (solver, out)
            },
        )
        .map(|(solver, out)| (solver.statistics(), out))
        .reduce(
            || (SolverStatistics::default(), Vec::new()),
            |(lhs_stats, mut lhs), (rhs_stats, rhs)| {
                lhs.extend(rhs);
                (lhs_stats.merge(rhs_stats), lhs)
            },
        );

    indexed.sort_by_key(|(i, _)| *i);
    let outcomes = indexed.into_iter().map(|(_, outcome)| outcome).collect();
    let surface = ImpliedSurface::assemble(quotes, outcomes);
    surface.log_summary(&stats);
    (surface, stats)
}

/// Moneyness cut-offs used by [`surface_statistics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub atm_moneyness_lower: f64,
    pub atm_moneyness_upper: f64,
    /// Points below this moneyness form the OTM-put wing.
    pub otm_put_moneyness: f64,
    /// Points above this moneyness form the OTM-call wing.
    pub otm_call_moneyness: f64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            atm_moneyness_lower: 0.98,
            atm_moneyness_upper: 1.02,
            otm_put_moneyness: 0.95,
            otm_call_moneyness: 1.05,
        }
    }
}

/// Headline figures of a surface, in volatility units (0.2 = 20%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceStatistics {
    pub point_count: usize,
    /// IV of the point whose moneyness is closest to 1.
    pub atm_iv: f64,
    /// Mean IV of points inside the ATM moneyness band.
    pub atm_band_mean_iv: Option<f64>,
    /// Nearest-expiry OTM-put wing mean minus OTM-call wing mean.
    pub skew: Option<f64>,
    /// ATM IV at the longest expiry minus ATM IV at the shortest expiry.
    pub term_structure: f64,
}

const SAME_EXPIRY_EPS: f64 = 1e-12;

fn atm_distance(point: &SurfacePoint) -> f64 {
    (point.moneyness - 1.0).abs()
}

fn closest_to_atm<'a, I>(points: I) -> Option<&'a SurfacePoint>
where
    I: Iterator<Item = &'a SurfacePoint>,
{
    points.min_by(|a, b| atm_distance(a).total_cmp(&atm_distance(b)))
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Summarizes solved points; `None` for an empty surface.
pub fn surface_statistics(
    points: &[SurfacePoint],
    config: &StatisticsConfig,
) -> Option<SurfaceStatistics> {
    let atm = closest_to_atm(points.iter())?;

    let t_min = points
        .iter()
        .map(|p| p.time_to_expiry)
        .fold(f64::INFINITY, f64::min);
    let t_max = points
        .iter()
        .map(|p| p.time_to_expiry)
        .fold(f64::NEG_INFINITY, f64::max);
    let at_expiry = |t: f64| {
        points
            .iter()
            .filter(move |p| (p.time_to_expiry - t).abs() <= SAME_EXPIRY_EPS)
    };

    let atm_band_mean_iv = mean(
        points
            .iter()
            .filter(|p| {
                (config.atm_moneyness_lower..=config.atm_moneyness_upper).contains(&p.moneyness)
            })
            .map(|p| p.implied_vol),
    );

    let otm_put = mean(
        at_expiry(t_min)
            .filter(|p| p.moneyness < config.otm_put_moneyness)
            .map(|p| p.implied_vol),
    );
    let otm_call = mean(
        at_expiry(t_min)
            .filter(|p| p.moneyness > config.otm_call_moneyness)
            .map(|p| p.implied_vol),
    );
    let skew = otm_put.zip(otm_call).map(|(put, call)| put - call);

    let short_atm = closest_to_atm(at_expiry(t_min))?;
    let long_atm = closest_to_atm(at_expiry(t_max))?;

    Some(SurfaceStatistics {
        point_count: points.len(),
        atm_iv: atm.implied_vol,
        atm_band_mean_iv,
        skew,
        term_structure: long_atm.implied_vol - short_atm.implied_vol,
    })
}
