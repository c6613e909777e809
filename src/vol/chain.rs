//! Option-chain snapshot preparation.
//!
//! Turns raw bid/ask chain rows into [`MarketQuote`]s ready for inversion:
//! Act/365 time to expiry from the snapshot date, bid/ask midpoint as the
//! market price, and liquidity/moneyness/expiry filters from [`ChainFilter`].
//! Fetching the snapshot itself is the caller's business.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;
use crate::core::{MarketQuote, OptionType};

/// Quotes expiring sooner than this (in years) are treated as expired.
const MIN_YEAR_FRACTION: f64 = 0.001;
/// Mid prices at or below this are treated as untradeable.
const MIN_MID_PRICE: f64 = 0.01;

/// One row of an option chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainQuote {
    pub option_type: OptionType,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub bid: f64,
    pub ask: f64,
    /// Traded volume; quotes without volume information are not volume-filtered.
    #[serde(default)]
    pub volume: Option<u64>,
}

impl ChainQuote {
    pub fn mid(&self) -> f64 {
        0.5 * (self.bid + self.ask)
    }
}

/// Chain rows observed at one instant against one underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub as_of: NaiveDate,
    pub spot: f64,
    /// Overrides [`ModelConfig::default_risk_free_rate`] when present.
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
    /// Overrides [`ModelConfig::default_dividend_yield`] when present.
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    pub quotes: Vec<ChainQuote>,
}

/// Liquidity and range filters applied before inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainFilter {
    /// Lowest strike kept, in percent of spot.
    pub min_strike_pct: f64,
    /// Highest strike kept, in percent of spot.
    pub max_strike_pct: f64,
    pub min_volume: u64,
    pub min_days_to_expiry: i64,
    /// Fewest solved points for a surface to be considered usable.
    pub min_valid_options: usize,
}

impl Default for ChainFilter {
    fn default() -> Self {
        Self {
            min_strike_pct: 75.0,
            max_strike_pct: 125.0,
            min_volume: 10,
            min_days_to_expiry: 7,
            min_valid_options: 10,
        }
    }
}

/// Act/365 Fixed year fraction between two dates, negative when `end < start`.
pub fn year_fraction(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / 365.0
}

/// Filters the snapshot and converts surviving rows into solver inputs.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volsurface::config::ModelConfig;
/// use volsurface::core::OptionType;
/// use volsurface::vol::chain::{ChainFilter, ChainQuote, ChainSnapshot, prepare_chain};
///
/// let as_of = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
/// let snapshot = ChainSnapshot {
///     as_of,
///     spot: 100.0,
///     risk_free_rate: Some(0.04),
///     dividend_yield: None,
///     quotes: vec![ChainQuote {
///         option_type: OptionType::Call,
///         strike: 100.0,
///         expiry: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
///         bid: 4.0,
///         ask: 4.2,
///         volume: Some(250),
///     }],
/// };
/// let quotes = prepare_chain(&snapshot, &ChainFilter::default(), &ModelConfig::default());
/// assert_eq!(quotes.len(), 1);
/// assert!((quotes[0].market_price - 4.1).abs() < 1e-12);
/// assert_eq!(quotes[0].risk_free_rate, 0.04);
/// ```
pub fn prepare_chain(
    snapshot: &ChainSnapshot,
    filter: &ChainFilter,
    model: &ModelConfig,
) -> Vec<MarketQuote> {
    let rate = snapshot
        .risk_free_rate
        .unwrap_or(model.default_risk_free_rate);
    let dividend_yield = snapshot
        .dividend_yield
        .unwrap_or(model.default_dividend_yield);
    let min_strike = snapshot.spot * filter.min_strike_pct / 100.0;
    let max_strike = snapshot.spot * filter.max_strike_pct / 100.0;

    let quotes: Vec<MarketQuote> = snapshot
        .quotes
        .iter()
        .filter(|row| {
            let days = (row.expiry - snapshot.as_of).num_days();
            let mid = row.mid();
            days >= filter.min_days_to_expiry
                && year_fraction(snapshot.as_of, row.expiry) > MIN_YEAR_FRACTION
                && mid.is_finite()
                && mid > MIN_MID_PRICE
                && row.volume.is_none_or(|v| v >= filter.min_volume)
                && (min_strike..=max_strike).contains(&row.strike)
        })
        .map(|row| {
            MarketQuote::new(
                row.option_type,
                snapshot.spot,
                row.strike,
                year_fraction(snapshot.as_of, row.expiry),
                rate,
                row.mid(),
            )
            .with_dividend_yield(dividend_yield)
        })
        .collect();

    debug!(
        rows = snapshot.quotes.len(),
        kept = quotes.len(),
        dropped = snapshot.quotes.len() - quotes.len(),
        "prepared option chain"
    );
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(strike: f64, expiry: NaiveDate, bid: f64, ask: f64, volume: Option<u64>) -> ChainQuote {
        ChainQuote {
            option_type: OptionType::Put,
            strike,
            expiry,
            bid,
            ask,
            volume,
        }
    }

    fn snapshot(quotes: Vec<ChainQuote>) -> ChainSnapshot {
        ChainSnapshot {
            as_of: date(2025, 3, 3),
            spot: 200.0,
            risk_free_rate: None,
            dividend_yield: None,
            quotes,
        }
    }

    #[test]
    fn year_fraction_is_act_365() {
        assert_relative_eq!(year_fraction(date(2025, 1, 1), date(2026, 1, 1)), 1.0);
        assert_relative_eq!(year_fraction(date(2025, 1, 1), date(2025, 1, 1)), 0.0);
        assert!(year_fraction(date(2025, 1, 2), date(2025, 1, 1)) < 0.0);
    }

    #[test]
    fn filters_drop_illiquid_short_and_far_strikes() {
        let far = date(2025, 6, 3);
        let snap = snapshot(vec![
            row(200.0, far, 5.0, 5.4, Some(100)),
            // Below 75% of spot.
            row(140.0, far, 0.5, 0.7, Some(100)),
            // Above 125% of spot.
            row(260.0, far, 0.5, 0.7, Some(100)),
            // Too little volume.
            row(190.0, far, 2.0, 2.2, Some(3)),
            // Expires within a week.
            row(200.0, date(2025, 3, 6), 1.0, 1.2, Some(100)),
            // Already expired.
            row(200.0, date(2025, 3, 1), 1.0, 1.2, Some(100)),
            // Worthless mid.
            row(150.0, far, 0.0, 0.01, Some(100)),
            // Unknown volume passes.
            row(210.0, far, 9.0, 9.5, None),
        ]);

        let quotes = prepare_chain(&snap, &ChainFilter::default(), &ModelConfig::default());
        let strikes: Vec<f64> = quotes.iter().map(|q| q.strike).collect();
        assert_eq!(strikes, vec![200.0, 210.0]);
    }

    #[test]
    fn model_defaults_fill_missing_rates() {
        let snap = snapshot(vec![row(200.0, date(2025, 6, 3), 5.0, 5.4, Some(100))]);
        let model = ModelConfig::default();
        let quotes = prepare_chain(&snap, &ChainFilter::default(), &model);
        assert_eq!(quotes[0].risk_free_rate, model.default_risk_free_rate);
        assert_eq!(quotes[0].dividend_yield, model.default_dividend_yield);
        assert_relative_eq!(quotes[0].time_to_expiry, 92.0 / 365.0, epsilon = 1e-12);
        assert_relative_eq!(quotes[0].market_price, 5.2, epsilon = 1e-12);
    }

    #[test]
    fn snapshot_deserializes_from_json() {
        let json = r#"{
            "as_of": "2025-03-03",
            "spot": 200.0,
            "quotes": [
                {"option_type": "call", "strike": 205.0, "expiry": "2025-04-17", "bid": 3.1, "ask": 3.3}
            ]
        }"#;
        let snap: ChainSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.quotes.len(), 1);
        assert_eq!(snap.quotes[0].option_type, OptionType::Call);
        assert_eq!(snap.quotes[0].volume, None);
        assert_eq!(snap.risk_free_rate, None);
    }
}
