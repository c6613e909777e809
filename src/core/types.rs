use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::PricingError;

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }

    /// Immediate-exercise payoff, `max(S-K,0)` for calls and `max(K-S,0)` for puts.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    /// Parses `call`/`put` case-insensitively, surrounding whitespace ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("call") {
            Ok(Self::Call)
        } else if trimmed.eq_ignore_ascii_case("put") {
            Ok(Self::Put)
        } else {
            Err(PricingError::InvalidParameter(format!(
                "option type must be 'call' or 'put', got '{raw}'"
            )))
        }
    }
}

/// Contract and market state for a priced Black-Scholes-Merton evaluation.
///
/// All rates are continuously compounded and annualized; `time_to_expiry` is in
/// years. Pricing expects `spot`, `strike`, `time_to_expiry` and `volatility`
/// to be positive; see [`crate::pricing::european`] for the `T <= 0` policy.
///
/// # Examples
/// ```
/// use volsurface::core::{OptionParams, OptionType};
///
/// let params = OptionParams::new(OptionType::Call, 100.0, 105.0, 0.5, 0.03, 0.25)
///     .with_dividend_yield(0.01);
/// assert_eq!(params.dividend_yield, 0.01);
/// assert_eq!(params.with_volatility(0.3).volatility, 0.3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParams {
    /// Call or put.
    pub option_type: OptionType,
    /// Current underlying price `S`.
    pub spot: f64,
    /// Strike `K`.
    pub strike: f64,
    /// Time to expiry `T` in years.
    pub time_to_expiry: f64,
    /// Risk-free rate `r`.
    pub risk_free_rate: f64,
    /// Continuous dividend yield `q`.
    #[serde(default)]
    pub dividend_yield: f64,
    /// Annualized volatility `sigma`.
    pub volatility: f64,
}

impl OptionParams {
    /// Builds a parameter set with zero dividend yield.
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            dividend_yield: 0.0,
            volatility,
        }
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_option_type(mut self, option_type: OptionType) -> Self {
        self.option_type = option_type;
        self
    }

    pub fn with_time_to_expiry(mut self, time_to_expiry: f64) -> Self {
        self.time_to_expiry = time_to_expiry;
        self
    }

    /// Intrinsic value of the contract at the current spot.
    pub fn intrinsic(&self) -> f64 {
        self.option_type.intrinsic(self.spot, self.strike)
    }
}

/// Observed option premium together with the contract and market state needed
/// to invert it. This is an [`OptionParams`] without the volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Call or put.
    pub option_type: OptionType,
    /// Current underlying price `S`.
    pub spot: f64,
    /// Strike `K`.
    pub strike: f64,
    /// Time to expiry `T` in years.
    pub time_to_expiry: f64,
    /// Risk-free rate `r`.
    pub risk_free_rate: f64,
    /// Continuous dividend yield `q`.
    #[serde(default)]
    pub dividend_yield: f64,
    /// Observed premium, typically the bid/ask midpoint.
    pub market_price: f64,
}

impl MarketQuote {
    /// Builds a quote with zero dividend yield.
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        market_price: f64,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            dividend_yield: 0.0,
            market_price,
        }
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    /// Strike over spot.
    pub fn moneyness(&self) -> f64 {
        self.strike / self.spot
    }

    /// Pricing parameters for this quote evaluated at `volatility`.
    pub fn params_at(&self, volatility: f64) -> OptionParams {
        OptionParams {
            option_type: self.option_type,
            spot: self.spot,
            strike: self.strike,
            time_to_expiry: self.time_to_expiry,
            risk_free_rate: self.risk_free_rate,
            dividend_yield: self.dividend_yield,
            volatility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_type_parses_case_insensitively() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("CALL".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" Put ".parse::<OptionType>().unwrap(), OptionType::Put);
    }

    #[test]
    fn option_type_rejects_unknown_kind() {
        let err = "invalid".parse::<OptionType>().unwrap_err();
        assert!(matches!(err, PricingError::InvalidParameter(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn intrinsic_matches_payoff() {
        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
    }

    #[test]
    fn quote_builds_params_at_volatility() {
        let quote = MarketQuote::new(OptionType::Put, 100.0, 95.0, 0.5, 0.02, 3.1)
            .with_dividend_yield(0.01);
        let params = quote.params_at(0.27);
        assert_eq!(params.volatility, 0.27);
        assert_eq!(params.dividend_yield, 0.01);
        assert_eq!(params.option_type, OptionType::Put);
        assert!((quote.moneyness() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn option_type_serializes_lowercase() {
        let json = serde_json::to_string(&OptionType::Call).unwrap();
        assert_eq!(json, "\"call\"");
        let parsed: OptionType = serde_json::from_str("\"put\"").unwrap();
        assert_eq!(parsed, OptionType::Put);
    }
}
