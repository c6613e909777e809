//! Engine configuration.
//!
//! Every section and field has a default, so an empty TOML document is a
//! valid configuration:
//!
//! ```toml
//! [model]
//! default_risk_free_rate = 0.045
//!
//! [solver]
//! vol_upper = 4.0
//! intrinsic_tolerance = 1.0
//!
//! [chain]
//! min_volume = 0
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::vol::chain::ChainFilter;
use crate::vol::implied::SolverConfig;
use crate::vol::surface::StatisticsConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub model: ModelConfig,
    pub solver: SolverConfig,
    pub chain: ChainFilter,
    pub statistics: StatisticsConfig,
    pub logging: LoggingConfig,
}

/// Market-parameter defaults used when a snapshot omits them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub default_risk_free_rate: f64,
    pub default_dividend_yield: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_risk_free_rate: 0.015,
            default_dividend_yield: 0.013,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Rejects inverted bounds, non-positive tolerances and defaults the
    /// solver itself would refuse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.solver;
        if !(s.vol_lower > 0.0 && s.vol_lower < s.vol_upper && s.vol_upper.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "solver vol bounds must satisfy 0 < vol_lower < vol_upper, got [{}, {}]",
                s.vol_lower, s.vol_upper
            )));
        }
        if s.price_tolerance <= 0.0 || s.bracket_tolerance <= 0.0 {
            return Err(ConfigError::Invalid(
                "solver tolerances must be positive".to_string(),
            ));
        }
        if s.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "solver max_iterations must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&s.intrinsic_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "intrinsic_tolerance must be in [0, 1], got {}",
                s.intrinsic_tolerance
            )));
        }
        if s.min_rate > s.max_rate || s.min_dividend_yield > s.max_dividend_yield {
            return Err(ConfigError::Invalid(
                "rate and dividend-yield ranges must not be inverted".to_string(),
            ));
        }

        let m = &self.model;
        if !(s.min_rate..=s.max_rate).contains(&m.default_risk_free_rate) {
            return Err(ConfigError::Invalid(format!(
                "default_risk_free_rate {} outside solver range",
                m.default_risk_free_rate
            )));
        }
        if !(s.min_dividend_yield..=s.max_dividend_yield).contains(&m.default_dividend_yield) {
            return Err(ConfigError::Invalid(format!(
                "default_dividend_yield {} outside solver range",
                m.default_dividend_yield
            )));
        }

        let c = &self.chain;
        if c.min_strike_pct >= c.max_strike_pct || c.min_strike_pct < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "chain strike range must satisfy 0 <= min < max, got [{}, {}]",
                c.min_strike_pct, c.max_strike_pct
            )));
        }

        let st = &self.statistics;
        if st.atm_moneyness_lower > st.atm_moneyness_upper
            || st.otm_put_moneyness > st.otm_call_moneyness
        {
            return Err(ConfigError::Invalid(
                "statistics moneyness cut-offs are inverted".to_string(),
            ));
        }
        Ok(())
    }
}
