//! Core domain types and library-wide error structures.

pub mod types;

pub use types::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standardized Greeks container returned by the analytic pricer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// First derivative to spot.
    pub delta: f64,
    /// Second derivative to spot.
    pub gamma: f64,
    /// First derivative to volatility, per unit (100%) vol move.
    pub vega: f64,
    /// Negated first derivative to expiry, per calendar day.
    pub theta: f64,
    /// First derivative to rate, per unit rate move.
    pub rho: f64,
}

impl Greeks {
    /// Vega per one volatility point (1%).
    pub fn vega_per_pct(&self) -> f64 {
        self.vega / 100.0
    }
}

/// Pricer-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Option kind or another contract field outside its enumerated domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
