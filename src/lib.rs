//! `volsurface` turns traded European option premiums into Black-Scholes implied
//! volatilities and assembles them into a scattered volatility surface.
//!
//! The crate has two numerical layers:
//! - a closed-form Black-Scholes-Merton pricer with continuous dividend yield and
//!   its Greeks (delta, gamma, vega, daily theta, rho);
//! - an implied-volatility solver that screens inputs, rejects premiums below
//!   intrinsic value, and inverts the pricer with Brent's method on a fixed
//!   volatility bracket, keeping per-instance success/failure counters.
//!
//! On top of those sit thin helpers for option-chain preparation, batch surface
//! construction and surface summary statistics, a TOML configuration layer and a
//! `tracing` subscriber helper for binaries.
//!
//! References:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 15, 17 and 19.
//! - Brent (1973), *Algorithms for Minimization without Derivatives*, Ch. 4.
//!
//! # Feature Flags
//! - `parallel`: enables Rayon-powered parallel surface construction.
//!
//! # Quick Start
//! Price a Black-Scholes call:
//! ```rust
//! use volsurface::core::{OptionParams, OptionType};
//! use volsurface::pricing::european::black_scholes_price;
//!
//! let px = black_scholes_price(&OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.20));
//! assert!(px > 10.0 && px < 11.0);
//! ```
//!
//! Compute Greeks:
//! ```rust
//! use volsurface::core::{OptionParams, OptionType};
//! use volsurface::greeks::black_scholes_greeks;
//!
//! let g = black_scholes_greeks(&OptionParams::new(OptionType::Put, 100.0, 100.0, 1.0, 0.05, 0.20));
//! assert!(g.delta < 0.0 && g.gamma > 0.0 && g.vega > 0.0);
//! ```
//!
//! Invert implied volatility:
//! ```rust
//! use volsurface::core::{MarketQuote, OptionParams, OptionType};
//! use volsurface::pricing::european::black_scholes_price;
//! use volsurface::vol::implied::ImpliedVolSolver;
//!
//! let sigma_true = 0.25;
//! let market = black_scholes_price(&OptionParams::new(OptionType::Call, 100.0, 105.0, 1.0, 0.02, sigma_true));
//!
//! let mut solver = ImpliedVolSolver::default();
//! let quote = MarketQuote::new(OptionType::Call, 100.0, 105.0, 1.0, 0.02, market);
//! let sigma = solver.calculate_iv(&quote).unwrap();
//! assert!((sigma - sigma_true).abs() < 1.0e-4);
//!
//! let rejected = MarketQuote::new(OptionType::Call, 100.0, 90.0, 1.0, 0.05, 5.0);
//! assert!(solver.calculate_iv(&rejected).is_err());
//! assert_eq!(solver.statistics().failed, 1);
//! ```

pub mod config;
pub mod core;
pub mod greeks;
pub mod logging;
pub mod math;
pub mod pricing;
pub mod vol;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::*;
    pub use crate::greeks::black_scholes_greeks;
    pub use crate::pricing::european::black_scholes_price;
    pub use crate::vol::*;
}
