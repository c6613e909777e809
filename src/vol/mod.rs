//! Module `vol::mod`.
//!
//! Implied-volatility inversion and the scattered surface built from it.
//!
//! Numerical considerations: inversion is bracketed on a fixed volatility
//! interval, so every failure is classified (validation, arbitrage, bracketing,
//! convergence, numerical) instead of silently diverging.
pub mod chain;
pub mod implied;
pub mod surface;

pub use implied::{ImpliedVolSolver, IvError, SolverConfig, SolverStatistics};
pub use surface::{ImpliedSurface, SurfacePoint, SurfaceStatistics, build_surface, surface_statistics};
