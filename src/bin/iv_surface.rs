//! Command-line entry point for implied-volatility workflows.
//!
//! `price` evaluates one contract and its Greeks; `surface` inverts a JSON
//! option-chain snapshot into a scattered implied-vol surface. Results go to
//! stdout as JSON, logs go to stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use volsurface::config::EngineConfig;
use volsurface::core::{Greeks, OptionParams, OptionType};
use volsurface::greeks::black_scholes_greeks;
use volsurface::logging::init_logging;
use volsurface::pricing::european::black_scholes_price;
use volsurface::vol::chain::{ChainSnapshot, prepare_chain};
use volsurface::vol::implied::{ImpliedVolSolver, SolverStatistics};
use volsurface::vol::surface::{ImpliedSurface, SurfaceStatistics, build_surface, surface_statistics};

#[derive(Debug, Parser)]
#[command(name = "iv_surface", version, about = "Black-Scholes pricing and implied-volatility surfaces")]
struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price one European option and report its Greeks.
    Price {
        /// `call` or `put`.
        #[arg(long, default_value = "call")]
        option_type: String,
        #[arg(long)]
        spot: f64,
        #[arg(long)]
        strike: f64,
        /// Time to expiry in years.
        #[arg(long)]
        expiry: f64,
        #[arg(long)]
        vol: f64,
        /// Defaults to the configured risk-free rate.
        #[arg(long)]
        rate: Option<f64>,
        /// Defaults to the configured dividend yield.
        #[arg(long)]
        dividend_yield: Option<f64>,
    },
    /// Build an implied-vol surface from a JSON chain snapshot.
    Surface {
        /// Snapshot file (`as_of`, `spot`, optional rates, `quotes`).
        #[arg(long)]
        chain: PathBuf,
        /// Include excluded contracts and their reasons in the output.
        #[arg(long)]
        show_failures: bool,
    },
}

#[derive(Debug, Serialize)]
struct PriceReport {
    params: OptionParams,
    price: f64,
    greeks: Greeks,
    vega_per_pct: f64,
}

#[derive(Debug, Serialize)]
struct SurfaceReport {
    surface: ImpliedSurface,
    statistics: Option<SurfaceStatistics>,
    solver: SolverStatistics,
    meets_minimum: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Command::Price {
            option_type,
            spot,
            strike,
            expiry,
            vol,
            rate,
            dividend_yield,
        } => {
            let option_type: OptionType = option_type.parse()?;
            let params = OptionParams::new(
                option_type,
                spot,
                strike,
                expiry,
                rate.unwrap_or(config.model.default_risk_free_rate),
                vol,
            )
            .with_dividend_yield(dividend_yield.unwrap_or(config.model.default_dividend_yield));
            let greeks = black_scholes_greeks(&params);
            let report = PriceReport {
                params,
                price: black_scholes_price(&params),
                greeks,
                vega_per_pct: greeks.vega_per_pct(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Surface {
            chain,
            show_failures,
        } => {
            let raw = fs::read_to_string(&chain)
                .with_context(|| format!("reading chain snapshot {}", chain.display()))?;
            let snapshot: ChainSnapshot = serde_json::from_str(&raw)
                .with_context(|| format!("parsing chain snapshot {}", chain.display()))?;
            info!(
                as_of = %snapshot.as_of,
                spot = snapshot.spot,
                rows = snapshot.quotes.len(),
                "loaded chain snapshot"
            );

            let quotes = prepare_chain(&snapshot, &config.chain, &config.model);
            let mut solver = ImpliedVolSolver::new(config.solver);
            let mut surface = build_surface(&mut solver, &quotes);
            let meets_minimum = surface.meets_minimum(config.chain.min_valid_options);
            if !meets_minimum {
                warn!(
                    points = surface.len(),
                    required = config.chain.min_valid_options,
                    "too few solved contracts for a reliable surface"
                );
            }
            let statistics = surface_statistics(&surface.points, &config.statistics);
            if !show_failures {
                surface.failures.clear();
            }

            let report = SurfaceReport {
                surface,
                statistics,
                solver: solver.statistics(),
                meets_minimum,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
