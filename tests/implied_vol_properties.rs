use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use volsurface::core::{MarketQuote, OptionParams, OptionType};
use volsurface::greeks::vega;
use volsurface::pricing::european::black_scholes_price;
use volsurface::vol::implied::{ImpliedVolSolver, IvError, SolverStatistics};

fn quote_for(params: &OptionParams) -> MarketQuote {
    MarketQuote::new(
        params.option_type,
        params.spot,
        params.strike,
        params.time_to_expiry,
        params.risk_free_rate,
        black_scholes_price(params),
    )
    .with_dividend_yield(params.dividend_yield)
}

#[test]
fn random_round_trips_recover_sigma() {
    let mut rng = StdRng::seed_from_u64(20_240_917);
    let mut solver = ImpliedVolSolver::default();
    let mut checked = 0;

    for _ in 0..500 {
        let option_type = if rng.random_bool(0.5) {
            OptionType::Call
        } else {
            OptionType::Put
        };
        let params = OptionParams::new(
            option_type,
            100.0,
            rng.random_range(70.0..130.0),
            rng.random_range(0.05..2.0),
            rng.random_range(0.0..0.08),
            rng.random_range(0.08..0.9),
        )
        .with_dividend_yield(rng.random_range(0.0..0.05));

        let price = black_scholes_price(&params);
        // Outside the solver's domain, or sigma not identifiable from the price.
        if price < 0.01 || price < 0.99 * params.intrinsic() || vega(&params) < 0.05 {
            continue;
        }

        let iv = solver
            .calculate_iv(&quote_for(&params))
            .unwrap_or_else(|e| panic!("{params:?}: {e}"));
        assert!(
            (iv - params.volatility).abs() < 1e-4,
            "params={params:?} iv={iv}"
        );
        checked += 1;
    }

    assert!(checked > 300, "only {checked} cases exercised");
    let stats = solver.statistics();
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.total, checked);
}

#[test]
fn low_vega_short_dated_grid_round_trips() {
    let mut solver = ImpliedVolSolver::default();
    let mut low_vega = 0;

    for option_type in [OptionType::Call, OptionType::Put] {
        for strike in (70..=130).map(f64::from) {
            for &expiry in &[0.1, 0.25, 0.5, 1.0, 2.0] {
                for step in 0..9 {
                    let params = OptionParams::new(
                        option_type,
                        100.0,
                        strike,
                        expiry,
                        0.03,
                        0.10 + 0.05 * step as f64,
                    )
                    .with_dividend_yield(0.01);
                    let price = black_scholes_price(&params);
                    let v = vega(&params);
                    if price < 0.01 || price < 0.99 * params.intrinsic() || v < 0.05 {
                        continue;
                    }
                    if v < 0.5 {
                        low_vega += 1;
                    }

                    let iv = solver
                        .calculate_iv(&quote_for(&params))
                        .unwrap_or_else(|e| panic!("{params:?}: {e}"));
                    assert!(
                        (iv - params.volatility).abs() < 1e-4,
                        "params={params:?} vega={v} iv={iv}"
                    );
                }
            }
        }
    }

    assert!(low_vega > 10, "only {low_vega} low-vega cases exercised");
    assert_eq!(solver.statistics().failed, 0);
}

#[test]
fn short_dated_itm_calls_keep_sigma_accuracy() {
    // vega ~0.52 and ~0.065: a loose price residual would miss by ~1e-4 and ~1e-3.
    let mut solver = ImpliedVolSolver::default();
    for strike in [89.0, 86.0] {
        let params = OptionParams::new(OptionType::Call, 100.0, strike, 0.1, 0.03, 0.15)
            .with_dividend_yield(0.01);
        let iv = solver.calculate_iv(&quote_for(&params)).unwrap();
        assert_relative_eq!(iv, 0.15, epsilon = 1e-6);
    }
}

#[test]
fn extreme_round_trips_recover_sigma_loosely() {
    let cases = [
        // Very short maturity.
        OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.02, 0.20),
        OptionParams::new(OptionType::Put, 100.0, 101.0, 0.01, 0.02, 0.35),
        // Very high vol.
        OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.0, 3.0),
        OptionParams::new(OptionType::Put, 100.0, 110.0, 0.5, 0.01, 2.5),
        // Very low vol.
        OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.0, 0.02),
        OptionParams::new(OptionType::Put, 100.0, 100.0, 1.0, 0.0, 0.03),
    ];

    let mut solver = ImpliedVolSolver::default();
    for params in cases {
        let iv = solver
            .calculate_iv(&quote_for(&params))
            .unwrap_or_else(|e| panic!("{params:?}: {e}"));
        assert!(
            (iv - params.volatility).abs() < 1e-3,
            "params={params:?} iv={iv}"
        );
    }
}

#[test]
fn each_invalid_input_counts_exactly_once() {
    let invalid = [
        ("zero spot", MarketQuote::new(OptionType::Call, 0.0, 100.0, 1.0, 0.05, 10.0)),
        ("negative spot", MarketQuote::new(OptionType::Call, -100.0, 100.0, 1.0, 0.05, 10.0)),
        ("zero strike", MarketQuote::new(OptionType::Call, 100.0, 0.0, 1.0, 0.05, 10.0)),
        ("zero expiry", MarketQuote::new(OptionType::Call, 100.0, 100.0, 0.0, 0.05, 10.0)),
        ("zero price", MarketQuote::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.0)),
        ("negative price", MarketQuote::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, -1.0)),
    ];

    let mut solver = ImpliedVolSolver::default();
    for (n, (label, quote)) in invalid.iter().enumerate() {
        let before = solver.statistics();
        let err = solver.calculate_iv(quote).unwrap_err();
        assert!(matches!(err, IvError::Validation { .. }), "{label}: {err:?}");

        let after = solver.statistics();
        assert_eq!(after.total, before.total + 1, "{label}");
        assert_eq!(after.failed, before.failed + 1, "{label}");
        assert_eq!(after.total, n as u64 + 1);
    }

    let before = solver.statistics();
    let err = solver
        .calculate_iv_for_kind(100.0, 100.0, 1.0, 0.05, 10.0, 0.0, "invalid")
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    let after = solver.statistics();
    assert_eq!(after.total, before.total + 1);
    assert_eq!(after.failed, before.failed + 1);
    assert_eq!(after.successful, 0);
}

#[test]
fn deep_itm_call_at_half_intrinsic_is_rejected() {
    let mut solver = ImpliedVolSolver::default();
    let quote = MarketQuote::new(OptionType::Call, 100.0, 50.0, 1.0, 0.05, 0.5 * 50.0);
    match solver.calculate_iv(&quote) {
        Err(IvError::Arbitrage {
            market_price,
            intrinsic,
            tolerance,
        }) => {
            assert_eq!(market_price, 25.0);
            assert_eq!(intrinsic, 50.0);
            assert_eq!(tolerance, 0.99);
        }
        other => panic!("expected arbitrage failure, got {other:?}"),
    }
}

#[test]
fn call_quoted_at_half_its_intrinsic_value_is_arbitrage() {
    let mut solver = ImpliedVolSolver::default();
    let err = solver
        .calculate_iv_for_kind(100.0, 90.0, 1.0, 0.05, 5.0, 0.0, "call")
        .unwrap_err();
    assert_eq!(err.kind(), "arbitrage");
    assert!(err.to_string().starts_with("arbitrage violation"));
    assert_eq!(solver.statistics().failed, 1);
}

#[test]
fn atm_call_with_dividend_yield_round_trips() {
    let params = OptionParams::new(OptionType::Call, 100.0, 100.0, 1.0, 0.015, 0.20)
        .with_dividend_yield(0.013);
    let mut solver = ImpliedVolSolver::default();
    let iv = solver
        .calculate_iv_for_kind(100.0, 100.0, 1.0, 0.015, black_scholes_price(&params), 0.013, "Call")
        .unwrap();
    assert_relative_eq!(iv, 0.20, epsilon = 1e-4);
}

#[test]
fn statistics_track_a_mixed_sequence() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut solver = ImpliedVolSolver::default();
    let mut errors = 0_u64;
    let n = 250_u64;

    for _ in 0..n {
        let option_type = if rng.random_bool(0.5) {
            OptionType::Call
        } else {
            OptionType::Put
        };
        let quote = MarketQuote::new(
            option_type,
            rng.random_range(-10.0..150.0),
            rng.random_range(50.0..150.0),
            rng.random_range(-0.1..2.0),
            rng.random_range(0.0..0.1),
            rng.random_range(-1.0..40.0),
        );
        if solver.calculate_iv(&quote).is_err() {
            errors += 1;
        }
    }

    let stats = solver.statistics();
    assert_eq!(stats.total, n);
    assert_eq!(stats.failed, errors);
    assert!(stats.failed <= stats.total);
    assert_eq!(stats.successful + stats.failed, stats.total);
    assert!(stats.failed > 0 && stats.successful > 0, "{stats:?}");
    assert_relative_eq!(
        stats.success_rate,
        stats.successful as f64 / n as f64 * 100.0
    );

    solver.reset_statistics();
    assert_eq!(solver.statistics(), SolverStatistics::default());
    assert_eq!(solver.statistics().success_rate, 0.0);
}
