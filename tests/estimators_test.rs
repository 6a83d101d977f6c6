// tests/estimators_test.rs
use fast_mc::analytics::bs_analytic;
use fast_mc::analytics::merton_jump_price;
use fast_mc::market::{MarketParameters, OptionKind, OptionSpec};
use fast_mc::mc::{ControlVariateSpec, CvCoefficient, DrawSource, Estimator, McConfig, Payoff};
use fast_mc::models::{Dynamics, HestonParams, MertonParams};
use fast_mc::McError;

const BS_CALL: f64 = 10.450583572185565;

#[test]
fn test_crude_mc_vs_analytic() {
    let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 1_000_000);
    let mut source = DrawSource::seeded(42);

    let result = Estimator::Crude
        .estimate(&cfg, &mut source)
        .expect("Valid configuration");
    let se = result.std_error.expect("crude estimator reports a standard error");

    println!("\nCrude MC: {} ± {}", result.estimate, se);
    println!("Analytic: {}", BS_CALL);

    assert!(!result.short_circuit);
    assert!(
        (result.estimate - BS_CALL).abs() < 3.0 * se,
        "crude estimate {} is more than 3 SE from {}",
        result.estimate,
        BS_CALL
    );
}

#[test]
fn test_antithetic_reduces_standard_error() {
    let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 100_000);
    let seeds = [1u64, 2, 3, 4, 5, 6, 7, 8];

    let mut se_crude_total = 0.0;
    let mut se_anti_total = 0.0;
    for &seed in &seeds {
        let crude = Estimator::Crude
            .estimate(&cfg, &mut DrawSource::seeded(seed))
            .expect("Valid configuration");
        let anti = Estimator::Antithetic
            .estimate(&cfg, &mut DrawSource::seeded(seed + 1_000))
            .expect("Valid configuration");

        let se_crude = crude.std_error.unwrap();
        let se_anti = anti.std_error.unwrap();
        println!("Run {}: crude SE {:.5}  antithetic SE {:.5}", seed, se_crude, se_anti);

        assert!(anti.z_score(BS_CALL).unwrap() < 4.0);
        assert_eq!(anti.samples, 100_000);
        se_crude_total += se_crude;
        se_anti_total += se_anti;
    }

    let n = seeds.len() as f64;
    println!("
Mean crude SE: {}  Mean antithetic SE: {}", se_crude_total / n, se_anti_total / n);
    assert!(se_anti_total / n <= se_crude_total / n);
}

#[test]
fn test_short_circuit_with_extreme_rate() {
    // e^{-rT} underflows to zero while S_0·e^{rT} overflows
    let market = MarketParameters::new(100.0, 100.0, 1.0, 1000.0, 0.0);
    let cfg = McConfig::european(market, OptionSpec::call(100.0), 1_000);
    let result = Estimator::Crude
        .estimate(&cfg, &mut DrawSource::seeded(1))
        .expect("Valid configuration");
    assert!(result.short_circuit);
    assert!(result.estimate.is_finite());
    assert_eq!(result.estimate, 100.0);

    let long = MarketParameters::new(100.0, 100.0, 20_000.0, 0.05, 0.0);
    let asian = McConfig {
        paths: 1_000,
        steps: 4,
        market: long,
        payoff: Payoff::Asian(OptionSpec::call(100.0)),
        dynamics: Dynamics::Gbm,
    };
    for estimator in [Estimator::Crude, Estimator::Antithetic] {
        let err = estimator
            .estimate(&asian, &mut DrawSource::seeded(1))
            .unwrap_err();
        assert!(matches!(err, McError::NumericOverflow { .. }), "{:?}", err);
    }
}

#[test]
fn test_antithetic_rejects_odd_paths() {
    let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 1_001);
    let err = Estimator::Antithetic
        .estimate(&cfg, &mut DrawSource::seeded(1))
        .unwrap_err();
    assert!(matches!(err, McError::InvalidSampleCount { count: 1_001, .. }));
}

#[test]
fn test_control_variate_on_asian_option() {
    let market = MarketParameters::default();
    let cfg = McConfig {
        paths: 100_000,
        steps: 12,
        market,
        payoff: Payoff::Asian(OptionSpec::call(100.0)),
        dynamics: Dynamics::Gbm,
    };

    let crude = Estimator::Crude
        .estimate(&cfg, &mut DrawSource::seeded(11))
        .expect("Valid configuration");

    for coefficient in [CvCoefficient::Unit, CvCoefficient::Optimal] {
        let spec = ControlVariateSpec::black_scholes(&market, OptionSpec::call(100.0), coefficient)
            .expect("Valid control");
        let cv = Estimator::ControlVariate(spec)
            .estimate(&cfg, &mut DrawSource::seeded(12))
            .expect("Valid configuration");

        let se_crude = crude.std_error.unwrap();
        let se_cv = cv.std_error.unwrap();
        println!(
            "\n{:?}: CV {} ± {}  crude {} ± {}",
            coefficient, cv.estimate, se_cv, crude.estimate, se_crude
        );

        if coefficient == CvCoefficient::Optimal {
            assert!(se_cv < se_crude, "control variate did not reduce the error");
        }
        let combined = (se_crude * se_crude + se_cv * se_cv).sqrt();
        assert!((cv.estimate - crude.estimate).abs() < 4.0 * combined);
    }
}

#[test]
fn test_zero_maturity_short_circuits_every_estimator() {
    let market = MarketParameters::new(110.0, 100.0, 0.0, 0.05, 0.2);
    let cfg = McConfig::european(market, OptionSpec::call(100.0), 1_000);
    let spec = ControlVariateSpec::black_scholes(&market, OptionSpec::call(100.0), CvCoefficient::Optimal)
        .expect("Valid control");

    let estimators = [
        Estimator::Crude,
        Estimator::Antithetic,
        Estimator::ControlVariate(spec),
    ];
    for estimator in estimators {
        let result = estimator
            .estimate(&cfg, &mut DrawSource::seeded(3))
            .expect("Valid configuration");
        assert!(result.short_circuit, "{} did not short-circuit", estimator.name());
        assert_eq!(result.estimate, 10.0);
        assert_eq!(result.std_error, Some(0.0));
    }

    let mut sobol = DrawSource::sobol_for(&cfg).expect("Valid dimension");
    let result = Estimator::QuasiRandom
        .estimate(&cfg, &mut sobol)
        .expect("Valid configuration");
    assert!(result.short_circuit);
    assert_eq!(result.estimate, 10.0);
}

#[test]
fn test_zero_volatility_is_discounted_forward() {
    let market = MarketParameters::new(100.0, 90.0, 1.0, 0.05, 0.0);
    let cfg = McConfig::european(market, OptionSpec::call(90.0), 10_000);
    let result = Estimator::Crude
        .estimate(&cfg, &mut DrawSource::seeded(3))
        .expect("Valid configuration");
    let expected = 100.0 - 90.0 * (-0.05f64).exp();
    assert!(result.short_circuit);
    assert!((result.estimate - expected).abs() < 1e-12);
}

#[test]
fn test_quasi_random_close_to_analytic() {
    let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 65_536);
    let mut source = DrawSource::sobol_for(&cfg).expect("Valid dimension");

    let result = Estimator::QuasiRandom
        .estimate(&cfg, &mut source)
        .expect("Valid configuration");

    println!("\nQMC: {}  Analytic: {}", result.estimate, BS_CALL);
    assert!(result.std_error.is_none());
    assert!((result.estimate - BS_CALL).abs() < 0.01);
}

#[test]
fn test_quasi_random_multi_step_asian() {
    let market = MarketParameters::default();
    let cfg = McConfig {
        paths: 32_768,
        steps: 16,
        market,
        payoff: Payoff::Asian(OptionSpec::call(100.0)),
        dynamics: Dynamics::Gbm,
    };
    let mut sobol = DrawSource::sobol_for(&cfg).expect("Valid dimension");
    let qmc = Estimator::QuasiRandom
        .estimate(&cfg, &mut sobol)
        .expect("Valid configuration");

    let reference = Estimator::Antithetic
        .estimate(
            &McConfig {
                paths: 400_000,
                ..cfg.clone()
            },
            &mut DrawSource::seeded(8),
        )
        .expect("Valid configuration");
    let se = reference.std_error.unwrap();
    println!("\nQMC Asian: {}  MC Asian: {} ± {}", qmc.estimate, reference.estimate, se);
    assert!((qmc.estimate - reference.estimate).abs() < 4.0 * se + 0.02);
}

#[test]
fn test_wrong_draw_source_is_configuration_error() {
    let cfg = McConfig::default();
    let mut sobol = DrawSource::sobol_for(&cfg).expect("Valid dimension");
    assert!(matches!(
        Estimator::Crude.estimate(&cfg, &mut sobol),
        Err(McError::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        Estimator::QuasiRandom.estimate(&cfg, &mut DrawSource::seeded(1)),
        Err(McError::InvalidConfiguration { .. })
    ));
}

#[test]
fn test_put_call_parity_mc() {
    let market = MarketParameters::default();
    let call_cfg = McConfig::european(market, OptionSpec::call(100.0), 200_000);
    let put_cfg = McConfig::european(market, OptionSpec::put(100.0), 200_000);

    // Same seed, same draws
    let call = Estimator::Crude
        .estimate(&call_cfg, &mut DrawSource::seeded(77))
        .expect("Valid configuration");
    let put = Estimator::Crude
        .estimate(&put_cfg, &mut DrawSource::seeded(77))
        .expect("Valid configuration");

    let parity = market.spot - market.strike * market.discount_factor();
    println!("\nC - P = {}  parity = {}", call.estimate - put.estimate, parity);
    assert!((call.estimate - put.estimate - parity).abs() < 0.2);

    let bs_gap = bs_analytic::bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0)
        - bs_analytic::bs_put_price(100.0, 100.0, 0.05, 0.2, 1.0);
    assert!((bs_gap - parity).abs() < 1e-10);
}

#[test]
fn test_merton_mc_vs_series() {
    let market = MarketParameters::default();
    let params = MertonParams::default();
    let cfg = McConfig {
        paths: 200_000,
        steps: 4,
        market,
        payoff: Payoff::European(OptionSpec::call(100.0)),
        dynamics: Dynamics::Merton(params),
    };

    let mc = Estimator::Antithetic
        .estimate(&cfg, &mut DrawSource::seeded(2024))
        .expect("Valid configuration");
    let series = merton_jump_price(OptionKind::Call, &market, &params).expect("Valid parameters");
    let se = mc.std_error.unwrap();

    println!("\nMerton MC: {} ± {}  series: {}", mc.estimate, se, series);
    assert!((mc.estimate - series).abs() < 4.0 * se);
}

#[test]
fn test_heston_without_vol_of_vol_is_black_scholes() {
    let market = MarketParameters::default();
    let params = HestonParams {
        v0: 0.04,
        kappa: 2.0,
        theta: 0.04,
        xi: 0.0,
        rho: -0.7,
    };
    let cfg = McConfig {
        paths: 100_000,
        steps: 20,
        market,
        payoff: Payoff::European(OptionSpec::call(100.0)),
        dynamics: Dynamics::Heston(params),
    };

    let mc = Estimator::Crude
        .estimate(&cfg, &mut DrawSource::seeded(5))
        .expect("Valid configuration");
    let se = mc.std_error.unwrap();

    println!("\nHeston (xi = 0): {} ± {}  BS: {}", mc.estimate, se, BS_CALL);
    assert!((mc.estimate - BS_CALL).abs() < 4.0 * se);
}

#[test]
fn test_repeated_calls_use_fresh_streams() {
    let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 20_000);
    let mut source = DrawSource::seeded(9);
    let first = Estimator::Crude.estimate(&cfg, &mut source).unwrap();
    let second = Estimator::Crude.estimate(&cfg, &mut source).unwrap();
    assert_ne!(first.estimate, second.estimate);
    assert_ne!(first.provenance, second.provenance);

    let replay = Estimator::Crude
        .estimate(&cfg, &mut DrawSource::seeded(9))
        .unwrap();
    assert_eq!(first, replay);
}

#[test]
#[ignore]
fn test_crude_convergence_sweep() {
    let mut last_se = f64::INFINITY;
    for &paths in &[10_000usize, 100_000, 1_000_000, 10_000_000] {
        let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), paths);
        let result = Estimator::Crude
            .estimate(&cfg, &mut DrawSource::seeded(paths as u64))
            .unwrap();
        let se = result.std_error.unwrap();
        println!("paths={:>10} estimate={:.6} se={:.6}", paths, result.estimate, se);
        assert!(se < last_se);
        assert!((result.estimate - BS_CALL).abs() < 4.0 * se);
        last_se = se;
    }
}
