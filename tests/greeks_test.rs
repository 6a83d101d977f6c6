// tests/greeks_test.rs
use fast_mc::analytics::bs_analytic;
use fast_mc::hedging::{portfolio_greeks, OptionPosition};
use fast_mc::market::{MarketParameters, OptionKind, OptionSpec};
use fast_mc::mc::greeks::{mc_greeks, GreeksConfig, McGreeksConfig};
use fast_mc::rng::RngFactory;

#[test]
fn test_mc_delta_pathwise_vs_analytic() {
    let s0 = 100.0;
    let k = 100.0;
    let r = 0.01;
    let sigma = 0.2;
    let t = 1.0;

    let cfg = McGreeksConfig {
        paths: 500_000,
        market: MarketParameters::new(s0, k, t, r, sigma),
        option: OptionSpec::call(k),
        greeks: GreeksConfig::DELTA,
        ..Default::default()
    };

    let greeks = mc_greeks(&cfg, &mut RngFactory::new(42)).expect("Valid configuration");
    let mc_delta = greeks.delta.expect("delta requested").value;
    let analytic_delta = bs_analytic::bs_call_delta(s0, k, r, sigma, t);

    let abs_error = (mc_delta - analytic_delta).abs();
    let rel_error = abs_error / analytic_delta;

    println!("\nMC Delta (Pathwise): {}", mc_delta);
    println!("Analytic Delta: {}", analytic_delta);
    println!("Relative Error: {}", rel_error);

    assert!(rel_error < 0.01, "Relative error for Delta exceeds 1%: {}", rel_error);
}

#[test]
fn test_bs_call_gamma_analytic() {
    let analytic_gamma = bs_analytic::bs_call_gamma(100.0, 100.0, 0.05, 0.20, 1.0);
    let expected_gamma = 0.018762017345847;

    let rel_error = (analytic_gamma - expected_gamma).abs() / expected_gamma;
    println!("\nAnalytic Gamma: {}", analytic_gamma);

    assert!(rel_error < 1e-7, "Relative error for Gamma exceeds tolerance: {}", rel_error);
}

#[test]
fn test_bs_call_vega_analytic() {
    let analytic_vega = bs_analytic::bs_call_vega(100.0, 100.0, 0.05, 0.20, 1.0);
    let expected_vega = 37.524034691693792;

    let rel_error = (analytic_vega - expected_vega).abs() / expected_vega;
    println!("\nAnalytic Vega: {}", analytic_vega);

    assert!(rel_error < 1e-7, "Relative error for Vega exceeds tolerance: {}", rel_error);
}

#[test]
fn test_bs_call_theta_analytic() {
    let analytic_theta = bs_analytic::bs_call_theta(100.0, 100.0, 0.05, 0.20, 1.0);
    let expected_theta = -6.414027546438197;

    let rel_error = ((analytic_theta - expected_theta) / expected_theta).abs();
    println!("\nAnalytic Theta: {}", analytic_theta);

    assert!(rel_error < 1e-7, "Relative error for Theta exceeds tolerance: {}", rel_error);
}

#[test]
fn test_mc_vega_and_rho_pathwise_vs_analytic() {
    let s0 = 100.0;
    let k = 100.0;
    let r = 0.05;
    let sigma = 0.20;
    let t = 1.0;

    let cfg = McGreeksConfig {
        paths: 500_000,
        market: MarketParameters::new(s0, k, t, r, sigma),
        option: OptionSpec::call(k),
        greeks: GreeksConfig::VEGA | GreeksConfig::RHO,
        ..Default::default()
    };

    let greeks = mc_greeks(&cfg, &mut RngFactory::new(7)).expect("Valid configuration");
    let mc_vega = greeks.vega.expect("vega requested").value;
    let mc_rho = greeks.rho.expect("rho requested").value;
    let analytic_vega = bs_analytic::bs_call_vega(s0, k, r, sigma, t);
    let analytic_rho = bs_analytic::bs_call_rho(s0, k, r, sigma, t);

    let vega_error = (mc_vega - analytic_vega).abs() / analytic_vega;
    let rho_error = (mc_rho - analytic_rho).abs() / analytic_rho;

    println!("\nMC Vega (Pathwise): {}  Analytic: {}", mc_vega, analytic_vega);
    println!("MC Rho (Pathwise): {}  Analytic: {}", mc_rho, analytic_rho);

    assert!(greeks.delta.is_none());
    assert!(vega_error < 0.01, "Relative error for Vega exceeds 1%: {}", vega_error);
    assert!(rho_error < 0.01, "Relative error for Rho exceeds 1%: {}", rho_error);
}

#[test]
fn test_mc_put_greeks_vs_analytic() {
    let market = MarketParameters::default();
    let cfg = McGreeksConfig {
        paths: 500_000,
        market,
        option: OptionSpec::put(100.0),
        greeks: GreeksConfig::DELTA | GreeksConfig::VEGA | GreeksConfig::RHO,
        ..Default::default()
    };

    let greeks = mc_greeks(&cfg, &mut RngFactory::new(99)).expect("Valid configuration");
    let analytic = bs_analytic::bs_greeks(OptionKind::Put, 100.0, 100.0, 0.05, 0.2, 1.0);

    let delta = greeks.delta.unwrap();
    let vega = greeks.vega.unwrap();
    let rho = greeks.rho.unwrap();
    println!("\nPut delta {} ± {} (analytic {})", delta.value, delta.std_error, analytic.delta);
    println!("Put vega {} ± {} (analytic {})", vega.value, vega.std_error, analytic.vega);
    println!("Put rho {} ± {} (analytic {})", rho.value, rho.std_error, analytic.rho);

    assert!((greeks.price.value - analytic.price).abs() < 4.0 * greeks.price.std_error);
    assert!((delta.value - analytic.delta).abs() < 4.0 * delta.std_error);
    assert!((vega.value - analytic.vega).abs() < 4.0 * vega.std_error);
    assert!((rho.value - analytic.rho).abs() < 4.0 * rho.std_error);
}

#[test]
fn test_mc_gamma_finite_diff_vs_analytic() {
    let s0 = 100.0;
    let k = 100.0;
    let r = 0.05;
    let sigma = 0.20;
    let t = 1.0;

    let cfg = McGreeksConfig {
        paths: 2_000_000,
        market: MarketParameters::new(s0, k, t, r, sigma),
        option: OptionSpec::call(k),
        greeks: GreeksConfig::GAMMA,
        use_antithetic: true,
        epsilon: Some(0.5),
    };

    let greeks = mc_greeks(&cfg, &mut RngFactory::new(42)).expect("Valid configuration");
    let gamma = greeks.gamma.expect("gamma requested");
    let analytic_gamma = bs_analytic::bs_call_gamma(s0, k, r, sigma, t);
    let rel_error = (gamma.value - analytic_gamma).abs() / analytic_gamma;

    println!("\nMC Gamma (Finite Diff): {} ± {}", gamma.value, gamma.std_error);
    println!("Analytic Gamma: {}", analytic_gamma);
    println!("Relative Error (Gamma): {}", rel_error);

    assert!(rel_error < 0.05, "Relative error for Gamma exceeds 5%: {}", rel_error);
}

#[test]
fn test_portfolio_greeks_match_sum_of_positions() {
    let market = MarketParameters::default();
    let positions = [
        OptionPosition::new(OptionSpec::call(95.0), 2.0),
        OptionPosition::new(OptionSpec::put(105.0), -1.0),
        OptionPosition::new(OptionSpec::call(110.0), 1.5).with_maturity(0.5),
    ];

    let total = portfolio_greeks(&positions, &market).expect("Valid positions");

    let a = bs_analytic::bs_greeks(OptionKind::Call, 100.0, 95.0, 0.05, 0.2, 1.0);
    let b = bs_analytic::bs_greeks(OptionKind::Put, 100.0, 105.0, 0.05, 0.2, 1.0);
    let c = bs_analytic::bs_greeks(OptionKind::Call, 100.0, 110.0, 0.05, 0.2, 0.5);

    let expected_vega = 2.0 * a.vega - b.vega + 1.5 * c.vega;
    let expected_theta = 2.0 * a.theta - b.theta + 1.5 * c.theta;
    let expected_rho = 2.0 * a.rho - b.rho + 1.5 * c.rho;

    assert!((total.vega - expected_vega).abs() < 1e-10);
    assert!((total.theta - expected_theta).abs() < 1e-10);
    assert!((total.rho - expected_rho).abs() < 1e-10);
}

#[test]
#[ignore]
fn test_gamma_epsilon_sweep() {
    let s0 = 100.0;
    let analytic_gamma = bs_analytic::bs_call_gamma(s0, 100.0, 0.05, 0.2, 1.0);

    println!("\n=== Gamma Epsilon Sweep Results ===");
    println!("Analytic Gamma: {:.6}", analytic_gamma);
    println!("\nEpsilon\t\tMC Gamma\tStd Error\tRel Error %");
    println!("{}", "-".repeat(60));

    for eps in [0.0005 * s0, 0.001 * s0, 0.002 * s0, 0.005 * s0, 0.01 * s0] {
        let cfg = McGreeksConfig {
            paths: 1_000_000,
            greeks: GreeksConfig::GAMMA,
            epsilon: Some(eps),
            ..Default::default()
        };
        let gamma = mc_greeks(&cfg, &mut RngFactory::new(42)).unwrap().gamma.unwrap();
        let rel_error = (gamma.value - analytic_gamma).abs() / analytic_gamma;

        println!(
            "{:.4}\t\t{:.6}\t{:.6}\t{:.4}",
            eps,
            gamma.value,
            gamma.std_error,
            rel_error * 100.0
        );
    }
}
