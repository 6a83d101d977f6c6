// demos/error_handling_demo.rs
use fast_mc::analytics::{binomial_price, ExerciseStyle};
use fast_mc::error::McError;
use fast_mc::market::{MarketParameters, OptionKind, OptionSpec};
use fast_mc::mc::greeks::{mc_greeks, GreeksConfig, McGreeksConfig};
use fast_mc::mc::importance::{tail_probability_importance, ImportanceSamplingSpec};
use fast_mc::mc::{DrawSource, Estimator, McConfig};
use fast_mc::models::{Heston, HestonParams};
use fast_mc::rng::RngFactory;
use tracing_subscriber::EnvFilter;

fn main() {
    // The Feller warning in test 3 is emitted through tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("Error Handling Demo for fast-mc");
    println!("===============================\n");

    // Test 1: Invalid market
    println!("1. Testing negative maturity...");
    let bad_market = MarketParameters::new(100.0, 100.0, -1.0, 0.05, 0.2);
    let cfg = McConfig::european(bad_market, OptionSpec::call(100.0), 10_000);
    match Estimator::Crude.estimate(&cfg, &mut DrawSource::seeded(42)) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 2: Invalid correlation
    println!("\n2. Testing invalid Heston correlation...");
    let invalid_rho_params = HestonParams {
        rho: 1.5,
        ..Default::default()
    };
    match Heston::new(0.05, invalid_rho_params) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 3: Extreme parameters that should warn but not fail
    println!("\n3. Testing extreme but valid parameters...");
    let extreme_params = HestonParams {
        kappa: 1.0,
        xi: 0.8,
        rho: -0.5,
        ..Default::default()
    };
    match Heston::new(0.05, extreme_params) {
        Ok(_) => println!("   ✓ Created with warning (Feller condition violated)"),
        Err(e) => println!("   Error: {}", e),
    }

    // Test 4: Odd path count for antithetic sampling
    println!("\n4. Testing odd path count for antithetic variates...");
    let odd_cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 10_001);
    match Estimator::Antithetic.estimate(&odd_cfg, &mut DrawSource::seeded(42)) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 5: Pseudo-random estimator given a Sobol source
    println!("\n5. Testing mismatched draw source...");
    let valid_cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 10_000);
    let mut sobol = DrawSource::sobol_for(&valid_cfg).expect("Valid dimension");
    match Estimator::Crude.estimate(&valid_cfg, &mut sobol) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 6: Invalid epsilon
    println!("\n6. Testing invalid epsilon for finite differences...");
    let invalid_epsilon_config = McGreeksConfig {
        paths: 10_000,
        greeks: GreeksConfig::GAMMA,
        epsilon: Some(50.0),
        ..Default::default()
    };
    match mc_greeks(&invalid_epsilon_config, &mut RngFactory::new(42)) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 7: Degenerate importance sampling proposal
    println!("\n7. Testing a proposal with no mass where the target has some...");
    let spec = ImportanceSamplingSpec {
        mu: 0.0,
        sigma: 10.0,
        proposal_mu: 50.0,
        proposal_sigma: 0.1,
        alpha: 3.0,
    };
    match spec.weight(-20.0) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(McError::DegenerateProposal { x, original_density }) => {
            println!("   ✓ Caught DegenerateProposal at x = {} (f = {:e})", x, original_density)
        }
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    // Test 8: Valid configuration should work
    println!("\n8. Testing valid configuration...");
    match Estimator::Antithetic.estimate(&valid_cfg, &mut DrawSource::seeded(42)) {
        Ok(result) => println!(
            "   ✓ Success: Price = {:.4}, Std Error = {:.6}",
            result.estimate,
            result.std_error.unwrap_or(0.0)
        ),
        Err(e) => println!("   Unexpected error: {}", e),
    }
    let tail = ImportanceSamplingSpec::shifted_to_threshold(0.0, 1.0, 3.0);
    match tail_probability_importance(&tail, 10_000, &mut RngFactory::new(1)) {
        Ok(result) => println!("   ✓ Success: P(X < -3) = {:.6}", result.estimate),
        Err(e) => println!("   Unexpected error: {}", e),
    }

    // Test 9: Error type matching
    println!("\n9. Testing error type matching...");
    match binomial_price(&MarketParameters::default().with_spot(-5.0), OptionKind::Put, 100, ExerciseStyle::American) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(McError::InvalidParameter {
            parameter,
            value,
            constraint,
        }) => {
            println!("   ✓ Caught InvalidParameter: {} = {} ({})", parameter, value, constraint);
        }
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    println!("\n✓ Error handling demo complete!");
    println!("All error cases were properly caught and handled.");
}
