// tests/sampling_test.rs
use fast_mc::mc::importance::{
    tail_probability_importance, tail_probability_naive, ImportanceSamplingSpec,
};
use fast_mc::mc::quasi::{estimate_pi_monte_carlo, estimate_pi_quasi_random, estimate_pi_stratified};
use fast_mc::mc::stats::DrawProvenance;
use fast_mc::rng::RngFactory;
use fast_mc::sobol::SobolSequence;
use std::f64::consts::PI;

#[test]
fn test_sobol_pi_calibration() {
    let mut seq = SobolSequence::new(2).expect("Valid dimension");
    let result = estimate_pi_quasi_random(&mut seq, 10_000).expect("Valid sample count");

    println!("\nSobol Pi (10,000 points): {}", result.estimate);
    assert!((result.estimate - PI).abs() < 0.01, "Sobol Pi {} off by more than 0.01", result.estimate);
    assert_eq!(
        result.provenance,
        DrawProvenance::Sobol {
            first_index: 0,
            points: 10_000
        }
    );
}

#[test]
fn test_sobol_beats_pseudo_random_pi() {
    let mut seq = SobolSequence::new(2).unwrap();
    let sobol = estimate_pi_quasi_random(&mut seq, 16_384).unwrap();
    let pseudo = estimate_pi_monte_carlo(&mut RngFactory::new(5), 16_384).unwrap();
    let stratified = estimate_pi_stratified(&mut RngFactory::new(5), 128).unwrap();

    println!("\nSobol: {}  Pseudo: {} ± {}  Stratified: {}",
        sobol.estimate, pseudo.estimate, pseudo.std_error.unwrap(), stratified.estimate);

    // Pseudo-random error is of order 0.013 at this size
    assert!((sobol.estimate - PI).abs() < 0.008);
    assert!((stratified.estimate - PI).abs() < 0.01);
    assert!((pseudo.estimate - PI).abs() < 4.0 * pseudo.std_error.unwrap());
}

#[test]
fn test_sobol_sequence_is_reproducible_and_never_reused() {
    let mut a = SobolSequence::new(5).unwrap();
    let mut b = SobolSequence::new(5).unwrap();
    let first = a.points(100).unwrap();
    assert_eq!(first, b.points(100).unwrap());

    let second = a.points(100).unwrap();
    assert_eq!(a.position(), 200);
    assert_ne!(first, second);

    let mut skipped = SobolSequence::new(5).unwrap();
    skipped.skip(100).unwrap();
    assert_eq!(skipped.points(100).unwrap(), second);
}

#[test]
fn test_importance_sampling_vs_naive() {
    let spec = ImportanceSamplingSpec::shifted_to_threshold(0.0, 1.0, 3.0);
    let exact = spec.exact();
    let mut factory = RngFactory::new(31);

    let is = tail_probability_importance(&spec, 50_000, &mut factory).expect("Valid spec");
    let naive = tail_probability_naive(&spec, 50_000, &mut factory).expect("Valid spec");

    let se_is = is.std_error.unwrap();
    let se_naive = naive.std_error.unwrap();
    println!("\nExact: {}", exact);
    println!("Importance sampling: {} ± {}", is.estimate, se_is);
    println!("Naive: {} ± {}", naive.estimate, se_naive);

    assert!((is.estimate - exact).abs() < 4.0 * se_is);
    assert!(se_is * 5.0 < se_naive, "importance sampling SE {} vs naive {}", se_is, se_naive);
}

#[test]
fn test_importance_sampling_variance_over_repeated_trials() {
    let spec = ImportanceSamplingSpec::shifted_to_threshold(0.0, 1.0, 3.0);
    let exact = spec.exact();
    let mut factory = RngFactory::new(2718);
    let trials = 30;

    let mut is_sq = 0.0;
    let mut naive_sq = 0.0;
    for _ in 0..trials {
        let is = tail_probability_importance(&spec, 10_000, &mut factory).unwrap();
        let naive = tail_probability_naive(&spec, 10_000, &mut factory).unwrap();
        is_sq += (is.estimate - exact).powi(2);
        naive_sq += (naive.estimate - exact).powi(2);
    }
    let is_rmse = (is_sq / trials as f64).sqrt();
    let naive_rmse = (naive_sq / trials as f64).sqrt();

    println!("\nRMSE importance: {}  RMSE naive: {}", is_rmse, naive_rmse);
    assert!(is_rmse < naive_rmse / 3.0);
}

#[test]
fn test_seeded_estimates_replay() {
    let spec = ImportanceSamplingSpec::shifted_to_threshold(0.0, 1.0, 2.5);
    let a = tail_probability_importance(&spec, 20_000, &mut RngFactory::new(4)).unwrap();
    let b = tail_probability_importance(&spec, 20_000, &mut RngFactory::new(4)).unwrap();
    assert_eq!(a, b);
}
