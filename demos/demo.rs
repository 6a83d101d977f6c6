// demos/demo.rs
use fast_mc::analytics::{
    binomial_price, bjerksund_stensland, bs_analytic, merton_jump_price, trinomial_price,
    ExerciseStyle,
};
use fast_mc::hedging::{simulate_delta_hedge, vega_profile, DeltaHedgeConfig, GammaInstrument};
use fast_mc::market::{MarketParameters, OptionKind, OptionSpec};
use fast_mc::math_utils::Timer;
use fast_mc::mc::greeks::{mc_greeks, GreeksConfig, McGreeksConfig};
use fast_mc::mc::path_generator::generate_paths;
use fast_mc::mc::quasi::estimate_pi_quasi_random;
use fast_mc::mc::{
    ControlVariateSpec, CvCoefficient, DrawSource, Estimator, EstimatorResult, McConfig, Payoff,
};
use fast_mc::models::{Dynamics, HestonParams, MertonParams};
use fast_mc::output;
use fast_mc::rng::RngFactory;
use fast_mc::sobol::SobolSequence;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 && args[1] == "--bench" && args[2] == "canonical" {
        run_canonical_benchmark();
    } else {
        run_demo_mode();
    }
}

fn run_canonical_benchmark() {
    let paths = 1_000_000;
    let market = MarketParameters::new(100.0, 100.0, 1.0, 0.01, 0.2);
    let cfg = McConfig::european(market, OptionSpec::call(100.0), paths);

    let mut timer = Timer::new();
    timer.start();
    let result = Estimator::Antithetic
        .estimate(&cfg, &mut DrawSource::seeded(42))
        .expect("Valid configuration");
    let elapsed = timer.elapsed_ms() / 1000.0;
    let paths_per_sec = paths as f64 / elapsed;

    std::fs::create_dir_all("bench").expect("Could not create bench directory");
    let summary = vec![
        ("paths", paths.to_string()),
        ("price", format!("{:.8}", result.estimate)),
        ("stderr", format!("{:.6}", result.std_error.unwrap_or(0.0))),
        ("paths_per_sec", format!("{:.6}", paths_per_sec)),
    ];
    let filename = "bench/rust_canonical.csv";
    output::write_summary_to_csv(filename, &summary).expect("Could not write benchmark");
    println!("Rust benchmark results written to {}", filename);
}

fn print_result(name: &str, result: &EstimatorResult, reference: f64, elapsed_ms: f64) {
    match result.std_error {
        Some(se) => println!(
            "{:<28} {:>10.5} ± {:<8.5} error {:>8.5} ({:.1} ms)",
            name,
            result.estimate,
            se,
            (result.estimate - reference).abs(),
            elapsed_ms
        ),
        None => println!(
            "{:<28} {:>10.5}            error {:>8.5} ({:.1} ms)",
            name,
            result.estimate,
            (result.estimate - reference).abs(),
            elapsed_ms
        ),
    }
}

fn run_demo_mode() {
    println!("Running fast-mc Monte Carlo Demo\n");
    std::fs::create_dir_all("results").expect("Could not create results directory");

    let paths = 100_000;
    let market = MarketParameters::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let call = OptionSpec::call(100.0);
    let analytic = bs_analytic::bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);

    // --- European Call: estimator comparison ---
    println!("--- European Call: estimator comparison (BS = {:.5}) ---", analytic);
    let cfg = McConfig::european(market, call, paths);
    let cv_spec = ControlVariateSpec::black_scholes(&market, OptionSpec::call(110.0), CvCoefficient::Optimal)
        .expect("Valid control variate");
    let estimators = [
        Estimator::Crude,
        Estimator::Antithetic,
        Estimator::ControlVariate(cv_spec),
        Estimator::QuasiRandom,
    ];

    let mut pseudo = DrawSource::seeded(12345);
    let mut sobol = DrawSource::sobol_for(&cfg).expect("Valid dimension");
    let mut rows = Vec::new();
    let mut timer = Timer::new();
    for estimator in &estimators {
        let source = match estimator {
            Estimator::QuasiRandom => &mut sobol,
            _ => &mut pseudo,
        };
        timer.start();
        let result = estimator.estimate(&cfg, source).expect("Valid configuration");
        print_result(estimator.name(), &result, analytic, timer.elapsed_ms());
        rows.push((estimator.name(), result));
    }
    let estimates_csv = "results/estimators.csv";
    match output::write_estimates_to_csv(estimates_csv, analytic, &rows) {
        Ok(_) => println!("Estimator comparison written to {}\n", estimates_csv),
        Err(e) => eprintln!("Error writing estimator comparison: {}", e),
    }

    // --- Path-dependent payoffs under three dynamics ---
    println!("--- Path-dependent payoffs (252 steps) ---");
    let payoffs = [
        ("Asian call", Payoff::Asian(call)),
        (
            "Up-and-out call (H=120)",
            Payoff::UpAndOut {
                option: call,
                barrier: 120.0,
            },
        ),
    ];
    let dynamics = [
        ("GBM", Dynamics::Gbm),
        ("Heston", Dynamics::Heston(HestonParams::default())),
        ("Merton", Dynamics::Merton(MertonParams::default())),
    ];
    for (payoff_name, payoff) in &payoffs {
        for (model_name, model) in &dynamics {
            let cfg = McConfig {
                paths,
                steps: 252,
                market,
                payoff: payoff.clone(),
                dynamics: *model,
            };
            timer.start();
            let result = Estimator::Antithetic
                .estimate(&cfg, &mut pseudo)
                .expect("Valid configuration");
            let elapsed = timer.elapsed_ms();
            println!(
                "{:<24} {:<7} {:>9.5} ± {:.5}  ({:.2} paths/sec)",
                payoff_name,
                model_name,
                result.estimate,
                result.std_error.unwrap_or(0.0),
                paths as f64 / (elapsed / 1000.0)
            );
        }
    }

    // --- Reference pricers ---
    println!("\n--- Reference pricers ---");
    let european_put = bs_analytic::bs_put_price(100.0, 100.0, 0.05, 0.2, 1.0);
    let binomial = binomial_price(&market, OptionKind::Put, 500, ExerciseStyle::American)
        .expect("Valid lattice");
    let trinomial = trinomial_price(&market, OptionKind::Put, 200, ExerciseStyle::American)
        .expect("Valid lattice");
    let bjs = bjerksund_stensland(OptionKind::Put, 100.0, 100.0, 1.0, 0.05, 0.0, 0.2)
        .expect("Valid inputs");
    let merton = merton_jump_price(OptionKind::Call, &market, &MertonParams::default())
        .expect("Valid inputs");
    println!("European put (BS):              {:.5}", european_put);
    println!("American put (binomial, 500):   {:.5}", binomial);
    println!("American put (trinomial, 200):  {:.5}", trinomial);
    println!("American put (Bjerksund-Stensland): {:.5}", bjs);
    println!("European call (Merton series):  {:.5}", merton);

    // --- Greeks ---
    println!("\n--- Pathwise Greeks (European call) ---");
    let greeks_cfg = McGreeksConfig {
        paths: 1_000_000,
        market,
        option: call,
        greeks: GreeksConfig::all(),
        use_antithetic: true,
        epsilon: Some(0.5),
    };
    let mc = mc_greeks(&greeks_cfg, &mut RngFactory::new(7)).expect("Valid configuration");
    let exact = bs_analytic::bs_greeks(OptionKind::Call, 100.0, 100.0, 0.05, 0.2, 1.0);
    let pairs = [
        ("Delta", mc.delta, exact.delta),
        ("Gamma", mc.gamma, exact.gamma),
        ("Vega", mc.vega, exact.vega),
        ("Rho", mc.rho, exact.rho),
    ];
    for (name, estimate, analytic) in pairs {
        if let Some(g) = estimate {
            println!(
                "{:<6} MC {:>10.5} ± {:<8.5} analytic {:>10.5}",
                name, g.value, g.std_error, analytic
            );
        }
    }

    // --- Delta hedging ---
    println!("\n--- Delta hedge of a short call (K=105, sigma=0.1, mu=0.15) ---");
    let mut factory = RngFactory::new(1);
    for rebalances in [10, 50, 250] {
        let hedge_cfg = DeltaHedgeConfig {
            rebalances,
            ..Default::default()
        };
        let report = simulate_delta_hedge(&hedge_cfg, &mut factory).expect("Valid configuration");
        println!(
            "N={:<4} mean P&L {:>8.4}  std {:>7.4}  VaR95 {:>8.4}  ES95 {:>8.4}",
            rebalances, report.mean_pnl, report.std_pnl, report.var, report.es
        );
        if rebalances == 10 {
            let report_json = "results/hedge_report.json";
            match output::write_json_report(report_json, &report) {
                Ok(_) => println!("Hedge report written to {}", report_json),
                Err(e) => eprintln!("Error writing hedge report: {}", e),
            }
        }
    }

    let gamma_cfg = DeltaHedgeConfig {
        rebalances: 10,
        gamma_instrument: Some(GammaInstrument {
            option: OptionSpec::call(105.0),
            maturity: 2.0,
        }),
        ..Default::default()
    };
    let report = simulate_delta_hedge(&gamma_cfg, &mut factory).expect("Valid configuration");
    println!(
        "N=10 gamma-neutral mean P&L {:>8.4}  std {:>7.4}  VaR95 {:>8.4}  ES95 {:>8.4}",
        report.mean_pnl, report.std_pnl, report.var, report.es
    );

    println!("\n--- Vega profile (ATM call) ---");
    for point in vega_profile(&market, OptionKind::Call, 0.1, 0.3, 5).expect("Valid grid") {
        println!("sigma {:.2}  price {:>8.4}  vega {:>8.4}", point.sigma, point.price, point.vega);
    }

    // --- Pi calibration ---
    let mut seq = SobolSequence::new(2).expect("Valid dimension");
    let pi = estimate_pi_quasi_random(&mut seq, 10_000).expect("Valid sample count");
    println!("\nSobol Pi (10,000 points): {:.5}", pi.estimate);

    // --- CSV Output ---
    let sample_paths = {
        let model = Dynamics::Heston(HestonParams::default())
            .model(&market)
            .expect("Valid model");
        let mut rng = RngFactory::new(99).create_std_rng();
        generate_paths(model.as_ref(), &market, 252, 25, &mut rng).expect("Valid configuration")
    };
    let paths_csv_filename = "results/paths.csv";
    match output::write_paths_to_csv(paths_csv_filename, sample_paths.view()) {
        Ok(_) => println!("Path data written to {}", paths_csv_filename),
        Err(e) => eprintln!("Error writing path data: {}", e),
    }

    let summary_data = vec![
        ("metric", "value".to_string()),
        ("analytic_price_european", analytic.to_string()),
        ("american_put_binomial", binomial.to_string()),
        ("american_put_trinomial", trinomial.to_string()),
        ("american_put_bjerksund_stensland", bjs.to_string()),
        ("merton_call_series", merton.to_string()),
        ("sobol_pi", pi.estimate.to_string()),
    ];
    let summary_csv_filename = "results/summary.csv";
    match output::write_summary_to_csv(summary_csv_filename, &summary_data) {
        Ok(_) => println!("Summary data written to {}", summary_csv_filename),
        Err(e) => eprintln!("Error writing summary data: {}", e),
    }
}
