// scripts/benchmark.rs
use fast_mc::analytics::{binomial_price, bs_analytic, trinomial_price, ExerciseStyle};
use fast_mc::market::{MarketParameters, OptionKind, OptionSpec};
use fast_mc::math_utils::Timer;
use fast_mc::mc::greeks::{mc_greeks, GreeksConfig, McGreeksConfig};
use fast_mc::mc::{
    ControlVariateSpec, CvCoefficient, DrawSource, Estimator, EstimatorResult, McConfig,
};
use fast_mc::models::{Heston, HestonParams, HestonScheme};
use fast_mc::rng::{fill_normals, RngFactory};
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process::Command;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rust_version: String,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_cores: num_cpus::get(),
            rust_version: Command::new("rustc")
                .arg("--version")
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown Rust version".to_string()),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn get_cpu_model() -> String {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/cpuinfo")
                .ok()
                .and_then(|content| {
                    content
                        .lines()
                        .find(|line| line.starts_with("model name"))
                        .and_then(|line| line.split(':').nth(1))
                        .map(|s| s.trim().to_string())
                })
                .unwrap_or_else(|| "Unknown CPU".to_string())
        }

        #[cfg(target_os = "macos")]
        {
            Command::new("sysctl")
                .args(["-n", "machdep.cpu.brand_string"])
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown CPU".to_string())
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            "Unknown CPU".to_string()
        }
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    paths: usize,
    time_ms: f64,
    value: f64,
    std_error: Option<f64>,
    analytic_value: Option<f64>,
}

impl BenchmarkResult {
    fn throughput(&self) -> f64 {
        self.paths as f64 / (self.time_ms / 1000.0)
    }

    fn relative_error(&self) -> Option<f64> {
        self.analytic_value
            .map(|a| (self.value - a).abs() / a.abs())
    }

    /// Variance × time, lower is better
    fn work_normalized_variance(&self) -> Option<f64> {
        self.std_error
            .map(|se| se * se * self.paths as f64 * self.time_ms)
    }
}

fn from_estimate(name: String, result: &EstimatorResult, time_ms: f64, analytic: f64) -> BenchmarkResult {
    BenchmarkResult {
        name,
        paths: result.samples,
        time_ms,
        value: result.estimate,
        std_error: result.std_error,
        analytic_value: Some(analytic),
    }
}

fn run_estimator_benchmarks() -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let market = MarketParameters::default();
    let analytic = bs_analytic::bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
    let cv_spec = ControlVariateSpec::black_scholes(&market, OptionSpec::call(105.0), CvCoefficient::Optimal)
        .expect("Valid control variate");
    let estimators = [
        Estimator::Crude,
        Estimator::Antithetic,
        Estimator::ControlVariate(cv_spec),
        Estimator::QuasiRandom,
    ];

    for &paths in &[16_384usize, 131_072, 1_048_576] {
        println!("Running estimator benchmarks with {} paths...", paths);
        let cfg = McConfig::european(market, OptionSpec::call(100.0), paths);

        for estimator in &estimators {
            let mut source = match estimator {
                Estimator::QuasiRandom => DrawSource::sobol_for(&cfg).expect("Valid dimension"),
                _ => DrawSource::seeded(42),
            };
            let mut timer = Timer::new();
            timer.start();
            let result = estimator.estimate(&cfg, &mut source).expect("Valid configuration");
            let time_ms = timer.elapsed_ms();

            results.push(from_estimate(
                format!("{} ({}k paths)", estimator.name(), paths / 1024),
                &result,
                time_ms,
                analytic,
            ));
        }
    }

    println!("Running pathwise Greeks benchmark...");
    let cfg = McGreeksConfig {
        paths: 1_000_000,
        greeks: GreeksConfig::DELTA | GreeksConfig::GAMMA,
        epsilon: Some(0.5),
        ..Default::default()
    };
    let mut timer = Timer::new();
    timer.start();
    let greeks = mc_greeks(&cfg, &mut RngFactory::new(42)).expect("Valid configuration");
    let time_ms = timer.elapsed_ms();
    let exact = bs_analytic::bs_greeks(OptionKind::Call, 100.0, 100.0, 0.05, 0.2, 1.0);
    for (name, estimate, analytic) in [
        ("Call Delta (pathwise)", greeks.delta, exact.delta),
        ("Call Gamma (FD, CRN)", greeks.gamma, exact.gamma),
    ] {
        if let Some(g) = estimate {
            results.push(BenchmarkResult {
                name: name.to_string(),
                paths: cfg.paths,
                time_ms,
                value: g.value,
                std_error: Some(g.std_error),
                analytic_value: Some(analytic),
            });
        }
    }

    results
}

fn run_heston_benchmarks() -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let params = HestonParams {
        rho: -0.5,
        ..Default::default()
    };
    let schemes = [HestonScheme::FullTruncation, HestonScheme::Reflection];

    let paths = 100_000;
    let steps = 252;
    let (spot, strike, rate, maturity) = (100.0, 100.0, 0.05, 1.0);

    for &scheme in &schemes {
        let heston = Heston::new_with_scheme(rate, params, scheme).expect("Valid parameters");
        let scheme_name = heston.scheme_name();
        println!("Benchmarking Heston {} scheme...", scheme_name);

        let mut factory = RngFactory::new(42);
        let mut rng = factory.create_std_rng();
        let dt = maturity / steps as f64;
        let mut z = vec![0.0; 2 * steps];

        let mut timer = Timer::new();
        timer.start();
        let mut total_payoff = 0.0;
        for _ in 0..paths {
            fill_normals(&mut rng, &mut z);
            let mut s = spot;
            let mut v = params.v0;
            for pair in z.chunks_exact(2) {
                heston.step(&mut s, &mut v, dt, pair[0], pair[1]);
            }
            total_payoff += (s - strike).max(0.0);
        }
        let time_ms = timer.elapsed_ms();

        results.push(BenchmarkResult {
            name: format!("Heston {} Call (serial)", scheme_name),
            paths,
            time_ms,
            value: (-rate * maturity).exp() * total_payoff / paths as f64,
            std_error: None,
            analytic_value: None,
        });
    }

    results
}

fn run_lattice_benchmarks() -> Vec<BenchmarkResult> {
    let market = MarketParameters::default();
    let european_put = bs_analytic::bs_put_price(100.0, 100.0, 0.05, 0.2, 1.0);
    let mut results = Vec::new();

    for &steps in &[100usize, 1_000, 5_000] {
        println!("Benchmarking lattices with {} steps...", steps);
        let mut timer = Timer::new();

        timer.start();
        let binomial = binomial_price(&market, OptionKind::Put, steps, ExerciseStyle::European)
            .expect("Valid lattice");
        results.push(BenchmarkResult {
            name: format!("Binomial European Put (N={})", steps),
            paths: steps,
            time_ms: timer.elapsed_ms(),
            value: binomial,
            std_error: None,
            analytic_value: Some(european_put),
        });

        timer.start();
        let trinomial = trinomial_price(&market, OptionKind::Put, steps, ExerciseStyle::European)
            .expect("Valid lattice");
        results.push(BenchmarkResult {
            name: format!("Trinomial European Put (N={})", steps),
            paths: steps,
            time_ms: timer.elapsed_ms(),
            value: trinomial,
            std_error: None,
            analytic_value: Some(european_put),
        });
    }

    results
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn write_results_to_csv(results: &[BenchmarkResult], system_info: &SystemInfo, filename: &str) -> io::Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# Rust Version: {}", system_info.rust_version)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;
    writeln!(
        file,
        "Benchmark,Paths,Time_ms,Throughput_per_sec,Value,Std_Error,Analytic_Value,Relative_Error,Work_Normalized_Variance"
    )?;

    for result in results {
        writeln!(
            file,
            "{},{},{:.2},{:.0},{:.6},{},{},{},{}",
            result.name,
            result.paths,
            result.time_ms,
            result.throughput(),
            result.value,
            format_optional(result.std_error, 6),
            format_optional(result.analytic_value, 6),
            format_optional(result.relative_error(), 6),
            format_optional(result.work_normalized_variance(), 4),
        )?;
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("fast-mc Benchmark Suite");
    println!("=======================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let mut all_results = run_estimator_benchmarks();
    println!();
    all_results.extend(run_heston_benchmarks());
    println!();
    all_results.extend(run_lattice_benchmarks());

    println!("\n{:=<100}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<100}", "");
    println!(
        "{:<40} {:>9} {:>10} {:>14} {:>10} {:>10} {:>10}",
        "Benchmark", "Paths", "Time (ms)", "Throughput", "Value", "Std Err", "Rel Error"
    );
    println!("{:-<100}", "");
    for result in &all_results {
        println!(
            "{:<40} {:>9} {:>10.2} {:>14.0} {:>10.5} {:>10} {:>10}",
            result.name,
            result.paths,
            result.time_ms,
            result.throughput(),
            result.value,
            format_optional(result.std_error, 5),
            result
                .relative_error()
                .map(|e| format!("{:.3}%", e * 100.0))
                .unwrap_or_else(|| "N/A".to_string())
        );
    }
    println!("{:=<100}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    match write_results_to_csv(&all_results, &system_info, &filename) {
        Ok(()) => println!("\nResults saved to: {}", filename),
        Err(e) => eprintln!("\nCould not write {}: {}", filename, e),
    }

    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Set RUSTFLAGS: {}", system_info.rustc_flags);
    println!("3. Run: cargo run --bin benchmark --release");
    println!("4. Ensure {} CPU threads available", system_info.rayon_threads);
}
