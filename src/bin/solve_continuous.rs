//! Continuous game solver binary.
//!
//! Samples `h(x, y) = a·x² + b·y² + c·x·y + d·x + e·y` on finer and finer
//! grids of the unit square until the game value stabilizes.
//!
//! Usage:
//!   cargo run --release --bin solve_continuous -- [OPTIONS]
//!
//! Examples:
//!   solve_continuous
//!   solve_continuous --a -3 --b 1.5 --c 3.6 --d -0.36 --e -2.88 --print-levels 3
//!   solve_continuous --window 5 --deviation 0.01 --seed 42

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use brown_robinson::games::{BilinearKernel, DiscretizationSweep};
use brown_robinson::solver::{GameConfig, PayoffMatrix};

#[derive(Parser, Debug)]
#[command(author, version, about = "Solve a continuous game on the unit square by grid refinement", long_about = None)]
struct Args {
    /// Coefficient of x²
    #[arg(long, default_value_t = -5.0, allow_negative_numbers = true)]
    a: f64,

    /// Coefficient of y²
    #[arg(long, default_value_t = 10.0 / 3.0, allow_negative_numbers = true)]
    b: f64,

    /// Coefficient of x·y
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    c: f64,

    /// Coefficient of x
    #[arg(long, default_value_t = -2.0, allow_negative_numbers = true)]
    d: f64,

    /// Coefficient of y
    #[arg(long, default_value_t = -8.0, allow_negative_numbers = true)]
    e: f64,

    /// Print the payoff grid of the first N levels
    #[arg(long, default_value_t = 0)]
    print_levels: usize,

    /// Number of most recent level values that must agree
    #[arg(short, long)]
    window: Option<usize>,

    /// Standard deviation below which the window counts as stable
    #[arg(long)]
    deviation: Option<f64>,

    /// Give up after this many levels
    #[arg(long)]
    max_levels: Option<usize>,

    /// Configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for tie-breaking
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    println!("=================================================");
    println!("  Continuous Game Solver (grid refinement)");
    println!("=================================================");
    println!();

    let mut config = match &args.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            GameConfig::from_json_file(path)?
        }
        None => GameConfig::default(),
    };
    if let Some(window) = args.window {
        config.stability.window = window;
    }
    if let Some(deviation) = args.deviation {
        config.stability.deviation_threshold = deviation;
    }
    if let Some(max_levels) = args.max_levels {
        config.stability = config.stability.with_max_levels(max_levels);
    }
    if let Some(seed) = args.seed {
        config.solver = config.solver.with_seed(seed);
    }
    config.validate()?;

    let kernel = BilinearKernel::<f64>::from_f64(args.a, args.b, args.c, args.d, args.e)?;
    println!(
        "h(x, y) = {}x² + {:.4}y² + {}xy + {}x + {}y",
        kernel.a, kernel.b, kernel.c, kernel.d, kernel.e
    );
    println!(
        "Window: {}, deviation threshold: {}, max levels: {}",
        config.stability.window, config.stability.deviation_threshold, config.stability.max_levels
    );
    println!();

    match kernel.equilibrium() {
        Ok(eq) => println!(
            "Analytic equilibrium: x = {:.4}, y = {:.4}, H = {:.4}",
            eq.x, eq.y, eq.value
        ),
        Err(e) => println!("No analytic equilibrium: {}", e),
    }
    println!();

    let first = config.stability.start_level;
    for n in (first..).take(args.print_levels) {
        println!("N = {}", n);
        print_grid(&kernel.discretize(n)?);
        println!();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut sweep = DiscretizationSweep::new(&config)?;
    let report = sweep.run_with_callback(&kernel, |level| {
        spinner.set_message(format!("N = {:>4} | H = {:.4}", level.n, level.value));
    });
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "{:>5} {:>8} {:>8} {:>10} {:>10}",
        "N", "x", "y", "H", "method"
    );
    for level in &report.levels {
        let method = match level.iterations {
            Some(k) => format!("BR ({})", k),
            None => "saddle".to_string(),
        };
        println!(
            "{:>5} {:>8.4} {:>8.4} {:>10.4} {:>10}",
            level.n, level.x, level.y, level.value, method
        );
    }
    println!();

    println!(
        "Stabilized at N = {} (deviation {:.2e})",
        report.converged_level, report.deviation
    );
    println!(
        "x = {:.4}, y = {:.4}, H = {:.4}",
        report.x, report.y, report.value
    );

    Ok(())
}

fn print_grid(matrix: &PayoffMatrix<f64>) {
    for row in matrix.row_slices() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>8.3}", v)).collect();
        println!("{}", cells.join(""));
    }
}
