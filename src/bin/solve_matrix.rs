//! Matrix game solver binary.
//!
//! Usage:
//!   cargo run --release --bin solve_matrix -- [OPTIONS]
//!
//! Examples:
//!   solve_matrix --preset reference --eps 0.01
//!   solve_matrix --matrix game.json --seed 7 --output solution.json
//!   RUST_LOG=debug solve_matrix --preset dominated --trace

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use brown_robinson::games::Preset;
use brown_robinson::solver::{GameConfig, GameOutcome, GameSolver, PayoffMatrix};

#[derive(Parser, Debug)]
#[command(author, version, about = "Solve a zero-sum matrix game by fictitious play", long_about = None)]
struct Args {
    /// Payoff matrix as a JSON array of rows
    #[arg(short, long, conflicts_with = "preset")]
    matrix: Option<PathBuf>,

    /// Built-in game: reference, two-by-two, matching-pennies, rock-paper-scissors, dominated
    #[arg(short, long, default_value = "reference")]
    preset: Preset,

    /// Configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop once the bound gap is at most this
    #[arg(short, long)]
    eps: Option<f64>,

    /// Iteration cap
    #[arg(long, conflicts_with = "unbounded")]
    max_iterations: Option<u64>,

    /// Run without an iteration cap
    #[arg(long)]
    unbounded: bool,

    /// Random seed for tie-breaking
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the per-iteration trace
    #[arg(short, long)]
    trace: bool,

    /// Write the outcome as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
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
    println!("  Brown-Robinson Matrix Game Solver");
    println!("=================================================");
    println!();

    let mut config = match &args.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            GameConfig::from_json_file(path)?
        }
        None => GameConfig::default(),
    };
    if let Some(eps) = args.eps {
        config.solver = config.solver.with_eps(eps);
    }
    if let Some(cap) = args.max_iterations {
        config.solver = config.solver.with_max_iterations(cap);
    }
    if args.unbounded {
        config.solver = config.solver.unbounded();
    }
    if let Some(seed) = args.seed {
        config.solver = config.solver.with_seed(seed);
    }
    let record_trace = config.solver.record_trace || args.trace;
    config.solver = config.solver.with_trace(record_trace);
    config.validate()?;

    let (name, matrix) = match &args.matrix {
        Some(path) => (path.display().to_string(), load_matrix(path)?),
        None => (args.preset.to_string(), args.preset.matrix::<f64>()?),
    };

    println!("Game: {} ({}x{})", name, matrix.rows(), matrix.cols());
    print!("{}", matrix);
    println!();
    println!("Eps threshold: {}", config.solver.eps_threshold);
    match config.solver.max_iterations {
        Some(cap) => println!("Max iterations: {}", cap),
        None => println!("Max iterations: unlimited"),
    }
    if let Some(seed) = config.solver.seed {
        println!("Seed: {}", seed);
    }
    println!();

    let mut solver = GameSolver::new(&config)?;
    let spinner = spinner();
    let outcome = solver.solve_matrix_with_callback(&matrix, 1000, |progress| {
        spinner.set_message(format!(
            "k = {:>8} | {:.6} <= v <= {:.6} | gap {:.2e}",
            progress.iteration, progress.v_lower, progress.v_upper, progress.eps
        ));
    });
    spinner.finish_and_clear();
    let outcome = outcome?;

    print_outcome(&outcome);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&outcome)?;
        fs::write(path, json)?;
        println!("Results saved to {}", path.display());
    }

    Ok(())
}

fn load_matrix(path: &Path) -> Result<PayoffMatrix<f64>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_outcome(outcome: &GameOutcome<f64>) {
    match outcome {
        GameOutcome::Saddle(point) => {
            println!("Saddle point found:");
            println!("  row = {}, col = {}, value = {}", point.row, point.col, point.value);
        }
        GameOutcome::Mixed(solution) => {
            if let Some(trace) = &solution.trace {
                println!(
                    "{:>6} {:>4} {:>4} {:>30} {:>30} {:>10} {:>10} {:>10}",
                    "k", "A", "B", "x", "y", "v_upper", "v_lower", "eps"
                );
                for step in trace {
                    println!(
                        "{:>6} {:>4} {:>4} {:>30} {:>30} {:>10.4} {:>10.4} {:>10.4}",
                        step.iteration,
                        step.row_choice,
                        step.col_choice,
                        format_vec(&step.x, 1),
                        format_vec(&step.y, 1),
                        step.v_upper,
                        step.v_lower,
                        step.eps
                    );
                }
                println!();
            }

            println!("No saddle point, solved with Brown-Robinson:");
            if solution.is_converged() {
                println!("  Converged after {} iterations", solution.iterations);
            } else {
                println!(
                    "  Stopped after {} iterations ({:?})",
                    solution.iterations, solution.status
                );
            }
            println!("  x* = {}", format_vec(&solution.row_strategy, 4));
            println!("  y* = {}", format_vec(&solution.column_strategy, 4));
            println!(
                "  {:.6} <= v <= {:.6} (gap {:.2e})",
                solution.v_lower,
                solution.v_upper,
                solution.gap()
            );
            println!("  v ~ {:.6}", solution.value_estimate());
            println!("  Time: {:.3}s", solution.elapsed_seconds);
        }
    }
}

fn format_vec(values: &[f64], precision: usize) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("{:.*}", precision, v)).collect();
    format!("[{}]", cells.join(", "))
}
