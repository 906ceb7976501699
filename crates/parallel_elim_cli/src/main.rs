//! Parallel Elim CLI
//!
//! Populates a dense linear system, reduces it to row-echelon form with the
//! staged parallel scheduler and prints the result.
//!
//! # Usage
//! ```bash
//! # Fixed-size run (5×3, pseudo-random integers)
//! parallel-elim
//!
//! # Larger diagonally dominant system on 4 worker threads, per-stage dump
//! parallel-elim run --rows 8 --cols 8 --dataset dominant --threads 4 --trace
//!
//! # Worked 3×3 example
//! parallel-elim example
//! ```
//!
//! Set `RUST_LOG=parallel_elim_core=debug` to log every barrier.

mod trace;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use parallel_elim_core::{
    Dataset, MatrixStore, NoopObserver, Result, RunConfig, SchedulerConfig, StageScheduler,
    DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_SEED,
};
use tracing_subscriber::EnvFilter;

use crate::trace::StageTrace;

#[derive(Parser)]
#[command(name = "parallel-elim")]
#[command(about = "Task-parallel forward elimination of dense linear systems")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a system and eliminate it
    Run {
        /// Number of equations (matrix rows)
        #[arg(long, default_value_t = DEFAULT_ROWS)]
        rows: usize,

        /// Number of unknowns (matrix columns)
        #[arg(long, default_value_t = DEFAULT_COLS)]
        cols: usize,

        /// Seed for the value generators
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// How to populate the system
        #[arg(long, value_enum, default_value = "uniform")]
        dataset: DatasetChoice,

        /// Size of a dedicated worker pool (default: global pool)
        #[arg(long)]
        threads: Option<usize>,

        /// Minimum active rows before a phase runs on the pool
        #[arg(long, default_value = "1")]
        parallel_threshold: usize,

        /// Print the system after every stage
        #[arg(long)]
        trace: bool,
    },

    /// Eliminate the worked 3×3 example
    Example {
        /// Print the system after every stage
        #[arg(long)]
        trace: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DatasetChoice {
    /// Pseudo-random integers in [0, 100)
    Uniform,
    /// Diagonally dominant (nonzero pivots guaranteed)
    Dominant,
    /// The worked 3×3 example
    Example,
}

impl From<DatasetChoice> for Dataset {
    fn from(choice: DatasetChoice) -> Self {
        match choice {
            DatasetChoice::Uniform => Dataset::Uniform,
            DatasetChoice::Dominant => Dataset::DiagonallyDominant,
            DatasetChoice::Example => Dataset::Example,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (config, trace) = match cli.command {
        None => (RunConfig::default(), false),
        Some(Commands::Run {
            rows,
            cols,
            seed,
            dataset,
            threads,
            parallel_threshold,
            trace,
        }) => (
            RunConfig {
                rows,
                cols,
                seed,
                dataset: dataset.into(),
                scheduler: SchedulerConfig {
                    parallel_threshold,
                    num_threads: threads,
                },
            },
            trace,
        ),
        Some(Commands::Example { trace }) => (
            RunConfig {
                dataset: Dataset::Example,
                ..RunConfig::default()
            },
            trace,
        ),
    };

    match run_elimination(&config, trace) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_elimination(config: &RunConfig, trace: bool) -> Result<()> {
    let store: MatrixStore<f64> = config.build_system()?;
    let (rows, cols) = store.dims();

    println!("\n Loaded system [A | b] ({}×{}):", rows, cols);
    print!("{}", store);

    let scheduler = StageScheduler::with_config(store, config.scheduler.clone());
    let result = if trace {
        scheduler.run_observed(&mut StageTrace)?
    } else {
        scheduler.run_observed(&mut NoopObserver)?
    };

    println!("\n Row-echelon form:");
    print!("{}", result.store);

    let t = &result.report.timings;
    println!();
    println!("  Stages:            {}", t.num_stages);
    println!("  Multiplier phases: {:.3} ms", t.multiplier_time * 1000.0);
    println!("  Reduction phases:  {:.3} ms", t.reduction_time * 1000.0);
    println!("  Total:             {:.3} ms", t.total_time * 1000.0);
    println!(
        "  Max |A[i][j]| below pivots: {:.3e}",
        result.store.matrix().max_below_pivots()
    );
    println!("\n Done!");

    Ok(())
}
