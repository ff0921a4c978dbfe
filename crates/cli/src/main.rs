//! Branch predictor leakage benchmark CLI.
//!
//! This binary runs one named experiment against all seven predictor schemes:
//! 1. **Configure:** Built-in defaults, optionally overridden by a JSON file and a seed.
//! 2. **Run:** Build the bench, run the experiment, and stream statistic rows to stderr.
//! 3. **Report:** Status lines go to stdout; failures exit with a non-zero code.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use bpgauge_core::Bench;
use bpgauge_core::config::Config;
use bpgauge_core::sim::Experiment;

#[derive(Parser, Debug)]
#[command(
    name = "bpgauge",
    author,
    version,
    about = "Branch predictor security simulator",
    long_about = "Measure how many predictor accesses side-channel attacks need against \
randomized branch predictors.\n\nStatistic rows are written to stderr, one per sweep step, \
seven columns per attack (BaseBPU BSUP XorBP NoisyXorBP LSBP STBPU HyBP).\n\nExamples:\n  \
bpgauge reuse-access 0 10\n  bpgauge prune-btb-prune 4000 5\n  \
bpgauge leakage-pht 16 100 --seed 42"
)]
struct Cli {
    /// Experiment to run.
    experiment: String,

    /// Largest prune-set size, or secret count for leakage experiments.
    max_size: u64,

    /// Repetitions per sweep step.
    max_repeats: u64,

    /// JSON configuration overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for every generator; runs are reproducible when set.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stdout)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            usage();
            process::exit(1);
        }
    };

    let Ok(experiment) = cli.experiment.parse::<Experiment>() else {
        eprintln!("Error: unknown experiment `{}`", cli.experiment);
        usage();
        process::exit(1);
    };

    let mut config = match cli.config.as_deref() {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(seed) = cli.seed {
        config.predictor.seed = Some(seed);
        config.attack.seed = Some(seed.wrapping_add(1));
    }
    debug!(?config, "effective configuration");

    println!("[*] Experiment: {experiment} ({} = {})", experiment.size_meaning(), cli.max_size);
    println!(
        "    PHT {}x{}-bit  BTB {}x{} ({:?})  address space {} bits",
        config.predictor.pht.counter_nums,
        config.predictor.pht.counter_bits,
        config.predictor.btb.sets,
        config.predictor.btb.ways,
        config.predictor.btb.policy,
        config.predictor.addr_space
    );

    let mut bench = match Bench::new(&config) {
        Ok(bench) => bench,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let stderr = io::stderr();
    let mut rows = stderr.lock();
    if let Err(e) = bench.run(experiment, cli.max_size, cli.max_repeats, &mut rows) {
        error!(%experiment, "experiment aborted");
        eprintln!("\n[!] Experiment failed: {e}");
        process::exit(1);
    }
    println!("[*] Done");
}

/// Prints the usage text and the list of experiments.
fn usage() {
    println!(
        "Usage: bpgauge <experiment> <max_branches|max_pruning_size> <max_repeats> \
[--config <file.json>] [--seed <N>]"
    );
    println!();
    println!("Experiments:");
    for experiment in Experiment::ALL {
        println!("  {:<26} size = {}", experiment.name(), experiment.size_meaning());
    }
    println!();
    println!("  bpgauge --help  for full options");
}
