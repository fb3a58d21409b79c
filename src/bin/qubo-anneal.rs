//! Command-line harness: load an instance, anneal, report, write a submission.

use anyhow::{ensure, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use u_qubo::energy::EnergyBreakdown;
use u_qubo::sa::{AnnealConfig, AnnealRunner, EnergyEvaluation};
use u_qubo::{ProblemInstance, Submission};

/// Simulated annealing for cardinality-constrained portfolio QUBO instances.
#[derive(Debug, Parser)]
#[command(name = "qubo-anneal", version, about)]
struct Args {
    /// Path to the instance JSON.
    #[arg(long, default_value = "data/instance.json")]
    instance: PathBuf,

    /// Number of proposed swaps per run.
    #[arg(long, default_value_t = 50_000)]
    iterations: usize,

    /// Starting temperature.
    #[arg(long, default_value_t = 1.0)]
    t_start: f64,

    /// Final temperature.
    #[arg(long, default_value_t = 1e-4)]
    t_end: f64,

    /// Seed of the first run; restart `i` uses `seed + i`.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of independent runs; the best incumbent is kept.
    #[arg(long, default_value_t = 1)]
    restarts: u64,

    /// Use O(1) swap deltas instead of full energy recomputation.
    #[arg(long)]
    incremental: bool,

    /// Where to write the submission JSON.
    #[arg(long, default_value = "submissions/sa_submission.json")]
    output: PathBuf,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    enable_tracing();
    let args = Args::parse();
    ensure!(args.restarts >= 1, "--restarts must be at least 1");

    let instance = ProblemInstance::from_path(&args.instance)
        .with_context(|| format!("loading instance {}", args.instance.display()))?;
    instance
        .validate()
        .with_context(|| format!("invalid instance {}", args.instance.display()))?;

    println!(
        "Instance: N={}, K={}, lambda={}, penalty_A={}",
        instance.n(),
        instance.k,
        instance.lambda,
        instance.penalty_a
    );
    println!(
        "Running SA: {} iterations, T={}->{}, seed={}, restarts={}",
        args.iterations, args.t_start, args.t_end, args.seed, args.restarts
    );

    let evaluation = if args.incremental {
        EnergyEvaluation::Incremental
    } else {
        EnergyEvaluation::Full
    };
    let config = AnnealConfig::default()
        .with_iterations(args.iterations)
        .with_initial_temperature(args.t_start)
        .with_final_temperature(args.t_end)
        .with_evaluation(evaluation)
        .with_seed(args.seed);
    config.validate().context("invalid annealing parameters")?;

    let seeds: Vec<u64> = (0..args.restarts)
        .map(|i| args.seed.wrapping_add(i))
        .collect();

    let t0 = Instant::now();
    let restarts = AnnealRunner::run_restarts(&instance, &config, &seeds)?;
    let result = restarts.best();
    tracing::info!(
        runtime_ms = t0.elapsed().as_millis() as u64,
        best_seed = restarts.seeds[restarts.best_index],
        accepted = result.accepted_moves,
        improving = result.improving_moves,
        "search finished"
    );
    if result.non_finite_energies > 0 {
        tracing::warn!(
            count = result.non_finite_energies,
            "non-finite energies encountered; check mu/sigma"
        );
    }

    let breakdown = EnergyBreakdown::evaluate(&instance, &result.best);
    let selected = instance.selected_tickers(&result.best);

    println!();
    println!("Best energy: {:.6}", result.best_energy);
    println!(
        "  return {:.6}  risk {:.6}  penalty {:.6}",
        breakdown.return_term, breakdown.risk_term, breakdown.penalty_term
    );
    println!("Selected assets ({}): {}", selected.len(), selected.join(", "));
    println!("Feasible: {}", instance.is_feasible(&result.best));

    let submission = Submission::new(result.best.clone());
    submission
        .write_to_path(&args.output)
        .with_context(|| format!("writing submission {}", args.output.display()))?;
    println!("Submission written to {}", args.output.display());

    Ok(())
}
