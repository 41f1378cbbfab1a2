//! Headless Skirmish Runner
//!
//! Runs a scenario to completion and prints a JSON or text summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use squad_tactics::battle::{Scenario, SkirmishOutcome, SkirmishSummary};
use squad_tactics::combat::CombatEvent;
use tracing_subscriber::EnvFilter;

/// Headless Skirmish Runner - scripted squad battles
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run a squad skirmish scenario and report the outcome")]
struct Args {
    /// Scenario TOML file; the built-in demo when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum steps before declaring a draw
    #[arg(long, default_value_t = 6000)]
    max_ticks: u64,

    /// Seconds simulated per step at normal speed
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Time scale applied to every step
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every shot to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RunResult {
    scenario: String,
    seed: u64,
    timed_out: bool,
    #[serde(flatten)]
    summary: SkirmishSummary,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squad_tactics=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let scenario = match &args.scenario {
        Some(path) => match Scenario::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to load scenario {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Scenario::demo(),
    };

    let mut skirmish = match scenario.build() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to build scenario '{}': {}", scenario.name, e);
            return ExitCode::FAILURE;
        }
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    skirmish.clock_mut().set_speed(args.speed);

    if args.verbose {
        skirmish.subscribe_combat(|event| match event {
            CombatEvent::ShotFired(_) => {}
            CombatEvent::Hit(hit) => eprintln!(
                "  hit {} -> {} for {}{}{}",
                hit.attacker,
                hit.target,
                hit.damage,
                if hit.critical { " (crit)" } else { "" },
                if hit.lethal { " (lethal)" } else { "" },
            ),
            CombatEvent::Miss(miss) => {
                eprintln!("  miss {} -> {} ({})", miss.attacker, miss.target, miss.reason)
            }
        });
    }

    tracing::info!("running '{}' with seed {}", scenario.name, seed);
    while skirmish.clock().tick() < args.max_ticks && !skirmish.is_finished() {
        let report = skirmish.step(args.dt, &mut rng);
        for (id, event) in &report.life_events {
            tracing::debug!("tick {}: {} {}", report.tick, id, event);
        }
    }

    let summary = skirmish.summary();
    let result = RunResult {
        scenario: scenario.name.clone(),
        seed,
        timed_out: summary.outcome == SkirmishOutcome::InProgress,
        summary,
    };

    match args.format.as_str() {
        "text" => print_text(&result),
        _ => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn print_text(result: &RunResult) {
    let summary = &result.summary;
    println!("Skirmish Result");
    println!("===============");
    println!("Scenario: {}", result.scenario);
    println!("Seed: {}", result.seed);
    println!("Outcome: {:?}", summary.outcome);
    println!("Ticks: {} ({:.1}s)", summary.ticks, summary.elapsed_secs);
    println!("Shots: {} fired, {} hit", summary.shots_fired, summary.hits);
    println!(
        "Sight cache: {} hits, {} misses, {} invalidations, {} evictions",
        summary.line_of_sight.hits,
        summary.line_of_sight.misses,
        summary.line_of_sight.invalidations,
        summary.line_of_sight.evictions
    );
    println!();
    for unit in &summary.units {
        println!(
            "  {:<12} {:<10} at {:<10} hp {:>4}  {}",
            unit.name,
            unit.faction.to_string(),
            unit.cell.to_string(),
            unit.hp,
            unit.state
        );
    }
}
