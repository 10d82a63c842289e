use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use exomech::logging;
use exomech::{Runner, Scenario, Settings};
use exomech_core::config::{bundled_definition, load_definition, load_definitions_from_dir};
use exomech_core::roster::{self, all_actor_types};
use exomech_core::{Encounter, FightDefinition, FightSignal};

#[derive(Parser)]
#[command(version, about = "Exo-mech encounter harness")]
struct Cli {
    /// Enable debug logging for the exomech crates
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario file against the encounter
    Run {
        scenario: PathBuf,
        /// Fight definition; defaults to the configured or bundled one
        #[arg(short, long)]
        definition: Option<PathBuf>,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Mirror behavior state into a replica and report sync traffic
        #[arg(long)]
        replica: bool,
    },
    /// Validate definition files or directories
    Check { paths: Vec<PathBuf> },
    /// List known actor types
    Roster,
    /// Show or update saved defaults
    Config {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long)]
        definition: Option<PathBuf>,
        #[arg(long, conflicts_with = "definition")]
        bundled: bool,
    },
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match cli.command {
        Commands::Run {
            scenario,
            definition,
            seed,
            ticks,
            replica,
        } => run(&scenario, definition, seed, ticks, replica),
        Commands::Check { paths } => check(&paths),
        Commands::Roster => {
            let registry = roster::standard_registry().map_err(|e| e.to_string())?;
            for (kind, name) in all_actor_types() {
                let managed = registry.has_template(kind);
                println!("{:>4}  {name:<16} {}", kind.0, if managed { "behavior" } else { "host" });
            }
            Ok(())
        }
        Commands::Config {
            seed,
            ticks,
            definition,
            bundled,
        } => configure(seed, ticks, definition, bundled),
    }
}

fn run(
    scenario_path: &Path,
    definition: Option<PathBuf>,
    seed: Option<u64>,
    ticks: Option<u64>,
    with_replica: bool,
) -> Result<(), String> {
    let settings = Settings::load();
    let scenario = Scenario::load(scenario_path).map_err(|e| error_chain(&e))?;

    let seed = seed.or(scenario.seed).unwrap_or(settings.seed);
    let ticks = ticks.or(scenario.ticks).unwrap_or(settings.ticks);
    let definition = resolve_definition(definition.or(settings.definition))?;

    let build = || -> Result<Encounter, String> {
        let registry = roster::standard_registry().map_err(|e| e.to_string())?;
        Encounter::from_definition(&definition, registry, seed).map_err(|e| error_chain(&e))
    };
    let mut runner = Runner::new(build()?, &scenario);
    if with_replica {
        runner = runner.with_replica(build()?);
    }

    tracing::info!(scenario = %scenario.name, fight = %definition.name, seed, ticks, "Running scenario");
    let timer = Instant::now();
    let outcome = runner.run(&scenario, ticks);
    let ms = timer.elapsed().as_millis();

    for (tick, signal) in &outcome.signals {
        match signal {
            FightSignal::FightStarted => println!("[{tick:>6}] fight started"),
            FightSignal::PhaseChanged { to, name, .. } => {
                println!("[{tick:>6}] phase {to} ({name})")
            }
            FightSignal::FightReset => println!("[{tick:>6}] fight reset"),
            FightSignal::MemberFirstSeen { .. } | FightSignal::PrimaryElected { .. } => {}
        }
    }
    for (tick, kill) in &outcome.kills {
        let name = roster::actor_name(kill.kind).unwrap_or("unknown");
        let loot: Vec<String> = kill
            .loot
            .entries()
            .iter()
            .map(|e| format!("{} x{}", e.item, e.count))
            .collect();
        if !loot.is_empty() {
            println!("[{tick:>6}] {name} {} dropped {}", kill.actor, loot.join(", "));
        }
    }

    println!(
        "ran {} ticks in {ms}ms: phase {} ({}), {}",
        outcome.ticks_run,
        outcome.final_phase,
        outcome.final_phase_name,
        if outcome.ongoing { "ongoing" } else { "not ongoing" }
    );
    for (phase, duration) in &outcome.phase_durations {
        println!("  phase {phase}: {duration} ticks");
    }
    println!("  {} cues, {} kill reports", outcome.cues, outcome.kills.len());
    if with_replica {
        println!(
            "  sync: {} packets, {} bytes, {} errors",
            outcome.sync_packets, outcome.sync_bytes, outcome.sync_errors
        );
    }
    Ok(())
}

fn resolve_definition(path: Option<PathBuf>) -> Result<FightDefinition, String> {
    match path {
        Some(path) => load_definition(&path).map_err(|e| error_chain(&e)),
        None => bundled_definition().map_err(|e| error_chain(&e)),
    }
}

fn check(paths: &[PathBuf]) -> Result<(), String> {
    if paths.is_empty() {
        let definition = bundled_definition().map_err(|e| error_chain(&e))?;
        println!("bundled: {} ({} phases)", definition.name, definition.phases.len());
        return Ok(());
    }

    let mut failures = 0;
    for path in paths {
        let result = if path.is_dir() {
            load_definitions_from_dir(path)
        } else {
            load_definition(path).map(|d| vec![d])
        };
        match result {
            Ok(definitions) => {
                for definition in definitions {
                    println!("ok: {} ({} phases)", definition.name, definition.phases.len());
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!("error: {}", error_chain(&err));
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} definition source(s) failed validation"));
    }
    Ok(())
}

fn configure(
    seed: Option<u64>,
    ticks: Option<u64>,
    definition: Option<PathBuf>,
    bundled: bool,
) -> Result<(), String> {
    let mut settings = Settings::load();
    let changed = seed.is_some() || ticks.is_some() || definition.is_some() || bundled;

    if let Some(seed) = seed {
        settings.seed = seed;
    }
    if let Some(ticks) = ticks {
        settings.ticks = ticks;
    }
    if definition.is_some() {
        settings.definition = definition;
    }
    if bundled {
        settings.definition = None;
    }
    if changed {
        settings.save().map_err(|e| error_chain(&e))?;
    }

    if let Some(path) = Settings::path() {
        println!("settings: {}", path.display());
    }
    println!("seed = {}", settings.seed);
    println!("ticks = {}", settings.ticks);
    match &settings.definition {
        Some(path) => println!("definition = {}", path.display()),
        None => println!("definition = <bundled>"),
    }
    Ok(())
}

/// Render an error with its source chain on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
