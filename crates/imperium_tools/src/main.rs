//! Ressourcen-Imperium - Development Tools
//!
//! # Usage
//!
//! ```bash
//! # Validate the shipped balance
//! cargo run -p imperium_tools -- validate assets/data
//!
//! # Run a scripted session, save it and record a replay
//! cargo run -p imperium_tools -- simulate --script run.ron --save save.json --record run.replay
//!
//! # Show what a save would earn after being closed
//! cargo run -p imperium_tools -- offline --save save.json --now-ms 1700000000000
//!
//! # Verify a replay
//! cargo run -p imperium_tools -- replay --file run.replay --verify
//! ```
//!
//! Reports are written to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use imperium_core::replay::{Replay, ReplayPlayer};
use imperium_core::simulation::Simulation;
use imperium_tools::script::{self, Script};
use imperium_tools::{files, validate, Result};

#[derive(Parser)]
#[command(name = "imperium-tools")]
#[command(about = "Development tools for Ressourcen-Imperium")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// RON file or directory of RON files
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },

    /// Run a headless session
    Simulate {
        /// Balance file (built-in balance if omitted)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Action script (RON)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Ticks to run when no script is given
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Start from this JSON save instead of a fresh game
        #[arg(long)]
        load: Option<PathBuf>,

        /// Write the final state as a JSON save
        #[arg(long)]
        save: Option<PathBuf>,

        /// Record a replay of the run
        #[arg(long)]
        record: Option<PathBuf>,

        /// Save stamp in epoch milliseconds (current time if omitted)
        #[arg(long)]
        now_ms: Option<f64>,
    },

    /// Report offline progress for a save
    Offline {
        /// JSON save
        #[arg(long)]
        save: PathBuf,

        /// Current time in epoch milliseconds
        #[arg(long)]
        now_ms: f64,

        /// Balance file (built-in balance if omitted)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Write the caught-up save back to this path
        #[arg(long)]
        apply: Option<PathBuf>,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Simulate {
            data,
            script,
            ticks,
            load,
            save,
            record,
            now_ms,
        } => cmd_simulate(
            data.as_deref(),
            script.as_deref(),
            ticks,
            load.as_deref(),
            save.as_deref(),
            record.as_deref(),
            now_ms,
        ),
        Commands::Offline {
            save,
            now_ms,
            data,
            apply,
        } => cmd_offline(&save, now_ms, data.as_deref(), apply.as_deref()),
        Commands::Replay { file, verify } => cmd_replay(&file, verify),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to encode report: {e}"),
    }
}

fn cmd_validate(path: &Path) -> Result<ExitCode> {
    tracing::info!("Validating data files in: {}", path.display());
    let reports = validate::validate_data_path(path)?;
    tracing::info!(files = reports.len(), "Validation passed");
    Ok(ExitCode::SUCCESS)
}

fn cmd_simulate(
    data: Option<&Path>,
    script_path: Option<&Path>,
    ticks: u64,
    load: Option<&Path>,
    save: Option<&Path>,
    record: Option<&Path>,
    now_ms: Option<f64>,
) -> Result<ExitCode> {
    let mut sim = Simulation::new(files::load_game_data(data)?)?;
    if let Some(load) = load {
        let report = sim.restore(&files::load_snapshot(load)?);
        if !report.is_clean() {
            tracing::warn!(?report, "Save loaded with corrections");
        }
    }

    let script = match script_path {
        Some(path) => Script::load(path)?,
        None => Script::idle(ticks),
    };

    let mut replay = match record {
        Some(_) => Some(Replay::new("simulate", script.dt, &sim)?),
        None => None,
    };

    tracing::info!(ticks = script.ticks, dt = script.dt, "Running session");
    let summary = script::run(&mut sim, &script, replay.as_mut());
    print_json(&summary);

    if let (Some(path), Some(replay)) = (record, &replay) {
        files::save_replay(replay, path)?;
        tracing::info!(actions = replay.action_count(), "Replay written to {}", path.display());
    }
    if let Some(path) = save {
        files::save_snapshot(&sim, now_ms.unwrap_or_else(files::now_ms), path)?;
        tracing::info!("Save written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_offline(save: &Path, now_ms: f64, data: Option<&Path>, apply: Option<&Path>) -> Result<ExitCode> {
    let snapshot = files::load_snapshot(save)?;
    let mut sim = Simulation::new(files::load_game_data(data)?)?;
    let restore = sim.restore(&snapshot);
    if !restore.is_clean() {
        tracing::warn!(?restore, "Save loaded with corrections");
    }

    let report = sim.catch_up(now_ms, snapshot.last_save_timestamp);
    print_json(&report);

    if let Some(path) = apply {
        files::save_snapshot(&sim, now_ms, path)?;
        tracing::info!("Caught-up save written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_replay(file: &Path, verify: bool) -> Result<ExitCode> {
    let replay = files::load_replay(file)?;
    eprintln!("Loaded replay:");
    eprintln!("  Label: {}", replay.label);
    eprintln!("  Actions: {}", replay.action_count());
    eprintln!("  Duration: {} ticks", replay.duration());

    let mut player = ReplayPlayer::new(replay)?;

    if verify {
        let expected = player.replay().final_hash;
        if player.verify()? {
            eprintln!("PASS: Replay verification successful");
            eprintln!("  Hash: {expected:016x}");
            return Ok(ExitCode::SUCCESS);
        }
        eprintln!("FAIL: Replay produced different hash!");
        eprintln!("  Expected: {expected:016x}");
        eprintln!("  Actual:   {:016x}", player.simulation().state_hash());
        return Ok(ExitCode::FAILURE);
    }

    let mut last_decile = 0;
    while player.advance() {
        let decile = (player.progress_percent() / 10.0).floor() as u32;
        if decile > last_decile {
            last_decile = decile;
            eprintln!("  {}% (tick {})", decile * 10, player.current_tick());
        }
    }
    print_json(&player.simulation().store().amounts());
    Ok(ExitCode::SUCCESS)
}
