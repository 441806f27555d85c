//! Contest simulator binary.
//!
//! This is the main entry point that wires together configuration, the
//! contest tick loop, the ledger audit, and the event export. It loads
//! configuration, runs the simulation until the target number of games
//! has been played, and writes the finalized event log.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `contest-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Validate configuration
//! 4. Build the initial simulation state
//! 5. Run the simulation loop
//! 6. Audit the finalized log
//! 7. Write the log in the configured format

mod error;
mod log_callback;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;
use contest_core::config::{OutputFormat, SimulationConfig};
use contest_core::policy::TwoTierPolicy;
use contest_core::runner::{self, SimulationResult};
use contest_core::tick::SimulationState;
use contest_ledger::AuditResult;
use contest_ledger::export;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_callback::LogCallback;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "contest-config.yaml";

/// Application entry point for the contest engine.
///
/// # Errors
///
/// Returns an error if configuration, the run, the audit, or the export
/// fails.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("contest-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        contest_size = config.contest.size,
        entry_fee = %config.contest.entry_fee,
        payout_slots = config.contest.payout_table.len(),
        max_bots = config.contest.max_bots,
        concurrent_contests = config.scheduler.concurrent_contests,
        total_games = config.scheduler.total_games,
        "Configuration loaded"
    );

    // 3. Validate.
    config.validate()?;

    // 4. Build initial state.
    let mut state = SimulationState::new(&config, Utc::now())?;
    let mut policy = TwoTierPolicy::from_config(&config.policy);
    let mut callback = LogCallback::new(config.scheduler.total_games);
    info!(
        start = %state.ctx.clock.now(),
        minutes_per_tick = state.ctx.clock.minutes_per_tick(),
        "Simulation state assembled, entering tick loop"
    );

    // 5. Run.
    let result =
        runner::run_simulation(&mut state, &mut policy, &config.scheduler, &mut callback)?;
    runner::log_simulation_end(&result);

    // 6. Audit.
    audit(&result)?;

    // 7. Export.
    write_output(&config, &result)?;
    info!(
        path = %config.output.path.display(),
        format = ?config.output.format,
        events = result.log.len(),
        "Simulation complete"
    );

    Ok(())
}

/// Load configuration from `contest-config.yaml` if present.
///
/// Returns the configuration and whether it came from the file.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((SimulationConfig::from_file(config_path)?, true))
    } else {
        let mut config = SimulationConfig::default();
        config.world.apply_env_overrides();
        Ok((config, false))
    }
}

/// Log every anomaly and fail if the audit is not clean.
fn audit(result: &SimulationResult) -> Result<(), EngineError> {
    match result.audit() {
        AuditResult::Clean => {
            info!(events = result.log.len(), "Ledger audit clean");
            Ok(())
        }
        AuditResult::Anomalies(anomalies) => {
            for anomaly in &anomalies {
                error!(
                    check = ?anomaly.check,
                    contest_id = ?anomaly.contest_id,
                    transaction_id = ?anomaly.transaction_id,
                    "{}",
                    anomaly.message
                );
            }
            Err(EngineError::Audit {
                count: anomalies.len(),
            })
        }
    }
}

/// Write the finalized log to the configured path and format.
fn write_output(config: &SimulationConfig, result: &SimulationResult) -> Result<(), EngineError> {
    let path = &config.output.path;
    let file = File::create(path).map_err(|source| EngineError::Output {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    match config.output.format {
        OutputFormat::Csv => export::write_csv(result.log.events(), &mut writer)?,
        OutputFormat::Jsonl => export::write_json_lines(result.log.events(), &mut writer)?,
    }
    Ok(())
}
