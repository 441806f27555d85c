//! Configuration loading and typed config structures for the contest simulator.
//!
//! The canonical configuration lives in `contest-config.yaml` in the working
//! directory. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and the startup validation that rejects
//! parameter combinations under which a contest could never fill.
//!
//! Every field has a default equal to the simulator's reference setup: four
//! seats, a fee of 10, payouts of 25 and 10, up to three bots per contest,
//! two concurrent contests, fifty games.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "CONTEST_SEED";

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or inconsistent with another value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `contest-config.yaml`. Configuration is a fixed
/// input read once at startup; nothing is reconfigurable mid-run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Run-level settings (seed).
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick-to-timestamp mapping.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Contest size, fee, payouts, and bot cap.
    #[serde(default)]
    pub contest: ContestConfig,

    /// Human score and arrival sampling.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Bot decision policy tuning.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Concurrency and termination.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Event export destination.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `CONTEST_SEED` environment variable, when set to a valid
    /// integer, overrides `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.world.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Check that the configuration can drive a run to completion.
    ///
    /// Humans may take at most `contest.size - 1` seats, so at least one
    /// bot must be allowed or no contest would ever fill.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        if self.contest.size < 2 {
            return invalid("contest.size must be at least 2");
        }
        if self.contest.payout_table.is_empty() {
            return invalid("contest.payout_table must not be empty");
        }
        if self.contest.payout_table.iter().any(|p| *p < Decimal::ZERO) {
            return invalid("contest.payout_table entries must not be negative");
        }
        if self.contest.entry_fee < Decimal::ZERO {
            return invalid("contest.entry_fee must not be negative");
        }
        if self.contest.max_bots == 0 {
            return invalid("contest.max_bots must be at least 1 or no contest can fill");
        }
        if self.scoring.min_score == 0 {
            return invalid("scoring.min_score must be at least 1 (0 means not posted)");
        }
        if self.scoring.min_score > self.scoring.max_score {
            return invalid("scoring.min_score must not exceed scoring.max_score");
        }
        if self.policy.max_margin == 0 {
            return invalid("policy.max_margin must be at least 1");
        }
        if self.scheduler.concurrent_contests == 0 {
            return invalid("scheduler.concurrent_contests must be at least 1");
        }
        if self.clock.minutes_per_tick == 0 {
            return invalid("clock.minutes_per_tick must be at least 1");
        }
        Ok(())
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl WorldConfig {
    /// Override the seed from `CONTEST_SEED` when it is set and parses.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

/// Tick-to-timestamp mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Instant tick 0 maps to. Unset means the process start time.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Logical minutes per tick.
    #[serde(default = "default_minutes_per_tick")]
    pub minutes_per_tick: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_time: None,
            minutes_per_tick: default_minutes_per_tick(),
        }
    }
}

/// Contest economics and capacity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContestConfig {
    /// Seats per contest.
    #[serde(default = "default_contest_size")]
    pub size: usize,

    /// Fee paid by every participant on entry.
    #[serde(default = "default_entry_fee")]
    pub entry_fee: Decimal,

    /// Payout per rank, best rank first.
    #[serde(default = "default_payout_table")]
    pub payout_table: Vec<Decimal>,

    /// Maximum automated participants per contest.
    #[serde(default = "default_max_bots")]
    pub max_bots: usize,
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            size: default_contest_size(),
            entry_fee: default_entry_fee(),
            payout_table: default_payout_table(),
            max_bots: default_max_bots(),
        }
    }
}

/// Human score and arrival sampling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScoringConfig {
    /// Lowest possible human score (inclusive).
    #[serde(default = "default_min_score")]
    pub min_score: u32,

    /// Highest possible human score (inclusive).
    #[serde(default = "default_max_score")]
    pub max_score: u32,

    /// Largest gap in ticks between consecutive human arrivals (inclusive).
    #[serde(default = "default_max_arrival_gap")]
    pub max_arrival_gap: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_score: default_max_score(),
            max_arrival_gap: default_max_arrival_gap(),
        }
    }
}

/// Bot decision policy tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    /// Projected value below which bots play for the top prize.
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: Decimal,

    /// Largest margin a bot adds over the score it must beat (inclusive).
    #[serde(default = "default_max_margin")]
    pub max_margin: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            risk_threshold: default_risk_threshold(),
            max_margin: default_max_margin(),
        }
    }
}

/// Concurrency and termination.
///
/// A value of 0 for `max_ticks` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Number of contests running side by side.
    #[serde(default = "default_concurrent_contests")]
    pub concurrent_contests: usize,

    /// Number of replenished contests after which the run ends.
    #[serde(default = "default_total_games")]
    pub total_games: u64,

    /// Hard tick bound guarding against contests that never fill
    /// (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrent_contests: default_concurrent_contests(),
            total_games: default_total_games(),
            max_ticks: 0,
        }
    }
}

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated table with a header row.
    #[default]
    Csv,
    /// One JSON object per line.
    Jsonl,
}

/// Event export destination.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// File the finalized log is written to.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// File format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::Csv,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_minutes_per_tick() -> u32 {
    1
}

const fn default_contest_size() -> usize {
    4
}

const fn default_entry_fee() -> Decimal {
    Decimal::TEN
}

fn default_payout_table() -> Vec<Decimal> {
    vec![Decimal::new(25, 0), Decimal::TEN]
}

const fn default_max_bots() -> usize {
    3
}

const fn default_min_score() -> u32 {
    1
}

const fn default_max_score() -> u32 {
    1000
}

const fn default_max_arrival_gap() -> u64 {
    2
}

const fn default_risk_threshold() -> Decimal {
    Decimal::from_parts(10, 0, 0, true, 0)
}

const fn default_max_margin() -> u32 {
    10
}

const fn default_concurrent_contests() -> usize {
    2
}

const fn default_total_games() -> u64 {
    50
}

fn default_output_path() -> PathBuf {
    PathBuf::from("simulation_events.csv")
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let config = SimulationConfig::default();
        assert_eq!(config.contest.size, 4);
        assert_eq!(config.contest.entry_fee, Decimal::new(10, 0));
        assert_eq!(
            config.contest.payout_table,
            vec![Decimal::new(25, 0), Decimal::new(10, 0)]
        );
        assert_eq!(config.contest.max_bots, 3);
        assert_eq!(config.scheduler.concurrent_contests, 2);
        assert_eq!(config.scheduler.total_games, 50);
        assert_eq!(config.scheduler.max_ticks, 0);
        assert_eq!(config.policy.risk_threshold, Decimal::new(-10, 0));
        assert_eq!(config.policy.max_margin, 10);
        assert_eq!(config.scoring.min_score, 1);
        assert_eq!(config.scoring.max_score, 1000);
        assert_eq!(config.scoring.max_arrival_gap, 2);
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  seed: 123

clock:
  start_time: "2025-01-01T00:00:00Z"
  minutes_per_tick: 2

contest:
  size: 5
  entry_fee: 20
  payout_table: [50, 20, 5]
  max_bots: 2

scoring:
  min_score: 10
  max_score: 500
  max_arrival_gap: 4

policy:
  risk_threshold: -30
  max_margin: 3

scheduler:
  concurrent_contests: 3
  total_games: 12
  max_ticks: 10000

output:
  path: "out/events.jsonl"
  format: jsonl

logging:
  level: "debug"
"#;

        let config = SimulationConfig::parse(yaml).unwrap();

        assert_eq!(config.world.seed, 123);
        assert_eq!(
            config.clock.start_time,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(config.clock.minutes_per_tick, 2);
        assert_eq!(config.contest.size, 5);
        assert_eq!(config.contest.entry_fee, Decimal::new(20, 0));
        assert_eq!(config.contest.payout_table.len(), 3);
        assert_eq!(config.contest.max_bots, 2);
        assert_eq!(config.scoring.max_arrival_gap, 4);
        assert_eq!(config.policy.risk_threshold, Decimal::new(-30, 0));
        assert_eq!(config.scheduler.concurrent_contests, 3);
        assert_eq!(config.scheduler.max_ticks, 10_000);
        assert_eq!(config.output.path, PathBuf::from("out/events.jsonl"));
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("world:\n  seed: 7\n").unwrap();

        // Seed is overridden
        assert_eq!(config.world.seed, 7);
        // Everything else uses defaults
        assert_eq!(config.contest.size, 4);
        assert_eq!(config.scheduler.total_games, 50);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SimulationConfig::parse("").is_ok());
    }

    #[test]
    fn zero_bot_cap_rejected() {
        let mut config = SimulationConfig::default();
        config.contest.max_bots = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn empty_payout_table_rejected() {
        let mut config = SimulationConfig::default();
        config.contest.payout_table.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn inverted_score_range_rejected() {
        let mut config = SimulationConfig::default();
        config.scoring.min_score = 600;
        config.scoring.max_score = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn single_seat_contest_rejected() {
        let mut config = SimulationConfig::default();
        config.contest.size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("contest-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
            let config = config.unwrap();
            assert_eq!(config.contest, ContestConfig::default());
            assert_eq!(config.scheduler, SchedulerConfig::default());
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn unknown_output_format_rejected() {
        let result = SimulationConfig::parse("output:\n  format: xml\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
