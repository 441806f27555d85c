//! Error types for the contest engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, the run, and output.

/// Top-level error for the contest engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: contest_core::config::ConfigError,
    },

    /// Building the initial simulation state failed.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying tick error.
        #[from]
        source: contest_core::tick::TickError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: contest_core::runner::RunnerError,
    },

    /// The finalized log failed the ledger audit.
    #[error("ledger audit found {count} anomalies")]
    Audit {
        /// Number of anomalies reported.
        count: usize,
    },

    /// Opening the output file failed.
    #[error("failed to create {path}: {source}")]
    Output {
        /// Destination path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the event log failed.
    #[error("export error: {source}")]
    Export {
        /// The underlying export error.
        #[from]
        source: contest_ledger::export::ExportError,
    },
}
