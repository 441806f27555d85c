//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], which drives [`run_tick`] until
//! enough games have completed or the tick bound is hit, then finalizes the
//! event log into a globally ordered, numbered [`FinalizedLog`].
//!
//! [`run_tick`]: crate::tick::run_tick

use contest_ledger::{AuditParams, AuditResult, BotAccount, FinalizedLog, audit};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::policy::BotPolicy;
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// The completed-game target was reached.
    GamesCompleted,
    /// The configured tick bound was reached first.
    TickLimitReached,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// Identifier of this run, for correlating logs and output.
    pub run_id: Uuid,
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Contests replaced during the run.
    pub games_completed: u64,
    /// Seats per contest.
    pub contest_size: usize,
    /// Paid ranks per contest.
    pub payout_slots: usize,
    /// The bot account at the end of the run.
    pub account: BotAccount,
    /// Every event, ordered and numbered.
    pub log: FinalizedLog,
}

impl SimulationResult {
    /// Run the ledger audit over the finalized log.
    pub fn audit(&self) -> AuditResult {
        let params = AuditParams {
            contest_size: self.contest_size,
            payout_slots: self.payout_slots,
            opening_balance: self.account.opening_balance(),
            closing_balance: self.account.balance(),
        };
        audit::audit(self.log.events(), &params)
    }
}

/// Callback invoked after each tick completes.
pub trait TickCallback {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// The completed-game count is checked before every tick, so a tick in
/// which several contests respawn may push it past `total_games`. A
/// `max_ticks` of 0 means no tick bound.
///
/// The event log is moved out of `state` and finalized into the result.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails.
pub fn run_simulation(
    state: &mut SimulationState,
    policy: &mut dyn BotPolicy,
    scheduler: &SchedulerConfig,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let run_id = Uuid::now_v7();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        %run_id,
        contests = state.contests.len(),
        total_games = scheduler.total_games,
        max_ticks = scheduler.max_ticks,
        "Simulation starting"
    );

    let end_reason = loop {
        if state.games_completed >= scheduler.total_games {
            break SimulationEndReason::GamesCompleted;
        }
        if scheduler.max_ticks > 0 && total_ticks >= scheduler.max_ticks {
            info!(
                tick = state.ctx.clock.tick(),
                max_ticks = scheduler.max_ticks,
                games_completed = state.games_completed,
                "Tick limit reached"
            );
            break SimulationEndReason::TickLimitReached;
        }

        let summary = tick::run_tick(state, policy)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, state);
        last_summary = Some(summary);
    };

    let log = std::mem::take(&mut state.ctx.log).finalize();

    Ok(SimulationResult {
        run_id,
        end_reason,
        final_summary: last_summary,
        total_ticks,
        games_completed: state.games_completed,
        contest_size: state.rules.size,
        payout_slots: state.rules.payout_table.len(),
        account: state.ctx.account.clone(),
        log,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        run_id = %result.run_id,
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        games_completed = result.games_completed,
        events = result.log.len(),
        "Simulation ended"
    );

    info!(
        balance = %result.account.balance(),
        fees_paid = %result.account.fees_paid(),
        winnings = %result.account.winnings(),
        entries = result.account.entries(),
        wins = result.account.wins(),
        "Bot account summary"
    );

    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}
