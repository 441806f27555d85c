//! Tick callback that traces run progress.
//!
//! Every tick summary is logged at `debug`; each time the completed-game
//! count crosses a multiple of `progress_every`, an `info` line reports
//! progress toward the target.

use contest_core::runner::TickCallback;
use contest_core::tick::{SimulationState, TickSummary};
use tracing::{debug, info};

/// Callback that reports tick summaries through `tracing`.
pub struct LogCallback {
    total_games: u64,
    progress_every: u64,
    last_reported: u64,
}

impl LogCallback {
    /// Create a callback reporting progress toward `total_games`.
    pub fn new(total_games: u64) -> Self {
        Self {
            total_games,
            progress_every: total_games.checked_div(10).unwrap_or(0).max(1),
            last_reported: 0,
        }
    }
}

impl TickCallback for LogCallback {
    fn on_tick(&mut self, summary: &TickSummary, sim: &SimulationState) {
        debug!(
            tick = summary.tick,
            humans = summary.humans_admitted,
            bots = summary.bots_admitted,
            settled = summary.contests_settled,
            respawned = summary.contests_respawned,
            balance = %summary.bot_balance,
            events = sim.ctx.log.len(),
            "Tick summary"
        );

        let bucket = summary
            .games_completed
            .checked_div(self.progress_every)
            .unwrap_or(0);
        if bucket > self.last_reported {
            self.last_reported = bucket;
            info!(
                tick = summary.tick,
                games_completed = summary.games_completed,
                total_games = self.total_games,
                balance = %summary.bot_balance,
                "Progress"
            );
        }
    }
}
