//! The per-tick step that drives every active contest.
//!
//! Each tick visits the contest slots in index order. For each slot:
//!
//! 1. **Respawn** -- a contest that is full or settled is settled if it
//!    still owes payouts (at `start_tick + 10`), counted as a completed
//!    game, and replaced with a new empty contest. Nothing else happens
//!    in that slot this tick.
//! 2. **Human admission** -- at most one human joins if a seat and the
//!    arrival schedule allow it.
//! 3. **Bot admission** -- at most one bot joins if the stagger and the
//!    bot cap allow it.
//! 4. **Fill** -- a contest whose last seat was just taken is marked full
//!    and settled at the current tick.
//!
//! The clock advances once every slot has been visited. Slot order is
//! fixed, which makes a run reproducible for a given seed: the shared bot
//! balance is the only state contests affect in each other.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::clock::{ClockError, SimClock};
use crate::config::{ConfigError, ScoringConfig, SimulationConfig};
use crate::contest::{Contest, ContestError, ContestRules, LAZY_SETTLEMENT_OFFSET};
use crate::context::SimulationContext;
use crate::policy::BotPolicy;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The configuration failed validation.
    #[error("invalid configuration: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A contest operation failed.
    #[error("contest error: {source}")]
    Contest {
        /// The underlying contest error.
        #[from]
        source: ContestError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Humans admitted during this tick.
    pub humans_admitted: u32,
    /// Bots admitted during this tick.
    pub bots_admitted: u32,
    /// Contests whose payouts ran during this tick.
    pub contests_settled: u32,
    /// Contests replaced during this tick.
    pub contests_respawned: u32,
    /// Completed games at the end of this tick.
    pub games_completed: u64,
    /// Shared bot balance at the end of this tick.
    pub bot_balance: Decimal,
}

impl TickSummary {
    const fn empty(tick: u64) -> Self {
        Self {
            tick,
            humans_admitted: 0,
            bots_admitted: 0,
            contests_settled: 0,
            contests_respawned: 0,
            games_completed: 0,
            bot_balance: Decimal::ZERO,
        }
    }
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// Clock, bot account, log, generator, and counters.
    pub ctx: SimulationContext,
    /// Contest parameters.
    pub rules: ContestRules,
    /// Human sampling parameters.
    pub scoring: ScoringConfig,
    /// One active contest per slot.
    pub contests: Vec<Contest>,
    /// Contests replaced so far.
    pub games_completed: u64,
}

impl SimulationState {
    /// Build the initial state: clock at tick 0, zero balance, and one
    /// fresh contest per configured slot.
    ///
    /// `fallback_start` is the instant tick 0 maps to when the
    /// configuration does not pin one.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Config`] if `config` fails
    /// [`SimulationConfig::validate`], [`TickError::Clock`] for an invalid
    /// clock configuration, or [`TickError::Contest`] if contest ids cannot
    /// be issued.
    pub fn new(
        config: &SimulationConfig,
        fallback_start: DateTime<Utc>,
    ) -> Result<Self, TickError> {
        config.validate()?;
        let clock = SimClock::new(&config.clock, fallback_start)?;
        let mut ctx = SimulationContext::new(clock, config.world.seed);

        let contests = (0..config.scheduler.concurrent_contests)
            .map(|_| Contest::open(&mut ctx, 0))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ctx,
            rules: ContestRules::from_config(&config.contest),
            scoring: config.scoring.clone(),
            contests,
            games_completed: 0,
        })
    }
}

/// Execute one tick and advance the clock.
///
/// # Errors
///
/// Returns [`TickError`] if a contest operation fails or the clock
/// overflows. State may be partially updated for the failing tick.
pub fn run_tick(
    state: &mut SimulationState,
    policy: &mut dyn BotPolicy,
) -> Result<TickSummary, TickError> {
    let SimulationState {
        ctx,
        rules,
        scoring,
        contests,
        games_completed,
    } = state;

    let tick = ctx.clock.tick();
    let mut summary = TickSummary::empty(tick);

    for slot in contests.iter_mut() {
        if slot.is_finished() {
            if !slot.is_settled() {
                let settle_tick = slot.start_tick().saturating_add(LAZY_SETTLEMENT_OFFSET);
                warn!(
                    contest_id = %slot.id(),
                    settle_tick,
                    "full contest found unsettled at respawn, settling late"
                );
                if slot.settle_if_needed(ctx, rules, settle_tick)? {
                    summary.contests_settled = summary.contests_settled.saturating_add(1);
                }
            }
            *games_completed = games_completed.saturating_add(1);
            summary.contests_respawned = summary.contests_respawned.saturating_add(1);
            *slot = Contest::open(ctx, tick)?;
            continue;
        }

        if slot.can_admit_human(rules, tick) {
            slot.admit_human(ctx, rules, scoring, tick)?;
            summary.humans_admitted = summary.humans_admitted.saturating_add(1);
        }

        if slot.can_admit_bot(rules, tick) {
            slot.admit_bot(ctx, rules, policy, tick)?;
            summary.bots_admitted = summary.bots_admitted.saturating_add(1);
        }

        if slot.mark_full_if_complete(rules) && slot.settle_if_needed(ctx, rules, tick)? {
            summary.contests_settled = summary.contests_settled.saturating_add(1);
        }
    }

    summary.games_completed = *games_completed;
    summary.bot_balance = ctx.account.balance();
    ctx.clock.advance()?;

    debug!(
        tick,
        humans = summary.humans_admitted,
        bots = summary.bots_admitted,
        settled = summary.contests_settled,
        respawned = summary.contests_respawned,
        games_completed = summary.games_completed,
        balance = %summary.bot_balance,
        "tick complete"
    );
    Ok(summary)
}
