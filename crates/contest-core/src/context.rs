//! Shared mutable state of a run.
//!
//! Everything contests touch in common lives in one [`SimulationContext`]
//! passed by `&mut`: the clock, the bot account, the event log, the seeded
//! random generator, and the id counters. There is exactly one mutation
//! path for each of them.

use contest_ledger::{BotAccount, EventLog};
use contest_types::{ContestId, GameId, ParticipantId, Timestamp};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::SimClock;
use crate::contest::ContestError;

/// Monotonic id counters for contests, games, humans, and bots.
///
/// Every counter starts at 1 and is never reused within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCounters {
    next_contest: u64,
    next_game: u64,
    next_human: u64,
    next_bot: u64,
}

impl IdCounters {
    /// Create counters that all start at 1.
    pub const fn new() -> Self {
        Self {
            next_contest: 1,
            next_game: 1,
            next_human: 1,
            next_bot: 1,
        }
    }

    /// Issue the next contest id and game id.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::CounterOverflow`] if either counter is exhausted.
    pub fn next_contest(&mut self) -> Result<(ContestId, GameId), ContestError> {
        let contest_id = bump(&mut self.next_contest, "contest")?;
        let game_id = bump(&mut self.next_game, "game")?;
        Ok((ContestId(contest_id), GameId(game_id)))
    }

    /// Issue a fresh human participant id.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::CounterOverflow`] if the counter is exhausted.
    pub fn next_human(&mut self) -> Result<ParticipantId, ContestError> {
        bump(&mut self.next_human, "human").map(ParticipantId::human)
    }

    /// Issue a fresh bot participant id.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::CounterOverflow`] if the counter is exhausted.
    pub fn next_bot(&mut self) -> Result<ParticipantId, ContestError> {
        bump(&mut self.next_bot, "bot").map(ParticipantId::bot)
    }

    /// Number of human ids issued so far.
    pub const fn humans_issued(&self) -> u64 {
        self.next_human.saturating_sub(1)
    }

    /// Number of bot ids issued so far.
    pub const fn bots_issued(&self) -> u64 {
        self.next_bot.saturating_sub(1)
    }

    /// Number of contests created so far.
    pub const fn contests_issued(&self) -> u64 {
        self.next_contest.saturating_sub(1)
    }
}

impl Default for IdCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Return the current value of `counter` and advance it.
fn bump(counter: &mut u64, name: &'static str) -> Result<u64, ContestError> {
    let current = *counter;
    *counter = current
        .checked_add(1)
        .ok_or(ContestError::CounterOverflow { counter: name })?;
    Ok(current)
}

/// Shared state threaded through every contest operation.
#[derive(Debug)]
pub struct SimulationContext {
    /// Simulated time.
    pub clock: SimClock,
    /// The single running balance shared by all bots.
    pub account: BotAccount,
    /// Every event recorded so far, in append order.
    pub log: EventLog,
    /// Seeded generator for scores, arrivals, and bot margins.
    pub rng: StdRng,
    /// Id counters.
    pub counters: IdCounters,
}

impl SimulationContext {
    /// Create a context with an empty log, a zero balance, and a generator
    /// seeded with `seed`.
    pub fn new(clock: SimClock, seed: u64) -> Self {
        Self {
            clock,
            account: BotAccount::new(),
            log: EventLog::new(),
            rng: StdRng::seed_from_u64(seed),
            counters: IdCounters::new(),
        }
    }

    /// Display timestamp for `tick`.
    pub fn timestamp(&self, tick: u64) -> Timestamp {
        self.clock.timestamp_for_tick(tick)
    }
}
