//! The contest state machine.
//!
//! A contest moves through three phases:
//!
//! ```text
//! Accepting --(last seat taken)--> FullPendingSettlement --(settle)--> Settled
//! ```
//!
//! and is then replaced by the scheduler with a brand-new contest. Humans
//! join on a jittered arrival schedule and post their score at once; bots
//! join on a fixed stagger after the first human and consult a
//! [`BotPolicy`] before posting. Settlement goes through one idempotent
//! operation, [`Contest::settle_if_needed`], so a contest can never pay out
//! twice.

use contest_ledger::{EventBuilder, LedgerError};
use contest_types::{ContestId, ContestResult, Entry, EventType, GameId, ParticipantId};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::config::{ContestConfig, ScoringConfig};
use crate::context::SimulationContext;
use crate::policy::{BotPolicy, PolicyError, PolicyInput};
use crate::scoring;

/// Tick offset from a contest's start at which a contest found full but
/// unsettled at respawn time is settled.
pub const LAZY_SETTLEMENT_OFFSET: u64 = 10;

/// Errors raised by contest operations.
#[derive(Debug, thiserror::Error)]
pub enum ContestError {
    /// An admission would exceed the contest size.
    #[error("contest {contest_id} is full ({size} seats)")]
    CapacityExceeded {
        /// The contest that is full.
        contest_id: ContestId,
        /// Its seat count.
        size: usize,
    },

    /// Settlement was requested before every seat was taken.
    #[error("contest {contest_id} cannot settle with {entries} of {size} seats taken")]
    NotFull {
        /// The contest that is not full.
        contest_id: ContestId,
        /// Seats taken.
        entries: usize,
        /// Seat count.
        size: usize,
    },

    /// An id counter ran out of values.
    #[error("{counter} id counter exhausted")]
    CounterOverflow {
        /// Which counter overflowed.
        counter: &'static str,
    },

    /// Recording an event or moving bot funds failed.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// The bot policy could not decide.
    #[error("bot policy error: {source}")]
    Policy {
        /// The underlying policy error.
        #[from]
        source: PolicyError,
    },
}

/// Lifecycle phase of a contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestPhase {
    /// Seats are still open.
    Accepting,
    /// Every seat is taken; payouts have not run.
    FullPendingSettlement,
    /// Payouts have run. The contest is waiting to be replaced.
    Settled,
}

/// Fixed parameters shared by every contest in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestRules {
    /// Seats per contest.
    pub size: usize,
    /// Fee every participant pays on entry.
    pub entry_fee: Decimal,
    /// Payout per rank, best rank first.
    pub payout_table: Vec<Decimal>,
    /// Maximum bots per contest.
    pub max_bots: usize,
}

impl ContestRules {
    /// Build rules from configuration.
    pub fn from_config(config: &ContestConfig) -> Self {
        Self {
            size: config.size,
            entry_fee: config.entry_fee,
            payout_table: config.payout_table.clone(),
            max_bots: config.max_bots,
        }
    }

    /// Seats humans may take; at least one is always left for a bot.
    pub const fn max_humans(&self) -> usize {
        self.size.saturating_sub(1)
    }
}

impl Default for ContestRules {
    fn default() -> Self {
        Self::from_config(&ContestConfig::default())
    }
}

/// One contest instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    id: ContestId,
    game_id: GameId,
    start_tick: u64,
    entries: Vec<Entry>,
    bots_joined: usize,
    humans_joined: usize,
    next_human_arrival: u64,
    is_full: bool,
    is_settled: bool,
}

impl Contest {
    /// Create an empty contest starting at `start_tick`.
    ///
    /// The first human may arrive at `start_tick`.
    pub const fn new(id: ContestId, game_id: GameId, start_tick: u64) -> Self {
        Self {
            id,
            game_id,
            start_tick,
            entries: Vec::new(),
            bots_joined: 0,
            humans_joined: 0,
            next_human_arrival: start_tick,
            is_full: false,
            is_settled: false,
        }
    }

    /// Create an empty contest with fresh ids from the context counters.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::CounterOverflow`] if the id counters are
    /// exhausted.
    pub fn open(ctx: &mut SimulationContext, start_tick: u64) -> Result<Self, ContestError> {
        let (id, game_id) = ctx.counters.next_contest()?;
        debug!(contest_id = %id, game_id = %game_id, start_tick, "contest opened");
        Ok(Self::new(id, game_id, start_tick))
    }

    /// Contest identifier.
    pub const fn id(&self) -> ContestId {
        self.id
    }

    /// Game identifier.
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Tick the contest was opened at.
    pub const fn start_tick(&self) -> u64 {
        self.start_tick
    }

    /// Entries in join order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Bots admitted so far.
    pub const fn bots_joined(&self) -> usize {
        self.bots_joined
    }

    /// Humans admitted so far.
    pub const fn humans_joined(&self) -> usize {
        self.humans_joined
    }

    /// Earliest tick the next human may arrive.
    pub const fn next_human_arrival(&self) -> u64 {
        self.next_human_arrival
    }

    /// Whether every seat is taken.
    pub const fn is_full(&self) -> bool {
        self.is_full
    }

    /// Whether payouts have run.
    pub const fn is_settled(&self) -> bool {
        self.is_settled
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> ContestPhase {
        if self.is_settled {
            ContestPhase::Settled
        } else if self.is_full {
            ContestPhase::FullPendingSettlement
        } else {
            ContestPhase::Accepting
        }
    }

    /// Whether the contest should be replaced by the scheduler.
    pub const fn is_finished(&self) -> bool {
        self.is_full || self.is_settled
    }

    /// Whether a human may join at `tick`.
    pub fn can_admit_human(&self, rules: &ContestRules, tick: u64) -> bool {
        !self.is_full
            && self.entries.len() < rules.size
            && self.humans_joined < rules.max_humans()
            && tick >= self.next_human_arrival
    }

    /// Whether a bot may join at `tick`.
    ///
    /// Bots wait for the first human and then join one tick per seat
    /// already taken after the contest start.
    pub fn can_admit_bot(&self, rules: &ContestRules, tick: u64) -> bool {
        let stagger = u64::try_from(self.entries.len())
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        !self.is_full
            && self.entries.len() < rules.size
            && self.humans_joined > 0
            && self.bots_joined < rules.max_bots
            && tick >= self.start_tick.saturating_add(stagger)
    }

    /// Admit a human with a sampled score and schedule the next arrival.
    ///
    /// # Errors
    ///
    /// See [`Contest::admit_human_with_score`].
    pub fn admit_human(
        &mut self,
        ctx: &mut SimulationContext,
        rules: &ContestRules,
        scoring_config: &ScoringConfig,
        tick: u64,
    ) -> Result<ParticipantId, ContestError> {
        let score = scoring::random_human_score(scoring_config, &mut ctx.rng);
        let next_arrival = scoring::next_human_arrival(scoring_config, tick, &mut ctx.rng);
        self.admit_human_with_score(ctx, rules, tick, score, next_arrival)
    }

    /// Admit a human with a known score and next arrival tick.
    ///
    /// Records an `entry` row carrying the fee, then a `score_posted` row
    /// carrying the score, both at `tick`.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::CapacityExceeded`] if the contest is full,
    /// or a ledger or counter error if recording fails.
    pub fn admit_human_with_score(
        &mut self,
        ctx: &mut SimulationContext,
        rules: &ContestRules,
        tick: u64,
        score: u32,
        next_arrival: u64,
    ) -> Result<ParticipantId, ContestError> {
        self.ensure_capacity(rules)?;
        let participant_id = ctx.counters.next_human()?;
        let timestamp = ctx.timestamp(tick);

        ctx.log.record(
            EventBuilder::new(tick, timestamp, EventType::Entry)
                .contest(self.id, self.game_id)
                .participant(participant_id)
                .entry_fee(rules.entry_fee),
        )?;
        ctx.log.record(
            EventBuilder::new(tick, timestamp, EventType::ScorePosted)
                .contest(self.id, self.game_id)
                .participant(participant_id)
                .score(score),
        )?;

        self.entries.push(Entry {
            participant_id,
            score,
            joined_at_tick: tick,
        });
        self.humans_joined = self.humans_joined.saturating_add(1);
        self.next_human_arrival = next_arrival;

        trace!(
            contest_id = %self.id,
            participant_id = %participant_id,
            score,
            next_arrival,
            "human joined"
        );
        Ok(participant_id)
    }

    /// Admit a bot: consult the policy, pay the fee, post the score.
    ///
    /// The `entry` row carries the balance before the fee and the
    /// `score_posted` row the balance after it. Both carry the target prize.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::CapacityExceeded`] if the contest is full,
    /// or a policy, ledger, or counter error.
    pub fn admit_bot(
        &mut self,
        ctx: &mut SimulationContext,
        rules: &ContestRules,
        policy: &mut dyn BotPolicy,
        tick: u64,
    ) -> Result<ParticipantId, ContestError> {
        self.ensure_capacity(rules)?;
        let bots_before = self.bots_joined;
        self.bots_joined = self.bots_joined.saturating_add(1);
        let participant_id = ctx.counters.next_bot()?;

        let balance_before = ctx.account.balance();
        let input = PolicyInput {
            entries: &self.entries,
            payout_table: &rules.payout_table,
            entry_fee: rules.entry_fee,
            balance: balance_before,
            bots_in_contest: bots_before,
        };
        let target = policy.decide_target(&input, &mut ctx.rng)?;
        let timestamp = ctx.timestamp(tick);

        ctx.log.record(
            EventBuilder::new(tick, timestamp, EventType::Entry)
                .contest(self.id, self.game_id)
                .participant(participant_id)
                .account_balance(balance_before)
                .entry_fee(rules.entry_fee)
                .target_win_amount(target.target_win_amount),
        )?;
        let balance_after = ctx.account.debit_fee(rules.entry_fee)?;
        ctx.log.record(
            EventBuilder::new(tick, timestamp, EventType::ScorePosted)
                .contest(self.id, self.game_id)
                .participant(participant_id)
                .account_balance(balance_after)
                .target_win_amount(target.target_win_amount)
                .score(target.score),
        )?;

        self.entries.push(Entry {
            participant_id,
            score: target.score,
            joined_at_tick: tick,
        });

        trace!(
            contest_id = %self.id,
            participant_id = %participant_id,
            score = target.score,
            target_rank = target.target_rank,
            balance = %balance_after,
            "bot joined"
        );
        Ok(participant_id)
    }

    /// Mark the contest full once every seat is taken. Returns `true` on
    /// the transition.
    pub fn mark_full_if_complete(&mut self, rules: &ContestRules) -> bool {
        if !self.is_full && self.entries.len() >= rules.size {
            self.is_full = true;
            return true;
        }
        false
    }

    /// Settle the contest at `tick` unless it has already been settled.
    ///
    /// Entries are ranked by score, best first, ties keeping join order.
    /// Positions inside the payout table win their payout; bot prizes are
    /// credited to the shared account in rank order. Every entry gets one
    /// `settlement` row. Returns `true` if payouts ran, `false` if the
    /// contest was already settled.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::NotFull`] if seats are still open, or a
    /// ledger error if recording or crediting fails.
    pub fn settle_if_needed(
        &mut self,
        ctx: &mut SimulationContext,
        rules: &ContestRules,
        tick: u64,
    ) -> Result<bool, ContestError> {
        if self.is_settled {
            return Ok(false);
        }
        if !self.is_full {
            return Err(ContestError::NotFull {
                contest_id: self.id,
                entries: self.entries.len(),
                size: rules.size,
            });
        }

        let timestamp = ctx.timestamp(tick);
        let mut ranked: Vec<&Entry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        for (rank, (position, entry)) in (1_u32..).zip(ranked.into_iter().enumerate()) {
            let payout = rules.payout_table.get(position).copied();
            let (result, win_amount) = match payout {
                Some(amount) => (ContestResult::Win, amount),
                None => (ContestResult::Loss, Decimal::ZERO),
            };

            let balance = if !entry.is_bot() {
                Decimal::ZERO
            } else if result == ContestResult::Win {
                ctx.account.credit_winnings(win_amount)?
            } else {
                ctx.account.balance()
            };

            ctx.log.record(
                EventBuilder::new(tick, timestamp, EventType::Settlement)
                    .contest(self.id, self.game_id)
                    .participant(entry.participant_id)
                    .account_balance(balance)
                    .win_amount(win_amount)
                    .score(entry.score)
                    .placement(rank, result),
            )?;
        }

        self.is_settled = true;
        debug!(
            contest_id = %self.id,
            game_id = %self.game_id,
            tick,
            balance = %ctx.account.balance(),
            "contest settled"
        );
        Ok(true)
    }

    fn ensure_capacity(&self, rules: &ContestRules) -> Result<(), ContestError> {
        if self.is_full || self.entries.len() >= rules.size {
            return Err(ContestError::CapacityExceeded {
                contest_id: self.id,
                size: rules.size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use contest_types::EntryType;
    use rand::RngCore;

    use super::*;
    use crate::clock::SimClock;
    use crate::policy::{BotTarget, TwoTierPolicy};

    fn context() -> SimulationContext {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        SimulationContext::new(SimClock::from_parts(0, start, 1).unwrap(), 42)
    }

    /// Posts a fixed score regardless of input.
    struct FixedPolicy(u32);

    impl BotPolicy for FixedPolicy {
        fn decide_target(
            &mut self,
            input: &PolicyInput<'_>,
            _rng: &mut dyn RngCore,
        ) -> Result<BotTarget, PolicyError> {
            Ok(BotTarget {
                score: self.0,
                target_win_amount: input.payout_table.first().copied().unwrap_or_default(),
                target_rank: 1,
            })
        }
    }

    fn filled(ctx: &mut SimulationContext, rules: &ContestRules, bot_score: u32) -> Contest {
        let mut contest = Contest::open(ctx, 0).unwrap();
        for (tick, score) in [(0, 800), (1, 200), (2, 500)] {
            contest
                .admit_human_with_score(ctx, rules, tick, score, tick)
                .unwrap();
        }
        contest
            .admit_bot(ctx, rules, &mut FixedPolicy(bot_score), 4)
            .unwrap();
        contest
    }

    #[test]
    fn new_contest_is_accepting() {
        let contest = Contest::new(ContestId(3), GameId(3), 7);
        assert_eq!(contest.phase(), ContestPhase::Accepting);
        assert_eq!(contest.next_human_arrival(), 7);
        assert!(!contest.is_finished());
    }

    #[test]
    fn humans_leave_a_seat_for_bots() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        for tick in 0..3 {
            assert!(contest.can_admit_human(&rules, tick));
            contest
                .admit_human_with_score(&mut ctx, &rules, tick, 100, tick)
                .unwrap();
        }
        assert!(!contest.can_admit_human(&rules, 10));
        assert_eq!(contest.humans_joined(), 3);
    }

    #[test]
    fn human_waits_for_scheduled_arrival() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        contest
            .admit_human_with_score(&mut ctx, &rules, 0, 100, 2)
            .unwrap();
        assert!(!contest.can_admit_human(&rules, 1));
        assert!(contest.can_admit_human(&rules, 2));
    }

    #[test]
    fn bots_wait_for_first_human_and_stagger() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        assert!(!contest.can_admit_bot(&rules, 50));

        contest
            .admit_human_with_score(&mut ctx, &rules, 0, 100, 5)
            .unwrap();
        // One seat taken: start + 1 + 1.
        assert!(!contest.can_admit_bot(&rules, 1));
        assert!(contest.can_admit_bot(&rules, 2));
    }

    #[test]
    fn bot_cap_is_respected() {
        let mut ctx = context();
        let rules = ContestRules {
            size: 6,
            max_bots: 1,
            ..ContestRules::default()
        };
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        contest
            .admit_human_with_score(&mut ctx, &rules, 0, 100, 0)
            .unwrap();
        contest
            .admit_bot(&mut ctx, &rules, &mut FixedPolicy(5), 2)
            .unwrap();
        assert!(!contest.can_admit_bot(&rules, 100));
    }

    #[test]
    fn human_admission_records_fee_then_score() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        let human = contest
            .admit_human_with_score(&mut ctx, &rules, 3, 420, 4)
            .unwrap();

        let rows = ctx.log.events();
        assert_eq!(rows.len(), 2);
        let entry = rows.first().unwrap();
        let posted = rows.get(1).unwrap();

        assert_eq!(entry.event_type, EventType::Entry);
        assert_eq!(entry.participant_id, human);
        assert_eq!(entry.entry_type, EntryType::Human);
        assert_eq!(entry.tick, 3);
        assert_eq!(entry.timestamp, ctx.clock.timestamp_for_tick(3));
        assert_eq!(entry.entry_fee_paid, Decimal::new(10, 0));
        assert_eq!(entry.score, 0);
        assert_eq!(entry.account_balance, Decimal::ZERO);
        assert_eq!(entry.result, None);

        assert_eq!(posted.event_type, EventType::ScorePosted);
        assert_eq!(posted.participant_id, human);
        assert_eq!(posted.tick, 3);
        assert_eq!(posted.timestamp, entry.timestamp);
        assert_eq!(posted.entry_fee_paid, Decimal::ZERO);
        assert_eq!(posted.score, 420);
        assert_eq!(posted.rank, 0);

        contest
            .admit_bot(&mut ctx, &rules, &mut FixedPolicy(430), 5)
            .unwrap();
        let bot_rows: Vec<_> = ctx.log.events().iter().skip(2).collect();
        assert_eq!(bot_rows.len(), 2);
        let bot_entry = bot_rows.first().unwrap();
        let bot_posted = bot_rows.get(1).unwrap();
        assert_eq!(bot_entry.event_type, EventType::Entry);
        assert_eq!(bot_entry.score, 0);
        assert_eq!(bot_entry.entry_fee_paid, Decimal::new(10, 0));
        assert_eq!(bot_posted.event_type, EventType::ScorePosted);
        assert_eq!(bot_posted.score, 430);
        assert_eq!(bot_posted.entry_fee_paid, Decimal::ZERO);
    }

    #[test]
    fn bot_entry_rows_bracket_the_fee() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        contest
            .admit_human_with_score(&mut ctx, &rules, 0, 300, 0)
            .unwrap();
        contest
            .admit_bot(&mut ctx, &rules, &mut TwoTierPolicy::default(), 2)
            .unwrap();

        let bot_rows: Vec<_> = ctx
            .log
            .events()
            .iter()
            .filter(|e| e.entry_type == EntryType::Bot)
            .collect();
        assert_eq!(bot_rows.len(), 2);
        let entry = bot_rows.first().unwrap();
        let posted = bot_rows.get(1).unwrap();
        assert_eq!(entry.event_type, EventType::Entry);
        assert_eq!(entry.account_balance, Decimal::ZERO);
        assert_eq!(entry.entry_fee_paid, Decimal::new(10, 0));
        assert_eq!(posted.event_type, EventType::ScorePosted);
        assert_eq!(posted.account_balance, Decimal::new(-10, 0));
        assert_eq!(posted.target_win_amount, entry.target_win_amount);
        assert_eq!(ctx.account.balance(), Decimal::new(-10, 0));
    }

    #[test]
    fn settlement_ranks_and_pays() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = filled(&mut ctx, &rules, 805);
        assert!(contest.mark_full_if_complete(&rules));
        assert_eq!(contest.phase(), ContestPhase::FullPendingSettlement);

        assert!(contest.settle_if_needed(&mut ctx, &rules, 4).unwrap());
        assert_eq!(contest.phase(), ContestPhase::Settled);

        let settlements: Vec<_> = ctx
            .log
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::Settlement)
            .map(|e| (e.participant_id.to_string(), e.rank, e.result, e.win_amount))
            .collect();
        assert_eq!(
            settlements,
            vec![
                ("bot1".to_owned(), 1, Some(ContestResult::Win), Decimal::new(25, 0)),
                ("user1".to_owned(), 2, Some(ContestResult::Win), Decimal::new(10, 0)),
                ("user3".to_owned(), 3, Some(ContestResult::Loss), Decimal::ZERO),
                ("user2".to_owned(), 4, Some(ContestResult::Loss), Decimal::ZERO),
            ]
        );
        // -10 fee + 25 prize.
        assert_eq!(ctx.account.balance(), Decimal::new(15, 0));
    }

    #[test]
    fn losing_bot_settles_at_current_balance() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = filled(&mut ctx, &rules, 50);
        contest.mark_full_if_complete(&rules);
        contest.settle_if_needed(&mut ctx, &rules, 4).unwrap();

        let bot_settlement = ctx
            .log
            .events()
            .iter()
            .find(|e| e.event_type == EventType::Settlement && e.entry_type == EntryType::Bot)
            .unwrap();
        assert_eq!(bot_settlement.rank, 4);
        assert_eq!(bot_settlement.account_balance, Decimal::new(-10, 0));
        assert_eq!(ctx.account.balance(), Decimal::new(-10, 0));
    }

    #[test]
    fn settlement_is_idempotent() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = filled(&mut ctx, &rules, 805);
        contest.mark_full_if_complete(&rules);

        assert!(contest.settle_if_needed(&mut ctx, &rules, 4).unwrap());
        let events_after_first = ctx.log.len();
        let balance_after_first = ctx.account.balance();

        assert!(!contest.settle_if_needed(&mut ctx, &rules, 10).unwrap());
        assert_eq!(ctx.log.len(), events_after_first);
        assert_eq!(ctx.account.balance(), balance_after_first);
    }

    #[test]
    fn cannot_settle_open_contest() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = Contest::open(&mut ctx, 0).unwrap();
        let result = contest.settle_if_needed(&mut ctx, &rules, 0);
        assert!(matches!(result, Err(ContestError::NotFull { .. })));
    }

    #[test]
    fn full_contest_rejects_admission() {
        let mut ctx = context();
        let rules = ContestRules::default();
        let mut contest = filled(&mut ctx, &rules, 1);
        contest.mark_full_if_complete(&rules);
        let result = contest.admit_human_with_score(&mut ctx, &rules, 9, 10, 9);
        assert!(matches!(result, Err(ContestError::CapacityExceeded { .. })));
        assert_eq!(contest.entries().len(), 4);
    }
}
