//! Bot decision policy: which rank an automated participant plays for.
//!
//! When a bot joins a contest it sees every score already posted. The
//! [`BotPolicy`] trait turns that view, the payout table, and the shared bot
//! balance into a [`BotTarget`]: the score to post, the prize it is aiming
//! at, and the rank that prize belongs to.
//!
//! The default implementation is [`TwoTierPolicy`]. It estimates where the
//! bot pool stands for this contest and picks one of two tiers:
//!
//! 1. `committed_fees = bots_already_in_contest * entry_fee`
//! 2. `expected_win_amount`: sum of payouts for bot-held positions among the
//!    posted scores, ranked descending.
//! 3. `projected_value = balance - committed_fees + expected_win_amount`
//! 4. Below `risk_threshold` the bot plays for rank 1; otherwise rank 2.
//! 5. The bot posts the score at the target position plus a random margin.

use contest_types::Entry;
use rand::RngCore;
use rust_decimal::Decimal;
use tracing::trace;

use crate::config::PolicyConfig;
use crate::scoring;

/// Errors that can occur while deciding a bot target.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// There is no paid rank to aim for.
    #[error("payout table is empty")]
    EmptyPayoutTable,

    /// Value projection left the decimal range.
    #[error("arithmetic overflow while projecting bot value")]
    Overflow,
}

/// What the joining bot has to work with.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    /// Entries currently in the contest, in join order.
    pub entries: &'a [Entry],
    /// Payout per rank, best rank first.
    pub payout_table: &'a [Decimal],
    /// Fee each participant pays on entry.
    pub entry_fee: Decimal,
    /// Shared bot balance before the joining bot pays its fee.
    pub balance: Decimal,
    /// Bots that joined this contest before the one deciding now.
    pub bots_in_contest: usize,
}

/// A bot's decision for one contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotTarget {
    /// Score the bot will post.
    pub score: u32,
    /// Prize the bot is aiming at.
    pub target_win_amount: Decimal,
    /// 1-based rank the prize belongs to.
    pub target_rank: u32,
}

/// Strategy that chooses a bot's target.
///
/// Takes `&mut dyn RngCore` so policies stay object-safe and the
/// scheduler can share its seeded generator.
pub trait BotPolicy {
    /// Decide the target for a bot about to post its score.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if no target can be derived from the input.
    fn decide_target(
        &mut self,
        input: &PolicyInput<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<BotTarget, PolicyError>;
}

/// Plays for first place when the bot pool is losing badly, second otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoTierPolicy {
    /// Projected value below which the bot targets rank 1.
    risk_threshold: Decimal,
    /// Largest margin added over the score to beat.
    max_margin: u32,
}

impl TwoTierPolicy {
    /// Create a policy from explicit parameters.
    pub const fn new(risk_threshold: Decimal, max_margin: u32) -> Self {
        Self {
            risk_threshold,
            max_margin,
        }
    }

    /// Create a policy from configuration.
    pub const fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.risk_threshold, config.max_margin)
    }

    /// Pick the target rank for a projected value.
    ///
    /// With a single paid rank the conservative tier has nothing to aim at,
    /// so both tiers target rank 1.
    fn target_rank(&self, projected: Decimal, paid_ranks: usize) -> u32 {
        if projected < self.risk_threshold || paid_ranks < 2 {
            1
        } else {
            2
        }
    }
}

impl Default for TwoTierPolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl BotPolicy for TwoTierPolicy {
    fn decide_target(
        &mut self,
        input: &PolicyInput<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<BotTarget, PolicyError> {
        if input.payout_table.is_empty() {
            return Err(PolicyError::EmptyPayoutTable);
        }

        let ranking = posted_ranking(input.entries);
        let projected = projected_value(input, &ranking)?;
        let target_rank = self.target_rank(projected, input.payout_table.len());
        let position = usize::try_from(target_rank.saturating_sub(1)).unwrap_or(0);

        let target_win_amount = input
            .payout_table
            .get(position)
            .copied()
            .ok_or(PolicyError::EmptyPayoutTable)?;
        let score_to_beat = ranking.get(position).map_or(0, |e| e.score);
        let score = score_to_beat.saturating_add(scoring::bot_margin(self.max_margin, rng));

        trace!(
            %projected,
            target_rank,
            %target_win_amount,
            score_to_beat,
            score,
            "bot target decided"
        );

        Ok(BotTarget {
            score,
            target_win_amount,
            target_rank,
        })
    }
}

/// Entries with a posted (nonzero) score, best first.
///
/// The sort is stable, so tied scores keep their join order.
pub fn posted_ranking(entries: &[Entry]) -> Vec<&Entry> {
    let mut ranked: Vec<&Entry> = entries.iter().filter(|e| e.score > 0).collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Sum of payouts for bot-held positions in `ranking`.
///
/// # Errors
///
/// Returns [`PolicyError::Overflow`] if the sum leaves the decimal range.
pub fn expected_win_amount(
    ranking: &[&Entry],
    payout_table: &[Decimal],
) -> Result<Decimal, PolicyError> {
    ranking
        .iter()
        .zip(payout_table)
        .filter(|(entry, _)| entry.is_bot())
        .try_fold(Decimal::ZERO, |sum, (_, payout)| {
            sum.checked_add(*payout).ok_or(PolicyError::Overflow)
        })
}

/// `balance - bots_in_contest * entry_fee + expected_win_amount`.
///
/// # Errors
///
/// Returns [`PolicyError::Overflow`] if any step leaves the decimal range.
pub fn projected_value(input: &PolicyInput<'_>, ranking: &[&Entry]) -> Result<Decimal, PolicyError> {
    let committed_fees = Decimal::from(input.bots_in_contest)
        .checked_mul(input.entry_fee)
        .ok_or(PolicyError::Overflow)?;
    let expected = expected_win_amount(ranking, input.payout_table)?;

    input
        .balance
        .checked_sub(committed_fees)
        .and_then(|v| v.checked_add(expected))
        .ok_or(PolicyError::Overflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contest_types::ParticipantId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn human(n: u64, score: u32) -> Entry {
        Entry {
            participant_id: ParticipantId::human(n),
            score,
            joined_at_tick: 0,
        }
    }

    fn bot(n: u64, score: u32) -> Entry {
        Entry {
            participant_id: ParticipantId::bot(n),
            score,
            joined_at_tick: 0,
        }
    }

    fn payouts() -> Vec<Decimal> {
        vec![Decimal::new(25, 0), Decimal::new(10, 0)]
    }

    fn input<'a>(
        entries: &'a [Entry],
        payout_table: &'a [Decimal],
        balance: i64,
        bots_in_contest: usize,
    ) -> PolicyInput<'a> {
        PolicyInput {
            entries,
            payout_table,
            entry_fee: Decimal::new(10, 0),
            balance: Decimal::new(balance, 0),
            bots_in_contest,
        }
    }

    #[test]
    fn losing_pool_targets_first_place() {
        let entries = [human(1, 800), human(2, 200), human(3, 500)];
        let table = payouts();
        let mut policy = TwoTierPolicy::default();
        let mut rng = StdRng::seed_from_u64(5);

        let target = policy
            .decide_target(&input(&entries, &table, -15, 0), &mut rng)
            .unwrap();

        assert_eq!(target.target_rank, 1);
        assert_eq!(target.target_win_amount, Decimal::new(25, 0));
        assert!((801..=810).contains(&target.score));
    }

    #[test]
    fn even_pool_targets_second_place() {
        let entries = [human(1, 800), human(2, 200), human(3, 500)];
        let table = payouts();
        let mut policy = TwoTierPolicy::default();
        let mut rng = StdRng::seed_from_u64(5);

        let target = policy
            .decide_target(&input(&entries, &table, 0, 0), &mut rng)
            .unwrap();

        assert_eq!(target.target_rank, 2);
        assert_eq!(target.target_win_amount, Decimal::new(10, 0));
        assert!((501..=510).contains(&target.score));
    }

    #[test]
    fn threshold_is_strict() {
        let entries = [human(1, 300)];
        let table = payouts();
        let mut policy = TwoTierPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);

        let at_threshold = policy
            .decide_target(&input(&entries, &table, -10, 0), &mut rng)
            .unwrap();
        assert_eq!(at_threshold.target_rank, 2);

        let below = policy
            .decide_target(&input(&entries, &table, -11, 0), &mut rng)
            .unwrap();
        assert_eq!(below.target_rank, 1);
    }

    #[test]
    fn unoccupied_target_rank_beats_zero() {
        let entries = [human(1, 300)];
        let table = payouts();
        let mut policy = TwoTierPolicy::default();
        let mut rng = StdRng::seed_from_u64(9);

        let target = policy
            .decide_target(&input(&entries, &table, 0, 0), &mut rng)
            .unwrap();

        assert_eq!(target.target_rank, 2);
        assert!((1..=10).contains(&target.score));
    }

    #[test]
    fn committed_fees_and_bot_prizes_shift_projection() {
        let entries = [human(1, 900), bot(1, 905), human(2, 100)];
        let table = payouts();
        let ranking = posted_ranking(&entries);

        // Bot 1 holds rank 1, worth 25.
        assert_eq!(
            expected_win_amount(&ranking, &table).unwrap(),
            Decimal::new(25, 0)
        );

        // -20 - 1 * 10 + 25 = -5
        let projected = projected_value(&input(&entries, &table, -20, 1), &ranking).unwrap();
        assert_eq!(projected, Decimal::new(-5, 0));
    }

    #[test]
    fn unposted_scores_are_ignored() {
        let entries = [human(1, 0), human(2, 400), human(3, 0)];
        let ranking = posted_ranking(&entries);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.first().map(|e| e.score), Some(400));
    }

    #[test]
    fn ties_keep_join_order() {
        let entries = [human(1, 500), human(2, 700), human(3, 500)];
        let ranking: Vec<u64> = posted_ranking(&entries)
            .iter()
            .map(|e| e.participant_id.number())
            .collect();
        assert_eq!(ranking, vec![2, 1, 3]);
    }

    #[test]
    fn single_payout_always_targets_first() {
        let entries = [human(1, 250), human(2, 600)];
        let table = vec![Decimal::new(30, 0)];
        let mut policy = TwoTierPolicy::default();
        let mut rng = StdRng::seed_from_u64(2);

        let target = policy
            .decide_target(&input(&entries, &table, 100, 0), &mut rng)
            .unwrap();

        assert_eq!(target.target_rank, 1);
        assert_eq!(target.target_win_amount, Decimal::new(30, 0));
        assert!((601..=610).contains(&target.score));
    }

    #[test]
    fn empty_payout_table_is_an_error() {
        let entries = [human(1, 250)];
        let mut policy = TwoTierPolicy::default();
        let mut rng = StdRng::seed_from_u64(2);

        let result = policy.decide_target(&input(&entries, &[], 0, 0), &mut rng);
        assert!(matches!(result, Err(PolicyError::EmptyPayoutTable)));
    }
}
