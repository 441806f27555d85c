//! Event builders and validation for the event log.
//!
//! Provides an [`EventBuilder`] that enforces the shape of each event kind
//! before a [`ContestEvent`] is produced:
//!
//! | Kind | Fee | Win | Rank / result |
//! |------|-----|-----|---------------|
//! | `entry` | allowed | no | no |
//! | `score_posted` | no | no | no |
//! | `settlement` | no | allowed | required |
//!
//! Human rows never carry a balance snapshot or a target win amount.

use rust_decimal::Decimal;

use contest_types::{
    ContestEvent, ContestId, ContestResult, EventType, GameId, ParticipantId, Timestamp,
};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Event builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`ContestEvent`] values.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use contest_ledger::EventBuilder;
/// use contest_types::{ContestId, EventType, GameId, ParticipantId, Timestamp};
/// use rust_decimal::Decimal;
///
/// let event = EventBuilder::new(0, Timestamp(Utc::now()), EventType::Entry)
///     .contest(ContestId(1), GameId(1))
///     .participant(ParticipantId::human(1))
///     .entry_fee(Decimal::new(10, 0))
///     .build();
///
/// assert!(event.is_ok());
/// ```
#[derive(Debug)]
pub struct EventBuilder {
    tick: u64,
    timestamp: Timestamp,
    event_type: EventType,
    contest: Option<(ContestId, GameId)>,
    participant_id: Option<ParticipantId>,
    account_balance: Decimal,
    entry_fee_paid: Decimal,
    win_amount: Decimal,
    target_win_amount: Decimal,
    score: u32,
    placement: Option<(u32, ContestResult)>,
}

impl EventBuilder {
    /// Start building an event of the given kind at the given tick.
    pub const fn new(tick: u64, timestamp: Timestamp, event_type: EventType) -> Self {
        Self {
            tick,
            timestamp,
            event_type,
            contest: None,
            participant_id: None,
            account_balance: Decimal::ZERO,
            entry_fee_paid: Decimal::ZERO,
            win_amount: Decimal::ZERO,
            target_win_amount: Decimal::ZERO,
            score: 0,
            placement: None,
        }
    }

    /// Set the contest and game the event belongs to.
    #[must_use]
    pub const fn contest(mut self, contest_id: ContestId, game_id: GameId) -> Self {
        self.contest = Some((contest_id, game_id));
        self
    }

    /// Set the participant the event concerns.
    #[must_use]
    pub const fn participant(mut self, participant_id: ParticipantId) -> Self {
        self.participant_id = Some(participant_id);
        self
    }

    /// Set the bot account balance snapshot.
    #[must_use]
    pub const fn account_balance(mut self, balance: Decimal) -> Self {
        self.account_balance = balance;
        self
    }

    /// Set the entry fee paid with this event.
    #[must_use]
    pub const fn entry_fee(mut self, fee: Decimal) -> Self {
        self.entry_fee_paid = fee;
        self
    }

    /// Set the payout awarded with this event.
    #[must_use]
    pub const fn win_amount(mut self, amount: Decimal) -> Self {
        self.win_amount = amount;
        self
    }

    /// Set the payout a bot is aiming for.
    #[must_use]
    pub const fn target_win_amount(mut self, amount: Decimal) -> Self {
        self.target_win_amount = amount;
        self
    }

    /// Set the score carried by the event.
    #[must_use]
    pub const fn score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    /// Set the final rank and result (settlement events only).
    #[must_use]
    pub const fn placement(mut self, rank: u32, result: ContestResult) -> Self {
        self.placement = Some((rank, result));
        self
    }

    /// Validate inputs and produce a [`ContestEvent`].
    ///
    /// The transaction id is left at 0; it is assigned when the log is
    /// finalized.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if the contest, participant,
    /// or (for settlements) placement is not set.
    /// Returns [`LedgerError::NegativeAmount`] for a negative fee, win, or
    /// target amount.
    /// Returns [`LedgerError::MisplacedField`] if a field is set on an event
    /// kind that does not carry it.
    /// Returns [`LedgerError::HumanBalanceField`] if a human row carries a
    /// balance snapshot or target amount.
    pub fn build(self) -> Result<ContestEvent, LedgerError> {
        let (contest_id, game_id) = self.contest.ok_or(LedgerError::MissingField("contest"))?;
        let participant_id = self
            .participant_id
            .ok_or(LedgerError::MissingField("participant"))?;

        check_non_negative("entry fee", self.entry_fee_paid)?;
        check_non_negative("win amount", self.win_amount)?;
        check_non_negative("target win amount", self.target_win_amount)?;

        validate_shape(self.event_type, self.entry_fee_paid, self.win_amount, self.placement)?;

        if !participant_id.kind().is_bot() {
            if !self.account_balance.is_zero() {
                return Err(LedgerError::HumanBalanceField {
                    participant_id,
                    field: "account balance",
                });
            }
            if !self.target_win_amount.is_zero() {
                return Err(LedgerError::HumanBalanceField {
                    participant_id,
                    field: "target win amount",
                });
            }
        }

        let (rank, result) = match self.placement {
            Some((rank, result)) => (rank, Some(result)),
            None => (0, None),
        };

        Ok(ContestEvent {
            transaction_id: 0,
            game_id,
            contest_id,
            entry_type: participant_id.kind(),
            participant_id,
            event_type: self.event_type,
            tick: self.tick,
            timestamp: self.timestamp,
            account_balance: self.account_balance,
            entry_fee_paid: self.entry_fee_paid,
            win_amount: self.win_amount,
            target_win_amount: self.target_win_amount,
            score: self.score,
            rank,
            result,
        })
    }
}

fn check_non_negative(field: &'static str, amount: Decimal) -> Result<(), LedgerError> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount { field, amount });
    }
    Ok(())
}

/// Validate that only the fields carried by `event_type` are set.
fn validate_shape(
    event_type: EventType,
    entry_fee_paid: Decimal,
    win_amount: Decimal,
    placement: Option<(u32, ContestResult)>,
) -> Result<(), LedgerError> {
    let misplaced = |field| LedgerError::MisplacedField { event_type, field };

    match event_type {
        EventType::Entry | EventType::ScorePosted => {
            if !win_amount.is_zero() {
                return Err(misplaced("win amount"));
            }
            if placement.is_some() {
                return Err(misplaced("placement"));
            }
            if event_type == EventType::ScorePosted && !entry_fee_paid.is_zero() {
                return Err(misplaced("entry fee"));
            }
        }
        EventType::Settlement => {
            if !entry_fee_paid.is_zero() {
                return Err(misplaced("entry fee"));
            }
            match placement {
                None => return Err(LedgerError::MissingField("placement")),
                Some((0, _)) => return Err(misplaced("rank 0")),
                Some((_, ContestResult::Loss)) if !win_amount.is_zero() => {
                    return Err(misplaced("win amount"));
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}
