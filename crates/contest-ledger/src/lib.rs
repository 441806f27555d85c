//! Bot account, append-only event log, and settlement audit for the
//! contest simulator.
//!
//! Every financial or state transition in a run -- a participant paying
//! in, a score being posted, a contest paying out -- is recorded here as an
//! immutable [`ContestEvent`]. Events are never modified once appended;
//! the only derived property, the transaction id, is assigned when the log
//! is finalized at the end of the run.
//!
//! # Architecture
//!
//! - [`account`] -- The [`BotAccount`]: the single running balance shared by
//!   every automated participant.
//! - [`ledger`] -- The [`EventLog`]: append-only log, finalization into a
//!   globally ordered [`FinalizedLog`].
//! - [`transaction`] -- The [`EventBuilder`] for validated event construction.
//! - [`audit`] -- Post-run invariant checks over a finalized log.
//! - [`export`] -- Tabular (CSV) and JSON-lines writers.
//!
//! # Ordering
//!
//! A finalized log is sorted by `(timestamp, event kind rank)` where
//! `entry < score_posted < settlement`, then numbered from 1. Same-tick
//! events keep their append order within a kind.
//!
//! # Usage
//!
//! ```
//! use contest_ledger::{BotAccount, EventLog};
//!
//! let mut account = BotAccount::new();
//! account.debit_fee(rust_decimal::Decimal::new(10, 0)).ok();
//! assert_eq!(account.balance(), rust_decimal::Decimal::new(-10, 0));
//!
//! let log = EventLog::new();
//! let finalized = log.finalize();
//! assert!(finalized.is_empty());
//! ```
//!
//! [`ContestEvent`]: contest_types::ContestEvent

pub mod account;
pub mod audit;
pub mod export;
pub mod ledger;
pub mod transaction;

// Re-export primary types at crate root.
pub use account::BotAccount;
pub use audit::{AuditParams, AuditResult};
pub use ledger::{EventLog, FinalizedLog};
pub use transaction::EventBuilder;

use rust_decimal::Decimal;

use contest_types::{ContestId, EventType, ParticipantId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording events or moving bot funds.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A monetary amount that must be non-negative was negative.
    #[error("{field} must not be negative, got {amount}")]
    NegativeAmount {
        /// Which amount was invalid.
        field: &'static str,
        /// The invalid amount.
        amount: Decimal,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field was set on an event kind that does not carry it.
    #[error("{field} is not allowed on {event_type} events")]
    MisplacedField {
        /// The event kind being built.
        event_type: EventType,
        /// The field that does not belong.
        field: &'static str,
    },

    /// A human row carried bot-only data (balance or target).
    #[error("{field} must be zero for human participant {participant_id}")]
    HumanBalanceField {
        /// The human participant.
        participant_id: ParticipantId,
        /// The bot-only field that was set.
        field: &'static str,
    },

    /// The bot balance would overflow the decimal range.
    #[error("bot account balance overflow")]
    BalanceOverflow,

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// Which audit check produced an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuditCheck {
    /// Events are not in `(timestamp, kind)` order or ids are not `1..=n`.
    Ordering,
    /// A contest's ranks or win count are wrong.
    Settlement,
    /// A participant was settled more than once in the same contest.
    DoubleSettlement,
    /// A bot's post-fee balance does not follow from its pre-fee balance.
    FeeTrail,
    /// The closing bot balance does not equal opening - fees + winnings.
    BalanceTrail,
}

/// An invariant violation detected while auditing a finalized log.
///
/// Invariant violations indicate a logic defect in the simulator, not an
/// external fault. The engine reports every anomaly and fails the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The check that failed.
    pub check: AuditCheck,
    /// The contest involved, when the violation is contest-scoped.
    pub contest_id: Option<ContestId>,
    /// The transaction id of the offending event, when there is one.
    pub transaction_id: Option<u64>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
