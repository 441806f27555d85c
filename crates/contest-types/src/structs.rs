//! Core record types: timestamps, contest entries, and log events.

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::enums::{ContestResult, EntryType, EventType};
use crate::ids::{ContestId, GameId, ParticipantId};

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A display timestamp derived from a simulation tick.
///
/// Renders as RFC 3339 with millisecond precision and a `Z` suffix, e.g.
/// `2025-01-01T00:03:00.000Z`. Ordering follows the underlying instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Return the inner instant.
    pub const fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

// ---------------------------------------------------------------------------
// Contest entry
// ---------------------------------------------------------------------------

/// One participant's seat in a contest.
///
/// Owned exclusively by its contest and discarded when the contest is
/// replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Who holds the seat. The id also encodes the participant kind.
    pub participant_id: ParticipantId,
    /// Posted score. Zero until posted.
    pub score: u32,
    /// Tick at which the participant joined.
    pub joined_at_tick: u64,
}

impl Entry {
    /// Whether this seat is held by an automated participant.
    pub const fn is_bot(&self) -> bool {
        self.participant_id.kind().is_bot()
    }
}

// ---------------------------------------------------------------------------
// Log event
// ---------------------------------------------------------------------------

/// An immutable record of one financial or state transition.
///
/// `transaction_id` stays 0 while the run is in progress; it is assigned
/// as the 1-based position in the globally sorted log once the run ends.
/// Field order matches the exported column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestEvent {
    /// Position in the finalized log, 0 until assigned.
    pub transaction_id: u64,
    /// Game played in the contest.
    pub game_id: GameId,
    /// Contest the event belongs to.
    pub contest_id: ContestId,
    /// Kind of participant the event concerns.
    pub entry_type: EntryType,
    /// Participant the event concerns.
    pub participant_id: ParticipantId,
    /// Kind of transition.
    pub event_type: EventType,
    /// Tick the event was recorded for. Not exported.
    #[serde(skip)]
    pub tick: u64,
    /// Display timestamp derived from `tick`.
    pub timestamp: Timestamp,
    /// Bot account balance snapshot. Zero for humans.
    pub account_balance: Decimal,
    /// Entry fee paid with this event.
    pub entry_fee_paid: Decimal,
    /// Payout awarded with this event.
    pub win_amount: Decimal,
    /// Payout the bot aimed for. Zero for humans and settlements.
    pub target_win_amount: Decimal,
    /// Score carried by this event (0 on `entry` rows).
    pub score: u32,
    /// Final rank, 0 until settlement.
    pub rank: u32,
    /// Settlement result, absent on non-settlement rows.
    pub result: Option<ContestResult>,
}

impl ContestEvent {
    /// Sort key for global ordering: timestamp first, then event kind rank.
    pub const fn order_key(&self) -> (Timestamp, u8) {
        (self.timestamp, self.event_type.rank())
    }
}
