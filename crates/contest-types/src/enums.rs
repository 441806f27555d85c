//! Enumeration types for the contest simulator.
//!
//! Participant kinds, event kinds, and settlement results. The serialized
//! forms match the labels written to the exported event table.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Participant kind
// ---------------------------------------------------------------------------

/// The kind of participant that owns a contest entry.
///
/// All automated participants share one economic identity (the bot
/// account), while humans carry no balance in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// A paying human participant. Exported as `user`.
    #[serde(rename = "user")]
    Human,
    /// An automated participant drawing on the shared bot account.
    #[serde(rename = "bot")]
    Bot,
}

impl EntryType {
    /// The label used in exported rows and participant ids.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "user",
            Self::Bot => "bot",
        }
    }

    /// Whether this is an automated participant.
    pub const fn is_bot(self) -> bool {
        matches!(self, Self::Bot)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event kind
// ---------------------------------------------------------------------------

/// The kind of transition recorded in the event log.
///
/// The declaration order is the tie-break order for events that share a
/// timestamp: entries sort before posted scores, which sort before
/// settlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A participant paid the entry fee and joined a contest.
    Entry,
    /// A participant's score was posted.
    ScorePosted,
    /// A participant's final rank and payout were determined.
    Settlement,
}

impl EventType {
    /// Ordering rank among events sharing a timestamp (`entry=1`,
    /// `score_posted=2`, `settlement=3`).
    pub const fn rank(self) -> u8 {
        match self {
            Self::Entry => 1,
            Self::ScorePosted => 2,
            Self::Settlement => 3,
        }
    }

    /// The label used in exported rows.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::ScorePosted => "score_posted",
            Self::Settlement => "settlement",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Settlement result
// ---------------------------------------------------------------------------

/// Outcome of a settled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestResult {
    /// The entry finished inside the payout table.
    Win,
    /// The entry finished outside the payout table.
    Loss,
}

impl ContestResult {
    /// The label used in exported rows.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
        }
    }
}

impl fmt::Display for ContestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
