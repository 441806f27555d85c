//! Type-safe identifier wrappers for contests, games, and participants.
//!
//! Every identifier in the simulator is issued from a process-wide
//! monotonic counter owned by the simulation context. The newtypes here
//! prevent accidental mixing of contest ids, game ids, and participant
//! numbers at compile time.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::EntryType;

/// Generates a newtype wrapper around a `u64` counter value with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the inner counter value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for one contest instance. Never reused.
    ContestId
}

define_id! {
    /// Identifier of the game played in a contest. Strictly increasing
    /// across the whole run.
    GameId
}

/// Identifier of a participant: its kind plus a per-kind sequence number.
///
/// Human and bot numbering are independent, so `user1` and `bot1` may
/// coexist. The display form is the kind's label followed by the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ParticipantId {
    kind: EntryType,
    number: u64,
}

impl ParticipantId {
    /// Create a participant id for a human.
    pub const fn human(number: u64) -> Self {
        Self {
            kind: EntryType::Human,
            number,
        }
    }

    /// Create a participant id for an automated participant.
    pub const fn bot(number: u64) -> Self {
        Self {
            kind: EntryType::Bot,
            number,
        }
    }

    /// The participant kind encoded in this id.
    pub const fn kind(self) -> EntryType {
        self.kind
    }

    /// The per-kind sequence number.
    pub const fn number(self) -> u64 {
        self.number
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.as_str(), self.number)
    }
}

/// Error returned when a string is not a valid participant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseParticipantIdError(String);

impl fmt::Display for ParseParticipantIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid participant id: {:?}", self.0)
    }
}

impl std::error::Error for ParseParticipantIdError {}

impl FromStr for ParticipantId {
    type Err = ParseParticipantIdError;

    /// Accepts only the form [`Display`](fmt::Display) produces: the kind
    /// prefix followed by decimal digits with no sign and no leading zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |digits: &str| {
            let canonical = !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit())
                && (digits == "0" || !digits.starts_with('0'));
            if !canonical {
                return Err(ParseParticipantIdError(s.to_owned()));
            }
            digits
                .parse::<u64>()
                .map_err(|_err| ParseParticipantIdError(s.to_owned()))
        };
        if let Some(digits) = s.strip_prefix(EntryType::Human.as_str()) {
            return parse(digits).map(Self::human);
        }
        if let Some(digits) = s.strip_prefix(EntryType::Bot.as_str()) {
            return parse(digits).map(Self::bot);
        }
        Err(ParseParticipantIdError(s.to_owned()))
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ParseParticipantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
