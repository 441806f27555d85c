//! Shared type definitions for the contest simulator.
//!
//! This crate is the single source of truth for the identifiers, enums,
//! and records that flow between the ledger, the simulation core, and the
//! engine binary.
//!
//! # Modules
//!
//! - [`ids`] -- Counter-backed identifier newtypes
//! - [`enums`] -- Participant kinds, event kinds, settlement results
//! - [`structs`] -- Timestamps, contest entries, and log events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ContestResult, EntryType, EventType};
pub use ids::{ContestId, GameId, ParseParticipantIdError, ParticipantId};
pub use structs::{ContestEvent, Entry, Timestamp};
