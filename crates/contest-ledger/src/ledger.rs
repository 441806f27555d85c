//! The event log: an append-only record of every contest transition.
//!
//! The [`EventLog`] is the in-memory log for the current run. Events are
//! appended in the order the simulation produces them, which interleaves
//! contests and is not globally time-ordered. [`EventLog::finalize`]
//! consumes the log into a [`FinalizedLog`]: stably sorted by
//! `(timestamp, event kind rank)` and numbered from 1.
//!
//! # Design
//!
//! - **Append-only**: events are never modified or deleted.
//! - **Derived ids**: transaction ids exist only on the finalized log.
//! - **Precision**: all amounts use [`Decimal`] -- no floating point.
//!
//! [`Decimal`]: rust_decimal::Decimal

use contest_types::{ContestEvent, ContestId};
use tracing::debug;

use crate::{EventBuilder, LedgerError};

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only log of contest events for a run in progress.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    /// All events, in append order.
    events: Vec<ContestEvent>,
}

impl EventLog {
    /// Create a new empty log.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Return the number of events in the log.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Return whether the log has no events.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Build, validate, and append an event.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the event fails validation; nothing is
    /// appended in that case.
    pub fn record(&mut self, builder: EventBuilder) -> Result<&ContestEvent, LedgerError> {
        let event = builder.build()?;
        self.events.push(event);

        // Return a reference to the event we just pushed.
        self.events.last().ok_or(LedgerError::InternalError(
            "failed to retrieve event after append",
        ))
    }

    /// All events in append order.
    pub fn events(&self) -> &[ContestEvent] {
        &self.events
    }

    /// Events recorded at the given tick, in append order.
    pub fn events_for_tick(&self, tick: u64) -> Vec<&ContestEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Events belonging to the given contest, in append order.
    pub fn events_for_contest(&self, contest_id: ContestId) -> Vec<&ContestEvent> {
        self.events
            .iter()
            .filter(|e| e.contest_id == contest_id)
            .collect()
    }

    /// Sort the log globally and assign transaction ids.
    ///
    /// Events are ordered by timestamp, then by event kind rank
    /// (`entry < score_posted < settlement`). The sort is stable, so events
    /// with equal keys keep their append order. Transaction ids are the
    /// 1-based positions in the sorted sequence.
    pub fn finalize(self) -> FinalizedLog {
        let mut events = self.events;
        events.sort_by_key(ContestEvent::order_key);

        for (transaction_id, event) in (1_u64..).zip(events.iter_mut()) {
            event.transaction_id = transaction_id;
        }

        debug!(events = events.len(), "event log finalized");
        FinalizedLog { events }
    }
}

// ---------------------------------------------------------------------------
// FinalizedLog
// ---------------------------------------------------------------------------

/// A globally ordered, numbered event log produced at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FinalizedLog {
    events: Vec<ContestEvent>,
}

impl FinalizedLog {
    /// Return the number of events.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Return whether the log has no events.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in transaction id order.
    pub fn events(&self) -> &[ContestEvent] {
        &self.events
    }

    /// Consume the log, returning the ordered events.
    pub fn into_events(self) -> Vec<ContestEvent> {
        self.events
    }

    /// Look up an event by transaction id.
    pub fn get(&self, transaction_id: u64) -> Option<&ContestEvent> {
        let index = usize::try_from(transaction_id.checked_sub(1)?).ok()?;
        self.events.get(index)
    }

    /// Events belonging to the given contest, in transaction id order.
    pub fn events_for_contest(&self, contest_id: ContestId) -> Vec<&ContestEvent> {
        self.events
            .iter()
            .filter(|e| e.contest_id == contest_id)
            .collect()
    }
}
