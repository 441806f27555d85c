//! Post-run invariant checks over a finalized event log.
//!
//! Every check here holds by construction when the simulator is correct.
//! The audit exists to catch logic defects: a violation is reported as a
//! [`LedgerAnomaly`] and the run is treated as failed.
//!
//! Checks:
//!
//! - **Ordering**: transaction ids are `1..=n` and `(timestamp, kind rank)`
//!   never decreases.
//! - **Settlement**: each settled contest has one row per seat, assigns
//!   ranks `1..=contest_size` with no gaps or repeats, and has exactly
//!   `min(payout_slots, contest_size)` wins.
//! - **Double settlement**: no participant is settled twice in a contest.
//! - **Fee trail**: each bot `entry` balance minus its fee equals the
//!   balance on the same bot's `score_posted` row.
//! - **Balance trail**: `opening - fees + winnings == closing` over all bot
//!   rows.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use contest_types::{ContestEvent, ContestId, ContestResult, EventType, ParticipantId};

use crate::{AuditCheck, LedgerAnomaly};

/// The result of auditing a finalized log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// Every check passed.
    Clean,
    /// One or more invariants were violated.
    Anomalies(Vec<LedgerAnomaly>),
}

impl AuditResult {
    /// Whether every check passed.
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Run parameters the audit needs to judge the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditParams {
    /// Seats per contest. A settled contest has this many settlement rows.
    pub contest_size: usize,
    /// Number of paid positions in the payout table.
    pub payout_slots: usize,
    /// Bot account balance at the start of the run.
    pub opening_balance: Decimal,
    /// Bot account balance at the end of the run.
    pub closing_balance: Decimal,
}

/// Run every check against `events`, which must be in finalized order.
pub fn audit(events: &[ContestEvent], params: &AuditParams) -> AuditResult {
    let mut anomalies = Vec::new();
    anomalies.extend(verify_ordering(events));
    anomalies.extend(verify_settlements(
        events,
        params.payout_slots,
        params.contest_size,
    ));
    anomalies.extend(verify_fee_trail(events));
    anomalies.extend(verify_balance_trail(
        events,
        params.opening_balance,
        params.closing_balance,
    ));

    if anomalies.is_empty() {
        AuditResult::Clean
    } else {
        AuditResult::Anomalies(anomalies)
    }
}

/// Verify transaction ids and global `(timestamp, kind rank)` ordering.
pub fn verify_ordering(events: &[ContestEvent]) -> Vec<LedgerAnomaly> {
    let mut anomalies = Vec::new();

    for (expected_id, event) in (1_u64..).zip(events) {
        if event.transaction_id != expected_id {
            anomalies.push(LedgerAnomaly {
                check: AuditCheck::Ordering,
                contest_id: Some(event.contest_id),
                transaction_id: Some(event.transaction_id),
                message: format!(
                    "LEDGER_ANOMALY: transaction id {} found at position {expected_id}",
                    event.transaction_id
                ),
            });
        }
    }

    for pair in events.windows(2) {
        if let [earlier, later] = pair {
            if earlier.order_key() > later.order_key() {
                anomalies.push(LedgerAnomaly {
                    check: AuditCheck::Ordering,
                    contest_id: Some(later.contest_id),
                    transaction_id: Some(later.transaction_id),
                    message: format!(
                        "LEDGER_ANOMALY: {} at {} ordered after {} at {}",
                        later.event_type, later.timestamp, earlier.event_type, earlier.timestamp
                    ),
                });
            }
        }
    }

    anomalies
}

/// Verify per-contest seat counts, ranks, win counts, and single settlement.
///
/// A contest with any settlement row must have exactly `contest_size` of
/// them; a partially written settlement is flagged even if the ranks it
/// does carry are contiguous.
pub fn verify_settlements(
    events: &[ContestEvent],
    payout_slots: usize,
    contest_size: usize,
) -> Vec<LedgerAnomaly> {
    let mut by_contest: BTreeMap<ContestId, Vec<&ContestEvent>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.event_type == EventType::Settlement) {
        by_contest.entry(event.contest_id).or_default().push(event);
    }

    let mut anomalies = Vec::new();
    for (contest_id, settlements) in by_contest {
        let mut seen: BTreeSet<ParticipantId> = BTreeSet::new();
        for event in &settlements {
            if !seen.insert(event.participant_id) {
                anomalies.push(LedgerAnomaly {
                    check: AuditCheck::DoubleSettlement,
                    contest_id: Some(contest_id),
                    transaction_id: Some(event.transaction_id),
                    message: format!(
                        "LEDGER_ANOMALY: {} settled more than once in contest {contest_id}",
                        event.participant_id
                    ),
                });
            }
        }

        if settlements.len() != contest_size {
            anomalies.push(LedgerAnomaly {
                check: AuditCheck::Settlement,
                contest_id: Some(contest_id),
                transaction_id: None,
                message: format!(
                    "LEDGER_ANOMALY: contest {contest_id} has {} settlement rows, expected {contest_size}",
                    settlements.len()
                ),
            });
        }

        let mut ranks: Vec<u32> = settlements.iter().map(|e| e.rank).collect();
        ranks.sort_unstable();
        let contiguous = (1_u32..).zip(&ranks).all(|(expected, rank)| expected == *rank);
        if !contiguous {
            anomalies.push(LedgerAnomaly {
                check: AuditCheck::Settlement,
                contest_id: Some(contest_id),
                transaction_id: None,
                message: format!(
                    "LEDGER_ANOMALY: contest {contest_id} ranks {ranks:?} are not 1..={}",
                    ranks.len()
                ),
            });
        }

        let wins = settlements
            .iter()
            .filter(|e| e.result == Some(ContestResult::Win))
            .count();
        let expected_wins = payout_slots.min(contest_size);
        if wins != expected_wins {
            anomalies.push(LedgerAnomaly {
                check: AuditCheck::Settlement,
                contest_id: Some(contest_id),
                transaction_id: None,
                message: format!(
                    "LEDGER_ANOMALY: contest {contest_id} has {wins} wins, expected {expected_wins}"
                ),
            });
        }
    }

    anomalies
}

/// Verify that each bot's `score_posted` balance equals its `entry`
/// balance minus the fee it paid.
pub fn verify_fee_trail(events: &[ContestEvent]) -> Vec<LedgerAnomaly> {
    let mut pending: BTreeMap<ParticipantId, &ContestEvent> = BTreeMap::new();
    let mut anomalies = Vec::new();

    for event in events.iter().filter(|e| e.entry_type.is_bot()) {
        match event.event_type {
            EventType::Entry => {
                pending.insert(event.participant_id, event);
            }
            EventType::ScorePosted => {
                let Some(entry) = pending.remove(&event.participant_id) else {
                    anomalies.push(LedgerAnomaly {
                        check: AuditCheck::FeeTrail,
                        contest_id: Some(event.contest_id),
                        transaction_id: Some(event.transaction_id),
                        message: format!(
                            "LEDGER_ANOMALY: {} posted a score without an entry",
                            event.participant_id
                        ),
                    });
                    continue;
                };
                let expected = entry.account_balance.checked_sub(entry.entry_fee_paid);
                if expected != Some(event.account_balance) {
                    anomalies.push(LedgerAnomaly {
                        check: AuditCheck::FeeTrail,
                        contest_id: Some(event.contest_id),
                        transaction_id: Some(event.transaction_id),
                        message: format!(
                            "LEDGER_ANOMALY: {} balance {} after fee, expected {} - {}",
                            event.participant_id,
                            event.account_balance,
                            entry.account_balance,
                            entry.entry_fee_paid
                        ),
                    });
                }
            }
            EventType::Settlement => {}
        }
    }

    anomalies
}

/// Verify that bot fees and winnings explain the change in balance.
pub fn verify_balance_trail(
    events: &[ContestEvent],
    opening_balance: Decimal,
    closing_balance: Decimal,
) -> Vec<LedgerAnomaly> {
    let mut balance = Some(opening_balance);
    for event in events.iter().filter(|e| e.entry_type.is_bot()) {
        balance = balance
            .and_then(|b| b.checked_sub(event.entry_fee_paid))
            .and_then(|b| b.checked_add(event.win_amount));
    }

    match balance {
        Some(derived) if derived == closing_balance => Vec::new(),
        Some(derived) => vec![LedgerAnomaly {
            check: AuditCheck::BalanceTrail,
            contest_id: None,
            transaction_id: None,
            message: format!(
                "LEDGER_ANOMALY: bot rows imply closing balance {derived}, account holds {closing_balance}"
            ),
        }],
        None => vec![LedgerAnomaly {
            check: AuditCheck::BalanceTrail,
            contest_id: None,
            transaction_id: None,
            message: "LEDGER_ANOMALY: arithmetic overflow while replaying bot balance".to_owned(),
        }],
    }
}
