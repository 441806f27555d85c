//! End-to-end tests for full simulation runs.
//!
//! Runs are driven through the public API with a pinned start instant and
//! a fixed seed, then checked against the ledger audit and the ordering,
//! settlement, and identity properties of the finalized log.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeZone, Utc};
use contest_core::clock::SimClock;
use contest_core::config::SimulationConfig;
use contest_core::contest::{Contest, ContestRules};
use contest_core::context::SimulationContext;
use contest_core::policy::TwoTierPolicy;
use contest_core::runner::{
    NoOpCallback, SimulationEndReason, SimulationResult, run_simulation,
};
use contest_core::tick::SimulationState;
use contest_ledger::export;
use contest_types::{ContestId, ContestResult, EntryType, EventType, GameId};
use rust_decimal::Decimal;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn run(config: &SimulationConfig) -> SimulationResult {
    config.validate().unwrap();
    let mut state = SimulationState::new(config, start()).unwrap();
    let mut policy = TwoTierPolicy::from_config(&config.policy);
    run_simulation(&mut state, &mut policy, &config.scheduler, &mut NoOpCallback).unwrap()
}

#[test]
fn default_run_completes_and_audits_clean() {
    let result = run(&SimulationConfig::default());

    assert_eq!(result.end_reason, SimulationEndReason::GamesCompleted);
    assert!(result.games_completed >= 50);
    assert!(result.audit().is_clean());

    let net = result.account.net().unwrap();
    assert_eq!(result.account.balance(), net);
}

#[test]
fn same_seed_same_log() {
    let config = SimulationConfig::default();
    let first = run(&config);
    let second = run(&config);

    assert_eq!(first.log, second.log);
    assert_eq!(first.account, second.account);
    assert_eq!(first.total_ticks, second.total_ticks);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn different_seed_different_log() {
    let mut config = SimulationConfig::default();
    let first = run(&config);
    config.world.seed = config.world.seed.wrapping_add(1);
    let second = run(&config);

    assert_ne!(first.log, second.log);
}

#[test]
fn transaction_ids_follow_global_order() {
    let result = run(&SimulationConfig::default());
    let events = result.log.events();

    for (expected, event) in (1_u64..).zip(events) {
        assert_eq!(event.transaction_id, expected);
    }
    for pair in events.windows(2) {
        if let [a, b] = pair {
            assert!(a.order_key() <= b.order_key());
        }
    }
}

#[test]
fn game_ids_increase_with_contest_ids() {
    let result = run(&SimulationConfig::default());

    let mut games: BTreeMap<ContestId, BTreeSet<GameId>> = BTreeMap::new();
    for event in result.log.events() {
        games
            .entry(event.contest_id)
            .or_default()
            .insert(event.game_id);
    }

    // One game per contest, and game ids rise strictly with contest ids.
    let mut previous: Option<GameId> = None;
    for set in games.values() {
        assert_eq!(set.len(), 1);
        let game = *set.iter().next().unwrap();
        if let Some(prev) = previous {
            assert!(game > prev);
        }
        previous = Some(game);
    }
}

#[test]
fn every_settled_contest_pays_top_two() {
    let result = run(&SimulationConfig::default());

    let mut by_contest: BTreeMap<ContestId, Vec<(u32, Option<ContestResult>, Decimal)>> =
        BTreeMap::new();
    for event in result.log.events() {
        if event.event_type == EventType::Settlement {
            by_contest
                .entry(event.contest_id)
                .or_default()
                .push((event.rank, event.result, event.win_amount));
        }
    }

    assert!(by_contest.len() >= 50);
    for rows in by_contest.values_mut() {
        rows.sort_by_key(|r| r.0);
        assert_eq!(
            rows.as_slice(),
            &[
                (1, Some(ContestResult::Win), Decimal::new(25, 0)),
                (2, Some(ContestResult::Win), Decimal::new(10, 0)),
                (3, Some(ContestResult::Loss), Decimal::ZERO),
                (4, Some(ContestResult::Loss), Decimal::ZERO),
            ]
        );
    }
}

#[test]
fn human_rows_carry_no_balance_or_target() {
    let result = run(&SimulationConfig::default());

    for event in result.log.events() {
        if event.entry_type == EntryType::Human {
            assert_eq!(event.account_balance, Decimal::ZERO);
            assert_eq!(event.target_win_amount, Decimal::ZERO);
        }
    }
}

#[test]
fn tick_limit_ends_run_early() {
    let mut config = SimulationConfig::default();
    config.scheduler.max_ticks = 5;
    let result = run(&config);

    assert_eq!(result.end_reason, SimulationEndReason::TickLimitReached);
    assert_eq!(result.total_ticks, 5);
    assert!(result.games_completed < 50);
    assert!(result.audit().is_clean());
}

#[test]
fn single_payout_table_runs_clean() {
    let mut config = SimulationConfig::default();
    config.contest.payout_table = vec![Decimal::new(35, 0)];
    config.scheduler.total_games = 10;
    let result = run(&config);

    assert!(result.audit().is_clean());
    let winners = result
        .log
        .events()
        .iter()
        .filter(|e| e.result == Some(ContestResult::Win))
        .all(|e| e.rank == 1);
    assert!(winners);
}

#[test]
fn larger_contests_with_more_slots_run_clean() {
    let mut config = SimulationConfig::default();
    config.contest.size = 6;
    config.contest.max_bots = 2;
    config.scheduler.concurrent_contests = 3;
    config.scheduler.total_games = 20;
    let result = run(&config);

    assert_eq!(result.end_reason, SimulationEndReason::GamesCompleted);
    assert_eq!(result.contest_size, 6);
    assert!(result.audit().is_clean());

    let mut by_contest: BTreeMap<ContestId, Vec<u32>> = BTreeMap::new();
    for event in result.log.events() {
        if event.event_type == EventType::Settlement {
            by_contest.entry(event.contest_id).or_default().push(event.rank);
        }
    }
    assert!(!by_contest.is_empty());
    assert!(by_contest.values().all(|ranks| ranks.len() == 6));
}

#[test]
fn audit_checks_settlement_rows_against_contest_size() {
    let mut result = run(&SimulationConfig::default());
    assert!(result.audit().is_clean());

    result.contest_size = 5;
    assert!(!result.audit().is_clean());
}

#[test]
fn export_has_header_and_one_row_per_event() {
    let result = run(&SimulationConfig::default());
    let csv = export::to_csv_string(result.log.events());

    let mut lines = csv.split('\n');
    assert_eq!(lines.next(), Some(export::CSV_HEADER));
    assert_eq!(lines.count(), result.log.len());
    assert!(!csv.ends_with('\n'));
}

/// Three humans post 800, 200, and 500, then one bot joins with a zero
/// balance and aims for second place.
#[test]
fn four_seat_contest_end_to_end() {
    let config = SimulationConfig::default();
    let rules = ContestRules::from_config(&config.contest);
    let clock = SimClock::from_parts(0, start(), 1).unwrap();
    let mut ctx = SimulationContext::new(clock, 17);
    let mut policy = TwoTierPolicy::from_config(&config.policy);

    let mut contest = Contest::open(&mut ctx, 0).unwrap();
    for (tick, score) in [(0, 800), (1, 200), (2, 500)] {
        contest
            .admit_human_with_score(&mut ctx, &rules, tick, score, tick)
            .unwrap();
    }
    assert!(contest.can_admit_bot(&rules, 4));
    contest.admit_bot(&mut ctx, &rules, &mut policy, 4).unwrap();
    assert!(contest.mark_full_if_complete(&rules));
    assert!(contest.settle_if_needed(&mut ctx, &rules, 4).unwrap());

    let log = std::mem::take(&mut ctx.log).finalize();
    let settlements: Vec<_> = log
        .events()
        .iter()
        .filter(|e| e.event_type == EventType::Settlement)
        .collect();
    assert_eq!(settlements.len(), 4);

    let first = settlements.iter().find(|e| e.rank == 1).unwrap();
    assert_eq!(first.participant_id.to_string(), "user1");
    assert_eq!(first.win_amount, Decimal::new(25, 0));

    // Zero balance projects above the risk threshold, so the bot beats the
    // 500 and takes second.
    let second = settlements.iter().find(|e| e.rank == 2).unwrap();
    assert_eq!(second.participant_id.to_string(), "bot1");
    assert_eq!(second.win_amount, Decimal::new(10, 0));
    assert!((501..=510).contains(&second.score));
    assert_eq!(second.account_balance, Decimal::ZERO);

    // Fee of 10 in, prize of 10 back.
    assert_eq!(ctx.account.balance(), Decimal::ZERO);
    assert_eq!(ctx.account.fees_paid(), Decimal::new(10, 0));
    assert_eq!(ctx.account.winnings(), Decimal::new(10, 0));

    let bot_entry = log
        .events()
        .iter()
        .find(|e| e.entry_type == EntryType::Bot && e.event_type == EventType::Entry)
        .unwrap();
    assert_eq!(bot_entry.target_win_amount, Decimal::new(10, 0));
    assert_eq!(bot_entry.timestamp.to_string(), "2025-01-01T00:04:00.000Z");
}
