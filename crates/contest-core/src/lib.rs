//! Clock, contest state machine, and tick loop for the contest simulator.
//!
//! This crate owns the time-stepped loop that drives a pool of concurrent
//! contests: humans arrive and post scores, bots join and aim for a paid
//! rank, full contests settle, and settled contests are replaced until the
//! target number of games has been played.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and tick-to-timestamp mapping.
//! - [`config`] -- Configuration loading from `contest-config.yaml` into
//!   strongly-typed structs, plus startup validation.
//! - [`scoring`] -- Human score and arrival sampling.
//! - [`policy`] -- [`BotPolicy`] trait and [`TwoTierPolicy`].
//! - [`contest`] -- The contest state machine and idempotent settlement.
//! - [`context`] -- Shared mutable state threaded through every contest.
//! - [`tick`] -- The per-tick step over all contest slots.
//! - [`runner`] -- The run loop and end-of-run finalization.
//!
//! [`BotPolicy`]: policy::BotPolicy
//! [`TwoTierPolicy`]: policy::TwoTierPolicy

pub mod clock;
pub mod config;
pub mod contest;
pub mod context;
pub mod policy;
pub mod runner;
pub mod scoring;
pub mod tick;
