//! Random sampling for human participants and bot score margins.

use rand::Rng;

use crate::config::ScoringConfig;

/// Draw a human score uniformly from `[min_score, max_score]`.
///
/// An inverted range is sampled between the same two bounds.
pub fn random_human_score<R: Rng + ?Sized>(config: &ScoringConfig, rng: &mut R) -> u32 {
    let low = config.min_score.min(config.max_score);
    let high = config.min_score.max(config.max_score);
    rng.random_range(low..=high)
}

/// Schedule the next human arrival: `current_tick + uniform(0..=max_arrival_gap)`.
pub fn next_human_arrival<R: Rng + ?Sized>(
    config: &ScoringConfig,
    current_tick: u64,
    rng: &mut R,
) -> u64 {
    let gap = rng.random_range(0..=config.max_arrival_gap);
    current_tick.saturating_add(gap)
}

/// Margin a bot adds over the score it has to beat, uniform in `[1, max_margin]`.
pub fn bot_margin<R: Rng + ?Sized>(max_margin: u32, rng: &mut R) -> u32 {
    rng.random_range(1..=max_margin.max(1))
}
