//! Leveling curve and experience/gold arithmetic.
//!
//! All functions here are pure over [`UserStats`]; persistence happens in the callers.

use super::types::{UserStats, BASE_LEVEL_THRESHOLD};

/// Growth factor applied per level to the experience threshold.
pub const LEVEL_GROWTH: f64 = 1.2;

/// Experience needed to leave `level`: `floor(100 * 1.2^(level - 1))`.
///
/// Level 0 is treated as level 1. Very high levels saturate at `u32::MAX`.
pub fn level_threshold(level: u32) -> u32 {
    let exponent = f64::from(level.max(1) - 1);
    let raw = (f64::from(BASE_LEVEL_THRESHOLD) * LEVEL_GROWTH.powf(exponent)).floor();
    // float-to-int casts saturate
    raw as u32
}

/// Add experience, rolling over into as many level-ups as the amount covers.
pub fn apply_xp(stats: &mut UserStats, amount: u32) {
    if stats.xp_to_next_level == 0 {
        stats.xp_to_next_level = level_threshold(stats.level);
    }
    stats.xp = stats.xp.saturating_add(amount);
    while stats.xp >= stats.xp_to_next_level {
        stats.xp -= stats.xp_to_next_level;
        stats.level = stats.level.saturating_add(1);
        stats.xp_to_next_level = level_threshold(stats.level);
    }
}

/// Add gold, saturating at `u32::MAX`.
pub fn apply_gold(stats: &mut UserStats, amount: u32) {
    stats.gold = stats.gold.saturating_add(amount);
}

/// Grant a quest or milestone payout.
pub fn grant_rewards(stats: &mut UserStats, xp: u32, gold: Option<u32>) {
    apply_xp(stats, xp);
    if let Some(gold) = gold {
        apply_gold(stats, gold);
    }
}

/// Take back a payout, clamping at zero.
///
/// Level-ups granted by the original payout are not reversed.
pub fn revoke_rewards(stats: &mut UserStats, xp: u32, gold: Option<u32>) {
    stats.xp = stats.xp.saturating_sub(xp);
    if let Some(gold) = gold {
        stats.gold = stats.gold.saturating_sub(gold);
    }
}

/// `floor(100 * completed / total)`, or 0 for an empty mission.
pub fn mission_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    (completed * 100 / total as u64) as u8
}
