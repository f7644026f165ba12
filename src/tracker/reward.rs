//! Reward shop: affordability checks and purchases.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;

use crate::logutil::loggable;
use crate::tracker::errors::TrackerError;
use crate::tracker::storage::{KeyValueStore, TrackerStore};
use crate::tracker::types::{Lookup, Reward, UserStats};

/// Why a purchase was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseRefusal {
    AlreadyPurchased,
    /// `needed` is the shortfall, not the full cost.
    InsufficientXp { needed: u32 },
    InsufficientGold { needed: u32 },
}

impl fmt::Display for PurchaseRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseRefusal::AlreadyPurchased => write!(f, "You've already unlocked this reward"),
            PurchaseRefusal::InsufficientXp { needed } => {
                write!(f, "You need {} more XP to unlock this reward", needed)
            }
            PurchaseRefusal::InsufficientGold { needed } => {
                write!(f, "You need {} more Gold to unlock this reward", needed)
            }
        }
    }
}

/// Result of a purchase attempt on an existing reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    pub reward: Reward,
    pub stats: UserStats,
    pub purchased: bool,
    pub refusal: Option<PurchaseRefusal>,
}

/// Check purchase preconditions in order: not owned, enough xp, enough gold.
pub fn check_affordability(reward: &Reward, stats: &UserStats) -> Result<(), PurchaseRefusal> {
    if reward.purchased {
        return Err(PurchaseRefusal::AlreadyPurchased);
    }
    if stats.xp < reward.xp_cost {
        return Err(PurchaseRefusal::InsufficientXp {
            needed: reward.xp_cost - stats.xp,
        });
    }
    if let Some(gold_cost) = reward.gold_cost {
        if stats.gold < gold_cost {
            return Err(PurchaseRefusal::InsufficientGold {
                needed: gold_cost - stats.gold,
            });
        }
    }
    Ok(())
}

pub fn can_purchase(reward: &Reward, stats: &UserStats) -> bool {
    check_affordability(reward, stats).is_ok()
}

/// Buy a reward, deducting its costs. Refusals leave all state untouched.
pub fn purchase_reward<S: KeyValueStore>(
    store: &TrackerStore<S>,
    reward_id: &str,
    now: DateTime<Utc>,
) -> Result<Lookup<PurchaseOutcome>, TrackerError> {
    let mut rewards = store.get_rewards();
    let Some(reward) = rewards.iter_mut().find(|r| r.id == reward_id) else {
        debug!("purchase_reward: no reward {}", reward_id);
        return Ok(Lookup::NotFound);
    };

    let mut stats = store.get_stats();
    if let Err(refusal) = check_affordability(reward, &stats) {
        debug!("Purchase of '{}' refused: {:?}", loggable(&reward.title), refusal);
        return Ok(Lookup::Unchanged(PurchaseOutcome {
            reward: reward.clone(),
            stats,
            purchased: false,
            refusal: Some(refusal),
        }));
    }

    stats.xp -= reward.xp_cost;
    if let Some(gold_cost) = reward.gold_cost {
        stats.gold -= gold_cost;
    }
    reward.purchased = true;
    reward.purchased_at = Some(now);
    let updated = reward.clone();

    store.save_stats(&stats)?;
    store.save_rewards(&rewards)?;

    info!(
        "Reward '{}' unlocked (-{} xp, -{} gold)",
        loggable(&updated.title),
        updated.xp_cost,
        updated.gold_cost.unwrap_or(0)
    );
    Ok(Lookup::Updated(PurchaseOutcome {
        reward: updated,
        stats,
        purchased: true,
        refusal: None,
    }))
}
