//! First-run content: starter daily quests, starter rewards and fresh stats.

use chrono::{DateTime, Utc};
use log::info;

use crate::tracker::errors::TrackerError;
use crate::tracker::storage::{KeyValueStore, Slot, TrackerStore};
use crate::tracker::types::{Quest, QuestCategory, Reward, UserStats};

/// Which slots a bootstrap pass had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub stats: bool,
    pub quests: bool,
    pub rewards: bool,
}

impl SeedReport {
    pub fn seeded_anything(&self) -> bool {
        self.stats || self.quests || self.rewards
    }
}

pub fn starter_quests(now: DateTime<Utc>) -> Vec<Quest> {
    vec![
        Quest::new(
            "quest-1",
            "Code for 45 mins",
            "Spend at least 45 minutes coding on a personal project",
            15,
            QuestCategory::Daily,
            now,
        )
        .repeatable(),
        Quest::new(
            "quest-2",
            "Study for 30 mins",
            "Dedicate 30 minutes to learning something new",
            10,
            QuestCategory::Daily,
            now,
        )
        .repeatable(),
        Quest::new(
            "quest-3",
            "No junk food",
            "Avoid eating junk food for the entire day",
            10,
            QuestCategory::Daily,
            now,
        )
        .repeatable(),
        Quest::new(
            "quest-4",
            "Sleep before 12:30AM",
            "Get to bed before 12:30AM",
            10,
            QuestCategory::Daily,
            now,
        )
        .repeatable(),
    ]
}

pub fn starter_rewards(now: DateTime<Utc>) -> Vec<Reward> {
    vec![
        Reward::new(
            "reward-1",
            "Order food",
            "Treat yourself to a nice meal delivery",
            100,
            now,
        ),
        Reward::new(
            "reward-2",
            "Buy accessory",
            "Get yourself a small accessory",
            200,
            now,
        ),
        Reward::new(
            "reward-3",
            "Buy a watch",
            "Reward yourself with a new watch",
            600,
            now,
        )
        .with_gold_cost(500),
        Reward::new(
            "reward-4",
            "Buy a bike",
            "Get that bike you've been wanting",
            1500,
            now,
        )
        .with_gold_cost(1000),
    ]
}

/// Seed every absent slot. Existing data is never overwritten.
pub fn initialize_default_data<S: KeyValueStore>(
    store: &TrackerStore<S>,
    now: DateTime<Utc>,
) -> Result<SeedReport, TrackerError> {
    let mut report = SeedReport::default();

    if !store.has_slot(Slot::Stats)? {
        store.save_stats(&UserStats::default())?;
        report.stats = true;
    }
    if !store.has_slot(Slot::Quests)? {
        store.save_quests(&starter_quests(now))?;
        report.quests = true;
    }
    if !store.has_slot(Slot::Rewards)? {
        store.save_rewards(&starter_rewards(now))?;
        report.rewards = true;
    }

    if report.seeded_anything() {
        info!(
            "Seeded default data (stats={}, quests={}, rewards={})",
            report.stats, report.quests, report.rewards
        );
    }
    Ok(report)
}
