//! In-memory tracker state.
//!
//! [`Tracker`] owns the store, caches the four collections, and is the only write path
//! callers use. Each entry point delegates to the domain mutators, then folds the
//! returned records back into the cache.

use chrono::{DateTime, Local, Utc};
use log::{debug, info};

use crate::tracker::clock::{Clock, SystemClock};
use crate::tracker::errors::TrackerError;
use crate::tracker::mission::{self, MissionChange, MissionDraft};
use crate::tracker::quest::{self, CategorySummary, QuestChange, SideHustleDraft, WeekGroup};
use crate::tracker::reward::{self, PurchaseOutcome};
use crate::tracker::seed::initialize_default_data;
use crate::tracker::storage::{KeyValueStore, TrackerStore};
use crate::tracker::streak::{record_visit, StreakChange};
use crate::tracker::types::{Lookup, Mission, Quest, QuestCategory, Reward, UserStats};

/// Snapshot used by the dashboard view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub stats: UserStats,
    pub pending_daily: Vec<Quest>,
    pub completed_daily: Vec<Quest>,
    pub active_missions: Vec<Mission>,
}

pub struct Tracker<S: KeyValueStore> {
    store: TrackerStore<S>,
    clock: Box<dyn Clock>,
    stats: UserStats,
    quests: Vec<Quest>,
    missions: Vec<Mission>,
    rewards: Vec<Reward>,
    last_streak: StreakChange,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Seed defaults if needed, load everything, and refresh the streak.
    pub fn load(store: TrackerStore<S>) -> Result<Self, TrackerError> {
        Self::load_with_clock(store, SystemClock)
    }

    pub fn load_with_clock(
        store: TrackerStore<S>,
        clock: impl Clock + 'static,
    ) -> Result<Self, TrackerError> {
        let now = clock.now();
        initialize_default_data(&store, now)?;

        let mut tracker = Self {
            stats: store.get_stats(),
            quests: store.get_quests(),
            missions: store.get_missions(),
            rewards: store.get_rewards(),
            store,
            clock: Box::new(clock),
            last_streak: StreakChange::SameDay,
        };
        tracker.refresh_streak()?;
        debug!(
            "Tracker loaded: {} quests, {} missions, {} rewards",
            tracker.quests.len(),
            tracker.missions.len(),
            tracker.rewards.len()
        );
        Ok(tracker)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn refresh_streak(&mut self) -> Result<(), TrackerError> {
        let now_local = self.now().with_timezone(&Local);
        let change = record_visit(&mut self.stats, &now_local);
        if change != StreakChange::SameDay {
            self.store.save_stats(&self.stats)?;
            info!("Streak {:?}: now {} day(s)", change, self.stats.streak);
        }
        self.last_streak = change;
        Ok(())
    }

    /// Re-read every slot from storage, discarding the cache.
    pub fn reload(&mut self) {
        self.stats = self.store.get_stats();
        self.quests = self.store.get_quests();
        self.missions = self.store.get_missions();
        self.rewards = self.store.get_rewards();
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// How the streak moved when this tracker was loaded.
    pub fn streak_change(&self) -> StreakChange {
        self.last_streak
    }

    pub fn store(&self) -> &TrackerStore<S> {
        &self.store
    }

    pub fn toggle_quest_completion(&mut self, quest_id: &str) -> Result<Lookup<QuestChange>, TrackerError> {
        let now = self.now();
        let result = quest::toggle_quest(&self.store, quest_id, now)?;
        if let Lookup::Updated(change) = &result {
            replace_by_id(&mut self.quests, change.quest.clone(), |q| &q.id);
            self.stats = change.stats.clone();
        }
        Ok(result)
    }

    pub fn toggle_milestone_completion(
        &mut self,
        mission_id: &str,
        milestone_id: &str,
    ) -> Result<Lookup<MissionChange>, TrackerError> {
        let now = self.now();
        let result = mission::toggle_milestone(&self.store, mission_id, milestone_id, now)?;
        if let Lookup::Updated(change) = &result {
            replace_by_id(&mut self.missions, change.mission.clone(), |m| &m.id);
            self.stats = change.stats.clone();
        }
        Ok(result)
    }

    /// Attempt a purchase. Inspect `PurchaseOutcome::purchased` for success.
    pub fn purchase_reward_item(&mut self, reward_id: &str) -> Result<Lookup<PurchaseOutcome>, TrackerError> {
        let now = self.now();
        let result = reward::purchase_reward(&self.store, reward_id, now)?;
        if let Lookup::Updated(outcome) = &result {
            replace_by_id(&mut self.rewards, outcome.reward.clone(), |r| &r.id);
            self.stats = outcome.stats.clone();
        }
        Ok(result)
    }

    pub fn add_mission(&mut self, draft: MissionDraft) -> Result<Mission, TrackerError> {
        let now = self.now();
        let created = mission::add_mission(&self.store, draft, now)?;
        self.missions.push(created.clone());
        Ok(created)
    }

    pub fn add_side_hustle_task(&mut self, draft: SideHustleDraft) -> Result<Quest, TrackerError> {
        let now = self.now();
        let created = quest::add_side_hustle_task(&self.store, draft, now)?;
        self.quests.push(created.clone());
        Ok(created)
    }

    /// Clear repeatable daily quests. Returns how many had been completed.
    pub fn reset_daily_quests(&mut self) -> Result<usize, TrackerError> {
        let reset = quest::reset_daily_quests(&self.store)?;
        for q in self.quests.iter_mut().filter(|q| q.resets_daily()) {
            q.mark_incomplete();
        }
        Ok(reset)
    }

    pub fn quests_in(&self, category: QuestCategory) -> Vec<&Quest> {
        quest::quests_in(&self.quests, category)
    }

    pub fn category_summary(&self, category: QuestCategory) -> CategorySummary {
        quest::category_summary(&self.quests, category)
    }

    pub fn side_hustle_weeks(&self) -> Vec<WeekGroup> {
        quest::side_hustle_weeks(&self.quests, &Local)
    }

    pub fn dashboard(&self) -> DashboardSummary {
        let (completed_daily, pending_daily): (Vec<Quest>, Vec<Quest>) = self
            .quests_in(QuestCategory::Daily)
            .into_iter()
            .cloned()
            .partition(|q| q.completed);
        DashboardSummary {
            stats: self.stats.clone(),
            pending_daily,
            completed_daily,
            active_missions: self
                .missions
                .iter()
                .filter(|m| !m.is_complete())
                .cloned()
                .collect(),
        }
    }
}

fn replace_by_id<T>(items: &mut [T], updated: T, id: impl Fn(&T) -> &String) {
    let target = id(&updated).clone();
    if let Some(slot) = items.iter_mut().find(|item| *id(item) == target) {
        *slot = updated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::clock::FixedClock;
    use crate::tracker::mission::MilestoneDraft;
    use crate::tracker::storage::MemoryStore;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn noon(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 12, 0, 0).unwrap()
    }

    fn load(store: TrackerStore<MemoryStore>, clock: Arc<FixedClock>) -> Tracker<MemoryStore> {
        Tracker::load_with_clock(store, clock).expect("tracker")
    }

    #[test]
    fn first_load_seeds_and_starts_streak() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let tracker = load(TrackerStore::in_memory(), clock);
        assert_eq!(tracker.quests().len(), 4);
        assert_eq!(tracker.rewards().len(), 4);
        assert!(tracker.missions().is_empty());
        assert_eq!(tracker.stats().streak, 1);
        assert_eq!(tracker.streak_change(), StreakChange::Reset);
        assert_eq!(tracker.store().get_stats().streak, 1);
    }

    #[test]
    fn toggles_keep_cache_and_store_in_step() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let mut tracker = load(TrackerStore::in_memory(), clock);

        let change = tracker.toggle_quest_completion("quest-1").unwrap();
        assert!(change.is_updated());
        assert_eq!(tracker.stats().xp, 15);
        assert!(tracker.quests()[0].completed);
        assert_eq!(tracker.store().get_stats(), *tracker.stats());

        tracker.toggle_quest_completion("quest-1").unwrap();
        assert_eq!(tracker.stats().xp, 0);
        assert!(!tracker.quests()[0].completed);

        assert!(!tracker.toggle_quest_completion("missing").unwrap().is_found());
    }

    #[test]
    fn purchase_updates_cache_only_on_success() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let mut tracker = load(TrackerStore::in_memory(), clock);

        let refused = tracker.purchase_reward_item("reward-1").unwrap().into_inner().unwrap();
        assert!(!refused.purchased);
        assert!(!tracker.rewards()[0].purchased);

        let mut stats = tracker.store().get_stats();
        stats.xp = 150;
        stats.xp_to_next_level = 1_000;
        tracker.store().save_stats(&stats).unwrap();
        tracker.reload();

        let bought = tracker.purchase_reward_item("reward-1").unwrap().into_inner().unwrap();
        assert!(bought.purchased);
        assert!(tracker.rewards()[0].purchased);
        assert_eq!(tracker.stats().xp, 50);
    }

    #[test]
    fn missions_and_dashboard() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let mut tracker = load(TrackerStore::in_memory(), clock);
        let mission = tracker
            .add_mission(
                MissionDraft::new("Garden", "")
                    .with_milestone(MilestoneDraft::new("Dig", 10))
                    .with_milestone(MilestoneDraft::new("Plant", 10)),
            )
            .unwrap();
        let first_ms = mission.milestones[0].id.clone();
        tracker.toggle_milestone_completion(&mission.id, &first_ms).unwrap();
        assert_eq!(tracker.missions()[0].progress, 50);

        tracker.toggle_quest_completion("quest-2").unwrap();
        let dash = tracker.dashboard();
        assert_eq!(dash.completed_daily.len(), 1);
        assert_eq!(dash.pending_daily.len(), 3);
        assert_eq!(dash.active_missions.len(), 1);
        assert_eq!(dash.stats.xp, 20);
    }

    #[test]
    fn side_hustle_tasks_show_up_in_listings() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let mut tracker = load(TrackerStore::in_memory(), clock);
        tracker
            .add_side_hustle_task(SideHustleDraft::new("Pitch deck", 25))
            .unwrap();
        assert_eq!(tracker.quests_in(QuestCategory::SideHustle).len(), 1);
        assert_eq!(tracker.category_summary(QuestCategory::Daily).total, 4);
        assert_eq!(tracker.side_hustle_weeks().len(), 1);
    }

    #[test]
    fn daily_reset_refreshes_cache() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let mut tracker = load(TrackerStore::in_memory(), clock);
        tracker.toggle_quest_completion("quest-1").unwrap();
        tracker.toggle_quest_completion("quest-3").unwrap();
        assert_eq!(tracker.reset_daily_quests().unwrap(), 2);
        assert!(tracker.quests().iter().all(|q| !q.completed));
        assert_eq!(tracker.stats().xp, 25);
    }

    #[test]
    fn streak_continues_on_next_day_load() {
        let clock = Arc::new(FixedClock::new(noon(10)));
        let store = TrackerStore::in_memory();
        let tracker = load(store, clock.clone());
        let store = tracker.store;

        clock.advance(Duration::days(1));
        let tracker = load(store, clock.clone());
        assert_eq!(tracker.stats().streak, 2);
        assert_eq!(tracker.streak_change(), StreakChange::Continued);

        let store = tracker.store;
        let tracker = load(store, clock.clone());
        assert_eq!(tracker.streak_change(), StreakChange::SameDay);
        assert_eq!(tracker.stats().streak, 2);
    }
}
