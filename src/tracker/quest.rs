//! Quest completion, side-hustle task creation, daily reset and listings.
//!
//! Mutators read the persisted quest list and stats, apply the change, and write both
//! slots back before returning the updated records.
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use log::{debug, info};

use crate::logutil::loggable;
use crate::tracker::economy;
use crate::tracker::errors::TrackerError;
use crate::tracker::storage::{KeyValueStore, TrackerStore};
use crate::tracker::types::{Lookup, Quest, QuestCategory, UserStats};
use crate::validation::{validate_description, validate_title};

/// Quest and stats after a completion change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestChange {
    pub quest: Quest,
    pub stats: UserStats,
}

/// Mark a quest complete and pay out its rewards.
pub fn complete_quest<S: KeyValueStore>(
    store: &TrackerStore<S>,
    quest_id: &str,
    now: DateTime<Utc>,
) -> Result<Lookup<QuestChange>, TrackerError> {
    let mut quests = store.get_quests();
    let Some(quest) = quests.iter_mut().find(|q| q.id == quest_id) else {
        debug!("complete_quest: no quest {}", quest_id);
        return Ok(Lookup::NotFound);
    };

    let mut stats = store.get_stats();
    if quest.completed {
        return Ok(Lookup::Unchanged(QuestChange {
            quest: quest.clone(),
            stats,
        }));
    }

    quest.mark_complete(now);
    let updated = quest.clone();
    store.save_quests(&quests)?;

    let level_before = stats.level;
    economy::grant_rewards(&mut stats, updated.xp_reward, updated.gold_reward);
    store.save_stats(&stats)?;

    info!(
        "Quest '{}' completed (+{} xp, +{} gold)",
        loggable(&updated.title),
        updated.xp_reward,
        updated.gold_reward.unwrap_or(0)
    );
    if stats.level > level_before {
        info!("Level up: {} -> {}", level_before, stats.level);
    }

    Ok(Lookup::Updated(QuestChange {
        quest: updated,
        stats,
    }))
}

/// Clear a quest's completion and take its rewards back, clamped at zero.
pub fn uncomplete_quest<S: KeyValueStore>(
    store: &TrackerStore<S>,
    quest_id: &str,
) -> Result<Lookup<QuestChange>, TrackerError> {
    let mut quests = store.get_quests();
    let Some(quest) = quests.iter_mut().find(|q| q.id == quest_id) else {
        debug!("uncomplete_quest: no quest {}", quest_id);
        return Ok(Lookup::NotFound);
    };

    let mut stats = store.get_stats();
    if !quest.completed {
        return Ok(Lookup::Unchanged(QuestChange {
            quest: quest.clone(),
            stats,
        }));
    }

    quest.mark_incomplete();
    let updated = quest.clone();
    store.save_quests(&quests)?;

    economy::revoke_rewards(&mut stats, updated.xp_reward, updated.gold_reward);
    store.save_stats(&stats)?;

    info!("Quest '{}' marked incomplete", loggable(&updated.title));
    Ok(Lookup::Updated(QuestChange {
        quest: updated,
        stats,
    }))
}

/// Flip a quest between complete and incomplete.
pub fn toggle_quest<S: KeyValueStore>(
    store: &TrackerStore<S>,
    quest_id: &str,
    now: DateTime<Utc>,
) -> Result<Lookup<QuestChange>, TrackerError> {
    let completed = store
        .get_quests()
        .iter()
        .find(|q| q.id == quest_id)
        .map(|q| q.completed);
    match completed {
        None => Ok(Lookup::NotFound),
        Some(true) => uncomplete_quest(store, quest_id),
        Some(false) => complete_quest(store, quest_id, now),
    }
}

/// User input for a new side-hustle task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideHustleDraft {
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    pub gold_reward: Option<u32>,
}

impl SideHustleDraft {
    pub fn new(title: &str, xp_reward: u32) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            xp_reward,
            gold_reward: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_gold_reward(mut self, gold: u32) -> Self {
        self.gold_reward = Some(gold);
        self
    }
}

/// Id of the form `<prefix>-<unix millis>`, suffixed until it is unused.
pub(crate) fn timestamp_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{}-{}", prefix, now.timestamp_millis());
    if !taken(&base) {
        return base;
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Validate and append a one-off side-hustle quest.
pub fn add_side_hustle_task<S: KeyValueStore>(
    store: &TrackerStore<S>,
    draft: SideHustleDraft,
    now: DateTime<Utc>,
) -> Result<Quest, TrackerError> {
    let title = validate_title("side hustle task", &draft.title)?;
    let description = validate_description("side hustle task", &draft.description)?;

    let mut quests = store.get_quests();
    let id = timestamp_id("quest", now, |candidate| {
        quests.iter().any(|q| q.id == candidate)
    });
    let mut quest = Quest::new(
        &id,
        &title,
        &description,
        draft.xp_reward,
        QuestCategory::SideHustle,
        now,
    );
    quest.gold_reward = draft.gold_reward;

    quests.push(quest.clone());
    store.save_quests(&quests)?;
    info!("Added side hustle task '{}' ({})", loggable(&quest.title), quest.id);
    Ok(quest)
}

/// Clear completion on every repeatable daily quest. Returns how many were reset.
///
/// Stats are untouched; rewards already paid stay paid.
pub fn reset_daily_quests<S: KeyValueStore>(store: &TrackerStore<S>) -> Result<usize, TrackerError> {
    let mut quests = store.get_quests();
    let mut reset = 0usize;
    for quest in quests.iter_mut().filter(|q| q.resets_daily()) {
        if quest.completed {
            reset += 1;
        }
        quest.mark_incomplete();
    }
    store.save_quests(&quests)?;
    info!("Daily reset cleared {} quest(s)", reset);
    Ok(reset)
}

pub fn quests_in(quests: &[Quest], category: QuestCategory) -> Vec<&Quest> {
    quests.iter().filter(|q| q.category == category).collect()
}

/// Completed/total counts for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: QuestCategory,
    pub completed: usize,
    pub total: usize,
}

pub fn category_summary(quests: &[Quest], category: QuestCategory) -> CategorySummary {
    let in_category = quests_in(quests, category);
    CategorySummary {
        category,
        completed: in_category.iter().filter(|q| q.completed).count(),
        total: in_category.len(),
    }
}

/// Side-hustle quests created within one Sunday-to-Saturday week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekGroup {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub quests: Vec<Quest>,
    pub completed: usize,
    pub xp_earned: u32,
    pub gold_earned: u32,
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Group side-hustle quests by the local week they were created in, newest week first.
pub fn side_hustle_weeks<Tz: TimeZone>(quests: &[Quest], tz: &Tz) -> Vec<WeekGroup> {
    let mut weeks: BTreeMap<NaiveDate, Vec<Quest>> = BTreeMap::new();
    for quest in quests_in(quests, QuestCategory::SideHustle) {
        let local_day = quest.created_at.with_timezone(tz).date_naive();
        weeks
            .entry(week_start(local_day))
            .or_default()
            .push(quest.clone());
    }

    weeks
        .into_iter()
        .rev()
        .map(|(start, quests)| {
            let done: Vec<&Quest> = quests.iter().filter(|q| q.completed).collect();
            WeekGroup {
                start,
                end: start + Duration::days(6),
                completed: done.len(),
                xp_earned: done.iter().fold(0u32, |acc, q| acc.saturating_add(q.xp_reward)),
                gold_earned: done
                    .iter()
                    .fold(0u32, |acc, q| acc.saturating_add(q.gold_reward.unwrap_or(0))),
                quests,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::storage::MemoryStore;
    use crate::validation::ValidationError;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn setup_store(stats: UserStats, quests: Vec<Quest>) -> TrackerStore<MemoryStore> {
        let store = TrackerStore::in_memory();
        store.save_stats(&stats).unwrap();
        store.save_quests(&quests).unwrap();
        store
    }

    fn daily(id: &str, xp: u32) -> Quest {
        Quest::new(id, "Stretch", "", xp, QuestCategory::Daily, at(2024, 1, 1)).repeatable()
    }

    #[test]
    fn completion_rolls_over_level() {
        let stats = UserStats {
            xp: 90,
            ..UserStats::default()
        };
        let store = setup_store(stats, vec![daily("q1", 15)]);

        let change = complete_quest(&store, "q1", at(2024, 1, 2)).unwrap();
        let change = match change {
            Lookup::Updated(change) => change,
            other => panic!("expected update, got {:?}", other),
        };
        assert!(change.quest.completed);
        assert_eq!(change.quest.completed_at, Some(at(2024, 1, 2)));
        assert_eq!(change.stats.level, 2);
        assert_eq!(change.stats.xp, 5);
        assert_eq!(change.stats.xp_to_next_level, 120);
        assert_eq!(store.get_stats(), change.stats);
        assert!(store.get_quests()[0].completed);
    }

    #[test]
    fn completing_twice_is_unchanged() {
        let store = setup_store(UserStats::default(), vec![daily("q1", 10)]);
        complete_quest(&store, "q1", at(2024, 1, 2)).unwrap();
        let second = complete_quest(&store, "q1", at(2024, 1, 3)).unwrap();
        assert!(matches!(second, Lookup::Unchanged(_)));
        assert_eq!(store.get_stats().xp, 10);
    }

    #[test]
    fn unknown_quest_is_not_found() {
        let store = setup_store(UserStats::default(), vec![]);
        assert_eq!(complete_quest(&store, "nope", at(2024, 1, 2)).unwrap(), Lookup::NotFound);
        assert_eq!(toggle_quest(&store, "nope", at(2024, 1, 2)).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn gold_is_paid_and_revoked() {
        let quest = daily("q1", 10).with_gold_reward(25);
        let store = setup_store(UserStats::default(), vec![quest]);

        toggle_quest(&store, "q1", at(2024, 1, 2)).unwrap();
        assert_eq!(store.get_stats().gold, 25);

        let undone = toggle_quest(&store, "q1", at(2024, 1, 2)).unwrap().into_inner().unwrap();
        assert!(!undone.quest.completed);
        assert!(undone.quest.completed_at.is_none());
        assert_eq!(undone.stats.gold, 0);
        assert_eq!(undone.stats.xp, 0);
    }

    #[test]
    fn uncomplete_does_not_reverse_level_up() {
        let stats = UserStats {
            xp: 90,
            ..UserStats::default()
        };
        let store = setup_store(stats, vec![daily("q1", 15)]);
        complete_quest(&store, "q1", at(2024, 1, 2)).unwrap();
        let change = uncomplete_quest(&store, "q1").unwrap().into_inner().unwrap();
        assert_eq!(change.stats.level, 2);
        assert_eq!(change.stats.xp, 0);
    }

    #[test]
    fn side_hustle_task_is_validated_and_appended() {
        let store = setup_store(UserStats::default(), vec![]);
        let err = add_side_hustle_task(&store, SideHustleDraft::new("  ", 10), at(2024, 1, 2))
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation(ValidationError::MissingTitle { .. })
        ));

        let now = at(2024, 1, 2);
        let quest = add_side_hustle_task(
            &store,
            SideHustleDraft::new(" Landing page ", 30).with_gold_reward(5),
            now,
        )
        .unwrap();
        assert_eq!(quest.id, format!("quest-{}", now.timestamp_millis()));
        assert_eq!(quest.title, "Landing page");
        assert!(!quest.repeatable);
        assert_eq!(quest.category, QuestCategory::SideHustle);

        let again = add_side_hustle_task(&store, SideHustleDraft::new("Invoice", 5), now).unwrap();
        assert_ne!(again.id, quest.id);
        assert_eq!(store.get_quests().len(), 2);
    }

    #[test]
    fn daily_reset_only_touches_repeatable_dailies() {
        let mut weekly = Quest::new("w1", "Review", "", 20, QuestCategory::Weekly, at(2024, 1, 1));
        weekly.mark_complete(at(2024, 1, 2));
        let mut once = Quest::new("d2", "One-off", "", 5, QuestCategory::Daily, at(2024, 1, 1));
        once.mark_complete(at(2024, 1, 2));
        let mut repeat = daily("d1", 10);
        repeat.mark_complete(at(2024, 1, 2));

        let stats = UserStats {
            xp: 35,
            ..UserStats::default()
        };
        let store = setup_store(stats.clone(), vec![weekly, once, repeat]);
        assert_eq!(reset_daily_quests(&store).unwrap(), 1);

        let quests = store.get_quests();
        assert!(quests[0].completed);
        assert!(quests[1].completed);
        assert!(!quests[2].completed);
        assert_eq!(store.get_stats(), stats);
    }

    #[test]
    fn category_summary_counts() {
        let mut done = daily("d1", 10);
        done.mark_complete(at(2024, 1, 2));
        let quests = vec![done, daily("d2", 10), Quest::new("w", "W", "", 1, QuestCategory::Weekly, at(2024, 1, 1))];
        let summary = category_summary(&quests, QuestCategory::Daily);
        assert_eq!((summary.completed, summary.total), (1, 2));
        assert_eq!(category_summary(&quests, QuestCategory::SideHustle).total, 0);
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-05-08 is a Wednesday
        let wed = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        assert_eq!(week_start(wed), NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
        let sun = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        assert_eq!(week_start(sun), sun);
    }

    #[test]
    fn side_hustle_weeks_newest_first_with_totals() {
        let mut a = Quest::new("a", "A", "", 10, QuestCategory::SideHustle, at(2024, 5, 6))
            .with_gold_reward(3);
        a.mark_complete(at(2024, 5, 7));
        let b = Quest::new("b", "B", "", 20, QuestCategory::SideHustle, at(2024, 5, 9));
        let c = Quest::new("c", "C", "", 5, QuestCategory::SideHustle, at(2024, 5, 14));
        let daily_quest = daily("d", 99);

        let weeks = side_hustle_weeks(&[a, b, c, daily_quest], &Utc);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].start, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap());
        assert_eq!(weeks[1].start, NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
        assert_eq!(weeks[1].end, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        assert_eq!(weeks[1].quests.len(), 2);
        assert_eq!(weeks[1].completed, 1);
        assert_eq!(weeks[1].xp_earned, 10);
        assert_eq!(weeks[1].gold_earned, 3);
    }
}
