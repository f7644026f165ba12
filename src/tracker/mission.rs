//! Mission creation and milestone completion.
//!
//! Completing or un-completing a milestone recomputes the parent mission's progress
//! and pays out or takes back the milestone's rewards.
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::logutil::loggable;
use crate::tracker::economy;
use crate::tracker::errors::TrackerError;
use crate::tracker::quest::timestamp_id;
use crate::tracker::storage::{KeyValueStore, TrackerStore};
use crate::tracker::types::{Lookup, Milestone, Mission, UserStats};
use crate::validation::{validate_description, validate_title, ValidationError};

/// Experience granted by a milestone when none is given.
pub const DEFAULT_MILESTONE_XP: u32 = 10;

/// Mission and stats after a milestone change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionChange {
    pub mission: Mission,
    pub stats: UserStats,
}

/// Which direction a milestone update goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MilestoneAction {
    Complete,
    Uncomplete,
}

fn update_milestone<S: KeyValueStore>(
    store: &TrackerStore<S>,
    mission_id: &str,
    milestone_id: &str,
    action: MilestoneAction,
    now: DateTime<Utc>,
) -> Result<Lookup<MissionChange>, TrackerError> {
    let mut missions = store.get_missions();
    let Some(mission) = missions.iter_mut().find(|m| m.id == mission_id) else {
        debug!("milestone update: no mission {}", mission_id);
        return Ok(Lookup::NotFound);
    };
    let Some(index) = mission.milestones.iter().position(|ms| ms.id == milestone_id) else {
        debug!("milestone update: no milestone {} in {}", milestone_id, mission_id);
        return Ok(Lookup::NotFound);
    };

    let mut stats = store.get_stats();
    let already = mission.milestones[index].completed;
    let wants_complete = action == MilestoneAction::Complete;
    if already == wants_complete {
        return Ok(Lookup::Unchanged(MissionChange {
            mission: mission.clone(),
            stats,
        }));
    }

    let milestone = &mut mission.milestones[index];
    let (xp, gold) = (milestone.xp_reward, milestone.gold_reward);
    if wants_complete {
        milestone.completed = true;
        milestone.completed_at = Some(now);
    } else {
        milestone.completed = false;
        milestone.completed_at = None;
    }
    let milestone_title = milestone.title.clone();

    mission.recompute_progress(now);
    let updated = mission.clone();
    store.save_missions(&missions)?;

    if wants_complete {
        economy::grant_rewards(&mut stats, xp, gold);
    } else {
        economy::revoke_rewards(&mut stats, xp, gold);
    }
    store.save_stats(&stats)?;

    info!(
        "Milestone '{}' of '{}' {} ({}%)",
        loggable(&milestone_title),
        loggable(&updated.title),
        if wants_complete { "completed" } else { "reopened" },
        updated.progress
    );
    if wants_complete && updated.is_complete() {
        info!("Mission '{}' complete", loggable(&updated.title));
    }

    Ok(Lookup::Updated(MissionChange {
        mission: updated,
        stats,
    }))
}

pub fn complete_milestone<S: KeyValueStore>(
    store: &TrackerStore<S>,
    mission_id: &str,
    milestone_id: &str,
    now: DateTime<Utc>,
) -> Result<Lookup<MissionChange>, TrackerError> {
    update_milestone(store, mission_id, milestone_id, MilestoneAction::Complete, now)
}

/// Reopen a milestone. Rewards are taken back clamped at zero, without level-down.
pub fn uncomplete_milestone<S: KeyValueStore>(
    store: &TrackerStore<S>,
    mission_id: &str,
    milestone_id: &str,
    now: DateTime<Utc>,
) -> Result<Lookup<MissionChange>, TrackerError> {
    update_milestone(store, mission_id, milestone_id, MilestoneAction::Uncomplete, now)
}

pub fn toggle_milestone<S: KeyValueStore>(
    store: &TrackerStore<S>,
    mission_id: &str,
    milestone_id: &str,
    now: DateTime<Utc>,
) -> Result<Lookup<MissionChange>, TrackerError> {
    let completed = store
        .get_missions()
        .iter()
        .find(|m| m.id == mission_id)
        .and_then(|m| m.milestones.iter().find(|ms| ms.id == milestone_id))
        .map(|ms| ms.completed);
    match completed {
        None => Ok(Lookup::NotFound),
        Some(true) => uncomplete_milestone(store, mission_id, milestone_id, now),
        Some(false) => complete_milestone(store, mission_id, milestone_id, now),
    }
}

/// User input for one milestone of a new mission.
///
/// Parses from `title`, `title:xp` or `title:xp:gold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneDraft {
    pub title: String,
    pub description: Option<String>,
    pub xp_reward: u32,
    pub gold_reward: Option<u32>,
}

impl MilestoneDraft {
    pub fn new(title: &str, xp_reward: u32) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            xp_reward,
            gold_reward: None,
        }
    }

    pub fn with_gold_reward(mut self, gold: u32) -> Self {
        self.gold_reward = Some(gold);
        self
    }
}

impl FromStr for MilestoneDraft {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ValidationError::MalformedMilestone {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = s.splitn(3, ':');
        let title = parts.next().unwrap_or_default().trim();
        let xp_reward = match parts.next().map(str::trim) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| malformed("xp must be a non-negative integer"))?,
            None => DEFAULT_MILESTONE_XP,
        };
        let gold_reward = match parts.next().map(str::trim) {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| malformed("gold must be a non-negative integer"))?,
            ),
            None => None,
        };
        Ok(Self {
            title: title.to_string(),
            description: None,
            xp_reward,
            gold_reward,
        })
    }
}

/// User input for a new mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionDraft {
    pub title: String,
    pub description: String,
    pub milestones: Vec<MilestoneDraft>,
}

impl MissionDraft {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            milestones: Vec::new(),
        }
    }

    pub fn with_milestone(mut self, milestone: MilestoneDraft) -> Self {
        self.milestones.push(milestone);
        self
    }
}

/// Validate a draft and append it as a new mission with zero progress.
pub fn add_mission<S: KeyValueStore>(
    store: &TrackerStore<S>,
    draft: MissionDraft,
    now: DateTime<Utc>,
) -> Result<Mission, TrackerError> {
    let title = validate_title("mission", &draft.title)?;
    let description = validate_description("mission", &draft.description)?;
    if draft.milestones.is_empty() {
        return Err(ValidationError::NoMilestones.into());
    }

    let stamp = now.timestamp_millis();
    let mut milestones = Vec::with_capacity(draft.milestones.len());
    for (index, ms) in draft.milestones.into_iter().enumerate() {
        if ms.title.trim().is_empty() {
            return Err(ValidationError::MissingMilestoneTitle { index: index + 1 }.into());
        }
        let ms_title = validate_title("milestone", &ms.title)?;
        let mut milestone = Milestone::new(&format!("milestone-{}-{}", stamp, index), &ms_title, ms.xp_reward);
        milestone.description = ms.description.filter(|d| !d.trim().is_empty());
        milestone.gold_reward = ms.gold_reward;
        milestones.push(milestone);
    }

    let mut missions = store.get_missions();
    let id = timestamp_id("mission", now, |candidate| {
        missions.iter().any(|m| m.id == candidate)
    });
    let mut mission = Mission::new(&id, &title, &description, now);
    mission.milestones = milestones;
    mission.recompute_progress(now);

    missions.push(mission.clone());
    store.save_missions(&missions)?;
    info!(
        "Created mission '{}' with {} milestone(s)",
        loggable(&mission.title),
        mission.milestones.len()
    );
    Ok(mission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::storage::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn mission_with(n: usize) -> Mission {
        let mut mission = Mission::new("m1", "Marathon", "Run one", now());
        for i in 0..n {
            mission = mission.with_milestone(
                Milestone::new(&format!("ms{}", i), &format!("Step {}", i), 10).with_gold_reward(2),
            );
        }
        mission
    }

    fn setup_store(mission: Mission) -> TrackerStore<MemoryStore> {
        let store = TrackerStore::in_memory();
        store.save_stats(&UserStats::default()).unwrap();
        store.save_missions(&[mission]).unwrap();
        store
    }

    #[test]
    fn progress_tracks_completed_ratio() {
        let store = setup_store(mission_with(3));

        let first = complete_milestone(&store, "m1", "ms0", now()).unwrap().into_inner().unwrap();
        assert_eq!(first.mission.progress, 33);
        assert!(first.mission.completed_at.is_none());
        assert_eq!(first.stats.xp, 10);
        assert_eq!(first.stats.gold, 2);

        complete_milestone(&store, "m1", "ms1", now()).unwrap();
        let last = complete_milestone(&store, "m1", "ms2", now()).unwrap().into_inner().unwrap();
        assert_eq!(last.mission.progress, 100);
        assert_eq!(last.mission.completed_at, Some(now()));
        assert_eq!(store.get_missions()[0].progress, 100);
    }

    #[test]
    fn reopening_clears_mission_completion() {
        let store = setup_store(mission_with(2));
        complete_milestone(&store, "m1", "ms0", now()).unwrap();
        complete_milestone(&store, "m1", "ms1", now()).unwrap();

        let change = toggle_milestone(&store, "m1", "ms1", now()).unwrap();
        assert!(change.is_updated());
        let change = change.into_inner().unwrap();
        assert_eq!(change.mission.progress, 50);
        assert!(change.mission.completed_at.is_none());
        assert!(!change.mission.milestones[1].completed);
        assert!(change.mission.milestones[1].completed_at.is_none());
        assert_eq!(change.stats.xp, 10);
        assert_eq!(change.stats.gold, 2);
    }

    #[test]
    fn completing_done_milestone_is_unchanged() {
        let store = setup_store(mission_with(2));
        complete_milestone(&store, "m1", "ms0", now()).unwrap();
        let again = complete_milestone(&store, "m1", "ms0", now()).unwrap();
        assert!(matches!(again, Lookup::Unchanged(_)));
        assert_eq!(store.get_stats().xp, 10);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = setup_store(mission_with(1));
        assert_eq!(complete_milestone(&store, "zz", "ms0", now()).unwrap(), Lookup::NotFound);
        assert_eq!(complete_milestone(&store, "m1", "zz", now()).unwrap(), Lookup::NotFound);
        assert_eq!(toggle_milestone(&store, "m1", "zz", now()).unwrap(), Lookup::NotFound);
        assert_eq!(store.get_stats(), UserStats::default());
    }

    #[test]
    fn milestone_draft_parsing() {
        assert_eq!("Sign up".parse::<MilestoneDraft>().unwrap(), MilestoneDraft::new("Sign up", 10));
        assert_eq!(
            "Run 5k : 25 : 4".parse::<MilestoneDraft>().unwrap(),
            MilestoneDraft::new("Run 5k", 25).with_gold_reward(4)
        );
        assert!(matches!(
            "Run:lots".parse::<MilestoneDraft>(),
            Err(ValidationError::MalformedMilestone { .. })
        ));
    }

    #[test]
    fn add_mission_validates_and_persists() {
        let store = TrackerStore::in_memory();

        let no_ms = add_mission(&store, MissionDraft::new("Learn Rust", ""), now()).unwrap_err();
        assert!(matches!(no_ms, TrackerError::Validation(ValidationError::NoMilestones)));

        let blank = MissionDraft::new("Learn Rust", "")
            .with_milestone(MilestoneDraft::new("Book", 10))
            .with_milestone(MilestoneDraft::new(" ", 10));
        let err = add_mission(&store, blank, now()).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation(ValidationError::MissingMilestoneTitle { index: 2 })
        ));
        assert!(store.get_missions().is_empty());

        let draft = MissionDraft::new("Learn Rust", "Ownership and beyond")
            .with_milestone(MilestoneDraft::new("Read the book", 20))
            .with_milestone(MilestoneDraft::new("Ship a crate", 50).with_gold_reward(10));
        let mission = add_mission(&store, draft, now()).unwrap();
        assert_eq!(mission.id, format!("mission-{}", now().timestamp_millis()));
        assert_eq!(mission.progress, 0);
        assert_eq!(mission.milestones.len(), 2);
        assert_ne!(mission.milestones[0].id, mission.milestones[1].id);
        assert_eq!(store.get_missions(), vec![mission]);
    }
}
