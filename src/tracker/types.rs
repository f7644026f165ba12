use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::economy;

/// Experience threshold for leaving level 1.
pub const BASE_LEVEL_THRESHOLD: u32 = 100;

/// Aggregate progression for the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub gold: u32,
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<DateTime<Utc>>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: BASE_LEVEL_THRESHOLD,
            gold: 0,
            streak: 0,
            last_active_date: None,
        }
    }
}

impl UserStats {
    /// Percentage of the way to the next level, 0-100.
    pub fn level_progress(&self) -> u8 {
        if self.xp_to_next_level == 0 {
            return 0;
        }
        let pct = u64::from(self.xp) * 100 / u64::from(self.xp_to_next_level);
        pct.min(100) as u8
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum QuestCategory {
    Daily,
    Weekly,
    SideHustle,
}

impl QuestCategory {
    pub const ALL: [QuestCategory; 3] = [
        QuestCategory::Daily,
        QuestCategory::Weekly,
        QuestCategory::SideHustle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestCategory::Daily => "daily",
            QuestCategory::Weekly => "weekly",
            QuestCategory::SideHustle => "side-hustle",
        }
    }
}

impl fmt::Display for QuestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(QuestCategory::Daily),
            "weekly" => Ok(QuestCategory::Weekly),
            "side-hustle" | "side_hustle" | "sidehustle" => Ok(QuestCategory::SideHustle),
            other => Err(format!(
                "unknown quest category '{}' (expected daily, weekly or side-hustle)",
                other
            )),
        }
    }
}

/// A short task that pays out experience (and optionally gold) when completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_reward: Option<u32>,
    pub completed: bool,
    pub repeatable: bool,
    pub category: QuestCategory,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        xp_reward: u32,
        category: QuestCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            xp_reward,
            gold_reward: None,
            completed: false,
            repeatable: false,
            category,
            created_at,
            completed_at: None,
        }
    }

    pub fn with_gold_reward(mut self, gold: u32) -> Self {
        self.gold_reward = Some(gold);
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn mark_complete(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
    }

    pub fn mark_incomplete(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    /// True for quests cleared by the daily reset.
    pub fn resets_daily(&self) -> bool {
        self.repeatable && self.category == QuestCategory::Daily
    }
}

/// An atomic sub-goal of a mission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub xp_reward: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_reward: Option<u32>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Milestone {
    pub fn new(id: &str, title: &str, xp_reward: u32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            xp_reward,
            gold_reward: None,
            completed: false,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_gold_reward(mut self, gold: u32) -> Self {
        self.gold_reward = Some(gold);
        self
    }
}

/// A long-term goal composed of ordered milestones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    pub milestones: Vec<Milestone>,
    /// Derived from milestone completion, 0-100.
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Mission {
    pub fn new(id: &str, title: &str, description: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            milestones: Vec::new(),
            progress: 0,
            created_at,
            completed_at: None,
        }
    }

    pub fn with_milestone(mut self, milestone: Milestone) -> Self {
        self.milestones.push(milestone);
        self
    }

    pub fn completed_milestones(&self) -> usize {
        self.milestones.iter().filter(|m| m.completed).count()
    }

    pub fn is_complete(&self) -> bool {
        self.progress == 100
    }

    /// Recompute `progress` from milestones and keep `completed_at` in step with it.
    pub fn recompute_progress(&mut self, now: DateTime<Utc>) {
        self.progress = economy::mission_progress(self.completed_milestones(), self.milestones.len());
        if self.progress == 100 {
            self.completed_at.get_or_insert(now);
        } else {
            self.completed_at = None;
        }
    }
}

/// A purchasable unlock paid for with experience and optionally gold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp_cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_cost: Option<u32>,
    pub purchased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        xp_cost: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            xp_cost,
            gold_cost: None,
            purchased: false,
            purchased_at: None,
            created_at,
        }
    }

    pub fn with_gold_cost(mut self, gold: u32) -> Self {
        self.gold_cost = Some(gold);
        self
    }
}

/// Tagged outcome of a mutation addressed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The record was found and state changed.
    Updated(T),
    /// The record was found but the call was a no-op.
    Unchanged(T),
    /// No record with the requested id exists.
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        !matches!(self, Lookup::NotFound)
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Lookup::Updated(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Lookup::Updated(value) | Lookup::Unchanged(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn into_inner(self) -> Option<T> {
        match self {
            Lookup::Updated(value) | Lookup::Unchanged(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}
