//! Gamified productivity tracker.
//!
//! Quests, missions and rewards feed a single [`UserStats`] record. Completing work
//! grants xp and gold, xp rolls over into levels, and rewards spend both.

pub mod clock;
pub mod economy;
pub mod errors;
pub mod mission;
pub mod quest;
pub mod reward;
pub mod seed;
pub mod state;
pub mod storage;
pub mod streak;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use economy::{apply_gold, apply_xp, grant_rewards, level_threshold, mission_progress, revoke_rewards};
pub use errors::TrackerError;
pub use mission::{
    add_mission, complete_milestone, toggle_milestone, uncomplete_milestone, MilestoneDraft,
    MissionChange, MissionDraft,
};
pub use quest::{
    add_side_hustle_task, complete_quest, reset_daily_quests, side_hustle_weeks, toggle_quest,
    uncomplete_quest, CategorySummary, QuestChange, SideHustleDraft, WeekGroup,
};
pub use reward::{can_purchase, purchase_reward, PurchaseOutcome, PurchaseRefusal};
pub use seed::{initialize_default_data, SeedReport};
pub use state::{DashboardSummary, Tracker};
pub use storage::{KeyValueStore, MemoryStore, SledStore, Slot, TrackerStore};
pub use streak::{record_visit, StreakChange};
pub use types::{Lookup, Milestone, Mission, Quest, QuestCategory, Reward, UserStats};
