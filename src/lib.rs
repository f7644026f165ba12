//! # LifeLeveler - Gamified Productivity Tracker
//!
//! LifeLeveler turns everyday habits into an RPG-style progression loop. Users complete
//! quests, work through multi-milestone missions, and spend the experience and gold they
//! earn on self-chosen rewards.
//!
//! ## Features
//!
//! - **Quests**: Daily, weekly and side-hustle tasks that can be toggled complete/incomplete.
//! - **Missions**: Long-term goals made of ordered milestones with derived progress.
//! - **Rewards**: Purchasable unlocks gated on experience and optional gold.
//! - **Leveling**: Exponential level curve with multi-level rollover on large rewards.
//! - **Streaks**: Consecutive-day visit tracking, refreshed each time the tracker loads.
//! - **Auth**: Pluggable authentication backend with admin role checks and route guards.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lifeleveler::tracker::{Tracker, TrackerStore};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = TrackerStore::open("./data/tracker")?;
//!     let mut tracker = Tracker::load(store)?;
//!
//!     tracker.toggle_quest_completion("quest-1")?;
//!     println!("Level {} ({} xp)", tracker.stats().level, tracker.stats().xp);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`tracker`] - Data model, economy, domain mutators and the in-memory tracker state
//! - [`auth`] - Authentication provider, backend trait, notices and route guards
//! - [`config`] - Configuration management
//! - [`validation`] - Input validation for user-created quests and missions
//! - [`logutil`] - Helpers for keeping user text readable in logs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Tracker      │ ← In-memory cache + mutation entry points
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ Domain Mutators │ ← Quest / milestone / reward rules, economy
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  TrackerStore   │ ← JSON slots over a key-value port (sled)
//! └─────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod logutil;
pub mod tracker;
pub mod validation;
