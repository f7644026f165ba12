//! Consecutive-day visit streaks.
//!
//! Days are compared as calendar dates in the caller's time zone. The check runs once
//! per load; a session left open across midnight is only counted on the next load.

use chrono::{DateTime, TimeZone, Utc};

use crate::tracker::types::UserStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already visited today; nothing changed.
    SameDay,
    /// Last visit was yesterday; streak incremented.
    Continued,
    /// First visit ever or a gap of more than a day; streak restarted at 1.
    Reset,
}

/// Record a visit at `now`, updating `streak` and `last_active_date`.
pub fn record_visit<Tz: TimeZone>(stats: &mut UserStats, now: &DateTime<Tz>) -> StreakChange {
    let tz = now.timezone();
    let today = now.date_naive();
    let last_day = stats
        .last_active_date
        .map(|last| last.with_timezone(&tz).date_naive());

    let change = match last_day {
        Some(day) if day == today => return StreakChange::SameDay,
        Some(day) if today.pred_opt() == Some(day) => {
            stats.streak = stats.streak.saturating_add(1);
            StreakChange::Continued
        }
        _ => {
            stats.streak = 1;
            StreakChange::Reset
        }
    };
    stats.last_active_date = Some(now.with_timezone(&Utc));
    change
}
