use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, Utc};

use crate::session::result::StatHistoryEntry;

/// Distinct UTC days on which at least one session was completed.
pub fn active_days(history: &[StatHistoryEntry]) -> BTreeSet<NaiveDate> {
    history.iter().map(StatHistoryEntry::day).collect()
}

/// Consecutive practice days ending at `today`.
///
/// A history without a session on `today` has no current streak, even if
/// it contains a long run ending yesterday.
pub fn compute_streak(history: &[StatHistoryEntry], today: NaiveDate) -> u32 {
    let days = active_days(history);
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    streak
}

pub fn current_streak(history: &[StatHistoryEntry]) -> u32 {
    compute_streak(history, Utc::now().date_naive())
}

/// Longest run of consecutive practice days anywhere in the history.
pub fn longest_streak(history: &[StatHistoryEntry]) -> u32 {
    let mut best = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for day in active_days(history) {
        run = match prev {
            Some(p) if day.signed_duration_since(p).num_days() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}
