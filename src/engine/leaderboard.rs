use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::result::SessionResult;

/// Language filter value that matches every entry.
pub const ALL_LANGUAGES: &str = "all";

/// Aggregate best-score record for one user in one language.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub language: String,
    pub best_wpm: u32,
    pub avg_accuracy: f64,
    pub total_tests: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: LeaderboardEntry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankBy {
    Wpm,
    Accuracy,
}

impl RankBy {
    pub fn label(self) -> &'static str {
        match self {
            RankBy::Wpm => "Best WPM",
            RankBy::Accuracy => "Avg Accuracy",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            RankBy::Wpm => RankBy::Accuracy,
            RankBy::Accuracy => RankBy::Wpm,
        }
    }
}

pub fn entry_key(user_id: &str, language: &str) -> String {
    format!("{user_id}_{language}")
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl LeaderboardEntry {
    pub fn first(user_id: &str, username: &str, language: &str, result: &SessionResult) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            language: language.to_string(),
            best_wpm: result.wpm,
            avg_accuracy: result.accuracy as f64,
            total_tests: 1,
            last_updated: result.completed_at,
        }
    }

    /// Folds one more completed session into the aggregate.
    pub fn apply(&mut self, username: &str, result: &SessionResult) {
        let prior = self.total_tests as f64;
        self.total_tests += 1;
        self.best_wpm = self.best_wpm.max(result.wpm);
        self.avg_accuracy =
            round2((self.avg_accuracy * prior + result.accuracy as f64) / self.total_tests as f64);
        self.username = username.to_string();
        self.last_updated = result.completed_at;
    }

    fn matches(&self, language: &str) -> bool {
        language == ALL_LANGUAGES || self.language == language
    }
}

fn compare_by(rank_by: RankBy, a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    let primary = match rank_by {
        RankBy::Wpm => b.best_wpm.cmp(&a.best_wpm),
        RankBy::Accuracy => b
            .avg_accuracy
            .partial_cmp(&a.avg_accuracy)
            .unwrap_or(Ordering::Equal),
    };
    primary
        .then_with(|| a.username.cmp(&b.username))
        .then_with(|| a.language.cmp(&b.language))
}

/// Top `limit` entries for `language` (or [`ALL_LANGUAGES`]), ranked from 1.
pub fn top<'a, I>(entries: I, language: &str, rank_by: RankBy, limit: usize) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a LeaderboardEntry>,
{
    let mut rows: Vec<&LeaderboardEntry> =
        entries.into_iter().filter(|e| e.matches(language)).collect();
    rows.sort_by(|a, b| compare_by(rank_by, a, b));
    rows.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, entry)| RankedEntry {
            rank: i + 1,
            entry: entry.clone(),
        })
        .collect()
}

pub fn top_by_wpm<'a, I>(entries: I, language: &str, limit: usize) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a LeaderboardEntry>,
{
    top(entries, language, RankBy::Wpm, limit)
}

pub fn top_by_accuracy<'a, I>(entries: I, language: &str, limit: usize) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a LeaderboardEntry>,
{
    top(entries, language, RankBy::Accuracy, limit)
}

/// Rank of `user_id` by best WPM: one plus the number of strictly faster entries.
///
/// With [`ALL_LANGUAGES`] the user's fastest language is ranked against every row.
pub fn user_rank<'a, I>(entries: I, user_id: &str, language: &str) -> Option<RankedEntry>
where
    I: IntoIterator<Item = &'a LeaderboardEntry> + Clone,
{
    let own = entries
        .clone()
        .into_iter()
        .filter(|e| e.user_id == user_id && e.matches(language))
        .max_by_key(|e| e.best_wpm)?;

    let faster = entries
        .into_iter()
        .filter(|e| e.matches(language) && e.best_wpm > own.best_wpm)
        .count();

    Some(RankedEntry {
        rank: faster + 1,
        entry: own.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
    }

    fn result(wpm: u32, accuracy: u32) -> SessionResult {
        SessionResult {
            wpm,
            accuracy,
            error_count: 0,
            elapsed_secs: 60,
            total_words: 20,
            correct_words: 20,
            completed_at: ts(),
        }
    }

    fn entry(user: &str, language: &str, wpm: u32, accuracy: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: user.to_string(),
            username: user.to_string(),
            language: language.to_string(),
            best_wpm: wpm,
            avg_accuracy: accuracy,
            total_tests: 1,
            last_updated: ts(),
        }
    }

    fn board() -> Vec<LeaderboardEntry> {
        vec![
            entry("ana", "Rust", 72, 91.0),
            entry("bo", "Rust", 55, 99.5),
            entry("cy", "Python", 80, 88.0),
            entry("ana", "Python", 60, 97.0),
            entry("dee", "Rust", 72, 93.0),
        ]
    }

    #[test]
    fn test_apply_keeps_best_and_running_mean() {
        let mut e = LeaderboardEntry::first("u1", "Ada", "Rust", &result(40, 90));
        e.apply("Ada L.", &result(35, 95));
        assert_eq!(e.best_wpm, 40);
        assert_eq!(e.total_tests, 2);
        assert_eq!(e.avg_accuracy, 92.5);
        assert_eq!(e.username, "Ada L.");

        e.apply("Ada L.", &result(50, 96));
        assert_eq!(e.best_wpm, 50);
        assert_eq!(e.total_tests, 3);
        // (92.5 * 2 + 96) / 3 = 93.666.. -> 93.67
        assert_eq!(e.avg_accuracy, 93.67);
    }

    #[test]
    fn test_top_by_wpm_all_languages() {
        let rows = top_by_wpm(&board(), ALL_LANGUAGES, 10);
        let names: Vec<(&str, u32)> = rows
            .iter()
            .map(|r| (r.entry.user_id.as_str(), r.entry.best_wpm))
            .collect();
        assert_eq!(
            names,
            vec![("cy", 80), ("ana", 72), ("dee", 72), ("ana", 60), ("bo", 55)]
        );
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[4].rank, 5);
    }

    #[test]
    fn test_top_filters_language_and_limits() {
        let rows = top_by_wpm(&board(), "Rust", 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.entry.language == "Rust"));
        assert_eq!(rows[0].entry.user_id, "ana");
        assert_eq!(rows[1].entry.user_id, "dee");
    }

    #[test]
    fn test_top_by_accuracy() {
        let rows = top_by_accuracy(&board(), "Rust", 10);
        assert_eq!(rows[0].entry.user_id, "bo");
        assert_eq!(rows[2].entry.user_id, "ana");
    }

    #[test]
    fn test_user_rank_counts_strictly_faster() {
        let entries = board();
        let rank = user_rank(&entries, "dee", "Rust").unwrap();
        // ana ties at 72, so dee is still 1st
        assert_eq!(rank.rank, 1);

        let rank = user_rank(&entries, "bo", "Rust").unwrap();
        assert_eq!(rank.rank, 3);
    }

    #[test]
    fn test_user_rank_all_uses_best_language() {
        let entries = board();
        let rank = user_rank(&entries, "ana", ALL_LANGUAGES).unwrap();
        assert_eq!(rank.entry.language, "Rust");
        assert_eq!(rank.rank, 2);
    }

    #[test]
    fn test_user_rank_missing_user() {
        assert!(user_rank(&board(), "nobody", ALL_LANGUAGES).is_none());
        assert!(user_rank(&board(), "bo", "Python").is_none());
    }
}
