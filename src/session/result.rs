use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Final statistics of a completed session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub error_count: usize,
    pub elapsed_secs: u64,
    pub total_words: u32,
    pub correct_words: u32,
    pub completed_at: DateTime<Utc>,
}

/// One persisted row of typing history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatHistoryEntry {
    pub chapter_id: String,
    #[serde(default)]
    pub language: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
    #[serde(default)]
    pub elapsed_secs: u64,
    pub timestamp: DateTime<Utc>,
}

impl StatHistoryEntry {
    pub fn from_result(chapter_id: &str, language: &str, result: &SessionResult) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            language: language.to_string(),
            wpm: result.wpm,
            accuracy: result.accuracy,
            errors: result.error_count,
            elapsed_secs: result.elapsed_secs,
            timestamp: result.completed_at,
        }
    }

    /// Calendar day of the session, in UTC.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
