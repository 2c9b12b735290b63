use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::streak;
use crate::session::result::{SessionResult, StatHistoryEntry};

/// Best record of one user on one chapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterProgress {
    pub chapter_id: String,
    pub completed: bool,
    pub wpm: u32,
    pub accuracy: u32,
    pub updated_at: DateTime<Utc>,
}

impl ChapterProgress {
    pub fn from_result(chapter_id: &str, result: &SessionResult) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            completed: true,
            wpm: result.wpm,
            accuracy: result.accuracy,
            updated_at: result.completed_at,
        }
    }

    /// Keeps the better of each stat. Returns true if anything improved.
    pub fn merge(&mut self, result: &SessionResult) -> bool {
        let improved = !self.completed || result.wpm > self.wpm || result.accuracy > self.accuracy;
        self.completed = true;
        self.wpm = self.wpm.max(result.wpm);
        self.accuracy = self.accuracy.max(result.accuracy);
        if improved {
            self.updated_at = result.completed_at;
        }
        improved
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub completed_chapters: Vec<String>,
    pub total_sessions: usize,
    pub best_wpm: u32,
    pub average_wpm: u32,
    pub average_accuracy: f64,
    pub total_time_secs: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl ProgressSummary {
    pub fn compute<'a, P>(progress: P, history: &[StatHistoryEntry], today: NaiveDate) -> Self
    where
        P: IntoIterator<Item = &'a ChapterProgress>,
    {
        let mut completed_chapters = Vec::new();
        let mut best_wpm = 0;
        for p in progress {
            if p.completed {
                completed_chapters.push(p.chapter_id.clone());
            }
            best_wpm = best_wpm.max(p.wpm);
        }
        completed_chapters.sort();

        let (average_wpm, average_accuracy) = if history.is_empty() {
            (0, 0.0)
        } else {
            let n = history.len() as f64;
            let wpm_sum: u64 = history.iter().map(|h| h.wpm as u64).sum();
            let acc_sum: u64 = history.iter().map(|h| h.accuracy as u64).sum();
            (
                (wpm_sum as f64 / n).round() as u32,
                (acc_sum as f64 / n * 100.0).round() / 100.0,
            )
        };

        Self {
            completed_chapters,
            total_sessions: history.len(),
            best_wpm,
            average_wpm,
            average_accuracy,
            total_time_secs: history.iter().map(|h| h.elapsed_secs).sum(),
            current_streak: streak::compute_streak(history, today),
            longest_streak: streak::longest_streak(history),
        }
    }
}
