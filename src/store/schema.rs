use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::leaderboard::LeaderboardEntry;
use crate::engine::progress::ChapterProgress;
use crate::session::result::StatHistoryEntry;

const SCHEMA_VERSION: u32 = 1;

/// Oldest entries are dropped past this length.
pub const MAX_HISTORY: usize = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatHistoryData {
    pub schema_version: u32,
    pub entries: Vec<StatHistoryEntry>,
}

impl Default for StatHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

impl StatHistoryData {
    pub fn push(&mut self, entry: StatHistoryEntry) {
        self.entries.push(entry);
        if self.entries.len() > MAX_HISTORY {
            let excess = self.entries.len() - MAX_HISTORY;
            self.entries.drain(..excess);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    pub schema_version: u32,
    pub chapters: BTreeMap<String, ChapterProgress>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            chapters: BTreeMap::new(),
        }
    }
}

/// One row per `(user, language)`, keyed by [`crate::engine::leaderboard::entry_key`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardData {
    pub schema_version: u32,
    pub entries: BTreeMap<String, LeaderboardEntry>,
}

impl Default for LeaderboardData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl LeaderboardData {
    pub fn user_entries(&self, user_id: &str) -> Vec<LeaderboardEntry> {
        self.entries
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }
}

pub const EXPORT_VERSION: u32 = 1;

/// Everything one profile owns, as written by `codesprint export`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserExport {
    pub codesprint_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub user_id: String,
    pub config: Config,
    pub history: StatHistoryData,
    pub progress: ProgressData,
    pub leaderboard: Vec<LeaderboardEntry>,
}
