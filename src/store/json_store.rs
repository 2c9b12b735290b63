use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::content::Chapter;
use crate::engine::leaderboard::{LeaderboardEntry, entry_key};
use crate::engine::progress::ChapterProgress;
use crate::session::result::{SessionResult, StatHistoryEntry};
use crate::store::schema::{
    EXPORT_VERSION, LeaderboardData, ProgressData, StatHistoryData, UserExport,
};

const HISTORY_FILE: &str = "typing_stats.json";
const PROGRESS_FILE: &str = "progress.json";
const LEADERBOARD_FILE: &str = "leaderboard.json";

/// What a single completed session changed on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedSession {
    pub history_entry: StatHistoryEntry,
    pub progress_improved: bool,
    pub leaderboard_entry: LeaderboardEntry,
}

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codesprint");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.base_dir.join("users").join(user_id)
    }

    fn history_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join(HISTORY_FILE)
    }

    fn progress_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join(PROGRESS_FILE)
    }

    fn leaderboard_path(&self) -> PathBuf {
        self.base_dir.join(LEADERBOARD_FILE)
    }

    /// Missing files load as defaults. An unreadable file is moved to
    /// `.json.corrupt` first, so the next save cannot overwrite its contents.
    fn load<T: DeserializeOwned + Default>(&self, path: PathBuf) -> T {
        if !path.exists() {
            return T::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str(&content)?));
        match parsed {
            Ok(data) => data,
            Err(e) => {
                let corrupt_path = path.with_extension("json.corrupt");
                match fs::rename(&path, &corrupt_path) {
                    Ok(()) => warn!(
                        path = %path.display(),
                        moved_to = %corrupt_path.display(),
                        "unreadable store file, using defaults: {e:#}"
                    ),
                    Err(rename_err) => warn!(
                        path = %path.display(),
                        "unreadable store file, using defaults: {e:#} (could not move aside: {rename_err})"
                    ),
                }
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_history(&self, user_id: &str) -> StatHistoryData {
        self.load(self.history_path(user_id))
    }

    pub fn save_history(&self, user_id: &str, data: &StatHistoryData) -> Result<()> {
        self.save(self.history_path(user_id), data)
    }

    pub fn load_progress(&self, user_id: &str) -> ProgressData {
        self.load(self.progress_path(user_id))
    }

    pub fn save_progress(&self, user_id: &str, data: &ProgressData) -> Result<()> {
        self.save(self.progress_path(user_id), data)
    }

    pub fn load_leaderboard(&self) -> LeaderboardData {
        self.load(self.leaderboard_path())
    }

    pub fn save_leaderboard(&self, data: &LeaderboardData) -> Result<()> {
        self.save(self.leaderboard_path(), data)
    }

    /// Persist one completed session: history, chapter progress and the
    /// leaderboard aggregate for the chapter's language. The three files are
    /// committed together; on failure none of them change.
    pub fn record_session(
        &self,
        user_id: &str,
        username: &str,
        chapter: &Chapter,
        result: &SessionResult,
    ) -> Result<RecordedSession> {
        let history_entry = StatHistoryEntry::from_result(&chapter.id, &chapter.language, result);
        let mut history = self.load_history(user_id);
        history.push(history_entry.clone());

        let mut progress = self.load_progress(user_id);
        let progress_improved = match progress.chapters.get_mut(&chapter.id) {
            Some(existing) => existing.merge(result),
            None => {
                progress.chapters.insert(
                    chapter.id.clone(),
                    ChapterProgress::from_result(&chapter.id, result),
                );
                true
            }
        };

        let mut leaderboard = self.load_leaderboard();
        let leaderboard_entry = leaderboard
            .entries
            .entry(entry_key(user_id, &chapter.language))
            .and_modify(|e| e.apply(username, result))
            .or_insert_with(|| {
                LeaderboardEntry::first(user_id, username, &chapter.language, result)
            })
            .clone();

        let files: Vec<(PathBuf, String)> = vec![
            (
                self.history_path(user_id),
                serde_json::to_string_pretty(&history)?,
            ),
            (
                self.progress_path(user_id),
                serde_json::to_string_pretty(&progress)?,
            ),
            (
                self.leaderboard_path(),
                serde_json::to_string_pretty(&leaderboard)?,
            ),
        ];
        self.commit_files("Save", &files)?;

        info!(
            user = user_id,
            chapter = %chapter.id,
            wpm = result.wpm,
            accuracy = result.accuracy,
            progress_improved,
            "recorded session"
        );

        Ok(RecordedSession {
            history_entry,
            progress_improved,
            leaderboard_entry,
        })
    }

    pub fn export_user(&self, config: &Config) -> UserExport {
        let user_id = config.user_id();
        UserExport {
            codesprint_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            history: self.load_history(&user_id),
            progress: self.load_progress(&user_id),
            leaderboard: self.load_leaderboard().user_entries(&user_id),
            config: config.clone(),
            user_id,
        }
    }

    /// Replace `user_id`'s data with an export, which may come from another
    /// profile name. Leaderboard rows are rekeyed to `user_id`.
    pub fn import_user(&self, data: &UserExport, user_id: &str, username: &str) -> Result<()> {
        if data.codesprint_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.codesprint_export_version,
                EXPORT_VERSION
            );
        }

        let mut leaderboard = self.load_leaderboard();
        leaderboard.entries.retain(|_, e| e.user_id != user_id);
        for entry in &data.leaderboard {
            let mut entry = entry.clone();
            entry.user_id = user_id.to_string();
            entry.username = username.to_string();
            leaderboard
                .entries
                .insert(entry_key(user_id, &entry.language), entry);
        }

        let files: Vec<(PathBuf, String)> = vec![
            (
                self.history_path(user_id),
                serde_json::to_string_pretty(&data.history)?,
            ),
            (
                self.progress_path(user_id),
                serde_json::to_string_pretty(&data.progress)?,
            ),
            (
                self.leaderboard_path(),
                serde_json::to_string_pretty(&leaderboard)?,
            ),
        ];

        self.commit_files("Import", &files)?;
        info!(
            user = user_id,
            sessions = data.history.entries.len(),
            "imported profile"
        );
        Ok(())
    }

    /// Two-phase write of several files with best-effort `.bak` rollback.
    ///
    /// Every file is first staged as `.json.tmp`; if any staging write fails
    /// nothing is touched. Each original is then moved to `.json.bak` before
    /// the staged file takes its place, and a failure restores the backups.
    /// `action` prefixes error messages.
    fn commit_files(&self, action: &str, files: &[(PathBuf, String)]) -> Result<()> {
        let mut staged: Vec<PathBuf> = Vec::new();
        for (path, json) in files {
            let tmp_path = path.with_extension("json.tmp");
            match (|| -> Result<()> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
                Ok(())
            })() {
                Ok(()) => staged.push(tmp_path),
                Err(e) => {
                    for tmp in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    bail!("{action} failed during staging: {e}");
                }
            }
        }

        // (final, bak, had_original) so rollback can restore absence
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        let rollback = |committed: &[(PathBuf, PathBuf, bool)]| {
            for (final_path, bak_path, had_original) in committed {
                if *had_original {
                    let _ = fs::rename(bak_path, final_path);
                } else {
                    let _ = fs::remove_file(final_path);
                }
            }
        };

        for (i, (final_path, _)) in files.iter().enumerate() {
            let bak_path = final_path.with_extension("json.bak");
            let tmp_path = &staged[i];
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(final_path, &bak_path) {
                rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                bail!("{action} failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(tmp_path, final_path) {
                if had_original && bak_path.exists() {
                    let _ = fs::rename(&bak_path, final_path);
                } else {
                    let _ = fs::remove_file(final_path);
                }
                rollback(&committed);
                for tmp in &staged[i + 1..] {
                    let _ = fs::remove_file(tmp);
                }
                bail!("{action} failed during commit (rename): {e}");
            }

            committed.push((final_path.clone(), bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        Ok(())
    }

    /// Remove `.bak` files left by an interrupted import for `user_id`.
    /// Returns true if any were found.
    pub fn check_interrupted_import(&self, user_id: &str) -> bool {
        let candidates = [
            self.history_path(user_id),
            self.progress_path(user_id),
            self.leaderboard_path(),
        ];
        let mut found = false;
        for path in candidates {
            let bak_path = path.with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                warn!(path = %bak_path.display(), "removing leftover import backup");
                let _ = fs::remove_file(&bak_path);
            }
        }
        found
    }

    /// Delete a user's history and progress and drop their leaderboard rows.
    pub fn reset_user(&self, user_id: &str) -> Result<()> {
        let dir = self.user_dir(user_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }

        let mut leaderboard = self.load_leaderboard();
        let before = leaderboard.entries.len();
        leaderboard.entries.retain(|_, e| e.user_id != user_id);
        if leaderboard.entries.len() != before {
            self.save_leaderboard(&leaderboard)?;
        }
        debug!(user = user_id, removed = before - leaderboard.entries.len(), "reset profile");
        Ok(())
    }
}
