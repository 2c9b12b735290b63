use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::leaderboard::ALL_LANGUAGES;

const MIN_LEADERBOARD_SIZE: usize = 1;
const MAX_LEADERBOARD_SIZE: usize = 500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_username() -> String {
    "player".to_string()
}
fn default_language() -> String {
    ALL_LANGUAGES.to_string()
}
fn default_leaderboard_size() -> usize {
    10
}
fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_chapters_dir() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codesprint")
        .join("chapters")
        .to_string_lossy()
        .to_string()
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codesprint")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: default_username(),
            default_language: default_language(),
            leaderboard_size: default_leaderboard_size(),
            theme: default_theme(),
            log_level: default_log_level(),
            chapters_dir: default_chapters_dir(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codesprint")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn chapters_path(&self) -> PathBuf {
        PathBuf::from(&self.chapters_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_path().join("codesprint.log")
    }

    /// Filesystem-safe key for the profile: lowercase ascii alphanumerics,
    /// with every other run of characters collapsed to `-`.
    pub fn user_id(&self) -> String {
        let mut id = String::new();
        for ch in self.username.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                id.push(ch.to_ascii_lowercase());
            } else if !id.is_empty() && !id.ends_with('-') {
                id.push('-');
            }
        }
        let id = id.trim_end_matches('-');
        if id.is_empty() {
            default_username()
        } else {
            id.to_string()
        }
    }

    pub fn validate(&mut self) {
        self.username = self.username.trim().to_string();
        if self.username.is_empty() {
            self.username = default_username();
        }
        self.leaderboard_size = self
            .leaderboard_size
            .clamp(MIN_LEADERBOARD_SIZE, MAX_LEADERBOARD_SIZE);
        if self.log_level.trim().is_empty() {
            self.log_level = default_log_level();
        }
    }

    /// Reset `default_language` to "all" unless it names a known language.
    pub fn normalize_language(&mut self, valid: &[String]) {
        if self.default_language == ALL_LANGUAGES {
            return;
        }
        match valid
            .iter()
            .find(|v| v.eq_ignore_ascii_case(&self.default_language))
        {
            Some(v) => self.default_language = v.clone(),
            None => self.default_language = default_language(),
        }
    }
}
