use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use rust_embed::Embed;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::content::chapter::{Chapter, Difficulty};
use crate::engine::leaderboard::ALL_LANGUAGES;

#[derive(Embed)]
#[folder = "assets/chapters/"]
struct ChapterAssets;

#[derive(Debug, Deserialize)]
struct ChapterFile {
    #[serde(default)]
    chapters: Vec<Chapter>,
}

fn parse_chapter_file(content: &str) -> Result<Vec<Chapter>> {
    let file: ChapterFile = toml::from_str(content)?;
    Ok(file.chapters)
}

/// Read-only set of practice chapters, ordered by language, level and order.
#[derive(Clone, Debug, Default)]
pub struct ChapterCatalog {
    chapters: Vec<Chapter>,
}

impl ChapterCatalog {
    pub fn from_chapters(chapters: Vec<Chapter>) -> Self {
        let mut by_id: BTreeMap<String, Chapter> = BTreeMap::new();
        for chapter in chapters {
            by_id.insert(chapter.id.clone(), chapter);
        }
        let mut chapters: Vec<Chapter> = by_id.into_values().collect();
        chapters.sort_by(|a, b| {
            a.language
                .cmp(&b.language)
                .then(a.level.cmp(&b.level))
                .then(a.order.cmp(&b.order))
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { chapters }
    }

    /// Chapters shipped with the binary.
    pub fn bundled() -> Result<Self> {
        let mut chapters = Vec::new();
        for name in ChapterAssets::iter() {
            let Some(file) = ChapterAssets::get(&name) else {
                continue;
            };
            let content = std::str::from_utf8(file.data.as_ref())
                .with_context(|| format!("bundled chapter file {name} is not UTF-8"))?;
            let parsed = parse_chapter_file(content)
                .with_context(|| format!("invalid bundled chapter file {name}"))?;
            chapters.extend(parsed);
        }
        Ok(Self::from_chapters(chapters))
    }

    /// Bundled chapters plus every `*.toml` in `user_dir`; user chapters
    /// replace bundled ones with the same id. Unreadable files are skipped.
    pub fn load(user_dir: &Path) -> Result<Self> {
        let mut chapters = Self::bundled()?.chapters;

        if let Ok(entries) = fs::read_dir(user_dir) {
            let mut paths: Vec<_> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("toml"))
                .collect();
            paths.sort();

            for path in paths {
                match fs::read_to_string(&path)
                    .map_err(anyhow::Error::from)
                    .and_then(|c| parse_chapter_file(&c))
                {
                    Ok(parsed) => {
                        debug!(path = %path.display(), count = parsed.len(), "loaded user chapters");
                        chapters.extend(parsed);
                    }
                    Err(e) => warn!(path = %path.display(), "skipping chapter file: {e:#}"),
                }
            }
        }

        Ok(Self::from_chapters(chapters))
    }

    pub fn all(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Case-insensitive; [`ALL_LANGUAGES`] returns everything.
    pub fn by_language(&self, language: &str) -> Vec<&Chapter> {
        self.chapters
            .iter()
            .filter(|c| language == ALL_LANGUAGES || c.language.eq_ignore_ascii_case(language))
            .collect()
    }

    pub fn by_level(&self, level: Difficulty) -> Vec<&Chapter> {
        self.chapters.iter().filter(|c| c.level == level).collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Chapter> {
        self.chapters
            .iter()
            .filter(|c| c.category.eq_ignore_ascii_case(category))
            .collect()
    }

    pub fn search(&self, term: &str) -> Vec<&Chapter> {
        self.chapters.iter().filter(|c| c.matches_term(term)).collect()
    }

    /// Distinct languages in catalog order.
    pub fn languages(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in &self.chapters {
            if !out.contains(&c.language) {
                out.push(c.language.clone());
            }
        }
        out
    }

    pub fn group_by_category(&self) -> BTreeMap<String, Vec<&Chapter>> {
        let mut groups: BTreeMap<String, Vec<&Chapter>> = BTreeMap::new();
        for c in &self.chapters {
            groups.entry(c.category.clone()).or_default().push(c);
        }
        groups
    }

    pub fn group_by_language(&self) -> BTreeMap<String, Vec<&Chapter>> {
        let mut groups: BTreeMap<String, Vec<&Chapter>> = BTreeMap::new();
        for c in &self.chapters {
            groups.entry(c.language.clone()).or_default().push(c);
        }
        groups
    }

    pub fn random<R: Rng + ?Sized>(&self, language: &str, rng: &mut R) -> Option<&Chapter> {
        self.by_language(language).choose(rng).copied()
    }
}
