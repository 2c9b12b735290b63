use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Subcommand;
use tracing::info;

use codesprint::config::Config;
use codesprint::content::{Chapter, ChapterCatalog, Difficulty};
use codesprint::engine::leaderboard;
use codesprint::engine::{ProgressSummary, RankBy};
use codesprint::store::JsonStore;
use codesprint::store::schema::UserExport;

use crate::ui::components::leaderboard_table::{format_row, header_row};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List practice chapters
    Chapters {
        #[arg(long, help = "Beginner, Intermediate or Advanced")]
        level: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(short, long, help = "Match title, category or snippet")]
        search: Option<String>,
    },
    /// Print the leaderboard
    Leaderboard {
        #[arg(long, help = "Rank by average accuracy instead of best WPM")]
        accuracy: bool,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print your progress summary
    Stats,
    /// Write your profile to a JSON file
    Export { file: std::path::PathBuf },
    /// Replace your profile with a previously exported file
    Import { file: std::path::PathBuf },
    /// Delete your history, progress and leaderboard rows
    ResetProgress {
        #[arg(long)]
        yes: bool,
    },
}

pub fn filter_chapters<'a>(
    catalog: &'a ChapterCatalog,
    language: &str,
    level: Option<Difficulty>,
    category: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Chapter> {
    let matching_search: Option<Vec<&str>> =
        search.map(|term| catalog.search(term).iter().map(|c| c.id.as_str()).collect());
    catalog
        .by_language(language)
        .into_iter()
        .filter(|c| level.is_none_or(|l| c.level == l))
        .filter(|c| category.is_none_or(|cat| c.category.eq_ignore_ascii_case(cat)))
        .filter(|c| {
            matching_search
                .as_ref()
                .is_none_or(|ids| ids.contains(&c.id.as_str()))
        })
        .collect()
}

pub fn run(
    command: Command,
    config: &Config,
    catalog: &ChapterCatalog,
    store: &JsonStore,
    out: &mut impl Write,
) -> Result<()> {
    let user_id = config.user_id();
    match command {
        Command::Chapters {
            level,
            category,
            search,
        } => {
            let level = match level.as_deref() {
                Some(raw) => match Difficulty::parse(raw) {
                    Some(l) => Some(l),
                    None => bail!("unknown level: {raw}"),
                },
                None => None,
            };
            let chapters = filter_chapters(
                catalog,
                &config.default_language,
                level,
                category.as_deref(),
                search.as_deref(),
            );
            let progress = store.load_progress(&user_id);
            for c in &chapters {
                let done = progress
                    .chapters
                    .get(&c.id)
                    .is_some_and(|p| p.completed);
                writeln!(
                    out,
                    "{} {:<18} {:<34} {:<12} {:<13} {}",
                    if done { "\u{2713}" } else { " " },
                    c.id,
                    c.title,
                    c.language,
                    c.level.as_str(),
                    c.category
                )?;
            }
            writeln!(out, "{} chapters", chapters.len())?;
        }
        Command::Leaderboard { accuracy, limit } => {
            let rank_by = if accuracy { RankBy::Accuracy } else { RankBy::Wpm };
            let board = store.load_leaderboard();
            let language = config.default_language.as_str();
            let rows = leaderboard::top(
                board.entries.values(),
                language,
                rank_by,
                limit.unwrap_or(config.leaderboard_size),
            );
            writeln!(out, "Leaderboard: {language} by {}", rank_by.label())?;
            writeln!(out, "{}", header_row())?;
            for row in &rows {
                writeln!(out, "{}", format_row(row))?;
            }
            if let Some(own) = leaderboard::user_rank(board.entries.values(), &user_id, language) {
                writeln!(out, "Your rank: #{}", own.rank)?;
            }
        }
        Command::Stats => {
            let history = store.load_history(&user_id);
            let progress = store.load_progress(&user_id);
            let s = ProgressSummary::compute(
                progress.chapters.values(),
                &history.entries,
                Utc::now().date_naive(),
            );
            writeln!(out, "Profile:         {}", config.username)?;
            writeln!(
                out,
                "Chapters done:   {}/{}",
                s.completed_chapters.len(),
                catalog.len()
            )?;
            writeln!(out, "Sessions:        {}", s.total_sessions)?;
            writeln!(out, "Best WPM:        {}", s.best_wpm)?;
            writeln!(out, "Average WPM:     {}", s.average_wpm)?;
            writeln!(out, "Avg accuracy:    {:.2}%", s.average_accuracy)?;
            writeln!(out, "Time typing:     {}s", s.total_time_secs)?;
            writeln!(out, "Current streak:  {} days", s.current_streak)?;
            writeln!(out, "Longest streak:  {} days", s.longest_streak)?;
        }
        Command::Export { file } => {
            let export = store.export_user(config);
            let json = serde_json::to_string_pretty(&export)?;
            fs::write(&file, json)
                .with_context(|| format!("cannot write {}", file.display()))?;
            info!(path = %file.display(), "exported profile");
            writeln!(
                out,
                "Exported {} sessions to {}",
                export.history.entries.len(),
                file.display()
            )?;
        }
        Command::Import { file } => {
            let export = read_export(&file)?;
            store.import_user(&export, &user_id, &config.username)?;
            writeln!(
                out,
                "Imported {} sessions into profile {}",
                export.history.entries.len(),
                config.username
            )?;
        }
        Command::ResetProgress { yes } => {
            if !yes {
                bail!("this deletes all progress for {}; rerun with --yes", config.username);
            }
            store.reset_user(&user_id)?;
            info!(user = %user_id, "reset progress");
            writeln!(out, "Progress for {} was reset", config.username)?;
        }
    }
    Ok(())
}

fn read_export(path: &Path) -> Result<UserExport> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a codesprint export", path.display()))
}
