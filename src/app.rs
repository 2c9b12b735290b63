use chrono::{DateTime, NaiveDate, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, warn};

use codesprint::config::Config;
use codesprint::content::{Chapter, ChapterCatalog, TAB_WIDTH};
use codesprint::engine::leaderboard::{self, ALL_LANGUAGES};
use codesprint::engine::{ChapterProgress, ProgressSummary, RankBy, RankedEntry};
use codesprint::session::input;
use codesprint::session::{SessionResult, StatHistoryEntry, TypingSession};
use codesprint::store::schema::{LeaderboardData, ProgressData, StatHistoryData};
use codesprint::store::{JsonStore, RecordedSession};

use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    ChapterSelect,
    Practice,
    Result,
    Leaderboard,
    Stats,
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: Theme,
    pub catalog: ChapterCatalog,
    pub store: Option<JsonStore>,
    pub user_id: String,
    /// "all" followed by every catalog language.
    pub languages: Vec<String>,
    pub language_idx: usize,
    pub chapter_selected: usize,
    pub chapter: Option<Chapter>,
    pub session: Option<TypingSession>,
    pub last_result: Option<SessionResult>,
    pub last_recorded: Option<RecordedSession>,
    pub history: StatHistoryData,
    pub progress: ProgressData,
    pub leaderboard: LeaderboardData,
    pub rank_by: RankBy,
    pub board_language_idx: usize,
    pub should_quit: bool,
    rng: SmallRng,
}

impl App {
    pub fn new(config: Config, theme: Theme, catalog: ChapterCatalog, store: Option<JsonStore>) -> Self {
        let user_id = config.user_id();
        let mut languages = vec![ALL_LANGUAGES.to_string()];
        languages.extend(catalog.languages());
        let language_idx = languages
            .iter()
            .position(|l| *l == config.default_language)
            .unwrap_or(0);

        let (history, progress, leaderboard) = match &store {
            Some(s) => (
                s.load_history(&user_id),
                s.load_progress(&user_id),
                s.load_leaderboard(),
            ),
            None => Default::default(),
        };

        Self {
            screen: AppScreen::ChapterSelect,
            config,
            theme,
            catalog,
            store,
            user_id,
            languages,
            language_idx,
            chapter_selected: 0,
            chapter: None,
            session: None,
            last_result: None,
            last_recorded: None,
            history,
            progress,
            leaderboard,
            rank_by: RankBy::Wpm,
            board_language_idx: language_idx,
            should_quit: false,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn language(&self) -> &str {
        self.languages
            .get(self.language_idx)
            .map(String::as_str)
            .unwrap_or(ALL_LANGUAGES)
    }

    pub fn board_language(&self) -> &str {
        self.languages
            .get(self.board_language_idx)
            .map(String::as_str)
            .unwrap_or(ALL_LANGUAGES)
    }

    pub fn visible_chapters(&self) -> Vec<&Chapter> {
        self.catalog.by_language(self.language())
    }

    pub fn select_next(&mut self) {
        let len = self.visible_chapters().len();
        if len > 0 {
            self.chapter_selected = (self.chapter_selected + 1) % len;
        }
    }

    pub fn select_prev(&mut self) {
        let len = self.visible_chapters().len();
        if len > 0 {
            self.chapter_selected = (self.chapter_selected + len - 1) % len;
        }
    }

    pub fn cycle_language(&mut self) {
        self.language_idx = (self.language_idx + 1) % self.languages.len();
        self.chapter_selected = 0;
    }

    pub fn cycle_board_language(&mut self) {
        self.board_language_idx = (self.board_language_idx + 1) % self.languages.len();
    }

    pub fn toggle_rank_by(&mut self) {
        self.rank_by = self.rank_by.toggle();
    }

    pub fn start_selected(&mut self) {
        let chapter = self
            .visible_chapters()
            .get(self.chapter_selected)
            .map(|c| (*c).clone());
        if let Some(chapter) = chapter {
            self.start_chapter(chapter);
        }
    }

    pub fn start_random(&mut self) {
        let language = self.language().to_string();
        let chapter = self.catalog.random(&language, &mut self.rng).cloned();
        if let Some(chapter) = chapter {
            self.start_chapter(chapter);
        }
    }

    pub fn start_chapter(&mut self, chapter: Chapter) {
        debug!(chapter = %chapter.id, "starting chapter");
        self.session = Some(TypingSession::new(&chapter.target_text()));
        self.chapter = Some(chapter);
        self.last_result = None;
        self.last_recorded = None;
        self.screen = AppScreen::Practice;
    }

    pub fn type_char(&mut self, ch: char) {
        self.type_char_at(ch, Utc::now());
    }

    /// Feeds one character: the keystroke log first, then the full input.
    pub fn type_char_at(&mut self, ch: char, now: DateTime<Utc>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_completed() || session.cursor() >= session.target().len() {
            return;
        }
        if !input::is_typeable(ch) {
            debug!("ignoring untypeable {ch:?}");
            return;
        }

        input::record_keystroke(session, ch, now);
        let mut text = session.input_text();
        text.push(ch);
        match input::record_input(session, &text, now) {
            Ok(Some(result)) => self.finish(result),
            Ok(None) => {}
            Err(e) => debug!("input rejected: {e}"),
        }
    }

    pub fn tab(&mut self) {
        self.tab_at(Utc::now());
    }

    /// Tab types spaces up to the next indent stop, one keystroke per space.
    /// Chapter targets never contain a literal tab.
    pub fn tab_at(&mut self, now: DateTime<Utc>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let column = session
            .input()
            .iter()
            .rev()
            .take_while(|&&c| c != '\n')
            .count();
        for _ in 0..TAB_WIDTH - column % TAB_WIDTH {
            if self.screen != AppScreen::Practice {
                break;
            }
            self.type_char_at(' ', now);
        }
    }

    pub fn backspace(&mut self) {
        self.backspace_at(Utc::now());
    }

    pub fn backspace_at(&mut self, now: DateTime<Utc>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_completed() || session.cursor() == 0 {
            return;
        }
        let mut text = session.input_text();
        text.pop();
        if let Err(e) = input::record_input(session, &text, now) {
            debug!("backspace rejected: {e}");
        }
    }

    /// Esc in practice: pause an active session, leave a paused or unstarted one.
    pub fn escape(&mut self) {
        match self.session.as_mut() {
            Some(session) if session.is_active() => input::pause(session),
            _ => self.go_to_chapters(),
        }
    }

    /// Runs inline on the final keystroke. A failed save is logged and the
    /// result screen is shown regardless.
    fn finish(&mut self, result: SessionResult) {
        self.last_recorded = None;
        if let (Some(store), Some(chapter)) = (&self.store, &self.chapter) {
            match store.record_session(&self.user_id, &self.config.username, chapter, &result) {
                Ok(recorded) => {
                    self.history = store.load_history(&self.user_id);
                    self.progress = store.load_progress(&self.user_id);
                    self.leaderboard = store.load_leaderboard();
                    self.last_recorded = Some(recorded);
                }
                Err(e) => warn!("failed to save session: {e:#}"),
            }
        }
        self.last_result = Some(result);
        self.screen = AppScreen::Result;
    }

    pub fn retry(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset();
            self.last_result = None;
            self.last_recorded = None;
            self.screen = AppScreen::Practice;
        }
    }

    pub fn go_to_chapters(&mut self) {
        self.session = None;
        self.chapter = None;
        self.screen = AppScreen::ChapterSelect;
    }

    pub fn go_to_leaderboard(&mut self) {
        self.screen = AppScreen::Leaderboard;
    }

    pub fn go_to_stats(&mut self) {
        self.screen = AppScreen::Stats;
    }

    pub fn leaderboard_rows(&self) -> Vec<RankedEntry> {
        leaderboard::top(
            self.leaderboard.entries.values(),
            self.board_language(),
            self.rank_by,
            self.config.leaderboard_size,
        )
    }

    pub fn own_rank(&self, language: &str) -> Option<RankedEntry> {
        leaderboard::user_rank(self.leaderboard.entries.values(), &self.user_id, language)
    }

    pub fn chapter_best(&self) -> Option<&ChapterProgress> {
        let chapter = self.chapter.as_ref()?;
        self.progress.chapters.get(&chapter.id)
    }

    pub fn chapter_history(&self) -> Vec<&StatHistoryEntry> {
        match &self.chapter {
            Some(chapter) => self
                .history
                .entries
                .iter()
                .filter(|h| h.chapter_id == chapter.id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn summary(&self, today: NaiveDate) -> ProgressSummary {
        ProgressSummary::compute(
            self.progress.chapters.values(),
            &self.history.entries,
            today,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use codesprint::content::Difficulty;
    use std::fs;
    use tempfile::TempDir;

    fn chapter(id: &str, language: &str, content: &str) -> Chapter {
        Chapter {
            id: id.to_string(),
            title: id.to_string(),
            language: language.to_string(),
            level: Difficulty::Beginner,
            category: "Basics".to_string(),
            snippet: String::new(),
            content: content.to_string(),
            order: 1,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn make_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let catalog = ChapterCatalog::from_chapters(vec![
            chapter("py-1", "Python", "x = 1"),
            chapter("rs-1", "Rust", "let a;"),
            chapter("rs-2", "Rust", "fn f() {}\n"),
        ]);
        let mut config = Config::default();
        config.username = "Ada".to_string();
        let app = App::new(config, Theme::default(), catalog, Some(store));
        (dir, app)
    }

    fn type_str(app: &mut App, s: &str, start: DateTime<Utc>, step_ms: i64) {
        for (i, ch) in s.chars().enumerate() {
            app.type_char_at(ch, start + Duration::milliseconds(step_ms * (i as i64 + 1)));
        }
    }

    #[test]
    fn test_languages_and_navigation() {
        let (_dir, mut app) = make_app();
        assert_eq!(app.languages, vec!["all", "Python", "Rust"]);
        assert_eq!(app.visible_chapters().len(), 3);

        app.select_prev();
        assert_eq!(app.chapter_selected, 2);
        app.select_next();
        assert_eq!(app.chapter_selected, 0);

        app.cycle_language();
        assert_eq!(app.language(), "Python");
        assert_eq!(app.visible_chapters().len(), 1);
        app.cycle_language();
        app.cycle_language();
        assert_eq!(app.language(), "all");
    }

    #[test]
    fn test_full_chapter_is_recorded() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("rs-1").unwrap().clone());
        assert_eq!(app.screen, AppScreen::Practice);

        type_str(&mut app, "let b;", t0(), 1000);

        assert_eq!(app.screen, AppScreen::Result);
        let result = app.last_result.clone().unwrap();
        assert_eq!(result.error_count, 1);
        assert_eq!(result.accuracy, 83);

        let recorded = app.last_recorded.as_ref().unwrap();
        assert!(recorded.progress_improved);
        assert_eq!(app.history.entries.len(), 1);
        assert!(app.progress.chapters.contains_key("rs-1"));
        assert_eq!(app.own_rank("Rust").unwrap().rank, 1);
        assert_eq!(app.session.as_ref().unwrap().mistakes().len(), 1);
    }

    #[test]
    fn test_backspace_and_retry() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("py-1").unwrap().clone());
        type_str(&mut app, "x =", t0(), 200);
        app.backspace_at(t0() + Duration::seconds(1));
        assert_eq!(app.session.as_ref().unwrap().input_text(), "x ");

        app.retry();
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.cursor(), 0);
        assert!(!session.is_started());
        assert_eq!(app.screen, AppScreen::Practice);
    }

    #[test]
    fn test_newline_is_typed_as_a_char() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("rs-2").unwrap().clone());
        // trailing newline is trimmed from the target
        assert_eq!(app.session.as_ref().unwrap().target().len(), 9);
        type_str(&mut app, "fn f() {}", t0(), 100);
        assert_eq!(app.last_result.as_ref().unwrap().accuracy, 100);
    }

    #[test]
    fn test_tab_indents_to_next_stop() {
        let (_dir, mut app) = make_app();
        app.start_chapter(chapter("py-tab", "Python", "if x:\n\tpass"));
        type_str(&mut app, "if x:\n", t0(), 200);

        app.tab_at(t0() + Duration::seconds(2));
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.input_text(), "if x:\n    ");
        assert!(session.mistakes().is_empty());

        type_str(&mut app, "pass", t0() + Duration::seconds(2), 200);
        let result = app.last_result.as_ref().unwrap();
        assert_eq!(result.error_count, 0);
        assert_eq!(result.accuracy, 100);
        assert!(app.session.as_ref().unwrap().mistakes().is_empty());
    }

    #[test]
    fn test_tab_mid_line_fills_to_stop() {
        let (_dir, mut app) = make_app();
        app.start_chapter(chapter("c", "Go", "ab  c"));
        type_str(&mut app, "ab", t0(), 100);
        app.tab_at(t0() + Duration::seconds(1));
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.input_text(), "ab  ");
        assert!(session.mistakes().is_empty());
    }

    #[test]
    fn test_untypeable_char_leaves_no_mistake() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("py-1").unwrap().clone());
        app.type_char_at('\u{7}', t0());
        let session = app.session.as_ref().unwrap();
        assert!(session.mistakes().is_empty());
        assert_eq!(session.cursor(), 0);
        assert!(!session.is_started());
    }

    #[test]
    fn test_failed_save_still_shows_result() {
        let (dir, mut app) = make_app();
        // a plain file where the user's directory belongs
        fs::create_dir_all(dir.path().join("users")).unwrap();
        fs::write(dir.path().join("users").join("ada"), "").unwrap();

        app.start_chapter(app.catalog.get("rs-1").unwrap().clone());
        type_str(&mut app, "let a;", t0(), 300);

        assert_eq!(app.screen, AppScreen::Result);
        assert!(app.last_result.is_some());
        assert!(app.last_recorded.is_none());
        assert!(app.history.entries.is_empty());
        assert!(app.leaderboard.entries.is_empty());
    }

    #[test]
    fn test_escape_pauses_then_leaves() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("py-1").unwrap().clone());
        app.type_char_at('x', t0());

        app.escape();
        assert!(app.session.as_ref().unwrap().is_paused());
        assert_eq!(app.screen, AppScreen::Practice);

        // typing resumes
        app.type_char_at(' ', t0() + Duration::seconds(1));
        assert!(app.session.as_ref().unwrap().is_active());

        app.escape();
        app.escape();
        assert_eq!(app.screen, AppScreen::ChapterSelect);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_leaderboard_toggles() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("rs-1").unwrap().clone());
        type_str(&mut app, "let a;", t0(), 500);
        app.start_chapter(app.catalog.get("py-1").unwrap().clone());
        type_str(&mut app, "x = 1", t0(), 500);

        assert_eq!(app.leaderboard_rows().len(), 2);
        app.toggle_rank_by();
        assert_eq!(app.rank_by, RankBy::Accuracy);
        app.cycle_board_language();
        assert_eq!(app.board_language(), "Python");
        assert_eq!(app.leaderboard_rows().len(), 1);
    }

    #[test]
    fn test_summary_after_sessions() {
        let (_dir, mut app) = make_app();
        app.start_chapter(app.catalog.get("rs-1").unwrap().clone());
        type_str(&mut app, "let a;", t0(), 500);
        let summary = app.summary(t0().date_naive());
        assert_eq!(summary.total_sessions, 1);
        assert_eq!(summary.current_streak, 1);
        assert_eq!(summary.completed_chapters, vec!["rs-1".to_string()]);
    }

    #[test]
    fn test_without_store_results_still_show() {
        let catalog = ChapterCatalog::from_chapters(vec![chapter("c", "Go", "ok")]);
        let mut app = App::new(Config::default(), Theme::default(), catalog, None);
        app.start_random();
        type_str(&mut app, "ok", t0(), 100);
        assert_eq!(app.screen, AppScreen::Result);
        assert!(app.last_recorded.is_none());
        assert!(app.history.entries.is_empty());
    }
}
