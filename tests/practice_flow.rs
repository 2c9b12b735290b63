use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use codesprint::config::Config;
use codesprint::content::ChapterCatalog;
use codesprint::engine::leaderboard::{self, ALL_LANGUAGES};
use codesprint::engine::streak::{compute_streak, longest_streak};
use codesprint::engine::{ProgressSummary, RankBy};
use codesprint::session::input::{finalize, record_input, record_keystroke};
use codesprint::session::{SessionError, SessionResult, SessionStatus, TypingSession};
use codesprint::store::JsonStore;

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, d, 8, 30, 0).unwrap()
}

/// Types `typed` one keystroke at a time, `step_ms` apart, starting at `start`.
fn type_through(
    session: &mut TypingSession,
    typed: &str,
    start: DateTime<Utc>,
    step_ms: i64,
) -> Option<SessionResult> {
    let mut input = String::new();
    let mut result = None;
    for (i, ch) in typed.chars().enumerate() {
        let now = start + Duration::milliseconds(step_ms * i as i64);
        record_keystroke(session, ch, now);
        input.push(ch);
        if let Some(r) = record_input(session, &input, now).unwrap() {
            result = Some(r);
        }
    }
    result
}

fn make_store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

#[test]
fn bundled_chapter_typed_perfectly_is_persisted() {
    let (_dir, store) = make_store();
    let catalog = ChapterCatalog::bundled().unwrap();
    let chapter = catalog.by_language("Rust")[0].clone();
    let text = chapter.target_text();

    let mut session = TypingSession::new(&text);
    let result = type_through(&mut session, &text, day(2), 200).unwrap();

    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(result.accuracy, 100);
    assert_eq!(result.error_count, 0);
    assert!(session.mistakes().is_empty());
    assert!(result.wpm > 0);

    let recorded = store
        .record_session("ada", "Ada", &chapter, &result)
        .unwrap();
    assert!(recorded.progress_improved);
    assert_eq!(recorded.leaderboard_entry.language, "Rust");
    assert_eq!(store.load_history("ada").entries.len(), 1);
}

#[test]
fn mistakes_are_logged_and_counted() {
    let mut session = TypingSession::new("fn main() {}");
    let result = type_through(&mut session, "fn mian() {]", day(1), 250).unwrap();

    assert_eq!(result.error_count, 3);
    assert_eq!(session.mistakes().len(), 3);
    let positions: Vec<usize> = session.mistakes().iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![4, 5, 11]);
    // 9 of 12 characters match
    assert_eq!(result.accuracy, 75);
}

#[test]
fn completed_session_ignores_further_updates() {
    let mut session = TypingSession::new("ok");
    let first = type_through(&mut session, "ok", day(1), 1000).unwrap();

    let later = day(1) + Duration::minutes(5);
    assert_eq!(record_input(&mut session, "o", later), Ok(None));
    assert!(record_keystroke(&mut session, 'x', later).is_none());
    assert_eq!(finalize(&mut session, later), first);
    assert_eq!(session.input_text(), "ok");
}

#[test]
fn overflow_is_rejected_without_side_effects() {
    let mut session = TypingSession::new("abc");
    record_input(&mut session, "ab", day(1)).unwrap();
    let before = session.clone();

    let err = record_input(&mut session, "abcd", day(1) + Duration::seconds(1)).unwrap_err();
    assert_eq!(err, SessionError::InputOverflow { len: 4, max: 3 });
    assert_eq!(session, before);
}

#[test]
fn streak_follows_recorded_days() {
    let (_dir, store) = make_store();
    let catalog = ChapterCatalog::bundled().unwrap();
    let chapter = catalog.by_language("Python")[0].clone();
    let text = chapter.target_text();

    for d in [1, 2, 3, 5, 6] {
        let mut session = TypingSession::new(&text);
        let result = type_through(&mut session, &text, day(d), 150).unwrap();
        store.record_session("ada", "Ada", &chapter, &result).unwrap();
    }

    let history = store.load_history("ada").entries;
    assert_eq!(compute_streak(&history, day(6).date_naive()), 2);
    assert_eq!(compute_streak(&history, day(4).date_naive()), 0);
    assert_eq!(compute_streak(&history, day(3).date_naive()), 3);
    assert_eq!(longest_streak(&history), 3);

    let progress = store.load_progress("ada");
    let summary = ProgressSummary::compute(progress.chapters.values(), &history, day(6).date_naive());
    assert_eq!(summary.total_sessions, 5);
    assert_eq!(summary.completed_chapters, vec![chapter.id.clone()]);
    assert_eq!(summary.current_streak, 2);
}

#[test]
fn leaderboard_ranks_profiles_sharing_a_store() {
    let (_dir, store) = make_store();
    let catalog = ChapterCatalog::bundled().unwrap();
    let rust = catalog.by_language("Rust")[0].clone();
    let python = catalog.by_language("Python")[0].clone();

    // slower keystrokes give lower wpm
    for (user, step, chapter) in [
        ("ada", 120, &rust),
        ("bob", 300, &rust),
        ("cy", 200, &python),
    ] {
        let text = chapter.target_text();
        let mut session = TypingSession::new(&text);
        let result = type_through(&mut session, &text, day(1), step).unwrap();
        store.record_session(user, user, chapter, &result).unwrap();
    }

    let board = store.load_leaderboard();
    let rust_rows = leaderboard::top(board.entries.values(), "Rust", RankBy::Wpm, 10);
    let users: Vec<&str> = rust_rows.iter().map(|r| r.entry.user_id.as_str()).collect();
    assert_eq!(users, vec!["ada", "bob"]);

    let all = leaderboard::top(board.entries.values(), ALL_LANGUAGES, RankBy::Wpm, 2);
    assert_eq!(all.len(), 2);

    let bob = leaderboard::user_rank(board.entries.values(), "bob", "Rust").unwrap();
    assert_eq!(bob.rank, 2);
}

#[test]
fn export_moves_profile_between_data_dirs() {
    let (_dir, store) = make_store();
    let catalog = ChapterCatalog::bundled().unwrap();
    let chapter = catalog.all()[0].clone();
    let text = chapter.target_text();
    let mut session = TypingSession::new(&text);
    let result = type_through(&mut session, &text, day(1), 180).unwrap();
    store.record_session("ada", "Ada", &chapter, &result).unwrap();

    let mut config = Config::default();
    config.username = "Ada".to_string();
    let export = store.export_user(&config);
    let json = serde_json::to_string(&export).unwrap();

    let (_dir2, other) = make_store();
    other
        .import_user(&serde_json::from_str(&json).unwrap(), "ada", "Ada")
        .unwrap();
    assert_eq!(other.load_history("ada"), store.load_history("ada"));
    assert_eq!(other.load_progress("ada"), store.load_progress("ada"));
    assert_eq!(other.load_leaderboard(), store.load_leaderboard());
}
