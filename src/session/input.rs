use chrono::{DateTime, Utc};
use tracing::debug;

use crate::session::error::SessionError;
use crate::session::result::SessionResult;
use crate::session::typing::{
    CHARS_PER_WORD, LiveStats, Mistake, SessionStatus, TypingSession, compare, elapsed_ms_between,
};

/// Characters a keystroke may produce. Newline and tab are part of code.
pub fn is_typeable(ch: char) -> bool {
    !ch.is_control() || matches!(ch, '\n' | '\t')
}

/// Logs a mistake if `typed` does not match the character at the cursor.
///
/// Must run before the [`record_input`] call for the same keystroke: the
/// cursor is the input length before the new character is applied.
pub fn record_keystroke(
    session: &mut TypingSession,
    typed: char,
    now: DateTime<Utc>,
) -> Option<Mistake> {
    if session.is_completed() {
        return None;
    }

    let position = session.input.len();
    let expected = *session.target.get(position)?;
    if typed == expected {
        return None;
    }

    let mistake = Mistake {
        position,
        expected,
        typed,
        elapsed_ms: elapsed_ms_between(session.started_at, now),
    };
    session.mistakes.push(mistake.clone());
    Some(mistake)
}

/// Replaces the session input and refreshes live stats.
///
/// Returns the final result when this update completes the session.
/// Updates to a completed session are ignored.
pub fn record_input(
    session: &mut TypingSession,
    new_input: &str,
    now: DateTime<Utc>,
) -> Result<Option<SessionResult>, SessionError> {
    if session.is_completed() {
        return Ok(None);
    }

    let chars: Vec<char> = new_input.chars().collect();
    if chars.len() > session.target.len() {
        return Err(SessionError::InputOverflow {
            len: chars.len(),
            max: session.target.len(),
        });
    }
    if let Some((position, &ch)) = chars.iter().enumerate().find(|(_, c)| !is_typeable(**c)) {
        return Err(SessionError::UnsupportedChar { position, ch });
    }

    if session.started_at.is_none() {
        session.started_at = Some(now);
    }
    session.status = SessionStatus::Active;
    session.input = chars;
    session.stats = LiveStats::compute(&session.target, &session.input, session.started_at, now);

    if session.input.len() == session.target.len() {
        return Ok(Some(finalize(session, now)));
    }
    Ok(None)
}

/// Completes the session and produces its result. Calling it again returns
/// the same result.
pub fn finalize(session: &mut TypingSession, now: DateTime<Utc>) -> SessionResult {
    if let Some(result) = &session.result {
        return result.clone();
    }

    session.status = SessionStatus::Completed;
    session.completed_at = Some(now);
    session.stats = LiveStats::compute(&session.target, &session.input, session.started_at, now);

    let elapsed_ms = elapsed_ms_between(session.started_at, now);
    let minutes = elapsed_ms as f64 / 60_000.0;
    let total_words = session.target.len() as f64 / CHARS_PER_WORD;
    let wpm = if minutes > 0.0 {
        (total_words / minutes).round() as u32
    } else {
        0
    };

    // authoritative count, independent of the mistake log
    let (correct, compared) = compare(&session.target, &session.input);

    let result = SessionResult {
        wpm,
        accuracy: session.stats.accuracy,
        error_count: compared - correct,
        elapsed_secs: elapsed_ms / 1000,
        total_words: total_words.round() as u32,
        correct_words: (correct as f64 / CHARS_PER_WORD).round() as u32,
        completed_at: now,
    };
    debug!(
        wpm = result.wpm,
        accuracy = result.accuracy,
        errors = result.error_count,
        "session finalized"
    );

    session.result = Some(result.clone());
    result
}

/// Pausing does not stop the clock; elapsed time keeps accruing.
pub fn pause(session: &mut TypingSession) {
    if session.status == SessionStatus::Active {
        session.status = SessionStatus::Paused;
    }
}

pub fn resume(session: &mut TypingSession) {
    if session.status == SessionStatus::Paused {
        session.status = SessionStatus::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    /// Feeds `text` one keystroke at a time, `step_ms` apart.
    fn type_text(session: &mut TypingSession, text: &str, start: DateTime<Utc>, step_ms: i64) {
        let mut input = session.input_text();
        for (i, ch) in text.chars().enumerate() {
            let now = start + Duration::milliseconds(step_ms * i as i64);
            record_keystroke(session, ch, now);
            input.push(ch);
            record_input(session, &input, now).unwrap();
        }
    }

    #[test]
    fn test_first_input_starts_session() {
        let mut session = TypingSession::new("abc");
        record_input(&mut session, "a", t0()).unwrap();
        assert_eq!(session.started_at(), Some(t0()));
        assert!(session.is_active());
        assert_eq!(session.input_text(), "a");
    }

    #[test]
    fn test_keystroke_mismatch_logs_mistake() {
        let mut session = TypingSession::new("abc");
        record_keystroke(&mut session, 'a', t0());
        record_input(&mut session, "a", t0()).unwrap();

        let later = t0() + Duration::milliseconds(250);
        let mistake = record_keystroke(&mut session, 'x', later).unwrap();
        assert_eq!(
            mistake,
            Mistake {
                position: 1,
                expected: 'b',
                typed: 'x',
                elapsed_ms: 250,
            }
        );
        assert_eq!(session.mistakes().len(), 1);
    }

    #[test]
    fn test_first_keystroke_mistake_has_zero_elapsed() {
        let mut session = TypingSession::new("abc");
        let mistake = record_keystroke(&mut session, 'z', t0()).unwrap();
        assert_eq!(mistake.elapsed_ms, 0);
        assert_eq!(mistake.position, 0);
    }

    #[test]
    fn test_correct_keystroke_logs_nothing() {
        let mut session = TypingSession::new("abc");
        assert!(record_keystroke(&mut session, 'a', t0()).is_none());
        assert!(session.mistakes().is_empty());
    }

    #[test]
    fn test_wpm_concrete_case() {
        // 25 chars = 5 words, finished in 30s -> 10 wpm
        let text = "abcde".repeat(5);
        let mut session = TypingSession::new(&text);
        record_input(&mut session, "a", t0()).unwrap();
        let result = record_input(&mut session, &text, t0() + Duration::seconds(30))
            .unwrap()
            .unwrap();
        assert_eq!(result.wpm, 10);
        assert_eq!(result.elapsed_secs, 30);
        assert_eq!(result.total_words, 5);
        assert_eq!(result.correct_words, 5);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_completion_happens_exactly_once() {
        let mut session = TypingSession::new("ab");
        assert!(record_input(&mut session, "a", t0()).unwrap().is_none());
        assert!(!session.is_completed());

        let done = t0() + Duration::seconds(1);
        let result = record_input(&mut session, "ab", done).unwrap();
        assert!(result.is_some());
        assert!(session.is_completed());
        assert!(!session.is_active());
        assert_eq!(session.completed_at(), Some(done));

        let snapshot = session.clone();
        let again = record_input(&mut session, "ab", done + Duration::seconds(5)).unwrap();
        assert!(again.is_none());
        assert_eq!(session, snapshot);
    }

    #[test]
    fn test_keystroke_after_completion_is_ignored() {
        let mut session = TypingSession::new("a");
        record_input(&mut session, "a", t0()).unwrap();
        assert!(session.is_completed());
        assert!(record_keystroke(&mut session, 'q', t0()).is_none());
        assert!(session.mistakes().is_empty());
    }

    #[test]
    fn test_overflow_is_rejected_without_changes() {
        let mut session = TypingSession::new("abc");
        record_input(&mut session, "ab", t0()).unwrap();
        let snapshot = session.clone();

        let err = record_input(&mut session, "abcd", t0() + Duration::seconds(1)).unwrap_err();
        assert_eq!(err, SessionError::InputOverflow { len: 4, max: 3 });
        assert_eq!(session, snapshot);
    }

    #[test]
    fn test_overflow_before_start_leaves_clock_unset() {
        let mut session = TypingSession::new("a");
        assert!(record_input(&mut session, "ab", t0()).is_err());
        assert!(!session.is_started());
        assert_eq!(session, TypingSession::new("a"));
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let mut session = TypingSession::new("abc");
        let err = record_input(&mut session, "a\u{7}", t0()).unwrap_err();
        assert_eq!(
            err,
            SessionError::UnsupportedChar {
                position: 1,
                ch: '\u{7}'
            }
        );
        assert!(!session.is_started());
    }

    #[test]
    fn test_newline_and_tab_are_typeable() {
        let mut session = TypingSession::new("a\n\tb");
        type_text(&mut session, "a\n\tb", t0(), 100);
        assert!(session.is_completed());
        assert_eq!(session.result().unwrap().error_count, 0);
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let text = "fn main() {}";
        let mut session = TypingSession::new(text);
        let mut last = 0;
        for end in 0..=text.len() {
            record_input(&mut session, &text[..end], t0() + Duration::seconds(end as i64))
                .unwrap();
            let progress = session.stats().progress_percent;
            assert!(progress >= last);
            assert!(progress <= 100);
            last = progress;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_final_errors_come_from_full_scan() {
        let mut session = TypingSession::new("abcd");
        // typo, then backspace and correction
        record_keystroke(&mut session, 'x', t0());
        record_input(&mut session, "x", t0()).unwrap();
        record_input(&mut session, "", t0()).unwrap();
        type_text(&mut session, "abcd", t0() + Duration::seconds(1), 100);

        assert_eq!(session.mistakes().len(), 1);
        let result = session.result().unwrap();
        assert_eq!(result.error_count, 0);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_final_wpm_uses_target_length() {
        let mut session = TypingSession::new("abcdefghij");
        record_input(&mut session, "abcdefghi", t0()).unwrap();
        let result = record_input(&mut session, "abcdefghij", t0() + Duration::seconds(12))
            .unwrap()
            .unwrap();
        // 2 words in 0.2 min
        assert_eq!(result.wpm, 10);
    }

    #[test]
    fn test_errors_in_result() {
        let mut session = TypingSession::new("abcde");
        let result = record_input(&mut session, "abXdY", t0()).unwrap().unwrap();
        assert_eq!(result.error_count, 2);
        assert_eq!(result.accuracy, 60);
        assert_eq!(result.correct_words, 1);
        // finished on the very first update, no elapsed time
        assert_eq!(result.wpm, 0);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut session = TypingSession::new("abc");
        record_input(&mut session, "ab", t0()).unwrap();
        let first = finalize(&mut session, t0() + Duration::seconds(3));
        let second = finalize(&mut session, t0() + Duration::seconds(60));
        assert_eq!(first, second);
        assert_eq!(session.completed_at(), Some(t0() + Duration::seconds(3)));
    }

    #[test]
    fn test_pause_and_resume_keep_counters() {
        let mut session = TypingSession::new("abcdef");
        record_keystroke(&mut session, 'x', t0());
        record_input(&mut session, "x", t0()).unwrap();
        let stats = *session.stats();

        pause(&mut session);
        assert!(session.is_paused());
        assert!(!session.is_active());
        assert_eq!(*session.stats(), stats);
        assert_eq!(session.mistakes().len(), 1);

        resume(&mut session);
        assert!(session.is_active());
        assert_eq!(session.started_at(), Some(t0()));
    }

    #[test]
    fn test_pause_does_not_stop_the_clock() {
        let mut session = TypingSession::new(&"a".repeat(10));
        record_input(&mut session, "aaaaa", t0()).unwrap();
        pause(&mut session);
        resume(&mut session);
        let result = record_input(&mut session, &"a".repeat(10), t0() + Duration::seconds(60))
            .unwrap()
            .unwrap();
        assert_eq!(result.elapsed_secs, 60);
        assert_eq!(result.wpm, 2);
    }

    #[test]
    fn test_input_while_paused_resumes() {
        let mut session = TypingSession::new("abc");
        record_input(&mut session, "a", t0()).unwrap();
        pause(&mut session);
        record_input(&mut session, "ab", t0()).unwrap();
        assert!(session.is_active());
    }

    #[test]
    fn test_pause_before_start_is_noop() {
        let mut session = TypingSession::new("abc");
        pause(&mut session);
        assert_eq!(session.status(), SessionStatus::NotStarted);
        resume(&mut session);
        assert_eq!(session.status(), SessionStatus::NotStarted);
    }

    #[test]
    fn test_empty_target_completes_with_zero_stats() {
        let mut session = TypingSession::new("");
        let result = record_input(&mut session, "", t0()).unwrap().unwrap();
        assert_eq!(result.wpm, 0);
        assert_eq!(result.accuracy, 0);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.total_words, 0);
        assert!(record_keystroke(&mut session, 'a', t0()).is_none());
    }

    #[test]
    fn test_reset_then_initialize_is_fresh() {
        let text = "let x = 1;";
        let mut session = TypingSession::new(text);
        type_text(&mut session, "let y", t0(), 50);
        pause(&mut session);
        session.reset();
        assert_eq!(session, TypingSession::new(text));

        type_text(&mut session, text, t0(), 50);
        assert!(session.is_completed());
        session.reset();
        assert_eq!(session, TypingSession::new(text));
    }

    #[test]
    fn test_mistake_positions_non_decreasing_for_append_only_input() {
        let mut session = TypingSession::new("hello world");
        type_text(&mut session, "hxllo wxrlq", t0(), 100);
        let positions: Vec<usize> = session.mistakes().iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![1, 7, 10]);
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }
}
