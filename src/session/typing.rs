use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::result::SessionResult;

/// Standard typing-speed convention: five characters make one word.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Active,
    Paused,
    Completed,
}

/// Per-character display state, relative to the current input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect(char),
    Current,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub position: usize,
    pub expected: char,
    pub typed: char,
    pub elapsed_ms: u64,
}

/// Statistics derived from the input at the time of the last accepted update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub progress_percent: u32,
    pub correct_chars: usize,
    pub compared_chars: usize,
    pub error_count: usize,
    pub elapsed_ms: u64,
}

impl LiveStats {
    pub fn compute(
        target: &[char],
        input: &[char],
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let elapsed_ms = elapsed_ms_between(started_at, now);
        let minutes = elapsed_ms as f64 / 60_000.0;

        let wpm = if started_at.is_some() && minutes > 0.0 {
            let words = input.len() as f64 / CHARS_PER_WORD;
            (words / minutes).round() as u32
        } else {
            0
        };

        let (correct_chars, compared_chars) = compare(target, input);
        let accuracy = percent(correct_chars, compared_chars);
        let progress_percent = percent(input.len(), target.len()).min(100);

        Self {
            wpm,
            accuracy,
            progress_percent,
            correct_chars,
            compared_chars,
            error_count: compared_chars - correct_chars,
            elapsed_ms,
        }
    }
}

/// Returns `(correct, compared)` over the overlapping prefix of both texts.
pub fn compare(target: &[char], input: &[char]) -> (usize, usize) {
    let compared = input.len().min(target.len());
    let correct = target
        .iter()
        .zip(input.iter())
        .filter(|(expected, typed)| expected == typed)
        .count();
    (correct, compared)
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

pub(crate) fn elapsed_ms_between(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    match started_at {
        Some(start) => now.signed_duration_since(start).num_milliseconds().max(0) as u64,
        None => 0,
    }
}

/// One typing attempt against a fixed target text.
///
/// Owned by whoever drives the input loop; the functions in
/// [`crate::session::input`] are the only mutators besides [`TypingSession::reset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypingSession {
    pub(crate) target: Vec<char>,
    pub(crate) input: Vec<char>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    pub(crate) mistakes: Vec<Mistake>,
    pub(crate) status: SessionStatus,
    pub(crate) stats: LiveStats,
    pub(crate) result: Option<SessionResult>,
}

impl TypingSession {
    pub fn new(text: &str) -> Self {
        Self {
            target: text.chars().collect(),
            input: Vec::new(),
            started_at: None,
            completed_at: None,
            mistakes: Vec::new(),
            status: SessionStatus::NotStarted,
            stats: LiveStats::default(),
            result: None,
        }
    }

    /// Starts over on the same target text.
    pub fn reset(&mut self) {
        let target = std::mem::take(&mut self.target);
        *self = Self {
            target,
            ..Self::new("")
        };
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn target_text(&self) -> String {
        self.target.iter().collect()
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.input.len()
    }

    pub fn expected_char(&self) -> Option<char> {
        self.target.get(self.input.len()).copied()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn stats(&self) -> &LiveStats {
        &self.stats
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Wall-clock time since the first keystroke, frozen at completion.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        elapsed_ms_between(self.started_at, self.completed_at.unwrap_or(now))
    }

    pub fn char_status(&self, idx: usize) -> CharStatus {
        match self.input.get(idx) {
            Some(&typed) if self.target.get(idx) == Some(&typed) => CharStatus::Correct,
            Some(&typed) => CharStatus::Incorrect(typed),
            None if idx == self.input.len() => CharStatus::Current,
            None => CharStatus::Pending,
        }
    }
}
