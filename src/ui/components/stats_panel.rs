use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use codesprint::engine::ProgressSummary;
use codesprint::session::StatHistoryEntry;

use crate::ui::theme::Theme;

const RECENT_ROWS: usize = 15;

pub struct StatsPanel<'a> {
    username: &'a str,
    summary: &'a ProgressSummary,
    total_chapters: usize,
    history: &'a [StatHistoryEntry],
    theme: &'a Theme,
}

impl<'a> StatsPanel<'a> {
    pub fn new(
        username: &'a str,
        summary: &'a ProgressSummary,
        total_chapters: usize,
        history: &'a [StatHistoryEntry],
        theme: &'a Theme,
    ) -> Self {
        Self {
            username,
            summary,
            total_chapters,
            history,
            theme,
        }
    }
}

fn format_hours(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    if h > 0 {
        format!("{h}h {m:02}m")
    } else {
        format!("{m}m {:02}s", secs % 60)
    }
}

impl Widget for StatsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let s = self.summary;

        let block = Block::bordered()
            .title(format!(" Stats: {} ", self.username))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(inner);

        let label = |text: &'static str| Span::styled(text, Style::default().fg(colors.fg()));
        let value = |text: String| {
            Span::styled(
                text,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )
        };

        let summary = vec![
            Line::from(""),
            Line::from(vec![
                label("  Chapters done: "),
                value(format!(
                    "{}/{}",
                    s.completed_chapters.len(),
                    self.total_chapters
                )),
            ]),
            Line::from(vec![label("  Sessions:      "), value(s.total_sessions.to_string())]),
            Line::from(vec![label("  Time typing:   "), value(format_hours(s.total_time_secs))]),
            Line::from(""),
            Line::from(vec![label("  Best WPM:      "), value(s.best_wpm.to_string())]),
            Line::from(vec![label("  Average WPM:   "), value(s.average_wpm.to_string())]),
            Line::from(vec![
                label("  Avg accuracy:  "),
                Span::styled(
                    format!("{:.2}%", s.average_accuracy),
                    Style::default().fg(colors.accuracy(s.average_accuracy)),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                label("  Streak:        "),
                Span::styled(
                    format!("{} days", s.current_streak),
                    Style::default().fg(colors.warning()),
                ),
            ]),
            Line::from(vec![
                label("  Longest:       "),
                value(format!("{} days", s.longest_streak)),
            ]),
        ];
        Paragraph::new(summary).render(layout[0], buf);

        let mut recent = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("{:<17} {:<22} {:>4} {:>5}", "When", "Chapter", "WPM", "Acc"),
                Style::default()
                    .fg(colors.text_pending())
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        for entry in self.history.iter().rev().take(RECENT_ROWS) {
            recent.push(Line::from(Span::styled(
                format!(
                    "{:<17} {:<22} {:>4} {:>4}%",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.chapter_id,
                    entry.wpm,
                    entry.accuracy
                ),
                Style::default().fg(colors.fg()),
            )));
        }
        if self.history.is_empty() {
            recent.push(Line::from(Span::styled(
                "No sessions yet. Finish a chapter to start a streak.",
                Style::default().fg(colors.text_pending()),
            )));
        }
        Paragraph::new(recent).render(layout[1], buf);
    }
}
