use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use codesprint::engine::RankedEntry;
use codesprint::session::SessionResult;
use codesprint::store::RecordedSession;

use crate::ui::theme::Theme;

/// Results screen for one finished chapter.
pub struct Dashboard<'a> {
    pub title: &'a str,
    pub result: &'a SessionResult,
    pub recorded: Option<&'a RecordedSession>,
    pub rank: Option<&'a RankedEntry>,
    pub streak: u32,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(title: &'a str, result: &'a SessionResult, theme: &'a Theme) -> Self {
        Self {
            title,
            result,
            recorded: None,
            rank: None,
            streak: 0,
            theme,
        }
    }

    pub fn recorded(mut self, recorded: Option<&'a RecordedSession>) -> Self {
        self.recorded = recorded;
        self
    }

    pub fn rank(mut self, rank: Option<&'a RankedEntry>) -> Self {
        self.rank = rank;
        self
    }

    pub fn streak(mut self, streak: u32) -> Self {
        self.streak = streak;
        self
    }
}

fn format_duration(secs: u64) -> String {
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let mut title_spans = vec![Span::styled(
            "Chapter Complete",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )];
        if self.recorded.is_some_and(|r| r.progress_improved) {
            title_spans.push(Span::styled(
                "  new personal best",
                Style::default().fg(colors.success()),
            ));
        }
        Paragraph::new(Line::from(title_spans))
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let label = |text: &'static str| Span::styled(text, Style::default().fg(colors.fg()));

        let wpm_text = format!("{} WPM", self.result.wpm);
        let words_text = format!("  ({} words)", self.result.total_words);
        Paragraph::new(Line::from(vec![
            label("  Speed:    "),
            Span::styled(
                wpm_text,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(words_text, Style::default().fg(colors.text_pending())),
        ]))
        .render(layout[1], buf);

        let acc_text = format!("{}%", self.result.accuracy);
        let acc_detail = format!(
            "  ({}/{} words correct)",
            self.result.correct_words, self.result.total_words
        );
        Paragraph::new(Line::from(vec![
            label("  Accuracy: "),
            Span::styled(
                acc_text,
                Style::default()
                    .fg(colors.accuracy(self.result.accuracy as f64))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(acc_detail, Style::default().fg(colors.text_pending())),
        ]))
        .render(layout[2], buf);

        Paragraph::new(Line::from(vec![
            label("  Time:     "),
            Span::styled(
                format_duration(self.result.elapsed_secs),
                Style::default().fg(colors.fg()),
            ),
        ]))
        .render(layout[3], buf);

        Paragraph::new(Line::from(vec![
            label("  Errors:   "),
            Span::styled(
                self.result.error_count.to_string(),
                Style::default().fg(if self.result.error_count == 0 {
                    colors.success()
                } else {
                    colors.error()
                }),
            ),
        ]))
        .render(layout[4], buf);

        let mut extra = Vec::new();
        if let Some(rank) = self.rank {
            extra.push(Line::from(vec![
                label("  Rank:     "),
                Span::styled(
                    format!("#{} in {}", rank.rank, rank.entry.language),
                    Style::default().fg(colors.accent()),
                ),
            ]));
        }
        if self.streak > 0 {
            extra.push(Line::from(vec![
                label("  Streak:   "),
                Span::styled(
                    format!("{} day{}", self.streak, if self.streak == 1 { "" } else { "s" }),
                    Style::default().fg(colors.warning()),
                ),
            ]));
        }
        if self.recorded.is_none() {
            extra.push(Line::from(Span::styled(
                "  (not saved, see log)",
                Style::default().fg(colors.text_pending()),
            )));
        }
        Paragraph::new(extra).render(layout[5], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("  [r] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Chapters  ", Style::default().fg(colors.accent())),
            Span::styled("[b] Leaderboard", Style::default().fg(colors.accent())),
        ]))
        .render(layout[6], buf);
    }
}
