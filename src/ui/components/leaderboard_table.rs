use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use codesprint::engine::{RankBy, RankedEntry};

use crate::ui::theme::Theme;

pub struct LeaderboardTable<'a> {
    rows: &'a [RankedEntry],
    own: Option<&'a RankedEntry>,
    user_id: &'a str,
    language: &'a str,
    rank_by: RankBy,
    theme: &'a Theme,
}

impl<'a> LeaderboardTable<'a> {
    pub fn new(
        rows: &'a [RankedEntry],
        own: Option<&'a RankedEntry>,
        user_id: &'a str,
        language: &'a str,
        rank_by: RankBy,
        theme: &'a Theme,
    ) -> Self {
        Self {
            rows,
            own,
            user_id,
            language,
            rank_by,
            theme,
        }
    }
}

pub fn format_row(row: &RankedEntry) -> String {
    format!(
        "{:>4}  {:<20} {:<12} {:>5} {:>8.2}% {:>6}",
        row.rank,
        row.entry.username,
        row.entry.language,
        row.entry.best_wpm,
        row.entry.avg_accuracy,
        row.entry.total_tests,
    )
}

pub fn header_row() -> String {
    format!(
        "{:>4}  {:<20} {:<12} {:>5} {:>9} {:>6}",
        "#", "Player", "Language", "WPM", "Accuracy", "Tests"
    )
}

impl Widget for LeaderboardTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(
                " Leaderboard: {} by {} ",
                self.language,
                self.rank_by.label()
            ))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            header_row(),
            Style::default()
                .fg(colors.text_pending())
                .add_modifier(Modifier::BOLD),
        )))
        .render(layout[0], buf);

        let lines: Vec<Line> = if self.rows.is_empty() {
            vec![Line::from(Span::styled(
                "  No sessions recorded yet.",
                Style::default().fg(colors.text_pending()),
            ))]
        } else {
            self.rows
                .iter()
                .map(|row| {
                    let style = if row.entry.user_id == self.user_id {
                        Style::default()
                            .fg(colors.accent())
                            .bg(colors.selected_bg())
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(colors.fg())
                    };
                    Line::from(Span::styled(format_row(row), style))
                })
                .collect()
        };
        Paragraph::new(lines).render(layout[1], buf);

        let own = match self.own {
            Some(own) => format!(
                "  Your rank: #{} ({} WPM in {})",
                own.rank, own.entry.best_wpm, own.entry.language
            ),
            None => "  You are not ranked here yet.".to_string(),
        };
        Paragraph::new(vec![
            Line::from(Span::styled(own, Style::default().fg(colors.warning()))),
            Line::from(Span::styled(
                "  [Tab] Switch ranking  [l] Language  [q] Back",
                Style::default().fg(colors.accent()),
            )),
        ])
        .render(layout[2], buf);
    }
}
