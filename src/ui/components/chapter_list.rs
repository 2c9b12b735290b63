use std::collections::BTreeMap;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use codesprint::content::Chapter;
use codesprint::engine::ChapterProgress;

use crate::ui::theme::Theme;

pub struct ChapterList<'a> {
    pub chapters: &'a [&'a Chapter],
    pub selected: usize,
    pub language: &'a str,
    pub progress: &'a BTreeMap<String, ChapterProgress>,
    pub theme: &'a Theme,
}

impl<'a> ChapterList<'a> {
    pub fn new(
        chapters: &'a [&'a Chapter],
        selected: usize,
        language: &'a str,
        progress: &'a BTreeMap<String, ChapterProgress>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            chapters,
            selected,
            language,
            progress,
            theme,
        }
    }
}

/// First row index that keeps `selected` visible in a window of `height` rows.
fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        0
    } else {
        selected.saturating_sub(height - 1)
    }
}

impl Widget for ChapterList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Chapters: {} ", self.language))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            "codesprint",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        if self.chapters.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "  No chapters for this language. Press [l] to switch.",
                Style::default().fg(colors.text_pending()),
            )))
            .render(layout[1], buf);
            return;
        }

        let rows_area = layout[1];
        let height = rows_area.height as usize;
        let offset = scroll_offset(self.selected, height);

        let lines: Vec<Line> = self
            .chapters
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, chapter)| {
                let is_selected = i == self.selected;
                let indicator = if is_selected { ">" } else { " " };
                let mark = match self.progress.get(&chapter.id) {
                    Some(p) if p.completed => format!("\u{2713} {:>3} wpm", p.wpm),
                    _ => "         ".to_string(),
                };
                let row_style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .bg(colors.selected_bg())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(vec![
                    Span::styled(format!(" {indicator} {:<34}", chapter.title), row_style),
                    Span::styled(
                        format!(" {:<12} {:<13}", chapter.language, chapter.level.as_str()),
                        Style::default().fg(colors.text_pending()),
                    ),
                    Span::styled(mark, Style::default().fg(colors.success())),
                ])
            })
            .collect();

        Paragraph::new(lines).render(rows_area, buf);
    }
}
