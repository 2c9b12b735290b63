use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use codesprint::engine::ChapterProgress;
use codesprint::session::{LiveStats, StatHistoryEntry};

use crate::ui::theme::Theme;

pub struct StatsSidebar<'a> {
    stats: &'a LiveStats,
    paused: bool,
    best: Option<&'a ChapterProgress>,
    chapter_history: Vec<&'a StatHistoryEntry>,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(
        stats: &'a LiveStats,
        paused: bool,
        best: Option<&'a ChapterProgress>,
        chapter_history: Vec<&'a StatHistoryEntry>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            stats,
            paused,
            best,
            chapter_history,
            theme,
        }
    }
}

/// Format a delta value with arrow indicator
fn format_delta(delta: f64, suffix: &str) -> String {
    if delta > 0.0 {
        format!("\u{2191}+{delta:.1}{suffix}")
    } else if delta < 0.0 {
        format!("\u{2193}{delta:.1}{suffix}")
    } else {
        format!("={suffix}")
    }
}

fn average(values: impl Iterator<Item = u32>) -> Option<f64> {
    let (sum, n) = values.fold((0u64, 0u64), |(s, n), v| (s + v as u64, n + 1));
    (n > 0).then(|| sum as f64 / n as f64)
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(11), Constraint::Min(9)])
            .split(area);

        let stats = self.stats;
        let label = |text: &'static str| Span::styled(text, Style::default().fg(colors.fg()));

        let mut lines = vec![
            Line::from(vec![
                label("WPM:      "),
                Span::styled(stats.wpm.to_string(), Style::default().fg(colors.accent())),
            ]),
            Line::from(vec![
                label("Accuracy: "),
                Span::styled(
                    format!("{}%", stats.accuracy),
                    Style::default().fg(colors.accuracy(stats.accuracy as f64)),
                ),
            ]),
            Line::from(vec![
                label("Progress: "),
                Span::styled(
                    format!("{}%", stats.progress_percent),
                    Style::default().fg(colors.accent()),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                label("Correct:  "),
                Span::styled(
                    stats.correct_chars.to_string(),
                    Style::default().fg(colors.success()),
                ),
            ]),
            Line::from(vec![
                label("Errors:   "),
                Span::styled(
                    stats.error_count.to_string(),
                    Style::default().fg(colors.error()),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                label("Time:     "),
                Span::styled(
                    format!("{:.1}s", stats.elapsed_ms as f64 / 1000.0),
                    Style::default().fg(colors.fg()),
                ),
            ]),
        ];
        if self.paused {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "PAUSED (clock running)",
                Style::default().fg(colors.warning()),
            )));
        }

        let block = Block::bordered()
            .title(" Live ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(lines).block(block).render(sections[0], buf);

        let mut lines = Vec::new();
        match self.best {
            Some(best) => {
                lines.push(Line::from(vec![
                    label("Best WPM: "),
                    Span::styled(best.wpm.to_string(), Style::default().fg(colors.accent())),
                ]));
                lines.push(Line::from(vec![
                    label("Best acc: "),
                    Span::styled(
                        format!("{}%", best.accuracy),
                        Style::default().fg(colors.accuracy(best.accuracy as f64)),
                    ),
                ]));
            }
            None => lines.push(Line::from(Span::styled(
                "First attempt",
                Style::default().fg(colors.text_pending()),
            ))),
        }

        let avg_wpm = average(self.chapter_history.iter().map(|h| h.wpm));
        let avg_acc = average(self.chapter_history.iter().map(|h| h.accuracy));
        if let (Some(avg_wpm), Some(avg_acc)) = (avg_wpm, avg_acc)
            && stats.compared_chars > 0
        {
            let wpm_delta = stats.wpm as f64 - avg_wpm;
            let acc_delta = stats.accuracy as f64 - avg_acc;
            let delta_color = |d: f64| {
                if d > 0.0 {
                    colors.success()
                } else if d < 0.0 {
                    colors.error()
                } else {
                    colors.text_pending()
                }
            };
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("vs avg WPM: ", Style::default().fg(colors.text_pending())),
                Span::styled(
                    format_delta(wpm_delta, ""),
                    Style::default().fg(delta_color(wpm_delta)),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("vs avg acc: ", Style::default().fg(colors.text_pending())),
                Span::styled(
                    format_delta(acc_delta, "%"),
                    Style::default().fg(delta_color(acc_delta)),
                ),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} attempts", self.chapter_history.len()),
            Style::default().fg(colors.text_pending()),
        )));

        let block = Block::bordered()
            .title(" This Chapter ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(lines).block(block).render(sections[1], buf);
    }
}
