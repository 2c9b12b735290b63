use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use codesprint::session::{CharStatus, TypingSession};

use crate::ui::theme::Theme;

pub struct TypingArea<'a> {
    session: &'a TypingSession,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(session: &'a TypingSession, title: &'a str, theme: &'a Theme) -> Self {
        Self {
            session,
            title,
            theme,
        }
    }
}

/// A render token maps a single target character to its display representation.
struct RenderToken {
    target_idx: usize,
    display: String,
    is_line_break: bool,
}

/// Expand target chars into render tokens; newlines get a visible marker.
fn build_render_tokens(target: &[char]) -> Vec<RenderToken> {
    target
        .iter()
        .enumerate()
        .map(|(i, &ch)| match ch {
            '\n' => RenderToken {
                target_idx: i,
                display: "\u{21b5}".to_string(), // ↵
                is_line_break: true,
            },
            _ => RenderToken {
                target_idx: i,
                display: ch.to_string(),
                is_line_break: false,
            },
        })
        .collect()
}

/// Mistyped printable characters show what was typed; a newline keeps its marker.
fn display_for(token: &RenderToken, target_ch: char, status: CharStatus) -> String {
    match status {
        CharStatus::Incorrect(typed) if target_ch != '\n' => match typed {
            '\n' => "\u{21b5}".to_string(),
            ' ' => "\u{00b7}".to_string(),
            other => other.to_string(),
        },
        _ => token.display.clone(),
    }
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let target = self.session.target();
        let tokens = build_render_tokens(target);

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];

        for token in &tokens {
            let idx = token.target_idx;
            let status = self.session.char_status(idx);

            let style = match status {
                CharStatus::Correct => Style::default().fg(colors.text_correct()),
                CharStatus::Incorrect(_) => Style::default()
                    .fg(colors.text_incorrect())
                    .bg(colors.text_incorrect_bg())
                    .add_modifier(Modifier::UNDERLINED),
                CharStatus::Current if !self.session.is_paused() => Style::default()
                    .fg(colors.text_cursor_fg())
                    .bg(colors.text_cursor_bg()),
                CharStatus::Current | CharStatus::Pending => {
                    Style::default().fg(colors.text_pending())
                }
            };

            let display = display_for(token, target[idx], status);
            if let Some(line) = lines.last_mut() {
                line.push(Span::styled(display, style));
            }

            if token.is_line_break {
                lines.push(Vec::new());
            }
        }

        let ratatui_lines: Vec<Line> = lines.into_iter().map(Line::from).collect();

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(if self.session.is_paused() {
                colors.warning()
            } else {
                colors.border()
            }))
            .style(Style::default().bg(colors.bg()));

        let paragraph = Paragraph::new(ratatui_lines)
            .block(block)
            .wrap(Wrap { trim: false });

        paragraph.render(area, buf);
    }
}
