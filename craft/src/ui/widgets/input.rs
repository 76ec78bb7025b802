//! Input field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::CraftTheme;

/// Split `content` around a character cursor into spans, underlining the
/// cursor cell.
pub fn cursor_spans<'a>(content: &str, cursor: usize, theme: &CraftTheme) -> Vec<Span<'a>> {
    // Use character-based slicing for unicode safety
    let before: String = content.chars().take(cursor).collect();
    let at = content
        .chars()
        .nth(cursor)
        .map(|c| c.to_string())
        .unwrap_or_else(|| " ".to_string());
    let after: String = content.chars().skip(cursor + 1).collect();

    vec![
        Span::raw(before),
        Span::styled(
            at,
            Style::default()
                .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                .fg(theme.accent),
        ),
        Span::raw(after),
    ]
}

/// Bordered single-line input field
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a CraftTheme,
    title: &'a str,
    placeholder: &'a str,
    is_active: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a CraftTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            title: "",
            placeholder: "",
            is_active: true,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(self.title, self.theme.title_style(self.is_active)))
            .border_style(self.theme.border_style(self.is_active));

        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() && !self.is_active {
            Line::from(Span::styled(
                self.placeholder,
                Style::default().add_modifier(Modifier::DIM),
            ))
        } else if self.is_active {
            Line::from(cursor_spans(self.content, self.cursor_position, self.theme))
        } else {
            Line::from(self.content)
        };

        Paragraph::new(line).render(inner, buf);
    }
}
