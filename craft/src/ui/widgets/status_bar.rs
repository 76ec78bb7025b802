//! Status and hotkey bars

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use craft_core::journal::View;

use crate::app::InputMode;
use crate::ui::theme::CraftTheme;
use crate::ui::Overlay;

/// One-line status: counts and the last message
pub struct StatusBarWidget<'a> {
    entries: usize,
    materials: usize,
    input_mode: InputMode,
    message: Option<&'a str>,
    online: bool,
    theme: &'a CraftTheme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(entries: usize, materials: usize, input_mode: InputMode, theme: &'a CraftTheme) -> Self {
        Self {
            entries,
            materials,
            input_mode,
            message: None,
            online: true,
            theme,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mode = match self.input_mode {
            InputMode::Normal => "NORMAL",
            InputMode::Search => "SEARCH",
            InputMode::Auth => "FORM",
        };

        let mut spans = vec![
            Span::styled(format!(" {mode} "), self.theme.accent_style()),
            Span::raw(format!(" {} 条记录 · {} 种材料 ", self.entries, self.materials)),
        ];
        if !self.online {
            spans.push(Span::styled("· offline ", self.theme.system_style()));
        }
        if let Some(message) = self.message {
            let style = if message.starts_with("Error") {
                self.theme.error_style()
            } else {
                Style::default().add_modifier(Modifier::ITALIC)
            };
            spans.push(Span::raw("| "));
            spans.push(Span::styled(message.to_string(), style));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Context-sensitive key hints
pub struct HotkeyBarWidget<'a> {
    view: View,
    input_mode: InputMode,
    overlay: Option<&'a Overlay>,
    logged_in: bool,
    theme: &'a CraftTheme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(view: View, input_mode: InputMode, theme: &'a CraftTheme) -> Self {
        Self {
            view,
            input_mode,
            overlay: None,
            logged_in: false,
            theme,
        }
    }

    pub fn overlay(mut self, overlay: Option<&'a Overlay>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn logged_in(mut self, logged_in: bool) -> Self {
        self.logged_in = logged_in;
        self
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        match self.overlay {
            Some(Overlay::Help) => return vec![("Esc", "close")],
            Some(Overlay::ModeMenu { .. }) => {
                return vec![("j/k", "select"), ("Enter", "switch"), ("Esc", "close")]
            }
            Some(Overlay::ImagePrompt) => {
                return vec![("Enter", "open (empty: no image)"), ("Esc", "cancel")]
            }
            Some(Overlay::EntryEditor) => {
                return vec![
                    ("Tab", "field"),
                    ("←/→", "change"),
                    ("Space", "toggle"),
                    ("^S", "save"),
                    ("^D", "discard"),
                    ("Esc", "cancel"),
                ]
            }
            Some(Overlay::MaterialEditor) => {
                return vec![("Tab", "field"), ("←/→", "type"), ("^S", "save"), ("Esc", "cancel")]
            }
            None => {}
        }

        match self.input_mode {
            InputMode::Search => return vec![("Enter/Esc", "done"), ("type", "query")],
            InputMode::Auth => {
                return vec![("Tab", "field"), ("Enter", "submit"), ("Esc", "done")]
            }
            InputMode::Normal => {}
        }

        let mut hints = vec![
            ("1-5", "view"),
            ("j/k", "select"),
            ("Enter", "open"),
            ("n", "new"),
            ("a", "material"),
            ("m", "mode"),
        ];
        match self.view {
            View::Home | View::Materials => hints.push(("Space", "fold")),
            View::Search => hints.extend([("/", "query"), ("f", "stage")]),
            View::Profile if self.logged_in => hints.push(("o", "logout")),
            View::Profile => hints.extend([("i", "edit form"), ("r", "login/register")]),
            View::Inspirations => {}
        }
        hints.extend([("?", "help"), ("q", "quit")]);
        hints
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (key, action) in self.hints() {
            spans.push(Span::styled(format!(" {key}"), self.theme.accent_style()));
            spans.push(Span::styled(format!(" {action} "), self.theme.system_style()));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
