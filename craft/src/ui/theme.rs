//! Color theme and styling for the craft TUI

use craft_core::StageKind;
use ratatui::style::{Color, Modifier, Style};

/// Journal UI color theme
#[derive(Debug, Clone)]
pub struct CraftTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,
    pub selection: Color,

    // Stage colors
    pub inspiration: Color,
    pub working: Color,
    pub finished: Color,
    pub discarded: Color,

    // Text colors
    pub insight_text: Color,
    pub system_text: Color,
    pub error_text: Color,
}

impl Default for CraftTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Rgb(214, 135, 84),
            accent: Color::Rgb(214, 135, 84),
            selection: Color::Rgb(60, 48, 40),

            inspiration: Color::LightYellow,
            working: Color::LightBlue,
            finished: Color::LightGreen,
            discarded: Color::DarkGray,

            insight_text: Color::LightMagenta,
            system_text: Color::DarkGray,
            error_text: Color::LightRed,
        }
    }
}

impl CraftTheme {
    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Get title style
    pub fn title_style(&self, focused: bool) -> Style {
        let style = Style::default().fg(if focused {
            self.border_focused
        } else {
            self.foreground
        });

        if focused {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    /// Get style for the selected row
    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for a stage badge
    pub fn stage_style(&self, kind: StageKind) -> Style {
        let color = match kind {
            StageKind::Inspiration => self.inspiration,
            StageKind::Working => self.working,
            StageKind::Final => self.finished,
            StageKind::Discarded => self.discarded,
        };
        Style::default().fg(color)
    }

    pub fn insight_style(&self) -> Style {
        Style::default()
            .fg(self.insight_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error_text)
    }

    pub fn accent_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}
