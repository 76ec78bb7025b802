//! Selectable list of journal rows

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use craft_core::journal::Journal;
use craft_core::store::Store;

use crate::app::Row;
use crate::ui::theme::CraftTheme;

/// Renders the rows of the current view, keeping the selection visible
pub struct RowListWidget<'a, S: Store> {
    journal: &'a Journal<S>,
    rows: &'a [Row],
    selected: usize,
    title: String,
    empty_text: &'a str,
    focused: bool,
    theme: &'a CraftTheme,
}

impl<'a, S: Store> RowListWidget<'a, S> {
    pub fn new(journal: &'a Journal<S>, rows: &'a [Row], theme: &'a CraftTheme) -> Self {
        Self {
            journal,
            rows,
            selected: 0,
            title: String::new(),
            empty_text: "(empty)",
            focused: true,
            theme,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn row_line(&self, row: &Row) -> Line<'static> {
        let journal = self.journal;
        let config = journal.mode().config();
        match row {
            Row::Section(section) => {
                let marker = if journal.is_expanded(*section) { "▾" } else { "▸" };
                Line::from(Span::styled(
                    format!("{marker} {} ({})", section.label(), journal.section(*section).len()),
                    self.theme.title_style(false).add_modifier(Modifier::BOLD),
                ))
            }
            Row::MaterialType(type_id) => {
                let marker = if journal.is_material_section_expanded(type_id) {
                    "▾"
                } else {
                    "▸"
                };
                let label = config.material_type(type_id).map_or(*type_id, |t| t.label);
                Line::from(Span::styled(
                    format!("{marker} {label} ({})", journal.materials_of_type(type_id).len()),
                    self.theme.title_style(false).add_modifier(Modifier::BOLD),
                ))
            }
            Row::Entry(id) => {
                let Some(entry) = journal.entry(id) else {
                    return Line::from("  ?");
                };
                let mut spans = vec![
                    Span::styled(
                        format!("  [{}] ", entry.stage),
                        self.theme.stage_style(config.stage_kind(&entry.stage)),
                    ),
                    Span::raw(entry.title.clone()),
                ];
                if !entry.images.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}图", entry.images.len()),
                        self.theme.system_style(),
                    ));
                }
                let materials = entry.material_count();
                if materials > 0 {
                    spans.push(Span::styled(
                        format!("  {materials}种材料"),
                        self.theme.system_style(),
                    ));
                }
                if let Some(insight) = &entry.ai_insights {
                    spans.push(Span::styled(format!("  ✦ {insight}"), self.theme.insight_style()));
                }
                Line::from(spans)
            }
            Row::Material(id) => {
                let Some(material) = journal.material(id) else {
                    return Line::from("  ?");
                };
                let mut spans = vec![Span::raw(format!("  {}", material.name))];
                if !material.brand.is_empty() {
                    spans.push(Span::styled(
                        format!(" / {}", material.brand),
                        self.theme.system_style(),
                    ));
                }
                if let Some(memo) = material.memo.as_deref().filter(|m| !m.is_empty()) {
                    spans.push(Span::styled(format!("  {memo}"), self.theme.system_style()));
                }
                Line::from(spans)
            }
            Row::User(id) => {
                let current = journal.current_user().is_some_and(|u| &u.id == id);
                let Some(user) = journal.users().iter().find(|u| &u.id == id) else {
                    return Line::from("  ?");
                };
                let marker = if current { "*" } else { " " };
                Line::from(format!("  {marker} {} <{}>", user.name, user.email))
            }
        }
    }
}

impl<S: Store> Widget for RowListWidget<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                format!(" {} ", self.title),
                self.theme.title_style(self.focused),
            ))
            .border_style(self.theme.border_style(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.rows.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.empty_text,
                Style::default().add_modifier(Modifier::DIM),
            )))
            .render(inner, buf);
            return;
        }

        let height = inner.height as usize;
        let offset = if height == 0 {
            0
        } else {
            self.selected.saturating_sub(height - 1)
        };

        let lines: Vec<Line> = self
            .rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, row)| {
                let line = self.row_line(row);
                if self.focused && i == self.selected {
                    line.style(self.theme.selected_style())
                } else {
                    line
                }
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
