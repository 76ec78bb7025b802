//! Render orchestration for the craft TUI

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use craft_core::journal::{AuthMode, View};
use craft_core::store::Store;
use craft_core::CraftMode;

use crate::app::{App, AuthField, EntryField, InputMode, MaterialField};
use crate::ui::layout::{centered_rect_fixed, split_header, AppLayout};
use crate::ui::widgets::{
    cursor_spans, HotkeyBarWidget, InputWidget, RowListWidget, StatusBarWidget,
};

/// Overlay types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
    ModeMenu { selected: usize },
    /// Path prompt standing in for a file picker
    ImagePrompt,
    EntryEditor,
    MaterialEditor,
}

/// Main render function
pub fn render<S: Store>(frame: &mut Frame, app: &App<S>) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_bar);
    render_main(frame, app, layout.main_area);
    render_status_bar(frame, app, layout.status_bar);
    render_hotkey_bar(frame, app, layout.hotkey_bar);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }

    // Drawn last so nothing else looks interactive while the call is pending
    if app.analyzing {
        render_analyzing_overlay(frame, app, area);
    }
}

/// Render the title bar
fn render_title_bar<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let journal = &app.journal;
    let mut spans = vec![
        Span::styled(" 手作日记 ", app.theme.accent_style()),
        Span::raw(format!("| {} | ", journal.mode().label())),
    ];
    for (i, view) in View::ALL.iter().enumerate() {
        let style = if *view == journal.view() {
            app.theme.title_style(true).add_modifier(Modifier::UNDERLINED)
        } else {
            app.theme.system_style()
        };
        spans.push(Span::styled(format!("{} {} ", i + 1, view.label()), style));
    }
    let user = journal
        .current_user()
        .map(|u| u.name.clone())
        .unwrap_or_else(|| "未登录".to_string());
    spans.push(Span::raw(format!("| {user} ")));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_main<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let rows = app.rows();
    let focused = !app.has_overlay() && app.input_mode == InputMode::Normal;
    let list = RowListWidget::new(&app.journal, &rows, &app.theme)
        .selected(app.selected)
        .focused(focused);

    match app.journal.view() {
        View::Home => {
            let list = list.title(View::Home.label()).empty_text("还没有记录，按 n 新建");
            frame.render_widget(list, area);
        }
        View::Inspirations => {
            let list = list
                .title(View::Inspirations.label())
                .empty_text("还没有灵感，按 n 记录一个");
            frame.render_widget(list, area);
        }
        View::Materials => {
            let list = list.title(View::Materials.label());
            frame.render_widget(list, area);
        }
        View::Search => {
            let (header, body) = split_header(area, 4);
            render_search_header(frame, app, header);
            let title = format!("{} ({})", View::Search.label(), rows.len());
            frame.render_widget(list.title(title).empty_text("没有匹配的记录"), body);
        }
        View::Profile => {
            let header_height = if app.journal.current_user().is_some() { 5 } else { 8 };
            let (header, body) = split_header(area, header_height);
            render_profile_header(frame, app, header);
            let list = list
                .title("本机账户")
                .empty_text("(no accounts)")
                .focused(focused && app.journal.current_user().is_none());
            frame.render_widget(list, body);
        }
    }
}

fn render_search_header<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let (input_area, chips_area) = split_header(area, 3);
    let editing = app.input_mode == InputMode::Search;
    let query = if editing {
        app.input.text()
    } else {
        app.journal.search_filter().query.as_str()
    };
    let input = InputWidget::new(query, &app.theme)
        .cursor_position(app.input.cursor())
        .title(" 搜索 ")
        .placeholder("按 / 输入关键词")
        .active(editing);
    frame.render_widget(input, input_area);

    let current = &app.journal.search_filter().stage;
    let mut spans = vec![Span::styled(" f ", app.theme.accent_style())];
    let all = craft_core::StageFilter::All;
    let stages = app.mode().config().stages;
    let chips = std::iter::once(all).chain(
        stages
            .iter()
            .map(|s| craft_core::StageFilter::Stage(s.value.to_string())),
    );
    for chip in chips {
        let style = if &chip == current {
            app.theme.selected_style()
        } else {
            app.theme.system_style()
        };
        spans.push(Span::styled(format!(" {} ", chip.label()), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chips_area);
}

fn render_profile_header<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let theme = &app.theme;
    let journal = &app.journal;

    if let Some(user) = journal.current_user() {
        let lines = vec![
            Line::from(Span::styled(user.name.clone(), theme.accent_style())),
            Line::from(user.email.clone()),
            Line::from(Span::styled("按 o 退出登录", theme.system_style())),
        ];
        let block = Block::default()
            .title(" 我的 ")
            .borders(Borders::ALL)
            .border_style(theme.border_style(false));
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let form = &journal.auth_form;
    let editing = app.input_mode == InputMode::Auth;
    let (title, switch_hint) = match form.mode {
        AuthMode::Login => (" 登录 ", "r 切换到注册"),
        AuthMode::Register => (" 注册 ", "r 切换到登录"),
    };

    let mut lines = Vec::new();
    for field in app.auth_fields() {
        let (label, value) = match field {
            AuthField::Name => ("昵称", form.name.clone()),
            AuthField::Email => ("邮箱", form.email.clone()),
            AuthField::Password => ("密码", "•".repeat(form.password.chars().count())),
        };
        let focused = editing && app.auth_field == *field;
        let mut spans = vec![Span::styled(
            format!("{label}: "),
            theme.title_style(focused),
        )];
        if focused && *field != AuthField::Password {
            spans.extend(cursor_spans(app.input.text(), app.input.cursor(), theme));
        } else {
            spans.push(Span::raw(value));
        }
        lines.push(Line::from(spans));
    }
    if let Some(error) = journal.auth_error() {
        lines.push(Line::from(Span::styled(error.to_string(), theme.error_style())));
    }
    lines.push(Line::from(Span::styled(
        format!("i 编辑 · Enter 提交 · {switch_hint}"),
        theme.system_style(),
    )));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.border_style(editing));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the status bar
fn render_status_bar<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let widget = StatusBarWidget::new(
        app.journal.entries().len(),
        app.journal.materials().len(),
        app.input_mode,
        &app.theme,
    )
    .online(app.online)
    .message(app.status_message());
    frame.render_widget(widget, area);
}

/// Render the hotkey bar
fn render_hotkey_bar<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let widget = HotkeyBarWidget::new(app.journal.view(), app.input_mode, &app.theme)
        .overlay(app.overlay())
        .logged_in(app.journal.current_user().is_some());
    frame.render_widget(widget, area);
}

/// Render overlay
fn render_overlay<S: Store>(frame: &mut Frame, app: &App<S>, overlay: &Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
        Overlay::ModeMenu { selected } => render_mode_menu(frame, app, *selected, area),
        Overlay::ImagePrompt => render_image_prompt(frame, app, area),
        Overlay::EntryEditor => render_entry_editor(frame, app, area),
        Overlay::MaterialEditor => render_material_editor(frame, app, area),
    }
}

/// Render help overlay
fn render_help_overlay<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let popup_area = centered_rect_fixed(56, 26, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            " Craft Journal - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Navigation:"),
        Line::from("  1-5 / Tab      主页 灵感 材料 搜索 我的"),
        Line::from("  j/k or ↑/↓     Move selection"),
        Line::from("  Enter          Open entry / material / section"),
        Line::from("  Space          Fold or unfold a section"),
        Line::from(""),
        heading("Actions:"),
        Line::from("  n              New entry (asks for an image path)"),
        Line::from("  a              New material"),
        Line::from("  m              Switch craft mode"),
        Line::from("  /  f           Search query, cycle stage filter"),
        Line::from("  i  r  o        Profile: edit form, login/register, logout"),
        Line::from(""),
        heading("Editors:"),
        Line::from("  Tab/Shift+Tab  Next/previous field"),
        Line::from("  ←/→            Change stage, type or material"),
        Line::from("  Space          Toggle material"),
        Line::from("  Enter          Add image path / quick-add name|brand"),
        Line::from("  Ctrl+S Ctrl+D  Save, discard (放弃)"),
        Line::from("  Esc            Cancel"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

fn render_mode_menu<S: Store>(frame: &mut Frame, app: &App<S>, selected: usize, area: Rect) {
    let popup_area = centered_rect_fixed(32, CraftMode::ALL.len() as u16 + 2, area);
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = CraftMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let marker = if *mode == app.mode() { "●" } else { " " };
            let line = Line::from(format!(" {marker} {}  {}", mode.label(), mode.slug()));
            if i == selected {
                line.style(app.theme.selected_style())
            } else {
                line
            }
        })
        .collect();

    let block = Block::default()
        .title(" 切换工艺 ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn render_image_prompt<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let popup_area = centered_rect_fixed(64, 3, area);
    frame.render_widget(Clear, popup_area);
    let input = InputWidget::new(app.input.text(), &app.theme)
        .cursor_position(app.input.cursor())
        .title(" 图片路径 (留空则不添加) ");
    frame.render_widget(input, popup_area);
}

/// A labelled text field, showing the line input when focused.
fn text_field<'a, S: Store>(
    app: &App<S>,
    label: &str,
    value: &str,
    placeholder: &str,
    focused: bool,
) -> Line<'a> {
    let mut spans = vec![Span::styled(
        format!("{label}: "),
        app.theme.title_style(focused),
    )];
    if focused {
        spans.extend(cursor_spans(app.input.text(), app.input.cursor(), &app.theme));
    } else if value.is_empty() {
        spans.push(Span::styled(placeholder.to_string(), app.theme.system_style()));
    } else {
        spans.push(Span::raw(value.to_string()));
    }
    Line::from(spans)
}

fn render_entry_editor<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let Some(editor) = app.journal.entry_editor() else {
        return;
    };
    let popup_area = centered_rect_fixed(76, 28, area);
    frame.render_widget(Clear, popup_area);

    let theme = &app.theme;
    let config = app.mode().config();
    let field = app.entry_field;
    let mut lines = Vec::new();

    lines.push(text_field(
        app,
        "标题",
        editor.title(),
        "留空将自动命名",
        field == EntryField::Title,
    ));

    let mut stage_spans = vec![Span::styled(
        "阶段: ",
        theme.title_style(field == EntryField::Stage),
    )];
    for stage in config.stages {
        let style = if stage.value == editor.stage() {
            theme
                .stage_style(stage.kind)
                .add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            theme.stage_style(stage.kind)
        };
        stage_spans.push(Span::styled(format!(" {} ", stage.value), style));
    }
    lines.push(Line::from(stage_spans));

    let images_label = format!("图片 ({})", editor.images().len());
    lines.push(text_field(
        app,
        &images_label,
        "",
        "Enter 添加图片路径",
        field == EntryField::Images,
    ));
    lines.push(text_field(
        app,
        "备注",
        editor.memo(),
        "",
        field == EntryField::Memo,
    ));

    if let Some(insight) = editor
        .editing()
        .and_then(|id| app.journal.entry(id))
        .and_then(|e| e.ai_insights.as_deref())
    {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("✦ {insight}"),
            theme.insight_style(),
        )));
    }

    if editor.shows_materials() {
        lines.push(Line::from(""));
        let picking = matches!(field, EntryField::Materials | EntryField::QuickAdd);
        for (ti, def) in config.material_types.iter().enumerate() {
            let type_focused = picking && ti == app.picker_type;
            let mut spans = vec![Span::styled(
                format!("{}: ", def.label),
                theme.title_style(type_focused),
            )];
            let materials = app.journal.materials_of_type(def.id);
            if materials.is_empty() {
                spans.push(Span::styled("(空)", theme.system_style()));
            }
            for (mi, material) in materials.iter().enumerate() {
                let mark = if editor.is_selected(def.id, &material.id) {
                    "☑"
                } else {
                    "☐"
                };
                let style = if field == EntryField::Materials && type_focused && mi == app.picker_item
                {
                    theme.selected_style()
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!("{mark} {} ", material.name), style));
            }
            // Selected snapshots whose source material was deleted
            if let Some(selected) = editor.selected().get(def.id) {
                for snapshot in selected
                    .iter()
                    .filter(|s| !materials.iter().any(|m| m.id == s.id))
                {
                    spans.push(Span::styled(
                        format!("☑ {} ", snapshot.name),
                        theme.system_style(),
                    ));
                }
            }
            lines.push(Line::from(spans));
        }

        let quick_label = format!(
            "快速添加 {}",
            config
                .material_types
                .get(app.picker_type)
                .map_or("", |t| t.label)
        );
        lines.push(text_field(
            app,
            &quick_label,
            "",
            "名称|品牌",
            field == EntryField::QuickAdd,
        ));
    }

    let title = if editor.editing().is_some() {
        " 编辑记录 "
    } else {
        " 新记录 "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn render_material_editor<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let Some(editor) = app.journal.material_editor() else {
        return;
    };
    let popup_area = centered_rect_fixed(64, 10, area);
    frame.render_widget(Clear, popup_area);

    let theme = &app.theme;
    let field = app.material_field;
    let mut lines = vec![
        text_field(app, "名称", &editor.name, "必填", field == MaterialField::Name),
        text_field(app, "品牌", &editor.brand, "", field == MaterialField::Brand),
    ];

    let mut type_spans = vec![Span::styled(
        "类型: ",
        theme.title_style(field == MaterialField::Type),
    )];
    for def in app.material_types() {
        let style = if def.id == editor.type_id() {
            theme.accent_style().add_modifier(Modifier::REVERSED)
        } else {
            theme.system_style()
        };
        type_spans.push(Span::styled(format!(" {} ", def.label), style));
    }
    lines.push(Line::from(type_spans));

    lines.push(text_field(app, "备注", &editor.memo, "", field == MaterialField::Memo));
    let images_label = format!("图片 ({})", editor.images().len());
    lines.push(text_field(
        app,
        &images_label,
        "",
        "Enter 添加图片路径",
        field == MaterialField::Images,
    ));

    let title = if editor.editing().is_some() {
        " 编辑材料 "
    } else {
        " 新材料 "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn render_analyzing_overlay<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let popup_area = centered_rect_fixed(30, 5, area);
    frame.render_widget(Clear, popup_area);
    let lines = vec![
        Line::from(Span::styled("Analyzing…", app.theme.accent_style())),
        Line::from(Span::styled("AI 正在分析作品", app.theme.system_style())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(ratatui::layout::Alignment::Center)
            .block(block),
        popup_area,
    );
}
