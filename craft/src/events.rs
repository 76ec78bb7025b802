//! Event handling for the craft TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use craft_core::journal::View;
use craft_core::store::Store;

use crate::app::{App, AuthField, EntryField, InputMode, MaterialField, PendingAction};
use crate::ui::Overlay;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event<S: Store>(app: &mut App<S>, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event<S: Store>(app: &mut App<S>, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    // Handle overlay keys first
    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Search => handle_search_mode(app, key),
        InputMode::Auth => handle_auth_mode(app, key),
    }
}

/// Handle keys on the main screen
fn handle_normal_mode<S: Store>(app: &mut App<S>, key: KeyEvent) -> EventResult {
    app.clear_status();
    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }

        // Views
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.set_view(View::ALL[index]);
            EventResult::NeedsRedraw
        }
        KeyCode::Tab => {
            let index = View::ALL
                .iter()
                .position(|v| *v == app.journal.view())
                .unwrap_or(0);
            app.set_view(View::ALL[(index + 1) % View::ALL.len()]);
            EventResult::NeedsRedraw
        }

        // Selection
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.selected = 0;
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            app.activate_selected();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(' ') => {
            app.toggle_selected_section();
            EventResult::NeedsRedraw
        }

        // Actions
        KeyCode::Char('m') => {
            app.open_mode_menu();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('n') => {
            app.open_image_prompt();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('a') => {
            app.new_material();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('/') => {
            app.begin_search();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('f') => {
            app.cycle_stage_filter();
            EventResult::NeedsRedraw
        }

        _ => handle_view_hotkeys(app, key),
    }
}

/// Keys that only mean something on one view
fn handle_view_hotkeys<S: Store>(app: &mut App<S>, key: KeyEvent) -> EventResult {
    if app.journal.view() != View::Profile {
        return EventResult::Continue;
    }
    let logged_in = app.journal.current_user().is_some();
    match key.code {
        KeyCode::Char('o') if logged_in => {
            app.logout();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('i') if !logged_in => {
            app.begin_auth();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('r') if !logged_in => {
            app.toggle_auth_mode();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Line editing shared by every text field. Returns true if the key was used.
fn edit_input<S: Store>(app: &mut App<S>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.input.insert(c),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Left => app.input.left(),
        KeyCode::Right => app.input.right(),
        KeyCode::Home => app.input.home(),
        KeyCode::End => app.input.end(),
        _ => return false,
    }
    true
}

/// Typing into the search query
fn handle_search_mode<S: Store>(app: &mut App<S>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.input.clear();
            EventResult::NeedsRedraw
        }
        _ => {
            if edit_input(app, key) {
                app.journal.set_search_query(app.input.text());
                app.clamp_selection();
            }
            EventResult::NeedsRedraw
        }
    }
}

/// Typing into the login/register form
fn handle_auth_mode<S: Store>(app: &mut App<S>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.input.clear();
        }
        KeyCode::Enter => app.submit_auth(),
        KeyCode::Tab | KeyCode::Down => app.cycle_auth_field(1),
        KeyCode::BackTab | KeyCode::Up => app.cycle_auth_field(-1),
        _ => {
            if edit_input(app, key) {
                let text = app.input.text().to_string();
                let form = &mut app.journal.auth_form;
                match app.auth_field {
                    AuthField::Name => form.name = text,
                    AuthField::Email => form.email = text,
                    AuthField::Password => form.password = text,
                }
            }
        }
    }
    EventResult::NeedsRedraw
}

/// Handle keys while an overlay is active
fn handle_overlay_key<S: Store>(app: &mut App<S>, key: KeyEvent) -> EventResult {
    let Some(overlay) = app.overlay().copied() else {
        return EventResult::Continue;
    };
    match overlay {
        Overlay::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                app.close_overlay();
            }
        }
        Overlay::ModeMenu { .. } => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => app.close_overlay(),
            KeyCode::Char('j') | KeyCode::Down => app.move_mode_menu(1),
            KeyCode::Char('k') | KeyCode::Up => app.move_mode_menu(-1),
            KeyCode::Enter => app.confirm_mode_menu(),
            _ => {}
        },
        Overlay::ImagePrompt => match key.code {
            KeyCode::Esc => app.close_overlay(),
            KeyCode::Enter => app.confirm_image_prompt(),
            _ => {
                edit_input(app, key);
            }
        },
        Overlay::EntryEditor => handle_entry_editor_key(app, key),
        Overlay::MaterialEditor => handle_material_editor_key(app, key),
    }
    EventResult::NeedsRedraw
}

fn handle_entry_editor_key<S: Store>(app: &mut App<S>, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return app.cancel_entry(),
        KeyCode::Char('s') if ctrl => {
            app.pending = Some(PendingAction::ConfirmEntry);
            return;
        }
        KeyCode::Char('d') if ctrl => {
            app.pending = Some(PendingAction::DiscardEntry);
            return;
        }
        KeyCode::Tab => return app.cycle_entry_field(1),
        KeyCode::BackTab => return app.cycle_entry_field(-1),
        _ => {}
    }

    match app.entry_field {
        EntryField::Stage => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.cycle_entry_stage(-1),
            KeyCode::Right | KeyCode::Char('l') => app.cycle_entry_stage(1),
            _ => {}
        },
        EntryField::Materials => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.move_picker_item(-1),
            KeyCode::Right | KeyCode::Char('l') => app.move_picker_item(1),
            KeyCode::Up | KeyCode::Char('k') => app.move_picker_type(-1),
            KeyCode::Down | KeyCode::Char('j') => app.move_picker_type(1),
            KeyCode::Char(' ') | KeyCode::Enter => app.toggle_picker_material(),
            _ => {}
        },
        EntryField::QuickAdd => match key.code {
            KeyCode::Up => app.move_picker_type(-1),
            KeyCode::Down => app.move_picker_type(1),
            KeyCode::Enter => app.quick_add(),
            _ => {
                if edit_input(app, key) {
                    app.sync_entry_input();
                }
            }
        },
        EntryField::Images => {
            if key.code == KeyCode::Enter {
                app.add_entry_image();
            } else {
                edit_input(app, key);
            }
        }
        EntryField::Title | EntryField::Memo => match key.code {
            KeyCode::Enter => app.cycle_entry_field(1),
            _ => {
                if edit_input(app, key) {
                    app.sync_entry_input();
                }
            }
        },
    }
}

fn handle_material_editor_key<S: Store>(app: &mut App<S>, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return app.cancel_material(),
        KeyCode::Char('s') if ctrl => return app.save_material(),
        KeyCode::Tab => return app.cycle_material_field(1),
        KeyCode::BackTab => return app.cycle_material_field(-1),
        _ => {}
    }

    match app.material_field {
        MaterialField::Type => match key.code {
            KeyCode::Left | KeyCode::Char('h') => cycle_material_type(app, -1),
            KeyCode::Right | KeyCode::Char('l') => cycle_material_type(app, 1),
            _ => {}
        },
        MaterialField::Images => {
            if key.code == KeyCode::Enter {
                app.add_material_image();
            } else {
                edit_input(app, key);
            }
        }
        MaterialField::Name | MaterialField::Brand | MaterialField::Memo => match key.code {
            KeyCode::Enter => app.cycle_material_field(1),
            _ => {
                if edit_input(app, key) {
                    app.sync_material_input();
                }
            }
        },
    }
}

fn cycle_material_type<S: Store>(app: &mut App<S>, delta: isize) {
    if let Some(editor) = app.journal.material_editor_mut() {
        editor.cycle_type(delta);
    }
}
