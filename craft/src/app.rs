//! Application state for the craft TUI

use craft_core::image::encode_file;
use craft_core::journal::{AuthMode, Section, View};
use craft_core::mode::MaterialTypeDef;
use craft_core::store::{FileStore, Store};
use craft_core::{CraftMode, Journal, Material};

use crate::ui::theme::CraftTheme;
use crate::ui::Overlay;

/// Input mode for the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the search query
    Search,
    /// Typing into the login/register form
    Auth,
}

/// Focusable fields of the entry editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryField {
    #[default]
    Title,
    Stage,
    Images,
    Memo,
    Materials,
    QuickAdd,
}

/// Focusable fields of the material editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialField {
    #[default]
    Name,
    Brand,
    Type,
    Memo,
    Images,
}

/// Focusable fields of the auth form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    Name,
    #[default]
    Email,
    Password,
}

/// Work that must be awaited outside the event handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    ConfirmEntry,
    DiscardEntry,
}

/// One selectable line of the main view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Section(Section),
    Entry(String),
    MaterialType(&'static str),
    Material(String),
    User(String),
}

/// A single-line text buffer with a character cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the contents and put the cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = self.byte_index(self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

/// Split a quick-add line of the form `name|brand`.
pub fn split_quick_add(line: &str) -> (&str, &str) {
    match line.split_once('|') {
        Some((name, brand)) => (name.trim(), brand.trim()),
        None => (line.trim(), ""),
    }
}

/// Main application state
pub struct App<S: Store = FileStore> {
    /// The journal being browsed and edited
    pub journal: Journal<S>,
    pub theme: CraftTheme,
    pub input_mode: InputMode,
    overlay: Option<Overlay>,
    /// Line input shared by whichever text field has focus
    pub input: TextInput,
    /// Selected row in the main view
    pub selected: usize,
    pub entry_field: EntryField,
    pub material_field: MaterialField,
    pub auth_field: AuthField,
    /// Focused material type in the entry editor's pickers
    pub picker_type: usize,
    /// Focused material within that type
    pub picker_item: usize,
    status_message: Option<String>,
    pub pending: Option<PendingAction>,
    /// Set while an analysis is awaited so the blocking overlay is drawn
    pub analyzing: bool,
    /// Whether a real analyzer is configured
    pub online: bool,
}

impl<S: Store> App<S> {
    pub fn new(journal: Journal<S>) -> Self {
        Self {
            journal,
            theme: CraftTheme::default(),
            input_mode: InputMode::Normal,
            overlay: None,
            input: TextInput::default(),
            selected: 0,
            entry_field: EntryField::Title,
            material_field: MaterialField::Name,
            auth_field: AuthField::Email,
            picker_type: 0,
            picker_item: 0,
            status_message: None,
            pending: None,
            analyzing: false,
            online: true,
        }
    }

    pub fn mode(&self) -> CraftMode {
        self.journal.mode()
    }

    // =========================================================================
    // Status and overlays
    // =========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
        self.input.clear();
    }

    pub fn toggle_help(&mut self) {
        self.overlay = match self.overlay {
            Some(Overlay::Help) => None,
            _ => Some(Overlay::Help),
        };
    }

    pub fn open_mode_menu(&mut self) {
        let selected = CraftMode::ALL
            .iter()
            .position(|m| *m == self.mode())
            .unwrap_or(0);
        self.overlay = Some(Overlay::ModeMenu { selected });
    }

    pub fn move_mode_menu(&mut self, delta: isize) {
        if let Some(Overlay::ModeMenu { selected }) = self.overlay.as_mut() {
            let len = CraftMode::ALL.len() as isize;
            *selected = (*selected as isize + delta).rem_euclid(len) as usize;
        }
    }

    /// Switch to the mode highlighted in the mode menu.
    pub fn confirm_mode_menu(&mut self) {
        let Some(Overlay::ModeMenu { selected }) = self.overlay else {
            return;
        };
        let mode = CraftMode::ALL[selected];
        self.overlay = None;
        match self.journal.switch_mode(mode) {
            Ok(()) => {
                self.selected = 0;
                self.picker_type = 0;
                self.picker_item = 0;
                self.set_status(format!("Switched to {}", mode.label()));
            }
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    // =========================================================================
    // Main view navigation
    // =========================================================================

    pub fn set_view(&mut self, view: View) {
        self.journal.set_view(view);
        self.input_mode = InputMode::Normal;
        self.selected = 0;
    }

    /// The selectable rows of the current view, top to bottom.
    pub fn rows(&self) -> Vec<Row> {
        let journal = &self.journal;
        let mut rows = Vec::new();
        match journal.view() {
            View::Home => {
                for section in Section::ALL {
                    let entries = journal.section(section);
                    if section == Section::Discarded && entries.is_empty() {
                        continue;
                    }
                    rows.push(Row::Section(section));
                    if journal.is_expanded(section) {
                        rows.extend(entries.iter().map(|e| Row::Entry(e.id.clone())));
                    }
                }
            }
            View::Inspirations => {
                rows.extend(
                    journal
                        .inspirations()
                        .iter()
                        .map(|e| Row::Entry(e.id.clone())),
                );
            }
            View::Materials => {
                for def in self.mode().config().material_types {
                    rows.push(Row::MaterialType(def.id));
                    if journal.is_material_section_expanded(def.id) {
                        rows.extend(
                            journal
                                .materials_of_type(def.id)
                                .iter()
                                .map(|m| Row::Material(m.id.clone())),
                        );
                    }
                }
            }
            View::Search => {
                rows.extend(
                    journal
                        .search_results()
                        .iter()
                        .map(|e| Row::Entry(e.id.clone())),
                );
            }
            View::Profile => {
                rows.extend(journal.users().iter().map(|u| Row::User(u.id.clone())));
            }
        }
        rows
    }

    pub fn selected_row(&self) -> Option<Row> {
        self.rows().into_iter().nth(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection inside the current rows after they change.
    pub fn clamp_selection(&mut self) {
        let len = self.rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Open the selected row: edit an entry or material, toggle a section,
    /// or prefill the login form from a local account.
    pub fn activate_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match row {
            Row::Section(_) | Row::MaterialType(_) => self.toggle_selected_section(),
            Row::Entry(id) => match self.journal.edit_entry(&id) {
                Ok(()) => self.open_entry_editor(),
                Err(e) => self.set_status(format!("Error: {e}")),
            },
            Row::Material(id) => match self.journal.edit_material(&id) {
                Ok(()) => self.open_material_editor(),
                Err(e) => self.set_status(format!("Error: {e}")),
            },
            Row::User(id) => {
                if self.journal.current_user().is_some() {
                    self.set_status("Log out first to switch accounts");
                    return;
                }
                match self.journal.prefill_login(&id) {
                    Ok(()) => {
                        self.input_mode = InputMode::Auth;
                        self.focus_auth_field(AuthField::Password);
                    }
                    Err(e) => self.set_status(format!("Error: {e}")),
                }
            }
        }
    }

    pub fn toggle_selected_section(&mut self) {
        match self.selected_row() {
            Some(Row::Section(section)) => self.journal.toggle_section(section),
            Some(Row::MaterialType(type_id)) => self.journal.toggle_material_section(type_id),
            _ => return,
        }
        self.clamp_selection();
    }

    // =========================================================================
    // Search
    // =========================================================================

    pub fn begin_search(&mut self) {
        self.journal.set_view(View::Search);
        self.input_mode = InputMode::Search;
        self.input.set(self.journal.search_filter().query.clone());
        self.selected = 0;
    }

    pub fn cycle_stage_filter(&mut self) {
        let next = self.journal.search_filter().stage.cycle(self.mode());
        self.set_status(format!("Stage filter: {}", next.label()));
        self.journal.set_stage_filter(next);
        self.clamp_selection();
    }

    // =========================================================================
    // Auth form
    // =========================================================================

    /// The auth fields shown for the form's current mode.
    pub fn auth_fields(&self) -> &'static [AuthField] {
        match self.journal.auth_form.mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::Register => &[AuthField::Name, AuthField::Email, AuthField::Password],
        }
    }

    pub fn begin_auth(&mut self) {
        self.input_mode = InputMode::Auth;
        let first = self.auth_fields()[0];
        self.focus_auth_field(first);
    }

    pub fn toggle_auth_mode(&mut self) {
        let form = &mut self.journal.auth_form;
        form.mode = match form.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        if !self.auth_fields().contains(&self.auth_field) {
            self.auth_field = AuthField::Email;
        }
    }

    pub fn focus_auth_field(&mut self, field: AuthField) {
        self.auth_field = field;
        let form = &self.journal.auth_form;
        let value = match field {
            AuthField::Name => form.name.clone(),
            AuthField::Email => form.email.clone(),
            AuthField::Password => form.password.clone(),
        };
        self.input.set(value);
    }

    pub fn cycle_auth_field(&mut self, delta: isize) {
        let fields = self.auth_fields();
        let current = fields.iter().position(|f| *f == self.auth_field).unwrap_or(0) as isize;
        let next = fields[(current + delta).rem_euclid(fields.len() as isize) as usize];
        self.focus_auth_field(next);
    }

    pub fn submit_auth(&mut self) {
        let message = match self.journal.submit_auth() {
            Ok(user) => format!("Logged in as {}", user.name),
            Err(e) => format!("Error: {e}"),
        };
        if self.journal.current_user().is_some() {
            self.input_mode = InputMode::Normal;
            self.input.clear();
        }
        self.set_status(message);
    }

    pub fn logout(&mut self) {
        match self.journal.logout_user() {
            Ok(()) => self.set_status("Logged out"),
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    // =========================================================================
    // Entry editor
    // =========================================================================

    /// Ask for an image path before opening a new entry.
    pub fn open_image_prompt(&mut self) {
        self.input.clear();
        self.overlay = Some(Overlay::ImagePrompt);
    }

    /// Open the entry editor with the image at the prompted path, if any.
    pub fn confirm_image_prompt(&mut self) {
        let path = self.input.text().trim().to_string();
        let image = if path.is_empty() {
            None
        } else {
            match encode_file(&path) {
                Ok(uri) => Some(uri),
                Err(e) => {
                    self.set_status(format!("Error: {e}"));
                    return;
                }
            }
        };
        self.journal.begin_entry(image);
        self.open_entry_editor();
    }

    fn open_entry_editor(&mut self) {
        self.overlay = Some(Overlay::EntryEditor);
        self.picker_type = 0;
        self.picker_item = 0;
        self.focus_entry_field(EntryField::Title);
    }

    /// Fields of the entry editor in tab order.
    pub fn entry_fields(&self) -> Vec<EntryField> {
        let mut fields = vec![
            EntryField::Title,
            EntryField::Stage,
            EntryField::Images,
            EntryField::Memo,
        ];
        if self
            .journal
            .entry_editor()
            .is_some_and(|e| e.shows_materials())
        {
            fields.extend([EntryField::Materials, EntryField::QuickAdd]);
        }
        fields
    }

    pub fn focus_entry_field(&mut self, field: EntryField) {
        self.entry_field = field;
        let value = match (field, self.journal.entry_editor()) {
            (EntryField::Title, Some(editor)) => editor.title().to_string(),
            (EntryField::Memo, Some(editor)) => editor.memo().to_string(),
            (EntryField::QuickAdd, Some(editor)) => editor
                .quick_add_input(self.picker_type_id())
                .map(|q| {
                    if q.brand.is_empty() {
                        q.name.clone()
                    } else {
                        format!("{}|{}", q.name, q.brand)
                    }
                })
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.input.set(value);
    }

    pub fn cycle_entry_field(&mut self, delta: isize) {
        let fields = self.entry_fields();
        let current = fields
            .iter()
            .position(|f| *f == self.entry_field)
            .unwrap_or(0) as isize;
        let next = fields[(current + delta).rem_euclid(fields.len() as isize) as usize];
        self.focus_entry_field(next);
    }

    /// Write the line input back into the focused entry field.
    pub fn sync_entry_input(&mut self) {
        let type_id = self.picker_type_id();
        let text = self.input.text().to_string();
        let Some(editor) = self.journal.entry_editor_mut() else {
            return;
        };
        match self.entry_field {
            EntryField::Title => editor.set_title(text),
            EntryField::Memo => editor.set_memo(text),
            EntryField::QuickAdd => {
                let (name, brand) = split_quick_add(&text);
                editor.set_quick_add(type_id, name, brand);
            }
            EntryField::Stage | EntryField::Images | EntryField::Materials => {}
        }
    }

    pub fn cycle_entry_stage(&mut self, delta: isize) {
        if let Some(editor) = self.journal.entry_editor_mut() {
            editor.cycle_stage(delta);
        }
        // Materials may have just been hidden
        if !self.entry_fields().contains(&self.entry_field) {
            self.focus_entry_field(EntryField::Stage);
        }
    }

    /// Append the image at the typed path to the open editor.
    pub fn add_entry_image(&mut self) {
        let path = self.input.text().trim().to_string();
        if path.is_empty() {
            return;
        }
        match encode_file(&path) {
            Ok(uri) => {
                if let Some(editor) = self.journal.entry_editor_mut() {
                    editor.add_image(uri);
                }
                self.input.clear();
                self.set_status(format!("Added {path}"));
            }
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    pub fn material_types(&self) -> &'static [MaterialTypeDef] {
        self.mode().config().material_types
    }

    pub fn picker_type_id(&self) -> &'static str {
        let types = self.material_types();
        types[self.picker_type.min(types.len() - 1)].id
    }

    pub fn move_picker_type(&mut self, delta: isize) {
        let len = self.material_types().len() as isize;
        self.picker_type = (self.picker_type as isize + delta).rem_euclid(len) as usize;
        self.picker_item = 0;
        if self.entry_field == EntryField::QuickAdd {
            self.focus_entry_field(EntryField::QuickAdd);
        }
    }

    pub fn move_picker_item(&mut self, delta: isize) {
        let len = self.journal.materials_of_type(self.picker_type_id()).len() as isize;
        if len > 0 {
            self.picker_item = (self.picker_item as isize + delta).rem_euclid(len) as usize;
        }
    }

    /// The material under the picker cursor.
    pub fn picker_material(&self) -> Option<Material> {
        self.journal
            .materials_of_type(self.picker_type_id())
            .get(self.picker_item)
            .map(|m| (*m).clone())
    }

    pub fn toggle_picker_material(&mut self) {
        let type_id = self.picker_type_id();
        let Some(material) = self.picker_material() else {
            return;
        };
        if let Some(editor) = self.journal.entry_editor_mut() {
            editor.toggle_material(type_id, &material);
        }
    }

    /// Create a material from the quick-add line and select it.
    pub fn quick_add(&mut self) {
        self.sync_entry_input();
        match self.journal.editor_quick_add(self.picker_type_id()) {
            Ok(Some(material)) => {
                self.input.clear();
                self.set_status(format!("Added {}", material.name));
            }
            Ok(None) => self.set_status("Enter a name as name|brand"),
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    pub fn cancel_entry(&mut self) {
        self.journal.cancel_entry();
        self.close_overlay();
    }

    /// Run a queued save, closing the editor on success.
    pub async fn run_pending(&mut self, action: PendingAction) {
        let result = match action {
            PendingAction::ConfirmEntry => self.journal.confirm_entry().await,
            PendingAction::DiscardEntry => self.journal.discard_entry().await,
        };
        let outcome = match result {
            Ok(entry) => Ok(entry.map(|e| e.title.clone())),
            Err(e) => Err(e.to_string()),
        };
        match outcome {
            Ok(title) => {
                self.close_overlay();
                self.clamp_selection();
                if let Some(title) = title {
                    let verb = match action {
                        PendingAction::ConfirmEntry => "Saved",
                        PendingAction::DiscardEntry => "Discarded",
                    };
                    self.set_status(format!("{verb} {title}"));
                }
            }
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    // =========================================================================
    // Material editor
    // =========================================================================

    pub fn new_material(&mut self) {
        self.journal.begin_material();
        self.open_material_editor();
    }

    fn open_material_editor(&mut self) {
        self.overlay = Some(Overlay::MaterialEditor);
        self.focus_material_field(MaterialField::Name);
    }

    pub fn focus_material_field(&mut self, field: MaterialField) {
        self.material_field = field;
        let value = match (field, self.journal.material_editor()) {
            (MaterialField::Name, Some(editor)) => editor.name.clone(),
            (MaterialField::Brand, Some(editor)) => editor.brand.clone(),
            (MaterialField::Memo, Some(editor)) => editor.memo.clone(),
            _ => String::new(),
        };
        self.input.set(value);
    }

    pub fn cycle_material_field(&mut self, delta: isize) {
        const FIELDS: [MaterialField; 5] = [
            MaterialField::Name,
            MaterialField::Brand,
            MaterialField::Type,
            MaterialField::Memo,
            MaterialField::Images,
        ];
        let current = FIELDS
            .iter()
            .position(|f| *f == self.material_field)
            .unwrap_or(0) as isize;
        let next = FIELDS[(current + delta).rem_euclid(FIELDS.len() as isize) as usize];
        self.focus_material_field(next);
    }

    pub fn sync_material_input(&mut self) {
        let text = self.input.text().to_string();
        let Some(editor) = self.journal.material_editor_mut() else {
            return;
        };
        match self.material_field {
            MaterialField::Name => editor.name = text,
            MaterialField::Brand => editor.brand = text,
            MaterialField::Memo => editor.memo = text,
            MaterialField::Type | MaterialField::Images => {}
        }
    }

    pub fn add_material_image(&mut self) {
        let path = self.input.text().trim().to_string();
        if path.is_empty() {
            return;
        }
        match encode_file(&path) {
            Ok(uri) => {
                if let Some(editor) = self.journal.material_editor_mut() {
                    editor.add_image(uri);
                }
                self.input.clear();
                self.set_status(format!("Added {path}"));
            }
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    pub fn save_material(&mut self) {
        let outcome = match self.journal.confirm_material() {
            Ok(material) => Ok(material.map(|m| m.name.clone())),
            Err(e) => Err(e.to_string()),
        };
        match outcome {
            Ok(Some(name)) => {
                self.close_overlay();
                self.clamp_selection();
                self.set_status(format!("Saved {name}"));
            }
            Ok(None) => self.set_status("Name is required"),
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    pub fn cancel_material(&mut self) {
        self.journal.cancel_material();
        self.close_overlay();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_input_handles_multibyte() {
        let mut input = TextInput::default();
        for c in "陶艺".chars() {
            input.insert(c);
        }
        input.left();
        input.insert('x');
        assert_eq!(input.text(), "陶x艺");
        assert_eq!(input.cursor(), 2);

        input.backspace();
        input.backspace();
        assert_eq!(input.text(), "艺");
        input.backspace();
        assert_eq!(input.text(), "艺");
        input.end();
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn test_split_quick_add() {
        assert_eq!(split_quick_add("Tenmoku | Amaco"), ("Tenmoku", "Amaco"));
        assert_eq!(split_quick_add(" Porcelain "), ("Porcelain", ""));
        assert_eq!(split_quick_add("|brand"), ("", "brand"));
    }
}
