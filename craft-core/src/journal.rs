//! Journal - the single owner of application state.
//!
//! A `Journal` holds the active mode's entries and materials, the account
//! list, and all transient UI state (view selector, open editors, search
//! filter, collapsed sections, auth form). Every mutation of persisted data
//! is written through to the [`Store`] before the operation returns.

use crate::auth::{Accounts, AuthError};
use crate::editor::{is_placeholder_title, EntryEditor, MaterialEditor};
use crate::insight::{analyze_or_fallback, Analyzer};
use crate::mode::CraftMode;
use crate::model::{CraftEntry, EntryDraft, Material, MaterialDraft, UserAccount, ValidationError};
use crate::store::{
    entries_key, load_list, load_text, materials_key, save_list, Store, StoreError,
    CURRENT_MODE_KEY, CURRENT_USER_KEY, USERS_KEY,
};
use crate::views::{self, SearchFilter, StageFilter};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("No record with id '{0}'")]
    NotFound(String),
}

/// The five top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Inspirations,
    Materials,
    Search,
    Profile,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Home,
        View::Inspirations,
        View::Materials,
        View::Search,
        View::Profile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            View::Home => "主页",
            View::Inspirations => "灵感",
            View::Materials => "材料",
            View::Search => "搜索",
            View::Profile => "我的",
        }
    }
}

/// Collapsible sections of the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Recent,
    InProgress,
    Portfolio,
    Discarded,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Recent,
        Section::InProgress,
        Section::Portfolio,
        Section::Discarded,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Recent => "最近记录",
            Section::InProgress => "进行中",
            Section::Portfolio => "作品集",
            Section::Discarded => "已放弃",
        }
    }
}

/// Whether the auth form registers a new account or logs into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Fields of the login/register form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// The craft journal application state.
pub struct Journal<S: Store> {
    store: S,
    analyzer: Box<dyn Analyzer>,
    mode: CraftMode,
    view: View,
    entries: Vec<CraftEntry>,
    materials: Vec<Material>,
    accounts: Accounts,
    entry_editor: Option<EntryEditor>,
    material_editor: Option<MaterialEditor>,
    search: SearchFilter,
    collapsed: BTreeSet<Section>,
    collapsed_types: BTreeSet<String>,
    pub auth_form: AuthForm,
    auth_error: Option<String>,
}

impl<S: Store> Journal<S> {
    /// Restore the journal from a store.
    ///
    /// The stored mode is used if present and recognized, otherwise pottery.
    pub fn open(store: S, analyzer: Box<dyn Analyzer>) -> Result<Self, JournalError> {
        let mode = match load_text(&store, CURRENT_MODE_KEY)? {
            Some(text) => text.parse::<CraftMode>().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring stored craft mode");
                CraftMode::default()
            }),
            None => CraftMode::default(),
        };
        let users: Vec<UserAccount> = load_list(&store, USERS_KEY)?;
        let current = load_text(&store, CURRENT_USER_KEY)?;
        let entries = load_list(&store, &entries_key(mode))?;
        let materials = load_list(&store, &materials_key(mode))?;
        debug!(
            mode = mode.slug(),
            entries = entries.len(),
            materials = materials.len(),
            users = users.len(),
            "journal opened"
        );

        Ok(Self {
            store,
            analyzer,
            mode,
            view: View::default(),
            entries,
            materials,
            accounts: Accounts::new(users, current),
            entry_editor: None,
            material_editor: None,
            search: SearchFilter::default(),
            collapsed: BTreeSet::from([Section::Discarded]),
            collapsed_types: BTreeSet::new(),
            auth_form: AuthForm::default(),
            auth_error: None,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the journal, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn mode(&self) -> CraftMode {
        self.mode
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// All entries of the active mode, newest first.
    pub fn entries(&self) -> &[CraftEntry] {
        &self.entries
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn entry(&self, id: &str) -> Option<&CraftEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn users(&self) -> &[UserAccount] {
        self.accounts.users()
    }

    pub fn current_user(&self) -> Option<&UserAccount> {
        self.accounts.current()
    }

    pub fn entry_editor(&self) -> Option<&EntryEditor> {
        self.entry_editor.as_ref()
    }

    pub fn entry_editor_mut(&mut self) -> Option<&mut EntryEditor> {
        self.entry_editor.as_mut()
    }

    pub fn material_editor(&self) -> Option<&MaterialEditor> {
        self.material_editor.as_ref()
    }

    pub fn material_editor_mut(&mut self) -> Option<&mut MaterialEditor> {
        self.material_editor.as_mut()
    }

    /// Whether confirming the open entry editor will call the analyzer.
    pub fn confirm_will_analyze(&self) -> bool {
        self.entry_editor
            .as_ref()
            .is_some_and(|e| e.editing().is_none() && !e.images().is_empty())
    }

    pub fn search_filter(&self) -> &SearchFilter {
        &self.search
    }

    pub fn auth_error(&self) -> Option<&str> {
        self.auth_error.as_deref()
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    pub fn recent(&self) -> Vec<&CraftEntry> {
        views::recent(&self.entries, self.mode)
    }

    pub fn in_progress(&self) -> Vec<&CraftEntry> {
        views::in_progress(&self.entries, self.mode)
    }

    pub fn portfolio(&self) -> Vec<&CraftEntry> {
        views::portfolio(&self.entries, self.mode)
    }

    pub fn inspirations(&self) -> Vec<&CraftEntry> {
        views::inspirations(&self.entries, self.mode)
    }

    pub fn discarded(&self) -> Vec<&CraftEntry> {
        views::discarded(&self.entries, self.mode)
    }

    /// Entries of a home section.
    pub fn section(&self, section: Section) -> Vec<&CraftEntry> {
        match section {
            Section::Recent => self.recent(),
            Section::InProgress => self.in_progress(),
            Section::Portfolio => self.portfolio(),
            Section::Discarded => self.discarded(),
        }
    }

    pub fn search_results(&self) -> Vec<&CraftEntry> {
        views::search(&self.entries, &self.search)
    }

    pub fn materials_of_type(&self, type_id: &str) -> Vec<&Material> {
        views::materials_of_type(&self.materials, type_id)
    }

    // =========================================================================
    // Navigation and transient UI state
    // =========================================================================

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn is_expanded(&self, section: Section) -> bool {
        !self.collapsed.contains(&section)
    }

    pub fn toggle_section(&mut self, section: Section) {
        if !self.collapsed.remove(&section) {
            self.collapsed.insert(section);
        }
    }

    pub fn is_material_section_expanded(&self, type_id: &str) -> bool {
        !self.collapsed_types.contains(type_id)
    }

    pub fn toggle_material_section(&mut self, type_id: &str) {
        if !self.collapsed_types.remove(type_id) {
            self.collapsed_types.insert(type_id.to_string());
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search.query = query.into();
    }

    pub fn set_stage_filter(&mut self, filter: StageFilter) {
        self.search.stage = filter;
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Open the entry editor for a new entry.
    pub fn begin_entry(&mut self, image: Option<String>) {
        self.entry_editor = Some(EntryEditor::new(self.mode, image));
    }

    /// Open the entry editor on an existing entry.
    pub fn edit_entry(&mut self, id: &str) -> Result<(), JournalError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        self.entry_editor = Some(EntryEditor::edit(self.mode, entry));
        Ok(())
    }

    pub fn cancel_entry(&mut self) {
        self.entry_editor = None;
    }

    /// Create or update an entry from a draft.
    ///
    /// The target is the entry open in the editor, if any; otherwise a new
    /// entry is prepended. A new entry with at least one image is analyzed
    /// first: a placeholder title is replaced by the suggested title and the
    /// insight text is attached. Analysis failures degrade to the fallback
    /// pair and never fail the save. Closes the entry editor on success.
    ///
    /// The updated list is written before it replaces the in-memory one, so a
    /// failed write leaves the journal and the open editor unchanged.
    pub async fn save_entry(&mut self, draft: EntryDraft) -> Result<&CraftEntry, JournalError> {
        let mut draft = draft.validate(self.mode)?;
        let editing = self
            .entry_editor
            .as_ref()
            .and_then(|e| e.editing())
            .map(str::to_string);

        let mut entries = self.entries.clone();
        let index = match editing {
            Some(id) => {
                let index = entries
                    .iter()
                    .position(|e| e.id == id)
                    .ok_or(JournalError::NotFound(id))?;
                entries[index].apply(draft);
                debug!(id = %entries[index].id, stage = %entries[index].stage, "entry updated");
                index
            }
            None => {
                if let Some(image) = draft.images.first() {
                    let insight =
                        analyze_or_fallback(self.analyzer.as_ref(), self.mode, image, &draft.stage)
                            .await;
                    if is_placeholder_title(&draft.title) {
                        draft.title = insight.title;
                    }
                    draft.ai_insights = Some(insight.insight);
                }

                let entry = CraftEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    title: draft.title,
                    images: draft.images,
                    stage: draft.stage,
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    memo: Some(draft.memo),
                    material_details: Some(draft.material_details),
                    ai_insights: draft.ai_insights,
                };
                info!(id = %entry.id, stage = %entry.stage, mode = self.mode.slug(), "entry created");
                entries.insert(0, entry);
                0
            }
        };

        save_list(&mut self.store, &entries_key(self.mode), &entries)?;
        self.entries = entries;
        self.entry_editor = None;
        Ok(&self.entries[index])
    }

    /// Save the open entry editor with its selected stage.
    pub async fn confirm_entry(&mut self) -> Result<Option<&CraftEntry>, JournalError> {
        let Some(draft) = self.entry_editor.as_ref().map(EntryEditor::confirm) else {
            return Ok(None);
        };
        self.save_entry(draft).await.map(Some)
    }

    /// Save the open entry editor forced to the discarded stage.
    pub async fn discard_entry(&mut self) -> Result<Option<&CraftEntry>, JournalError> {
        let Some(draft) = self.entry_editor.as_ref().map(EntryEditor::discard) else {
            return Ok(None);
        };
        self.save_entry(draft).await.map(Some)
    }

    // =========================================================================
    // Materials
    // =========================================================================

    /// Create a material inline. A blank name is ignored and returns `None`.
    pub fn quick_add_material(
        &mut self,
        type_id: &str,
        name: &str,
        brand: &str,
    ) -> Result<Option<Material>, JournalError> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        let draft = MaterialDraft {
            name: name.to_string(),
            brand: brand.to_string(),
            type_id: type_id.to_string(),
            ..Default::default()
        }
        .validate(self.mode)?;

        let material = draft.into_material(uuid::Uuid::new_v4().to_string());
        let mut materials = self.materials.clone();
        materials.insert(0, material.clone());
        save_list(&mut self.store, &materials_key(self.mode), &materials)?;
        info!(id = %material.id, type_id = %material.type_id, "material quick-added");
        self.materials = materials;
        Ok(Some(material))
    }

    /// Quick-add from the open entry editor's inputs for a type and select the result.
    pub fn editor_quick_add(&mut self, type_id: &str) -> Result<Option<Material>, JournalError> {
        let Some(input) = self
            .entry_editor
            .as_ref()
            .and_then(|e| e.quick_add_input(type_id))
            .cloned()
        else {
            return Ok(None);
        };
        let Some(material) = self.quick_add_material(type_id, &input.name, &input.brand)? else {
            return Ok(None);
        };
        if let Some(editor) = self.entry_editor.as_mut() {
            editor.take_quick_add(type_id);
            editor.select_material(&material.type_id, material.clone());
        }
        Ok(Some(material))
    }

    pub fn begin_material(&mut self) {
        self.material_editor = Some(MaterialEditor::new(self.mode));
    }

    pub fn edit_material(&mut self, id: &str) -> Result<(), JournalError> {
        let material = self
            .material(id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        self.material_editor = Some(MaterialEditor::edit(self.mode, material));
        Ok(())
    }

    pub fn cancel_material(&mut self) {
        self.material_editor = None;
    }

    /// Create or update a material from a draft.
    ///
    /// Entries that embedded the material keep their snapshot.
    pub fn save_material(&mut self, draft: MaterialDraft) -> Result<&Material, JournalError> {
        let draft = draft.validate(self.mode)?;
        let editing = self
            .material_editor
            .as_ref()
            .and_then(|e| e.editing())
            .map(str::to_string);

        let mut materials = self.materials.clone();
        let index = match editing {
            Some(id) => {
                let index = materials
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or(JournalError::NotFound(id.clone()))?;
                materials[index] = draft.into_material(id);
                debug!(id = %materials[index].id, "material updated");
                index
            }
            None => {
                let material = draft.into_material(uuid::Uuid::new_v4().to_string());
                info!(id = %material.id, type_id = %material.type_id, "material created");
                materials.insert(0, material);
                0
            }
        };

        save_list(&mut self.store, &materials_key(self.mode), &materials)?;
        self.materials = materials;
        self.material_editor = None;
        Ok(&self.materials[index])
    }

    /// Save the open material editor. Does nothing while the name is blank.
    pub fn confirm_material(&mut self) -> Result<Option<&Material>, JournalError> {
        let Some(draft) = self.material_editor.as_ref().and_then(MaterialEditor::confirm) else {
            return Ok(None);
        };
        self.save_material(draft).map(Some)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register and log in a new account, then show the profile view.
    pub fn register_user(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&UserAccount, JournalError> {
        let mut accounts = self.accounts.clone();
        if let Err(e) = accounts.register(name, email, password).map(|_| ()) {
            return Err(self.auth_failed(e));
        }
        save_list(&mut self.store, USERS_KEY, accounts.users())?;
        self.persist_current_user(&accounts)?;
        self.accounts = accounts;
        self.auth_error = None;
        self.auth_form = AuthForm::default();
        self.view = View::Profile;
        self.current_user()
            .ok_or(JournalError::Auth(AuthError::InvalidCredentials))
    }

    pub fn login_user(&mut self, email: &str, password: &str) -> Result<&UserAccount, JournalError> {
        let mut accounts = self.accounts.clone();
        if let Err(e) = accounts.login(email, password).map(|_| ()) {
            return Err(self.auth_failed(e));
        }
        self.persist_current_user(&accounts)?;
        self.accounts = accounts;
        self.auth_error = None;
        self.auth_form = AuthForm::default();
        self.view = View::Profile;
        if let Some(user) = self.accounts.current() {
            info!(user_id = %user.id, "logged in");
        }
        self.current_user()
            .ok_or(JournalError::Auth(AuthError::InvalidCredentials))
    }

    pub fn logout_user(&mut self) -> Result<(), JournalError> {
        let mut accounts = self.accounts.clone();
        accounts.logout();
        self.persist_current_user(&accounts)?;
        self.accounts = accounts;
        Ok(())
    }

    /// Submit the auth form in its current mode.
    pub fn submit_auth(&mut self) -> Result<&UserAccount, JournalError> {
        let form = self.auth_form.clone();
        match form.mode {
            AuthMode::Login => self.login_user(&form.email, &form.password),
            AuthMode::Register => self.register_user(&form.name, &form.email, &form.password),
        }
    }

    /// Fill the login form with a known account's email.
    pub fn prefill_login(&mut self, user_id: &str) -> Result<(), JournalError> {
        let email = self
            .accounts
            .find(user_id)
            .map(|u| u.email.clone())
            .ok_or_else(|| JournalError::NotFound(user_id.to_string()))?;
        self.auth_form = AuthForm {
            mode: AuthMode::Login,
            email,
            ..Default::default()
        };
        self.auth_error = None;
        Ok(())
    }

    fn auth_failed(&mut self, e: AuthError) -> JournalError {
        self.auth_error = Some(e.to_string());
        JournalError::Auth(e)
    }

    // =========================================================================
    // Modes
    // =========================================================================

    /// Switch the active craft mode, reloading that mode's data.
    ///
    /// Open editors are closed and the stage filter resets, since stage
    /// values and material types differ between modes. The stored mode
    /// pointer only moves once the new mode's lists have loaded.
    pub fn switch_mode(&mut self, mode: CraftMode) -> Result<(), JournalError> {
        let entries = load_list(&self.store, &entries_key(mode))?;
        let materials = load_list(&self.store, &materials_key(mode))?;
        self.store.save(CURRENT_MODE_KEY, mode.slug().as_bytes())?;
        self.entries = entries;
        self.materials = materials;
        self.mode = mode;
        self.collapsed_types.clear();
        self.entry_editor = None;
        self.material_editor = None;
        self.search.stage = StageFilter::All;
        debug!(
            mode = mode.slug(),
            entries = self.entries.len(),
            materials = self.materials.len(),
            "switched craft mode"
        );
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn persist_current_user(&mut self, accounts: &Accounts) -> Result<(), JournalError> {
        match accounts.current_id() {
            Some(id) => self.store.save(CURRENT_USER_KEY, id.as_bytes())?,
            None => self.store.remove(CURRENT_USER_KEY)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::OfflineAnalyzer;
    use crate::store::MemoryStore;

    fn journal() -> Journal<MemoryStore> {
        Journal::open(MemoryStore::new(), Box::new(OfflineAnalyzer)).unwrap()
    }

    #[test]
    fn test_open_defaults() {
        let journal = journal();
        assert_eq!(journal.mode(), CraftMode::Pottery);
        assert_eq!(journal.view(), View::Home);
        assert!(journal.is_expanded(Section::Recent));
        assert!(!journal.is_expanded(Section::Discarded));
        assert!(journal.current_user().is_none());
    }

    #[test]
    fn test_open_ignores_unknown_stored_mode() {
        let mut store = MemoryStore::new();
        store.save(CURRENT_MODE_KEY, b"origami").unwrap();
        let journal = Journal::open(store, Box::new(OfflineAnalyzer)).unwrap();
        assert_eq!(journal.mode(), CraftMode::Pottery);
    }

    #[test]
    fn test_toggle_sections() {
        let mut journal = journal();
        journal.toggle_section(Section::Discarded);
        assert!(journal.is_expanded(Section::Discarded));
        journal.toggle_section(Section::Recent);
        assert!(!journal.is_expanded(Section::Recent));

        journal.toggle_material_section("clay");
        assert!(!journal.is_material_section_expanded("clay"));
        journal.switch_mode(CraftMode::Pottery).unwrap();
        assert!(journal.is_material_section_expanded("clay"));
    }

    #[tokio::test]
    async fn test_entry_without_image_skips_analysis() {
        let mut journal = journal();
        journal.begin_entry(None);
        let entry = journal.confirm_entry().await.unwrap().unwrap();
        assert_eq!(entry.title, "未命名灵感");
        assert!(entry.ai_insights.is_none());
        assert!(journal.entry_editor().is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_editor_is_noop() {
        let mut journal = journal();
        assert!(journal.confirm_entry().await.unwrap().is_none());
        assert!(journal.discard_entry().await.unwrap().is_none());
        assert!(journal.confirm_material().unwrap().is_none());
        assert!(journal.entries().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_stage_keeps_editor_open() {
        let mut journal = journal();
        journal.begin_entry(None);
        let draft = EntryDraft {
            stage: "编织中".to_string(),
            ..Default::default()
        };
        let err = journal.save_entry(draft).await.unwrap_err();
        assert!(matches!(err, JournalError::Validation(_)));
        assert!(journal.entry_editor().is_some());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_edit_unknown_ids() {
        let mut journal = journal();
        assert!(matches!(
            journal.edit_entry("nope"),
            Err(JournalError::NotFound(_))
        ));
        assert!(matches!(
            journal.edit_material("nope"),
            Err(JournalError::NotFound(_))
        ));
        assert!(matches!(
            journal.prefill_login("nope"),
            Err(JournalError::NotFound(_))
        ));
    }

    #[test]
    fn test_auth_error_is_mirrored_inline() {
        let mut journal = journal();
        journal.auth_form.mode = AuthMode::Register;
        journal.auth_form.name = "Ann".to_string();
        assert!(journal.submit_auth().is_err());
        assert_eq!(journal.auth_error(), Some("请填写完整信息"));

        journal.auth_form.email = "ann@x.io".to_string();
        journal.auth_form.password = "pw".to_string();
        let user = journal.submit_auth().unwrap();
        assert_eq!(user.name, "Ann");
        assert!(journal.auth_error().is_none());
        assert_eq!(journal.view(), View::Profile);
        assert_eq!(journal.auth_form, AuthForm::default());
    }

    #[test]
    fn test_prefill_login() {
        let mut journal = journal();
        let id = journal.register_user("Ann", "ann@x.io", "pw").unwrap().id.clone();
        journal.logout_user().unwrap();
        journal.prefill_login(&id).unwrap();
        assert_eq!(journal.auth_form.mode, AuthMode::Login);
        assert_eq!(journal.auth_form.email, "ann@x.io");
        assert!(journal.auth_form.password.is_empty());
    }

    #[test]
    fn test_login_shows_profile() {
        let mut journal = journal();
        journal.register_user("Ann", "ann@x.io", "pw").unwrap();
        journal.logout_user().unwrap();
        journal.set_view(View::Materials);

        journal.login_user("ann@x.io", "pw").unwrap();
        assert_eq!(journal.view(), View::Profile);

        journal.set_view(View::Home);
        assert!(journal.login_user("ann@x.io", "wrong").is_err());
        assert_eq!(journal.view(), View::Home);
    }

    #[test]
    fn test_confirm_will_analyze() {
        let mut journal = journal();
        assert!(!journal.confirm_will_analyze());
        journal.begin_entry(None);
        assert!(!journal.confirm_will_analyze());
        journal.begin_entry(Some("data:image/png;base64,AA".to_string()));
        assert!(journal.confirm_will_analyze());
    }
}
