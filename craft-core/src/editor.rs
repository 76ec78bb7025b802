//! Form state for the entry and material editors.
//!
//! Editors only collect input and assemble drafts. Assigning ids, running
//! image analysis and persisting belong to [`crate::journal::Journal`].

use crate::mode::{CraftMode, StageKind, DISCARDED_STAGE};
use crate::model::{CraftEntry, EntryDraft, Material, MaterialDraft, MaterialSelection};
use std::collections::BTreeMap;

/// Title used when an entry is confirmed with a blank title.
pub fn placeholder_title(mode: CraftMode, stage: &str) -> String {
    if mode.config().stage_kind(stage) == StageKind::Inspiration {
        "未命名灵感".to_string()
    } else {
        format!("{stage}记录")
    }
}

/// Whether a title is one of the generated placeholders.
pub fn is_placeholder_title(title: &str) -> bool {
    title.contains("记录") || title.contains("未命名")
}

/// Pending inline material creation for one material type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickAddInput {
    pub name: String,
    pub brand: String,
}

/// State of the entry editor modal.
#[derive(Debug, Clone)]
pub struct EntryEditor {
    mode: CraftMode,
    editing: Option<String>,
    title: String,
    stage: String,
    memo: String,
    images: Vec<String>,
    selected: MaterialSelection,
    quick_add: BTreeMap<String, QuickAddInput>,
}

impl EntryEditor {
    /// Start a new entry, optionally from a freshly picked image.
    pub fn new(mode: CraftMode, image: Option<String>) -> Self {
        Self {
            mode,
            editing: None,
            title: String::new(),
            stage: mode.config().default_stage().value.to_string(),
            memo: String::new(),
            images: image.into_iter().collect(),
            selected: MaterialSelection::new(),
            quick_add: BTreeMap::new(),
        }
    }

    /// Open an existing entry for editing.
    pub fn edit(mode: CraftMode, entry: &CraftEntry) -> Self {
        Self {
            mode,
            editing: Some(entry.id.clone()),
            title: entry.title.clone(),
            stage: entry.stage.clone(),
            memo: entry.memo.clone().unwrap_or_default(),
            images: entry.images.clone(),
            selected: entry.material_details.clone().unwrap_or_default(),
            quick_add: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> CraftMode {
        self.mode
    }

    /// Id of the entry being edited, `None` when creating.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn selected(&self) -> &MaterialSelection {
        &self.selected
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.memo = memo.into();
    }

    /// Select a stage by value or slug. Returns false if the mode has no such stage.
    pub fn set_stage(&mut self, stage: &str) -> bool {
        match self.mode.config().stage(stage) {
            Some(def) => {
                self.stage = def.value.to_string();
                true
            }
            None => false,
        }
    }

    /// Move the stage selector by `offset` positions, wrapping.
    pub fn cycle_stage(&mut self, offset: isize) {
        let stages = self.mode.config().stages;
        let current = stages
            .iter()
            .position(|s| s.value == self.stage)
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(stages.len() as isize) as usize;
        self.stage = stages[next].value.to_string();
    }

    /// Append an image; earlier images keep their position.
    pub fn add_image(&mut self, image: String) {
        self.images.push(image);
    }

    /// Material pickers are hidden for inspirations and discarded work.
    pub fn shows_materials(&self) -> bool {
        matches!(
            self.mode.config().stage_kind(&self.stage),
            StageKind::Working | StageKind::Final
        )
    }

    pub fn is_selected(&self, type_id: &str, material_id: &str) -> bool {
        self.selected
            .get(type_id)
            .is_some_and(|list| list.iter().any(|m| m.id == material_id))
    }

    /// Add or remove a material from the selection of its type.
    pub fn toggle_material(&mut self, type_id: &str, material: &Material) {
        let list = self.selected.entry(type_id.to_string()).or_default();
        if let Some(pos) = list.iter().position(|m| m.id == material.id) {
            list.remove(pos);
        } else {
            list.push(material.clone());
        }
    }

    /// Add a material to the selection if it is not already there.
    pub fn select_material(&mut self, type_id: &str, material: Material) {
        let list = self.selected.entry(type_id.to_string()).or_default();
        if !list.iter().any(|m| m.id == material.id) {
            list.push(material);
        }
    }

    pub fn quick_add_input(&self, type_id: &str) -> Option<&QuickAddInput> {
        self.quick_add.get(type_id)
    }

    pub fn set_quick_add(&mut self, type_id: &str, name: impl Into<String>, brand: impl Into<String>) {
        self.quick_add.insert(
            type_id.to_string(),
            QuickAddInput {
                name: name.into(),
                brand: brand.into(),
            },
        );
    }

    /// Remove and return the quick-add inputs of a type.
    pub fn take_quick_add(&mut self, type_id: &str) -> Option<QuickAddInput> {
        self.quick_add.remove(type_id)
    }

    /// Assemble the draft with the selected stage.
    pub fn confirm(&self) -> EntryDraft {
        self.draft(&self.stage)
    }

    /// Assemble the draft forced to the discarded stage.
    pub fn discard(&self) -> EntryDraft {
        self.draft(DISCARDED_STAGE)
    }

    fn draft(&self, stage: &str) -> EntryDraft {
        let title = if self.title.trim().is_empty() {
            placeholder_title(self.mode, stage)
        } else {
            self.title.clone()
        };
        EntryDraft {
            title,
            stage: stage.to_string(),
            memo: self.memo.clone(),
            images: self.images.clone(),
            material_details: self.selected.clone(),
            ai_insights: None,
        }
    }
}

/// State of the material editor modal.
#[derive(Debug, Clone)]
pub struct MaterialEditor {
    mode: CraftMode,
    editing: Option<String>,
    pub name: String,
    pub brand: String,
    type_id: String,
    pub memo: String,
    images: Vec<String>,
}

impl MaterialEditor {
    pub fn new(mode: CraftMode) -> Self {
        Self {
            mode,
            editing: None,
            name: String::new(),
            brand: String::new(),
            type_id: mode.config().default_material_type().id.to_string(),
            memo: String::new(),
            images: Vec::new(),
        }
    }

    pub fn edit(mode: CraftMode, material: &Material) -> Self {
        Self {
            mode,
            editing: Some(material.id.clone()),
            name: material.name.clone(),
            brand: material.brand.clone(),
            type_id: material.type_id.clone(),
            memo: material.memo.clone().unwrap_or_default(),
            images: material.images.clone(),
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Select a type by id or label. Returns false if the mode has no such type.
    pub fn set_type(&mut self, type_id: &str) -> bool {
        match self.mode.config().material_type(type_id) {
            Some(def) => {
                self.type_id = def.id.to_string();
                true
            }
            None => false,
        }
    }

    pub fn cycle_type(&mut self, offset: isize) {
        let types = self.mode.config().material_types;
        let current = types
            .iter()
            .position(|t| t.id == self.type_id)
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(types.len() as isize) as usize;
        self.type_id = types[next].id.to_string();
    }

    pub fn add_image(&mut self, image: String) {
        self.images.push(image);
    }

    /// The assembled draft, or `None` while the name is blank.
    pub fn confirm(&self) -> Option<MaterialDraft> {
        if self.name.trim().is_empty() {
            return None;
        }
        Some(MaterialDraft {
            name: self.name.clone(),
            brand: self.brand.clone(),
            type_id: self.type_id.clone(),
            memo: self.memo.clone(),
            images: self.images.clone(),
        })
    }
}
