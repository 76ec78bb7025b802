//! Journal records and the draft requests that create or replace them.
//!
//! Field names on the wire follow the original local-storage layout
//! (`materialDetails`, `aiInsights`, material `type`) so existing data loads
//! without migration.

use crate::mode::CraftMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Selected materials keyed by material type id.
pub type MaterialSelection = BTreeMap<String, Vec<Material>>;

/// A logged craft project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftEntry {
    pub id: String,
    pub title: String,
    /// Data URIs; the first image is the cover.
    #[serde(default)]
    pub images: Vec<String>,
    pub stage: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Embedded material snapshots, not live references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_details: Option<MaterialSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<String>,
}

impl CraftEntry {
    /// The cover image, if any.
    pub fn cover(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Number of selected materials across all types.
    pub fn material_count(&self) -> usize {
        self.material_details
            .as_ref()
            .map(|d| d.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Replace every editable field with the draft's values.
    ///
    /// Identity (`id`, `timestamp`) and previously generated insights stay.
    pub fn apply(&mut self, draft: EntryDraft) {
        self.title = draft.title;
        self.images = draft.images;
        self.stage = draft.stage;
        self.memo = Some(draft.memo);
        self.material_details = Some(draft.material_details);
        if draft.ai_insights.is_some() {
            self.ai_insights = draft.ai_insights;
        }
    }
}

/// A raw material in the per-mode inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// A local account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Reasons a draft is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Stage '{stage}' is not defined for {mode}")]
    UnknownStage { mode: CraftMode, stage: String },

    #[error("Material type '{type_id}' is not defined for {mode}")]
    UnknownMaterialType { mode: CraftMode, type_id: String },

    #[error("Material name is required")]
    EmptyMaterialName,
}

/// The assembled output of the entry editor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryDraft {
    pub title: String,
    pub stage: String,
    pub memo: String,
    pub images: Vec<String>,
    pub material_details: MaterialSelection,
    /// Filled in by the controller's analysis step, never by the editor.
    pub ai_insights: Option<String>,
}

impl EntryDraft {
    /// Check the stage and material types against the mode's tables,
    /// normalizing a stage slug to its stored value.
    pub fn validate(mut self, mode: CraftMode) -> Result<Self, ValidationError> {
        let config = mode.config();
        let stage = config
            .stage(&self.stage)
            .ok_or_else(|| ValidationError::UnknownStage {
                mode,
                stage: self.stage.clone(),
            })?;
        self.stage = stage.value.to_string();

        for type_id in self.material_details.keys() {
            if config.material_type(type_id).is_none() {
                return Err(ValidationError::UnknownMaterialType {
                    mode,
                    type_id: type_id.clone(),
                });
            }
        }
        Ok(self)
    }
}

/// The assembled output of the material editor. Ids are assigned by the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDraft {
    pub name: String,
    pub brand: String,
    pub type_id: String,
    pub memo: String,
    pub images: Vec<String>,
}

impl MaterialDraft {
    /// Require a name and a type known to the mode, normalizing a type label to its id.
    pub fn validate(mut self, mode: CraftMode) -> Result<Self, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyMaterialName);
        }
        let material_type = mode.config().material_type(&self.type_id).ok_or_else(|| {
            ValidationError::UnknownMaterialType {
                mode,
                type_id: self.type_id.clone(),
            }
        })?;
        self.type_id = material_type.id.to_string();
        self.name = self.name.trim().to_string();
        self.brand = self.brand.trim().to_string();
        Ok(self)
    }

    /// Build the stored record under the given id.
    pub fn into_material(self, id: String) -> Material {
        Material {
            id,
            name: self.name,
            brand: self.brand,
            type_id: self.type_id,
            images: self.images,
            memo: Some(self.memo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_uses_original_field_names() {
        let entry = CraftEntry {
            id: "1".to_string(),
            title: "Bowl".to_string(),
            images: vec!["data:image/png;base64,AAAA".to_string()],
            stage: "泥坯".to_string(),
            timestamp: 1_700_000_000_000,
            memo: None,
            material_details: Some(MaterialSelection::new()),
            ai_insights: Some("Nice rim".to_string()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("materialDetails").is_some());
        assert_eq!(json["aiInsights"], "Nice rim");
        assert!(json.get("memo").is_none());
    }

    #[test]
    fn test_material_type_field_is_named_type() {
        let raw = r#"{"id":"m1","name":"Stoneware","brand":"","type":"clay","images":[]}"#;
        let material: Material = serde_json::from_str(raw).unwrap();
        assert_eq!(material.type_id, "clay");
        assert_eq!(material.memo, None);
    }

    #[test]
    fn test_entry_draft_validate_normalizes_slug() {
        let draft = EntryDraft {
            stage: "bisque".to_string(),
            ..Default::default()
        };
        let draft = draft.validate(CraftMode::Pottery).unwrap();
        assert_eq!(draft.stage, "素坯");
    }

    #[test]
    fn test_entry_draft_rejects_foreign_stage_and_type() {
        let draft = EntryDraft {
            stage: "编织中".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            draft.validate(CraftMode::Pottery),
            Err(ValidationError::UnknownStage { .. })
        ));

        let mut details = MaterialSelection::new();
        details.insert("yarn".to_string(), Vec::new());
        let draft = EntryDraft {
            stage: "灵感".to_string(),
            material_details: details,
            ..Default::default()
        };
        assert!(matches!(
            draft.validate(CraftMode::Pottery),
            Err(ValidationError::UnknownMaterialType { .. })
        ));
    }

    #[test]
    fn test_material_draft_requires_name() {
        let draft = MaterialDraft {
            name: "   ".to_string(),
            type_id: "clay".to_string(),
            ..Default::default()
        };
        assert_eq!(
            draft.validate(CraftMode::Pottery),
            Err(ValidationError::EmptyMaterialName)
        );
    }

    #[test]
    fn test_apply_keeps_identity_and_insight() {
        let mut entry = CraftEntry {
            id: "keep".to_string(),
            title: "old".to_string(),
            images: vec![],
            stage: "灵感".to_string(),
            timestamp: 42,
            memo: None,
            material_details: None,
            ai_insights: Some("insight".to_string()),
        };
        entry.apply(EntryDraft {
            title: "new".to_string(),
            stage: "成品".to_string(),
            ..Default::default()
        });
        assert_eq!(entry.id, "keep");
        assert_eq!(entry.timestamp, 42);
        assert_eq!(entry.title, "new");
        assert_eq!(entry.ai_insights.as_deref(), Some("insight"));
    }
}
