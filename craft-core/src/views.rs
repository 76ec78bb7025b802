//! Derived entry lists, recomputed from the full list on every render.
//!
//! Entries are stored newest first, so every view preserves that order.

use crate::mode::{CraftMode, StageKind};
use crate::model::{CraftEntry, Material};

/// Maximum number of entries in the recent section.
pub const RECENT_LIMIT: usize = 6;

fn of_kind<'a>(
    entries: &'a [CraftEntry],
    mode: CraftMode,
    pred: impl Fn(StageKind) -> bool + 'a,
) -> impl Iterator<Item = &'a CraftEntry> + 'a {
    let config = mode.config();
    entries
        .iter()
        .filter(move |e| pred(config.stage_kind(&e.stage)))
}

/// The newest non-discarded entries.
pub fn recent(entries: &[CraftEntry], mode: CraftMode) -> Vec<&CraftEntry> {
    of_kind(entries, mode, |k| k != StageKind::Discarded)
        .take(RECENT_LIMIT)
        .collect()
}

/// Entries in any working stage.
pub fn in_progress(entries: &[CraftEntry], mode: CraftMode) -> Vec<&CraftEntry> {
    of_kind(entries, mode, |k| k == StageKind::Working).collect()
}

/// Finished pieces.
pub fn portfolio(entries: &[CraftEntry], mode: CraftMode) -> Vec<&CraftEntry> {
    of_kind(entries, mode, |k| k == StageKind::Final).collect()
}

pub fn inspirations(entries: &[CraftEntry], mode: CraftMode) -> Vec<&CraftEntry> {
    of_kind(entries, mode, |k| k == StageKind::Inspiration).collect()
}

pub fn discarded(entries: &[CraftEntry], mode: CraftMode) -> Vec<&CraftEntry> {
    of_kind(entries, mode, |k| k == StageKind::Discarded).collect()
}

/// Stage restriction applied on top of the text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StageFilter {
    #[default]
    All,
    Stage(String),
}

impl StageFilter {
    pub fn matches(&self, stage: &str) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Stage(s) => s == stage,
        }
    }

    /// The next filter in the chip row: all, then each stage of the mode.
    pub fn cycle(&self, mode: CraftMode) -> StageFilter {
        let stages = mode.config().stages;
        match self {
            StageFilter::All => StageFilter::Stage(stages[0].value.to_string()),
            StageFilter::Stage(current) => {
                match stages.iter().position(|s| s.value == current) {
                    Some(i) if i + 1 < stages.len() => {
                        StageFilter::Stage(stages[i + 1].value.to_string())
                    }
                    _ => StageFilter::All,
                }
            }
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StageFilter::All => "全部",
            StageFilter::Stage(s) => s,
        }
    }
}

/// Search query and stage filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub query: String,
    pub stage: StageFilter,
}

impl SearchFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            stage: StageFilter::All,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = StageFilter::Stage(stage.into());
        self
    }

    pub fn matches(&self, entry: &CraftEntry) -> bool {
        if !self.stage.matches(&entry.stage) {
            return false;
        }
        let query = self.query.to_lowercase();
        entry.title.to_lowercase().contains(&query)
            || entry
                .memo
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(&query))
    }
}

/// Entries whose title or memo contains the query, case-insensitively.
pub fn search<'a>(entries: &'a [CraftEntry], filter: &SearchFilter) -> Vec<&'a CraftEntry> {
    entries.iter().filter(|e| filter.matches(e)).collect()
}

pub fn materials_of_type<'a>(materials: &'a [Material], type_id: &str) -> Vec<&'a Material> {
    materials.iter().filter(|m| m.type_id == type_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{DISCARDED_STAGE, FINAL_STAGE, INSPIRATION_STAGE};

    fn entry(title: &str, stage: &str) -> CraftEntry {
        CraftEntry {
            id: title.to_string(),
            title: title.to_string(),
            images: Vec::new(),
            stage: stage.to_string(),
            timestamp: 0,
            memo: None,
            material_details: None,
            ai_insights: None,
        }
    }

    fn titles(list: Vec<&CraftEntry>) -> Vec<&str> {
        list.into_iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_recent_skips_discarded_and_caps() {
        let mut entries = vec![entry("gone", DISCARDED_STAGE)];
        for i in 0..8 {
            entries.push(entry(&format!("e{i}"), "泥坯"));
        }
        let recent = recent(&entries, CraftMode::Pottery);
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0].title, "e0");
        assert!(recent.iter().all(|e| e.stage != DISCARDED_STAGE));
    }

    #[test]
    fn test_views_partition_by_kind() {
        let entries = vec![
            entry("idea", INSPIRATION_STAGE),
            entry("wip", "素坯"),
            entry("done", FINAL_STAGE),
            entry("gone", DISCARDED_STAGE),
        ];
        let mode = CraftMode::Pottery;
        assert_eq!(titles(in_progress(&entries, mode)), ["wip"]);
        assert_eq!(titles(portfolio(&entries, mode)), ["done"]);
        assert_eq!(titles(inspirations(&entries, mode)), ["idea"]);
        assert_eq!(titles(discarded(&entries, mode)), ["gone"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_memo() {
        let mut with_memo = entry("Jar", "泥坯");
        with_memo.memo = Some("Tried a new ALKALINE glaze".to_string());
        let entries = vec![entry("A", "泥坯"), entry("B-A", FINAL_STAGE), with_memo];

        assert_eq!(titles(search(&entries, &SearchFilter::new("a"))).len(), 3);
        assert_eq!(
            titles(search(&entries, &SearchFilter::new("alkaline"))),
            ["Jar"]
        );
    }

    #[test]
    fn test_search_stage_filter_excludes_other_stages() {
        let entries = vec![entry("A", "泥坯"), entry("B-A", FINAL_STAGE)];
        let filter = SearchFilter::new("a").with_stage(FINAL_STAGE);
        assert_eq!(titles(search(&entries, &filter)), ["B-A"]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let entries = vec![entry("A", "泥坯"), entry("B", FINAL_STAGE)];
        assert_eq!(search(&entries, &SearchFilter::default()).len(), 2);
    }

    #[test]
    fn test_stage_filter_cycle() {
        let mode = CraftMode::Pottery;
        let mut filter = StageFilter::All;
        let mut seen = Vec::new();
        for _ in 0..mode.config().stages.len() {
            filter = filter.cycle(mode);
            seen.push(filter.label().to_string());
        }
        assert_eq!(seen.first().map(String::as_str), Some(INSPIRATION_STAGE));
        assert_eq!(filter.cycle(mode), StageFilter::All);
    }

    #[test]
    fn test_materials_of_type() {
        let material = |id: &str, type_id: &str| Material {
            id: id.to_string(),
            name: id.to_string(),
            brand: String::new(),
            type_id: type_id.to_string(),
            images: Vec::new(),
            memo: None,
        };
        let materials = vec![material("a", "clay"), material("b", "glaze"), material("c", "clay")];
        let clays: Vec<_> = materials_of_type(&materials, "clay")
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(clays, ["a", "c"]);
    }
}
