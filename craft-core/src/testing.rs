//! Testing utilities for the craft journal.
//!
//! This module provides tools for integration testing:
//! - `MockAnalyzer` for deterministic analysis without API calls
//! - `TestHarness` for scripted journal scenarios over an in-memory store

use crate::editor::EntryEditor;
use crate::insight::{Analyzer, Insight, InsightError};
use crate::journal::Journal;
use crate::mode::CraftMode;
use crate::model::CraftEntry;
use crate::store::{MemoryStore, Store};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted analysis outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this title and insight.
    Insight { title: String, insight: String },
    /// Fail the way an unreachable service would.
    Fail,
}

impl MockResponse {
    pub fn insight(title: impl Into<String>, insight: impl Into<String>) -> Self {
        MockResponse::Insight {
            title: title.into(),
            insight: insight.into(),
        }
    }
}

/// One recorded call to the mock analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeCall {
    pub mode: CraftMode,
    pub image: String,
    pub stage: String,
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    calls: Vec<AnalyzeCall>,
}

/// An analyzer that returns scripted responses in order.
///
/// Clones share the same script and call log, so a test can keep a handle
/// after boxing one into a journal. When the script runs out every call fails.
#[derive(Debug, Clone, Default)]
pub struct MockAnalyzer {
    state: Arc<Mutex<MockState>>,
}

impl MockAnalyzer {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                responses: responses.into(),
                calls: Vec::new(),
            })),
        }
    }

    /// An analyzer whose every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Add a response to the end of the script.
    pub fn queue_response(&self, response: MockResponse) {
        self.lock().responses.push_back(response);
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<AnalyzeCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread poisons the lock; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(
        &self,
        mode: CraftMode,
        image: &str,
        stage: &str,
    ) -> Result<Insight, InsightError> {
        let mut state = self.lock();
        state.calls.push(AnalyzeCall {
            mode,
            image: image.to_string(),
            stage: stage.to_string(),
        });
        match state.responses.pop_front() {
            Some(MockResponse::Insight { title, insight }) => Ok(Insight { title, insight }),
            Some(MockResponse::Fail) | None => Err(InsightError::Malformed(
                "scripted failure".to_string(),
            )),
        }
    }
}

/// A tiny valid image reference for tests.
pub const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Test harness for running journal scenarios.
pub struct TestHarness<S: Store = MemoryStore> {
    /// The journal under test.
    pub journal: Journal<S>,
    /// Handle on the analyzer boxed into the journal.
    pub analyzer: MockAnalyzer,
}

impl TestHarness<MemoryStore> {
    /// A fresh journal over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_analyzer(MockAnalyzer::failing())
    }

    pub fn with_analyzer(analyzer: MockAnalyzer) -> Self {
        Self::with_store(MemoryStore::new(), analyzer)
    }

    /// Reopen the journal over the same store, as a restart would.
    pub fn reopen(self) -> Self {
        let store = self.journal.into_store();
        Self::with_store(store, self.analyzer)
    }
}

impl Default for TestHarness<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> TestHarness<S> {
    /// A journal over the given store.
    ///
    /// Panics if the store cannot be read; test stores always can.
    pub fn with_store(store: S, analyzer: MockAnalyzer) -> Self {
        let journal = match Journal::open(store, Box::new(analyzer.clone())) {
            Ok(journal) => journal,
            Err(e) => panic!("failed to open journal: {e}"),
        };
        Self { journal, analyzer }
    }

    /// Script the next analysis result.
    pub fn expect_insight(&mut self, title: &str, insight: &str) -> &mut Self {
        self.analyzer
            .queue_response(MockResponse::insight(title, insight));
        self
    }

    /// Script the next analysis to fail.
    pub fn expect_failure(&mut self) -> &mut Self {
        self.analyzer.queue_response(MockResponse::Fail);
        self
    }

    /// Open the editor, let `fill` adjust it, and confirm.
    pub async fn create_entry(
        &mut self,
        image: Option<&str>,
        fill: impl FnOnce(&mut EntryEditor),
    ) -> CraftEntry {
        self.journal.begin_entry(image.map(str::to_string));
        if let Some(editor) = self.journal.entry_editor_mut() {
            fill(editor);
        }
        match self.journal.confirm_entry().await {
            Ok(Some(entry)) => entry.clone(),
            Ok(None) => panic!("entry editor was not open"),
            Err(e) => panic!("failed to create entry: {e}"),
        }
    }

    /// Create an entry at a stage with a title and no image.
    pub async fn quick_entry(&mut self, stage: &str, title: &str) -> CraftEntry {
        self.create_entry(None, |editor| {
            assert!(editor.set_stage(stage), "unknown stage {stage}");
            editor.set_title(title);
        })
        .await
    }

    pub fn entry_count(&self) -> usize {
        self.journal.entries().len()
    }

    pub fn material_count(&self) -> usize {
        self.journal.materials().len()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.journal
            .entries()
            .iter()
            .map(|e| e.title.as_str())
            .collect()
    }
}

/// Assert the journal holds an entry with this title.
pub fn assert_has_entry<S: Store>(harness: &TestHarness<S>, title: &str) {
    assert!(
        harness.journal.entries().iter().any(|e| e.title == title),
        "expected an entry titled '{title}', found {:?}",
        harness.titles()
    );
}

/// Assert the stage of the entry with this id.
pub fn assert_stage<S: Store>(harness: &TestHarness<S>, id: &str, stage: &str) {
    let entry = harness
        .journal
        .entry(id)
        .unwrap_or_else(|| panic!("no entry with id {id}"));
    assert_eq!(entry.stage, stage, "stage of entry {id}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::analyze_or_fallback;
    use crate::mode::FINAL_STAGE;

    #[tokio::test]
    async fn test_mock_analyzer_scripts_and_records() {
        let mock = MockAnalyzer::new(vec![MockResponse::insight("Moon", "Round")]);
        let first = mock.analyze(CraftMode::Pottery, TEST_IMAGE, "泥坯").await;
        assert_eq!(first.unwrap().title, "Moon");

        let second = mock.analyze(CraftMode::Pottery, TEST_IMAGE, "素坯").await;
        assert!(second.is_err());

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].stage, "素坯");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let mock = MockAnalyzer::failing();
        let boxed: Box<dyn Analyzer> = Box::new(mock.clone());
        mock.queue_response(MockResponse::insight("Shared", "yes"));
        let insight = analyze_or_fallback(boxed.as_ref(), CraftMode::Glass, TEST_IMAGE, "备料").await;
        assert_eq!(insight.title, "Shared");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_harness_quick_entry() {
        let mut harness = TestHarness::new();
        let entry = harness.quick_entry(FINAL_STAGE, "Teapot").await;
        assert_has_entry(&harness, "Teapot");
        assert_stage(&harness, &entry.id, FINAL_STAGE);
        assert_eq!(harness.analyzer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_harness_reopen_keeps_data() {
        let mut harness = TestHarness::new();
        harness.quick_entry("泥坯", "Bowl").await;
        let harness = harness.reopen();
        assert_eq!(harness.titles(), ["Bowl"]);
    }
}
