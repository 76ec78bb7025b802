//! QA tests for journal behavior using the mock analyzer.
//!
//! These tests verify entry creation, analysis, editing, materials,
//! accounts and search without any network access.
//!
//! Run with: `cargo test -p craft-core --test qa_journal`

use craft_core::auth::AuthError;
use craft_core::insight::FALLBACK_INSIGHT;
use craft_core::mode::{CraftMode, DISCARDED_STAGE, FINAL_STAGE, INSPIRATION_STAGE};
use craft_core::testing::{assert_has_entry, assert_stage, MockAnalyzer, MockResponse, TEST_IMAGE};
use craft_core::{JournalError, SearchFilter, StageFilter, TestHarness, View};
use pretty_assertions::assert_eq;

// =============================================================================
// PLACEHOLDER TITLES
// =============================================================================

#[tokio::test]
async fn test_blank_title_inspiration_placeholder() {
    let mut harness = TestHarness::new();
    let entry = harness.create_entry(None, |_| {}).await;
    assert_eq!(entry.stage, INSPIRATION_STAGE);
    assert_eq!(entry.title, "未命名灵感");
}

#[tokio::test]
async fn test_blank_title_stage_placeholder_in_every_mode() {
    let mut harness = TestHarness::new();
    for mode in CraftMode::ALL {
        harness.journal.switch_mode(mode).unwrap();
        let stage = mode.config().stages[1].value;
        let entry = harness
            .create_entry(None, |editor| {
                editor.set_stage(stage);
                editor.set_title("   ");
            })
            .await;
        assert_eq!(entry.title, format!("{stage}记录"), "mode {mode:?}");
    }
}

// =============================================================================
// AI INSIGHTS
// =============================================================================

#[tokio::test]
async fn test_insight_replaces_placeholder_title() {
    let mut harness = TestHarness::new();
    harness.expect_insight("月白小罐", "釉面温润，口沿可再收一些");

    let entry = harness
        .create_entry(Some(TEST_IMAGE), |editor| {
            editor.set_stage("bisque");
        })
        .await;

    assert_eq!(entry.title, "月白小罐");
    assert_eq!(entry.ai_insights.as_deref(), Some("釉面温润，口沿可再收一些"));

    let calls = harness.analyzer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].image, TEST_IMAGE);
    assert_eq!(calls[0].stage, "素坯");
    assert_eq!(calls[0].mode, CraftMode::Pottery);
}

#[tokio::test]
async fn test_insight_keeps_user_title() {
    let mut harness = TestHarness::new();
    harness.expect_insight("Suggested", "Nice form");

    let entry = harness
        .create_entry(Some(TEST_IMAGE), |editor| {
            editor.set_title("My teapot");
        })
        .await;

    assert_eq!(entry.title, "My teapot");
    assert_eq!(entry.ai_insights.as_deref(), Some("Nice form"));
}

#[tokio::test]
async fn test_analysis_failure_still_saves_with_fallback() {
    let mut harness = TestHarness::new();
    harness.expect_failure();

    let entry = harness
        .create_entry(Some(TEST_IMAGE), |editor| {
            editor.set_stage("glazing");
            editor.set_title("Celadon bowl");
        })
        .await;

    assert_eq!(harness.entry_count(), 1);
    assert_eq!(entry.title, "Celadon bowl");
    assert_eq!(entry.ai_insights.as_deref(), Some(FALLBACK_INSIGHT));
    assert!(harness.journal.entry_editor().is_none());
}

#[tokio::test]
async fn test_analysis_failure_with_placeholder_title() {
    let mut harness = TestHarness::with_analyzer(MockAnalyzer::failing());

    let entry = harness
        .create_entry(Some(TEST_IMAGE), |editor| {
            editor.set_stage("greenware");
        })
        .await;

    assert_eq!(entry.title, "泥坯记录");
    assert_eq!(entry.ai_insights.as_deref(), Some(FALLBACK_INSIGHT));
}

#[tokio::test]
async fn test_analysis_uses_first_image_only() {
    let mut harness = TestHarness::new();
    harness.expect_insight("Two views", "Front and back");

    harness
        .create_entry(Some(TEST_IMAGE), |editor| {
            editor.add_image("data:image/jpeg;base64,/9j/".to_string());
        })
        .await;

    let calls = harness.analyzer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].image, TEST_IMAGE);
}

#[tokio::test]
async fn test_edit_never_calls_analyzer_and_keeps_identity() {
    let analyzer = MockAnalyzer::new(vec![MockResponse::insight("First", "Original insight")]);
    let mut harness = TestHarness::with_analyzer(analyzer);

    let created = harness.create_entry(Some(TEST_IMAGE), |_| {}).await;
    harness.journal.edit_entry(&created.id).unwrap();
    {
        let editor = harness.journal.entry_editor_mut().unwrap();
        editor.set_title("Renamed");
        editor.set_stage(FINAL_STAGE);
    }
    let edited = harness.journal.confirm_entry().await.unwrap().unwrap().clone();

    assert_eq!(harness.analyzer.call_count(), 1);
    assert_eq!(edited.id, created.id);
    assert_eq!(edited.timestamp, created.timestamp);
    assert_eq!(edited.title, "Renamed");
    assert_eq!(edited.stage, FINAL_STAGE);
    assert_eq!(edited.ai_insights.as_deref(), Some("Original insight"));
    assert_eq!(harness.entry_count(), 1);
}

// =============================================================================
// ORDERING AND VIEWS
// =============================================================================

#[tokio::test]
async fn test_new_entries_are_prepended() {
    let mut harness = TestHarness::new();
    harness.quick_entry("泥坯", "first").await;
    harness.quick_entry("泥坯", "second").await;
    harness.quick_entry("泥坯", "third").await;
    assert_eq!(harness.titles(), ["third", "second", "first"]);
}

#[tokio::test]
async fn test_home_sections() {
    let mut harness = TestHarness::new();
    harness.quick_entry(INSPIRATION_STAGE, "idea").await;
    harness.quick_entry("素坯", "wip").await;
    harness.quick_entry(FINAL_STAGE, "done").await;
    harness.quick_entry(DISCARDED_STAGE, "gone").await;

    let titles = |list: Vec<&craft_core::CraftEntry>| {
        list.into_iter().map(|e| e.title.clone()).collect::<Vec<_>>()
    };
    let journal = &harness.journal;
    assert_eq!(titles(journal.recent()), ["done", "wip", "idea"]);
    assert_eq!(titles(journal.in_progress()), ["wip"]);
    assert_eq!(titles(journal.portfolio()), ["done"]);
    assert_eq!(titles(journal.inspirations()), ["idea"]);
    assert_eq!(titles(journal.discarded()), ["gone"]);
}

// =============================================================================
// DISCARD
// =============================================================================

#[tokio::test]
async fn test_discard_ignores_stage_selector() {
    let mut harness = TestHarness::new();
    harness.journal.begin_entry(None);
    {
        let editor = harness.journal.entry_editor_mut().unwrap();
        editor.set_stage(FINAL_STAGE);
        editor.set_title("Cracked vase");
    }
    let entry = harness.journal.discard_entry().await.unwrap().unwrap().clone();

    assert_stage(&harness, &entry.id, DISCARDED_STAGE);
    assert_eq!(entry.title, "Cracked vase");
    assert!(harness.journal.portfolio().is_empty());
}

#[tokio::test]
async fn test_discard_existing_entry() {
    let mut harness = TestHarness::new();
    let entry = harness.quick_entry("上釉中", "Crawling glaze").await;

    harness.journal.edit_entry(&entry.id).unwrap();
    harness.journal.discard_entry().await.unwrap();

    assert_stage(&harness, &entry.id, DISCARDED_STAGE);
    assert_eq!(harness.entry_count(), 1);
}

// =============================================================================
// MATERIALS
// =============================================================================

#[tokio::test]
async fn test_quick_add_empty_name_changes_nothing() {
    let mut harness = TestHarness::new();
    harness.journal.begin_entry(None);
    harness
        .journal
        .entry_editor_mut()
        .unwrap()
        .set_quick_add("clay", "   ", "Laguna");

    let added = harness.journal.editor_quick_add("clay").unwrap();
    assert!(added.is_none());
    assert_eq!(harness.material_count(), 0);
    let editor = harness.journal.entry_editor().unwrap();
    assert!(editor.selected().values().all(Vec::is_empty));

    assert!(harness
        .journal
        .quick_add_material("clay", "", "")
        .unwrap()
        .is_none());
    assert_eq!(harness.material_count(), 0);
}

#[tokio::test]
async fn test_quick_add_selects_material_in_editor() {
    let mut harness = TestHarness::new();
    harness.journal.begin_entry(None);
    {
        let editor = harness.journal.entry_editor_mut().unwrap();
        editor.set_stage("greenware");
        editor.set_quick_add("clay", "B-Mix", "Laguna");
    }
    let material = harness.journal.editor_quick_add("clay").unwrap().unwrap();

    assert_eq!(material.name, "B-Mix");
    assert_eq!(material.brand, "Laguna");
    assert_eq!(harness.journal.materials()[0].id, material.id);
    let editor = harness.journal.entry_editor().unwrap();
    assert!(editor.is_selected("clay", &material.id));
    assert!(editor.quick_add_input("clay").is_none());

    let entry = harness.journal.confirm_entry().await.unwrap().unwrap();
    assert_eq!(entry.material_count(), 1);
}

#[tokio::test]
async fn test_quick_add_rejects_foreign_type() {
    let mut harness = TestHarness::new();
    let err = harness
        .journal
        .quick_add_material("yarn", "Merino", "")
        .unwrap_err();
    assert!(matches!(err, JournalError::Validation(_)));
    assert_eq!(harness.material_count(), 0);
}

#[tokio::test]
async fn test_material_editor_blank_name_is_noop() {
    let mut harness = TestHarness::new();
    harness.journal.begin_material();
    assert!(harness.journal.confirm_material().unwrap().is_none());
    assert!(harness.journal.material_editor().is_some());
    assert_eq!(harness.material_count(), 0);
}

#[tokio::test]
async fn test_material_edit_does_not_touch_entry_snapshots() {
    let mut harness = TestHarness::new();
    let material = harness
        .journal
        .quick_add_material("glaze", "Shino", "")
        .unwrap()
        .unwrap();

    let entry = harness
        .create_entry(None, |editor| {
            editor.set_stage("glazing");
            editor.toggle_material("glaze", &material);
        })
        .await;

    harness.journal.edit_material(&material.id).unwrap();
    harness.journal.material_editor_mut().unwrap().name = "Carbon trap shino".to_string();
    let updated = harness.journal.confirm_material().unwrap().unwrap().clone();

    assert_eq!(updated.id, material.id);
    assert_eq!(updated.name, "Carbon trap shino");
    assert_eq!(harness.material_count(), 1);

    let stored = harness.journal.entry(&entry.id).unwrap();
    let snapshot = &stored.material_details.as_ref().unwrap()["glaze"][0];
    assert_eq!(snapshot.name, "Shino");
}

#[tokio::test]
async fn test_material_type_defaults_to_first() {
    let mut harness = TestHarness::new();
    harness.journal.switch_mode(CraftMode::Woodwork).unwrap();
    harness.journal.begin_material();
    harness.journal.material_editor_mut().unwrap().name = "White oak".to_string();
    let material = harness.journal.confirm_material().unwrap().unwrap();
    assert_eq!(material.type_id, "wood");
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[test]
fn test_register_duplicate_email_case_insensitive() {
    let mut harness = TestHarness::new();
    harness
        .journal
        .register_user("Mei", "mei@studio.cn", "kiln")
        .unwrap();
    assert_eq!(harness.journal.view(), View::Profile);

    let err = harness
        .journal
        .register_user("Other Mei", "MEI@Studio.CN", "wheel")
        .unwrap_err();
    assert!(matches!(err, JournalError::Auth(AuthError::DuplicateEmail)));
    assert_eq!(harness.journal.auth_error(), Some("该邮箱已注册"));
    assert_eq!(harness.journal.users().len(), 1);
}

#[test]
fn test_login_errors_do_not_reveal_which_field_was_wrong() {
    let mut harness = TestHarness::new();
    harness
        .journal
        .register_user("Mei", "mei@studio.cn", "kiln")
        .unwrap();
    harness.journal.logout_user().unwrap();

    let wrong_password = harness
        .journal
        .login_user("mei@studio.cn", "wheel")
        .unwrap_err()
        .to_string();
    let unknown_email = harness
        .journal
        .login_user("lin@studio.cn", "kiln")
        .unwrap_err()
        .to_string();

    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password, "邮箱或密码错误");
    assert!(harness.journal.current_user().is_none());

    let user = harness.journal.login_user("Mei@Studio.cn", "kiln").unwrap();
    assert_eq!(user.name, "Mei");
}

#[test]
fn test_passwords_are_not_stored_in_plaintext() {
    let mut harness = TestHarness::new();
    harness
        .journal
        .register_user("Mei", "mei@studio.cn", "kiln-secret")
        .unwrap();
    let user = &harness.journal.users()[0];
    assert!(!user.password_hash.contains("kiln-secret"));
}

// =============================================================================
// SEARCH
// =============================================================================

#[tokio::test]
async fn test_search_case_insensitive_and_stage_filter() {
    let mut harness = TestHarness::new();
    harness.quick_entry("泥坯", "A").await;
    harness.quick_entry(FINAL_STAGE, "B-A").await;
    harness.quick_entry(FINAL_STAGE, "C").await;

    harness.journal.set_search_query("a");
    let mut titles: Vec<_> = harness
        .journal
        .search_results()
        .into_iter()
        .map(|e| e.title.clone())
        .collect();
    titles.sort();
    assert_eq!(titles, ["A", "B-A"]);

    harness
        .journal
        .set_stage_filter(StageFilter::Stage(FINAL_STAGE.to_string()));
    let filtered: Vec<_> = harness
        .journal
        .search_results()
        .into_iter()
        .map(|e| e.title.clone())
        .collect();
    assert_eq!(filtered, ["B-A"]);
    assert_eq!(
        harness.journal.search_filter(),
        &SearchFilter::new("a").with_stage(FINAL_STAGE)
    );
}

#[tokio::test]
async fn test_switching_mode_resets_stage_filter() {
    let mut harness = TestHarness::new();
    harness
        .journal
        .set_stage_filter(StageFilter::Stage("泥坯".to_string()));
    harness.journal.switch_mode(CraftMode::Glass).unwrap();
    assert_eq!(harness.journal.search_filter().stage, StageFilter::All);
    assert_has_entry_count(&harness, 0);
}

fn assert_has_entry_count(harness: &TestHarness, expected: usize) {
    assert_eq!(harness.entry_count(), expected);
}

#[tokio::test]
async fn test_entry_lookup_helper() {
    let mut harness = TestHarness::new();
    harness.quick_entry("泥坯", "Bottle").await;
    assert_has_entry(&harness, "Bottle");
}
