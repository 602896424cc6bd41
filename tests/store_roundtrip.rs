mod common;

use std::fs;

use questgraph::questdb::{Dataset, PrereqField, QuestDbError, QuestStore};

#[test]
fn save_of_loaded_fixture_is_byte_identical() {
    let (_tmp, path) = common::writable_fixture();
    let original = fs::read_to_string(&path).unwrap();

    let store = QuestStore::new(&path);
    let dataset = store.load().unwrap();
    store.save(&dataset).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn file_without_final_newline_is_saved_without_one() {
    let (_tmp, path) = common::writable_fixture();
    let original = fs::read_to_string(&path).unwrap();
    let trimmed = original.trim_end_matches('\n').to_string();
    fs::write(&path, &trimmed).unwrap();

    let store = QuestStore::new(&path);
    let dataset = store.load().unwrap();
    assert!(!dataset.trailing_newline);
    store.save(&dataset).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), trimmed);
}

#[test]
fn newline_state_does_not_affect_equality() {
    let (_tmp, path) = common::writable_fixture();
    let with_newline = QuestStore::new(&path).load().unwrap();
    assert!(with_newline.trailing_newline);

    let text = fs::read_to_string(&path).unwrap();
    let without = Dataset::from_json_str(text.trim_end()).unwrap();
    assert_eq!(with_newline, without);
    assert!(!without.to_json_string().unwrap().ends_with('\n'));
}

#[test]
fn fixture_loads_in_document_order() {
    let dataset = QuestStore::new(common::fixture_dataset()).load().unwrap();
    let npcs: Vec<&str> = dataset.npcs.ids().collect();
    assert_eq!(npcs, vec!["prapor", "therapist"]);
    assert_eq!(dataset.quest_count(), 6);
    assert_eq!(dataset.last_updated, "2025-01-15T12:00:00Z");

    let debut = dataset.npcs.get("prapor").unwrap().quest("debut").unwrap();
    assert_eq!(debut.tier, Some(1));
    assert!(debut.kappa_required);
    assert!(debut.extra.contains_key("objectives"));

    let shortage = dataset.npcs.get("therapist").unwrap().quest("shortage").unwrap();
    assert_eq!(shortage.tier, None);
    assert_eq!(shortage.field(PrereqField::External), ["debut".to_string()]);
}

#[test]
fn camel_case_timestamp_is_accepted() {
    let dataset = Dataset::from_json_str(
        r#"{"version":"1.0.0","lastUpdated":"2024-06-01T00:00:00Z","npcs":{}}"#,
    )
    .unwrap();
    assert_eq!(dataset.last_updated, "2024-06-01T00:00:00Z");
    assert!(dataset.to_json_string().unwrap().contains("\"last_updated\""));
}

#[test]
fn missing_dataset_aborts_with_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let err = QuestStore::new(tmp.path().join("nope.json")).load().unwrap_err();
    assert!(matches!(err, QuestDbError::NotFound { .. }));
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn wrong_shape_is_a_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("quests.json");
    fs::write(&path, r#"{"npcs": {"prapor": {"name": "Prapor", "quests": "none"}}}"#).unwrap();
    assert!(matches!(
        QuestStore::new(&path).load(),
        Err(QuestDbError::Parse { .. })
    ));
}

#[test]
fn touch_stamps_utc_seconds() {
    let mut dataset = Dataset::new("1.0.0");
    dataset.touch();
    assert_eq!(dataset.last_updated.len(), "2025-01-15T12:00:00Z".len());
    assert!(dataset.last_updated.ends_with('Z'));
}
