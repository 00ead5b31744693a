//! End-to-end persistence: restart equivalence, legacy migration, and the
//! silent fallback paths for corrupt saved state.

use tsukuyomi_game::{
    AlwaysConfirm, CardCatalog, DrillController, LEGACY_STORAGE_KEY, MemoryStore, STORAGE_KEY,
    SessionArchive, StateStore,
};

fn restart(store: &MemoryStore) -> DrillController<MemoryStore> {
    let copy = MemoryStore::new();
    for key in [STORAGE_KEY, LEGACY_STORAGE_KEY] {
        if let Ok(Some(raw)) = store.read(key) {
            copy.write(key, &raw).unwrap();
        }
    }
    DrillController::with_seed(copy, 777)
}

#[test]
fn restart_restores_an_equivalent_session() {
    let mut ctl = DrillController::with_seed(MemoryStore::new(), 41);
    ctl.open_editor();
    ctl.select_none().unwrap();
    ctl.set_blank_mode(true).unwrap();
    ctl.toggle_card(10).unwrap();
    ctl.set_blank_mode(false).unwrap();
    for no in [20, 30, 40] {
        ctl.toggle_card(no).unwrap();
    }
    ctl.commit_draft(&AlwaysConfirm).unwrap();
    ctl.advance();
    ctl.advance();

    let snapshot = restart(ctl.archive().store());
    assert_eq!(snapshot.session().order(), ctl.session().order());
    assert_eq!(snapshot.session().selected(), ctl.session().selected());
    assert_eq!(snapshot.session().manual(), ctl.session().manual());
    assert_eq!(snapshot.session().current_index(), 2);
}

#[test]
fn migrated_legacy_session_resumes_where_it_was() {
    let store = MemoryStore::new();
    let mut entries = vec![
        r#"{"no":101,"kaminoku":"j","shimonoku":"j"}"#.to_owned(),
        r#"{"no":102,"kaminoku":"j","shimonoku":"j"}"#.to_owned(),
    ];
    for no in 1..=100 {
        entries.push(format!(r#"{{"no":{no},"kaminoku":"k","shimonoku":"s"}}"#));
    }
    entries.push(r#"{"no":103,"kaminoku":"e","shimonoku":"e"}"#.to_owned());
    let payload = format!(
        r#"{{"currentIndex":5,"yomifudalist":[{}]}}"#,
        entries.join(",")
    );
    store.write(LEGACY_STORAGE_KEY, &payload).unwrap();

    let ctl = DrillController::with_seed(store, 3);
    assert_eq!(ctl.session().order().len(), 100);
    assert_eq!(ctl.selected_count(), 100);
    assert!(ctl.session().manual().is_empty());
    assert_eq!(ctl.session().current_index(), 5);
    // legacy order is preserved, not reshuffled
    let expected: Vec<u8> = (1..=100).collect();
    assert_eq!(ctl.session().order(), expected.as_slice());
}

#[test]
fn malformed_legacy_state_falls_back_to_default() {
    let store = MemoryStore::new();
    store
        .write(LEGACY_STORAGE_KEY, r#"{"yomifudalist":"nope"}"#)
        .unwrap();
    let ctl = DrillController::with_seed(store, 4);
    assert_eq!(ctl.selected_count(), 100);
    assert_eq!(ctl.session().current_index(), 0);
}

#[test]
fn corrupt_current_state_falls_back_to_default() {
    let store = MemoryStore::new();
    store.write(STORAGE_KEY, "{{{{").unwrap();
    let ctl = DrillController::with_seed(store, 5);
    assert_eq!(ctl.selected_count(), 100);
    assert_eq!(ctl.session().current_index(), 0);
}

#[test]
fn empty_saved_selection_falls_back_to_default() {
    let store = MemoryStore::new();
    let payload = r#"{
        "version": 2,
        "currentIndex": 0,
        "order": [],
        "selectedCardNumbers": [],
        "manualAdditionNumbers": []
    }"#;
    store.write(STORAGE_KEY, payload).unwrap();
    let ctl = DrillController::with_seed(store, 6);
    assert_eq!(ctl.selected_count(), 100);
}

#[test]
fn archive_survives_a_write_only_smoke_pass() {
    // Adapter-level sanity against a bare archive, no controller involved.
    let archive = SessionArchive::new(MemoryStore::new());
    let catalog = CardCatalog::bundled();
    assert!(archive.load(catalog).is_none());
    archive.clear();
    assert!(archive.load(catalog).is_none());
}
