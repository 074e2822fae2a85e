use std::sync::Arc;
use std::thread;

use history_store::{HistoryStore, JsonFileStore};
use vigil_core::{HistoryEntry, TargetKind, VerdictStats, VerdictStatus};

fn open(path: &std::path::Path) -> HistoryStore {
    HistoryStore::new(Arc::new(JsonFileStore::open(path).unwrap()))
}

fn entry(target: &str) -> HistoryEntry {
    HistoryEntry::new(target, TargetKind::Hash, VerdictStats::default(), VerdictStatus::Clean)
}

#[test]
fn history_is_newest_first_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = open(&path);
    store.append(entry("first")).unwrap();
    store.append(entry("second")).unwrap();
    drop(store);

    let store = open(&path);
    let entries = store.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].target, "second");
    assert_eq!(entries[1].target, "first");
}

#[test]
fn clear_removes_history_but_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = open(&path);
    store.set_api_key("secret").unwrap();
    store.append(entry("a")).unwrap();
    store.clear().unwrap();

    assert!(store.entries().unwrap().is_empty());
    assert_eq!(store.api_key().unwrap().as_deref(), Some("secret"));
}

#[test]
fn empty_api_key_counts_as_unset() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir.path().join("store.json"));

    assert_eq!(store.api_key().unwrap(), None);
    store.set_api_key("").unwrap();
    assert_eq!(store.api_key().unwrap(), None);
    store.set_api_key("k").unwrap();
    assert_eq!(store.api_key().unwrap().as_deref(), Some("k"));
    store.clear_api_key().unwrap();
    assert_eq!(store.api_key().unwrap(), None);
}

#[test]
fn concurrent_appends_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(open(&dir.path().join("store.json")));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || store.append(entry(&format!("t{i}"))).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.entries().unwrap().len(), 8);
}

#[test]
fn theme_preference_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir.path().join("store.json"));

    assert_eq!(store.theme().unwrap(), None);
    store.set_theme("dark").unwrap();
    assert_eq!(store.theme().unwrap().as_deref(), Some("dark"));
}
