use std::sync::Arc;

use rusqlite::Connection;
use tempfile::tempdir;

use overdesk::store::{PreferenceStore, ScopedStore, SharedStore, SqliteStore, StoreKey};
use overdesk::ModuleId;

#[test]
fn values_survive_reopen() {
    let tmp = tempdir().expect("create tempdir");
    let path = tmp.path().join("nested").join("overdesk.db");

    {
        let store = SqliteStore::open(&path).expect("open");
        let key = StoreKey::module(&ModuleId::from("tasks"), "items").expect("key");
        store.put(&key, r#"[{"id":1,"text":"a"}]"#).expect("put");
    }

    let store = SqliteStore::open(&path).expect("reopen");
    let key = StoreKey::parse("module/tasks/items").expect("parse");
    assert_eq!(
        store.get(&key).expect("get").as_deref(),
        Some(r#"[{"id":1,"text":"a"}]"#)
    );
    assert_eq!(store.schema_version().expect("version"), Some(1));
}

#[test]
fn database_runs_in_wal_mode() {
    let tmp = tempdir().expect("create tempdir");
    let path = tmp.path().join("overdesk.db");
    drop(SqliteStore::open(&path).expect("open"));

    let conn = Connection::open(&path).expect("raw open");
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .expect("pragma");
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn module_namespaces_do_not_collide() {
    let tmp = tempdir().expect("create tempdir");
    let store: SharedStore =
        Arc::new(SqliteStore::open(&tmp.path().join("overdesk.db")).expect("open"));
    let tasks = ScopedStore::new(store.clone(), ModuleId::from("tasks"));
    let notes = ScopedStore::new(store.clone(), ModuleId::from("notes"));

    tasks.put("items", &vec!["buy milk"]).expect("put tasks");
    notes.put("items", &vec!["meeting notes"]).expect("put notes");

    let t: Vec<String> = tasks.get("items").expect("get").expect("present");
    let n: Vec<String> = notes.get("items").expect("get").expect("present");
    assert_eq!(t, vec!["buy milk"]);
    assert_eq!(n, vec!["meeting notes"]);

    notes.remove("items").expect("remove");
    assert!(notes.get::<Vec<String>>("items").expect("get").is_none());
    assert!(tasks.get::<Vec<String>>("items").expect("get").is_some());
}

#[test]
fn prefix_listing_is_scoped() {
    let store = SqliteStore::open_in_memory().expect("open");
    for raw in ["module/tasks/items", "module/tasks/view", "module/tasks_old/items", "shell/hidden_modules"] {
        store
            .put(&StoreKey::parse(raw).expect("key"), "null")
            .expect("put");
    }
    let keys: Vec<String> = store
        .keys_with_prefix("module/tasks/")
        .expect("list")
        .iter()
        .map(|k| k.as_str().to_string())
        .collect();
    assert_eq!(keys, vec!["module/tasks/items", "module/tasks/view"]);
}
