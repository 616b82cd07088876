use tempfile::tempdir;

use overdesk::store::{JsonFileStore, PreferenceStore, StoreKey};

#[test]
fn document_survives_reopen() {
    let tmp = tempdir().expect("create tempdir");
    let path = tmp.path().join("overdesk-data.json");
    let key = StoreKey::shell("hidden_modules").expect("key");

    {
        let store = JsonFileStore::open(&path).expect("open");
        store.put(&key, r#"["news","game"]"#).expect("put");
    }

    let on_disk = std::fs::read_to_string(&path).expect("read");
    let doc: serde_json::Value = serde_json::from_str(&on_disk).expect("valid json");
    assert!(doc.get("shell/hidden_modules").is_some());

    let store = JsonFileStore::open(&path).expect("reopen");
    assert_eq!(
        store.get(&key).expect("get").as_deref(),
        Some(r#"["news","game"]"#)
    );
}

#[test]
fn missing_file_starts_empty() {
    let tmp = tempdir().expect("create tempdir");
    let store = JsonFileStore::open(&tmp.path().join("absent.json")).expect("open");
    assert!(store.keys_with_prefix("").expect("list").is_empty());
}

#[test]
fn removal_is_persisted() {
    let tmp = tempdir().expect("create tempdir");
    let path = tmp.path().join("overdesk-data.json");
    let key = StoreKey::parse("module/notes/items").expect("key");
    {
        let store = JsonFileStore::open(&path).expect("open");
        store.put(&key, "[]").expect("put");
        store.remove(&key).expect("remove");
    }
    let store = JsonFileStore::open(&path).expect("reopen");
    assert!(store.get(&key).expect("get").is_none());
}
