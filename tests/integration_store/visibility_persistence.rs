use tempfile::tempdir;

use overdesk::config::StoreBackend;
use overdesk::store::{PreferenceStore, ScopedStore, SharedStore};
use overdesk::visibility::VisibilityEngine;
use overdesk::{builtin_registry, open_store, ShellConfig};

fn config_for(dir: &std::path::Path, backend: StoreBackend) -> ShellConfig {
    ShellConfig {
        data_dir: dir.to_path_buf(),
        store_backend: backend,
        ..ShellConfig::default()
    }
}

fn reload_roundtrip(backend: StoreBackend) {
    let tmp = tempdir().expect("create tempdir");
    let config = config_for(tmp.path(), backend);

    let (preset_id, hidden) = {
        let store = open_store(&config).expect("open");
        let mut engine = VisibilityEngine::load(builtin_registry(), store).expect("load");
        engine.toggle("news").expect("hide news");
        engine.toggle("weather").expect("hide weather");
        let preset = engine.save_preset("Evening").expect("save");
        (preset.id, engine.hidden().clone())
    };

    let store = open_store(&config).expect("reopen");
    let engine = VisibilityEngine::load(builtin_registry(), store).expect("reload");
    assert_eq!(engine.hidden(), &hidden);
    assert_eq!(engine.active_preset(), Some(preset_id.as_str()));
    let preset = engine.preset(&preset_id).expect("preset persisted");
    assert_eq!(preset.label, "Evening");
    assert!(preset.hidden_ids.iter().any(|id| id == "news"));
}

#[test]
fn sqlite_backend_keeps_visibility_state() {
    reload_roundtrip(StoreBackend::Sqlite);
}

#[test]
fn json_backend_keeps_visibility_state() {
    reload_roundtrip(StoreBackend::JsonFile);
}

#[test]
fn shell_and_module_keys_share_one_store() {
    let tmp = tempdir().expect("create tempdir");
    let store: SharedStore = open_store(&config_for(tmp.path(), StoreBackend::Sqlite)).expect("open");
    let mut engine = VisibilityEngine::load(builtin_registry(), store.clone()).expect("load");
    engine.show_all().expect("show all");

    let module = ScopedStore::new(store.clone(), "tasks".into());
    module.put("items", &Vec::<String>::new()).expect("module put");

    let shell_keys = store.keys_with_prefix("shell/").expect("list");
    let module_keys = store.keys_with_prefix("module/").expect("list");
    assert!(!shell_keys.is_empty());
    assert_eq!(module_keys.len(), 1);
}

#[test]
fn failed_commit_does_not_reach_disk() {
    let tmp = tempdir().expect("create tempdir");
    let config = config_for(tmp.path(), StoreBackend::Sqlite);

    let preset_id = {
        let store = open_store(&config).expect("open");
        let mut engine = VisibilityEngine::load(builtin_registry(), store).expect("load");
        engine.save_preset("Evening").expect("save").id
    };

    // Reject any write to the preset list so the commit fails after the hidden set.
    let conn = rusqlite::Connection::open(config.sqlite_path()).expect("raw connection");
    conn.execute_batch(
        "CREATE TRIGGER reject_presets BEFORE UPDATE ON kv \
         WHEN NEW.key = 'shell/custom_presets' \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .expect("install trigger");

    {
        let store = open_store(&config).expect("reopen");
        let mut engine = VisibilityEngine::load(builtin_registry(), store).expect("load");
        assert!(engine.toggle("news").is_err());
        assert!(engine.is_visible("news"));
    }

    conn.execute_batch("DROP TRIGGER reject_presets;").expect("drop trigger");
    let store = open_store(&config).expect("reopen");
    let engine = VisibilityEngine::load(builtin_registry(), store).expect("reload");
    assert!(engine.is_visible("news"));
    assert_eq!(engine.active_preset(), Some(preset_id.as_str()));
    let preset = engine.preset(&preset_id).expect("preset persisted");
    assert!(!preset.hidden_ids.iter().any(|id| id == "news"));
}
