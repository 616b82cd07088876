//! Built-in native modules driven through the host.

use std::sync::Arc;

use serde_json::{json, Value};

use overdesk::host::lifecycle::{ModuleAction, ModuleView};
use overdesk::host::HostState;
use overdesk::store::{MemoryStore, SharedStore};
use overdesk::visibility::VisibilityEngine;
use overdesk::{ModuleHost, ModuleId, ModuleRegistry, OpenOutcome};

fn builtin_host() -> (ModuleHost, SharedStore) {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let visibility = VisibilityEngine::load(Arc::new(ModuleRegistry::builtin()), store.clone())
        .expect("load")
        .into_shared();
    (ModuleHost::new(visibility, store.clone()), store)
}

fn ready_state(host: &ModuleHost) -> Value {
    match host.render() {
        Some(ModuleView::Ready { state, .. }) => state,
        other => panic!("expected ready view, got {other:?}"),
    }
}

#[tokio::test]
async fn tasks_survive_navigation() {
    let (mut host, _store) = builtin_host();
    host.open("tasks").await;
    host.handle_action(ModuleAction::new("add", json!({ "text": "Water the plants" })))
        .await
        .expect("add");
    host.back().await;

    host.open("notes").await;
    host.open("tasks").await;
    let state = ready_state(&host);
    assert_eq!(state["tasks"][0]["text"], "Water the plants");
    assert_eq!(state["remaining"], 1);
}

#[tokio::test]
async fn config_panel_hides_module_from_launcher() {
    let (mut host, _store) = builtin_host();
    host.open("config").await;
    host.handle_action(ModuleAction::new("toggle", json!({ "id": "notes" })))
        .await
        .expect("toggle");
    host.back().await;

    assert!(matches!(host.open("notes").await, OpenOutcome::Ignored { .. }));
    assert!(host.visibility().read().hidden().contains("notes"));
}

#[tokio::test]
async fn config_panel_reports_mandatory_toggle_inline() {
    let (mut host, _store) = builtin_host();
    host.open("config").await;
    host.handle_action(ModuleAction::new("toggle", json!({ "id": "about" })))
        .await
        .expect("handled");
    match host.render() {
        Some(ModuleView::Ready { notice: Some(notice), .. }) => {
            assert_eq!(notice.code, "E-OVD-0202")
        }
        other => panic!("expected inline notice, got {other:?}"),
    }
    assert!(!host.visibility().read().hidden().contains("about"));
}

#[tokio::test]
async fn about_links_to_license() {
    let (mut host, _store) = builtin_host();
    host.open("about").await;
    host.handle_action(ModuleAction::named("license"))
        .await
        .expect("license");
    assert_eq!(host.state(), HostState::Active(ModuleId::from("license")));
}

#[tokio::test]
async fn camera_without_device_shows_notice_not_fault() {
    let (mut host, _store) = builtin_host();
    let outcome = host.open("camera").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
    match host.render() {
        Some(ModuleView::Ready { notice: Some(notice), .. }) => {
            assert_eq!(notice.code, "E-OVD-0404")
        }
        other => panic!("expected inline notice, got {other:?}"),
    }
    assert!(host.held_devices().is_empty());
}

#[tokio::test]
async fn timer_state_persists_while_paused() {
    let (mut host, _store) = builtin_host();
    host.open("timer").await;
    host.handle_action(ModuleAction::new("adjust", json!({ "delta": 300 })))
        .await
        .expect("adjust");
    let before = ready_state(&host)["timeLeft"].clone();
    host.back().await;

    host.open("timer").await;
    assert_eq!(ready_state(&host)["timeLeft"], before);
}

#[tokio::test]
async fn system_module_reports_memory() {
    let (mut host, _store) = builtin_host();
    let outcome = host.open("system").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
    host.handle_action(ModuleAction::named("refresh"))
        .await
        .expect("refresh");
    let state = ready_state(&host);
    assert!(state["memTotal"].as_u64().unwrap_or(0) > 0);
    assert!(state["cpuCount"].as_u64().unwrap_or(0) > 0);
}
