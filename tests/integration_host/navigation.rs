use serde_json::json;

use overdesk::host::events::HostEvent;
use overdesk::host::lifecycle::{ActionOutcome, ModuleAction};
use overdesk::host::{HostState, IgnoreReason};
use overdesk::{ModuleId, OpenOutcome};

use crate::support::harness;

#[tokio::test]
async fn unknown_id_is_ignored() {
    let mut h = harness();
    h.host.open("tasks").await;

    let outcome = h.host.open("not-a-module").await;
    assert_eq!(
        outcome,
        OpenOutcome::Ignored {
            id: "not-a-module".into(),
            reason: IgnoreReason::UnknownModule
        }
    );
    assert_eq!(h.host.state(), HostState::Active(ModuleId::from("tasks")));
    assert_eq!(h.log.entries(), vec!["mount(tasks)"]);
}

#[tokio::test]
async fn hidden_module_cannot_be_opened() {
    let mut h = harness();
    h.visibility.write().toggle("notes").expect("hide notes");

    let outcome = h.host.open("notes").await;
    assert!(matches!(
        outcome,
        OpenOutcome::Ignored {
            reason: IgnoreReason::Hidden,
            ..
        }
    ));
    assert_eq!(h.host.state(), HostState::Menu);
    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::Ignored { id, .. } if id == "notes")));
}

#[tokio::test]
async fn games_are_hidden_until_enabled() {
    let mut h = harness();
    let outcome = h.host.open("game").await;
    assert!(matches!(outcome, OpenOutcome::Ignored { .. }));

    h.visibility.write().toggle("game").expect("show game");
    let outcome = h.host.open("game").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
}

#[tokio::test]
async fn switch_to_unmounts_then_mounts_target() {
    let mut h = harness();
    h.host.open("tasks").await;
    let outcome = h
        .host
        .handle_action(ModuleAction::new("switch", json!({ "id": "notes" })))
        .await
        .expect("switch");
    assert_eq!(outcome, ActionOutcome::SwitchTo(ModuleId::from("notes")));
    assert_eq!(h.host.state(), HostState::Active(ModuleId::from("notes")));
    assert_eq!(
        h.log.entries(),
        vec!["mount(tasks)", "unmount(tasks)", "mount(notes)"]
    );
}

#[tokio::test]
async fn back_action_returns_to_menu() {
    let mut h = harness();
    h.host.open("timer").await;
    h.host
        .handle_action(ModuleAction::named("back"))
        .await
        .expect("back");
    assert_eq!(h.host.state(), HostState::Menu);
    assert!(h.host.render().is_none());
}

#[tokio::test]
async fn webview_modules_mount_through_fallback() {
    let mut h = harness();
    let outcome = h.host.open("news").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
    let view = serde_json::to_value(h.host.render().expect("view")).expect("serialize");
    assert_eq!(view["kind"], "webview");
    assert_eq!(view["id"], "news");
}
