use overdesk::host::events::HostEvent;
use overdesk::host::lifecycle::{ActionOutcome, ModuleAction, ModuleError, ModuleView};
use overdesk::host::HostState;
use overdesk::{HostError, ModuleId, OpenOutcome};

use crate::support::{harness, harness_with, ScriptedBehavior};

fn fault_code(view: Option<ModuleView>) -> String {
    match view {
        Some(ModuleView::Fault { notice, .. }) => notice.code,
        other => panic!("expected fault view, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_mount_is_contained_and_back_still_works() {
    let mut h = harness_with(false, |id| ScriptedBehavior {
        fail_mount: id == "notes",
        ..Default::default()
    });

    let outcome = h.host.open("notes").await;
    assert_eq!(
        outcome,
        OpenOutcome::Mounted {
            id: ModuleId::from("notes"),
            faulted: true
        }
    );
    assert_eq!(fault_code(h.host.render()), "E-OVD-0402");

    assert!(h.host.back().await);
    assert_eq!(h.host.state(), HostState::Menu);

    let outcome = h.host.open("tasks").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
    assert!(!h.host.render().expect("view").is_fault());
}

#[tokio::test]
async fn panicking_mount_is_contained() {
    let mut h = harness_with(false, |id| ScriptedBehavior {
        panic_mount: id == "timer",
        ..Default::default()
    });

    h.host.open("timer").await;
    assert_eq!(fault_code(h.host.render()), "E-OVD-0406");
    assert_eq!(h.host.state(), HostState::Active(ModuleId::from("timer")));

    h.host.open("notes").await;
    assert_eq!(h.host.state(), HostState::Active(ModuleId::from("notes")));
    assert!(!h.host.render().expect("view").is_fault());
}

#[tokio::test]
async fn panicking_action_faults_only_that_module() {
    let mut h = harness();
    h.host.open("tasks").await;

    let outcome = h
        .host
        .handle_action(ModuleAction::named("panic"))
        .await
        .expect("contained");
    assert_eq!(outcome, ActionOutcome::Handled);
    assert_eq!(fault_code(h.host.render()), "E-OVD-0406");

    // Further actions are swallowed while faulted.
    h.host
        .handle_action(ModuleAction::named("ping"))
        .await
        .expect("ignored");
    assert_eq!(fault_code(h.host.render()), "E-OVD-0406");

    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::Fault { id, .. } if id == "tasks")));

    assert!(h.host.back().await);
    h.host.open("notes").await;
    h.host
        .handle_action(ModuleAction::named("ping"))
        .await
        .expect("notes works");
    assert!(!h.host.render().expect("view").is_fault());
}

#[tokio::test]
async fn reopening_faulted_module_starts_fresh() {
    let mut h = harness();
    h.host.open("tasks").await;
    h.host
        .handle_action(ModuleAction::named("fail"))
        .await
        .expect("contained");
    assert_eq!(fault_code(h.host.render()), "E-OVD-0403");

    h.host.back().await;
    h.host.open("tasks").await;
    assert!(!h.host.render().expect("view").is_fault());
}

#[tokio::test]
async fn invalid_action_is_rejected_without_faulting() {
    let mut h = harness();
    h.host.open("tasks").await;
    let err = h
        .host
        .handle_action(ModuleAction::named("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HostError::Module(ModuleError::InvalidAction(_))
    ));
    assert!(!h.host.render().expect("view").is_fault());
}

#[tokio::test]
async fn action_without_active_module_errors() {
    let mut h = harness();
    let err = h
        .host
        .handle_action(ModuleAction::named("ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::NoActiveModule));
}
