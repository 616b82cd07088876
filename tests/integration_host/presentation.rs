use overdesk::host::HostState;
use overdesk::window::WindowCall;
use overdesk::OpenOutcome;

use crate::support::{harness, harness_with};

#[tokio::test]
async fn camera_enters_and_leaves_fullscreen() {
    let mut h = harness();
    h.host.open("camera").await;
    assert_eq!(
        h.window.calls(),
        vec![WindowCall::Resizable(true), WindowCall::Fullscreen(true)]
    );

    h.host.back().await;
    assert_eq!(
        h.window.calls(),
        vec![
            WindowCall::Resizable(true),
            WindowCall::Fullscreen(true),
            WindowCall::Resizable(true),
            WindowCall::Fullscreen(false),
        ]
    );
}

#[tokio::test]
async fn embedded_modules_leave_window_alone() {
    let mut h = harness();
    h.host.open("tasks").await;
    h.host.open("notes").await;
    h.host.back().await;
    assert!(h.window.calls().is_empty());
}

#[tokio::test]
async fn multi_window_launch_detaches_module() {
    let mut h = harness_with(true, |_| Default::default());
    let outcome = h.host.launch("tasks").await;
    match outcome {
        OpenOutcome::Detached { id, window } => {
            assert_eq!(id, "tasks");
            assert!(window.label.starts_with("win-tasks-"));
            assert_eq!(window.title, "OverDesk - Task");
            assert_eq!(window.url, "index.html?app=tasks");
        }
        other => panic!("expected detached window, got {other:?}"),
    }
    assert_eq!(h.host.state(), HostState::Menu);
    assert!(h.log.entries().is_empty());
}

#[tokio::test]
async fn embed_only_modules_mount_inline_in_multi_window_mode() {
    let mut h = harness_with(true, |_| Default::default());
    let outcome = h.host.launch("config").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
    assert_eq!(h.host.state(), HostState::Active("config".into()));
}

#[tokio::test]
async fn single_window_launch_mounts_inline() {
    let mut h = harness();
    let outcome = h.host.launch("tasks").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { .. }));
    assert_eq!(h.log.entries(), vec!["mount(tasks)"]);
}
