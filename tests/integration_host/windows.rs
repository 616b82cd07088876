use std::sync::Arc;

use overdesk::host::windows::{WindowHosts, MAIN_WINDOW};
use overdesk::host::HostState;
use overdesk::window::{RecordingWindow, WindowControl};
use overdesk::{ModuleId, OpenOutcome};

use crate::support::harness_with;

fn recording() -> Arc<dyn WindowControl> {
    Arc::new(RecordingWindow::new())
}

#[tokio::test]
async fn detached_window_mounts_its_module_inline() {
    let h = harness_with(true, |_| Default::default());
    let log = h.log.clone();
    let hosts = WindowHosts::new(h.host);

    let main = hosts.main();
    main.lock().await.launch("notes").await;
    let request = match main.lock().await.launch("tasks").await {
        OpenOutcome::Detached { window, .. } => window,
        other => panic!("expected detached window, got {other:?}"),
    };

    let detached = hosts.for_window(&request.label, recording).await;
    let outcome = detached.lock().await.launch("tasks").await;
    assert!(matches!(outcome, OpenOutcome::Mounted { faulted: false, .. }));
    assert_eq!(detached.lock().await.state(), HostState::Active(ModuleId::from("tasks")));

    // The main window's module is untouched.
    assert_eq!(main.lock().await.state(), HostState::Active(ModuleId::from("notes")));
    assert_eq!(log.entries(), vec!["mount(notes)", "mount(tasks)"]);
}

#[tokio::test]
async fn window_label_resolves_to_the_same_host() {
    let h = harness_with(true, |_| Default::default());
    let hosts = WindowHosts::new(h.host);

    let first = hosts.for_window("win-tasks-1", recording).await;
    let again = hosts
        .for_window("win-tasks-1", || panic!("host should be reused"))
        .await;
    assert!(Arc::ptr_eq(&first, &again));

    let main = hosts
        .for_window(MAIN_WINDOW, || panic!("main host is created at startup"))
        .await;
    assert!(Arc::ptr_eq(&main, &hosts.main()));
    assert_eq!(hosts.detached_labels(), vec!["win-tasks-1".to_string()]);
}

#[tokio::test]
async fn closing_a_window_unmounts_only_its_module() {
    let h = harness_with(true, |_| Default::default());
    let log = h.log.clone();
    let hosts = WindowHosts::new(h.host);

    hosts.main().lock().await.launch("config").await;
    let camera = hosts.for_window("win-camera-7", recording).await;
    camera.lock().await.launch("camera").await;
    assert_eq!(camera.lock().await.held_devices(), vec!["camera".to_string()]);

    assert!(hosts.close("win-camera-7").await);
    assert!(!hosts.close("win-camera-7").await);
    assert!(!hosts.close(MAIN_WINDOW).await);

    assert_eq!(
        log.entries(),
        vec!["mount(camera)", "acquire(camera)", "unmount(camera)", "release(camera)"]
    );
    assert!(hosts.detached_labels().is_empty());
    assert_eq!(
        hosts.main().lock().await.state(),
        HostState::Active(ModuleId::from("config"))
    );
}
