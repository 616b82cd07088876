use overdesk::host::HostState;
use overdesk::{ModuleId, OpenOutcome};

use crate::support::{harness, live_mounts};

#[tokio::test]
async fn previous_module_releases_before_next_mounts() {
    let mut h = harness();
    h.host.open("camera").await;
    assert_eq!(h.host.held_devices(), vec!["camera".to_string()]);

    h.host.open("tasks").await;
    assert_eq!(
        h.log.entries(),
        vec![
            "mount(camera)",
            "acquire(camera)",
            "unmount(camera)",
            "release(camera)",
            "mount(tasks)",
        ]
    );
    assert!(h.host.held_devices().is_empty());
}

#[tokio::test]
async fn device_is_released_before_it_is_reacquired() {
    let mut h = harness();
    h.host.open("camera").await;
    h.host.back().await;
    h.host.open("camera").await;

    let release = h.log.position("release(camera)").expect("released");
    let second_acquire = h
        .log
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.as_str() == "acquire(camera)")
        .map(|(i, _)| i)
        .nth(1)
        .expect("acquired twice");
    assert!(release < second_acquire);
}

#[tokio::test]
async fn at_most_one_module_is_active() {
    let mut h = harness();
    assert_eq!(h.host.state(), HostState::Menu);

    for id in ["tasks", "notes", "camera", "timer", "notes", "tasks"] {
        h.host.open(id).await;
        assert_eq!(h.host.state(), HostState::Active(ModuleId::from(id)));
        assert_eq!(live_mounts(&h.log), 1, "after opening {id}");
    }

    assert!(h.host.back().await);
    assert_eq!(h.host.state(), HostState::Menu);
    assert_eq!(live_mounts(&h.log), 0);
    assert!(!h.host.back().await);
}

#[tokio::test]
async fn reopening_active_module_is_a_no_op() {
    let mut h = harness();
    h.host.open("tasks").await;
    let outcome = h.host.open("tasks").await;
    assert_eq!(
        outcome,
        OpenOutcome::AlreadyActive {
            id: ModuleId::from("tasks")
        }
    );
    assert_eq!(h.log.entries(), vec!["mount(tasks)"]);
}
