//! Scripted modules and devices that record lifecycle calls into a shared log.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use overdesk::host::events::RecordingSink;
use overdesk::host::lifecycle::{
    ActionOutcome, DeviceLease, MediaDevices, Module, ModuleAction, ModuleContext, ModuleError,
    ModuleView,
};
use overdesk::modules::ModuleFactory;
use overdesk::store::{MemoryStore, SharedStore};
use overdesk::visibility::{SharedVisibility, VisibilityEngine};
use overdesk::window::RecordingWindow;
use overdesk::{ModuleHost, ModuleId, ModuleRegistry};

#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }
}

/// Camera that logs acquire/release.
pub struct LoggingDevices {
    pub log: Log,
}

#[async_trait]
impl MediaDevices for LoggingDevices {
    async fn open_camera(&self) -> Result<DeviceLease, ModuleError> {
        self.log.push("acquire(camera)".into());
        let log = self.log.clone();
        Ok(DeviceLease::new("camera", move || {
            log.push("release(camera)".into());
        }))
    }
}

#[derive(Clone, Copy, Default)]
pub struct ScriptedBehavior {
    pub uses_device: bool,
    pub fail_mount: bool,
    pub panic_mount: bool,
}

pub struct ScriptedModule {
    id: ModuleId,
    log: Log,
    behavior: ScriptedBehavior,
    actions: u32,
}

impl ScriptedModule {
    pub fn new(id: &ModuleId, log: Log, behavior: ScriptedBehavior) -> Self {
        Self {
            id: id.clone(),
            log,
            behavior,
            actions: 0,
        }
    }
}

#[async_trait]
impl Module for ScriptedModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        self.log.push(format!("mount({})", self.id));
        if self.behavior.panic_mount {
            panic!("module {} exploded during mount", self.id);
        }
        if self.behavior.fail_mount {
            return Err(ModuleError::Network("upstream offline".into()));
        }
        if self.behavior.uses_device {
            let lease = ctx.devices.open_camera().await?;
            ctx.scope.hold(lease);
        }
        Ok(())
    }

    async fn unmount(&mut self, _ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        self.log.push(format!("unmount({})", self.id));
        Ok(())
    }

    fn render(&self) -> ModuleView {
        ModuleView::ready(&self.id, json!({ "actions": self.actions }))
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        _ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        self.actions += 1;
        match action.name.as_str() {
            "ping" => Ok(ActionOutcome::Handled),
            "panic" => panic!("module {} exploded during handle", self.id),
            "fail" => Err(ModuleError::Parse("unexpected payload".into())),
            "switch" => Ok(ActionOutcome::SwitchTo(ModuleId::from(action.str_arg("id")?))),
            "back" => Ok(ActionOutcome::Back),
            _ => Err(action.unknown()),
        }
    }
}

pub struct Harness {
    pub host: ModuleHost,
    pub log: Log,
    pub window: Arc<RecordingWindow>,
    pub sink: Arc<RecordingSink>,
    pub visibility: SharedVisibility,
    pub store: SharedStore,
}

/// Scripted modules registered for tasks, notes, timer and camera (device user).
pub fn harness() -> Harness {
    harness_with(false, |_| ScriptedBehavior::default())
}

pub fn harness_with(
    multi_window: bool,
    behavior: impl Fn(&str) -> ScriptedBehavior,
) -> Harness {
    let log = Log::default();
    let store: SharedStore = Arc::new(MemoryStore::new());
    let visibility = VisibilityEngine::load(Arc::new(ModuleRegistry::builtin()), store.clone())
        .expect("load visibility")
        .into_shared();

    let mut factory = ModuleFactory::empty();
    for id in ["tasks", "notes", "timer", "camera"] {
        let mut b = behavior(id);
        if id == "camera" {
            b.uses_device = true;
        }
        let module_log = log.clone();
        factory.register(id, move |mid| {
            Box::new(ScriptedModule::new(mid, module_log.clone(), b)) as Box<dyn Module>
        });
    }

    let window = Arc::new(RecordingWindow::new());
    let sink = Arc::new(RecordingSink::new());
    let host = ModuleHost::new(visibility.clone(), store.clone())
        .with_factory(factory)
        .with_devices(Arc::new(LoggingDevices { log: log.clone() }))
        .with_window(window.clone())
        .with_sink(sink.clone())
        .with_multi_window(multi_window);

    Harness {
        host,
        log,
        window,
        sink,
        visibility,
        store,
    }
}

/// Mounted minus unmounted module count; never above one.
pub fn live_mounts(log: &Log) -> i64 {
    log.entries().iter().fold(0i64, |acc, e| {
        if e.starts_with("mount(") {
            acc + 1
        } else if e.starts_with("unmount(") {
            acc - 1
        } else {
            acc
        }
    })
}
