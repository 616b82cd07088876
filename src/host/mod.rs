//! Module host.
//!
//! Holds at most one mounted module. Every transition between modules goes
//! through `Menu`: the previous module is unmounted and its scope released
//! before the next one is constructed. Module failures (errors or panics) are
//! contained here and turned into a `ModuleView::Fault`.

pub mod events;
pub mod lifecycle;
pub mod windows;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;
use thiserror::Error;

use crate::modules::ModuleFactory;
use crate::registry::{ModuleId, ModuleRegistry, Presentation};
use crate::store::{ScopedStore, SharedStore};
use crate::visibility::SharedVisibility;
use crate::window::{HeadlessWindow, WindowControl};

use events::{EventSink, HostEvent, LogSink};
use lifecycle::{
    ActionOutcome, MediaDevices, Module, ModuleAction, ModuleContext, ModuleError, ModuleView,
    NoMediaDevices, Notice,
};

/// Modules that always render inline, even in multi-window mode.
pub const EMBED_ONLY_MODULES: [&str; 4] = ["config", "settings", "socials", "music"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum HostState {
    Menu,
    Active(ModuleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    UnknownModule,
    Hidden,
}

/// New webview window for a detached module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowRequest {
    pub label: String,
    pub title: String,
    pub url: String,
}

impl WindowRequest {
    pub fn for_module(id: &ModuleId, label: &str, millis: i64) -> Self {
        Self {
            label: format!("win-{id}-{millis}"),
            title: format!("OverDesk - {label}"),
            url: format!("index.html?app={id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpenOutcome {
    Mounted { id: ModuleId, faulted: bool },
    AlreadyActive { id: ModuleId },
    Ignored { id: String, reason: IgnoreReason },
    Detached { id: ModuleId, window: WindowRequest },
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("E-OVD-0500: no module is active")]
    NoActiveModule,
    #[error("{0}")]
    Module(#[from] ModuleError),
}

impl HostError {
    pub fn code(&self) -> &'static str {
        match self {
            HostError::NoActiveModule => crate::config::errors::ERR_NO_ACTIVE_MODULE,
            HostError::Module(err) => err.code(),
        }
    }
}

struct ActiveModule {
    id: ModuleId,
    module: Box<dyn Module>,
    ctx: ModuleContext,
    presentation: Presentation,
    fault: Option<Notice>,
}

pub struct ModuleHost {
    registry: Arc<ModuleRegistry>,
    visibility: SharedVisibility,
    factory: ModuleFactory,
    store: SharedStore,
    http: reqwest::Client,
    devices: Arc<dyn MediaDevices>,
    window: Arc<dyn WindowControl>,
    sink: Arc<dyn EventSink>,
    multi_window: bool,
    active: Option<ActiveModule>,
}

impl ModuleHost {
    /// Host over the built-in module set with headless defaults.
    pub fn new(visibility: SharedVisibility, store: SharedStore) -> Self {
        let registry = visibility.read().registry().clone();
        let factory = ModuleFactory::builtin(visibility.clone());
        Self {
            registry,
            visibility,
            factory,
            store,
            http: reqwest::Client::new(),
            devices: Arc::new(NoMediaDevices),
            window: Arc::new(HeadlessWindow),
            sink: Arc::new(LogSink),
            multi_window: false,
            active: None,
        }
    }

    pub fn with_factory(mut self, factory: ModuleFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_devices(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_window(mut self, window: Arc<dyn WindowControl>) -> Self {
        self.window = window;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_multi_window(mut self, enabled: bool) -> Self {
        self.multi_window = enabled;
        self
    }

    /// Host for a detached window. Shares the store, services and module set
    /// with `self` but always mounts inline, so a `?app=<id>` window renders
    /// its module instead of requesting another window.
    pub fn detached(&self, window: Arc<dyn WindowControl>) -> ModuleHost {
        Self {
            registry: self.registry.clone(),
            visibility: self.visibility.clone(),
            factory: self.factory.clone(),
            store: self.store.clone(),
            http: self.http.clone(),
            devices: self.devices.clone(),
            window,
            sink: self.sink.clone(),
            multi_window: false,
            active: None,
        }
    }

    pub fn visibility(&self) -> &SharedVisibility {
        &self.visibility
    }

    pub fn state(&self) -> HostState {
        match &self.active {
            Some(active) => HostState::Active(active.id.clone()),
            None => HostState::Menu,
        }
    }

    pub fn active_id(&self) -> Option<&ModuleId> {
        self.active.as_ref().map(|a| &a.id)
    }

    /// Devices currently held by the mounted module.
    pub fn held_devices(&self) -> Vec<String> {
        self.active
            .as_ref()
            .map(|a| a.ctx.scope.held_devices())
            .unwrap_or_default()
    }

    fn ignore(&self, id: &str, reason: IgnoreReason) -> OpenOutcome {
        tracing::warn!(target = "overdesk", id, ?reason, "open ignored");
        self.sink.emit(HostEvent::Ignored {
            id: id.to_string(),
            reason: format!("{reason:?}"),
        });
        OpenOutcome::Ignored {
            id: id.to_string(),
            reason,
        }
    }

    fn check_openable(&self, id: &str) -> Result<ModuleId, OpenOutcome> {
        let Some(descriptor) = self.registry.get(id) else {
            return Err(self.ignore(id, IgnoreReason::UnknownModule));
        };
        if !self.visibility.read().is_visible(id) {
            return Err(self.ignore(id, IgnoreReason::Hidden));
        }
        Ok(descriptor.id.clone())
    }

    /// Mount `id` inline. Unknown or hidden ids are ignored and the current
    /// state is kept.
    pub async fn open(&mut self, id: &str) -> OpenOutcome {
        #[cfg(feature = "otel_spans")]
        let _span = tracing::info_span!("host_open", id);

        if let Some(active) = &self.active {
            if active.id == id {
                return OpenOutcome::AlreadyActive {
                    id: active.id.clone(),
                };
            }
        }
        let id = match self.check_openable(id) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };

        self.back().await;
        self.mount(id).await
    }

    /// Like `open`, but in multi-window mode detachable modules produce a
    /// window request instead of mounting.
    pub async fn launch(&mut self, id: &str) -> OpenOutcome {
        if !self.multi_window || EMBED_ONLY_MODULES.contains(&id) {
            return self.open(id).await;
        }
        let id = match self.check_openable(id) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let label = self
            .registry
            .get(id.as_str())
            .map(|d| d.label.clone())
            .unwrap_or_else(|| id.to_string());
        let window = WindowRequest::for_module(&id, &label, chrono::Utc::now().timestamp_millis());
        tracing::info!(target = "overdesk", id = %id, label = %window.label, "module detached");
        self.sink.emit(HostEvent::WindowRequested {
            id: id.clone(),
            label: window.label.clone(),
        });
        OpenOutcome::Detached { id, window }
    }

    async fn mount(&mut self, id: ModuleId) -> OpenOutcome {
        let started = std::time::Instant::now();
        let presentation = self
            .registry
            .get(id.as_str())
            .map(|d| d.presentation)
            .unwrap_or_default();
        let mut module = self.factory.create(&id);
        let mut ctx = ModuleContext::new(
            id.clone(),
            ScopedStore::new(self.store.clone(), id.clone()),
            self.http.clone(),
            self.devices.clone(),
        );

        if presentation == Presentation::Fullscreen {
            self.present_fullscreen(true);
        }

        let result = AssertUnwindSafe(module.mount(&mut ctx)).catch_unwind().await;
        let fault = match flatten(result) {
            Ok(()) => None,
            Err(err) => Some(self.record_fault(&id, "mount", &err)),
        };
        let faulted = fault.is_some();

        tracing::info!(
            target = "overdesk",
            id = %id,
            faulted,
            duration_ms = started.elapsed().as_millis() as u64,
            "module mounted"
        );
        self.sink.emit(HostEvent::Mounted { id: id.clone() });
        self.active = Some(ActiveModule {
            id: id.clone(),
            module,
            ctx,
            presentation,
            fault,
        });
        OpenOutcome::Mounted { id, faulted }
    }

    /// Unmount the active module and return to the menu. Returns false when
    /// already at the menu.
    pub async fn back(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };
        #[cfg(feature = "otel_spans")]
        let _span = tracing::info_span!("host_back", id = %active.id);

        let result = AssertUnwindSafe(active.module.unmount(&mut active.ctx))
            .catch_unwind()
            .await;
        if let Err(err) = flatten(result) {
            tracing::warn!(target = "overdesk", id = %active.id, error = %err, "unmount failed; forcing release");
        }
        active.ctx.scope.release_all();
        if active.presentation == Presentation::Fullscreen {
            self.present_fullscreen(false);
        }
        tracing::info!(target = "overdesk", id = %active.id, "module unmounted");
        self.sink.emit(HostEvent::Unmounted {
            id: active.id.clone(),
        });
        true
    }

    /// Route an action to the active module.
    pub async fn handle_action(&mut self, action: ModuleAction) -> Result<ActionOutcome, HostError> {
        let active = self.active.as_mut().ok_or(HostError::NoActiveModule)?;
        if active.fault.is_some() {
            tracing::debug!(target = "overdesk", id = %active.id, action = %action.name, "action ignored, module faulted");
            return Ok(ActionOutcome::Handled);
        }
        let name = action.name.clone();
        let result = AssertUnwindSafe(active.module.handle(action, &mut active.ctx))
            .catch_unwind()
            .await;
        let outcome = match flatten(result) {
            Ok(outcome) => outcome,
            Err(ModuleError::InvalidAction(reason)) => {
                tracing::warn!(target = "overdesk", id = %active.id, action = %name, %reason, "invalid action");
                return Err(HostError::Module(ModuleError::InvalidAction(reason)));
            }
            Err(err) => {
                let id = active.id.clone();
                let notice = self.record_fault(&id, "handle", &err);
                if let Some(active) = self.active.as_mut() {
                    active.fault = Some(notice);
                }
                return Ok(ActionOutcome::Handled);
            }
        };

        match &outcome {
            ActionOutcome::Handled => {}
            ActionOutcome::Back => {
                self.back().await;
            }
            ActionOutcome::SwitchTo(target) => {
                let target = target.clone();
                self.open(target.as_str()).await;
            }
        }
        Ok(outcome)
    }

    /// Current view of the active module, or `None` at the menu.
    pub fn render(&self) -> Option<ModuleView> {
        let active = self.active.as_ref()?;
        if let Some(notice) = &active.fault {
            return Some(ModuleView::Fault {
                id: active.id.clone(),
                notice: notice.clone(),
            });
        }
        match std::panic::catch_unwind(AssertUnwindSafe(|| active.module.render())) {
            Ok(view) => Some(view),
            Err(payload) => {
                let err = ModuleError::Panic(panic_message(payload));
                tracing::error!(target = "overdesk", id = %active.id, error = %err, "render panicked");
                Some(ModuleView::Fault {
                    id: active.id.clone(),
                    notice: err.notice(),
                })
            }
        }
    }

    fn record_fault(&self, id: &ModuleId, phase: &str, err: &ModuleError) -> Notice {
        tracing::error!(target = "overdesk", id = %id, phase, code = err.code(), error = %err, "module fault contained");
        let notice = err.notice();
        self.sink.emit(HostEvent::Fault {
            id: id.clone(),
            code: notice.code.clone(),
            message: notice.message.clone(),
        });
        notice
    }

    fn present_fullscreen(&self, on: bool) {
        let result = self
            .window
            .set_resizable(true)
            .and_then(|_| self.window.set_fullscreen(on));
        if let Err(err) = result {
            tracing::warn!(target = "overdesk", fullscreen = on, code = err.code(), error = %err, "window presentation change failed");
        }
    }
}

fn flatten<T>(
    result: Result<Result<T, ModuleError>, Box<dyn std::any::Any + Send>>,
) -> Result<T, ModuleError> {
    match result {
        Ok(inner) => inner,
        Err(payload) => Err(ModuleError::Panic(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_request_shape() {
        let req = WindowRequest::for_module(&ModuleId::from("regex"), "Regex", 1_700_000_000_000);
        assert_eq!(req.label, "win-regex-1700000000000");
        assert_eq!(req.title, "OverDesk - Regex");
        assert_eq!(req.url, "index.html?app=regex");
    }

    #[test]
    fn host_state_serializes_tagged() {
        let json = serde_json::to_value(HostState::Active(ModuleId::from("tasks"))).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "active", "id": "tasks" }));
        let json = serde_json::to_value(HostState::Menu).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "menu" }));
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(5u8)), "unknown panic");
    }
}
