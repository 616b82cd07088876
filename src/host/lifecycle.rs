//! Module contract: the trait every feature module implements and the
//! per-mount context the host hands it.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::errors;
use crate::registry::ModuleId;
use crate::store::{ScopedStore, StoreError};

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("E-OVD-0401: permission denied: {0}")]
    PermissionDenied(String),
    #[error("E-OVD-0402: network request failed: {0}")]
    Network(String),
    #[error("E-OVD-0403: could not parse data: {0}")]
    Parse(String),
    #[error("E-OVD-0404: unsupported: {0}")]
    Unsupported(String),
    #[error("E-OVD-0405: {0}")]
    Store(#[from] StoreError),
    #[error("E-OVD-0406: module panicked: {0}")]
    Panic(String),
    #[error("E-OVD-0407: invalid action: {0}")]
    InvalidAction(String),
}

impl ModuleError {
    pub fn code(&self) -> &'static str {
        match self {
            ModuleError::PermissionDenied(_) => errors::ERR_MODULE_PERMISSION,
            ModuleError::Network(_) => errors::ERR_MODULE_NETWORK,
            ModuleError::Parse(_) => errors::ERR_MODULE_PARSE,
            ModuleError::Unsupported(_) => errors::ERR_MODULE_UNSUPPORTED,
            ModuleError::Store(_) => errors::ERR_MODULE_STORE,
            ModuleError::Panic(_) => errors::ERR_MODULE_PANIC,
            ModuleError::InvalidAction(_) => errors::ERR_MODULE_ACTION,
        }
    }

    /// Text for the inline banner.
    pub fn user_message(&self) -> String {
        match self {
            ModuleError::PermissionDenied(what) => format!("Access to {what} was denied. This feature is unavailable."),
            ModuleError::Network(_) => "Offline or service unavailable. Try again later.".to_string(),
            ModuleError::Parse(_) => "Saved data could not be read and was reset.".to_string(),
            ModuleError::Unsupported(what) => format!("Not supported on this device: {what}."),
            ModuleError::Store(_) => "Could not save your changes.".to_string(),
            ModuleError::Panic(_) => "This module stopped working. Go back and reopen it.".to_string(),
            ModuleError::InvalidAction(action) => format!("Unknown action '{action}'."),
        }
    }

    pub fn notice(&self) -> Notice {
        Notice {
            code: self.code().to_string(),
            message: self.user_message(),
        }
    }
}

impl From<reqwest::Error> for ModuleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ModuleError::Parse(err.to_string())
        } else {
            ModuleError::Network(err.to_string())
        }
    }
}

/// Inline banner rendered inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub code: String,
    pub message: String,
}

/// What the shell draws for the mounted module.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleView {
    /// Native module state, rendered by the frontend's component for `id`.
    Ready {
        id: ModuleId,
        state: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<Notice>,
    },
    /// UI lives entirely in the webview bundle.
    Webview { id: ModuleId, entry: String },
    /// Error boundary output; back navigation stays available.
    Fault { id: ModuleId, notice: Notice },
}

impl ModuleView {
    pub fn ready(id: &ModuleId, state: impl Serialize) -> Self {
        ModuleView::Ready {
            id: id.clone(),
            state: serde_json::to_value(state).unwrap_or(Value::Null),
            notice: None,
        }
    }

    pub fn with_notice(self, notice: Option<Notice>) -> Self {
        match self {
            ModuleView::Ready { id, state, .. } => ModuleView::Ready { id, state, notice },
            other => other,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, ModuleView::Fault { .. })
    }
}

/// User intent routed to the active module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAction {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl ModuleAction {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(name, Value::Null)
    }

    pub fn str_arg(&self, key: &str) -> Result<&str, ModuleError> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| ModuleError::InvalidAction(format!("{}: missing '{key}'", self.name)))
    }

    pub fn u64_arg(&self, key: &str) -> Result<u64, ModuleError> {
        self.payload
            .get(key)
            .and_then(Value::as_u64)
            .ok_or_else(|| ModuleError::InvalidAction(format!("{}: missing '{key}'", self.name)))
    }

    pub fn i64_arg(&self, key: &str) -> Result<i64, ModuleError> {
        self.payload
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| ModuleError::InvalidAction(format!("{}: missing '{key}'", self.name)))
    }

    pub fn unknown(&self) -> ModuleError {
        ModuleError::InvalidAction(self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum ActionOutcome {
    Handled,
    /// Leave this module and open another one.
    SwitchTo(ModuleId),
    /// Return to the menu.
    Back,
}

/// "Still mounted" check handed to background work.
#[derive(Clone)]
pub struct MountToken {
    rx: watch::Receiver<bool>,
}

impl MountToken {
    pub fn is_live(&self) -> bool {
        !*self.rx.borrow()
    }

    /// Resolves once the owning scope has been released.
    pub async fn released(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// A held native device. Dropping or releasing it runs the release hook once.
pub struct DeviceLease {
    device: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl DeviceLease {
    pub fn new(device: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            device: device.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!(target = "overdesk", device = %self.device, "device released");
            release();
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DeviceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLease")
            .field("device", &self.device)
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// Platform media capabilities.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open_camera(&self) -> Result<DeviceLease, ModuleError>;
}

/// Provider for hosts without native capture.
pub struct NoMediaDevices;

#[async_trait]
impl MediaDevices for NoMediaDevices {
    async fn open_camera(&self) -> Result<DeviceLease, ModuleError> {
        Err(ModuleError::Unsupported("no camera device found".into()))
    }
}

/// Everything a module acquires while mounted. Released by the host after
/// `unmount`, and again on drop.
pub struct ResourceScope {
    module: ModuleId,
    cancel_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    leases: Vec<DeviceLease>,
}

impl ResourceScope {
    pub fn new(module: ModuleId) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            module,
            cancel_tx,
            tasks: Vec::new(),
            leases: Vec::new(),
        }
    }

    pub fn token(&self) -> MountToken {
        MountToken {
            rx: self.cancel_tx.subscribe(),
        }
    }

    pub fn is_released(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Spawn a task owned by this scope; it is aborted on release.
    pub fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(tokio::spawn(fut));
    }

    /// Run `fut` in the background and hand its result to `apply` only if the
    /// module is still mounted when it completes. Late results are dropped.
    pub fn spawn_guarded<T, F, A>(&mut self, fut: F, apply: A)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        A: FnOnce(T) + Send + 'static,
    {
        let token = self.token();
        let module = self.module.clone();
        self.spawn(async move {
            let value = fut.await;
            if token.is_live() {
                apply(value);
            } else {
                tracing::debug!(target = "overdesk", module = %module, "dropping late result");
            }
        });
    }

    /// Run `tick` every `period` until released.
    pub fn spawn_interval<F>(&mut self, period: std::time::Duration, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        let token = self.token();
        self.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                if !token.is_live() {
                    break;
                }
                tick();
            }
        });
    }

    pub fn hold(&mut self, lease: DeviceLease) {
        tracing::debug!(target = "overdesk", module = %self.module, device = lease.device(), "device acquired");
        self.leases.push(lease);
    }

    pub fn held_devices(&self) -> Vec<String> {
        self.leases.iter().map(|l| l.device().to_string()).collect()
    }

    pub fn running_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Cancel the token, abort every task, release every device. Idempotent.
    pub fn release_all(&mut self) {
        let _ = self.cancel_tx.send(true);
        let tasks = self.tasks.len();
        let leases = self.leases.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        for mut lease in self.leases.drain(..) {
            lease.release();
        }
        if tasks + leases > 0 {
            tracing::debug!(target = "overdesk", module = %self.module, tasks, leases, "scope released");
        }
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Per-mount services. A new context is built for every mount.
pub struct ModuleContext {
    pub id: ModuleId,
    pub store: ScopedStore,
    pub scope: ResourceScope,
    pub http: reqwest::Client,
    pub devices: Arc<dyn MediaDevices>,
}

impl ModuleContext {
    pub fn new(
        id: ModuleId,
        store: ScopedStore,
        http: reqwest::Client,
        devices: Arc<dyn MediaDevices>,
    ) -> Self {
        Self {
            scope: ResourceScope::new(id.clone()),
            id,
            store,
            http,
            devices,
        }
    }

    pub fn token(&self) -> MountToken {
        self.scope.token()
    }
}

#[async_trait]
pub trait Module: Send {
    /// Acquire resources and load persisted state. Called once per mount with
    /// a fresh context; must tolerate repeated mount/unmount cycles.
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError>;

    /// Release what `mount` acquired. Anything left in `ctx.scope` is released
    /// by the host afterwards regardless.
    async fn unmount(&mut self, _ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn render(&self) -> ModuleView;

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn lease_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut lease = DeviceLease::new("camera", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        lease.release();
        lease.release();
        drop(lease);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_all_stops_tasks_and_devices() {
        let released = Arc::new(AtomicUsize::new(0));
        let r = released.clone();
        let mut scope = ResourceScope::new(ModuleId::from("camera"));
        scope.hold(DeviceLease::new("camera", move || {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        scope.spawn(std::future::pending());
        assert_eq!(scope.running_tasks(), 1);
        let token = scope.token();
        assert!(token.is_live());

        scope.release_all();
        scope.release_all();
        assert!(!token.is_live());
        assert!(scope.is_released());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(scope.held_devices().is_empty());
    }

    #[tokio::test]
    async fn dropping_scope_releases_devices() {
        let released = Arc::new(AtomicUsize::new(0));
        let r = released.clone();
        {
            let mut scope = ResourceScope::new(ModuleId::from("camera"));
            scope.hold(DeviceLease::new("camera", move || {
                r.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn late_results_are_dropped_after_release() {
        let applied = Arc::new(AtomicUsize::new(0));
        let a = applied.clone();
        let mut scope = ResourceScope::new(ModuleId::from("weather"));
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
        let mut token = scope.token();
        scope.spawn_guarded(async move { rx.await.unwrap_or(0) }, move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        // Flip the token without aborting, so the task observes a dead mount.
        let _ = scope.cancel_tx.send(true);
        token.released().await;
        let _ = tx.send(7);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(applied.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn results_apply_while_mounted() {
        let applied = Arc::new(AtomicUsize::new(0));
        let a = applied.clone();
        let mut scope = ResourceScope::new(ModuleId::from("weather"));
        scope.spawn_guarded(async { 3usize }, move |v| {
            a.fetch_add(v, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(applied.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn errors_carry_codes_and_banners() {
        let err = ModuleError::PermissionDenied("camera".into());
        assert_eq!(err.code(), "E-OVD-0401");
        assert!(err.user_message().contains("camera"));
        assert!(err.to_string().starts_with("E-OVD-0401"));
        let notice = ModuleError::Network("timeout".into()).notice();
        assert_eq!(notice.code, "E-OVD-0402");
    }

    #[test]
    fn action_args_report_missing_keys() {
        let action = ModuleAction::new("add", serde_json::json!({ "text": "milk" }));
        assert_eq!(action.str_arg("text").unwrap(), "milk");
        assert!(matches!(action.u64_arg("id"), Err(ModuleError::InvalidAction(_))));
    }
}
