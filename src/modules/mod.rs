//! Built-in feature modules and the id -> constructor map.

pub mod about;
pub mod camera;
pub mod clock;
pub mod config;
pub mod notes;
pub mod system;
pub mod tasks;
pub mod timer;
pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::registry::ModuleId;
use crate::store::{ScopedStore, StoreError};
use crate::visibility::SharedVisibility;

type Constructor = Arc<dyn Fn(&ModuleId) -> Box<dyn Module> + Send + Sync>;

/// Maps module ids to constructors. Ids without a native constructor are
/// served by `WebviewModule`.
#[derive(Clone, Default)]
pub struct ModuleFactory {
    constructors: HashMap<String, Constructor>,
}

impl ModuleFactory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin(visibility: SharedVisibility) -> Self {
        let monitor = Arc::new(system::SystemMonitor::new());
        Self::empty()
            .with("tasks", |_| Box::new(tasks::TasksModule::new()))
            .with("notes", |_| Box::new(notes::NotesModule::new()))
            .with("timer", |_| Box::new(timer::TimerModule::new()))
            .with("clock", |_| Box::new(clock::ClockModule::new()))
            .with("weather", |_| {
                Box::new(weather::WeatherModule::new(weather::WeatherEndpoints::default()))
            })
            .with("camera", |_| Box::new(camera::CameraModule::new()))
            .with("about", |_| Box::new(about::AboutModule::new()))
            .with("system", move |_| Box::new(system::SystemModule::new(monitor.clone())))
            .with("config", move |_| {
                Box::new(config::ConfigModule::new(visibility.clone()))
            })
    }

    pub fn register<F>(&mut self, id: &str, constructor: F)
    where
        F: Fn(&ModuleId) -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.constructors.insert(id.to_string(), Arc::new(constructor));
    }

    pub fn with<F>(mut self, id: &str, constructor: F) -> Self
    where
        F: Fn(&ModuleId) -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.register(id, constructor);
        self
    }

    pub fn is_native(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn create(&self, id: &ModuleId) -> Box<dyn Module> {
        match self.constructors.get(id.as_str()) {
            Some(constructor) => constructor(id),
            None => Box::new(WebviewModule::new(id.clone())),
        }
    }
}

/// Module whose UI and state live in the webview bundle. The host still owns
/// its lifecycle; the only action it understands is a hand-off to another
/// module (e.g. database -> erd).
pub struct WebviewModule {
    id: ModuleId,
}

impl WebviewModule {
    pub fn new(id: ModuleId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Module for WebviewModule {
    async fn mount(&mut self, _ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn render(&self) -> ModuleView {
        ModuleView::Webview {
            id: self.id.clone(),
            entry: format!("index.html?app={}", self.id),
        }
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        _ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "open" => Ok(ActionOutcome::SwitchTo(ModuleId::from(action.str_arg("id")?))),
            "back" => Ok(ActionOutcome::Back),
            _ => Err(action.unknown()),
        }
    }
}

/// Load a persisted value; a malformed document yields the default and a
/// parse notice for the module banner.
pub(crate) fn load_or_notice<T>(
    store: &ScopedStore,
    name: &str,
) -> Result<(T, Option<Notice>), ModuleError>
where
    T: DeserializeOwned + Default,
{
    match store.get::<T>(name) {
        Ok(value) => Ok((value.unwrap_or_default(), None)),
        Err(StoreError::Serde(reason)) => {
            tracing::warn!(target = "overdesk", module = %store.module(), key = name, %reason, "malformed module state reset");
            Ok((T::default(), Some(ModuleError::Parse(reason).notice())))
        }
        Err(err) => Err(err.into()),
    }
}
