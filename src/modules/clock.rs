//! Local clock, refreshed every tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::limits::MODULE_TICK_MS;
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView,
};
use crate::registry::ModuleId;

pub struct ClockModule {
    id: ModuleId,
    now: Arc<Mutex<DateTime<Local>>>,
    hour12: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClockView {
    time: String,
    date: String,
    hour12: bool,
}

impl ClockModule {
    pub fn new() -> Self {
        Self {
            id: ModuleId::from("clock"),
            now: Arc::new(Mutex::new(Local::now())),
            hour12: false,
        }
    }

    fn format(&self, now: DateTime<Local>) -> ClockView {
        let time = if self.hour12 {
            now.format("%I:%M:%S %p").to_string()
        } else {
            now.format("%H:%M:%S").to_string()
        };
        ClockView {
            time,
            date: now.format("%A, %d %B %Y").to_string(),
            hour12: self.hour12,
        }
    }
}

#[async_trait]
impl Module for ClockModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        self.hour12 = ctx.store.get_or_default("hour12")?;
        *self.now.lock() = Local::now();
        let now = self.now.clone();
        ctx.scope
            .spawn_interval(Duration::from_millis(MODULE_TICK_MS), move || {
                *now.lock() = Local::now();
            });
        Ok(())
    }

    fn render(&self) -> ModuleView {
        let now = *self.now.lock();
        ModuleView::ready(&self.id, self.format(now))
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "format" => {
                self.hour12 = !self.hour12;
                ctx.store.put("hour12", &self.hour12)?;
                Ok(ActionOutcome::Handled)
            }
            _ => Err(action.unknown()),
        }
    }
}
