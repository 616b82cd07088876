//! Dashboard configuration panel: module visibility and presets.
//!
//! Engine errors (mandatory ids, immutable presets) are shown as notices in
//! the panel rather than faulting the module.

use async_trait::async_trait;
use serde::Serialize;

use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::presets::Preset;
use crate::registry::{ModuleDescriptor, ModuleId};
use crate::visibility::{is_mandatory, SharedVisibility, VisibilityError, VisibilityStats};

pub struct ConfigModule {
    id: ModuleId,
    visibility: SharedVisibility,
    query: String,
    notice: Option<Notice>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Row<'a> {
    #[serde(flatten)]
    descriptor: &'a ModuleDescriptor,
    hidden: bool,
    mandatory: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigView<'a> {
    modules: Vec<Row<'a>>,
    presets: Vec<&'a Preset>,
    active_preset: Option<&'a str>,
    suggested_name: String,
    stats: VisibilityStats,
    query: &'a str,
}

impl ConfigModule {
    pub fn new(visibility: SharedVisibility) -> Self {
        Self {
            id: ModuleId::from("config"),
            visibility,
            query: String::new(),
            notice: None,
        }
    }

    fn report(&mut self, result: Result<(), VisibilityError>) -> Result<(), ModuleError> {
        match result {
            Ok(()) => {
                self.notice = None;
                Ok(())
            }
            Err(VisibilityError::Store(err)) => Err(ModuleError::Store(err)),
            Err(err) => {
                let code = match &err {
                    VisibilityError::Mandatory(_) => crate::config::errors::ERR_MANDATORY_MODULE,
                    VisibilityError::UnknownModule(_) => crate::config::errors::ERR_UNKNOWN_MODULE,
                    VisibilityError::PresetNotFound(_) => crate::config::errors::ERR_PRESET_NOT_FOUND,
                    _ => crate::config::errors::ERR_PRESET_IMMUTABLE,
                };
                self.notice = Some(Notice {
                    code: code.to_string(),
                    message: err.to_string(),
                });
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Module for ConfigModule {
    async fn mount(&mut self, _ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        self.query.clear();
        self.notice = None;
        Ok(())
    }

    fn render(&self) -> ModuleView {
        let engine = self.visibility.read();
        let matches = if self.query.trim().is_empty() {
            engine.registry().iter().collect()
        } else {
            engine.registry().search(&self.query)
        };
        let modules = matches
            .into_iter()
            .map(|m| Row {
                descriptor: m,
                hidden: engine.hidden().contains(m.id.as_str()),
                mandatory: is_mandatory(m.id.as_str()),
            })
            .collect();
        let view = ConfigView {
            modules,
            presets: engine.presets(),
            active_preset: engine.active_preset(),
            suggested_name: engine.suggested_preset_name(),
            stats: engine.stats(),
            query: &self.query,
        };
        ModuleView::ready(&self.id, view).with_notice(self.notice.clone())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        _ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        let result = match action.name.as_str() {
            "toggle" => {
                let id = action.str_arg("id")?;
                self.visibility.write().toggle(id).map(|_| ())
            }
            "apply" => self.visibility.write().apply_preset(action.str_arg("preset")?),
            "save" => {
                let mut engine = self.visibility.write();
                let name = match action.payload.get("name").and_then(|v| v.as_str()) {
                    Some(name) => name.to_string(),
                    None => engine.suggested_preset_name(),
                };
                engine.save_preset(&name).map(|_| ())
            }
            "rename" => self
                .visibility
                .write()
                .rename_preset(action.str_arg("preset")?, action.str_arg("name")?),
            "delete" => self.visibility.write().delete_preset(action.str_arg("preset")?),
            "show_all" => self.visibility.write().show_all(),
            "search" => {
                self.query = action.str_arg("query")?.to_string();
                Ok(())
            }
            _ => return Err(action.unknown()),
        };
        self.report(result)?;
        Ok(ActionOutcome::Handled)
    }
}
