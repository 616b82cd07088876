//! Static build information.

use async_trait::async_trait;
use serde::Serialize;

use crate::core::APP_NAME;
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView,
};
use crate::registry::ModuleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub license: &'static str,
    pub description: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        name: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        license: env!("CARGO_PKG_LICENSE"),
        description: env!("CARGO_PKG_DESCRIPTION"),
    }
}

pub struct AboutModule {
    id: ModuleId,
}

impl AboutModule {
    pub fn new() -> Self {
        Self {
            id: ModuleId::from("about"),
        }
    }
}

#[async_trait]
impl Module for AboutModule {
    async fn mount(&mut self, _ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn render(&self) -> ModuleView {
        ModuleView::ready(&self.id, build_info())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        _ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "license" => Ok(ActionOutcome::SwitchTo(ModuleId::from("license"))),
            _ => Err(action.unknown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_package_version() {
        let info = build_info();
        assert_eq!(info.name, "OverDesk");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }
}
