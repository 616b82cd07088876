//! Photo booth camera. Holds a camera lease while mounted; runs fullscreen.

use async_trait::async_trait;
use serde::Serialize;

use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::registry::ModuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Idle,
    Streaming,
    Unavailable,
}

#[derive(Serialize)]
struct CameraView {
    status: CameraStatus,
    captures: u32,
}

pub struct CameraModule {
    id: ModuleId,
    status: CameraStatus,
    captures: u32,
    notice: Option<Notice>,
}

impl CameraModule {
    pub fn new() -> Self {
        Self {
            id: ModuleId::from("camera"),
            status: CameraStatus::Idle,
            captures: 0,
            notice: None,
        }
    }

    pub fn status(&self) -> CameraStatus {
        self.status
    }

    /// Permission or device failures stay inside the module.
    async fn start(&mut self, ctx: &mut ModuleContext) {
        match ctx.devices.open_camera().await {
            Ok(lease) => {
                ctx.scope.hold(lease);
                self.status = CameraStatus::Streaming;
                self.notice = None;
            }
            Err(err) => {
                tracing::warn!(target = "overdesk", code = err.code(), error = %err, "camera unavailable");
                self.status = CameraStatus::Unavailable;
                self.notice = Some(err.notice());
            }
        }
    }
}

#[async_trait]
impl Module for CameraModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        self.captures = 0;
        self.start(ctx).await;
        Ok(())
    }

    async fn unmount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        ctx.scope.release_all();
        self.status = CameraStatus::Idle;
        Ok(())
    }

    fn render(&self) -> ModuleView {
        let view = CameraView {
            status: self.status,
            captures: self.captures,
        };
        ModuleView::ready(&self.id, view).with_notice(self.notice.clone())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "capture" => {
                if self.status == CameraStatus::Streaming {
                    self.captures += 1;
                }
            }
            "retry" => {
                if self.status != CameraStatus::Streaming {
                    self.start(ctx).await;
                }
            }
            _ => return Err(action.unknown()),
        }
        Ok(ActionOutcome::Handled)
    }
}
