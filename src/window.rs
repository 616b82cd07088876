//! Host window control.

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("E-OVD-0300: window operation failed: {0}")]
pub struct WindowError(pub String);

impl WindowError {
    pub fn code(&self) -> &'static str {
        crate::config::errors::ERR_WINDOW
    }
}

pub trait WindowControl: Send + Sync {
    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), WindowError>;
    fn set_resizable(&self, resizable: bool) -> Result<(), WindowError>;
    fn hide(&self) -> Result<(), WindowError>;
    fn toggle_visibility(&self) -> Result<(), WindowError>;
}

/// No window (CLI, tests that don't care).
pub struct HeadlessWindow;

impl WindowControl for HeadlessWindow {
    fn set_fullscreen(&self, _fullscreen: bool) -> Result<(), WindowError> {
        Ok(())
    }

    fn set_resizable(&self, _resizable: bool) -> Result<(), WindowError> {
        Ok(())
    }

    fn hide(&self) -> Result<(), WindowError> {
        Ok(())
    }

    fn toggle_visibility(&self) -> Result<(), WindowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCall {
    Fullscreen(bool),
    Resizable(bool),
    Hide,
    ToggleVisibility,
}

/// Records calls in order; used to assert presentation changes.
#[derive(Default)]
pub struct RecordingWindow {
    calls: Mutex<Vec<WindowCall>>,
}

impl RecordingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        self.calls.lock().clone()
    }
}

impl WindowControl for RecordingWindow {
    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), WindowError> {
        self.calls.lock().push(WindowCall::Fullscreen(fullscreen));
        Ok(())
    }

    fn set_resizable(&self, resizable: bool) -> Result<(), WindowError> {
        self.calls.lock().push(WindowCall::Resizable(resizable));
        Ok(())
    }

    fn hide(&self) -> Result<(), WindowError> {
        self.calls.lock().push(WindowCall::Hide);
        Ok(())
    }

    fn toggle_visibility(&self) -> Result<(), WindowError> {
        self.calls.lock().push(WindowCall::ToggleVisibility);
        Ok(())
    }
}

#[cfg(feature = "desktop")]
pub use desktop::TauriWindow;

#[cfg(feature = "desktop")]
mod desktop {
    use super::{WindowControl, WindowError};
    use tauri::{Runtime, WebviewWindow};

    pub struct TauriWindow<R: Runtime> {
        window: WebviewWindow<R>,
    }

    impl<R: Runtime> TauriWindow<R> {
        pub fn new(window: WebviewWindow<R>) -> Self {
            Self { window }
        }
    }

    fn map_err(err: tauri::Error) -> WindowError {
        WindowError(err.to_string())
    }

    impl<R: Runtime> WindowControl for TauriWindow<R> {
        fn set_fullscreen(&self, fullscreen: bool) -> Result<(), WindowError> {
            self.window.set_fullscreen(fullscreen).map_err(map_err)
        }

        fn set_resizable(&self, resizable: bool) -> Result<(), WindowError> {
            self.window.set_resizable(resizable).map_err(map_err)
        }

        fn hide(&self) -> Result<(), WindowError> {
            self.window.hide().map_err(map_err)
        }

        fn toggle_visibility(&self) -> Result<(), WindowError> {
            if self.window.is_visible().map_err(map_err)? {
                self.window.hide().map_err(map_err)
            } else {
                self.window.show().map_err(map_err)?;
                self.window.set_focus().map_err(map_err)
            }
        }
    }
}
