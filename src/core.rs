use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::registry::ModuleRegistry;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

pub static APP_NAME: &str = "OverDesk";

/// Process-wide registry over the compiled-in catalog.
pub static BUILTIN_REGISTRY: Lazy<Arc<ModuleRegistry>> =
    Lazy::new(|| Arc::new(ModuleRegistry::builtin()));

pub fn builtin_registry() -> Arc<ModuleRegistry> {
    BUILTIN_REGISTRY.clone()
}

// ----------------------------------------------------------------------------
// Tracing
// ----------------------------------------------------------------------------

/// Install the fmt subscriber filtered by `RUST_LOG`. Safe to call twice.
pub fn init_tracing() {
    #[cfg(feature = "otel_spans")]
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
        tracing::info!(target = "overdesk", "tracing initialized");
    }
    #[cfg(not(feature = "otel_spans"))]
    {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .try_init();
    }
}

// ----------------------------------------------------------------------------
// Event emission
// ----------------------------------------------------------------------------

/// Tauri v2 rejects dots in event names.
pub fn normalize_event_name(event: &str) -> String {
    if event.contains('.') {
        event.replace('.', "-")
    } else {
        event.to_string()
    }
}

#[cfg(feature = "desktop")]
pub fn emit_or_log<R: tauri::Runtime, T>(app_handle: &tauri::AppHandle<R>, event: &str, payload: T)
where
    T: serde::Serialize + Clone,
{
    use tauri::Emitter;
    let evt = normalize_event_name(event);
    if let Err(err) = app_handle.emit(&evt, payload) {
        tracing::warn!(target = "overdesk", event, error = %err, "failed to emit event");
    }
}

/// Forwards host events to the webview.
#[cfg(feature = "desktop")]
pub struct TauriEventSink<R: tauri::Runtime> {
    app_handle: tauri::AppHandle<R>,
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> TauriEventSink<R> {
    pub fn new(app_handle: tauri::AppHandle<R>) -> Self {
        Self { app_handle }
    }
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> crate::host::events::EventSink for TauriEventSink<R> {
    fn emit(&self, event: crate::host::events::HostEvent) {
        emit_or_log(&self.app_handle, event.name(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_dash_normalized() {
        assert_eq!(normalize_event_name("visibility.changed"), "visibility-changed");
        assert_eq!(normalize_event_name("host-mounted"), "host-mounted");
    }

    #[test]
    fn builtin_registry_is_shared() {
        let a = builtin_registry();
        let b = builtin_registry();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains("config"));
    }
}
