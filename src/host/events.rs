//! Host-level notifications.
//!
//! The desktop build forwards these to the webview via `emit_or_log`; tests
//! collect them with `RecordingSink`.

use parking_lot::Mutex;
use serde::Serialize;

use crate::registry::ModuleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Mounted { id: ModuleId },
    Unmounted { id: ModuleId },
    Ignored { id: String, reason: String },
    Fault { id: ModuleId, code: String, message: String },
    WindowRequested { id: ModuleId, label: String },
    VisibilityChanged { hidden: usize, active_preset: Option<String> },
}

impl HostEvent {
    /// Event channel name (dot form; dash-normalized on emit).
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::Mounted { .. } => "host.mounted",
            HostEvent::Unmounted { .. } => "host.unmounted",
            HostEvent::Ignored { .. } => "host.ignored",
            HostEvent::Fault { .. } => "host.fault",
            HostEvent::WindowRequested { .. } => "host.window-requested",
            HostEvent::VisibilityChanged { .. } => "visibility.changed",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: HostEvent);
}

/// Sink that only logs.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: HostEvent) {
        tracing::debug!(target = "overdesk", event = event.name(), payload = ?event, "host event");
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: HostEvent) {
        self.events.lock().push(event);
    }
}
