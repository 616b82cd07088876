pub mod catalog;
pub mod config;
pub mod core;
pub mod host;
pub mod modules;
pub mod presets;
pub mod registry;
pub mod store;
pub mod updater;
pub mod visibility;
pub mod window;

// Tauri command surface; only compiled into the desktop shell.
#[cfg(feature = "desktop")]
pub mod commands;

pub use crate::core::{builtin_registry, init_tracing, APP_NAME};
#[cfg(feature = "desktop")]
pub use crate::core::{emit_or_log, TauriEventSink};

pub use config::ShellConfig;
pub use host::{HostError, HostState, ModuleHost, OpenOutcome};
pub use presets::{Preset, PresetKind};
pub use registry::{ModuleDescriptor, ModuleId, ModuleRegistry};
pub use store::{open_store, PreferenceStore, SharedStore, StoreError, StoreKey};
pub use visibility::{SharedVisibility, VisibilityEngine, VisibilityError};
