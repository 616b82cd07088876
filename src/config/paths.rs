//! Path, file and key-layout configuration

/// Directory and file names
pub const APP_DIR_NAME: &str = "OverDesk";
pub const SQLITE_DB_FILE: &str = "overdesk.db";
pub const JSON_STORE_FILE: &str = "overdesk-data.json";

/// Key layout
pub const SHELL_NAMESPACE: &str = "shell";
pub const MODULE_NAMESPACE: &str = "module";
pub const KEY_SEPARATOR: char = '/';

/// Shell keys
pub const HIDDEN_MODULES_KEY: &str = "hidden_modules";
pub const CUSTOM_PRESETS_KEY: &str = "custom_presets";
pub const ACTIVE_PRESET_KEY: &str = "active_preset";

/// Shell values are wrapped in an envelope carrying this version. Bump it when
/// the shape of any shell value changes; stale envelopes fall back to defaults.
pub const LAYOUT_VERSION: &str = "2";

/// SQLite schema
pub const SCHEMA_COMPONENT: &str = "kv";
pub const SCHEMA_VERSION: i64 = 1;
