//! Configuration constants and structures for the OverDesk shell
//!
//! Runtime knobs are read once at startup from the environment (optionally
//! seeded from a `.env` file by the binaries) into a `ShellConfig` snapshot.

pub mod errors;
pub mod limits;
pub mod paths;

use std::path::PathBuf;
use std::time::Duration;

/// Which `PreferenceStore` backend the shell persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    JsonFile,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Some(Self::Sqlite),
            "json" | "file" => Some(Self::JsonFile),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub data_dir: PathBuf,
    pub store_backend: StoreBackend,
    /// Launch non embed-only modules in their own window instead of mounting inline.
    pub multi_window: bool,
    pub update_url: Option<String>,
    pub update_interval: Duration,
    pub http_timeout: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_backend: StoreBackend::Sqlite,
            multi_window: false,
            update_url: None,
            update_interval: Duration::from_secs(limits::DEFAULT_UPDATE_INTERVAL_SECS),
            http_timeout: Duration::from_millis(limits::DEFAULT_HTTP_TIMEOUT_MS),
        }
    }
}

impl ShellConfig {
    /// Construct a config snapshot from process environment variables.
    ///
    /// - OVERDESK_DATA_DIR: data root (default: platform data dir + "OverDesk")
    /// - OVERDESK_STORE: sqlite | json | memory (default: sqlite)
    /// - OVERDESK_MULTI_WINDOW: open modules in detached windows (default: off)
    /// - OVERDESK_UPDATE_URL: update manifest endpoint (default: none, checks disabled)
    /// - OVERDESK_UPDATE_INTERVAL_SECS: seconds between update checks (default: 3600)
    /// - OVERDESK_HTTP_TIMEOUT_MS: per-request timeout for module HTTP calls (default: 10000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup("OVERDESK_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let store_backend = match lookup("OVERDESK_STORE") {
            Some(raw) => StoreBackend::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(target = "overdesk", value = %raw, "unknown OVERDESK_STORE, using sqlite");
                StoreBackend::Sqlite
            }),
            None => defaults.store_backend,
        };

        let multi_window = lookup("OVERDESK_MULTI_WINDOW")
            .map(|v| is_truthy(&v))
            .unwrap_or(defaults.multi_window);

        let update_url = lookup("OVERDESK_UPDATE_URL").filter(|v| !v.trim().is_empty());

        let update_interval = lookup("OVERDESK_UPDATE_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.update_interval);

        let http_timeout = lookup("OVERDESK_HTTP_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.http_timeout);

        Self {
            data_dir,
            store_backend,
            multi_window,
            update_url,
            update_interval,
            http_timeout,
        }
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(paths::SQLITE_DB_FILE)
    }

    pub fn json_store_path(&self) -> PathBuf {
        self.data_dir.join(paths::JSON_STORE_FILE)
    }

    /// Human-readable summary for diagnostics.
    pub fn summary(&self) -> String {
        format!(
            "data_dir={}, store={:?}, multi_window={}, update_url={}, update_interval_secs={}",
            self.data_dir.display(),
            self.store_backend,
            self.multi_window,
            self.update_url.as_deref().unwrap_or("none"),
            self.update_interval.as_secs(),
        )
    }
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(paths::APP_DIR_NAME)
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
