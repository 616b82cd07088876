//! One `ModuleHost` per webview window, keyed by window label.
//!
//! The main window owns the host created at startup. Detached windows get a
//! host of their own on first use, so mounting a module there never touches
//! what the main window shows.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::ModuleHost;
use crate::window::WindowControl;

pub const MAIN_WINDOW: &str = "main";

pub type SharedHost = Arc<tokio::sync::Mutex<ModuleHost>>;

pub struct WindowHosts {
    main: SharedHost,
    detached: Mutex<HashMap<String, SharedHost>>,
}

impl WindowHosts {
    pub fn new(main: ModuleHost) -> Self {
        Self {
            main: Arc::new(tokio::sync::Mutex::new(main)),
            detached: Mutex::new(HashMap::new()),
        }
    }

    pub fn main(&self) -> SharedHost {
        self.main.clone()
    }

    pub fn get(&self, label: &str) -> Option<SharedHost> {
        if label == MAIN_WINDOW {
            return Some(self.main.clone());
        }
        self.detached.lock().get(label).cloned()
    }

    /// Host for `label`, creating a detached host on first use. `window` is
    /// only called when a new host is built.
    pub async fn for_window<F>(&self, label: &str, window: F) -> SharedHost
    where
        F: FnOnce() -> Arc<dyn WindowControl>,
    {
        if let Some(host) = self.get(label) {
            return host;
        }
        let host = self.main.lock().await.detached(window());
        tracing::info!(target = "overdesk", label, "detached host created");
        self.detached
            .lock()
            .entry(label.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(host)))
            .clone()
    }

    /// Unmount and drop the host of a closed window. The main host is kept.
    pub async fn close(&self, label: &str) -> bool {
        let Some(host) = self.detached.lock().remove(label) else {
            return false;
        };
        host.lock().await.back().await;
        tracing::info!(target = "overdesk", label, "detached host closed");
        true
    }

    pub fn detached_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.detached.lock().keys().cloned().collect();
        labels.sort();
        labels
    }
}
