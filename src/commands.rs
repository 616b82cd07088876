//! Tauri commands exposed to the webview.
//!
//! Every command returns `Result<_, String>` so errors reach the frontend as
//! their coded display string.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Runtime, State, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::config::ShellConfig;
use crate::host::lifecycle::{ActionOutcome, ModuleAction, ModuleView};
use crate::host::windows::{SharedHost, WindowHosts};
use crate::host::{HostState, OpenOutcome, WindowRequest};
use crate::modules::system::{SystemMonitor, SystemStats};
use crate::presets::Preset;
use crate::registry::ModuleDescriptor;
use crate::updater::{check_for_update, UpdateStatus};
use crate::visibility::{SharedVisibility, VisibilityStats};
use crate::window::{TauriWindow, WindowControl};

pub struct ShellState {
    pub visibility: SharedVisibility,
    /// Module hosts keyed by the calling window's label.
    pub hosts: WindowHosts,
    pub config: ShellConfig,
    pub http: reqwest::Client,
    pub window: Arc<dyn WindowControl>,
    pub monitor: Arc<SystemMonitor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetList {
    pub presets: Vec<Preset>,
    pub active_preset: Option<String>,
    pub suggested_name: String,
    pub stats: VisibilityStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub outcome: ActionOutcome,
    pub state: HostState,
    pub view: Option<ModuleView>,
}

#[tauri::command]
pub fn list_modules(state: State<'_, ShellState>) -> Vec<ModuleDescriptor> {
    state.visibility.read().registry().iter().cloned().collect()
}

#[tauri::command]
pub fn visible_modules(state: State<'_, ShellState>) -> Vec<ModuleDescriptor> {
    state
        .visibility
        .read()
        .visible()
        .into_iter()
        .cloned()
        .collect()
}

/// Search covers visible modules only; hidden ones are reachable from config.
#[tauri::command]
pub fn search_modules(state: State<'_, ShellState>, query: String) -> Vec<ModuleDescriptor> {
    let engine = state.visibility.read();
    engine
        .registry()
        .search(&query)
        .into_iter()
        .filter(|m| engine.is_visible(m.id.as_str()))
        .cloned()
        .collect()
}

#[tauri::command]
pub fn toggle_module(state: State<'_, ShellState>, id: String) -> Result<bool, String> {
    state
        .visibility
        .write()
        .toggle(&id)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn apply_preset(state: State<'_, ShellState>, preset_id: String) -> Result<(), String> {
    state
        .visibility
        .write()
        .apply_preset(&preset_id)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn save_preset(state: State<'_, ShellState>, name: Option<String>) -> Result<Preset, String> {
    let mut engine = state.visibility.write();
    let name = name.unwrap_or_else(|| engine.suggested_preset_name());
    engine.save_preset(&name).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn rename_preset(
    state: State<'_, ShellState>,
    preset_id: String,
    name: String,
) -> Result<(), String> {
    state
        .visibility
        .write()
        .rename_preset(&preset_id, &name)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_preset(state: State<'_, ShellState>, preset_id: String) -> Result<(), String> {
    state
        .visibility
        .write()
        .delete_preset(&preset_id)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn show_all(state: State<'_, ShellState>) -> Result<(), String> {
    state.visibility.write().show_all().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_presets(state: State<'_, ShellState>) -> PresetList {
    let engine = state.visibility.read();
    PresetList {
        presets: engine.presets().into_iter().cloned().collect(),
        active_preset: engine.active_preset().map(str::to_string),
        suggested_name: engine.suggested_preset_name(),
        stats: engine.stats(),
    }
}

/// Host owned by the calling window. Detached windows get theirs on first call.
async fn host_for<R: Runtime>(state: &ShellState, window: &WebviewWindow<R>) -> SharedHost {
    state
        .hosts
        .for_window(window.label(), || {
            Arc::new(TauriWindow::new(window.clone())) as Arc<dyn WindowControl>
        })
        .await
}

#[tauri::command]
pub async fn open_module<R: Runtime>(
    app: AppHandle<R>,
    window: WebviewWindow<R>,
    state: State<'_, ShellState>,
    id: String,
) -> Result<OpenOutcome, String> {
    #[cfg(feature = "otel_spans")]
    let _span = tracing::info_span!("open_module", id = %id, window = window.label());
    let host = host_for(&state, &window).await;
    let outcome = host.lock().await.launch(&id).await;
    if let OpenOutcome::Detached { window: request, .. } = &outcome {
        open_detached(&app, request)?;
    }
    Ok(outcome)
}

fn open_detached<R: Runtime>(app: &AppHandle<R>, request: &WindowRequest) -> Result<(), String> {
    WebviewWindowBuilder::new(app, &request.label, WebviewUrl::App(request.url.clone().into()))
        .title(&request.title)
        .inner_size(1000.0, 700.0)
        .build()
        .map(|_| ())
        .map_err(|e| format!("E-OVD-0300: failed to open window: {e}"))
}

#[tauri::command]
pub async fn back_to_menu<R: Runtime>(
    window: WebviewWindow<R>,
    state: State<'_, ShellState>,
) -> Result<bool, String> {
    let host = host_for(&state, &window).await;
    let left = host.lock().await.back().await;
    Ok(left)
}

#[tauri::command]
pub async fn module_action<R: Runtime>(
    window: WebviewWindow<R>,
    state: State<'_, ShellState>,
    name: String,
    payload: Option<Value>,
) -> Result<ActionResult, String> {
    let host = host_for(&state, &window).await;
    let mut host = host.lock().await;
    let action = ModuleAction::new(&name, payload.unwrap_or(Value::Null));
    let outcome = host.handle_action(action).await.map_err(|e| e.to_string())?;
    Ok(ActionResult {
        outcome,
        state: host.state(),
        view: host.render(),
    })
}

#[tauri::command]
pub async fn host_state<R: Runtime>(
    window: WebviewWindow<R>,
    state: State<'_, ShellState>,
) -> Result<(HostState, Option<ModuleView>), String> {
    let host = host_for(&state, &window).await;
    let host = host.lock().await;
    Ok((host.state(), host.render()))
}

#[tauri::command]
pub async fn check_update(state: State<'_, ShellState>) -> Result<Option<UpdateStatus>, String> {
    let Some(url) = state.config.update_url.as_deref() else {
        return Ok(None);
    };
    check_for_update(&state.http, url, env!("CARGO_PKG_VERSION"))
        .await
        .map(Some)
        .map_err(|err| {
            tracing::warn!(target = "overdesk", code = err.code(), error = %err, "manual update check failed");
            format!("{}: {}", err.code(), err.user_message())
        })
}

#[tauri::command]
pub fn hide_window(state: State<'_, ShellState>) -> Result<(), String> {
    state.window.hide().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn system_stats(state: State<'_, ShellState>) -> SystemStats {
    state.monitor.sample()
}
