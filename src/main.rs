#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::sync::Arc;

use dotenvy::dotenv;
use tauri::async_runtime::spawn;
use tauri::{AppHandle, Manager, Runtime, State, WindowEvent};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};
use tokio::time::interval;

use overdesk::commands::{self, ShellState};
use overdesk::core::{emit_or_log, init_tracing, TauriEventSink};
use overdesk::host::events::EventSink;
use overdesk::host::windows::{WindowHosts, MAIN_WINDOW};
use overdesk::modules::system::SystemMonitor;
use overdesk::updater::{check_for_update, UpdateStatus};
use overdesk::visibility::VisibilityEngine;
use overdesk::window::{HeadlessWindow, TauriWindow, WindowControl};
use overdesk::{builtin_registry, open_store, ModuleHost, ShellConfig};

fn main() {
    init_tracing();
    if let Err(err) = dotenv() {
        tracing::debug!(target = "overdesk", "no .env loaded: {err}");
    }

    let config = ShellConfig::from_env();
    tracing::info!(target = "overdesk", config = %config.summary(), "starting shell");

    let store = match open_store(&config) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(target = "overdesk", code = err.code(), error = %err, "failed to open preference store");
            std::process::exit(1);
        }
    };
    let http = match reqwest::Client::builder().timeout(config.http_timeout).build() {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(target = "overdesk", error = %err, "http client build failed; using defaults");
            reqwest::Client::new()
        }
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_fs::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, shortcut, event| {
                    if event.state == ShortcutState::Pressed
                        && shortcut.matches(TOGGLE_MODIFIERS, TOGGLE_KEY)
                    {
                        toggle_main_window(app);
                    }
                })
                .build(),
        )
        .setup(move |app| {
            let handle = app.handle().clone();
            let window: Arc<dyn WindowControl> = match app.get_webview_window(MAIN_WINDOW) {
                Some(main) => Arc::new(TauriWindow::new(main)),
                None => {
                    tracing::warn!(target = "overdesk", "main window missing; window control disabled");
                    Arc::new(HeadlessWindow)
                }
            };
            let sink: Arc<dyn EventSink> = Arc::new(TauriEventSink::new(handle.clone()));

            let mut engine = VisibilityEngine::load(builtin_registry(), store.clone())?;
            engine.set_event_sink(sink.clone());
            let visibility = engine.into_shared();

            let host = ModuleHost::new(visibility.clone(), store.clone())
                .with_http(http.clone())
                .with_window(window.clone())
                .with_sink(sink)
                .with_multi_window(config.multi_window);

            app.manage(ShellState {
                visibility,
                hosts: WindowHosts::new(host),
                config: config.clone(),
                http: http.clone(),
                window,
                monitor: Arc::new(SystemMonitor::new()),
            });
            app.global_shortcut().register(toggle_shortcut())?;
            spawn_update_check(handle);
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                let label = window.label().to_string();
                let handle = window.app_handle().clone();
                spawn(async move {
                    let state: State<'_, ShellState> = handle.state();
                    state.hosts.close(&label).await;
                });
            }
        })
        .invoke_handler(tauri::generate_handler![
            // Registry and visibility
            commands::list_modules,
            commands::visible_modules,
            commands::search_modules,
            commands::toggle_module,
            commands::show_all,
            // Presets
            commands::list_presets,
            commands::apply_preset,
            commands::save_preset,
            commands::rename_preset,
            commands::delete_preset,
            // Host
            commands::open_module,
            commands::back_to_menu,
            commands::module_action,
            commands::host_state,
            // Shell
            commands::check_update,
            commands::hide_window,
            commands::system_stats,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

const TOGGLE_MODIFIERS: Modifiers = Modifiers::CONTROL.union(Modifiers::SHIFT);
const TOGGLE_KEY: Code = Code::Space;

/// Ctrl+Shift+Space shows or hides the main window from anywhere.
fn toggle_shortcut() -> Shortcut {
    Shortcut::new(Some(TOGGLE_MODIFIERS), TOGGLE_KEY)
}

fn toggle_main_window<R: Runtime>(app: &AppHandle<R>) {
    let Some(state) = app.try_state::<ShellState>() else {
        return;
    };
    if let Err(err) = state.window.toggle_visibility() {
        tracing::warn!(target = "overdesk", code = err.code(), error = %err, "toggle main window failed");
    }
}

/// Periodic update check. Disabled when no manifest URL is configured.
fn spawn_update_check(app_handle: tauri::AppHandle) {
    spawn(async move {
        let (url, period, http) = {
            let state: State<'_, ShellState> = app_handle.state();
            let Some(url) = state.config.update_url.clone() else {
                tracing::debug!(target = "overdesk", "update checks disabled");
                return;
            };
            (url, state.config.update_interval, state.http.clone())
        };

        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            match check_for_update(&http, &url, env!("CARGO_PKG_VERSION")).await {
                Ok(UpdateStatus::Available(manifest)) => {
                    emit_or_log(&app_handle, "update.available", manifest);
                }
                Ok(UpdateStatus::UpToDate) => {}
                Err(err) => {
                    tracing::warn!(target = "overdesk", code = err.code(), error = %err, "update check failed");
                }
            }
        }
    });
}
