// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod bridge;
mod commands;
mod menu;
mod state;

use state::AppState;
use tabterm_ipc::{Router, Workspace};
use tabterm_pty::ShellCommand;
use tabterm_settings::SettingsStore;
use tauri::{Manager, RunEvent};

fn main() {
    let settings = SettingsStore::load_default();
    let shell = ShellCommand::detect();

    let log_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_log::Builder::default().level(log_level).build())
        .setup(move |app| {
            log::info!("starting with shell `{}`", shell.program);
            match settings.path() {
                Some(path) => log::info!("settings file: {}", path.display()),
                None => log::info!("settings are in memory only"),
            }

            let (router, handle, events) = Router::new(shell, settings);
            tauri::async_runtime::spawn(router.run());
            bridge::start_event_forwarder(app.handle().clone(), events);

            let workspace = Workspace::new(handle);
            app.manage(AppState::new(workspace.clone()));

            menu::build_menu(app)?;

            // Open the first tab so the window is never empty.
            tauri::async_runtime::spawn(async move {
                if let Err(e) = workspace.ensure_session().await {
                    log::error!("failed to open the first session: {e}");
                }
            });
            Ok(())
        })
        .on_menu_event(|app, event| menu::handle_menu_event(app, event.id().as_ref()))
        .invoke_handler(tauri::generate_handler![
            commands::session::create_session,
            commands::session::close_session,
            commands::session::write_input,
            commands::session::resize_session,
            commands::session::set_title,
            commands::session::focus_session,
            commands::session::list_sessions,
            commands::session::notify,
            commands::settings::get_settings,
            commands::settings::set_settings,
            commands::settings::theme_palette,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let RunEvent::Exit = event {
                log::info!("shutting down, closing all sessions");
                let workspace = app.state::<AppState>().workspace.clone();
                if let Err(e) = tauri::async_runtime::block_on(workspace.shutdown()) {
                    log::warn!("shutdown failed: {e}");
                }
            }
        });
}
