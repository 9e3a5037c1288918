//! Native menu bar, built from [`MenuCommand`].

use tabterm_ipc::MenuCommand;
use tauri::menu::{MenuBuilder, MenuItem, MenuItemBuilder, SubmenuBuilder};
use tauri::{AppHandle, Manager, Runtime};

use crate::state::AppState;

fn item<R: Runtime>(app: &AppHandle<R>, command: MenuCommand) -> tauri::Result<MenuItem<R>> {
    MenuItemBuilder::with_id(command.id(), command.label())
        .accelerator(command.accelerator())
        .build(app)
}

/// Build the native menu bar.
pub fn build_menu(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = app.handle();

    let app_menu = SubmenuBuilder::new(handle, "tabterm")
        .about(None)
        .separator()
        .quit()
        .build()?;

    let file_menu = SubmenuBuilder::new(handle, "File")
        .item(&item(handle, MenuCommand::NewSession)?)
        .separator()
        .item(&item(handle, MenuCommand::CloseSession)?)
        .build()?;

    let edit_menu = SubmenuBuilder::new(handle, "Edit")
        .cut()
        .copy()
        .paste()
        .select_all()
        .build()?;

    let view_menu = SubmenuBuilder::new(handle, "View")
        .item(&item(handle, MenuCommand::NextSession)?)
        .item(&item(handle, MenuCommand::PreviousSession)?)
        .separator()
        .item(&item(handle, MenuCommand::ToggleTheme)?)
        .item(&item(handle, MenuCommand::IncreaseFontSize)?)
        .item(&item(handle, MenuCommand::DecreaseFontSize)?)
        .build()?;

    let window_menu = SubmenuBuilder::new(handle, "Window").minimize().build()?;

    let menu = MenuBuilder::new(handle)
        .item(&app_menu)
        .item(&file_menu)
        .item(&edit_menu)
        .item(&view_menu)
        .item(&window_menu)
        .build()?;

    app.set_menu(menu)?;
    Ok(())
}

/// Run the command behind a clicked menu item.
pub fn handle_menu_event(app: &AppHandle, id: &str) {
    let Some(command) = MenuCommand::from_id(id) else {
        return;
    };
    let workspace = app.state::<AppState>().workspace.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(e) = workspace.run_menu(command).await {
            log::warn!("menu command {} failed: {e}", command.id());
        }
    });
}
