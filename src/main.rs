use crate::gui::application::{save_gui_settings, update_gui, GuiSettingsContainer, OverlayExplorer};
use crate::widgets::SPEC_REGISTRY;
use bevy::prelude::*;
use bevy::window::ExitCondition;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use preferences::{AppInfo, Preferences};

mod actions;
mod colourmaps;
mod config;
mod displaycontext;
mod gui;
mod props;
mod strings;
mod widgets;

const APP_INFO: AppInfo = AppInfo {
    name: "Overlay Display Explorer",
    author: "Linus Leo Stöckli",
};

fn setup(mut commands: Commands) {
    commands.spawn(Camera2d);
}

// --- Main ---
fn main() {
    let mut gui_settings = GuiSettingsContainer::new();
    let prefs_key = "config/gui";
    match GuiSettingsContainer::load(&APP_INFO, prefs_key) {
        Ok(settings) => gui_settings = settings,
        Err(_) => {
            // save default settings
            if let Err(err) = gui_settings.save(&APP_INFO, prefs_key) {
                log::error!("error in saving gui_settings send: {err:?}");
            }
        }
    }

    if gui_settings.x <= 0.0 || gui_settings.y <= 0.0 {
        let defaults = GuiSettingsContainer::new();
        gui_settings.x = defaults.x;
        gui_settings.y = defaults.y;
    }

    let explorer = OverlayExplorer::new(gui_settings.clone());

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                mode: bevy::window::WindowMode::Windowed,
                present_mode: bevy::window::PresentMode::AutoVsync,
                title: "Overlay Display Explorer".into(),
                resolution: (gui_settings.x, gui_settings.y).into(),
                ..default()
            }),
            exit_condition: ExitCondition::OnPrimaryClosed,
            close_when_requested: true,
        }))
        .add_plugins(EguiPlugin::default())
        .insert_non_send_resource(explorer)
        .add_systems(Startup, (setup, log_startup))
        .add_systems(EguiPrimaryContextPass, update_gui)
        .add_systems(Last, save_gui_settings)
        .run();
}

fn log_startup() {
    log::info!(
        "{} {} ({} {})",
        APP_INFO.name,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_BRANCH"),
        env!("GIT_HASH")
    );
    for err in SPEC_REGISTRY.validate() {
        log::error!("widget registry: {err}");
    }
}
