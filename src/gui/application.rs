use crate::actions;
use crate::config::{LoadKind, PanelCommand};
use crate::displaycontext::DisplayContext;
use crate::gui::display_panel::DisplayPanel;
use crate::gui::overlay_list_panel::overlay_list_panel;
use crate::gui::settings_window::settings_window;
use crate::gui::widget_list::PanelGroup;
use crate::props::TargetId;
use crate::strings::STRINGS;
use crate::widgets::SPEC_REGISTRY;
use crate::APP_INFO;
use bevy::prelude::*;
use bevy_egui::egui::ThemePreference;
use bevy_egui::{egui, EguiContexts};
use crossbeam_channel::{Receiver, Sender};
use egui_file_dialog::FileDialog;
use home::home_dir;
use preferences::Preferences;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const PANEL_NAME: &str = "OverlayDisplayPanel";

#[derive(Clone, Debug, PartialEq)]
pub enum FileDialogState {
    Open { target: TargetId, kind: LoadKind },
    None,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct GuiSettingsContainer {
    pub selected_path: PathBuf,
    pub view_3d: bool,
    pub collapsed_groups: Vec<String>,
    pub dark_mode: bool,
    pub x: f32,
    pub y: f32,
    pub theme_preference: ThemePreference,
}

impl GuiSettingsContainer {
    pub fn new() -> GuiSettingsContainer {
        GuiSettingsContainer {
            selected_path: home_dir().unwrap_or_else(|| PathBuf::from("/")),
            view_3d: false,
            collapsed_groups: vec![],
            dark_mode: true,
            x: 1400.0,
            y: 900.0,
            theme_preference: ThemePreference::System,
        }
    }
}

impl Default for GuiSettingsContainer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OverlayExplorer {
    pub gui_settings: GuiSettingsContainer,
    pub display_ctx: DisplayContext,
    pub panel: DisplayPanel,
    pub file_dialog_state: FileDialogState,
    pub file_dialog: FileDialog,
    pub settings_window_open: bool,
    commands_tx: Sender<PanelCommand>,
    commands_rx: Receiver<PanelCommand>,
    status: Option<String>,
}

impl OverlayExplorer {
    pub fn new(gui_settings: GuiSettingsContainer) -> Self {
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let mut display_ctx = DisplayContext::new(gui_settings.view_3d);
        let mut panel = DisplayPanel::new(
            PANEL_NAME,
            &mut display_ctx,
            SPEC_REGISTRY.clone(),
            Arc::new(STRINGS.clone()),
            commands_tx.clone(),
        );
        for group in PanelGroup::ALL {
            if gui_settings.collapsed_groups.iter().any(|g| g == group.key()) {
                panel.set_expanded(group, false);
            }
        }

        let file_dialog = FileDialog::default()
            .default_size([600.0, 400.0])
            .add_file_filter(
                "Colour maps",
                Arc::new(|p| {
                    let ext = p.extension().unwrap_or_default().to_ascii_lowercase();
                    ext == "cmap" || ext == "txt"
                }),
            )
            .add_file_filter(
                "Vertex data",
                Arc::new(|p| {
                    let ext = p.extension().unwrap_or_default().to_ascii_lowercase();
                    ext == "txt" || ext == "csv"
                }),
            )
            .initial_directory(gui_settings.selected_path.clone());

        Self {
            gui_settings,
            display_ctx,
            panel,
            file_dialog_state: FileDialogState::None,
            file_dialog,
            settings_window_open: false,
            commands_tx,
            commands_rx,
            status: None,
        }
    }

    /// Handles the requests sent by panel buttons since the last frame.
    pub fn handle_commands(&mut self) {
        let commands: Vec<PanelCommand> = self.commands_rx.try_iter().collect();
        for command in commands {
            match command {
                PanelCommand::LoadColourMap { target } => {
                    self.open_dialog(target, LoadKind::ColourMap, "Colour maps")
                }
                PanelCommand::LoadVertexData { target } => {
                    self.open_dialog(target, LoadKind::VertexData, "Vertex data")
                }
                PanelCommand::OpenFile { target, kind, path } => {
                    self.open_file(target, kind, path)
                }
            }
        }
    }

    fn open_dialog(&mut self, target: TargetId, kind: LoadKind, filter: &str) {
        self.file_dialog_state = FileDialogState::Open { target, kind };
        self.file_dialog.config_mut().default_file_filter = Some(filter.to_string());
        self.file_dialog.pick_file();
    }

    fn open_file(&mut self, target: TargetId, kind: LoadKind, path: PathBuf) {
        let result = match kind {
            LoadKind::ColourMap => actions::load_colour_map(&mut self.display_ctx, target, &path)
                .map(|key| format!("Loaded colour map {key}")),
            LoadKind::VertexData => actions::load_vertex_data(&mut self.display_ctx, target, &path)
                .map(|value| format!("Loaded vertex data {value}")),
        };
        match result {
            Ok(message) => {
                log::info!("{message}");
                self.status = Some(message);
            }
            Err(err) => {
                log::error!("error loading {}: {err}", path.display());
                self.status = Some(err.to_string());
            }
        }
        if let Some(parent) = path.parent() {
            self.gui_settings.selected_path = parent.to_path_buf();
        }
    }

    fn file_dialog_ui(&mut self, ctx: &egui::Context) {
        let FileDialogState::Open { target, kind } = self.file_dialog_state else {
            return;
        };
        if let Some(path) = self.file_dialog.update(ctx).picked() {
            self.file_dialog_state = FileDialogState::None;
            if let Err(err) = self.commands_tx.send(PanelCommand::OpenFile {
                target,
                kind,
                path: path.to_path_buf(),
            }) {
                log::error!("error sending open file command: {err}");
            }
        }
    }

    /// Stores the expanded state of the panel groups in the settings.
    pub fn sync_settings(&mut self) {
        self.gui_settings.collapsed_groups = PanelGroup::ALL
            .iter()
            .filter(|group| !self.panel.is_expanded(**group))
            .map(|group| group.key().to_string())
            .collect();
    }

    pub fn save_settings(&mut self) {
        self.sync_settings();
        let prefs_key = "config/gui";
        if let Err(err) = self.gui_settings.save(&APP_INFO, prefs_key) {
            log::error!("error saving gui_settings: {err:?}");
        }
    }

    fn center_panel(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(overlay) = self.display_ctx.selected_overlay() else {
                ui.centered_and_justified(|ui| {
                    ui.weak(format!(
                        "Add an overlay with {} to edit its display settings.",
                        egui_phosphor::regular::PLUS
                    ));
                });
                return;
            };
            ui.heading(overlay.name.as_str());
            egui::Grid::new("overlay summary")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    if let Some(display) = self.display_ctx.display(overlay.id) {
                        ui.label("Overlay type");
                        ui.label(display.opts().kind().to_string());
                        ui.end_row();
                    }
                    ui.label("Volumes");
                    ui.label(overlay.num_volumes().to_string());
                    ui.end_row();
                    let [min, max] = overlay.data_range();
                    ui.label("Data range");
                    ui.label(format!("{min} to {max}"));
                    ui.end_row();
                    ui.label("Controls");
                    ui.label(self.panel.navigation_order().len().to_string());
                    ui.end_row();
                });
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status.as_str());
            }
        });
    }

    fn right_panel(&mut self, ctx: &egui::Context, right_panel_width: f32) {
        egui::SidePanel::right("Display Panel")
            .min_width(right_panel_width)
            .max_width(right_panel_width)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Display settings");
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.panel.show(ui, &mut self.display_ctx);
                });
            });
    }

    pub fn frame(&mut self, ctx: &egui::Context) {
        let left_panel_width = 260.0;
        let right_panel_width = 420.0;

        self.panel.process_events(&mut self.display_ctx);
        self.handle_commands();

        overlay_list_panel(
            ctx,
            &mut self.display_ctx,
            left_panel_width,
            &mut self.settings_window_open,
        );
        self.right_panel(ctx, right_panel_width);
        self.center_panel(ctx);

        if self.settings_window_open {
            settings_window(ctx, self);
        }
        self.file_dialog_ui(ctx);

        // Changes made this frame are shown once their notifications are handled.
        self.panel.process_events(&mut self.display_ctx);

        let size = ctx.screen_rect().size();
        self.gui_settings.x = size.x;
        self.gui_settings.y = size.y;
    }
}

pub fn update_gui(
    mut contexts: EguiContexts,
    mut explorer: NonSendMut<OverlayExplorer>,
    mut fonts_installed: Local<bool>,
) -> Result {
    let ctx = contexts.ctx_mut()?;
    if !*fonts_installed {
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        ctx.set_fonts(fonts);
        ctx.set_theme(explorer.gui_settings.theme_preference);
        *fonts_installed = true;
    }
    explorer.frame(ctx);
    Ok(())
}

pub fn save_gui_settings(
    mut exit_events: EventReader<AppExit>,
    mut explorer: NonSendMut<OverlayExplorer>,
) {
    if exit_events.read().next().is_some() {
        explorer.save_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::displaycontext::{Intent, Overlay};
    use crate::props::PropertyValue;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("overlay-explorer-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_collapsed_groups_are_restored() {
        let mut settings = GuiSettingsContainer::new();
        settings.collapsed_groups = vec!["opts".to_string()];
        let mut explorer = OverlayExplorer::new(settings);
        explorer
            .display_ctx
            .add_overlay(Overlay::image("t1", &[8, 8, 8], Intent::None, [0.0, 1.0]));
        explorer.display_ctx.select(0);
        explorer.panel.process_events(&mut explorer.display_ctx);

        assert_eq!(explorer.panel.list().is_expanded(PanelGroup::Opts), Some(false));
        assert_eq!(explorer.panel.list().is_expanded(PanelGroup::Display), Some(true));

        explorer.panel.set_expanded(PanelGroup::Display, false);
        explorer.sync_settings();
        assert_eq!(explorer.gui_settings.collapsed_groups, ["display", "opts"]);
    }

    #[test]
    fn test_load_button_opens_dialog_and_picked_file_is_applied() {
        let mut explorer = OverlayExplorer::new(GuiSettingsContainer::new());
        explorer
            .display_ctx
            .add_overlay(Overlay::image("t1", &[8, 8, 8], Intent::None, [0.0, 1.0]));
        explorer.display_ctx.select(0);
        let overlay = explorer.display_ctx.selected_overlay().unwrap().id;
        let opts = explorer
            .display_ctx
            .display(overlay)
            .unwrap()
            .opts()
            .target_id();

        explorer
            .commands_tx
            .send(PanelCommand::LoadColourMap { target: opts })
            .unwrap();
        explorer.handle_commands();
        assert_eq!(
            explorer.file_dialog_state,
            FileDialogState::Open {
                target: opts,
                kind: LoadKind::ColourMap
            }
        );

        let dir = scratch_dir();
        let path = dir.join("Ember.cmap");
        std::fs::write(&path, "0 0 0\n1 0.3 0\n1 1 0.6\n").unwrap();
        explorer
            .commands_tx
            .send(PanelCommand::OpenFile {
                target: opts,
                kind: LoadKind::ColourMap,
                path,
            })
            .unwrap();
        explorer.handle_commands();

        assert_eq!(
            explorer.display_ctx.target(opts).unwrap().get_property("cmap"),
            Some(PropertyValue::Choice("ember".into()))
        );
        assert_eq!(explorer.gui_settings.selected_path, dir);
        assert_eq!(explorer.status.as_deref(), Some("Loaded colour map ember"));
    }
}
