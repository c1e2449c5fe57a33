use crate::gui::application::OverlayExplorer;
use crate::gui::widget_list::PanelGroup;
use bevy_egui::egui;
use bevy_egui::egui::{Align2, InnerResponse, Vec2, Visuals};
use egui_theme_switch::ThemeSwitch;

pub fn settings_window(
    ctx: &egui::Context,
    explorer: &mut OverlayExplorer,
) -> Option<InnerResponse<Option<()>>> {
    let mut open = explorer.settings_window_open;
    let response = egui::Window::new("Settings")
        .open(&mut open)
        .fixed_size(Vec2 { x: 400.0, y: 200.0 })
        .anchor(Align2::CENTER_CENTER, Vec2 { x: 0.0, y: 0.0 })
        .collapsible(false)
        .show(ctx, |ui| {
            egui::Grid::new("theme settings")
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Theme: ");
                    if ui
                        .add(ThemeSwitch::new(
                            &mut explorer.gui_settings.theme_preference,
                        ))
                        .changed()
                    {
                        ui.ctx().set_theme(explorer.gui_settings.theme_preference);
                    };
                    explorer.gui_settings.dark_mode = ui.visuals() == &Visuals::dark();
                    ui.end_row();

                    ui.label("3D view: ");
                    ui.checkbox(&mut explorer.gui_settings.view_3d, "")
                        .on_hover_text("Show the 3D settings group. Applied on the next start.");
                    ui.end_row();

                    ui.label("Groups: ");
                    ui.horizontal(|ui| {
                        for group in [PanelGroup::Display, PanelGroup::Opts] {
                            let mut expanded = explorer.panel.is_expanded(group);
                            if ui.checkbox(&mut expanded, group.key()).changed() {
                                explorer.panel.set_expanded(group, expanded);
                            }
                        }
                    });
                    ui.end_row();
                });
        });
    explorer.settings_window_open = open;
    response
}
