use crate::displaycontext::{DisplayContext, Intent, Overlay, OverlayId};
use crate::gui::utils::truncate_name;
use crate::props::{PropertyValue, Target};
use bevy_egui::egui;

/// Overlays that can be added from the list panel, with the menu entry
/// naming them.
pub const DEMO_OVERLAYS: [(&str, fn() -> Overlay); 8] = [
    ("T1 weighted volume", || {
        Overlay::image("sub-01_T1w.nii.gz", &[176, 256, 256], Intent::None, [0.0, 1043.0])
    }),
    ("Functional time series", || {
        Overlay::image("sub-01_task-rest_bold.nii.gz", &[64, 64, 36, 180], Intent::None, [0.0, 2816.0])
    }),
    ("Atlas labels", || {
        Overlay::image("HarvardOxford-cort.nii.gz", &[91, 109, 91], Intent::Other(1002), [0.0, 48.0])
    }),
    ("Principal diffusion direction", || {
        Overlay::image("dti_V1.nii.gz", &[96, 96, 60, 3], Intent::RgbVector, [-1.0, 1.0])
    }),
    ("Diffusion tensor", || {
        Overlay::image("dti_tensor.nii.gz", &[96, 96, 60, 6], Intent::None, [-0.003, 0.003])
    }),
    ("Fibre orientation distributions", || {
        Overlay::image("fods.nii.gz", &[96, 96, 60, 45], Intent::None, [-0.5, 1.2])
    }),
    ("VTK mesh", || Overlay::mesh("lh.white.vtk", 140_923, "lh.white.vtk")),
    ("GIFTI surface", || {
        Overlay::mesh("lh.pial.surf.gii", 163_842, "lh.pial.surf.gii")
    }),
];

/// Draws the overlay list. Selection, removal and the `enabled` flag go
/// through `display_ctx` so that listeners are notified.
pub fn overlay_list_panel(
    ctx: &egui::Context,
    display_ctx: &mut DisplayContext,
    left_panel_width: f32,
    settings_window_open: &mut bool,
) {
    egui::SidePanel::left("Overlay List")
        .min_width(left_panel_width)
        .max_width(left_panel_width)
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Overlays");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .button(egui_phosphor::regular::GEAR_FINE.to_string())
                        .on_hover_text("Settings")
                        .clicked()
                    {
                        *settings_window_open = true;
                    }
                    ui.menu_button(egui_phosphor::regular::PLUS.to_string(), |ui| {
                        for (label, overlay) in DEMO_OVERLAYS {
                            if ui.button(label).clicked() {
                                let id = display_ctx.add_overlay(overlay());
                                select_overlay(display_ctx, id);
                                ui.close();
                            }
                        }
                    });
                });
            });
            ui.separator();

            if display_ctx.is_empty() {
                ui.weak("No overlays loaded.");
                return;
            }

            let name_width = left_panel_width - 80.0;
            let mut selected = None;
            let mut removed = None;
            let mut toggled = None;
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (index, overlay) in display_ctx.overlays().iter().enumerate() {
                    let enabled = display_ctx
                        .display(overlay.id)
                        .is_some_and(|display| display.enabled);
                    ui.horizontal(|ui| {
                        let mut checked = enabled;
                        if ui.checkbox(&mut checked, "").changed() {
                            toggled = Some((overlay.id, checked));
                        }
                        let is_selected = display_ctx.selected_index() == Some(index);
                        if ui
                            .selectable_label(is_selected, truncate_name(ui, &overlay.name, name_width))
                            .on_hover_text(overlay.name.as_str())
                            .clicked()
                        {
                            selected = Some(index);
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui
                                .small_button(egui_phosphor::regular::TRASH.to_string())
                                .on_hover_text("Remove overlay")
                                .clicked()
                            {
                                removed = Some(overlay.id);
                            }
                        });
                    });
                }
            });

            if let Some((id, enabled)) = toggled {
                set_enabled(display_ctx, id, enabled);
            }
            if let Some(index) = selected {
                display_ctx.select(index);
            }
            if let Some(id) = removed {
                display_ctx.remove_overlay(id);
            }
        });
}

fn select_overlay(display_ctx: &mut DisplayContext, id: OverlayId) {
    if let Some(index) = display_ctx.overlays().iter().position(|o| o.id == id) {
        display_ctx.select(index);
    }
}

fn set_enabled(display_ctx: &mut DisplayContext, id: OverlayId, enabled: bool) {
    if let Some(display) = display_ctx.display_mut(id) {
        if let Err(err) = display.set_property("enabled", PropertyValue::Bool(enabled)) {
            log::warn!("could not toggle {}: {err}", display.name);
        }
    }
}
