use crate::config::PanelCommand;
use crate::displaycontext::DisplayContext;
use crate::gui::widget_list::{ResolvedGroup, RowElement};
use crate::props::{Constraints, PropertyValue};
use crate::strings::StringLookup;
use crate::widgets::{ChoiceLabels, Container, ContainerItem, Control, Layout, WidgetKind};
use bevy_egui::egui;
use crossbeam_channel::Sender;

/// Text shown for `value` in a choice or reference control.
pub fn choice_text(labels: &ChoiceLabels, strings: &dyn StringLookup, value: &PropertyValue) -> String {
    match (labels, value) {
        (ChoiceLabels::Function(label), _) => label(value),
        (ChoiceLabels::Table(table), _) => value
            .as_str()
            .and_then(|choice| strings.choice_label(table, choice))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        (_, PropertyValue::Reference(None)) => "None".to_string(),
        _ => value.to_string(),
    }
}

/// Draws the rows of `group` as a two column grid.
pub fn show_group(
    ui: &mut egui::Ui,
    display_ctx: &mut DisplayContext,
    group: &ResolvedGroup,
    strings: &dyn StringLookup,
    commands: &Sender<PanelCommand>,
) {
    egui::Grid::new(("group", group.group.key(), group.target.to_string()))
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for row in &group.rows {
                let label = ui.label(row.label.as_str());
                if let Some(tooltip) = &row.tooltip {
                    label.on_hover_text(tooltip.as_str());
                }
                match &row.element {
                    RowElement::Control(control) => {
                        show_control(ui, display_ctx, control, strings);
                    }
                    RowElement::Container(container) => {
                        show_container(ui, display_ctx, container, strings, commands);
                    }
                }
                ui.end_row();
            }
        });
}

fn show_container(
    ui: &mut egui::Ui,
    display_ctx: &mut DisplayContext,
    container: &Container,
    strings: &dyn StringLookup,
    commands: &Sender<PanelCommand>,
) {
    let mut item_ui = |ui: &mut egui::Ui, item: &ContainerItem| match item {
        ContainerItem::Control(control) => {
            if let Some(caption) = &control.caption {
                ui.label(caption.as_str());
            }
            show_control(ui, display_ctx, control, strings);
        }
        ContainerItem::Button(button) => {
            if ui
                .button(format!("{} {}", button.icon, button.label))
                .clicked()
            {
                if let Err(err) = commands.send(button.command.clone()) {
                    log::error!("unable to send {:?}: {err}", button.command);
                }
            }
        }
    };

    match container.layout {
        Layout::Row => {
            ui.horizontal(|ui| {
                for item in &container.items {
                    item_ui(ui, item);
                }
            });
        }
        Layout::Grid { columns } => {
            ui.vertical(|ui| {
                for line in container.items.chunks(columns) {
                    ui.horizontal(|ui| {
                        for item in line {
                            item_ui(ui, item);
                        }
                    });
                }
            });
        }
    }
}

/// Draws one control and writes any edit back to its target.
pub fn show_control(
    ui: &mut egui::Ui,
    display_ctx: &mut DisplayContext,
    control: &Control,
    strings: &dyn StringLookup,
) {
    let (value, constraints) = match display_ctx.target(control.target) {
        Some(target) => match target.get_property(control.key()) {
            Some(value) => (value, target.constraints(control.key())),
            None => {
                ui.weak("unavailable");
                return;
            }
        },
        None => {
            ui.weak("unavailable");
            return;
        }
    };
    let references = reference_candidates(display_ctx, &constraints);

    let edited = ui
        .add_enabled_ui(control.enabled(), |ui| {
            edit_value(ui, control, value, &constraints, &references, strings)
        })
        .inner;

    if let Some(value) = edited {
        let Some(target) = display_ctx.target_mut(control.target) else {
            return;
        };
        if let Err(err) = target.set_property(control.key(), value) {
            log::warn!("could not set {}.{}: {err}", target.kind(), control.key());
        }
    }
}

fn reference_candidates(display_ctx: &DisplayContext, constraints: &Constraints) -> Vec<String> {
    match constraints {
        Constraints::Choices(choices) => choices.clone(),
        _ => display_ctx.overlay_names(),
    }
}

fn edit_value(
    ui: &mut egui::Ui,
    control: &Control,
    value: PropertyValue,
    constraints: &Constraints,
    references: &[String],
    strings: &dyn StringLookup,
) -> Option<PropertyValue> {
    let descriptor = &control.descriptor;
    let limits = constraints.limits();
    match (control.widget_kind, value) {
        (WidgetKind::Checkbox, PropertyValue::Bool(mut checked)) => ui
            .checkbox(&mut checked, "")
            .changed()
            .then_some(PropertyValue::Bool(checked)),
        (kind, PropertyValue::Int(mut v)) => {
            let limits = limits.map(|(min, max)| (min as i64, max as i64));
            number_ui(ui, kind, &mut v, limits, descriptor.show_limits)
                .then_some(PropertyValue::Int(v))
        }
        (kind, PropertyValue::Real(mut v)) => {
            number_ui(ui, kind, &mut v, limits, descriptor.show_limits)
                .then_some(PropertyValue::Real(v))
        }
        (_, PropertyValue::Range(mut range)) => {
            let (low, high) = match descriptor.labels {
                ChoiceLabels::Bounds(low, high) => (
                    strings.text(low).unwrap_or("Min."),
                    strings.text(high).unwrap_or("Max."),
                ),
                _ => ("Min.", "Max."),
            };
            let kind = if descriptor.slider && limits.is_some() {
                WidgetKind::Slider
            } else {
                WidgetKind::Spin
            };
            let mut changed = false;
            ui.vertical(|ui| {
                for (label, end) in [(low, 0), (high, 1)] {
                    ui.horizontal(|ui| {
                        ui.label(label);
                        changed |=
                            number_ui(ui, kind, &mut range[end], limits, descriptor.show_limits);
                    });
                }
            });
            changed.then_some(PropertyValue::Range(range))
        }
        (_, PropertyValue::Colour(mut colour)) => ui
            .color_edit_button_rgba_unmultiplied(&mut colour)
            .changed()
            .then_some(PropertyValue::Colour(colour)),
        (_, PropertyValue::Choice(current)) => {
            let mut selected = current.clone();
            egui::ComboBox::from_id_salt(control.id)
                .selected_text(choice_text(
                    &descriptor.labels,
                    strings,
                    &PropertyValue::Choice(current.clone()),
                ))
                .show_ui(ui, |ui| {
                    for choice in constraints.choice_list() {
                        let text = choice_text(
                            &descriptor.labels,
                            strings,
                            &PropertyValue::Choice(choice.clone()),
                        );
                        ui.selectable_value(&mut selected, choice.clone(), text);
                    }
                });
            (selected != current).then_some(PropertyValue::Choice(selected))
        }
        (_, PropertyValue::Reference(current)) => {
            let mut selected = current.clone();
            egui::ComboBox::from_id_salt(control.id)
                .selected_text(choice_text(
                    &descriptor.labels,
                    strings,
                    &PropertyValue::Reference(current.clone()),
                ))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut selected, None, "None");
                    for candidate in references {
                        let value = PropertyValue::Reference(Some(candidate.clone()));
                        let text = choice_text(&descriptor.labels, strings, &value);
                        ui.selectable_value(&mut selected, Some(candidate.clone()), text);
                    }
                });
            (selected != current).then_some(PropertyValue::Reference(selected))
        }
        (_, PropertyValue::Text(mut text)) => {
            let response = ui.text_edit_singleline(&mut text);
            response
                .lost_focus()
                .then_some(PropertyValue::Text(text))
        }
        (_, PropertyValue::Bool(mut checked)) => ui
            .checkbox(&mut checked, "")
            .changed()
            .then_some(PropertyValue::Bool(checked)),
    }
}

fn number_ui<N: egui::emath::Numeric>(
    ui: &mut egui::Ui,
    kind: WidgetKind,
    value: &mut N,
    limits: Option<(N, N)>,
    show_limits: bool,
) -> bool {
    let Some((min, max)) = limits else {
        return ui.add(egui::DragValue::new(value)).changed();
    };
    let mut changed = false;
    ui.horizontal(|ui| {
        if show_limits {
            ui.small(format!("{}", min.to_f64()));
        }
        match kind {
            WidgetKind::Spin => {
                changed |= ui
                    .add(egui::DragValue::new(value).range(min..=max))
                    .changed();
            }
            WidgetKind::Slider => {
                changed |= ui
                    .add(egui::Slider::new(value, min..=max).show_value(false))
                    .changed();
            }
            _ => {
                changed |= ui.add(egui::Slider::new(value, min..=max)).changed();
            }
        }
        if show_limits {
            ui.small(format!("{}", max.to_f64()));
        }
    });
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::STRINGS;

    fn upper(value: &PropertyValue) -> String {
        value.to_string().to_uppercase()
    }

    #[test]
    fn test_choice_text_uses_the_declared_labels() {
        let linear = PropertyValue::Choice("linear".into());
        assert_eq!(
            choice_text(&ChoiceLabels::Table("VolumeOpts.interpolation"), &*STRINGS, &linear),
            "Linear interpolation"
        );
        assert_eq!(
            choice_text(&ChoiceLabels::Table("NoSuchTable"), &*STRINGS, &linear),
            "linear"
        );
        assert_eq!(
            choice_text(&ChoiceLabels::Function(upper), &*STRINGS, &linear),
            "LINEAR"
        );
        assert_eq!(
            choice_text(&ChoiceLabels::None, &*STRINGS, &PropertyValue::Reference(None)),
            "None"
        );
    }

    #[test]
    fn test_references_prefer_declared_choices() {
        let mut ctx = DisplayContext::new(false);
        ctx.add_overlay(crate::displaycontext::Overlay::image(
            "fa",
            &[4, 4, 4],
            crate::displaycontext::Intent::None,
            [0.0, 1.0],
        ));
        assert_eq!(reference_candidates(&ctx, &Constraints::None), ["fa"]);
        assert_eq!(
            reference_candidates(&ctx, &Constraints::choices(&["lh.curv"])),
            ["lh.curv"]
        );
    }
}
