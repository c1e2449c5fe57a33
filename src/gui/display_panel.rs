//! The overlay display panel: resolves the settings of the selected overlay
//! into groups of controls and keeps them in step with the display context.

use crate::config::PanelCommand;
use crate::displaycontext::{DisplayContext, OptionKind, OverlayId};
use crate::gui::controls;
use crate::gui::widget_list::{PanelGroup, Registration, ResolvedGroup, Row, RowElement, WidgetList};
use crate::props::{PropertyValue, Target, TargetId};
use crate::strings::StringLookup;
use crate::widgets::{
    BuildContext, BuilderOutput, Control, ResolveError, SpecRegistry, WidgetId, WidgetSpec,
};
use bevy_egui::egui;
use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Notifications forwarded from display context listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    SelectionChanged,
    OverlaysChanged,
    OverlayTypeChanged,
}

type PendingListener = (Registration, Box<dyn FnMut(&str, &PropertyValue)>);

pub struct DisplayPanel {
    name: String,
    list: WidgetList,
    /// The overlay whose settings are shown.
    current: Option<OverlayId>,
    /// The display carrying this panel's `overlayType` listener.
    tracked_display: Option<TargetId>,
    expanded: HashMap<PanelGroup, bool>,
    registry: Arc<SpecRegistry>,
    strings: Arc<dyn StringLookup>,
    events_tx: Sender<PanelEvent>,
    events_rx: Receiver<PanelEvent>,
    commands_tx: Sender<PanelCommand>,
    last_error: Option<ResolveError>,
}

impl DisplayPanel {
    /// Creates the panel, subscribes it to `display_ctx` and shows the
    /// currently selected overlay.
    pub fn new(
        name: &str,
        display_ctx: &mut DisplayContext,
        registry: Arc<SpecRegistry>,
        strings: Arc<dyn StringLookup>,
        commands_tx: Sender<PanelCommand>,
    ) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let mut panel = DisplayPanel {
            name: name.to_string(),
            list: WidgetList::new(),
            current: None,
            tracked_display: None,
            expanded: HashMap::new(),
            registry,
            strings,
            events_tx,
            events_rx,
            commands_tx,
            last_error: None,
        };
        display_ctx.add_listener(
            "selectedOverlay",
            name,
            panel.forward(PanelEvent::SelectionChanged),
        );
        display_ctx.add_listener("overlays", name, panel.forward(PanelEvent::OverlaysChanged));
        panel.report(|panel| panel.selected_overlay_changed(display_ctx));
        panel
    }

    fn forward(&self, event: PanelEvent) -> impl FnMut(&str, &PropertyValue) + 'static {
        let tx = self.events_tx.clone();
        move |_, _| {
            if let Err(err) = tx.send(event) {
                log::warn!("dropped panel event {event:?}: {err}");
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn list(&self) -> &WidgetList {
        &self.list
    }

    pub fn current_overlay(&self) -> Option<OverlayId> {
        self.current
    }

    pub fn last_error(&self) -> Option<&ResolveError> {
        self.last_error.as_ref()
    }

    pub fn commands(&self) -> &Sender<PanelCommand> {
        &self.commands_tx
    }

    pub fn group(&self, group: PanelGroup) -> Option<&ResolvedGroup> {
        self.list.group(group)
    }

    pub fn set_expanded(&mut self, group: PanelGroup, expanded: bool) {
        self.expanded.insert(group, expanded);
        self.list.set_expanded(group, expanded);
    }

    /// Handles every notification received since the last call.
    pub fn process_events(&mut self, display_ctx: &mut DisplayContext) {
        let events: Vec<PanelEvent> = self.events_rx.try_iter().collect();
        let mut selection_handled = false;
        for event in events {
            match event {
                PanelEvent::SelectionChanged | PanelEvent::OverlaysChanged => {
                    if !selection_handled {
                        selection_handled = true;
                        self.report(|panel| panel.selected_overlay_changed(display_ctx));
                    }
                }
                PanelEvent::OverlayTypeChanged => {
                    self.report(|panel| panel.overlay_type_changed(display_ctx));
                }
            }
        }
    }

    fn report<F>(&mut self, handler: F)
    where
        F: FnOnce(&mut Self) -> Result<(), ResolveError>,
    {
        match handler(self) {
            Ok(()) => self.last_error = None,
            Err(err) => {
                log::error!("{}: {err}", self.name);
                self.last_error = Some(err);
            }
        }
    }

    /// Rebuilds every group for the selected overlay, or clears the panel
    /// if nothing is selected. Nothing happens if the overlay did not change.
    ///
    /// Every group is staged before anything visible changes. If one of them
    /// fails the panel is cleared, and selecting the overlay again retries.
    pub fn selected_overlay_changed(
        &mut self,
        display_ctx: &mut DisplayContext,
    ) -> Result<(), ResolveError> {
        let selected = display_ctx.selected_overlay().map(|o| o.id);
        if selected.is_some() && self.current == selected {
            return Ok(());
        }
        let Some((overlay, display)) =
            selected.and_then(|id| display_ctx.display(id).map(|display| (id, display)))
        else {
            self.reset(display_ctx);
            return Ok(());
        };
        let display_id = display.target_id();
        let opts_id = display.opts().target_id();
        let opts_kind = display.opts().kind();

        let mut targets = vec![
            (PanelGroup::Display, display_id),
            (PanelGroup::Opts, opts_id),
        ];
        if display_ctx.is_3d() {
            targets.push((PanelGroup::ThreeD, opts_id));
        }
        let staged = match self.stage_all(display_ctx, &targets) {
            Ok(staged) => staged,
            Err(err) => {
                self.reset(display_ctx);
                return Err(err);
            }
        };

        self.untrack(display_ctx);
        self.clear_groups(display_ctx);
        let forward = self.forward(PanelEvent::OverlayTypeChanged);
        if let Some(display) = display_ctx.display_mut(overlay) {
            display
                .notifier_mut()
                .add_listener("overlayType", &self.name, forward);
            self.tracked_display = Some(display_id);
        }
        self.current = Some(overlay);

        for (group, _) in &targets {
            let kind = (*group == PanelGroup::Opts).then_some(opts_kind);
            let title = self.group_title(*group, kind);
            let expanded = self.expanded_state(*group);
            self.list.add_group(*group, &title, expanded);
        }
        log::debug!("{}: showing overlay {overlay}", self.name);
        for (resolved, listeners) in staged {
            self.install(display_ctx, resolved, listeners)?;
        }
        Ok(())
    }

    /// Rebuilds the option groups after the selected display replaced its
    /// options object. If staging fails the groups keep their rows.
    pub fn overlay_type_changed(
        &mut self,
        display_ctx: &mut DisplayContext,
    ) -> Result<(), ResolveError> {
        let Some(display) = self.current.and_then(|id| display_ctx.display(id)) else {
            return Ok(());
        };
        let opts_id = display.opts().target_id();
        let opts_kind = display.opts().kind();

        let mut targets = vec![(PanelGroup::Opts, opts_id)];
        if display_ctx.is_3d() {
            targets.push((PanelGroup::ThreeD, opts_id));
        }
        let staged = self.stage_all(display_ctx, &targets)?;

        let title = self.group_title(PanelGroup::Opts, Some(opts_kind));
        self.list.rename(PanelGroup::Opts, &title);
        for (resolved, listeners) in staged {
            self.install(display_ctx, resolved, listeners)?;
        }
        Ok(())
    }

    fn reset(&mut self, display_ctx: &mut DisplayContext) {
        self.untrack(display_ctx);
        self.clear_groups(display_ctx);
        self.current = None;
    }

    fn stage_all(
        &self,
        display_ctx: &DisplayContext,
        targets: &[(PanelGroup, TargetId)],
    ) -> Result<Vec<(ResolvedGroup, Vec<PendingListener>)>, ResolveError> {
        targets
            .iter()
            .map(|(group, target_id)| {
                let target = display_ctx
                    .target(*target_id)
                    .ok_or(ResolveError::UnknownTarget(*target_id))?;
                self.stage(display_ctx, target, *group)
            })
            .collect()
    }

    fn group_title(&self, group: PanelGroup, kind: Option<OptionKind>) -> String {
        match (group, kind) {
            (PanelGroup::Opts, Some(kind)) => self.strings.group_label(kind),
            (PanelGroup::Display, _) => self
                .strings
                .panel_label("Display")
                .unwrap_or("Display")
                .to_string(),
            _ => self
                .strings
                .panel_label(group.key())
                .unwrap_or(group.key())
                .to_string(),
        }
    }

    pub fn is_expanded(&self, group: PanelGroup) -> bool {
        self.list
            .is_expanded(group)
            .unwrap_or_else(|| self.expanded_state(group))
    }

    fn expanded_state(&self, group: PanelGroup) -> bool {
        self.expanded.get(&group).copied().unwrap_or(true)
    }

    fn untrack(&mut self, display_ctx: &mut DisplayContext) {
        if let Some(display) = self.tracked_display.take() {
            if let Some(target) = display_ctx.target_mut(display) {
                target.notifier_mut().remove_listener("overlayType", &self.name);
            }
        }
    }

    fn clear_groups(&mut self, display_ctx: &mut DisplayContext) {
        for group in PanelGroup::ALL {
            if let Some(expanded) = self.list.is_expanded(group) {
                self.expanded.insert(group, expanded);
            }
        }
        for group in self.list.clear() {
            deregister(display_ctx, &group.registrations);
        }
    }

    /// Rebuilds `group` from the target `target_id` and returns the ids of
    /// its interactive controls in focus order.
    ///
    /// The new rows are staged first. If anything fails the group keeps its
    /// previous rows and listeners.
    pub fn refresh(
        &mut self,
        display_ctx: &mut DisplayContext,
        target_id: TargetId,
        group: PanelGroup,
    ) -> Result<Vec<WidgetId>, ResolveError> {
        let (staged, listeners) = {
            let target = display_ctx
                .target(target_id)
                .ok_or(ResolveError::UnknownTarget(target_id))?;
            self.stage(display_ctx, target, group)?
        };
        self.install(display_ctx, staged, listeners)
    }

    /// Registers the listeners of a staged group and swaps it in.
    fn install(
        &mut self,
        display_ctx: &mut DisplayContext,
        staged: ResolvedGroup,
        listeners: Vec<PendingListener>,
    ) -> Result<Vec<WidgetId>, ResolveError> {
        let target = display_ctx
            .target_mut(staged.target)
            .ok_or(ResolveError::UnknownTarget(staged.target))?;
        for (registration, listener) in listeners {
            target
                .notifier_mut()
                .add_listener(&registration.property, &registration.name, listener);
        }

        let group = staged.group;
        if !self.list.has_group(group) {
            let title = self.group_title(group, Some(staged.kind));
            let expanded = self.expanded_state(group);
            self.list.add_group(group, &title, expanded);
        }
        let focus = staged.focus.clone();
        log::debug!(
            "{}: {} group shows {} ({} rows)",
            self.name,
            group.key(),
            staged.kind,
            staged.rows.len()
        );
        if let Some(old) = self.list.replace(staged) {
            deregister(display_ctx, &old.registrations);
        }
        Ok(focus)
    }

    fn stage(
        &self,
        display_ctx: &DisplayContext,
        target: &dyn Target,
        group: PanelGroup,
    ) -> Result<(ResolvedGroup, Vec<PendingListener>), ResolveError> {
        let kind = target.kind();
        let section = group.section();
        let build_ctx = BuildContext {
            target,
            section,
            group: group.key(),
            panel: &self.name,
            display_ctx,
            registry: &self.registry,
            strings: self.strings.as_ref(),
        };

        let mut resolved = ResolvedGroup::new(group, target.target_id(), kind);
        let mut seen = HashSet::new();
        for property in self.registry.property_list(kind, section) {
            if !seen.insert(property.as_str()) {
                log::debug!("{kind}: `{property}` is listed more than once, skipping");
                continue;
            }
            let spec = self.registry.spec(kind, section, property).ok_or_else(|| {
                ResolveError::MissingDescriptor {
                    kind,
                    property: property.clone(),
                }
            })?;
            match spec {
                WidgetSpec::Widget(descriptor) => {
                    let control = Control::build(target, descriptor.clone())?;
                    resolved.focus.push(control.id);
                    resolved
                        .rows
                        .push(self.row(kind, property, RowElement::Control(control)));
                }
                WidgetSpec::Builder(build) => match build(&build_ctx)? {
                    BuilderOutput::Container { container, widgets } => {
                        if let Some(stray) = widgets.iter().find(|id| !container.contains(**id)) {
                            return Err(ResolveError::MalformedBuilder {
                                kind,
                                property: property.clone(),
                                reason: format!("widget {stray} is not part of the container"),
                            });
                        }
                        resolved.focus.extend(widgets);
                        resolved
                            .rows
                            .push(self.row(kind, property, RowElement::Container(container)));
                    }
                    BuilderOutput::Specs(descriptors) => {
                        for descriptor in descriptors {
                            let control = Control::build(target, descriptor)?;
                            let key = control.key().to_string();
                            resolved.focus.push(control.id);
                            resolved
                                .rows
                                .push(self.row(kind, &key, RowElement::Control(control)));
                        }
                    }
                },
            }
        }

        let mut listeners: Vec<PendingListener> = Vec::new();
        for control in resolved.rows.iter().flat_map(Row::controls) {
            for (index, dependency) in control.descriptor.dependencies().iter().enumerate() {
                let registration = Registration {
                    target: control.target,
                    property: dependency.clone(),
                    name: format!("{}.{}.{}.{index}", self.name, group.key(), control.id),
                };
                let listener: Box<dyn FnMut(&str, &PropertyValue)> =
                    Box::new(control.dependency_listener(index));
                listeners.push((registration, listener));
            }
        }
        resolved.registrations = listeners.iter().map(|(r, _)| r.clone()).collect();
        Ok((resolved, listeners))
    }

    fn row(&self, kind: OptionKind, property: &str, element: RowElement) -> Row {
        Row {
            property: property.to_string(),
            label: self
                .strings
                .property_label(kind, property)
                .unwrap_or_default(),
            tooltip: self.strings.property_tooltip(kind, property),
            element,
        }
    }

    /// Ids of every interactive control, group after group.
    pub fn navigation_order(&self) -> Vec<WidgetId> {
        self.list
            .groups()
            .filter_map(|(_, _, _, content)| content)
            .flat_map(|group| group.focus.iter().copied())
            .collect()
    }

    /// Draws every group as a collapsing header.
    pub fn show(&mut self, ui: &mut egui::Ui, display_ctx: &mut DisplayContext) {
        if let Some(err) = &self.last_error {
            ui.colored_label(
                egui::Color32::RED,
                format!("{} {err}", egui_phosphor::regular::WARNING),
            );
        }
        if self.list.is_empty() {
            ui.weak("No overlay selected.");
            return;
        }

        let mut toggled = Vec::new();
        for (group, label, expanded, content) in self.list.groups() {
            let response = egui::CollapsingHeader::new(label)
                .id_salt((self.name.as_str(), group.key()))
                .open(Some(expanded))
                .show(ui, |ui| {
                    if let Some(content) = content {
                        controls::show_group(
                            ui,
                            display_ctx,
                            content,
                            self.strings.as_ref(),
                            &self.commands_tx,
                        );
                    }
                });
            if response.header_response.clicked() {
                toggled.push((group, !expanded));
            }
        }
        for (group, expanded) in toggled {
            self.set_expanded(group, expanded);
        }
    }

    /// Removes every listener this panel registered.
    pub fn destroy(&mut self, display_ctx: &mut DisplayContext) {
        self.untrack(display_ctx);
        self.clear_groups(display_ctx);
        display_ctx.remove_listener("selectedOverlay", &self.name);
        display_ctx.remove_listener("overlays", &self.name);
        self.current = None;
        log::debug!("{}: destroyed", self.name);
    }
}

fn deregister(display_ctx: &mut DisplayContext, registrations: &[Registration]) {
    for registration in registrations {
        if let Some(target) = display_ctx.target_mut(registration.target) {
            target
                .notifier_mut()
                .remove_listener(&registration.property, &registration.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::displaycontext::{Intent, Overlay};
    use crate::strings::STRINGS;
    use crate::widgets::builtin;
    use crate::widgets::{Container, Section, SpecRegistryBuilder, WidgetDescriptor};

    fn t1() -> Overlay {
        Overlay::image("t1", &[32, 32, 16], Intent::None, [0.0, 1000.0])
    }

    fn panel_with(
        registry: SpecRegistry,
        display_ctx: &mut DisplayContext,
    ) -> (DisplayPanel, Receiver<PanelCommand>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let panel = DisplayPanel::new(
            "displayPanel",
            display_ctx,
            Arc::new(registry),
            Arc::new(STRINGS.clone()),
            tx,
        );
        (panel, rx)
    }

    fn panel(display_ctx: &mut DisplayContext) -> DisplayPanel {
        panel_with(builtin::builder().build().unwrap(), display_ctx).0
    }

    fn properties(group: &ResolvedGroup) -> Vec<&str> {
        group.rows.iter().map(|r| r.property.as_str()).collect()
    }

    fn opts_id(display_ctx: &DisplayContext, overlay: OverlayId) -> TargetId {
        display_ctx.display(overlay).unwrap().opts().target_id()
    }

    fn stray_widget(ctx: &BuildContext) -> Result<BuilderOutput, ResolveError> {
        let control = Control::build(ctx.target, WidgetDescriptor::new("name"))?;
        Ok(BuilderOutput::Container {
            container: Container::row().control(control),
            widgets: vec![WidgetId::new()],
        })
    }

    fn nothing(_: &BuildContext) -> Result<BuilderOutput, ResolveError> {
        Ok(BuilderOutput::Specs(Vec::new()))
    }

    fn name_and_alpha(_: &BuildContext) -> Result<BuilderOutput, ResolveError> {
        Ok(BuilderOutput::Specs(vec![
            WidgetDescriptor::new("name"),
            WidgetDescriptor::new("alpha"),
        ]))
    }

    #[test]
    fn test_display_group_lists_display_properties_with_labels() {
        let mut ctx = DisplayContext::new(false);
        ctx.add_overlay(t1());
        let panel = panel(&mut ctx);

        let display = panel.group(PanelGroup::Display).unwrap();
        assert_eq!(
            properties(display),
            ["name", "overlayType", "enabled", "alpha", "brightness", "contrast"]
        );
        assert_eq!(display.rows[0].label, "Overlay name");
        assert_eq!(display.focus.len(), 6);
        assert_eq!(
            panel.list().label(PanelGroup::Display),
            Some("General display settings")
        );
        assert_eq!(panel.list().label(PanelGroup::Opts), Some("Volume settings"));
        assert!(panel.group(PanelGroup::ThreeD).is_none());
        assert!(panel.last_error().is_none());
    }

    #[test]
    fn test_colour_map_container_contributes_its_widgets_to_focus() {
        let mut ctx = DisplayContext::new(false);
        ctx.add_overlay(t1());
        let panel = panel(&mut ctx);

        let opts = panel.group(PanelGroup::Opts).unwrap();
        assert_eq!(opts.kind, OptionKind::VolumeOpts);
        let row = opts.row("custom_cmap").unwrap();
        let RowElement::Container(container) = &row.element else {
            panic!("custom_cmap should be a container");
        };
        let ids: Vec<WidgetId> = container.controls().map(|c| c.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| opts.focus.contains(id)));
        // volume, interpolation, then the three colour map widgets
        assert_eq!(opts.focus[2..5], ids[..]);
        assert_eq!(row.label, "Colour map");
    }

    #[test]
    fn test_negative_colour_map_follows_its_toggle() {
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let panel = panel(&mut ctx);

        let negative = |panel: &DisplayPanel| {
            let opts = panel.group(PanelGroup::Opts).unwrap();
            opts.rows
                .iter()
                .flat_map(Row::controls)
                .find(|c| c.key() == "negativeCmap")
                .unwrap()
                .enabled()
        };
        assert!(!negative(&panel));
        let opts = opts_id(&ctx, overlay);
        ctx.target_mut(opts)
            .unwrap()
            .set_property("useNegativeCmap", PropertyValue::Bool(true))
            .unwrap();
        assert!(negative(&panel));
        ctx.target_mut(opts)
            .unwrap()
            .set_property("useNegativeCmap", PropertyValue::Bool(false))
            .unwrap();
        assert!(!negative(&panel));
    }

    fn labels(panel: &DisplayPanel, group: PanelGroup) -> Vec<(String, Option<String>)> {
        panel
            .group(group)
            .unwrap()
            .rows
            .iter()
            .map(|r| (r.label.clone(), r.tooltip.clone()))
            .collect()
    }

    #[test]
    fn test_refresh_twice_leaves_one_set_of_listeners() {
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let mut panel = panel(&mut ctx);
        let opts = opts_id(&ctx, overlay);

        let before = ctx.target(opts).unwrap().notifier().listener_count();
        assert!(before > 0);

        let first = panel.refresh(&mut ctx, opts, PanelGroup::Opts).unwrap();
        let first_labels = labels(&panel, PanelGroup::Opts);
        let second = panel.refresh(&mut ctx, opts, PanelGroup::Opts).unwrap();
        let second_labels = labels(&panel, PanelGroup::Opts);

        assert_eq!(first.len(), second.len());
        assert_ne!(first, second);
        assert_eq!(first_labels, second_labels);
        assert!(first_labels.iter().any(|(label, _)| label == "Colour map"));
        assert_eq!(ctx.target(opts).unwrap().notifier().listener_count(), before);
        assert_eq!(
            panel.group(PanelGroup::Opts).unwrap().registrations.len(),
            before
        );

        let display = ctx.display(overlay).unwrap().target_id();
        panel.refresh(&mut ctx, display, PanelGroup::Display).unwrap();
        let display_labels = labels(&panel, PanelGroup::Display);
        panel.refresh(&mut ctx, display, PanelGroup::Display).unwrap();
        assert_eq!(labels(&panel, PanelGroup::Display), display_labels);
    }

    fn first_is_set(values: &[PropertyValue]) -> bool {
        values[0].is_true()
    }

    #[test]
    fn test_repeated_dependency_keeps_every_value_current() {
        let registry = builtin::builder()
            .properties(OptionKind::Display, Section::General, || vec!["alpha"])
            .widgets(OptionKind::Display, Section::General, || {
                vec![(
                    "alpha",
                    WidgetSpec::Widget(
                        WidgetDescriptor::new("alpha")
                            .enabled_when(&["enabled", "enabled"], first_is_set),
                    ),
                )]
            })
            .build()
            .unwrap();
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let (panel, _) = panel_with(registry, &mut ctx);
        let display = ctx.display(overlay).unwrap().target_id();

        let group = panel.group(PanelGroup::Display).unwrap();
        assert_eq!(group.registrations.len(), 2);
        assert_ne!(group.registrations[0].name, group.registrations[1].name);

        let alpha = |panel: &DisplayPanel| {
            panel.group(PanelGroup::Display).unwrap().rows[0].controls()[0].enabled()
        };
        assert!(alpha(&panel));
        ctx.target_mut(display)
            .unwrap()
            .set_property("enabled", PropertyValue::Bool(false))
            .unwrap();
        assert!(!alpha(&panel));
    }

    #[test]
    fn test_removing_the_only_overlay_clears_every_group() {
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let mut panel = panel(&mut ctx);
        assert!(!panel.navigation_order().is_empty());

        ctx.remove_overlay(overlay);
        panel.process_events(&mut ctx);
        assert!(panel.list().is_empty());
        assert!(panel.navigation_order().is_empty());
        assert_eq!(panel.current_overlay(), None);
        assert_eq!(ctx.listener_count(), 2);
    }

    #[test]
    fn test_selecting_another_overlay_rebuilds_and_keeps_expanded_state() {
        let mut ctx = DisplayContext::new(false);
        let first = ctx.add_overlay(t1());
        let mut panel = panel(&mut ctx);
        panel.set_expanded(PanelGroup::Opts, false);
        let old_display = ctx.display(first).unwrap().target_id();

        let second = ctx.add_overlay(Overlay::image(
            "labels",
            &[32, 32, 16],
            Intent::None,
            [0.0, 48.0],
        ));
        panel.process_events(&mut ctx);
        assert_eq!(panel.current_overlay(), Some(second));
        assert_eq!(panel.list().is_expanded(PanelGroup::Opts), Some(false));
        assert_eq!(panel.list().is_expanded(PanelGroup::Display), Some(true));
        // Nothing of the panel is left on the previous overlay.
        assert_eq!(ctx.target(old_display).unwrap().notifier().listener_count(), 0);
        assert_eq!(
            ctx.target(opts_id(&ctx, first))
                .unwrap()
                .notifier()
                .listener_count(),
            0
        );

        let focus = panel.navigation_order();
        panel.selected_overlay_changed(&mut ctx).unwrap();
        assert_eq!(panel.navigation_order(), focus);
    }

    #[test]
    fn test_overlay_type_change_only_rebuilds_options() {
        let mut ctx = DisplayContext::new(true);
        let overlay = ctx.add_overlay(t1());
        let mut panel = panel(&mut ctx);
        let display_focus = panel.group(PanelGroup::Display).unwrap().focus.clone();
        assert_eq!(
            properties(panel.group(PanelGroup::ThreeD).unwrap()),
            ["dithering", "numSteps", "numClipPlanes"]
        );

        let display = ctx.display(overlay).unwrap().target_id();
        ctx.target_mut(display)
            .unwrap()
            .set_property("overlayType", PropertyValue::Choice("mask".into()))
            .unwrap();
        panel.process_events(&mut ctx);

        assert_eq!(panel.group(PanelGroup::Display).unwrap().focus, display_focus);
        let opts = panel.group(PanelGroup::Opts).unwrap();
        assert_eq!(opts.kind, OptionKind::MaskOpts);
        assert_eq!(properties(opts), ["volume", "colour", "invert", "threshold"]);
        assert_eq!(panel.list().label(PanelGroup::Opts), Some("Mask settings"));
        assert!(panel.group(PanelGroup::ThreeD).unwrap().rows.is_empty());
    }

    #[test]
    fn test_failed_refresh_keeps_the_previous_group() {
        let registry = builtin::builder()
            .properties(OptionKind::MaskOpts, Section::General, || vec!["volume", "bogus"])
            .build()
            .unwrap();
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let (mut panel, _) = panel_with(registry, &mut ctx);
        let rows = panel.group(PanelGroup::Opts).unwrap().rows.len();

        let display = ctx.display(overlay).unwrap().target_id();
        ctx.target_mut(display)
            .unwrap()
            .set_property("overlayType", PropertyValue::Choice("mask".into()))
            .unwrap();
        panel.process_events(&mut ctx);

        assert_eq!(
            panel.last_error(),
            Some(&ResolveError::MissingDescriptor {
                kind: OptionKind::MaskOpts,
                property: "bogus".into()
            })
        );
        let opts = panel.group(PanelGroup::Opts).unwrap();
        assert_eq!(opts.kind, OptionKind::VolumeOpts);
        assert_eq!(opts.rows.len(), rows);
        assert_eq!(
            ctx.target(opts_id(&ctx, overlay))
                .unwrap()
                .notifier()
                .listener_count(),
            0
        );
    }

    #[test]
    fn test_malformed_builders_are_rejected() {
        let registry = builtin::builder()
            .properties(OptionKind::Display, Section::General, || vec!["custom_stray"])
            .widgets(OptionKind::Display, Section::General, || {
                vec![("custom_stray", WidgetSpec::Builder(stray_widget))]
            })
            .build()
            .unwrap();
        let mut ctx = DisplayContext::new(false);
        ctx.add_overlay(t1());
        let (panel, _) = panel_with(registry, &mut ctx);
        assert!(matches!(
            panel.last_error(),
            Some(ResolveError::MalformedBuilder { .. })
        ));
        assert!(panel.group(PanelGroup::Display).is_none());
    }

    #[test]
    fn test_builder_without_descriptors_adds_no_rows() {
        let registry = builtin::builder()
            .properties(OptionKind::Display, Section::General, || {
                vec!["name", "custom_empty"]
            })
            .widgets(OptionKind::Display, Section::General, || {
                vec![
                    ("name", WidgetSpec::Widget(WidgetDescriptor::new("name"))),
                    ("custom_empty", WidgetSpec::Builder(nothing)),
                ]
            })
            .build()
            .unwrap();
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let (mut panel, _) = panel_with(registry, &mut ctx);
        assert!(panel.last_error().is_none());
        assert_eq!(properties(panel.group(PanelGroup::Display).unwrap()), ["name"]);

        let display = ctx.display(overlay).unwrap().target_id();
        let focus = panel.refresh(&mut ctx, display, PanelGroup::Display).unwrap();
        assert_eq!(focus.len(), 1);
    }

    #[test]
    fn test_failed_selection_shows_no_partial_groups_and_retries() {
        let registry = builtin::builder()
            .properties(OptionKind::VolumeOpts, Section::General, || vec!["volume", "bogus"])
            .build()
            .unwrap();
        let mut ctx = DisplayContext::new(true);
        let overlay = ctx.add_overlay(t1());
        let (mut panel, _) = panel_with(registry, &mut ctx);

        assert!(matches!(
            panel.last_error(),
            Some(ResolveError::MissingDescriptor { kind: OptionKind::VolumeOpts, .. })
        ));
        assert!(panel.list().is_empty());
        assert_eq!(panel.current_overlay(), None);
        let display = ctx.display(overlay).unwrap().target_id();
        assert_eq!(ctx.target(display).unwrap().notifier().listener_count(), 0);
        assert_eq!(
            ctx.target(opts_id(&ctx, overlay))
                .unwrap()
                .notifier()
                .listener_count(),
            0
        );

        // Selecting the same overlay again runs the resolution again.
        assert!(panel.selected_overlay_changed(&mut ctx).is_err());
        assert!(panel.list().is_empty());

        ctx.target_mut(display)
            .unwrap()
            .set_property("overlayType", PropertyValue::Choice("mask".into()))
            .unwrap();
        panel.selected_overlay_changed(&mut ctx).unwrap();
        assert_eq!(panel.current_overlay(), Some(overlay));
        assert_eq!(
            panel.group(PanelGroup::Opts).unwrap().kind,
            OptionKind::MaskOpts
        );
    }

    #[test]
    fn test_builder_descriptors_expand_into_rows_and_duplicates_are_skipped() {
        let registry = builtin::builder()
            .properties(OptionKind::Display, Section::General, || {
                vec!["enabled", "custom_both", "enabled"]
            })
            .widgets(OptionKind::Display, Section::General, || {
                vec![
                    ("enabled", WidgetSpec::Widget(WidgetDescriptor::new("enabled"))),
                    ("custom_both", WidgetSpec::Builder(name_and_alpha)),
                ]
            })
            .build()
            .unwrap();
        let mut ctx = DisplayContext::new(false);
        ctx.add_overlay(t1());
        let (panel, _) = panel_with(registry, &mut ctx);

        let display = panel.group(PanelGroup::Display).unwrap();
        assert_eq!(properties(display), ["enabled", "name", "alpha"]);
        assert_eq!(display.rows[2].label, "Opacity");
        assert_eq!(display.focus.len(), 3);
    }

    #[test]
    fn test_destroy_removes_every_listener() {
        let mut ctx = DisplayContext::new(true);
        let overlay = ctx.add_overlay(t1());
        let mut panel = panel(&mut ctx);
        let display = ctx.display(overlay).unwrap().target_id();
        assert!(ctx.target(display).unwrap().notifier().listener_count() > 0);

        panel.destroy(&mut ctx);
        assert_eq!(ctx.listener_count(), 0);
        assert_eq!(ctx.target(display).unwrap().notifier().listener_count(), 0);
        assert_eq!(
            ctx.target(opts_id(&ctx, overlay))
                .unwrap()
                .notifier()
                .listener_count(),
            0
        );
    }

    #[test]
    fn test_load_button_sends_its_command() {
        let mut ctx = DisplayContext::new(false);
        let overlay = ctx.add_overlay(t1());
        let (panel, rx) = panel_with(builtin::builder().build().unwrap(), &mut ctx);
        let row = panel.group(PanelGroup::Opts).unwrap().row("custom_cmap").unwrap();
        let RowElement::Container(container) = &row.element else {
            panic!("custom_cmap should be a container");
        };
        let command = container
            .items
            .iter()
            .find_map(|item| match item {
                crate::widgets::ContainerItem::Button(b) => Some(b.command.clone()),
                _ => None,
            })
            .unwrap();
        panel.commands().send(command).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            PanelCommand::LoadColourMap {
                target: opts_id(&ctx, overlay)
            }
        );
    }
}
