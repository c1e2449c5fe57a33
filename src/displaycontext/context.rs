use crate::displaycontext::{Display, Overlay, OverlayId};
use crate::props::{Notifier, PropertyValue, Target, TargetId};
use std::collections::HashMap;

/// The overlay list of a view together with the display of every overlay and
/// the current selection.
///
/// Listeners registered through [`DisplayContext::add_listener`] are told about
/// `overlays` (the list changed, value is the new length) and
/// `selectedOverlay` (value is the selected index, `-1` when empty).
#[derive(Debug, Default)]
pub struct DisplayContext {
    overlays: Vec<Overlay>,
    displays: HashMap<OverlayId, Display>,
    selected: Option<usize>,
    view_3d: bool,
    notifier: Notifier,
}

impl DisplayContext {
    pub fn new(view_3d: bool) -> Self {
        DisplayContext {
            view_3d,
            ..Default::default()
        }
    }

    pub fn is_3d(&self) -> bool {
        self.view_3d
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay_names(&self) -> Vec<String> {
        self.overlays.iter().map(|o| o.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.overlays.iter().any(|o| o.id == id)
    }

    /// Appends `overlay`, creates its display and selects it.
    pub fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = overlay.id;
        log::info!("adding overlay {}", overlay.name);
        self.displays.insert(id, Display::new(&overlay));
        self.overlays.push(overlay);
        self.notify_overlays();
        self.selected = Some(self.overlays.len() - 1);
        self.notify_selection();
        id
    }

    /// Removes an overlay and tears down its display. The selection moves to
    /// the previous overlay if the selected one was removed.
    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<Overlay> {
        let index = self.overlays.iter().position(|o| o.id == id)?;
        let overlay = self.overlays.remove(index);
        if let Some(mut display) = self.displays.remove(&id) {
            display.teardown();
        }
        log::info!("removed overlay {}", overlay.name);

        let previous = self.selected;
        self.selected = match self.selected {
            _ if self.overlays.is_empty() => None,
            Some(selected) if selected > index => Some(selected - 1),
            Some(selected) => Some(selected.min(self.overlays.len() - 1)),
            None => None,
        };
        self.notify_overlays();
        if previous != self.selected || previous == Some(index) {
            self.notify_selection();
        }
        Some(overlay)
    }

    /// Selects the overlay at `index`. Returns `false` if there is no such overlay.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.overlays.len() {
            return false;
        }
        if self.selected != Some(index) {
            self.selected = Some(index);
            self.notify_selection();
        }
        true
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_overlay(&self) -> Option<&Overlay> {
        self.selected.and_then(|i| self.overlays.get(i))
    }

    pub fn display(&self, id: OverlayId) -> Option<&Display> {
        self.displays.get(&id)
    }

    pub fn display_mut(&mut self, id: OverlayId) -> Option<&mut Display> {
        self.displays.get_mut(&id)
    }

    /// Looks up a live display or options object by its id.
    pub fn target(&self, id: TargetId) -> Option<&dyn Target> {
        let display = self
            .displays
            .values()
            .find(|d| d.target_id() == id || d.opts().target_id() == id)?;
        if display.target_id() == id {
            Some(display as &dyn Target)
        } else {
            Some(display.opts())
        }
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut dyn Target> {
        let display = self
            .displays
            .values_mut()
            .find(|d| d.target_id() == id || d.opts().target_id() == id)?;
        if display.target_id() == id {
            Some(display as &mut dyn Target)
        } else {
            Some(display.opts_mut())
        }
    }

    pub fn add_listener<F>(&mut self, property: &str, name: &str, listener: F) -> bool
    where
        F: FnMut(&str, &PropertyValue) + 'static,
    {
        self.notifier.add_listener(property, name, listener)
    }

    pub fn remove_listener(&mut self, property: &str, name: &str) -> bool {
        self.notifier.remove_listener(property, name)
    }

    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    fn notify_overlays(&mut self) {
        let value = PropertyValue::Int(self.overlays.len() as i64);
        self.notifier.notify("overlays", &value);
    }

    fn notify_selection(&mut self) {
        let value = PropertyValue::Int(self.selected.map_or(-1, |i| i as i64));
        self.notifier.notify("selectedOverlay", &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::displaycontext::{Intent, OptionKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn image(name: &str) -> Overlay {
        Overlay::image(name, &[4, 4, 4], Intent::None, [0.0, 1.0])
    }

    #[test]
    fn test_adding_selects_the_new_overlay() {
        let mut ctx = DisplayContext::new(false);
        let events = Rc::new(RefCell::new(Vec::new()));
        for property in ["overlays", "selectedOverlay"] {
            let sink = events.clone();
            ctx.add_listener(property, "test", move |name, value| {
                sink.borrow_mut().push((name.to_string(), value.clone()))
            });
        }
        ctx.add_overlay(image("a"));
        let b = ctx.add_overlay(image("b"));
        assert_eq!(ctx.selected_overlay().map(|o| o.id), Some(b));
        assert_eq!(
            events.borrow().last(),
            Some(&("selectedOverlay".to_string(), PropertyValue::Int(1)))
        );
        assert_eq!(events.borrow().len(), 4);
    }

    #[test]
    fn test_removing_keeps_selection_valid() {
        let mut ctx = DisplayContext::new(false);
        let a = ctx.add_overlay(image("a"));
        let b = ctx.add_overlay(image("b"));
        let c = ctx.add_overlay(image("c"));
        ctx.select(2);
        ctx.remove_overlay(c);
        assert_eq!(ctx.selected_overlay().map(|o| o.id), Some(b));
        ctx.select(1);
        ctx.remove_overlay(a);
        assert_eq!(ctx.selected_index(), Some(0));
        ctx.remove_overlay(b);
        assert!(ctx.selected_overlay().is_none());
        assert!(ctx.remove_overlay(b).is_none());
        assert!(!ctx.select(0));
    }

    #[test]
    fn test_targets_are_found_by_id() {
        let mut ctx = DisplayContext::new(true);
        let id = ctx.add_overlay(image("a"));
        let (display_id, opts_id) = {
            let display = ctx.display(id).unwrap();
            (display.target_id(), display.opts().target_id())
        };
        assert_eq!(ctx.target(display_id).unwrap().kind(), OptionKind::Display);
        assert_eq!(ctx.target_mut(opts_id).unwrap().kind(), OptionKind::VolumeOpts);
        assert!(ctx.target(TargetId::new()).is_none());
        assert!(ctx.is_3d());
    }
}
