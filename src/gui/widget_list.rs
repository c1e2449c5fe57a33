//! Collapsible groups of resolved property rows.

use crate::displaycontext::OptionKind;
use crate::props::TargetId;
use crate::widgets::{Container, Control, Section, WidgetId};

/// The groups a display panel shows for the selected overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelGroup {
    Display,
    Opts,
    ThreeD,
}

impl PanelGroup {
    pub const ALL: [PanelGroup; 3] = [PanelGroup::Display, PanelGroup::Opts, PanelGroup::ThreeD];

    pub fn key(&self) -> &'static str {
        match self {
            PanelGroup::Display => "display",
            PanelGroup::Opts => "opts",
            PanelGroup::ThreeD => "3d",
        }
    }

    pub fn section(&self) -> Section {
        match self {
            PanelGroup::Display | PanelGroup::Opts => Section::General,
            PanelGroup::ThreeD => Section::ThreeD,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RowElement {
    Control(Control),
    Container(Container),
}

/// One labelled line of a group.
#[derive(Debug, Clone)]
pub struct Row {
    pub property: String,
    pub label: String,
    pub tooltip: Option<String>,
    pub element: RowElement,
}

impl Row {
    pub fn controls(&self) -> Vec<&Control> {
        match &self.element {
            RowElement::Control(control) => vec![control],
            RowElement::Container(container) => container.controls().collect(),
        }
    }
}

/// A dependency listener registered on a target for one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub target: TargetId,
    pub property: String,
    pub name: String,
}

/// Rows built for one target, with the listeners keeping their enabled
/// state current.
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    pub group: PanelGroup,
    pub target: TargetId,
    pub kind: OptionKind,
    pub rows: Vec<Row>,
    /// Interactive controls in keyboard navigation order.
    pub focus: Vec<WidgetId>,
    pub registrations: Vec<Registration>,
}

impl ResolvedGroup {
    pub fn new(group: PanelGroup, target: TargetId, kind: OptionKind) -> Self {
        ResolvedGroup {
            group,
            target,
            kind,
            rows: Vec::new(),
            focus: Vec::new(),
            registrations: Vec::new(),
        }
    }

    pub fn control(&self, id: WidgetId) -> Option<&Control> {
        self.rows
            .iter()
            .flat_map(|row| row.controls())
            .find(|control| control.id == id)
    }

    pub fn row(&self, property: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.property == property)
    }
}

#[derive(Debug)]
struct Entry {
    group: PanelGroup,
    label: String,
    expanded: bool,
    content: Option<ResolvedGroup>,
}

/// Ordered list of collapsible groups.
#[derive(Debug, Default)]
pub struct WidgetList {
    entries: Vec<Entry>,
}

impl WidgetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty group, or relabels it if it exists.
    pub fn add_group(&mut self, group: PanelGroup, label: &str, expanded: bool) {
        match self.entries.iter_mut().find(|e| e.group == group) {
            Some(entry) => entry.label = label.to_string(),
            None => self.entries.push(Entry {
                group,
                label: label.to_string(),
                expanded,
                content: None,
            }),
        }
    }

    pub fn has_group(&self, group: PanelGroup) -> bool {
        self.entries.iter().any(|e| e.group == group)
    }

    /// Puts `content` in place of the current rows of its group and returns
    /// the replaced rows.
    pub fn replace(&mut self, content: ResolvedGroup) -> Option<ResolvedGroup> {
        let entry = self.entries.iter_mut().find(|e| e.group == content.group)?;
        entry.content.replace(content)
    }

    /// Removes every group and returns their rows.
    pub fn clear(&mut self) -> Vec<ResolvedGroup> {
        self.entries.drain(..).filter_map(|e| e.content).collect()
    }

    pub fn group(&self, group: PanelGroup) -> Option<&ResolvedGroup> {
        self.entries
            .iter()
            .find(|e| e.group == group)
            .and_then(|e| e.content.as_ref())
    }

    pub fn label(&self, group: PanelGroup) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.group == group)
            .map(|e| e.label.as_str())
    }

    pub fn rename(&mut self, group: PanelGroup, label: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.group == group) {
            entry.label = label.to_string();
        }
    }

    pub fn is_expanded(&self, group: PanelGroup) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.group == group)
            .map(|e| e.expanded)
    }

    pub fn set_expanded(&mut self, group: PanelGroup, expanded: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.group == group) {
            entry.expanded = expanded;
        }
    }

    /// Groups in display order with their label and expanded state.
    pub fn groups(&self) -> impl Iterator<Item = (PanelGroup, &str, bool, Option<&ResolvedGroup>)> {
        self.entries
            .iter()
            .map(|e| (e.group, e.label.as_str(), e.expanded, e.content.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_returns_previous_rows() {
        let mut list = WidgetList::new();
        let target = TargetId::new();
        assert!(list
            .replace(ResolvedGroup::new(PanelGroup::Opts, target, OptionKind::VolumeOpts))
            .is_none());

        list.add_group(PanelGroup::Opts, "Volume settings", true);
        assert!(list
            .replace(ResolvedGroup::new(PanelGroup::Opts, target, OptionKind::VolumeOpts))
            .is_none());
        let old = list
            .replace(ResolvedGroup::new(PanelGroup::Opts, target, OptionKind::MaskOpts))
            .unwrap();
        assert_eq!(old.kind, OptionKind::VolumeOpts);
        assert_eq!(list.group(PanelGroup::Opts).unwrap().kind, OptionKind::MaskOpts);
    }

    #[test]
    fn test_groups_keep_insertion_order_and_state() {
        let mut list = WidgetList::new();
        list.add_group(PanelGroup::Display, "General display settings", true);
        list.add_group(PanelGroup::Opts, "Volume settings", false);
        list.add_group(PanelGroup::Display, "Display", true);
        list.rename(PanelGroup::Opts, "Mask settings");
        list.set_expanded(PanelGroup::Display, false);

        let groups: Vec<_> = list.groups().map(|(g, l, e, _)| (g, l.to_string(), e)).collect();
        assert_eq!(
            groups,
            vec![
                (PanelGroup::Display, "Display".to_string(), false),
                (PanelGroup::Opts, "Mask settings".to_string(), false),
            ]
        );
        assert_eq!(list.is_expanded(PanelGroup::ThreeD), None);
        assert!(list.clear().is_empty());
        assert!(list.is_empty());
    }
}
