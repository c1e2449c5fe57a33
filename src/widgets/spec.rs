use crate::config::PanelCommand;
use crate::displaycontext::{DisplayContext, OptionKind};
use crate::props::{PropertyValue, Target, TargetId};
use crate::strings::StringLookup;
use crate::widgets::registry::{Section, SpecRegistry};
use crate::widgets::ResolveError;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// The control used for a property. `Auto` picks one from the property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Auto,
    Checkbox,
    Slider,
    Spin,
    SliderSpin,
    Choice,
    Text,
    Colour,
    Range,
    Reference,
}

/// How the values of a choice, reference or range control are labelled.
#[derive(Debug, Clone, Copy)]
pub enum ChoiceLabels {
    None,
    /// Key of a choice table in the string tables.
    Table(&'static str),
    Function(fn(&PropertyValue) -> String),
    /// String keys of the low and high end of a range.
    Bounds(&'static str, &'static str),
}

/// Enablement of a control as a pure function of other properties.
///
/// `evaluate` receives the current values of `dependencies`, in the order
/// they are listed.
#[derive(Debug, Clone)]
pub struct EnabledWhen {
    pub dependencies: Vec<String>,
    pub evaluate: fn(&[PropertyValue]) -> bool,
}

impl EnabledWhen {
    pub fn new(dependencies: &[&str], evaluate: fn(&[PropertyValue]) -> bool) -> Self {
        EnabledWhen {
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            evaluate,
        }
    }

    /// Current values of the dependencies on `target`.
    pub fn values(
        &self,
        target: &dyn Target,
        property: &str,
    ) -> Result<Vec<PropertyValue>, ResolveError> {
        self.dependencies
            .iter()
            .map(|dependency| {
                target
                    .get_property(dependency)
                    .ok_or_else(|| ResolveError::UnknownDependency {
                        kind: target.kind(),
                        property: property.to_string(),
                        dependency: dependency.clone(),
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct WidgetDescriptor {
    pub key: String,
    pub kind: WidgetKind,
    pub show_limits: bool,
    pub slider: bool,
    pub spin: bool,
    pub labels: ChoiceLabels,
    pub enabled_when: Option<EnabledWhen>,
}

impl WidgetDescriptor {
    pub fn new(key: &str) -> Self {
        WidgetDescriptor {
            key: key.to_string(),
            kind: WidgetKind::Auto,
            show_limits: true,
            slider: true,
            spin: true,
            labels: ChoiceLabels::None,
            enabled_when: None,
        }
    }

    pub fn kind(mut self, kind: WidgetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn show_limits(mut self, show_limits: bool) -> Self {
        self.show_limits = show_limits;
        self
    }

    pub fn slider(mut self, slider: bool) -> Self {
        self.slider = slider;
        self
    }

    pub fn spin(mut self, spin: bool) -> Self {
        self.spin = spin;
        self
    }

    pub fn labels(mut self, labels: ChoiceLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn enabled_when(
        mut self,
        dependencies: &[&str],
        evaluate: fn(&[PropertyValue]) -> bool,
    ) -> Self {
        self.enabled_when = Some(EnabledWhen::new(dependencies, evaluate));
        self
    }

    pub fn dependencies(&self) -> &[String] {
        self.enabled_when
            .as_ref()
            .map(|e| e.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// The control used for `value`, honouring the `slider` and `spin` flags
    /// for numbers.
    pub fn resolve_kind(&self, value: &PropertyValue) -> WidgetKind {
        if self.kind != WidgetKind::Auto {
            return self.kind;
        }
        match value {
            PropertyValue::Bool(_) => WidgetKind::Checkbox,
            PropertyValue::Int(_) | PropertyValue::Real(_) => match (self.slider, self.spin) {
                (true, true) => WidgetKind::SliderSpin,
                (true, false) => WidgetKind::Slider,
                _ => WidgetKind::Spin,
            },
            PropertyValue::Text(_) => WidgetKind::Text,
            PropertyValue::Choice(_) => WidgetKind::Choice,
            PropertyValue::Colour(_) => WidgetKind::Colour,
            PropertyValue::Range(_) => WidgetKind::Range,
            PropertyValue::Reference(_) => WidgetKind::Reference,
        }
    }
}

pub type BuilderFn = fn(&BuildContext) -> Result<BuilderOutput, ResolveError>;

/// Entry of a widget spec map.
#[derive(Clone)]
pub enum WidgetSpec {
    Widget(WidgetDescriptor),
    /// Builds a composite control, or expands into further descriptors.
    Builder(BuilderFn),
}

impl fmt::Debug for WidgetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetSpec::Widget(descriptor) => f.debug_tuple("Widget").field(descriptor).finish(),
            WidgetSpec::Builder(_) => f.write_str("Builder"),
        }
    }
}

impl From<WidgetDescriptor> for WidgetSpec {
    fn from(descriptor: WidgetDescriptor) -> Self {
        WidgetSpec::Widget(descriptor)
    }
}

pub enum BuilderOutput {
    /// A composite element shown as one row. `widgets` lists its interactive
    /// controls in focus order.
    Container {
        container: Container,
        widgets: Vec<WidgetId>,
    },
    /// Descriptors to build one row each, in place of the builder's row.
    Specs(Vec<WidgetDescriptor>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(Uuid);

impl WidgetId {
    pub fn new() -> Self {
        WidgetId(Uuid::new_v4())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One control bound to a property of a target.
///
/// The enabled state is shared with the dependency listeners created by
/// [`Control::dependency_listener`], which recompute it synchronously
/// whenever a dependency changes.
#[derive(Debug, Clone)]
pub struct Control {
    pub id: WidgetId,
    pub target: TargetId,
    pub descriptor: WidgetDescriptor,
    pub widget_kind: WidgetKind,
    /// Text shown next to the control when it is part of a container.
    pub caption: Option<String>,
    enabled: Rc<Cell<bool>>,
    dependency_values: Rc<RefCell<Vec<PropertyValue>>>,
}

impl Control {
    pub fn build(target: &dyn Target, descriptor: WidgetDescriptor) -> Result<Self, ResolveError> {
        let value =
            target
                .get_property(&descriptor.key)
                .ok_or_else(|| ResolveError::UnknownProperty {
                    kind: target.kind(),
                    property: descriptor.key.clone(),
                })?;
        let (enabled, dependency_values) = match &descriptor.enabled_when {
            Some(enabled_when) => {
                let values = enabled_when.values(target, &descriptor.key)?;
                ((enabled_when.evaluate)(&values), values)
            }
            None => (true, Vec::new()),
        };
        Ok(Control {
            id: WidgetId::new(),
            target: target.target_id(),
            widget_kind: descriptor.resolve_kind(&value),
            descriptor,
            caption: None,
            enabled: Rc::new(Cell::new(enabled)),
            dependency_values: Rc::new(RefCell::new(dependency_values)),
        })
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Listener for the `index`-th dependency. Stores the new value and
    /// re-evaluates the enablement predicate.
    pub fn dependency_listener(&self, index: usize) -> impl FnMut(&str, &PropertyValue) + 'static {
        let enabled = self.enabled.clone();
        let values = self.dependency_values.clone();
        let evaluate = self.descriptor.enabled_when.as_ref().map(|e| e.evaluate);
        move |_, value| {
            let Some(evaluate) = evaluate else {
                return;
            };
            let mut values = values.borrow_mut();
            if let Some(slot) = values.get_mut(index) {
                *slot = value.clone();
            }
            enabled.set(evaluate(&values));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionButton {
    pub label: String,
    pub icon: &'static str,
    pub command: PanelCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Row,
    Grid { columns: usize },
}

#[derive(Debug, Clone)]
pub enum ContainerItem {
    Control(Control),
    Button(ActionButton),
}

/// A composite element built by a builder function.
#[derive(Debug, Clone)]
pub struct Container {
    pub layout: Layout,
    pub items: Vec<ContainerItem>,
}

impl Container {
    pub fn row() -> Self {
        Container {
            layout: Layout::Row,
            items: Vec::new(),
        }
    }

    pub fn grid(columns: usize) -> Self {
        Container {
            layout: Layout::Grid {
                columns: columns.max(1),
            },
            items: Vec::new(),
        }
    }

    pub fn control(mut self, control: Control) -> Self {
        self.items.push(ContainerItem::Control(control));
        self
    }

    pub fn button(mut self, button: ActionButton) -> Self {
        self.items.push(ContainerItem::Button(button));
        self
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.items.iter().filter_map(|item| match item {
            ContainerItem::Control(control) => Some(control),
            ContainerItem::Button(_) => None,
        })
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.controls().any(|c| c.id == id)
    }
}

/// Everything a builder function gets to work with.
pub struct BuildContext<'a> {
    pub target: &'a dyn Target,
    pub section: Section,
    /// Key of the panel group being built.
    pub group: &'a str,
    /// Name of the panel owning the group.
    pub panel: &'a str,
    pub display_ctx: &'a DisplayContext,
    pub registry: &'a SpecRegistry,
    pub strings: &'a dyn StringLookup,
}

impl BuildContext<'_> {
    pub fn kind(&self) -> OptionKind {
        self.target.kind()
    }

    pub fn descriptor(&self, property: &str) -> Result<WidgetDescriptor, ResolveError> {
        self.registry
            .descriptor(self.kind(), self.section, property)
            .cloned()
    }

    /// Builds the control declared for `property` on the target.
    pub fn control(&self, property: &str) -> Result<Control, ResolveError> {
        Control::build(self.target, self.descriptor(property)?)
    }

    pub fn label(&self, property: &str) -> Option<String> {
        self.strings.property_label(self.kind(), property)
    }

    pub fn panel_label(&self, key: &str) -> String {
        self.strings
            .panel_label(key)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }
}
