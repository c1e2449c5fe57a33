//! Type-indexed registry of property lists and widget specs.
//!
//! Every option kind contributes a local property list and a local widget
//! spec map per [`Section`]. The effective list of a kind is its local list
//! followed by the effective lists of its supertypes, in declaration order.
//! The effective map is the merge of the supertype maps (the earlier declared
//! supertype wins a collision) overlaid by the local map.
//!
//! Initializers are registered on a [`SpecRegistryBuilder`]; `build` resolves
//! every declared kind in topological order and the resulting
//! [`SpecRegistry`] is immutable, so every lookup is a plain map access.

use crate::displaycontext::OptionKind;
use crate::widgets::builtin;
use crate::widgets::spec::{WidgetDescriptor, WidgetSpec};
use crate::widgets::ResolveError;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The process wide registry holding the built-in tables.
pub static SPEC_REGISTRY: Lazy<Arc<SpecRegistry>> = Lazy::new(|| {
    let registry = builtin::builder().build().unwrap_or_else(|err| {
        log::error!("failed to build the widget spec registry: {err}");
        SpecRegistry::default()
    });
    Arc::new(registry)
});

/// Part of the panel a property list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    General,
    /// Settings only shown in 3D views.
    ThreeD,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::General, Section::ThreeD];
}

type PropertyInit = Box<dyn Fn() -> Vec<&'static str>>;
type WidgetInit = Box<dyn Fn() -> Vec<(String, WidgetSpec)>>;

#[derive(Default)]
pub struct SpecRegistryBuilder {
    hierarchy: BTreeMap<OptionKind, Vec<OptionKind>>,
    property_inits: HashMap<(OptionKind, Section), PropertyInit>,
    widget_inits: HashMap<(OptionKind, Section), WidgetInit>,
}

impl SpecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `kind` with the supertypes it extends, in order.
    pub fn declare(mut self, kind: OptionKind, supertypes: &[OptionKind]) -> Self {
        self.hierarchy.insert(kind, supertypes.to_vec());
        self
    }

    /// Declares every kind with the supertypes of [`OptionKind::supertypes`].
    pub fn declare_builtin_hierarchy(mut self) -> Self {
        for kind in OptionKind::ALL {
            self = self.declare(kind, kind.supertypes());
        }
        self
    }

    pub fn properties<F>(mut self, kind: OptionKind, section: Section, init: F) -> Self
    where
        F: Fn() -> Vec<&'static str> + 'static,
    {
        self.property_inits.insert((kind, section), Box::new(init));
        self
    }

    pub fn widgets<F, K>(mut self, kind: OptionKind, section: Section, init: F) -> Self
    where
        F: Fn() -> Vec<(K, WidgetSpec)> + 'static,
        K: Into<String>,
    {
        let init = move || {
            init()
                .into_iter()
                .map(|(key, spec)| (key.into(), spec))
                .collect()
        };
        self.widget_inits.insert((kind, section), Box::new(init));
        self
    }

    /// Supertypes before subtypes. Fails on undeclared supertypes and cycles.
    fn topological_order(&self) -> Result<Vec<OptionKind>, ResolveError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            kind: OptionKind,
            hierarchy: &BTreeMap<OptionKind, Vec<OptionKind>>,
            marks: &mut HashMap<OptionKind, Mark>,
            order: &mut Vec<OptionKind>,
        ) -> Result<(), ResolveError> {
            match marks.get(&kind) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(ResolveError::HierarchyCycle(kind)),
                None => {}
            }
            marks.insert(kind, Mark::Visiting);
            for supertype in hierarchy.get(&kind).into_iter().flatten() {
                if !hierarchy.contains_key(supertype) {
                    return Err(ResolveError::UndeclaredSupertype {
                        kind,
                        supertype: *supertype,
                    });
                }
                visit(*supertype, hierarchy, marks, order)?;
            }
            marks.insert(kind, Mark::Done);
            order.push(kind);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut order = Vec::with_capacity(self.hierarchy.len());
        for kind in self.hierarchy.keys() {
            visit(*kind, &self.hierarchy, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    /// Runs every initializer once and resolves all declared kinds.
    pub fn build(self) -> Result<SpecRegistry, ResolveError> {
        for (kind, _) in self.property_inits.keys().chain(self.widget_inits.keys()) {
            if !self.hierarchy.contains_key(kind) {
                return Err(ResolveError::UndeclaredKind(*kind));
            }
        }
        let order = self.topological_order()?;

        let mut registry = SpecRegistry {
            hierarchy: self.hierarchy.clone(),
            order: order.clone(),
            ..Default::default()
        };

        for kind in &order {
            let supertypes = &self.hierarchy[kind];
            for section in Section::ALL {
                let local: Vec<String> = self
                    .property_inits
                    .get(&(*kind, section))
                    .map(|init| init().into_iter().map(str::to_string).collect())
                    .unwrap_or_default();
                let mut properties = local.clone();
                for supertype in supertypes {
                    properties.extend(registry.property_list(*supertype, section).iter().cloned());
                }

                let mut widgets = HashMap::new();
                for supertype in supertypes.iter().rev() {
                    widgets.extend(
                        registry
                            .widget_map(*supertype, section)
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone())),
                    );
                }
                if let Some(init) = self.widget_inits.get(&(*kind, section)) {
                    widgets.extend(init());
                }

                registry.local_properties.insert((*kind, section), local);
                registry.properties.insert((*kind, section), properties);
                registry.widgets.insert((*kind, section), widgets);
            }
        }

        log::debug!(
            "widget spec registry built for {} kinds",
            registry.order.len()
        );
        Ok(registry)
    }
}

/// Resolved property lists and widget spec maps of every declared kind.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    hierarchy: BTreeMap<OptionKind, Vec<OptionKind>>,
    order: Vec<OptionKind>,
    local_properties: HashMap<(OptionKind, Section), Vec<String>>,
    properties: HashMap<(OptionKind, Section), Vec<String>>,
    widgets: HashMap<(OptionKind, Section), HashMap<String, WidgetSpec>>,
    empty: HashMap<String, WidgetSpec>,
}

impl SpecRegistry {
    /// Declared kinds, supertypes before subtypes.
    pub fn kinds(&self) -> &[OptionKind] {
        &self.order
    }

    pub fn supertypes(&self, kind: OptionKind) -> &[OptionKind] {
        self.hierarchy.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Effective property list; empty for kinds without any contribution.
    pub fn property_list(&self, kind: OptionKind, section: Section) -> &[String] {
        self.properties
            .get(&(kind, section))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn local_property_list(&self, kind: OptionKind, section: Section) -> &[String] {
        self.local_properties
            .get(&(kind, section))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Effective widget spec map; empty for kinds without any contribution.
    pub fn widget_map(&self, kind: OptionKind, section: Section) -> &HashMap<String, WidgetSpec> {
        self.widgets.get(&(kind, section)).unwrap_or(&self.empty)
    }

    pub fn resolve_property_list(&self, kind: OptionKind) -> &[String] {
        self.property_list(kind, Section::General)
    }

    pub fn resolve_3d_property_list(&self, kind: OptionKind) -> &[String] {
        self.property_list(kind, Section::ThreeD)
    }

    pub fn resolve_widget_map(&self, kind: OptionKind) -> &HashMap<String, WidgetSpec> {
        self.widget_map(kind, Section::General)
    }

    pub fn resolve_3d_widget_map(&self, kind: OptionKind) -> &HashMap<String, WidgetSpec> {
        self.widget_map(kind, Section::ThreeD)
    }

    pub fn spec(&self, kind: OptionKind, section: Section, property: &str) -> Option<&WidgetSpec> {
        self.widget_map(kind, section).get(property)
    }

    pub fn descriptor(
        &self,
        kind: OptionKind,
        section: Section,
        property: &str,
    ) -> Result<&WidgetDescriptor, ResolveError> {
        match self.spec(kind, section, property) {
            Some(WidgetSpec::Widget(descriptor)) => Ok(descriptor),
            Some(WidgetSpec::Builder(_)) => Err(ResolveError::NotADescriptor {
                kind,
                property: property.to_string(),
            }),
            None => Err(ResolveError::MissingDescriptor {
                kind,
                property: property.to_string(),
            }),
        }
    }

    /// Every listed property without a widget spec and every descriptor filed
    /// under a key other than its own, over all kinds and sections.
    pub fn validate(&self) -> Vec<ResolveError> {
        let mut errors = Vec::new();
        for kind in &self.order {
            for section in Section::ALL {
                let widgets = self.widget_map(*kind, section);
                for (entry, spec) in widgets {
                    if let WidgetSpec::Widget(descriptor) = spec {
                        if descriptor.key != *entry {
                            errors.push(ResolveError::KeyMismatch {
                                kind: *kind,
                                entry: entry.clone(),
                                key: descriptor.key.clone(),
                            });
                        }
                    }
                }
                for property in self.property_list(*kind, section) {
                    if !widgets.contains_key(property) {
                        errors.push(ResolveError::MissingDescriptor {
                            kind: *kind,
                            property: property.clone(),
                        });
                    }
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::spec::{BuildContext, BuilderOutput, WidgetKind};
    use OptionKind::*;

    fn descriptor(spec: Option<&WidgetSpec>) -> &WidgetDescriptor {
        match spec {
            Some(WidgetSpec::Widget(d)) => d,
            other => panic!("expected a descriptor, got {other:?}"),
        }
    }

    fn no_op_builder(_: &BuildContext) -> Result<BuilderOutput, ResolveError> {
        Ok(BuilderOutput::Specs(Vec::new()))
    }

    fn volume_scenario() -> SpecRegistryBuilder {
        SpecRegistryBuilder::new()
            .declare_builtin_hierarchy()
            .properties(VolumeOpts, Section::General, || vec!["volume", "interpolation"])
            .properties(ColourMapOpts, Section::General, || vec!["cmap"])
    }

    #[test]
    fn test_local_list_precedes_supertype_lists() {
        let registry = volume_scenario().build().unwrap();
        assert_eq!(
            registry.resolve_property_list(VolumeOpts),
            ["volume", "interpolation", "cmap"]
        );
        assert_eq!(registry.resolve_property_list(ColourMapOpts), ["cmap"]);
        assert!(registry.resolve_3d_property_list(VolumeOpts).is_empty());
    }

    #[test]
    fn test_lists_concatenate_in_supertype_declaration_order_without_dedup() {
        let registry = volume_scenario()
            .properties(NiftiOpts, Section::General, || vec!["volume"])
            .properties(DisplayOpts, Section::General, || vec!["cmap"])
            .build()
            .unwrap();
        // VolumeOpts extends ColourMapOpts, then NiftiOpts (which extends DisplayOpts).
        assert_eq!(
            registry.resolve_property_list(VolumeOpts),
            ["volume", "interpolation", "cmap", "volume", "cmap"]
        );
        assert_eq!(
            registry.local_property_list(VolumeOpts, Section::General),
            ["volume", "interpolation"]
        );
    }

    #[test]
    fn test_local_specs_override_supertypes_and_earlier_supertype_wins() {
        let registry = SpecRegistryBuilder::new()
            .declare_builtin_hierarchy()
            .widgets(ColourMapOpts, Section::General, || {
                vec![
                    ("cmap", WidgetDescriptor::new("cmap").slider(false).into()),
                    ("invert", WidgetDescriptor::new("invert").into()),
                ]
            })
            .widgets(NiftiOpts, Section::General, || {
                vec![
                    ("invert", WidgetDescriptor::new("invert").kind(WidgetKind::Text).into()),
                    ("volume", WidgetDescriptor::new("volume").into()),
                ]
            })
            .widgets(VolumeOpts, Section::General, || {
                vec![(
                    "cmap",
                    WidgetDescriptor::new("cmap").show_limits(false).into(),
                )]
            })
            .build()
            .unwrap();

        let map = registry.resolve_widget_map(VolumeOpts);
        assert_eq!(map.len(), 3);
        assert!(!descriptor(map.get("cmap")).show_limits);
        assert!(descriptor(map.get("cmap")).slider);
        assert_eq!(descriptor(map.get("invert")).kind, WidgetKind::Auto);
        assert!(map.contains_key("volume"));
        // Supertype maps are unaffected by subtype overrides.
        assert!(descriptor(registry.spec(ColourMapOpts, Section::General, "cmap")).show_limits);
    }

    #[test]
    fn test_kind_without_initializer_still_walks_supertypes() {
        let registry = volume_scenario()
            .widgets(ColourMapOpts, Section::General, || {
                vec![("cmap", WidgetDescriptor::new("cmap").into())]
            })
            .build()
            .unwrap();
        assert_eq!(registry.resolve_property_list(MeshOpts), ["cmap"]);
        assert_eq!(registry.resolve_property_list(GiftiOpts), ["cmap"]);
        assert!(registry.resolve_widget_map(GiftiOpts).contains_key("cmap"));
    }

    #[test]
    fn test_kind_with_nothing_resolves_empty() {
        let registry = volume_scenario().build().unwrap();
        assert!(registry.resolve_property_list(Display).is_empty());
        assert!(registry.resolve_widget_map(TensorOpts).is_empty());
        assert!(SpecRegistry::default()
            .resolve_property_list(VolumeOpts)
            .is_empty());
    }

    #[test]
    fn test_cycles_and_undeclared_kinds_are_rejected() {
        let cycle = SpecRegistryBuilder::new()
            .declare(MeshOpts, &[GiftiOpts])
            .declare(GiftiOpts, &[MeshOpts])
            .build();
        assert!(matches!(cycle, Err(ResolveError::HierarchyCycle(_))));

        let undeclared = SpecRegistryBuilder::new()
            .declare(GiftiOpts, &[MeshOpts])
            .build();
        assert_eq!(
            undeclared.unwrap_err(),
            ResolveError::UndeclaredSupertype {
                kind: GiftiOpts,
                supertype: MeshOpts
            }
        );

        let unknown = SpecRegistryBuilder::new()
            .declare(Display, &[])
            .properties(VolumeOpts, Section::General, Vec::new)
            .build();
        assert_eq!(unknown.unwrap_err(), ResolveError::UndeclaredKind(VolumeOpts));
    }

    #[test]
    fn test_missing_descriptor_is_reported() {
        let registry = volume_scenario()
            .widgets(VolumeOpts, Section::General, || {
                vec![
                    ("volume", WidgetDescriptor::new("volume").into()),
                    ("interpolation", WidgetSpec::Builder(no_op_builder)),
                ]
            })
            .build()
            .unwrap();
        let errors = registry.validate();
        assert_eq!(errors.len(), 2);
        for kind in [VolumeOpts, ColourMapOpts] {
            assert!(errors.contains(&ResolveError::MissingDescriptor {
                kind,
                property: "cmap".into()
            }));
        }
        assert!(matches!(
            registry.descriptor(VolumeOpts, Section::General, "cmap"),
            Err(ResolveError::MissingDescriptor { .. })
        ));
        assert!(matches!(
            registry.descriptor(VolumeOpts, Section::General, "interpolation"),
            Err(ResolveError::NotADescriptor { .. })
        ));
    }
}
