//! Declarative widget specifications for overlay display settings and the
//! type-indexed registry resolving them per option kind.

pub mod builtin;
pub mod registry;
pub mod spec;

use crate::displaycontext::OptionKind;
use crate::props::{PropertyError, TargetId};
use thiserror::Error;

pub use registry::{Section, SpecRegistry, SpecRegistryBuilder, SPEC_REGISTRY};
pub use spec::{
    ActionButton, BuildContext, BuilderOutput, ChoiceLabels, Container, ContainerItem, Control,
    EnabledWhen, Layout, WidgetDescriptor, WidgetId, WidgetKind, WidgetSpec,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("{kind} lists `{property}` but no widget spec is registered for it")]
    MissingDescriptor { kind: OptionKind, property: String },
    #[error("the widget spec of {kind}.{property} is a builder, not a descriptor")]
    NotADescriptor { kind: OptionKind, property: String },
    #[error("{kind} maps `{entry}` to a descriptor for `{key}`")]
    KeyMismatch {
        kind: OptionKind,
        entry: String,
        key: String,
    },
    #[error("{kind} has no property `{property}`")]
    UnknownProperty { kind: OptionKind, property: String },
    #[error("`{property}` of {kind} depends on `{dependency}`, which {kind} does not have")]
    UnknownDependency {
        kind: OptionKind,
        property: String,
        dependency: String,
    },
    #[error("builder for {kind}.{property} returned a malformed result: {reason}")]
    MalformedBuilder {
        kind: OptionKind,
        property: String,
        reason: String,
    },
    #[error("target {0} no longer exists")]
    UnknownTarget(TargetId),
    #[error("{0} is used but was never declared")]
    UndeclaredKind(OptionKind),
    #[error("{kind} extends {supertype}, which was never declared")]
    UndeclaredSupertype {
        kind: OptionKind,
        supertype: OptionKind,
    },
    #[error("the kind hierarchy contains a cycle through {0}")]
    HierarchyCycle(OptionKind),
    #[error(transparent)]
    Property(#[from] PropertyError),
}
