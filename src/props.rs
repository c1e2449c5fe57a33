//! Typed, observable properties.
//!
//! Every settings object that can be shown on the overlay display panel is a
//! [`Target`]: it exposes named properties holding a [`PropertyValue`], knows
//! the [`Constraints`] on each of them, and owns a [`Notifier`] through which
//! listeners are told about changes. The `HasProperties` part of a target is
//! normally generated with `#[derive(Properties)]` from the `props_macros` crate.

use crate::displaycontext::OptionKind;
use downcast_rs::Downcast;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// The value of a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    /// One of a set of string choices, see [`Constraints::Choices`].
    Choice(String),
    /// RGBA, each channel in `[0, 1]`.
    Colour([f32; 4]),
    /// A `[low, high]` pair.
    Range([f64; 2]),
    /// A reference to another overlay (by name), or nothing.
    Reference(Option<String>),
}

impl PropertyValue {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Real(_) => "real",
            PropertyValue::Text(_) => "text",
            PropertyValue::Choice(_) => "choice",
            PropertyValue::Colour(_) => "colour",
            PropertyValue::Range(_) => "range",
            PropertyValue::Reference(_) => "reference",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Real(r) => Some(*r as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(i) => Some(*i as f64),
            PropertyValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// The string content of text, choice and set reference values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) | PropertyValue::Choice(s) => Some(s),
            PropertyValue::Reference(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// `true` for a reference which does not point anywhere.
    pub fn is_unset_reference(&self) -> bool {
        matches!(self, PropertyValue::Reference(None))
    }

    /// `true` if this is a boolean and it is set.
    pub fn is_true(&self) -> bool {
        self.as_bool().unwrap_or(false)
    }

    /// `true` if a property currently holding `self` can be assigned `other`.
    /// Integers and reals convert into each other, as do text and choices.
    pub fn accepts(&self, other: &PropertyValue) -> bool {
        use PropertyValue::*;
        matches!(
            (self, other),
            (Int(_) | Real(_), Int(_) | Real(_)) | (Text(_) | Choice(_), Text(_) | Choice(_))
        ) || std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn into_choice(self) -> Result<String, PropertyError> {
        match self {
            PropertyValue::Choice(s) | PropertyValue::Text(s) => Ok(s),
            other => Err(PropertyError::TypeMismatch {
                expected: "choice",
                found: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Real(r) => write!(f, "{r:.3}"),
            PropertyValue::Text(s) | PropertyValue::Choice(s) => write!(f, "{s}"),
            PropertyValue::Colour(c) => {
                write!(f, "({:.2}, {:.2}, {:.2}, {:.2})", c[0], c[1], c[2], c[3])
            }
            PropertyValue::Range(r) => write!(f, "[{:.3}, {:.3}]", r[0], r[1]),
            PropertyValue::Reference(Some(s)) => write!(f, "{s}"),
            PropertyValue::Reference(None) => write!(f, "None"),
        }
    }
}

macro_rules! impl_value_conversion {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                PropertyValue::$variant(value)
            }
        }

        impl TryFrom<PropertyValue> for $ty {
            type Error = PropertyError;

            fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
                match value {
                    PropertyValue::$variant(inner) => Ok(inner),
                    other => Err(PropertyError::TypeMismatch {
                        expected: $expected,
                        found: other.type_name(),
                    }),
                }
            }
        }
    };
}

impl_value_conversion!(bool, Bool, "bool");
impl_value_conversion!(String, Text, "text");
impl_value_conversion!([f32; 4], Colour, "colour");
impl_value_conversion!([f64; 2], Range, "range");
impl_value_conversion!(Option<String>, Reference, "reference");

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl TryFrom<PropertyValue> for i64 {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Int(i) => Ok(i),
            PropertyValue::Real(r) => Ok(r.round() as i64),
            other => Err(PropertyError::TypeMismatch {
                expected: "int",
                found: other.type_name(),
            }),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Real(value)
    }
}

impl TryFrom<PropertyValue> for f64 {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Real(r) => Ok(r),
            PropertyValue::Int(i) => Ok(i as f64),
            other => Err(PropertyError::TypeMismatch {
                expected: "real",
                found: other.type_name(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("unknown property `{0}`")]
    UnknownProperty(String),
    #[error("expected a {expected} value, got a {found} value")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("`{value}` is not one of {choices:?}")]
    InvalidChoice { value: String, choices: Vec<String> },
    #[error("property `{0}` is read-only")]
    ReadOnly(String),
    #[error("no {kind} value lies within [{min}, {max}]")]
    InvalidLimits {
        kind: &'static str,
        min: f64,
        max: f64,
    },
}

/// Limits on the values a property may take.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Constraints {
    #[default]
    None,
    /// Numeric limits, applied to scalars and to both ends of a range.
    Range { min: f64, max: f64 },
    Choices(Vec<String>),
}

impl Constraints {
    pub fn choices(choices: &[&str]) -> Self {
        Constraints::Choices(choices.iter().map(|c| c.to_string()).collect())
    }

    pub fn limits(&self) -> Option<(f64, f64)> {
        match self {
            Constraints::Range { min, max } => Some((*min, *max)),
            _ => None,
        }
    }

    pub fn choice_list(&self) -> &[String] {
        match self {
            Constraints::Choices(choices) => choices,
            _ => &[],
        }
    }

    /// Brings `value` within these constraints.
    ///
    /// Numbers are clamped into the limits; for ranges both ends are clamped
    /// and the high end is raised to the low end if they cross. Choices must
    /// be one of the listed values; an empty choice list accepts any choice
    /// but no set reference.
    pub fn validate(&self, value: PropertyValue) -> Result<PropertyValue, PropertyError> {
        if let Constraints::Range { min, max } = self {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(PropertyError::InvalidLimits {
                    kind: value.type_name(),
                    min: *min,
                    max: *max,
                });
            }
        }
        match (self, value) {
            (Constraints::Range { min, max }, PropertyValue::Int(i)) => {
                let (low, high) = (min.ceil(), max.floor());
                if low > high {
                    return Err(PropertyError::InvalidLimits {
                        kind: "int",
                        min: *min,
                        max: *max,
                    });
                }
                Ok(PropertyValue::Int(i.clamp(low as i64, high as i64)))
            }
            (Constraints::Range { min, max }, PropertyValue::Real(r)) => {
                Ok(PropertyValue::Real(r.clamp(*min, *max)))
            }
            (Constraints::Range { min, max }, PropertyValue::Range([low, high])) => {
                let low = low.clamp(*min, *max);
                let high = high.clamp(*min, *max).max(low);
                Ok(PropertyValue::Range([low, high]))
            }
            (Constraints::Choices(choices), PropertyValue::Choice(value))
            | (Constraints::Choices(choices), PropertyValue::Text(value)) => {
                if choices.is_empty() || choices.contains(&value) {
                    Ok(PropertyValue::Choice(value))
                } else {
                    Err(PropertyError::InvalidChoice {
                        value,
                        choices: choices.clone(),
                    })
                }
            }
            (Constraints::Choices(choices), PropertyValue::Reference(Some(value))) => {
                if choices.contains(&value) {
                    Ok(PropertyValue::Reference(Some(value)))
                } else {
                    Err(PropertyError::InvalidChoice {
                        value,
                        choices: choices.clone(),
                    })
                }
            }
            (_, value) => Ok(value),
        }
    }
}

/// Named access to the properties of a struct.
///
/// Implemented by `#[derive(Properties)]`.
pub trait HasProperties {
    fn property_names(&self) -> Vec<&'static str>;

    fn get_property(&self, name: &str) -> Option<PropertyValue>;

    /// Stores `value` without validation or notification. Use
    /// [`Target::set_property`] for user-facing changes.
    fn assign_property(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError>;

    fn static_constraints(&self, name: &str) -> Constraints;

    fn has_property(&self, name: &str) -> bool {
        self.property_names().contains(&name)
    }
}

/// Identity of a live target. A new id is drawn for every target instance,
/// so a replaced options object never shares an id with its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(Uuid);

impl TargetId {
    pub fn new() -> Self {
        TargetId(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A change callback, called with the property name and its new value.
pub type Listener = Box<dyn FnMut(&str, &PropertyValue)>;

/// Listener table of one target, keyed by (property, listener name).
///
/// Registering a listener under an existing (property, name) pair replaces
/// the old one. Removing a listener which is not registered does nothing.
#[derive(Default)]
pub struct Notifier {
    listeners: HashMap<String, Vec<(String, Listener)>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for changes of `property`. Returns `true` if a
    /// listener with the same name was replaced.
    pub fn add_listener<F>(&mut self, property: &str, name: &str, listener: F) -> bool
    where
        F: FnMut(&str, &PropertyValue) + 'static,
    {
        let entries = self.listeners.entry(property.to_string()).or_default();
        if let Some(entry) = entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = Box::new(listener);
            true
        } else {
            entries.push((name.to_string(), Box::new(listener)));
            false
        }
    }

    /// Returns `true` if a listener was removed.
    pub fn remove_listener(&mut self, property: &str, name: &str) -> bool {
        let Some(entries) = self.listeners.get_mut(property) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(n, _)| n != name);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.remove(property);
        }
        removed
    }

    pub fn has_listener(&self, property: &str, name: &str) -> bool {
        self.listeners
            .get(property)
            .is_some_and(|entries| entries.iter().any(|(n, _)| n == name))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Calls every listener registered for `property`, in registration order.
    pub fn notify(&mut self, property: &str, value: &PropertyValue) {
        if let Some(entries) = self.listeners.get_mut(property) {
            for (_, listener) in entries.iter_mut() {
                listener(property, value);
            }
        }
    }

    /// Drops every listener. Returns how many were registered.
    pub fn clear(&mut self) -> usize {
        let count = self.listener_count();
        self.listeners.clear();
        count
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A live settings object whose properties can be bound to controls.
pub trait Target: HasProperties + Downcast {
    /// The option kind used to look up property lists, widget specs and strings.
    fn kind(&self) -> OptionKind;

    fn target_id(&self) -> TargetId;

    fn notifier(&self) -> &Notifier;

    fn notifier_mut(&mut self) -> &mut Notifier;

    /// Constraints of `name` given the current state of the target.
    fn constraints(&self, name: &str) -> Constraints {
        self.static_constraints(name)
    }

    /// Called after `name` has been assigned and before listeners are notified.
    fn after_assign(&mut self, _name: &str) {}

    /// Validates and stores a new value, then notifies listeners.
    ///
    /// Listeners are not called when the validated value equals the current one.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        let current = self
            .get_property(name)
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))?;
        if !current.accepts(&value) {
            return Err(PropertyError::TypeMismatch {
                expected: current.type_name(),
                found: value.type_name(),
            });
        }
        let value = self.constraints(name).validate(value)?;
        if current == value {
            return Ok(());
        }
        self.assign_property(name, value.clone())?;
        self.after_assign(name);
        let value = self.get_property(name).unwrap_or(value);
        self.notifier_mut().notify(name, &value);
        Ok(())
    }
}
downcast_rs::impl_downcast!(Target);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use props_macros::Properties;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Properties)]
    struct Inner {
        #[property(range(0, 10))]
        level: i64,
    }

    #[derive(Properties)]
    struct Sample {
        #[property(skip)]
        id: TargetId,
        #[property(skip)]
        notifier: Notifier,
        use_thing: bool,
        #[property(range(0.0, 1.0))]
        amount: f64,
        #[property(choices("none", "linear"))]
        interpolation: String,
        window: [f64; 2],
        #[property(flatten)]
        inner: Inner,
    }

    impl Target for Sample {
        fn kind(&self) -> OptionKind {
            OptionKind::DisplayOpts
        }

        fn target_id(&self) -> TargetId {
            self.id
        }

        fn notifier(&self) -> &Notifier {
            &self.notifier
        }

        fn notifier_mut(&mut self) -> &mut Notifier {
            &mut self.notifier
        }
    }

    fn sample() -> Sample {
        Sample {
            id: TargetId::new(),
            notifier: Notifier::new(),
            use_thing: false,
            amount: 0.5,
            interpolation: "none".to_string(),
            window: [0.0, 1.0],
            inner: Inner { level: 3 },
        }
    }

    #[test]
    fn test_derived_names_are_lower_camel_case_and_include_flattened() {
        let s = sample();
        assert_eq!(
            s.property_names(),
            vec!["useThing", "amount", "interpolation", "window", "level"]
        );
        assert_eq!(s.get_property("level"), Some(PropertyValue::Int(3)));
        assert_eq!(
            s.get_property("interpolation"),
            Some(PropertyValue::Choice("none".to_string()))
        );
        assert_eq!(s.get_property("id"), None);
    }

    #[test]
    fn test_set_property_clamps_and_rejects_invalid_choices() {
        let mut s = sample();
        s.set_property("amount", PropertyValue::Real(4.0)).unwrap();
        assert_relative_eq!(s.amount, 1.0);
        s.set_property("level", PropertyValue::Int(-3)).unwrap();
        assert_eq!(s.inner.level, 0);
        let err = s
            .set_property("interpolation", PropertyValue::Choice("cubic".into()))
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidChoice { .. }));
        let err = s
            .set_property("useThing", PropertyValue::Real(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            PropertyError::TypeMismatch {
                expected: "bool",
                found: "real"
            }
        );
        assert!(matches!(
            s.set_property("missing", PropertyValue::Bool(true)),
            Err(PropertyError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_range_ends_never_cross() {
        let c = Constraints::Range { min: 0.0, max: 10.0 };
        assert_eq!(
            c.validate(PropertyValue::Range([8.0, 2.0])).unwrap(),
            PropertyValue::Range([8.0, 8.0])
        );
        assert_eq!(
            c.validate(PropertyValue::Range([-5.0, 50.0])).unwrap(),
            PropertyValue::Range([0.0, 10.0])
        );
    }

    #[test]
    fn test_limits_without_a_valid_value_are_errors() {
        let c = Constraints::Range { min: 0.2, max: 0.8 };
        assert!(matches!(
            c.validate(PropertyValue::Int(1)),
            Err(PropertyError::InvalidLimits { kind: "int", .. })
        ));
        assert_eq!(
            c.validate(PropertyValue::Real(1.0)).unwrap(),
            PropertyValue::Real(0.8)
        );
        let nan = Constraints::Range {
            min: f64::NAN,
            max: 1.0,
        };
        assert!(nan.validate(PropertyValue::Real(0.5)).is_err());
        let crossed = Constraints::Range { min: 5.0, max: 1.0 };
        assert!(crossed.validate(PropertyValue::Range([2.0, 3.0])).is_err());
        assert_eq!(
            crossed.validate(PropertyValue::Bool(true)).unwrap_err(),
            PropertyError::InvalidLimits {
                kind: "bool",
                min: 5.0,
                max: 1.0
            }
        );
    }

    #[test]
    fn test_set_property_rejects_values_of_another_shape() {
        let mut s = sample();
        assert_eq!(
            s.set_property("window", PropertyValue::Int(1)),
            Err(PropertyError::TypeMismatch {
                expected: "range",
                found: "int"
            })
        );
        s.set_property("amount", PropertyValue::Int(0)).unwrap();
        assert_relative_eq!(s.amount, 0.0);
        s.set_property("interpolation", PropertyValue::Text("linear".into()))
            .unwrap();
        assert_eq!(s.interpolation, "linear");
    }

    #[test]
    fn test_listeners_fire_on_change_only() {
        let mut s = sample();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        s.notifier_mut()
            .add_listener("useThing", "test", move |name, value| {
                sink.borrow_mut().push((name.to_string(), value.clone()));
            });
        s.set_property("useThing", PropertyValue::Bool(true)).unwrap();
        s.set_property("useThing", PropertyValue::Bool(true)).unwrap();
        s.set_property("amount", PropertyValue::Real(0.1)).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![("useThing".to_string(), PropertyValue::Bool(true))]
        );
    }

    #[test]
    fn test_registering_twice_overwrites_and_removing_twice_is_noop() {
        let mut notifier = Notifier::new();
        let count = Rc::new(RefCell::new(0));
        for _ in 0..3 {
            let c = count.clone();
            notifier.add_listener("p", "panel", move |_, _| *c.borrow_mut() += 1);
        }
        assert_eq!(notifier.listener_count(), 1);
        notifier.notify("p", &PropertyValue::Bool(true));
        assert_eq!(*count.borrow(), 1);

        assert!(notifier.remove_listener("p", "panel"));
        assert!(!notifier.remove_listener("p", "panel"));
        assert!(!notifier.remove_listener("q", "panel"));
        assert_eq!(notifier.listener_count(), 0);
    }
}
