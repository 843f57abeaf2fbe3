//! Section schemas
//!
//! A schema declares, per section name, how often the section may appear
//! and which kinds each property may hold. Specifiers are normalized when
//! they are added to a [`Schema`]:
//!
//! - a section without declared properties accepts any property (`"*": any`)
//! - `name` defaults to `string` or `null` unless declared
//!
//! Property lookup falls back to the `"*"` wildcard. With no wildcard,
//! undeclared properties are rejected.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::error::SchemaError;
use crate::value::{Kind, Object, Value};

/// Property name matched by every property without its own entry.
pub const WILDCARD: &str = "*";

/// How many times a section may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
    /// At most once; stored as a single object.
    Once,
    /// Any number of times; stored as a list.
    Many,
}

impl Count {
    pub fn from_name(name: &str) -> Option<Count> {
        match name {
            "once" => Some(Count::Once),
            "many" => Some(Count::Many),
            _ => None,
        }
    }
}

/// A set of value kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub const fn empty() -> Self {
        KindSet(0)
    }

    fn bit(kind: Kind) -> u8 {
        match kind {
            Kind::String => 1,
            Kind::Number => 1 << 1,
            Kind::Array => 1 << 2,
            Kind::Object => 1 << 3,
            Kind::Bool => 1 << 4,
            Kind::Null => 1 << 5,
        }
    }

    pub fn insert(&mut self, kind: Kind) {
        self.0 |= Self::bit(kind);
    }

    pub fn contains(self, kind: Kind) -> bool {
        self.0 & Self::bit(kind) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in schema order.
    pub fn iter(self) -> impl Iterator<Item = Kind> {
        Kind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<Kind> for KindSet {
    fn from_iter<I: IntoIterator<Item = Kind>>(iter: I) -> Self {
        let mut set = KindSet::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// The kinds a property may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allowed {
    /// Anything.
    Any,
    /// Only these kinds.
    Kinds(KindSet),
}

impl Allowed {
    pub fn permits(self, kind: Kind) -> bool {
        match self {
            Allowed::Any => true,
            Allowed::Kinds(set) => set.contains(kind),
        }
    }
}

impl From<Kind> for Allowed {
    fn from(kind: Kind) -> Self {
        Allowed::Kinds([kind].into_iter().collect())
    }
}

impl<const N: usize> From<[Kind; N]> for Allowed {
    fn from(kinds: [Kind; N]) -> Self {
        Allowed::Kinds(kinds.into_iter().collect())
    }
}

impl fmt::Display for Allowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allowed::Any => f.write_str("any"),
            Allowed::Kinds(set) if set.len() == 1 => {
                let names: Vec<&str> = set.iter().map(Kind::name).collect();
                f.write_str(names[0])
            }
            Allowed::Kinds(set) => {
                let names: Vec<&str> = set.iter().map(Kind::name).collect();
                write!(f, "one of ({})", names.join(", "))
            }
        }
    }
}

/// Cardinality and property types of one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpec {
    count: Count,
    props: HashMap<String, Allowed>,
    declared: bool,
}

impl SectionSpec {
    pub fn new(count: Count) -> Self {
        Self {
            count,
            props: HashMap::new(),
            declared: false,
        }
    }

    pub fn once() -> Self {
        Self::new(Count::Once)
    }

    pub fn many() -> Self {
        Self::new(Count::Many)
    }

    /// Declare a property. Use [`WILDCARD`] to type every other property.
    pub fn prop(mut self, name: impl Into<String>, allowed: impl Into<Allowed>) -> Self {
        self.props.insert(name.into(), allowed.into());
        self.declared = true;
        self
    }

    pub fn count(&self) -> Count {
        self.count
    }

    /// The allowed kinds for `property`, falling back to the wildcard.
    pub fn allowed(&self, property: &str) -> Option<Allowed> {
        self.props
            .get(property)
            .or_else(|| self.props.get(WILDCARD))
            .copied()
    }

    fn normalized(mut self) -> Self {
        if !self.declared {
            self.props.insert(WILDCARD.to_string(), Allowed::Any);
            self.declared = true;
        }
        self.props
            .entry("name".to_string())
            .or_insert_with(|| Allowed::from([Kind::String, Kind::Null]));
        self
    }

    /// Read one specifier: `"once"`, `"many"`, or
    /// `{ count <once|many> props { <prop> <type or [types]> ... } }`.
    fn from_value(section: &str, value: &Value) -> Result<Self, SchemaError> {
        let obj = match value {
            Value::String(name) => {
                return Count::from_name(name).map(SectionSpec::new).ok_or_else(|| {
                    SchemaError::specifier(
                        section,
                        format!("Expected count to be 'many' or 'once', got {}", name),
                    )
                });
            }
            Value::Object(obj) => obj,
            other => {
                return Err(SchemaError::specifier(
                    section,
                    format!("Expected 'once', 'many', or an object, got {}", other.kind()),
                ))
            }
        };

        let count = match obj.get("count") {
            Some(Value::String(name)) => Count::from_name(name),
            _ => None,
        };
        let count = count.ok_or_else(|| {
            let got = match obj.get("count") {
                Some(Value::String(name)) => name.clone(),
                Some(other) => other.kind().to_string(),
                None => "nothing".to_string(),
            };
            SchemaError::specifier(
                section,
                format!("Expected count to be 'many' or 'once', got {}", got),
            )
        })?;

        let mut spec = SectionSpec::new(count);
        match obj.get("props") {
            None => {}
            Some(Value::Object(props)) => {
                spec.declared = true;
                for prop in sorted_keys(props) {
                    let allowed = allowed_from_value(section, prop, &props[prop])?;
                    spec.props.insert(prop.clone(), allowed);
                }
            }
            Some(other) => {
                return Err(SchemaError::specifier(
                    section,
                    format!("Expected props to be an object, got {}", other.kind()),
                ))
            }
        }
        Ok(spec)
    }
}

fn sorted_keys(obj: &Object) -> Vec<&String> {
    let mut keys: Vec<&String> = obj.keys().collect();
    keys.sort();
    keys
}

/// A type name as written in a schema. A bare `null` lexes as the null
/// value, so it names the null type.
fn type_name(value: &Value) -> Option<&str> {
    match value {
        Value::String(name) => Some(name.as_str()),
        Value::Null => Some("null"),
        _ => None,
    }
}

/// Read a type list: one type name, or an array of them.
fn allowed_from_value(section: &str, prop: &str, value: &Value) -> Result<Allowed, SchemaError> {
    let err = |reason: String| SchemaError::specifier(section, format!("Property {}: {}", prop, reason));

    let names: Vec<&str> = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                type_name(item)
                    .ok_or_else(|| err(format!("Expected a type name, got {}", item.kind())))
            })
            .collect::<Result<_, _>>()?,
        single => match type_name(single) {
            Some(name) => vec![name],
            None => {
                return Err(err(format!(
                    "Expected a type name or a list of them, got {}",
                    single.kind()
                )))
            }
        },
    };

    if names.is_empty() {
        return Err(err("Expected at least one type".to_string()));
    }

    let mut kinds = KindSet::empty();
    let mut any = false;
    for name in &names {
        if *name == "any" {
            any = true;
        } else {
            let kind =
                Kind::from_name(name).ok_or_else(|| err(format!("Unexpected type {}", name)))?;
            kinds.insert(kind);
        }
    }

    if any {
        if names.len() > 1 {
            return Err(err("Type 'any' must be specified alone".to_string()));
        }
        Ok(Allowed::Any)
    } else {
        Ok(Allowed::Kinds(kinds))
    }
}

/// Why a section was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Expected section {0} to exist only once")]
    DuplicateSection(String),

    #[error("Section {section}: Unknown property '{property}'")]
    UnknownProperty { section: String, property: String },

    #[error("Section {section}, property {property}: Expected {expected}, got {found}")]
    TypeMismatch {
        section: String,
        property: String,
        expected: Allowed,
        found: Kind,
    },
}

/// Section specifiers by section name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    sections: HashMap<String, SectionSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the specifier for `name`, normalizing it.
    pub fn section(mut self, name: impl Into<String>, spec: SectionSpec) -> Self {
        self.sections.insert(name.into(), spec.normalized());
        self
    }

    pub fn get(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.get(name)
    }

    /// Build a schema from an object of loosely-typed specifiers, such as
    /// one parsed from the hconfig document
    ///
    /// ```text
    /// general once
    /// vhost { count many props { webroot string  port [number null] } }
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let specs = value.as_object().ok_or(SchemaError::NotAnObject)?;
        let mut schema = Schema::new();
        for name in sorted_keys(specs) {
            let spec = SectionSpec::from_value(name, &specs[name])?;
            schema = schema.section(name.clone(), spec);
        }
        Ok(schema)
    }

    /// Check a parsed section object. `present` says whether the section
    /// already has an entry in the result. Properties are checked in sorted
    /// order so the first violation reported is stable.
    pub fn validate(&self, section: &str, object: &Object, present: bool) -> Result<Count, Violation> {
        let spec = self
            .sections
            .get(section)
            .ok_or_else(|| Violation::UnknownSection(section.to_string()))?;

        if spec.count == Count::Once && present {
            return Err(Violation::DuplicateSection(section.to_string()));
        }

        for key in sorted_keys(object) {
            let allowed = spec.allowed(key).ok_or_else(|| Violation::UnknownProperty {
                section: section.to_string(),
                property: key.clone(),
            })?;
            let found = object[key].kind();
            if !allowed.permits(found) {
                return Err(Violation::TypeMismatch {
                    section: section.to_string(),
                    property: key.clone(),
                    expected: allowed,
                    found,
                });
            }
        }

        Ok(spec.count)
    }
}
