//! Section parser
//!
//! A sectioned document is a list of statements:
//!
//! ```text
//! statement := ('include' STRING) | section
//! section   := STRING value? object
//! ```
//!
//! Each section's optional label is stored under the reserved `name` key of
//! its object. Objects are checked against the schema, if there is one, and
//! collected into [`Sections`]. Included files feed the same [`Sections`].

use std::collections::hash_map;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Location, Origin, ParseError, Result, Warning, WarningKind};
use crate::lexer::{TokenKind, TokenStream};
use crate::parser::{parse_object, parse_value};
use crate::schema::{Count, Schema};
use crate::source::{normalize_path, CharSource, SourceOpener};
use crate::value::{Object, Value};
use crate::vars::VarLookup;

/// Key holding a section's label.
pub const NAME_KEY: &str = "name";

/// The objects collected for one section name.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionEntry {
    /// A section the schema allows once.
    Once(Object),
    /// A section that may repeat, in document order.
    Many(Vec<Object>),
}

impl SectionEntry {
    /// The entry's objects as a slice.
    pub fn objects(&self) -> &[Object] {
        match self {
            SectionEntry::Once(object) => std::slice::from_ref(object),
            SectionEntry::Many(objects) => objects,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            SectionEntry::Once(object) => Value::Object(object.clone()),
            SectionEntry::Many(objects) => {
                Value::Array(objects.iter().cloned().map(Value::Object).collect())
            }
        }
    }
}

/// Parsed sections by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    entries: HashMap<String, SectionEntry>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SectionEntry> {
        self.entries.get(name)
    }

    /// The object of a section stored once.
    pub fn one(&self, name: &str) -> Option<&Object> {
        match self.entries.get(name) {
            Some(SectionEntry::Once(object)) => Some(object),
            _ => None,
        }
    }

    /// Every object stored under `name`; empty when there are none.
    pub fn all(&self, name: &str) -> &[Object] {
        self.entries
            .get(name)
            .map(SectionEntry::objects)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, SectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An object mapping each name to its object (`Once`) or to an array of
    /// objects (`Many`).
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.to_value()))
                .collect(),
        )
    }

    fn insert(&mut self, name: String, count: Count, object: Object) {
        let entry = match count {
            Count::Once => {
                self.entries.insert(name, SectionEntry::Once(object));
                return;
            }
            Count::Many => self
                .entries
                .entry(name)
                .or_insert_with(|| SectionEntry::Many(Vec::new())),
        };
        if let SectionEntry::Many(objects) = entry {
            objects.push(object);
            return;
        }
        *entry = SectionEntry::Many(vec![object]);
    }
}

impl<'a> IntoIterator for &'a Sections {
    type Item = (&'a String, &'a SectionEntry);
    type IntoIter = hash_map::Iter<'a, String, SectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// State shared by one parse and every file it includes.
pub(crate) struct SectionParser<'a> {
    pub schema: Option<&'a Schema>,
    pub opener: &'a dyn SourceOpener,
    pub vars: &'a dyn VarLookup,
    pub sections: &'a mut Sections,
    pub warnings: &'a mut Vec<Warning>,
}

impl SectionParser<'_> {
    /// Parse every statement of `source`.
    pub fn parse(&mut self, source: Box<dyn CharSource>) -> Result<()> {
        let mut stream = TokenStream::new(source, self.vars)?;
        let result = self.statements(&mut stream);
        self.warnings.extend(stream.take_warnings());
        result
    }

    fn statements(&mut self, stream: &mut TokenStream<'_>) -> Result<()> {
        while stream.current().kind != TokenKind::Eof {
            if stream.current().is_keyword("include") {
                self.include(stream)?;
            } else {
                self.section(stream)?;
            }
        }
        Ok(())
    }

    fn include(&mut self, stream: &mut TokenStream<'_>) -> Result<()> {
        stream.expect(TokenKind::String)?;
        let token = stream.expect(TokenKind::String)?;
        let target = PathBuf::from(&token.text);

        let current = match stream.origin() {
            Origin::File(path) => Some(path.clone()),
            Origin::Str => None,
        };
        let path = match &current {
            Some(current) if target.is_relative() => current
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&target),
            _ => target,
        };
        if let Some(current) = &current {
            if normalize_path(&path) == normalize_path(current) {
                return Err(ParseError::IncludeSelf(stream.location(&token)));
            }
        }

        // Keep warnings in document order across the include.
        self.warnings.extend(stream.take_warnings());

        match self.opener.open(&path) {
            Ok(source) => {
                debug!(path = %path.display(), "including");
                self.parse(source)
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "include failed");
                stream.warn(
                    token.line,
                    WarningKind::IncludeFailed {
                        path,
                        reason: err.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    fn section(&mut self, stream: &mut TokenStream<'_>) -> Result<()> {
        let name = stream.expect(TokenKind::String)?;
        let label = if stream.current().kind == TokenKind::OpenBrace {
            Value::Null
        } else {
            parse_value(stream)?
        };
        let mut object = parse_object(stream, true)?;
        object.insert(NAME_KEY.to_string(), label);

        let location = stream.location(&name);
        self.insert(location, name.text, object)
    }

    fn insert(&mut self, location: Location, name: String, object: Object) -> Result<()> {
        let count = match self.schema {
            None => Count::Many,
            Some(schema) => schema
                .validate(&name, &object, self.sections.contains(&name))
                .map_err(|violation| ParseError::Schema {
                    location,
                    violation,
                })?,
        };
        self.sections.insert(name, count, object);
        Ok(())
    }
}
