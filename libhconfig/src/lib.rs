//! hconfig parser implementation.
//!
//! hconfig is a small configuration language: bare words, quoted strings,
//! numbers, booleans, `null`, `[ ]` arrays and `{ }` objects, with no
//! separators and `#` comments. Double-quoted strings expand `$(NAME)`
//! variables.
//!
//! # Parsing Modes
//!
//! - **Values**: a document is an object body (`key value ...`) or, with
//!   `include_root`, a single value. See [`parse_str`].
//!
//! - **Sections**: a document is a list of `name [label] { ... }` sections and
//!   `include <path>` statements, optionally checked against a [`Schema`].
//!   See [`parse_sections_str`].
//!
//! # Parsing Pipeline
//!
//! 1. **Character source**: yields one character at a time from a file or a
//!    string.
//!
//! 2. **Token stream**: turns characters into tokens through a three
//!    character window, expanding variables and recording warnings.
//!
//! 3. **Value and section parsers**: recursive descent over the token stream.

mod encode;
mod error;
mod lexer;
mod loader;
mod parser;
mod schema;
mod sections;
mod source;
mod value;
mod vars;

use std::path::Path;

pub use encode::{encode, encode_sections, Format};
pub use error::{
    Location, Origin, ParseError, Result, SchemaError, Warning, WarningKind,
};
pub use lexer::{Token, TokenKind, TokenStream};
pub use loader::Loader;
pub use schema::{Allowed, Count, KindSet, Schema, SectionSpec, Violation, WILDCARD};
pub use sections::{SectionEntry, Sections, NAME_KEY};
pub use source::{normalize_path, CharSource, FileSource, FsOpener, SourceOpener, StrSource};
pub use value::{Kind, Object, Value};
pub use vars::{MapVars, ProcessEnv, VarLookup};

/// Parse an hconfig document from a string.
///
/// With `include_root` the document must be exactly one value. Without it
/// the document is the body of an object, written without braces.
/// Variables come from the process environment; warnings are logged.
///
/// # Example
///
/// ```
/// use libhconfig::{parse_str, Value};
///
/// let value = parse_str("port 8080 hosts [a b]", false).unwrap();
/// assert_eq!(value.get("port"), Some(&Value::from(8080)));
///
/// assert_eq!(parse_str("[10 true]", true).unwrap(),
///            Value::Array(vec![Value::from(10), Value::from(true)]));
/// ```
pub fn parse_str(input: &str, include_root: bool) -> Result<Value> {
    Loader::new().value_from_str(input, include_root)
}

/// Parse an hconfig document from a file.
pub fn parse_file(path: impl AsRef<Path>, include_root: bool) -> Result<Value> {
    Loader::new().value_from_file(path, include_root)
}

/// Parse a sectioned document from a string.
///
/// Relative `include` paths are used as given, since a string has no
/// directory.
///
/// # Example
///
/// ```
/// use libhconfig::{parse_sections_str, Value};
///
/// let sections = parse_sections_str("vhost example.com { port 80 }", None).unwrap();
/// let vhost = &sections.all("vhost")[0];
/// assert_eq!(vhost.get("name"), Some(&Value::from("example.com")));
/// ```
pub fn parse_sections_str(input: &str, schema: Option<&Schema>) -> Result<Sections> {
    Loader::new().sections_from_str(input, schema)
}

/// Parse a sectioned document from a file, following `include`s relative to
/// the including file.
pub fn parse_sections_file(path: impl AsRef<Path>, schema: Option<&Schema>) -> Result<Sections> {
    Loader::new().sections_from_file(path, schema)
}
