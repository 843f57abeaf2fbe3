//! Parse entry points with pluggable variables and file access.

use std::path::Path;

use crate::error::{ParseError, Result, Warning};
use crate::lexer::TokenStream;
use crate::parser::parse_document;
use crate::schema::Schema;
use crate::sections::{SectionParser, Sections};
use crate::source::{CharSource, FsOpener, SourceOpener, StrSource};
use crate::value::Value;
use crate::vars::{ProcessEnv, VarLookup};

/// Parses hconfig documents.
///
/// A loader owns the variable lookup used for `$(NAME)` expansion, the
/// opener used for input files and `include`s, and the warnings recorded by
/// every parse it has run.
///
/// ```
/// use libhconfig::{Loader, MapVars, Value};
///
/// let mut loader = Loader::new().with_vars(MapVars::new().set("HOST", "example.com"));
/// let value = loader.value_from_str("host \"$(HOST)\"", false).unwrap();
/// assert_eq!(value.get("host"), Some(&Value::from("example.com")));
/// assert!(loader.warnings().is_empty());
/// ```
pub struct Loader {
    vars: Box<dyn VarLookup>,
    opener: Box<dyn SourceOpener>,
    warnings: Vec<Warning>,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            vars: Box::new(ProcessEnv),
            opener: Box::new(FsOpener),
            warnings: Vec::new(),
        }
    }
}

impl Loader {
    /// A loader reading the process environment and the local filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(mut self, vars: impl VarLookup + 'static) -> Self {
        self.vars = Box::new(vars);
        self
    }

    pub fn with_opener(mut self, opener: impl SourceOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    /// Warnings recorded so far, oldest first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Parse a value. See [`crate::parse_str`] for `include_root`.
    pub fn value_from_source(
        &mut self,
        source: Box<dyn CharSource>,
        include_root: bool,
    ) -> Result<Value> {
        let mut stream = TokenStream::new(source, self.vars.as_ref())?;
        let result = parse_document(&mut stream, include_root);
        self.warnings.extend(stream.take_warnings());
        result
    }

    pub fn value_from_str(&mut self, input: &str, include_root: bool) -> Result<Value> {
        self.value_from_source(Box::new(StrSource::new(input)), include_root)
    }

    pub fn value_from_file(&mut self, path: impl AsRef<Path>, include_root: bool) -> Result<Value> {
        let source = self.open(path.as_ref())?;
        self.value_from_source(source, include_root)
    }

    /// Parse a sectioned document, checking it against `schema` when given.
    pub fn sections_from_source(
        &mut self,
        source: Box<dyn CharSource>,
        schema: Option<&Schema>,
    ) -> Result<Sections> {
        let mut sections = Sections::new();
        SectionParser {
            schema,
            opener: self.opener.as_ref(),
            vars: self.vars.as_ref(),
            sections: &mut sections,
            warnings: &mut self.warnings,
        }
        .parse(source)?;
        Ok(sections)
    }

    pub fn sections_from_str(&mut self, input: &str, schema: Option<&Schema>) -> Result<Sections> {
        self.sections_from_source(Box::new(StrSource::new(input)), schema)
    }

    /// Parse a sectioned file. Relative `include`s resolve against the
    /// file's directory.
    pub fn sections_from_file(
        &mut self,
        path: impl AsRef<Path>,
        schema: Option<&Schema>,
    ) -> Result<Sections> {
        let source = self.open(path.as_ref())?;
        self.sections_from_source(source, schema)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn CharSource>> {
        self.opener.open(path).map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })
    }
}
