//! Error and warning types for hconfig parsing.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::lexer::TokenKind;
use crate::schema::Violation;

/// Result type for hconfig parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Where a character source came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// A file on disk, as it was opened.
    File(PathBuf),
    /// An in-memory string.
    Str,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Str => write!(f, "<string input>"),
        }
    }
}

/// A source origin plus a 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub origin: Origin,
    pub line: usize,
}

impl Location {
    pub fn new(origin: Origin, line: usize) -> Self {
        Self { origin, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.line)
    }
}

/// Fatal parse error. Any of these rejects the whole input.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The primary input file could not be opened.
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the character source failed.
    #[error("{location}: Read error: {source}")]
    Read {
        location: Location,
        #[source]
        source: io::Error,
    },

    /// Unknown escape sequence in a double-quoted string.
    #[error("{0}: Invalid escape sequence: \\{1}")]
    InvalidEscape(Location, char),

    /// `\u` not followed by four hex digits naming a scalar value.
    #[error("{0}: Invalid escape sequence: \\u{1}")]
    InvalidUnicodeEscape(Location, String),

    /// End of input inside a quoted string.
    #[error("{0}: Unterminated string")]
    UnterminatedString(Location),

    /// A numeric token that did not convert to a float.
    #[error("{0}: Invalid number {1}")]
    InvalidNumber(Location, String),

    /// The current token is not the kind the grammar requires.
    #[error("{location}: Expected {expected}, got {found}")]
    UnexpectedToken {
        location: Location,
        expected: TokenKind,
        found: TokenKind,
    },

    /// Content after a complete document.
    #[error("{location}: Unexpected trailing input: {found}")]
    TrailingInput { location: Location, found: TokenKind },

    /// A token that cannot start a value.
    #[error("{location}: Unexpected token {found}")]
    UnexpectedValue { location: Location, found: TokenKind },

    /// A file tried to include itself.
    #[error("{0}: Attempted to include self")]
    IncludeSelf(Location),

    /// A section was rejected by the schema.
    #[error("{location}: {violation}")]
    Schema {
        location: Location,
        #[source]
        violation: Violation,
    },
}

impl ParseError {
    /// The location the error was raised at, if it has one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            ParseError::Open { .. } => None,
            ParseError::Read { location, .. }
            | ParseError::UnexpectedToken { location, .. }
            | ParseError::TrailingInput { location, .. }
            | ParseError::UnexpectedValue { location, .. }
            | ParseError::Schema { location, .. } => Some(location),
            ParseError::InvalidEscape(location, _)
            | ParseError::InvalidUnicodeEscape(location, _)
            | ParseError::UnterminatedString(location)
            | ParseError::InvalidNumber(location, _)
            | ParseError::IncludeSelf(location) => Some(location),
        }
    }
}

/// Error building a schema from section specifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema document is not an object of specifiers.
    #[error("Schema must be an object of section specifiers")]
    NotAnObject,

    /// A single section specifier is malformed.
    #[error("Invalid section specifier for {section}: {reason}")]
    InvalidSpecifier { section: String, reason: String },
}

impl SchemaError {
    pub(crate) fn specifier(section: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidSpecifier {
            section: section.to_string(),
            reason: reason.into(),
        }
    }
}

/// What a non-fatal warning is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// `$(NAME)` referenced a variable that is not set.
    UnsetVariable(String),
    /// An included file could not be opened and was skipped.
    IncludeFailed { path: PathBuf, reason: String },
}

/// A non-fatal problem. Parsing continued past it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub location: Location,
    pub kind: WarningKind,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::UnsetVariable(name) => write!(
                f,
                "{}: Environment variable {} doesn't exist",
                self.location, name
            ),
            WarningKind::IncludeFailed { path, reason } => write!(
                f,
                "{}: Skipping include of {}: {}",
                self.location,
                path.display(),
                reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let file = Location::new(Origin::File(PathBuf::from("conf/main.hcnf")), 4);
        assert_eq!(file.to_string(), "conf/main.hcnf:4");
        let string = Location::new(Origin::Str, 1);
        assert_eq!(string.to_string(), "<string input>:1");
    }

    #[test]
    fn test_error_messages() {
        let err = ParseError::UnexpectedToken {
            location: Location::new(Origin::Str, 2),
            expected: TokenKind::String,
            found: TokenKind::Number,
        };
        assert_eq!(err.to_string(), "<string input>:2: Expected STRING, got NUMBER");

        let err = ParseError::TrailingInput {
            location: Location::new(Origin::Str, 1),
            found: TokenKind::CloseBrace,
        };
        assert_eq!(
            err.to_string(),
            "<string input>:1: Unexpected trailing input: CLOSEBRACE"
        );
        assert_eq!(err.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning {
            location: Location::new(Origin::Str, 3),
            kind: WarningKind::UnsetVariable("HOME_DIR".into()),
        };
        assert_eq!(
            warning.to_string(),
            "<string input>:3: Environment variable HOME_DIR doesn't exist"
        );
    }
}
