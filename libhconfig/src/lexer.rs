//! Token stream
//!
//! The token stream pulls characters from a [`CharSource`] through a
//! three-character window (`prev`, `curr`, `next`) and turns them into
//! tokens on demand. It holds exactly one token at a time; the parsers
//! look at it with [`TokenStream::current`] and consume it with
//! [`TokenStream::expect`].
//!
//! Lexical rules, first match wins:
//! - end of input: `Eof`
//! - `[ ] { }`: bracket and brace tokens
//! - `#`: comment to end of line, skipped
//! - space, tab, CR, LF: skipped
//! - `"..."`: string with escapes and `$(NAME)` expansion
//! - `'...'`: string taken verbatim
//! - anything else: a bare token, classified once fully collected as a
//!   bool, null, number, or unquoted string

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{trace, warn};

use crate::error::{Location, Origin, ParseError, Result, Warning, WarningKind};
use crate::source::CharSource;
use crate::vars::VarLookup;

pub(crate) static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?$").unwrap());

pub(crate) static VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\(([^\s)]+)\)").unwrap());

/// Token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    String,
    Number,
    Bool,
    Null,
    Eof,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    /// Placeholder before the first token is lexed.
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Bool => "BOOL",
            TokenKind::Null => "NULL",
            TokenKind::Eof => "EOF",
            TokenKind::OpenBracket => "OPENBRACKET",
            TokenKind::CloseBracket => "CLOSEBRACKET",
            TokenKind::OpenBrace => "OPENBRACE",
            TokenKind::CloseBrace => "CLOSEBRACE",
            TokenKind::Unknown => "UNKNOWN",
        })
    }
}

/// A single token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Line the token ended on.
    pub line: usize,
    /// String content, numeric lexeme, `true`/`false`, or the bracket.
    pub text: String,
    /// Only meaningful for `String` tokens.
    pub quoted: bool,
}

impl Token {
    fn new(kind: TokenKind, line: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            text: text.into(),
            quoted: false,
        }
    }

    fn string(text: String, line: usize, quoted: bool) -> Self {
        Self {
            kind: TokenKind::String,
            line,
            text,
            quoted,
        }
    }

    /// Whether this is the unquoted bare word `word`.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::String && !self.quoted && self.text == word
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\t' | '\n')
}

/// Whether `c` ends a bare token when it is the lookahead.
pub(crate) fn ends_bare(c: char) -> bool {
    is_space(c) || matches!(c, '#' | '[' | ']' | '{' | '}')
}

/// Lexer over a character source.
pub struct TokenStream<'v> {
    source: Box<dyn CharSource>,
    vars: &'v dyn VarLookup,
    line: usize,
    prev: Option<char>,
    curr: Option<char>,
    next: Option<char>,
    current: Token,
    warnings: Vec<Warning>,
}

impl<'v> TokenStream<'v> {
    /// Wrap `source` and lex the first token.
    pub fn new(source: Box<dyn CharSource>, vars: &'v dyn VarLookup) -> Result<Self> {
        let mut stream = Self {
            source,
            vars,
            line: 1,
            prev: None,
            curr: None,
            next: None,
            current: Token::new(TokenKind::Unknown, 1, ""),
            warnings: Vec::new(),
        };
        stream.read_char()?;
        stream.current = stream.lex()?;
        Ok(stream)
    }

    /// The token the parser is looking at.
    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn origin(&self) -> &Origin {
        self.source.origin()
    }

    /// Location of `token` in this stream's source.
    pub fn location(&self, token: &Token) -> Location {
        Location::new(self.origin().clone(), token.line)
    }

    /// Consume the current token if it is of `kind`.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let found = self.current.kind;
        if found != kind {
            let location = self.location(&self.current);
            return Err(if kind == TokenKind::Eof {
                ParseError::TrailingInput { location, found }
            } else {
                ParseError::UnexpectedToken {
                    location,
                    expected: kind,
                    found,
                }
            });
        }
        let next = self.lex()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Record a non-fatal problem at `line`.
    pub fn warn(&mut self, line: usize, kind: WarningKind) {
        let warning = Warning {
            location: Location::new(self.origin().clone(), line),
            kind,
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Hand over the warnings recorded so far.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    fn here(&self) -> Location {
        Location::new(self.origin().clone(), self.line)
    }

    /// Shift the window by one character.
    fn read_char(&mut self) -> Result<()> {
        let c = match self.source.next_char() {
            Ok(c) => c,
            Err(source) => {
                return Err(ParseError::Read {
                    location: self.here(),
                    source,
                })
            }
        };
        self.prev = self.curr;
        self.curr = self.next;
        self.next = c;
        if self.prev == Some('\n') {
            self.line += 1;
        }
        Ok(())
    }

    fn lex(&mut self) -> Result<Token> {
        let token = self.lex_token()?;
        trace!(kind = %token.kind, line = token.line, text = %token.text, "token");
        Ok(token)
    }

    fn lex_token(&mut self) -> Result<Token> {
        loop {
            self.read_char()?;
            let line = self.line;
            let c = match self.curr {
                None => return Ok(Token::new(TokenKind::Eof, line, "")),
                Some(c) => c,
            };
            match c {
                '[' => return Ok(Token::new(TokenKind::OpenBracket, line, "[")),
                ']' => return Ok(Token::new(TokenKind::CloseBracket, line, "]")),
                '{' => return Ok(Token::new(TokenKind::OpenBrace, line, "{")),
                '}' => return Ok(Token::new(TokenKind::CloseBrace, line, "}")),
                '#' => {
                    while !matches!(self.next, Some('\n') | None) {
                        self.read_char()?;
                    }
                }
                c if is_space(c) => {
                    while self.next.is_some_and(is_space) {
                        self.read_char()?;
                    }
                }
                '"' => return self.double_quoted(),
                '\'' => return self.single_quoted(),
                c => return self.bare(c),
            }
        }
    }

    fn double_quoted(&mut self) -> Result<Token> {
        let mut content = String::new();
        loop {
            self.read_char()?;
            match self.curr {
                None => return Err(ParseError::UnterminatedString(self.here())),
                Some('"') => break,
                Some('\\') => {
                    self.read_char()?;
                    let c = match self.curr {
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.unicode_escape()?,
                        Some(other) => return Err(ParseError::InvalidEscape(self.here(), other)),
                        None => return Err(ParseError::UnterminatedString(self.here())),
                    };
                    content.push(c);
                }
                Some(c) => content.push(c),
            }
        }
        let line = self.line;
        let content = self.expand_vars(&content, line);
        Ok(Token::string(content, line, true))
    }

    /// The four hex digits after `\u`.
    fn unicode_escape(&mut self) -> Result<char> {
        let mut hex = String::new();
        for _ in 0..4 {
            self.read_char()?;
            match self.curr {
                Some(c) => hex.push(c),
                None => break,
            }
        }
        let decoded = if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
        } else {
            None
        };
        decoded.ok_or_else(|| ParseError::InvalidUnicodeEscape(self.here(), hex))
    }

    /// Replace each `$(NAME)` with the variable's value. The replacement
    /// text is not scanned again.
    fn expand_vars(&mut self, content: &str, line: usize) -> String {
        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        let mut unset = Vec::new();
        for caps in VARIABLE.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&content[last..whole.start()]);
            match self.vars.lookup(name.as_str()) {
                Some(value) => out.push_str(&value),
                None => unset.push(name.as_str().to_string()),
            }
            last = whole.end();
        }
        out.push_str(&content[last..]);
        for name in unset {
            self.warn(line, WarningKind::UnsetVariable(name));
        }
        out
    }

    fn single_quoted(&mut self) -> Result<Token> {
        let mut content = String::new();
        loop {
            self.read_char()?;
            match self.curr {
                None => return Err(ParseError::UnterminatedString(self.here())),
                Some('\'') => break,
                Some(c) => content.push(c),
            }
        }
        Ok(Token::string(content, self.line, true))
    }

    fn bare(&mut self, first: char) -> Result<Token> {
        let mut content = String::from(first);
        while let Some(c) = self.next.filter(|&c| !ends_bare(c)) {
            content.push(c);
            self.read_char()?;
        }
        let line = self.line;
        Ok(match content.as_str() {
            "true" | "false" => Token::new(TokenKind::Bool, line, content),
            "null" => Token::new(TokenKind::Null, line, content),
            _ if NUMBER.is_match(&content) => Token::new(TokenKind::Number, line, content),
            _ => Token::string(content, line, false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StrSource;
    use crate::vars::MapVars;

    fn lex_all(input: &str, vars: &dyn VarLookup) -> Result<Vec<Token>> {
        let mut stream = TokenStream::new(Box::new(StrSource::new(input)), vars)?;
        let mut tokens = Vec::new();
        while stream.current().kind != TokenKind::Eof {
            let kind = stream.current().kind;
            tokens.push(stream.expect(kind)?);
        }
        Ok(tokens)
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex_all(input, &MapVars::new())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single(input: &str) -> Token {
        let mut tokens = lex_all(input, &MapVars::new()).unwrap();
        assert_eq!(tokens.len(), 1, "expected one token in {:?}", input);
        tokens.remove(0)
    }

    #[test]
    fn test_brackets_and_braces() {
        assert_eq!(
            kinds("[]{}"),
            vec![
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(kinds("").is_empty());
        assert!(kinds("  \n\t\r\n ").is_empty());
        assert!(kinds("# only a comment").is_empty());
    }

    #[test]
    fn test_bare_classification() {
        assert_eq!(single("true").kind, TokenKind::Bool);
        assert_eq!(single("false").kind, TokenKind::Bool);
        assert_eq!(single("null").kind, TokenKind::Null);
        assert_eq!(single("-10").kind, TokenKind::Number);
        assert_eq!(single("105.99E+5").kind, TokenKind::Number);
        assert_eq!(single("1e-3").kind, TokenKind::Number);

        let t = single("hello-world");
        assert_eq!(t.kind, TokenKind::String);
        assert!(!t.quoted);

        // Partial numbers and keyword prefixes stay strings.
        assert_eq!(single("10.").kind, TokenKind::String);
        assert_eq!(single(".5").kind, TokenKind::String);
        assert_eq!(single("1e").kind, TokenKind::String);
        assert_eq!(single("truest").kind, TokenKind::String);
        assert_eq!(single("٣").kind, TokenKind::String);
    }

    #[test]
    fn test_multi_dot_is_one_string() {
        let t = single("10.44.55");
        assert_eq!(t.kind, TokenKind::String);
        assert_eq!(t.text, "10.44.55");
    }

    #[test]
    fn test_bare_stops_at_delimiters() {
        let tokens = lex_all("a{b}c[d]e#x\nf", &MapVars::new()).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "{", "b", "}", "c", "[", "d", "]", "e", "f"]);
    }

    #[test]
    fn test_bare_keeps_punctuation() {
        assert_eq!(single("/var/www/html").text, "/var/www/html");
        assert_eq!(single("a\"b'c").text, "a\"b'c");
    }

    #[test]
    fn test_comment_is_transparent() {
        assert_eq!(
            kinds("# leading\nfoo # trailing\n# another\n10"),
            vec![TokenKind::String, TokenKind::Number]
        );
    }

    #[test]
    fn test_double_quoted_escapes() {
        let t = single(r#""\\\\ \" \f \n \r \t \u4444 \b""#);
        assert_eq!(t.text, "\\\\ \" \u{c} \n \r \t \u{4444} \u{8}");
        assert!(t.quoted);
        assert_eq!(single(r#""éé""#).text, "éé");
    }

    #[test]
    fn test_quoted_keywords_stay_strings() {
        let t = single("\"true\"");
        assert_eq!(t.kind, TokenKind::String);
        assert_eq!(single("'10'").kind, TokenKind::String);
        assert!(!single("\"include\"").is_keyword("include"));
        assert!(single("include").is_keyword("include"));
    }

    #[test]
    fn test_invalid_escape() {
        let err = lex_all(r#""\q""#, &MapVars::new()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidEscape(_, 'q')));
    }

    #[test]
    fn test_invalid_unicode_escape() {
        let err = lex_all(r#""\u12g4""#, &MapVars::new()).unwrap_err();
        match err {
            ParseError::InvalidUnicodeEscape(location, hex) => {
                assert_eq!(hex, "12g4");
                assert_eq!(location.line, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(matches!(
            lex_all(r#""\ud800""#, &MapVars::new()),
            Err(ParseError::InvalidUnicodeEscape(..))
        ));
        assert!(lex_all(r#""\u12"#, &MapVars::new()).is_err());
    }

    #[test]
    fn test_unterminated_strings() {
        assert!(matches!(
            lex_all("\"abc", &MapVars::new()),
            Err(ParseError::UnterminatedString(_))
        ));
        assert!(matches!(
            lex_all("'abc", &MapVars::new()),
            Err(ParseError::UnterminatedString(_))
        ));
        assert!(matches!(
            lex_all("\"abc\\", &MapVars::new()),
            Err(ParseError::UnterminatedString(_))
        ));
    }

    #[test]
    fn test_single_quoted_is_verbatim() {
        let t = single(r"'$(FOO) \t'");
        assert_eq!(t.text, r"$(FOO) \t");
        assert!(t.quoted);
    }

    #[test]
    fn test_variable_expansion() {
        let vars = MapVars::new().set("USER", "alice").set("LOOP", "$(USER)");
        let tokens = lex_all(r#""/home/$(USER)/$(LOOP)""#, &vars).unwrap();
        assert_eq!(tokens[0].text, "/home/alice/$(USER)");
    }

    #[test]
    fn test_unset_variable_warns() {
        let vars = MapVars::new().set("A", "x");
        let mut stream = TokenStream::new(
            Box::new(StrSource::new("\n\"$(A)-$(MISSING)-$(A)\"")),
            &vars,
        )
        .unwrap();
        assert_eq!(stream.current().text, "x--x");
        let warnings = stream.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].location.line, 2);
        assert_eq!(
            warnings[0].kind,
            WarningKind::UnsetVariable("MISSING".into())
        );
        assert!(stream.take_warnings().is_empty());
    }

    #[test]
    fn test_bare_tokens_are_not_expanded() {
        let vars = MapVars::new().set("A", "x");
        let tokens = lex_all("$(A)", &vars).unwrap();
        assert_eq!(tokens[0].text, "$(A)");
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex_all("a\nb\n\n  c # x\n'd\ne'", &MapVars::new()).unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 6]);
    }

    #[test]
    fn test_expect_mismatch() {
        let vars = MapVars::new();
        let mut stream = TokenStream::new(Box::new(StrSource::new("\n\n10")), &vars).unwrap();
        match stream.expect(TokenKind::String) {
            Err(ParseError::UnexpectedToken {
                location,
                expected,
                found,
            }) => {
                assert_eq!(location.line, 3);
                assert_eq!(expected, TokenKind::String);
                assert_eq!(found, TokenKind::Number);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            stream.expect(TokenKind::Eof),
            Err(ParseError::TrailingInput {
                found: TokenKind::Number,
                ..
            })
        ));
    }

    #[test]
    fn test_eof_repeats() {
        let vars = MapVars::new();
        let mut stream = TokenStream::new(Box::new(StrSource::new("x")), &vars).unwrap();
        stream.expect(TokenKind::String).unwrap();
        stream.expect(TokenKind::Eof).unwrap();
        stream.expect(TokenKind::Eof).unwrap();
        assert_eq!(stream.current().kind, TokenKind::Eof);
    }
}
