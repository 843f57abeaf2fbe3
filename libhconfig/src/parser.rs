//! Value parser
//!
//! Recursive descent over the token stream:
//!
//! ```text
//! value  := BOOL | NULL | STRING | NUMBER | array | object
//! array  := '[' value* ']'
//! object := '{' (STRING value)* '}'
//! ```
//!
//! No separators are needed between array elements or object entries.

use crate::error::{ParseError, Result};
use crate::lexer::{TokenKind, TokenStream};
use crate::value::{Object, Value};

/// Parse a whole document. With `include_root` the document is exactly one
/// value; otherwise it is an object body without the surrounding braces.
/// Either way nothing may follow.
pub fn parse_document(stream: &mut TokenStream<'_>, include_root: bool) -> Result<Value> {
    let value = if include_root {
        parse_value(stream)?
    } else {
        Value::Object(parse_object(stream, false)?)
    };
    stream.expect(TokenKind::Eof)?;
    Ok(value)
}

/// Parse the value starting at the current token.
pub fn parse_value(stream: &mut TokenStream<'_>) -> Result<Value> {
    match stream.current().kind {
        TokenKind::OpenBracket => parse_array(stream).map(Value::Array),
        TokenKind::OpenBrace => parse_object(stream, true).map(Value::Object),
        TokenKind::Null => {
            stream.expect(TokenKind::Null)?;
            Ok(Value::Null)
        }
        TokenKind::Bool => {
            let token = stream.expect(TokenKind::Bool)?;
            Ok(Value::Bool(token.text == "true"))
        }
        TokenKind::String => {
            let token = stream.expect(TokenKind::String)?;
            Ok(Value::String(token.text))
        }
        TokenKind::Number => {
            let token = stream.expect(TokenKind::Number)?;
            match token.text.parse::<f64>() {
                Ok(n) => Ok(Value::Number(n)),
                Err(_) => Err(ParseError::InvalidNumber(
                    stream.location(&token),
                    token.text,
                )),
            }
        }
        found => Err(ParseError::UnexpectedValue {
            location: stream.location(stream.current()),
            found,
        }),
    }
}

/// Parse `[ value* ]`.
pub fn parse_array(stream: &mut TokenStream<'_>) -> Result<Vec<Value>> {
    stream.expect(TokenKind::OpenBracket)?;
    let mut items = Vec::new();
    while stream.current().kind != TokenKind::CloseBracket {
        items.push(parse_value(stream)?);
    }
    stream.expect(TokenKind::CloseBracket)?;
    Ok(items)
}

/// Parse `key value` pairs. With `braces` the pairs are wrapped in `{ }`;
/// without, they run until `}` or the end of input, which are left for the
/// caller.
pub fn parse_object(stream: &mut TokenStream<'_>, braces: bool) -> Result<Object> {
    if braces {
        stream.expect(TokenKind::OpenBrace)?;
    }
    let mut object = Object::new();
    loop {
        match stream.current().kind {
            TokenKind::CloseBrace => break,
            TokenKind::Eof if !braces => break,
            _ => {}
        }
        let key = stream.expect(TokenKind::String)?.text;
        let value = parse_value(stream)?;
        object.insert(key, value);
    }
    if braces {
        stream.expect(TokenKind::CloseBrace)?;
    }
    Ok(object)
}
