//! Encode hconfig values to text.
//!
//! Both encoders write object keys in sorted order so output is stable.

use crate::lexer::{ends_bare, NUMBER, VARIABLE};
use crate::sections::{Sections, NAME_KEY};
use crate::value::{Object, Value};

/// Output format for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// hconfig text (canonical)
    Hconfig,
    /// JSON (standard)
    Json,
}

/// Encode a value in the specified format.
///
/// For [`Format::Hconfig`] a top-level object is written as a document body,
/// one `key value` per line without surrounding braces, which is what
/// [`crate::parse_str`] reads back with `include_root` unset. Any other
/// top-level value is written as a single root value.
pub fn encode(value: &Value, format: Format) -> String {
    match format {
        Format::Hconfig => match value {
            Value::Object(obj) if !obj.is_empty() => encode_body(obj, 0),
            _ => encode_hconfig(value, 0),
        },
        Format::Json => encode_json(value, 0),
    }
}

/// Encode parsed sections as a sectioned document.
///
/// Sections come out sorted by name, repeated sections in the order they
/// were parsed. The label is written after the section name unless it is
/// null.
pub fn encode_sections(sections: &Sections) -> String {
    let mut names: Vec<&String> = sections.iter().map(|(name, _)| name).collect();
    names.sort();

    let mut out = Vec::new();
    for name in names {
        for object in sections.all(name) {
            let mut head = encode_string(name);
            match object.get(NAME_KEY) {
                None | Some(Value::Null) => {}
                Some(label) => {
                    head.push(' ');
                    head.push_str(&encode_hconfig(label, 0));
                }
            }

            let body: Object = object
                .iter()
                .filter(|(key, _)| key.as_str() != NAME_KEY)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if body.is_empty() {
                out.push(format!("{} {{}}", head));
            } else {
                out.push(format!("{} {{\n{}\n}}", head, encode_body(&body, 1)));
            }
        }
    }
    out.join("\n")
}

// =============================================================================
// hconfig Encoder
// =============================================================================

fn encode_hconfig(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Number(n) => encode_number(*n),
        Value::String(s) => encode_string(s),
        Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else if arr.iter().all(is_scalar) {
                let items: Vec<String> = arr.iter().map(|v| encode_hconfig(v, 0)).collect();
                format!("[{}]", items.join(" "))
            } else {
                let pad1 = "  ".repeat(indent + 1);
                let items: Vec<String> = arr
                    .iter()
                    .map(|v| format!("{}{}", pad1, encode_hconfig(v, indent + 1)))
                    .collect();
                format!("[\n{}\n{}]", items.join("\n"), pad)
            }
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else {
                format!("{{\n{}\n{}}}", encode_body(obj, indent + 1), pad)
            }
        }
    }
}

/// `key value` lines at `indent`, keys sorted.
fn encode_body(obj: &Object, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let mut keys: Vec<&String> = obj.keys().collect();
    keys.sort();
    keys.iter()
        .map(|k| {
            format!(
                "{}{} {}",
                pad,
                encode_string(k),
                encode_hconfig(&obj[*k], indent)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_scalar(v: &Value) -> bool {
    !matches!(v, Value::Array(_) | Value::Object(_))
}

fn encode_number(n: f64) -> String {
    if n.is_finite() {
        format!("{}", n)
    } else {
        "null".to_string()
    }
}

/// Whether `s` lexes back, unquoted, as the bare string `s`.
fn is_bare(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        None | Some('"') | Some('\'') => return false,
        Some(_) => {}
    }
    !matches!(s, "true" | "false" | "null" | "include")
        && !NUMBER.is_match(s)
        && s.chars().all(|c| !ends_bare(c) && !c.is_control())
}

fn encode_string(s: &str) -> String {
    if is_bare(s) {
        s.to_string()
    } else if VARIABLE.is_match(s) && !s.contains('\'') {
        // Double quotes would expand the reference.
        format!("'{}'", s)
    } else {
        encode_quoted(s)
    }
}

fn encode_quoted(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0c' => result.push_str("\\f"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

// =============================================================================
// JSON Encoder
// =============================================================================

fn encode_json(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let pad1 = "  ".repeat(indent + 1);

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        // JSON has no NaN or infinities.
        Value::Number(n) => encode_number(*n),
        Value::String(s) => encode_json_string(s),
        Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else {
                let items: Vec<String> = arr
                    .iter()
                    .map(|v| format!("{}{}", pad1, encode_json(v, indent + 1)))
                    .collect();
                format!("[\n{}\n{}]", items.join(",\n"), pad)
            }
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                let items: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        format!(
                            "{}{}: {}",
                            pad1,
                            encode_json_string(k),
                            encode_json(&obj[*k], indent + 1)
                        )
                    })
                    .collect();
                format!("{{\n{}\n{}}}", items.join(",\n"), pad)
            }
        }
    }
}

fn encode_json_string(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0c' => result.push_str("\\f"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}
