//! CBOR output for hconfig values.
//!
//! Numbers are always written as float64 (`0xfb`), since hconfig has no
//! integers and a reader should see the same type for `1` and `1.5`. Object
//! keys are written in sorted order so the bytes are stable.

use libhconfig::Value;

const TEXT: u8 = 3;
const ARRAY: u8 = 4;
const MAP: u8 = 5;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const NULL: u8 = 0xf6;
const FLOAT64: u8 = 0xfb;

/// Encode an hconfig value as CBOR bytes.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.push(NULL),
        Value::Bool(b) => buf.push(if *b { TRUE } else { FALSE }),
        Value::Number(n) => {
            buf.push(FLOAT64);
            buf.extend_from_slice(&n.to_be_bytes());
        }
        Value::String(s) => write_text(buf, s),
        Value::Array(items) => {
            write_head(buf, ARRAY, items.len());
            for item in items {
                write_value(buf, item);
            }
        }
        Value::Object(obj) => {
            let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            write_head(buf, MAP, entries.len());
            for (key, item) in entries {
                write_text(buf, key);
                write_value(buf, item);
            }
        }
    }
}

fn write_text(buf: &mut Vec<u8>, s: &str) {
    write_head(buf, TEXT, s.len());
    buf.extend_from_slice(s.as_bytes());
}

/// Initial byte plus the shortest big-endian length argument.
fn write_head(buf: &mut Vec<u8>, major: u8, len: usize) {
    let len = len as u64;
    let major = major << 5;
    if len < 24 {
        buf.push(major | len as u8);
        return;
    }
    // Additional info 24, 25, 26, 27 select 1, 2, 4, 8 argument bytes.
    let (info, width) = if len <= u8::MAX as u64 {
        (24, 1)
    } else if len <= u16::MAX as u64 {
        (25, 2)
    } else if len <= u32::MAX as u64 {
        (26, 4)
    } else {
        (27, 8)
    };
    buf.push(major | info);
    buf.extend_from_slice(&len.to_be_bytes()[8 - width..]);
}
