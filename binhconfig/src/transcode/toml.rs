//! TOML transcoding: convert hconfig values to TOML text.
//!
//! Mapping from hconfig to TOML:
//!   - Value::Null    -> error (TOML has no null)
//!   - Value::Bool    -> TOML boolean
//!   - Value::Number  -> TOML integer when integral and exactly representable,
//!                       TOML float otherwise
//!   - Value::String  -> TOML string
//!   - Value::Array   -> TOML array (objects become inline tables)
//!   - Value::Object  -> TOML table
//!
//! TOML requires the top-level value to be a table; other values error.
//! Section documents usually contain `name null` for unlabeled sections, so
//! they only convert when every section has a label.

use libhconfig::Value;
use toml_edit::DocumentMut;

use super::as_integer;

/// Encode an hconfig Value as a TOML string.
pub fn encode(value: &Value) -> Result<String, String> {
    match value_to_toml(value)? {
        toml_edit::Item::Table(table) => {
            let mut doc = DocumentMut::new();
            for (key, item) in table.iter() {
                doc[key] = item.clone();
            }
            Ok(doc.to_string())
        }
        _ => Err("TOML requires the top-level value to be a table/object".to_string()),
    }
}

fn value_to_toml(value: &Value) -> Result<toml_edit::Item, String> {
    match value {
        Value::Object(obj) => {
            let mut table = toml_edit::Table::new();
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            for k in keys {
                table.insert(k, value_to_toml(&obj[k])?);
            }
            Ok(toml_edit::Item::Table(table))
        }
        other => Ok(toml_edit::Item::Value(value_to_toml_value(other)?)),
    }
}

fn value_to_toml_value(value: &Value) -> Result<toml_edit::Value, String> {
    match value {
        Value::Null => Err("TOML has no null type".to_string()),
        Value::Bool(b) => Ok(toml_edit::Value::Boolean(toml_edit::Formatted::new(*b))),
        Value::Number(n) => Ok(match as_integer(*n) {
            Some(i) => toml_edit::Value::Integer(toml_edit::Formatted::new(i)),
            None => toml_edit::Value::Float(toml_edit::Formatted::new(*n)),
        }),
        Value::String(s) => Ok(toml_edit::Value::String(toml_edit::Formatted::new(
            s.clone(),
        ))),
        Value::Array(arr) => {
            let mut toml_arr = toml_edit::Array::new();
            for v in arr {
                toml_arr.push(value_to_toml_value(v)?);
            }
            Ok(toml_edit::Value::Array(toml_arr))
        }
        Value::Object(obj) => {
            let mut inline = toml_edit::InlineTable::new();
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            for k in keys {
                inline.insert(k, value_to_toml_value(&obj[k])?);
            }
            Ok(toml_edit::Value::InlineTable(inline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libhconfig::parse_str;

    #[test]
    fn test_encode_toml() {
        let value = parse_str("port 80 ratio 0.5 hosts [a b]", false).unwrap();
        let output = encode(&value).unwrap();
        assert!(output.contains("port = 80\n"));
        assert!(output.contains("ratio = 0.5\n"));
        assert!(output.contains("hosts = [\"a\", \"b\"]\n"));
    }

    #[test]
    fn test_encode_toml_rejects() {
        let value = parse_str("x null", false).unwrap();
        assert_eq!(encode(&value).unwrap_err(), "TOML has no null type");
        assert!(encode(&Value::from(1)).is_err());
    }
}
