//! YAML transcoding: convert hconfig values to YAML text.
//!
//! Mapping from hconfig to YAML:
//!   - Value::Null    -> YAML null
//!   - Value::Bool    -> YAML bool
//!   - Value::Number  -> YAML integer when integral and exactly representable,
//!                       YAML float otherwise (including .nan, .inf, -.inf)
//!   - Value::String  -> YAML string
//!   - Value::Array   -> YAML sequence
//!   - Value::Object  -> YAML mapping (keys sorted)

use libhconfig::Value;

use super::as_integer;

/// Encode an hconfig Value as a YAML string.
pub fn encode(value: &Value) -> Result<String, String> {
    let yaml_value = value_to_yaml(value);
    serde_yaml::to_string(&yaml_value).map_err(|e| format!("YAML encode error: {}", e))
}

fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => match as_integer(*n) {
            Some(i) => serde_yaml::Value::Number(serde_yaml::Number::from(i)),
            None => serde_yaml::Value::Number(serde_yaml::Number::from(*n)),
        },
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(arr) => serde_yaml::Value::Sequence(arr.iter().map(value_to_yaml).collect()),
        Value::Object(obj) => {
            let mut map = serde_yaml::Mapping::new();
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            for k in keys {
                map.insert(serde_yaml::Value::String(k.clone()), value_to_yaml(&obj[k]));
            }
            serde_yaml::Value::Mapping(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libhconfig::parse_str;

    #[test]
    fn test_encode_yaml() {
        let value = parse_str("port 80 ratio 0.5 hosts [a b] tls { enabled true } x null", false).unwrap();
        assert_eq!(
            encode(&value).unwrap(),
            "hosts:\n- a\n- b\nport: 80\nratio: 0.5\ntls:\n  enabled: true\nx: null\n"
        );
    }
}
