use crate::error::Result;
use serde_json::Value;

/// Encode a JSON value into the binary default-value format stored on pins and variables
pub fn encode_default_value(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a stored default value; `None` when the bytes are not valid JSON
pub fn decode_default_value(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// Human-readable form of a decoded value: strings verbatim, everything else as compact JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Strip one redundant pair of surrounding quotes from a pre-quoted string literal.
///
/// Command generators frequently send `"\"hello\""` when they mean `"hello"`.
pub fn normalize_literal(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let stripped = s
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .map(str::to_string);
            Value::String(stripped.unwrap_or(s))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_round_trips_through_codec() {
        let bytes = encode_default_value(&json!("hello")).unwrap();
        let decoded = decode_default_value(&bytes).unwrap();
        assert_eq!(display_value(&decoded), "hello");
    }

    #[test]
    fn structured_values_display_as_json() {
        let bytes = encode_default_value(&json!({"a": 1})).unwrap();
        let decoded = decode_default_value(&bytes).unwrap();
        assert_eq!(display_value(&decoded), r#"{"a":1}"#);
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(decode_default_value(&[0xff, 0x00, 0x13]).is_none());
        assert!(decode_default_value(&[]).is_none());
    }

    #[test]
    fn normalize_strips_single_quote_pair() {
        assert_eq!(normalize_literal(json!("\"hi\"")), json!("hi"));
        assert_eq!(normalize_literal(json!("\"\"x\"\"")), json!("\"x\""));
        assert_eq!(normalize_literal(json!("plain")), json!("plain"));
        assert_eq!(normalize_literal(json!("\"")), json!("\""));
        assert_eq!(normalize_literal(json!(42)), json!(42));
    }
}
