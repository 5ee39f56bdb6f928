//! JSON <-> Value conversion utilities

use crate::Value;

/// Convert serde_json::Value to Value. Objects become dicts with string keys.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::None, Value::Float),
        },
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Dict(
            obj.into_iter()
                .map(|(k, v)| (Value::Str(k), json_to_value(v)))
                .collect(),
        ),
    }
}

/// Convert Value to serde_json::Value
///
/// Tuples and sets become arrays, bytes are decoded lossily, and dict keys
/// that are not strings are written as their Python repr.
pub fn value_to_json(v: Value) -> serde_json::Value {
    match v {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Int(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s),
        Value::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(&b).into_owned()),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            serde_json::Value::Array(items.into_iter().map(value_to_json).collect())
        }
        Value::Dict(entries) => serde_json::Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::Str(s) => s,
                        other => other.to_string(),
                    };
                    (key, value_to_json(v))
                })
                .collect(),
        ),
    }
}

/// A value argument: JSON when it parses as JSON, otherwise the text itself
/// as a string.
pub fn parse_value(text: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => json_to_value(json),
        Err(_) => Value::Str(text.to_string()),
    }
}

/// A list of values: a JSON array, or a single JSON value.
pub fn parse_values(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(match json_to_value(json) {
        Value::List(items) => items,
        other => vec![other],
    })
}

#[test]
fn test_json_objects_keep_key_order() {
    let value = parse_value(r#"{"b": 1, "a": [true, null, 2.5]}"#);
    assert_eq!(value.to_string(), "{'b': 1, 'a': [True, None, 2.5]}");
}

#[test]
fn test_plain_text_is_a_string() {
    assert_eq!(parse_value("hello world"), Value::from("hello world"));
    assert_eq!(parse_value("42"), Value::Int(42));
    assert_eq!(parse_value("\"42\""), Value::from("42"));
}

#[test]
fn test_parse_values() {
    assert_eq!(
        parse_values("[1, \"a\"]").unwrap(),
        vec![Value::Int(1), Value::from("a")]
    );
    assert_eq!(parse_values("7").unwrap(), vec![Value::Int(7)]);
    assert!(parse_values("[1,").is_err());
}
