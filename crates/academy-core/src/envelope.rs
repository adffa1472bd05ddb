//! Decoders for the response envelopes the academy backend uses.
//!
//! Collections arrive either bare (`[...]`) or paginated (`{"items": [...]}`).
//! Single entities arrive bare, under `data`, or under an entity-specific key
//! such as `{"user": {...}}`. Anything else is a contract violation and fails
//! with [`CoreError::Shape`] instead of decoding to an empty value.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Decode a collection from a bare array or an `items` envelope.
pub fn list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => match map.remove("items") {
            Some(items @ Value::Array(_)) => Ok(serde_json::from_value(items)?),
            Some(other) => Err(CoreError::Shape {
                expected: "array under `items`",
                found: kind(&other),
            }),
            None => Err(CoreError::Shape {
                expected: "array or object with `items`",
                found: "object without `items`",
            }),
        },
        other => Err(CoreError::Shape {
            expected: "array or object with `items`",
            found: kind(&other),
        }),
    }
}

/// Decode a single entity from `{"data": ..}`, `{"<key>": ..}`, or a bare object.
pub fn entity<T: DeserializeOwned>(value: Value, key: &str) -> Result<T> {
    let Value::Object(mut map) = value else {
        return Err(CoreError::Shape {
            expected: "object",
            found: kind(&value),
        });
    };
    for wrapper in ["data", key] {
        if matches!(map.get(wrapper), Some(Value::Object(_))) {
            if let Some(inner) = map.remove(wrapper) {
                return Ok(serde_json::from_value(inner)?);
            }
        }
    }
    Ok(serde_json::from_value(Value::Object(map))?)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn list_accepts_bare_array() {
        let items: Vec<Item> = list(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
    }

    #[test]
    fn list_accepts_items_envelope() {
        let items: Vec<Item> = list(json!({"items": [{"id": 3}], "total": 1, "page": 1})).unwrap();
        assert_eq!(items, vec![Item { id: 3 }]);
    }

    #[test]
    fn list_rejects_object_without_items() {
        let err = list::<Item>(json!({"results": []})).unwrap_err();
        assert!(matches!(err, CoreError::Shape { .. }));
        assert!(err.to_string().contains("without `items`"));
    }

    #[test]
    fn list_rejects_null() {
        let err = list::<Item>(Value::Null).unwrap_err();
        assert!(err.to_string().contains("found null"));
    }

    #[test]
    fn list_rejects_non_array_items() {
        let err = list::<Item>(json!({"items": {"id": 1}})).unwrap_err();
        assert!(matches!(err, CoreError::Shape { found: "object", .. }));
    }

    #[test]
    fn entity_unwraps_data() {
        let item: Item = entity(json!({"data": {"id": 9}}), "item").unwrap();
        assert_eq!(item, Item { id: 9 });
    }

    #[test]
    fn entity_unwraps_named_key() {
        let item: Item = entity(json!({"cohort": {"id": 4}, "message": "ok"}), "cohort").unwrap();
        assert_eq!(item, Item { id: 4 });
    }

    #[test]
    fn entity_accepts_bare_object() {
        let item: Item = entity(json!({"id": 5}), "item").unwrap();
        assert_eq!(item, Item { id: 5 });
    }

    #[test]
    fn entity_rejects_array() {
        let err = entity::<Item>(json!([{"id": 1}]), "item").unwrap_err();
        assert!(matches!(err, CoreError::Shape { found: "array", .. }));
    }

    #[test]
    fn entity_with_wrong_fields_is_json_error() {
        let err = entity::<Item>(json!({"name": "x"}), "item").unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
