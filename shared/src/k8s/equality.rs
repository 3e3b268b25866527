//! Semantic equality of Kubernetes objects.
//!
//! Two values are semantically equal when they only differ in ways the API
//! server does not distinguish: a null field, an empty list and an empty map
//! all mean "unset", and resource quantities compare by amount rather than
//! by spelling.
use super::quantity::parse_quantity;
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields whose values are maps of resource name to quantity
const QUANTITY_MAP_FIELDS: &[&str] = &["limits", "requests", "overhead"];
/// Fields whose value is a single quantity
const QUANTITY_FIELDS: &[&str] = &["sizeLimit", "divisor"];

/// Compares `a` and `b` after normalizing their JSON form. Values that fail
/// to serialize are never equal.
pub fn semantic_eq<T: Serialize + ?Sized>(a: &T, b: &T) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => normalize(a, None) == normalize(b, None),
        (a, b) => {
            log::trace!(
                "semantic_eq - failed to serialize: {:?} / {:?}",
                a.err(),
                b.err()
            );
            false
        }
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn canonical_quantity(value: Value) -> Value {
    match &value {
        Value::String(quantity) => match parse_quantity(quantity) {
            Some(nanos) => Value::String(format!("{}n", nanos)),
            None => value,
        },
        _ => value,
    }
}

fn normalize(value: Value, field: Option<&str>) -> Value {
    match value {
        Value::Object(fields) => {
            let quantities = field.map_or(false, |f| QUANTITY_MAP_FIELDS.contains(&f));
            let mut normalized = Map::new();
            for (name, value) in fields {
                let mut value = normalize(value, Some(&name));
                if quantities {
                    value = canonical_quantity(value);
                }
                if !is_unset(&value) {
                    normalized.insert(name, value);
                }
            }
            Value::Object(normalized)
        }
        // list items keep their position even when empty
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| normalize(item, None)).collect())
        }
        other if field.map_or(false, |f| QUANTITY_FIELDS.contains(&f)) => {
            canonical_quantity(other)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_forms_are_equal() {
        assert!(semantic_eq(
            &json!({ "name": "main", "args": [], "env": null, "labels": {} }),
            &json!({ "name": "main" })
        ));
        assert!(semantic_eq(
            &json!({ "containers": [{ "name": "main", "resources": {} }] }),
            &json!({ "containers": [{ "name": "main" }] })
        ));
        assert!(!semantic_eq(&json!({ "args": ["-v"] }), &json!({})));
        assert!(!semantic_eq(&json!({ "paused": false }), &json!({})));
    }

    #[test]
    fn test_list_positions_are_kept() {
        assert!(!semantic_eq(&json!([{}, { "a": 1 }]), &json!([{ "a": 1 }])));
    }

    #[test]
    fn test_quantities_compare_by_amount() {
        assert!(semantic_eq(
            &json!({ "resources": { "limits": { "cpu": "1", "memory": "1Gi" } } }),
            &json!({ "resources": { "limits": { "cpu": "1000m", "memory": "1024Mi" } } })
        ));
        assert!(semantic_eq(
            &json!({ "emptyDir": { "sizeLimit": "1k" } }),
            &json!({ "emptyDir": { "sizeLimit": "1000" } })
        ));
        assert!(!semantic_eq(
            &json!({ "resources": { "requests": { "cpu": "1" } } }),
            &json!({ "resources": { "requests": { "cpu": "2" } } })
        ));
        // quantities are only recognized where the API uses them
        assert!(!semantic_eq(&json!({ "image": "1" }), &json!({ "image": "1000m" })));
    }
}
