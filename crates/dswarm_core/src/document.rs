//! Conversion between wire JSON text and in-memory documents
//!
//! Payloads are treated as opaque documents: nothing here looks inside them
//! except to pull out an identifier or the record class URI of a data model.

use serde::de::Error as _;
use serde_json::Value;

use crate::{CoreError, ObjectIdentifier, ObjectRecord, Result};

pub const UUID_FIELD: &str = "uuid";
pub const INPUT_DATA_MODEL_FIELD: &str = "input_data_model";
pub const SCHEMA_FIELD: &str = "schema";
pub const RECORD_CLASS_FIELD: &str = "record_class";
pub const URI_FIELD: &str = "uri";

/// Parse JSON text; `label` names what was being parsed for diagnostics.
pub fn to_document(text: &str, label: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|cause| {
        tracing::error!("something went wrong, while trying to deserialize {}", label);
        CoreError::Deserialization {
            label: label.to_string(),
            cause,
        }
    })
}

/// Parse JSON text that must hold an object.
pub fn to_object(text: &str, label: &str) -> Result<Value> {
    expect_shape(to_document(text, label)?, label, Value::is_object, "a JSON object")
}

/// Parse JSON text that must hold an array.
pub fn to_array(text: &str, label: &str) -> Result<Value> {
    expect_shape(to_document(text, label)?, label, Value::is_array, "a JSON array")
}

fn expect_shape(
    document: Value,
    label: &str,
    check: fn(&Value) -> bool,
    expected: &str,
) -> Result<Value> {
    if check(&document) {
        Ok(document)
    } else {
        Err(CoreError::Deserialization {
            label: label.to_string(),
            cause: serde_json::Error::custom(format!("expected {expected}")),
        })
    }
}

/// Pretty-print a document.
pub fn to_text(document: &Value, label: &str) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(|cause| {
        tracing::error!("something went wrong, while trying to serialize {}", label);
        CoreError::Serialization {
            label: label.to_string(),
            cause,
        }
    })
}

/// Read the identifier stored under `field`.
///
/// Strings are taken as-is, numbers are rendered as text; anything else
/// counts as missing.
pub fn extract_identifier(document: &Value, field: &str) -> Result<ObjectIdentifier> {
    match document.get(field) {
        Some(Value::String(id)) => Ok(ObjectIdentifier::new(id.as_str())),
        Some(Value::Number(id)) => Ok(ObjectIdentifier::new(id.to_string())),
        _ => Err(CoreError::missing_field(field, "document")),
    }
}

/// Follow `schema.record_class.uri` of a data model document.
pub fn record_class_uri(data_model: &Value) -> Result<String> {
    data_model
        .get(SCHEMA_FIELD)
        .and_then(|schema| schema.get(RECORD_CLASS_FIELD))
        .and_then(|record_class| record_class.get(URI_FIELD))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::missing_field(
                format!("{SCHEMA_FIELD}.{RECORD_CLASS_FIELD}.{URI_FIELD}"),
                "data model",
            )
        })
}

/// Parse and re-serialize an object payload, bundling it with its identifier.
pub fn canonicalize(
    collection: &str,
    id: &ObjectIdentifier,
    text: &str,
) -> Result<ObjectRecord> {
    let label = format!("{collection} {id}");
    let document = to_object(text, &label)?;
    let payload = to_text(&document, &label)?;
    Ok(ObjectRecord::new(id.clone(), payload))
}

/// Same as [`canonicalize`] for payloads that are JSON arrays (data model content).
pub fn canonicalize_array(
    collection: &str,
    id: &ObjectIdentifier,
    text: &str,
) -> Result<ObjectRecord> {
    let label = format!("content of {collection} {id}");
    let document = to_array(text, &label)?;
    let payload = to_text(&document, &label)?;
    Ok(ObjectRecord::new(id.clone(), payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_round_trip_keeps_keys_and_values() {
        let text = r#"{"uuid":"A","x":1,"nested":{"list":[1,2,{"k":null}]}}"#;
        let record = canonicalize("project", &ObjectIdentifier::from("A"), text).unwrap();

        let before: Value = serde_json::from_str(text).unwrap();
        let after: Value = serde_json::from_str(&record.payload).unwrap();
        assert_eq!(before, after);
        assert_eq!(record.id.as_str(), "A");
    }

    #[test]
    fn test_deserialization_error_carries_label() {
        let err = to_document("{not json", "project 1234").unwrap_err();
        assert!(matches!(err, CoreError::Deserialization { .. }));
        assert!(err.to_string().contains("project 1234"));
    }

    #[test]
    fn test_shape_mismatch_is_deserialization_error() {
        let err = to_array(r#"{"uuid":"A"}"#, "short descriptions").unwrap_err();
        assert!(matches!(err, CoreError::Deserialization { .. }));
        assert!(to_object("[]", "project").is_err());
    }

    #[test]
    fn test_extract_identifier() {
        let document = json!({ "uuid": "550e8400-e29b-41d4-a716-446655440000" });
        assert_eq!(
            extract_identifier(&document, UUID_FIELD).unwrap().as_str(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(
            extract_identifier(&json!({ "uuid": 42 }), UUID_FIELD)
                .unwrap()
                .as_str(),
            "42"
        );

        let err = extract_identifier(&json!({ "name": "no id" }), UUID_FIELD).unwrap_err();
        assert!(matches!(err, CoreError::MissingField { ref field, .. } if field == "uuid"));
    }

    #[test]
    fn test_record_class_uri() {
        let data_model = json!({ "schema": { "record_class": { "uri": "urn:x" } } });
        assert_eq!(record_class_uri(&data_model).unwrap(), "urn:x");

        let err = record_class_uri(&json!({ "schema": {} })).unwrap_err();
        assert!(err.to_string().contains("schema.record_class.uri"));
    }

    #[test]
    fn test_documents_are_not_mutated() {
        let document = json!({ "uuid": "A", "x": 1 });
        let copy = document.clone();
        let _ = to_text(&document, "project A").unwrap();
        let _ = extract_identifier(&document, UUID_FIELD).unwrap();
        assert_eq!(document, copy);
    }
}
