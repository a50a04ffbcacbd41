//! JSON schemas sent to the generative backend.
//!
//! Backends are asked for structured output, but the response is still
//! checked on our side: only the top-level shape (object, required keys and
//! their JSON types) is verified. Nested shapes are enforced when the value
//! is deserialized into the model types.

use serde_json::{json, Map, Value};

use crate::error::BackendError;

/// A named JSON schema for one kind of structured response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchema {
    /// Schema name, as passed to the backend.
    pub name: String,

    /// The JSON Schema document.
    pub schema: Value,
}

impl JsonSchema {
    /// Create a schema from a raw JSON Schema document.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Create an object schema where every listed property is required.
    pub fn object(name: impl Into<String>, properties: Value) -> Self {
        let required: Vec<Value> = properties
            .as_object()
            .map(|props| props.keys().map(|k| Value::String(k.clone())).collect())
            .unwrap_or_default();

        Self::new(
            name,
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            }),
        )
    }

    /// Check the top-level shape of a backend response.
    pub fn check(&self, value: &Value) -> Result<(), BackendError> {
        let Some(object) = value.as_object() else {
            return Err(BackendError::SchemaViolation(format!(
                "{}: expected a JSON object",
                self.name
            )));
        };

        let properties = self
            .schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);

        let required = self
            .schema
            .get("required")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for key in required.iter().filter_map(Value::as_str) {
            let Some(field) = object.get(key) else {
                return Err(BackendError::SchemaViolation(format!(
                    "{}: missing field `{key}`",
                    self.name
                )));
            };
            let expected = properties
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(Value::as_str);
            if let Some(expected) = expected {
                if !has_type(field, expected) {
                    return Err(BackendError::SchemaViolation(format!(
                        "{}: field `{key}` should be {expected}",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn has_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// Schema for a single chunk rewrite.
pub fn chunk_schema() -> JsonSchema {
    JsonSchema::object(
        "chunk_chapter",
        json!({
            "title": { "type": "string" },
            "sections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "heading": { "type": "string" },
                        "content": { "type": "string" },
                        "key_points": string_array(),
                        "examples": string_array(),
                    },
                    "required": ["heading", "content", "key_points", "examples"],
                    "additionalProperties": false,
                },
            },
            "learning_objectives": string_array(),
        }),
    )
}

/// Schema for the cross-chunk course summary.
pub fn course_schema() -> JsonSchema {
    JsonSchema::object(
        "course_summary",
        json!({
            "title": { "type": "string" },
            "description": { "type": "string" },
            "summary": { "type": "string" },
            "target_audience": string_array(),
            "difficulty_level": { "type": "string" },
            "prerequisites": string_array(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_marks_all_required() {
        let schema = course_schema();
        let required = schema.schema["required"].as_array().map(Vec::len);
        assert_eq!(required, Some(6));
    }

    #[test]
    fn test_check_accepts_matching_shape() {
        let value = json!({
            "title": "Limits",
            "sections": [],
            "learning_objectives": ["Define a limit"],
        });
        assert!(chunk_schema().check(&value).is_ok());
    }

    #[test]
    fn test_check_rejects_missing_and_mistyped_fields() {
        let schema = chunk_schema();

        let missing = json!({ "title": "Limits", "sections": [] });
        assert!(matches!(
            schema.check(&missing),
            Err(BackendError::SchemaViolation(msg)) if msg.contains("learning_objectives")
        ));

        let mistyped = json!({ "title": 3, "sections": [], "learning_objectives": [] });
        assert!(matches!(
            schema.check(&mistyped),
            Err(BackendError::SchemaViolation(_))
        ));

        assert!(schema.check(&json!(["not", "an", "object"])).is_err());
    }
}
