//! Field Schema Data Model
//!
//! A [`FieldSchema`] is the declarative description of one configuration
//! field: its type, constraints, default, and display hints. Connector and
//! operator specs arrive from the catalog service as JSON; this model
//! deserializes them without loss and is never mutated afterwards.
//!
//! The `type` field is deliberately a free-form string rather than a closed
//! enum: catalog specs in the wild carry unknown types, and those must degrade
//! to a permissive rule instead of failing deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative description of one configuration field.
///
/// Shaped after JSON Schema: constraint keys use the JSON Schema wire names
/// (`minLength`, `uniqueItems`, ...) and which constraints are meaningful
/// depends on `type`. Unknown keys are ignored on input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    /// Declared type (`string`, `number`, `integer`, `boolean`, `array`,
    /// `object`). Absent or unrecognized types fall back to "any".
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Allowed values. Presence makes the field a restricted choice.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// Element schema for `array` fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,

    /// Nested property schemas for `object` fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldSchema>>,

    /// Names of required nested properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    /// Free-form map marker for `object` fields (bool or nested schema).
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Value>,

    /// Minimum string length.
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// Maximum string length.
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Regular expression the string value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Minimum numeric value (inclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Maximum numeric value (inclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// Minimum number of array items.
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    /// Maximum number of array items.
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    /// Whether array items must be distinct.
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    /// Default value, applied when no input is supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Human-readable field title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Help text for the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Widget hint: `textarea` or `password`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Explicit sensitive-value marker (Airbyte connector convention).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airbyte_secret: Option<bool>,
}

impl FieldSchema {
    /// Create a schema with just a declared type.
    pub fn of_type(field_type: impl Into<String>) -> Self {
        Self {
            field_type: Some(field_type.into()),
            ..Self::default()
        }
    }

    /// The name to show users: `title` if present, else the property key.
    #[must_use]
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }

    /// Declared type, if any.
    #[must_use]
    pub fn type_str(&self) -> Option<&str> {
        self.field_type.as_deref()
    }

    /// Whether this property key is in the schema's own `required` list.
    #[must_use]
    pub fn requires(&self, key: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|r| r.iter().any(|k| k == key))
    }

    /// Whether `additionalProperties` is present and not explicitly `false`.
    #[must_use]
    pub fn allows_additional_properties(&self) -> bool {
        match &self.additional_properties {
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_names() {
        let json = r#"{
            "type": "string",
            "title": "Host",
            "minLength": 1,
            "maxLength": 255,
            "pattern": "^[a-z0-9.-]+$",
            "airbyte_secret": false
        }"#;

        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.type_str(), Some("string"));
        assert_eq!(schema.min_length, Some(1));
        assert_eq!(schema.max_length, Some(255));
        assert_eq!(schema.pattern.as_deref(), Some("^[a-z0-9.-]+$"));
        assert_eq!(schema.airbyte_secret, Some(false));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let json = r#"{"type": "string", "order": 3, "examples": ["a"]}"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.type_str(), Some("string"));
    }

    #[test]
    fn test_display_name_prefers_title() {
        let schema = FieldSchema {
            title: Some("Database Host".to_string()),
            ..FieldSchema::of_type("string")
        };
        assert_eq!(schema.display_name("host"), "Database Host");

        let untitled = FieldSchema::of_type("string");
        assert_eq!(untitled.display_name("host"), "host");
    }

    #[test]
    fn test_requires() {
        let json = r#"{
            "type": "object",
            "properties": {"host": {"type": "string"}},
            "required": ["host"]
        }"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        assert!(schema.requires("host"));
        assert!(!schema.requires("port"));
    }

    #[test]
    fn test_additional_properties_forms() {
        let explicit_false: FieldSchema =
            serde_json::from_str(r#"{"type": "object", "additionalProperties": false}"#).unwrap();
        assert!(!explicit_false.allows_additional_properties());

        let explicit_true: FieldSchema =
            serde_json::from_str(r#"{"type": "object", "additionalProperties": true}"#).unwrap();
        assert!(explicit_true.allows_additional_properties());

        let schema_form: FieldSchema = serde_json::from_str(
            r#"{"type": "object", "additionalProperties": {"type": "string"}}"#,
        )
        .unwrap();
        assert!(schema_form.allows_additional_properties());

        let absent = FieldSchema::of_type("object");
        assert!(!absent.allows_additional_properties());
    }

    #[test]
    fn test_nested_items() {
        let json = r#"{
            "type": "array",
            "items": {"type": "string", "enum": ["a", "b"]},
            "minItems": 1,
            "uniqueItems": true
        }"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        let items = schema.items.as_deref().unwrap();
        assert_eq!(items.enum_values.as_ref().unwrap().len(), 2);
        assert_eq!(schema.min_items, Some(1));
        assert_eq!(schema.unique_items, Some(true));
    }
}
