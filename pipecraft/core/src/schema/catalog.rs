//! Operator Catalog Lookup
//!
//! Pipeline operators (readers, filters, joiners, writers) are grouped into
//! catalog modules, each carrying display metadata for the canvas UI. Given
//! an operator type name, [`find_operator_schema`] resolves the operator's
//! property schema together with its owning module's display metadata.
//!
//! A miss is an expected outcome (the catalog evolves independently of saved
//! pipelines), so lookup returns `Option` and never errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::field::FieldSchema;

/// One operator definition inside a catalog module.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operator {
    /// Operator type name, matched case-insensitively on lookup.
    #[serde(rename = "type")]
    pub operator_type: String,
    /// Help text shown in the operator picker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Property schemas for the operator's configuration form.
    pub properties: BTreeMap<String, FieldSchema>,
    /// Names of required configuration fields.
    #[serde(rename = "requiredFields")]
    pub required_fields: Vec<String>,
}

/// A logical group of operators with canvas display metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineModule {
    /// Module display label.
    pub label: String,
    /// Canvas color for operators in this module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Canvas icon identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Port layout descriptor (shape is owned by the canvas layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Value>,
    /// Operators belonging to this module.
    pub operators: Vec<Operator>,
}

/// Display metadata copied from the owning module onto a lookup hit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UiProperties {
    /// Owning module's label.
    pub module_name: String,
    /// Owning module's canvas color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Owning module's canvas icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Owning module's port layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Value>,
}

/// An operator's schema, resolved from the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorSchema {
    /// Owning-module display metadata.
    pub ui_properties: UiProperties,
    /// The operator's raw property schemas.
    pub properties: BTreeMap<String, FieldSchema>,
    /// Names of required configuration fields.
    pub required_fields: Vec<String>,
    /// Operator help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OperatorSchema {
    /// Reassemble the properties into a single object [`FieldSchema`],
    /// ready for [`crate::schema::compiler::compile_operator`].
    #[must_use]
    pub fn to_field_schema(&self) -> FieldSchema {
        FieldSchema {
            field_type: Some("object".to_string()),
            properties: Some(self.properties.clone()),
            required: Some(self.required_fields.clone()),
            ..FieldSchema::default()
        }
    }
}

/// Look up an operator's schema by type name.
///
/// Scans modules in list order and returns the first operator whose type
/// matches `operator_type` case-insensitively, with the owning module's
/// display metadata attached. Returns `None` when no module carries a
/// matching operator.
#[must_use]
pub fn find_operator_schema(
    operator_type: &str,
    modules: &[PipelineModule],
) -> Option<OperatorSchema> {
    for module in modules {
        if let Some(operator) = module
            .operators
            .iter()
            .find(|op| op.operator_type.eq_ignore_ascii_case(operator_type))
        {
            return Some(OperatorSchema {
                ui_properties: UiProperties {
                    module_name: module.label.clone(),
                    color: module.color.clone(),
                    icon: module.icon.clone(),
                    ports: module.ports.clone(),
                },
                properties: operator.properties.clone(),
                required_fields: operator.required_fields.clone(),
                description: operator.description.clone(),
            });
        }
    }
    None
}
