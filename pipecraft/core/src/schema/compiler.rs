//! Schema-to-Validator Compiler
//!
//! Compiles a [`FieldSchema`] into a [`CompiledSchema`]: a tree of per-field
//! validation rules mirroring the schema tree. Validating submitted values
//! against a compiled schema either returns the (possibly defaulted) value or
//! a [`ValidationErrors`] listing every failing field path and message.
//!
//! # Design Philosophy
//!
//! Compilation never fails for a well-formed schema. Malformed or unknown
//! nodes (unrecognized types, invalid regex patterns) degrade to a permissive
//! accept-anything rule rather than raising, favoring form availability over
//! strict correctness. Validation is strict and reports all failures in a
//! single pass so a form can highlight every broken field at once.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::field::FieldSchema;

/// Synthetic always-required fields on operator (transformation) schemas.
const SYNTHETIC_OPERATOR_FIELDS: &[&str] = &["type", "task_id"];

// =============================================================================
// Error Types
// =============================================================================

/// A single per-field validation failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted field path (`connection.host`, `tags[2]`).
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Structured validation failure listing every failing field.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{} field(s) failed validation: {}", self.issues.len(), self.summary())]
pub struct ValidationErrors {
    /// All collected failures, in schema order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Messages joined for display, one `path: message` pair per issue.
    #[must_use]
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| format!("{}: {}", i.path, i.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Whether any issue targets the given field path.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

// =============================================================================
// Compiled Rules
// =============================================================================

/// Compilation mode for a form schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileMode {
    /// Creating a new resource: all schema-required fields are enforced.
    New,
    /// Editing an existing resource: required password fields become
    /// optional, since a blank submission keeps the stored secret.
    Edit,
}

/// Validation rule for one field.
#[derive(Clone, Debug)]
pub struct FieldRule {
    /// Title-or-key, used in messages.
    display: String,
    required: bool,
    default: Option<Value>,
    kind: RuleKind,
}

impl FieldRule {
    /// The name used in this rule's messages.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Whether the field must be supplied and non-empty.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Default carried from the schema, applied when no input is supplied.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    fn synthetic(key: &str) -> Self {
        Self {
            display: key.to_string(),
            required: true,
            default: None,
            kind: RuleKind::Str {
                allowed: None,
                min_length: None,
                max_length: None,
                pattern: None,
            },
        }
    }
}

/// Type-specific checks for one field.
#[derive(Clone, Debug)]
enum RuleKind {
    Str {
        allowed: Option<Vec<String>>,
        min_length: Option<u64>,
        max_length: Option<u64>,
        pattern: Option<Regex>,
    },
    Num {
        integer: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Bool,
    Array {
        element: Box<RuleKind>,
        min_items: Option<u64>,
        max_items: Option<u64>,
        unique: bool,
    },
    Object {
        fields: BTreeMap<String, FieldRule>,
    },
    /// String-keyed mapping with string values (`additionalProperties`).
    StringMap,
    /// Object accepted as-is (no nested schema to check against).
    Passthrough,
    /// Accept anything (absent/unknown/malformed type).
    Any,
}

/// A compiled validator tree for one form schema.
#[derive(Clone, Debug)]
pub struct CompiledSchema {
    rules: BTreeMap<String, FieldRule>,
}

impl CompiledSchema {
    /// Number of top-level field rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the schema compiled to no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule for a top-level field, if the schema declares it.
    #[must_use]
    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.rules.get(key)
    }

    /// Iterate top-level rules in key order.
    pub fn rules(&self) -> impl Iterator<Item = (&String, &FieldRule)> {
        self.rules.iter()
    }

    /// Validate submitted values against this schema.
    ///
    /// Returns the accepted value with defaults filled in for absent fields,
    /// or every failing field path and message. The input is expected to be
    /// a JSON object; anything else fails with a single root-level issue.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] when any field fails its rule.
    pub fn validate(&self, input: &Value) -> Result<Value, ValidationErrors> {
        let supplied = match input {
            Value::Object(map) => Some(map),
            Value::Null => None,
            _ => {
                return Err(ValidationErrors {
                    issues: vec![ValidationIssue::new("", "expected an object")],
                });
            }
        };

        let mut issues = Vec::new();
        let output = validate_rule_map(&self.rules, supplied, "", &mut issues);

        if issues.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(ValidationErrors { issues })
        }
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compile a connection/configuration form schema.
///
/// One rule per entry in `schema.properties`; requiredness comes from the
/// schema's own `required` list.
#[must_use]
pub fn compile(schema: &FieldSchema, mode: CompileMode) -> CompiledSchema {
    CompiledSchema {
        rules: compile_properties(schema, mode),
    }
}

/// Compile a transformation/operator form schema.
///
/// Identical to [`compile`], plus the two synthetic always-required
/// non-empty-string fields every operator form carries: `type` and `task_id`.
/// Schema-declared properties with those names are superseded by the fixed
/// rule.
#[must_use]
pub fn compile_operator(schema: &FieldSchema, mode: CompileMode) -> CompiledSchema {
    let mut rules = compile_properties(schema, mode);
    for key in SYNTHETIC_OPERATOR_FIELDS {
        rules.insert((*key).to_string(), FieldRule::synthetic(key));
    }
    CompiledSchema { rules }
}

fn compile_properties(schema: &FieldSchema, mode: CompileMode) -> BTreeMap<String, FieldRule> {
    let mut rules = BTreeMap::new();
    if let Some(props) = &schema.properties {
        for (key, prop) in props {
            rules.insert(
                key.clone(),
                compile_field(key, prop, schema.requires(key), mode),
            );
        }
    }
    rules
}

fn compile_field(key: &str, schema: &FieldSchema, required: bool, mode: CompileMode) -> FieldRule {
    // Edit forms keep the stored secret when a password field is left blank.
    let required = required
        && !(mode == CompileMode::Edit && schema.format.as_deref() == Some("password"));

    FieldRule {
        display: schema.display_name(key).to_string(),
        required,
        default: schema.default.clone(),
        kind: compile_kind(schema, mode),
    }
}

fn compile_kind(schema: &FieldSchema, mode: CompileMode) -> RuleKind {
    match schema.type_str() {
        Some("string") => RuleKind::Str {
            allowed: schema.enum_values.clone(),
            min_length: schema.min_length,
            max_length: schema.max_length,
            pattern: compile_pattern(schema.pattern.as_deref()),
        },
        Some(t @ ("number" | "integer")) => RuleKind::Num {
            integer: t == "integer",
            minimum: schema.minimum,
            maximum: schema.maximum,
        },
        Some("boolean") => RuleKind::Bool,
        Some("array") => RuleKind::Array {
            element: Box::new(compile_element_kind(schema.items.as_deref())),
            min_items: schema.min_items,
            max_items: schema.max_items,
            unique: schema.unique_items.unwrap_or(false),
        },
        Some("object") => compile_object_kind(schema, mode),
        _ => RuleKind::Any,
    }
}

/// Element rules are narrower than field rules: string, number, integer,
/// passthrough object, or any.
fn compile_element_kind(items: Option<&FieldSchema>) -> RuleKind {
    let Some(items) = items else {
        return RuleKind::Any;
    };
    match items.type_str() {
        Some("string") => RuleKind::Str {
            allowed: items.enum_values.clone(),
            min_length: items.min_length,
            max_length: items.max_length,
            pattern: compile_pattern(items.pattern.as_deref()),
        },
        Some(t @ ("number" | "integer")) => RuleKind::Num {
            integer: t == "integer",
            minimum: items.minimum,
            maximum: items.maximum,
        },
        Some("object") => RuleKind::Passthrough,
        _ => RuleKind::Any,
    }
}

fn compile_object_kind(schema: &FieldSchema, mode: CompileMode) -> RuleKind {
    if let Some(props) = &schema.properties {
        let mut fields = BTreeMap::new();
        for (key, prop) in props {
            fields.insert(
                key.clone(),
                compile_field(key, prop, schema.requires(key), mode),
            );
        }
        RuleKind::Object { fields }
    } else if schema.allows_additional_properties() {
        RuleKind::StringMap
    } else {
        RuleKind::Passthrough
    }
}

fn compile_pattern(pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern?;
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            // Malformed constraint: drop it rather than failing compilation.
            tracing::warn!(pattern, %err, "ignoring invalid schema pattern");
            None
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_rule_map(
    rules: &BTreeMap<String, FieldRule>,
    supplied: Option<&Map<String, Value>>,
    prefix: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Map<String, Value> {
    let mut output = Map::new();

    for (key, rule) in rules {
        let path = join_path(prefix, key);
        let value = supplied.and_then(|m| m.get(key));

        match value {
            None | Some(Value::Null) => {
                if let Some(default) = &rule.default {
                    output.insert(key.clone(), default.clone());
                } else if rule.required {
                    issues.push(required_issue(&path, rule));
                }
                // Optional without default: simply omitted.
            }
            Some(value) => {
                if rule.required && is_empty_submission(value) {
                    issues.push(required_issue(&path, rule));
                    continue;
                }
                let before = issues.len();
                check_kind(&rule.kind, &rule.display, &path, value, issues);
                if issues.len() == before {
                    output.insert(key.clone(), value.clone());
                }
            }
        }
    }

    output
}

fn required_issue(path: &str, rule: &FieldRule) -> ValidationIssue {
    ValidationIssue::new(path, format!("{} is required", rule.display))
}

/// Empty-for-required: empty string for strings, empty sequence for arrays.
/// Null/missing is handled separately for every type.
fn is_empty_submission(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[allow(clippy::too_many_lines)]
fn check_kind(
    kind: &RuleKind,
    display: &str,
    path: &str,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) {
    match kind {
        RuleKind::Str {
            allowed,
            min_length,
            max_length,
            pattern,
        } => {
            let Some(s) = value.as_str() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be a string"),
                ));
                return;
            };
            if let Some(allowed) = allowed {
                if !allowed.iter().any(|a| a == s) {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must be one of: {}", allowed.join(", ")),
                    ));
                    return;
                }
            }
            let chars = s.chars().count() as u64;
            if let Some(min) = min_length {
                if chars < *min {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must be at least {min} characters"),
                    ));
                }
            }
            if let Some(max) = max_length {
                if chars > *max {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must be at most {max} characters"),
                    ));
                }
            }
            if let Some(pattern) = pattern {
                if !pattern.is_match(s) {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} does not match the required pattern"),
                    ));
                }
            }
        }
        RuleKind::Num {
            integer,
            minimum,
            maximum,
        } => {
            let Some(n) = value.as_f64() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be a number"),
                ));
                return;
            };
            if *integer && n.fract() != 0.0 {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be an integer"),
                ));
                return;
            }
            if let Some(min) = minimum {
                if n < *min {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must be at least {}", format_number(*min)),
                    ));
                }
            }
            if let Some(max) = maximum {
                if n > *max {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must be at most {}", format_number(*max)),
                    ));
                }
            }
        }
        RuleKind::Bool => {
            if !value.is_boolean() {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be a boolean"),
                ));
            }
        }
        RuleKind::Array {
            element,
            min_items,
            max_items,
            unique,
        } => {
            let Some(items) = value.as_array() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be an array"),
                ));
                return;
            };
            let count = items.len() as u64;
            if let Some(min) = min_items {
                if count < *min {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must have at least {min} items"),
                    ));
                }
            }
            if let Some(max) = max_items {
                if count > *max {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} must have at most {max} items"),
                    ));
                }
            }
            for (index, item) in items.iter().enumerate() {
                check_kind(element, display, &format!("{path}[{index}]"), item, issues);
            }
            if *unique {
                // Distinctness over serialized element identity.
                let mut seen = HashSet::new();
                let duplicated = items.iter().any(|item| !seen.insert(item.to_string()));
                if duplicated {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("{display} items must be unique"),
                    ));
                }
            }
        }
        RuleKind::Object { fields } => {
            let Some(map) = value.as_object() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be an object"),
                ));
                return;
            };
            validate_rule_map(fields, Some(map), path, issues);
        }
        RuleKind::StringMap => {
            let Some(map) = value.as_object() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("{display} must be an object"),
                ));
                return;
            };
            for (key, entry) in map {
                if !entry.is_string() {
                    issues.push(ValidationIssue::new(
                        format!("{path}.{key}"),
                        format!("{display} values must be strings"),
                    ));
                }
            }
        }
        RuleKind::Passthrough | RuleKind::Any => {}
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
