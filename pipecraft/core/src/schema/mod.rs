//! Schema Engine for Dynamic Configuration Forms
//!
//! Connection and operator configuration in pipecraft is schema-driven: the
//! catalog service describes each connector/operator as a JSON-Schema-like
//! object, and this module turns those descriptions into everything a generic
//! form needs:
//!
//! - a **render plan**: one [`classifier::FieldKind`] per field, computed once,
//!   so rendering is a single dispatch over a closed set instead of scattered
//!   type checks
//! - a **validator**: a [`compiler::CompiledSchema`] rule tree that validates
//!   submitted values, applies defaults, and reports per-field dotted-path
//!   errors
//! - a **catalog lookup**: [`catalog::find_operator_schema`] resolves an
//!   operator type to its property schema plus owning-module display metadata
//!
//! # Design Philosophy
//!
//! Field schemas are read-only inputs; nothing in this module mutates them.
//! Compilation never fails for a well-formed schema: malformed or unknown
//! nodes degrade to a permissive accept-anything rule, favoring form
//! availability over strict correctness. Validation, by contrast, is strict
//! and reports every failing field in one pass.
//!
//! # Example
//!
//! ```ignore
//! use pipecraft_core::schema::{classifier, compiler, field::FieldSchema};
//!
//! let schema: FieldSchema = serde_json::from_str(connector_spec_json)?;
//! let compiled = compiler::compile(&schema, compiler::CompileMode::New);
//! let value = compiled.validate(&submitted_form_values)?;
//! ```

pub mod catalog;
pub mod classifier;
pub mod compiler;
pub mod field;

pub use catalog::{find_operator_schema, Operator, OperatorSchema, PipelineModule, UiProperties};
pub use classifier::{classify, is_sensitive, FieldKind};
pub use compiler::{
    compile, compile_operator, CompileMode, CompiledSchema, ValidationErrors, ValidationIssue,
};
pub use field::FieldSchema;
