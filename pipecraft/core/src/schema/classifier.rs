//! Field-Kind Classifier
//!
//! Maps a [`FieldSchema`] to the widget that should render it. The result is
//! a closed [`FieldKind`] tag computed once per field, so form rendering and
//! validation dispatch over a single enum instead of re-inspecting the schema.
//!
//! The priority order in [`classify`] is load-bearing: `enum` is checked
//! before everything else so that a sensitive enum field (an auth-type
//! selector, say) renders as a restricted choice rather than a masked text
//! box. Display masking is a separate, independently evaluated concern, see
//! [`is_sensitive`].

use crate::schema::field::FieldSchema;

/// Keywords in a property key that mark its value as sensitive.
const SENSITIVE_KEYWORDS: &[&str] = &[
    "secret",
    "key",
    "token",
    "auth",
    "password",
    "private",
    "credentials",
];

/// The widget kind used to render one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Restricted choice from an enum of values
    Select,
    /// Checkbox/toggle
    Boolean,
    /// Numeric input
    Number,
    /// Repeated-value input
    Array,
    /// Nested group of fields
    Object,
    /// Multi-line text input
    Textarea,
    /// Masked single-line input
    Password,
    /// Plain single-line input
    Text,
}

impl FieldKind {
    /// Stable lowercase name, as used by form templates.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
            Self::Textarea => "textarea",
            Self::Password => "password",
            Self::Text => "text",
        }
    }

    /// Whether a sensitive value of this kind gets display masking.
    ///
    /// Masking only applies to free-text widgets. A select's current value is
    /// never masked even when the field is sensitive.
    #[must_use]
    pub fn supports_masking(self) -> bool {
        matches!(self, Self::Text | Self::Textarea | Self::Password)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classify a field schema into its widget kind.
///
/// First match wins: enum, boolean, number/integer, array, object,
/// format=textarea, format=password or a key name containing "password",
/// then plain text.
#[must_use]
pub fn classify(key: &str, schema: &FieldSchema) -> FieldKind {
    if schema.enum_values.is_some() {
        return FieldKind::Select;
    }

    match schema.type_str() {
        Some("boolean") => return FieldKind::Boolean,
        Some("number" | "integer") => return FieldKind::Number,
        Some("array") => return FieldKind::Array,
        Some("object") => return FieldKind::Object,
        _ => {}
    }

    match schema.format.as_deref() {
        Some("textarea") => FieldKind::Textarea,
        Some("password") => FieldKind::Password,
        _ if key.to_ascii_lowercase().contains("password") => FieldKind::Password,
        _ => FieldKind::Text,
    }
}

/// Whether a field's value is sensitive for display purposes.
///
/// Evaluated independently of [`classify`]: an explicit `airbyte_secret`
/// flag, or a key name containing any of the sensitive keywords
/// (case-insensitive). Whether masking actually applies depends on the
/// field's kind, see [`FieldKind::supports_masking`].
#[must_use]
pub fn is_sensitive(key: &str, schema: &FieldSchema) -> bool {
    if schema.airbyte_secret == Some(true) {
        return true;
    }
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_format(field_type: &str, format: &str) -> FieldSchema {
        FieldSchema {
            format: Some(format.to_string()),
            ..FieldSchema::of_type(field_type)
        }
    }

    #[test]
    fn test_enum_wins_regardless_of_type() {
        for declared in ["string", "number", "integer", "object", "weird"] {
            let schema = FieldSchema {
                enum_values: Some(vec!["a".to_string(), "b".to_string()]),
                ..FieldSchema::of_type(declared)
            };
            assert_eq!(classify("choice", &schema), FieldKind::Select);
        }
    }

    #[test]
    fn test_enum_wins_over_sensitive_format() {
        // An auth-type selector must render as a restricted choice, not a
        // masked text box.
        let schema = FieldSchema {
            enum_values: Some(vec!["basic".to_string(), "oauth".to_string()]),
            ..with_format("string", "password")
        };
        assert_eq!(classify("auth_type", &schema), FieldKind::Select);
        assert!(is_sensitive("auth_type", &schema));
        assert!(!classify("auth_type", &schema).supports_masking());
    }

    #[test]
    fn test_type_classification() {
        assert_eq!(
            classify("flag", &FieldSchema::of_type("boolean")),
            FieldKind::Boolean
        );
        assert_eq!(
            classify("port", &FieldSchema::of_type("number")),
            FieldKind::Number
        );
        assert_eq!(
            classify("retries", &FieldSchema::of_type("integer")),
            FieldKind::Number
        );
        assert_eq!(
            classify("tags", &FieldSchema::of_type("array")),
            FieldKind::Array
        );
        assert_eq!(
            classify("tunnel", &FieldSchema::of_type("object")),
            FieldKind::Object
        );
    }

    #[test]
    fn test_format_classification() {
        assert_eq!(
            classify("query", &with_format("string", "textarea")),
            FieldKind::Textarea
        );
        assert_eq!(
            classify("secret", &with_format("string", "password")),
            FieldKind::Password
        );
    }

    #[test]
    fn test_password_by_key_name() {
        let schema = FieldSchema::of_type("string");
        assert_eq!(classify("db_password", &schema), FieldKind::Password);
        assert_eq!(classify("Password", &schema), FieldKind::Password);
        assert_eq!(classify("host", &schema), FieldKind::Text);
    }

    #[test]
    fn test_unknown_type_is_text() {
        assert_eq!(
            classify("thing", &FieldSchema::of_type("tuple")),
            FieldKind::Text
        );
        assert_eq!(classify("thing", &FieldSchema::default()), FieldKind::Text);
    }

    #[test]
    fn test_sensitive_keywords() {
        let schema = FieldSchema::of_type("string");
        for key in [
            "client_secret",
            "api_key",
            "access_token",
            "auth_method",
            "password",
            "private_key",
            "aws_credentials",
            "SSH_KEY",
        ] {
            assert!(is_sensitive(key, &schema), "{key} should be sensitive");
        }
        assert!(!is_sensitive("host", &schema));
        assert!(!is_sensitive("port", &schema));
    }

    #[test]
    fn test_airbyte_secret_flag() {
        let schema = FieldSchema {
            airbyte_secret: Some(true),
            ..FieldSchema::of_type("string")
        };
        assert!(is_sensitive("host", &schema));

        let unflagged = FieldSchema {
            airbyte_secret: Some(false),
            ..FieldSchema::of_type("string")
        };
        assert!(!is_sensitive("host", &unflagged));
    }

    #[test]
    fn test_masking_only_for_free_text() {
        assert!(FieldKind::Text.supports_masking());
        assert!(FieldKind::Textarea.supports_masking());
        assert!(FieldKind::Password.supports_masking());
        assert!(!FieldKind::Select.supports_masking());
        assert!(!FieldKind::Boolean.supports_masking());
        assert!(!FieldKind::Number.supports_masking());
        assert!(!FieldKind::Array.supports_masking());
        assert!(!FieldKind::Object.supports_masking());
    }
}
