//! Schema validation of configuration values.
//!
//! Validates a `serde_json::Value` against a [`Schema`] and reports every
//! problem as an attribute-scoped [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use planetscale_provider::schema::{Attribute, Schema};
//! use planetscale_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("organization", Attribute::required_string())
//!     .with_attribute("role", Attribute::optional_string().with_one_of(["admin", "reader"]));
//!
//! assert!(validate(&schema, &json!({"organization": "acme", "role": "admin"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"organization": "acme", "role": "owner"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("role".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use crate::types::is_unknown;
use serde_json::Value;
use std::collections::BTreeMap;

/// Validate a JSON value against a schema.
///
/// Returns an empty list when the value is valid.
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Unknown values are accepted for any configurable attribute
/// - Types must match and `one_of` restrictions must hold
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => {
            validate_missing(schema, &mut diagnostics);
            return diagnostics;
        }
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        }
    };

    for (name, attr) in &schema.block.attributes {
        validate_attribute(attr, obj.get(name), name, &mut diagnostics);
    }

    diagnostics
}

fn validate_missing(schema: &Schema, diagnostics: &mut Vec<Diagnostic>) {
    for (name, attr) in &schema.block.attributes {
        validate_attribute(attr, None, name, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !attr.flags.is_configurable() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(Diagnostic::attribute_error(
                    path,
                    format!("Missing required attribute '{}'", path),
                    "This attribute is required and must be provided",
                ));
            }
        }
        Some(v) if is_unknown(v) => {}
        Some(v) => {
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            validate_one_of(attr, v, path, diagnostics);
        }
    }
}

fn validate_one_of(attr: &Attribute, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    if attr.one_of.is_empty() {
        return;
    }
    let Some(s) = value.as_str() else {
        return;
    };
    if !attr.one_of.iter().any(|allowed| allowed == s) {
        diagnostics.push(Diagnostic::attribute_error(
            path,
            format!("Invalid value for attribute '{}'", path),
            format!(
                "Value must be one of: {}, got \"{}\"",
                attr.one_of.join(", "),
                s
            ),
        ));
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        }
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        }
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        }
    }
}

fn validate_object_type(
    attrs: &BTreeMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Object members carry no required/optional flags, so presence is not enforced.
    for (name, attr_type) in attrs {
        if let Some(value) = obj.get(name).filter(|v| !v.is_null()) {
            let attr_path = format!("{}.{}", path, name);
            validate_attribute_type(attr_type, value, &attr_path, diagnostics);
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.as_f64()
                    .map(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
                    .unwrap_or(false)
        }
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::attribute_error(
        path,
        format!("Invalid type for attribute '{}'", path),
        format!("Expected {}, got {}", expected, value_type_name(got)),
    )
}
