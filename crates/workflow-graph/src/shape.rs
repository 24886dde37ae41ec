//! Declarative configuration shapes
//!
//! Every node type declares the exact set of fields its `data` may carry.
//! [`check_node_data`] walks raw JSON against that declaration and reports
//! every mismatch it finds, each addressed by a field path such as
//! `extractions[0].selector`.

use serde::Serialize;
use serde_json::Value;

use crate::types::LABEL_FIELD;

/// The primitive kind a configuration field must have
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    /// Non-negative whole number
    Integer,
    Boolean,
    /// A string restricted to the listed values
    Enum(&'static [&'static str]),
    /// Homogeneous list
    List(&'static FieldKind),
    /// String-keyed map with homogeneous values
    Map(&'static FieldKind),
    /// Nested object with its own closed field set
    Record(&'static [FieldSpec]),
}

impl FieldKind {
    fn describe(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Number => "number".to_string(),
            FieldKind::Integer => "non-negative integer".to_string(),
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Enum(values) => format!("one of [{}]", values.join(", ")),
            FieldKind::List(inner) => format!("list of {}", inner.describe()),
            FieldKind::Map(inner) => format!("map of {}", inner.describe()),
            FieldKind::Record(_) => "object".to_string(),
        }
    }
}

/// One declared configuration field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    /// A field that must be present
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// A field that may be absent or null
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Fields every node type accepts in addition to its own
pub const COMMON_FIELDS: &[FieldSpec] = &[FieldSpec::optional(LABEL_FIELD, FieldKind::String)];

/// What went wrong with a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    NotAnObject,
    MissingField,
    UnknownField,
    WrongKind,
}

/// A single mismatch between node data and its declared shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeViolation {
    pub kind: ViolationKind,
    /// Path of the offending field; empty for the data root
    pub field: String,
    pub message: String,
}

/// Check node `data` against a type's shape plus [`COMMON_FIELDS`]
pub fn check_node_data(data: &Value, shape: &[FieldSpec]) -> Vec<ShapeViolation> {
    let mut violations = Vec::new();
    check_record(data, shape, COMMON_FIELDS, "", &mut violations);
    violations
}

/// Check an arbitrary value against a closed field set
pub fn check_shape(data: &Value, shape: &[FieldSpec]) -> Vec<ShapeViolation> {
    let mut violations = Vec::new();
    check_record(data, shape, &[], "", &mut violations);
    violations
}

fn check_record(
    value: &Value,
    fields: &[FieldSpec],
    extra: &[FieldSpec],
    path: &str,
    out: &mut Vec<ShapeViolation>,
) {
    let Some(map) = value.as_object() else {
        out.push(ShapeViolation {
            kind: ViolationKind::NotAnObject,
            field: path.to_string(),
            message: format!("expected an object, found {}", json_kind(value)),
        });
        return;
    };

    for spec in fields.iter().chain(extra) {
        let field_path = join(path, spec.name);
        match map.get(spec.name) {
            None | Some(Value::Null) if !spec.required => {}
            None => out.push(ShapeViolation {
                kind: ViolationKind::MissingField,
                message: format!("missing required field '{}'", field_path),
                field: field_path,
            }),
            Some(v) => check_value(v, &spec.kind, &field_path, out),
        }
    }

    for key in map.keys() {
        let declared = fields.iter().chain(extra).any(|s| s.name == key);
        if !declared {
            let field_path = join(path, key);
            out.push(ShapeViolation {
                kind: ViolationKind::UnknownField,
                message: format!("unknown field '{}'", field_path),
                field: field_path,
            });
        }
    }
}

fn check_value(value: &Value, kind: &FieldKind, path: &str, out: &mut Vec<ShapeViolation>) {
    let matches = match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Integer => value.is_u64(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Enum(values) => value.as_str().is_some_and(|s| values.contains(&s)),
        FieldKind::List(inner) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_value(item, inner, &format!("{}[{}]", path, i), out);
                }
                true
            }
            None => false,
        },
        FieldKind::Map(inner) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    check_value(item, inner, &join(path, key), out);
                }
                true
            }
            None => false,
        },
        FieldKind::Record(fields) => {
            if value.is_object() {
                check_record(value, fields, &[], path, out);
                true
            } else {
                false
            }
        }
    };

    if !matches {
        let found = match (kind, value.as_str()) {
            (FieldKind::Enum(_), Some(s)) => format!("'{}'", s),
            _ => json_kind(value).to_string(),
        };
        out.push(ShapeViolation {
            kind: ViolationKind::WrongKind,
            field: path.to_string(),
            message: format!("field '{}' must be {}, found {}", path, kind.describe(), found),
        });
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Name of a JSON value's kind, for messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
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
    use serde_json::json;

    const ITEM: &[FieldSpec] = &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("multiple", FieldKind::Boolean),
    ];

    const SHAPE: &[FieldSpec] = &[
        FieldSpec::required("url", FieldKind::String),
        FieldSpec::required("method", FieldKind::Enum(&["GET", "POST"])),
        FieldSpec::optional("timeoutMs", FieldKind::Integer),
        FieldSpec::optional("headers", FieldKind::Map(&FieldKind::String)),
        FieldSpec::required("items", FieldKind::List(&FieldKind::Record(ITEM))),
    ];

    #[test]
    fn test_valid_data() {
        let data = json!({
            "url": "https://example.com",
            "method": "GET",
            "headers": {"Accept": "text/html"},
            "items": [{"name": "a"}, {"name": "b", "multiple": true}],
            "label": "fetch",
        });
        assert!(check_node_data(&data, SHAPE).is_empty());
    }

    #[test]
    fn test_label_only_allowed_on_node_data() {
        let data = json!({"url": "u", "method": "GET", "items": [], "label": "x"});
        assert!(check_node_data(&data, SHAPE).is_empty());

        let violations = check_shape(&data, SHAPE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnknownField);
        assert_eq!(violations[0].field, "label");
    }

    #[test]
    fn test_missing_required_field() {
        let data = json!({"method": "GET", "items": []});
        let violations = check_node_data(&data, SHAPE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingField);
        assert_eq!(violations[0].field, "url");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let data = json!({"url": "u", "method": "GET", "items": [], "retries": 3});
        let violations = check_node_data(&data, SHAPE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnknownField);
        assert_eq!(violations[0].field, "retries");
    }

    #[test]
    fn test_wrong_kinds() {
        let data = json!({"url": 5, "method": "DELETE", "timeoutMs": -1, "items": []});
        let violations = check_node_data(&data, SHAPE);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["url", "method", "timeoutMs"]);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::WrongKind));
        assert!(violations[1].message.contains("'DELETE'"));
    }

    #[test]
    fn test_nested_paths() {
        let data = json!({
            "url": "u",
            "method": "POST",
            "headers": {"X-Count": 1},
            "items": [{"name": "ok"}, {"multiple": "yes"}],
        });
        let violations = check_node_data(&data, SHAPE);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["headers.X-Count", "items[1].name", "items[1].multiple"]);
    }

    #[test]
    fn test_null_optional_is_absent_but_null_required_is_wrong() {
        let data = json!({"url": null, "method": "GET", "timeoutMs": null, "items": []});
        let violations = check_node_data(&data, SHAPE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "url");
        assert_eq!(violations[0].kind, ViolationKind::WrongKind);
    }

    #[test]
    fn test_non_object_data() {
        let violations = check_node_data(&json!("nope"), SHAPE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::NotAnObject);
        assert_eq!(violations[0].field, "");
    }
}
