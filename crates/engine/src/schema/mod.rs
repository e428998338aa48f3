//! Content type schema compilation and metadata validation.
//!
//! A content type's `schema` column holds a declarative JSON document of the
//! shape `{type: "object", properties: {key: {type, required?}}, required?}`.
//! [`CompiledSchema::compile`] turns that document into a list of per-property
//! rules; [`CompiledSchema::validate`] checks a metadata value against them,
//! collecting every violation instead of stopping at the first.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Primitive kind a schema property constrains its value to.
///
/// Unknown `type` strings compile to `Any`, which accepts every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl SchemaKind {
    /// Parse a schema `type` string. Unrecognized names are unconstrained.
    fn from_type_name(name: &str) -> Self {
        match name {
            "string" => SchemaKind::String,
            "number" => SchemaKind::Number,
            "boolean" => SchemaKind::Boolean,
            "object" => SchemaKind::Object,
            "array" => SchemaKind::Array,
            _ => SchemaKind::Any,
        }
    }

    /// Name used in violation payloads.
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::Any => "any",
        }
    }

    /// Check whether a JSON value is of this kind.
    fn matches(self, value: &Value) -> bool {
        match self {
            SchemaKind::String => value.is_string(),
            SchemaKind::Number => value.is_number(),
            SchemaKind::Boolean => value.is_boolean(),
            SchemaKind::Object => value.is_object(),
            SchemaKind::Array => value.is_array(),
            SchemaKind::Any => true,
        }
    }
}

/// Compiled rule for one schema property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRule {
    pub name: String,
    pub kind: SchemaKind,
    pub required: bool,
}

/// A schema document compiled into per-property validation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledSchema {
    properties: Vec<PropertyRule>,
}

/// Kind-specific payload of a [`Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// The metadata container itself is not an object.
    NotAnObject { received: String },
    /// A required property is absent.
    MissingRequired,
    /// A property is present with the wrong primitive type.
    TypeMismatch { expected: String, received: String },
}

/// One field-level validation failure, shaped for an API error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path of the offending field (`$` for the container itself).
    pub field: String,

    /// Human-readable description.
    pub message: String,

    /// Stable machine code.
    pub code: String,

    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    fn not_an_object(received: &Value) -> Self {
        Self {
            field: "$".to_string(),
            message: format!("metadata must be an object, got {}", json_type_name(received)),
            code: "not_an_object".to_string(),
            kind: ViolationKind::NotAnObject {
                received: json_type_name(received).to_string(),
            },
        }
    }

    fn missing_required(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("required property '{field}' is missing"),
            code: "missing_required".to_string(),
            kind: ViolationKind::MissingRequired,
        }
    }

    fn type_mismatch(field: &str, expected: SchemaKind, received: &Value) -> Self {
        Self {
            field: field.to_string(),
            message: format!(
                "property '{field}' must be of type {}, got {}",
                expected.name(),
                json_type_name(received)
            ),
            code: "type_mismatch".to_string(),
            kind: ViolationKind::TypeMismatch {
                expected: expected.name().to_string(),
                received: json_type_name(received).to_string(),
            },
        }
    }
}

/// JSON type name for violation payloads.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl CompiledSchema {
    /// Compile a schema document, checking its structure.
    ///
    /// Fails with [`EngineError::InvalidSchema`] when the document is not an
    /// object, `type` names something other than `object`, `properties` or a
    /// property rule is not an object, a `type` is not a string, a `required`
    /// flag is not a boolean, or the top-level `required` list is not an
    /// array of strings.
    pub fn compile(doc: &Value) -> Result<Self, EngineError> {
        let Some(root) = doc.as_object() else {
            return Err(EngineError::InvalidSchema(
                "schema document must be a JSON object".to_string(),
            ));
        };

        if let Some(ty) = root.get("type") {
            match ty.as_str() {
                Some("object") => {}
                Some(other) => {
                    return Err(EngineError::InvalidSchema(format!(
                        "top-level type must be \"object\", got \"{other}\""
                    )));
                }
                None => {
                    return Err(EngineError::InvalidSchema(
                        "top-level type must be a string".to_string(),
                    ));
                }
            }
        }

        // Schema documents spell required-ness both ways: a per-property
        // `required: true` flag and a top-level `required` name array.
        let mut required_names: Vec<String> = Vec::new();
        if let Some(req) = root.get("required") {
            let Some(list) = req.as_array() else {
                return Err(EngineError::InvalidSchema(
                    "top-level required must be an array".to_string(),
                ));
            };
            for entry in list {
                let Some(name) = entry.as_str() else {
                    return Err(EngineError::InvalidSchema(
                        "top-level required entries must be strings".to_string(),
                    ));
                };
                required_names.push(name.to_string());
            }
        }

        let mut properties = Vec::new();

        if let Some(props) = root.get("properties") {
            let Some(props) = props.as_object() else {
                return Err(EngineError::InvalidSchema(
                    "properties must be an object".to_string(),
                ));
            };

            for (name, rule) in props {
                let Some(rule) = rule.as_object() else {
                    return Err(EngineError::InvalidSchema(format!(
                        "property '{name}' must be an object"
                    )));
                };

                let kind = match rule.get("type") {
                    None => SchemaKind::Any,
                    Some(ty) => {
                        let Some(ty) = ty.as_str() else {
                            return Err(EngineError::InvalidSchema(format!(
                                "property '{name}' type must be a string"
                            )));
                        };
                        SchemaKind::from_type_name(ty)
                    }
                };

                let flagged = match rule.get("required") {
                    None => false,
                    Some(Value::Bool(b)) => *b,
                    Some(_) => {
                        return Err(EngineError::InvalidSchema(format!(
                            "property '{name}' required flag must be a boolean"
                        )));
                    }
                };

                properties.push(PropertyRule {
                    name: name.clone(),
                    kind,
                    required: flagged || required_names.iter().any(|r| r == name),
                });
            }
        }

        Ok(Self { properties })
    }

    /// Validate a metadata value, collecting every violation.
    ///
    /// A non-object container fails with a single [`ViolationKind::NotAnObject`]
    /// violation; otherwise all per-property failures are returned together.
    /// Optional properties that are absent do not fail.
    pub fn validate(&self, metadata: &Value) -> Result<(), Vec<Violation>> {
        let Some(map) = metadata.as_object() else {
            return Err(vec![Violation::not_an_object(metadata)]);
        };

        let mut violations = Vec::new();

        for rule in &self.properties {
            match map.get(&rule.name) {
                None => {
                    if rule.required {
                        violations.push(Violation::missing_required(&rule.name));
                    }
                }
                Some(value) => {
                    if !rule.kind.matches(value) {
                        violations.push(Violation::type_mismatch(&rule.name, rule.kind, value));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Compiled property rules.
    pub fn properties(&self) -> &[PropertyRule] {
        &self.properties
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment_schema() -> CompiledSchema {
        CompiledSchema::compile(&json!({
            "type": "object",
            "properties": {
                "kind": {"type": "string", "required": true},
                "imageUrl": {"type": "string"},
            },
        }))
        .unwrap()
    }

    #[test]
    fn compile_collects_property_rules() {
        let schema = comment_schema();
        assert_eq!(schema.properties().len(), 2);

        let kind = schema
            .properties()
            .iter()
            .find(|p| p.name == "kind")
            .unwrap();
        assert_eq!(kind.kind, SchemaKind::String);
        assert!(kind.required);

        let image = schema
            .properties()
            .iter()
            .find(|p| p.name == "imageUrl")
            .unwrap();
        assert!(!image.required);
    }

    #[test]
    fn compile_accepts_top_level_required_list() {
        let schema = CompiledSchema::compile(&json!({
            "type": "object",
            "properties": {
                "kind": {"type": "string"},
                "imageUrl": {"type": "string"},
            },
            "required": ["kind"],
        }))
        .unwrap();

        let kind = schema
            .properties()
            .iter()
            .find(|p| p.name == "kind")
            .unwrap();
        assert!(kind.required);
    }

    #[test]
    fn compile_unknown_type_is_unconstrained() {
        let schema = CompiledSchema::compile(&json!({
            "properties": {"anything": {"type": "uuid"}},
        }))
        .unwrap();

        assert_eq!(schema.properties()[0].kind, SchemaKind::Any);
        assert!(schema.validate(&json!({"anything": [1, 2]})).is_ok());
    }

    #[test]
    fn compile_rejects_non_object_document() {
        let err = CompiledSchema::compile(&json!("not a schema")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchema(_)));
    }

    #[test]
    fn compile_rejects_bad_top_level_type() {
        let err = CompiledSchema::compile(&json!({"type": "array"})).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchema(_)));
    }

    #[test]
    fn compile_rejects_non_object_property_rule() {
        let err = CompiledSchema::compile(&json!({
            "properties": {"kind": "string"},
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchema(_)));
    }

    #[test]
    fn compile_rejects_non_boolean_required_flag() {
        let err = CompiledSchema::compile(&json!({
            "properties": {"kind": {"type": "string", "required": "yes"}},
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchema(_)));
    }

    #[test]
    fn validate_passes_with_optional_absent() {
        let schema = comment_schema();
        assert!(schema.validate(&json!({"kind": "image"})).is_ok());
    }

    #[test]
    fn validate_missing_required_cites_field() {
        let schema = comment_schema();
        let violations = schema.validate(&json!({})).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "kind");
        assert_eq!(violations[0].code, "missing_required");
    }

    #[test]
    fn validate_type_mismatch_carries_expected_and_received() {
        let schema = comment_schema();
        let violations = schema.validate(&json!({"kind": 7})).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].kind,
            ViolationKind::TypeMismatch {
                expected: "string".to_string(),
                received: "number".to_string(),
            }
        );
    }

    #[test]
    fn validate_collects_all_violations() {
        let schema = CompiledSchema::compile(&json!({
            "properties": {
                "a": {"type": "string", "required": true},
                "b": {"type": "number", "required": true},
                "c": {"type": "boolean"},
            },
        }))
        .unwrap();

        let violations = schema.validate(&json!({"c": "nope"})).unwrap_err();
        assert_eq!(violations.len(), 3);

        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"a"));
        assert!(fields.contains(&"b"));
        assert!(fields.contains(&"c"));
    }

    #[test]
    fn validate_non_object_container_is_distinct() {
        let schema = comment_schema();

        for bad in [json!(null), json!([1]), json!("text"), json!(12)] {
            let violations = schema.validate(&bad).unwrap_err();
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "$");
            assert!(matches!(
                violations[0].kind,
                ViolationKind::NotAnObject { .. }
            ));
        }
    }

    #[test]
    fn violation_serializes_with_kind_tag() {
        let schema = comment_schema();
        let violations = schema.validate(&json!({"kind": false})).unwrap_err();

        let body = serde_json::to_value(&violations[0]).unwrap();
        assert_eq!(body["kind"], "type_mismatch");
        assert_eq!(body["field"], "kind");
        assert_eq!(body["expected"], "string");
        assert_eq!(body["received"], "boolean");
    }

    #[test]
    fn empty_schema_only_checks_container() {
        let schema = CompiledSchema::compile(&json!({"type": "object"})).unwrap();
        assert!(schema.validate(&json!({"free": "form"})).is_ok());
        assert!(schema.validate(&json!(42)).is_err());
    }
}
