#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for schema compilation and metadata validation.

use serde_json::json;
use tenuta_engine::error::EngineError;
use tenuta_engine::schema::{CompiledSchema, SchemaKind, ViolationKind};

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn compile_comment_schema() {
    let schema = CompiledSchema::compile(&json!({
        "type": "object",
        "properties": {
            "kind": {"type": "string", "required": true},
            "imageUrl": {"type": "string"},
        },
        "required": ["kind"],
    }))
    .unwrap();

    assert_eq!(schema.properties().len(), 2);
}

#[test]
fn compile_all_primitive_kinds() {
    let schema = CompiledSchema::compile(&json!({
        "type": "object",
        "properties": {
            "s": {"type": "string"},
            "n": {"type": "number"},
            "b": {"type": "boolean"},
            "o": {"type": "object"},
            "a": {"type": "array"},
        },
    }))
    .unwrap();

    let kind_of = |name: &str| {
        schema
            .properties()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.kind)
            .unwrap()
    };

    assert_eq!(kind_of("s"), SchemaKind::String);
    assert_eq!(kind_of("n"), SchemaKind::Number);
    assert_eq!(kind_of("b"), SchemaKind::Boolean);
    assert_eq!(kind_of("o"), SchemaKind::Object);
    assert_eq!(kind_of("a"), SchemaKind::Array);
}

#[test]
fn compile_rejects_malformed_documents() {
    for bad in [
        json!(42),
        json!([{"type": "object"}]),
        json!({"type": "string"}),
        json!({"type": 7}),
        json!({"properties": []}),
        json!({"properties": {"x": 1}}),
        json!({"properties": {"x": {"type": 1}}}),
        json!({"properties": {"x": {"type": "string", "required": "yes"}}}),
        json!({"required": "kind"}),
        json!({"required": [1]}),
    ] {
        let result = CompiledSchema::compile(&bad);
        assert!(
            matches!(result, Err(EngineError::InvalidSchema(_))),
            "expected InvalidSchema for {bad}"
        );
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Spec scenario: metadata with the required `kind` passes even without the
/// optional `imageUrl`; empty metadata fails citing `kind`.
#[test]
fn comment_metadata_scenario() {
    let schema = CompiledSchema::compile(&json!({
        "type": "object",
        "properties": {
            "kind": {"type": "string", "required": true},
            "imageUrl": {"type": "string"},
        },
        "required": ["kind"],
    }))
    .unwrap();

    assert!(schema.validate(&json!({"kind": "image"})).is_ok());

    let violations = schema.validate(&json!({})).unwrap_err();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "kind");
}

#[test]
fn validation_checks_declared_primitive_types() {
    let schema = CompiledSchema::compile(&json!({
        "properties": {
            "count": {"type": "number", "required": true},
            "flags": {"type": "array"},
        },
    }))
    .unwrap();

    assert!(schema
        .validate(&json!({"count": 3, "flags": ["a", "b"]}))
        .is_ok());

    let violations = schema
        .validate(&json!({"count": "three", "flags": {"a": 1}}))
        .unwrap_err();
    assert_eq!(violations.len(), 2);
}

#[test]
fn container_mismatch_is_distinguished_from_field_mismatch() {
    let schema = CompiledSchema::compile(&json!({
        "properties": {"kind": {"type": "string", "required": true}},
    }))
    .unwrap();

    let container = schema.validate(&json!("not an object")).unwrap_err();
    assert!(matches!(
        container[0].kind,
        ViolationKind::NotAnObject { .. }
    ));

    let field = schema.validate(&json!({"kind": 1})).unwrap_err();
    assert!(matches!(field[0].kind, ViolationKind::TypeMismatch { .. }));
}

#[test]
fn extra_undeclared_properties_are_allowed() {
    let schema = CompiledSchema::compile(&json!({
        "properties": {"kind": {"type": "string", "required": true}},
    }))
    .unwrap();

    assert!(schema
        .validate(&json!({"kind": "text", "anything": {"else": true}}))
        .is_ok());
}

#[test]
fn violations_serialize_for_api_error_bodies() {
    let schema = CompiledSchema::compile(&json!({
        "properties": {
            "kind": {"type": "string", "required": true},
            "count": {"type": "number"},
        },
    }))
    .unwrap();

    let violations = schema.validate(&json!({"count": false})).unwrap_err();
    let body = serde_json::to_value(&violations).unwrap();

    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["kind"].as_str().unwrap())
        .collect();

    assert!(kinds.contains(&"missing_required"));
    assert!(kinds.contains(&"type_mismatch"));
}
