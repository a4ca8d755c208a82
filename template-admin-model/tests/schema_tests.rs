use pretty_assertions::assert_eq;
use std::io::Write;
use template_admin_model::{EntitySchema, FieldDef, FieldType, SchemaDocument, SchemaError};

// ── FieldDef constructors ────────────────────────────────────────

#[test]
fn id_field_is_required() {
    let f = FieldDef::id("id");
    assert_eq!(f.name, "id");
    assert_eq!(f.field_type, FieldType::Id);
    assert!(f.is_required);
    assert!(!f.is_array);
}

#[test]
fn shorthand_fields_are_optional() {
    for f in [
        FieldDef::string("site"),
        FieldDef::int("count"),
        FieldDef::float("ratio"),
        FieldDef::boolean("active"),
    ] {
        assert!(!f.is_required, "{} should be optional", f.name);
    }
}

#[test]
fn builders_set_flags() {
    let f = FieldDef::string("tags").array().required();
    assert!(f.is_array);
    assert!(f.is_required);
}

// ── FieldType ────────────────────────────────────────────────────

#[test]
fn numeric_types() {
    assert!(FieldType::Int.is_numeric());
    assert!(FieldType::Float.is_numeric());
    assert!(!FieldType::String.is_numeric());
    assert!(!FieldType::Id.is_numeric());
    assert!(!FieldType::Scalar("AWSTimestamp".into()).is_numeric());
}

#[test]
fn field_type_parses_scalar_names() {
    let parsed: Vec<FieldType> =
        serde_json::from_str(r#"["ID","String","Int","Float","Boolean","AWSDateTime"]"#).unwrap();
    assert_eq!(
        parsed,
        vec![
            FieldType::Id,
            FieldType::String,
            FieldType::Int,
            FieldType::Float,
            FieldType::Boolean,
            FieldType::Scalar("AWSDateTime".into()),
        ]
    );
}

#[test]
fn field_type_parses_references() {
    let parsed: Vec<FieldType> =
        serde_json::from_str(r#"[{"model":"Post"},{"enum":"Status"},{"nonModel":"Address"}]"#)
            .unwrap();
    assert_eq!(
        parsed,
        vec![
            FieldType::Model("Post".into()),
            FieldType::Enum("Status".into()),
            FieldType::NonModel("Address".into()),
        ]
    );
}

#[test]
fn field_type_serializes_like_the_schema_document() {
    assert_eq!(serde_json::to_string(&FieldType::Id).unwrap(), r#""ID""#);
    assert_eq!(
        serde_json::to_string(&FieldType::Model("Post".into())).unwrap(),
        r#"{"model":"Post"}"#
    );
    assert_eq!(FieldType::Float.to_string(), "Float");
}

// ── EntitySchema ─────────────────────────────────────────────────

fn make_schema() -> EntitySchema {
    EntitySchema::new(
        "Widget",
        "Widgets",
        vec![
            FieldDef::id("id"),
            FieldDef::string("label").required(),
            FieldDef::int("count"),
            FieldDef::float("weight"),
        ],
    )
}

#[test]
fn field_lookup() {
    let s = make_schema();
    assert!(s.has_field("label"));
    assert!(!s.has_field("missing"));
    assert_eq!(s.field("count").unwrap().field_type, FieldType::Int);
}

#[test]
fn field_names_keep_declaration_order() {
    let s = make_schema();
    let names: Vec<&str> = s.field_names().collect();
    assert_eq!(names, vec!["id", "label", "count", "weight"]);
}

#[test]
fn required_fields() {
    let s = make_schema();
    let names: Vec<&str> = s.required_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "label"]);
}

#[test]
fn sort_type_uses_declared_type() {
    let s = make_schema();
    assert_eq!(s.sort_type("count"), FieldType::Int);
    assert_eq!(s.sort_type("weight"), FieldType::Float);
    assert_eq!(s.sort_type("label"), FieldType::String);
}

#[test]
fn sort_type_of_version_is_int() {
    assert_eq!(make_schema().sort_type("_version"), FieldType::Int);
}

#[test]
fn sort_type_of_unknown_field_is_string() {
    assert_eq!(make_schema().sort_type("_lastChangedAt"), FieldType::String);
}

#[test]
fn entity_schema_json_preserves_field_order() {
    let json = r#"{
        "name": "Thing",
        "pluralName": "Things",
        "fields": {
            "zeta": {"type": "String"},
            "alpha": {"name": "alpha", "type": "Int", "isRequired": true},
            "mid": {"type": "Boolean", "isArray": true}
        }
    }"#;
    let s: EntitySchema = serde_json::from_str(json).unwrap();
    let names: Vec<&str> = s.field_names().collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert!(s.field("alpha").unwrap().is_required);
    assert!(s.field("mid").unwrap().is_array);
    assert!(!s.syncable);
}

#[test]
fn entity_schema_serde_roundtrip() {
    let s = make_schema();
    let json = serde_json::to_string(&s).unwrap();
    let back: EntitySchema = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
}

// ── SchemaDocument ───────────────────────────────────────────────

#[test]
fn builtin_document_has_template_model() {
    let doc = SchemaDocument::builtin().unwrap();
    assert_eq!(doc.version, "213520af58449596288dc8874c01fb20");

    let template = &doc.models["Template"];
    assert_eq!(template.plural_name, "Templates");
    assert!(template.syncable);
    let names: Vec<&str> = template.field_names().collect();
    assert_eq!(
        names,
        vec![
            "id",
            "site",
            "facility",
            "serviceMode",
            "welcome",
            "preop",
            "intra",
            "pacu",
            "done"
        ]
    );
    assert!(template.field("site").unwrap().is_required);
    assert!(!template.field("facility").unwrap().is_required);
}

#[test]
fn document_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"models":{{"Note":{{"name":"Note","pluralName":"Notes","fields":{{"id":{{"type":"ID","isRequired":true}}}}}}}},"version":"abc"}}"#
    )
    .unwrap();

    let doc = SchemaDocument::from_path(file.path()).unwrap();
    assert_eq!(doc.version, "abc");
    assert_eq!(doc.models["Note"].plural_name, "Notes");
    assert!(doc.enums.is_empty());
}

#[test]
fn document_from_missing_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaDocument::from_path(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Io(_)));
}

#[test]
fn malformed_document_is_parse_error() {
    let err = SchemaDocument::from_json(r#"{"models": []}"#).unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}
