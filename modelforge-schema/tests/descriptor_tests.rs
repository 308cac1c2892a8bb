use modelforge_schema::{
    ContractDef, OWNER_PROPERTY, OWNER_WIRE_ORDER, PropertyCategory, PropertyDef, SchemaDescriptor, SchemaError,
};
use modelforge_types::PrimitiveKind;
use pretty_assertions::assert_eq;

fn person() -> ContractDef {
    ContractDef::new("Person")
        .property(PropertyDef::primitive("Id", PrimitiveKind::Uuid, 1))
        .property(PropertyDef::string("Name", 2))
        .property(PropertyDef::model("Address", "Address", 3))
        .property(PropertyDef::model_collection("Phones", "Phone", 4))
        .key("Id")
}

// ── Compilation ──────────────────────────────────────────────────

#[test]
fn compiles_declared_properties_in_order() {
    let descriptor = SchemaDescriptor::compile(&person()).unwrap();
    assert_eq!(descriptor.identity(), "Person");
    let names: Vec<&str> = descriptor.properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Id", "Name", "Address", "Phones", OWNER_PROPERTY]);
    for (i, p) in descriptor.properties().iter().enumerate() {
        assert_eq!(p.index(), i);
    }
}

#[test]
fn key_property_is_resolved() {
    let descriptor = SchemaDescriptor::compile(&person()).unwrap();
    assert_eq!(descriptor.key_property().map(|p| p.name()), Some("Id"));
}

#[test]
fn owner_is_synthesized_when_absent() {
    let descriptor = SchemaDescriptor::compile(&person()).unwrap();
    let owner = descriptor.owner_property();
    assert_eq!(owner.name(), OWNER_PROPERTY);
    assert_eq!(owner.order(), OWNER_WIRE_ORDER);
    assert_eq!(*owner.category(), PropertyCategory::String);
    assert!(owner.synthesized());
}

#[test]
fn declared_owner_property_is_adopted() {
    let contract = ContractDef::new("Line")
        .property(PropertyDef::model("Order", "Order", 1))
        .owner("Order");
    let descriptor = SchemaDescriptor::compile(&contract).unwrap();
    assert_eq!(descriptor.len(), 1);
    assert_eq!(descriptor.owner_property().name(), "Order");
    assert!(!descriptor.owner_property().synthesized());
}

#[test]
fn property_named_owner_is_adopted_implicitly() {
    let contract = ContractDef::new("Doc").property(PropertyDef::string(OWNER_PROPERTY, 1));
    let descriptor = SchemaDescriptor::compile(&contract).unwrap();
    assert_eq!(descriptor.len(), 1);
    assert_eq!(descriptor.owner_property().order(), 1);
}

#[test]
fn assignability_follows_extends() {
    let circle = ContractDef::new("Circle").extends("Shape");
    let descriptor = SchemaDescriptor::compile(&circle).unwrap();
    assert!(descriptor.is_assignable_to("Shape"));
    assert!(descriptor.is_assignable_to("Circle"));
    assert!(!descriptor.is_assignable_to("Square"));
}

#[test]
fn init_only_and_write_only_flags_survive() {
    let contract = ContractDef::new("Secret")
        .property(PropertyDef::string("Created", 1).init_only())
        .property(PropertyDef::string("Password", 2).write_only());
    let descriptor = SchemaDescriptor::compile(&contract).unwrap();
    let created = descriptor.property("Created").unwrap();
    assert!(created.readable() && !created.writable());
    let password = descriptor.property("Password").unwrap();
    assert!(!password.readable() && password.writable());
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn empty_identity_rejected() {
    assert!(matches!(
        SchemaDescriptor::compile(&ContractDef::new("  ")),
        Err(SchemaError::EmptyIdentity)
    ));
}

#[test]
fn duplicate_property_rejected() {
    let contract = ContractDef::new("T")
        .property(PropertyDef::string("A", 1))
        .property(PropertyDef::string("A", 2));
    assert!(matches!(
        SchemaDescriptor::compile(&contract),
        Err(SchemaError::DuplicateProperty { property, .. }) if property == "A"
    ));
}

#[test]
fn duplicate_order_rejected() {
    let contract = ContractDef::new("T")
        .property(PropertyDef::string("A", 1))
        .property(PropertyDef::string("B", 1));
    match SchemaDescriptor::compile(&contract) {
        Err(SchemaError::DuplicateOrder { order, first, second, .. }) => {
            assert_eq!((order, first.as_str(), second.as_str()), (1, "A", "B"));
        }
        other => panic!("expected DuplicateOrder, got {other:?}"),
    }
}

#[test]
fn order_colliding_with_synthesized_owner_rejected() {
    let contract = ContractDef::new("T").property(PropertyDef::string("Last", OWNER_WIRE_ORDER));
    assert!(matches!(
        SchemaDescriptor::compile(&contract),
        Err(SchemaError::DuplicateOrder { .. })
    ));
}

#[test]
fn unsupported_type_rejected() {
    let contract = ContractDef::new("T").property(PropertyDef::new("Price", "decimal", 1));
    assert!(matches!(
        SchemaDescriptor::compile(&contract),
        Err(SchemaError::UnsupportedType { ty, .. }) if ty == "decimal"
    ));
}

#[test]
fn invalid_property_names_rejected() {
    for name in ["", "A.B", "Lines(0)", "has space"] {
        let contract = ContractDef::new("T").property(PropertyDef::string(name, 1));
        assert!(
            matches!(SchemaDescriptor::compile(&contract), Err(SchemaError::InvalidPropertyName { .. })),
            "{name:?} should be rejected"
        );
    }
}

#[test]
fn unknown_key_rejected() {
    let contract = ContractDef::new("T").property(PropertyDef::string("A", 1)).key("B");
    assert!(matches!(SchemaDescriptor::compile(&contract), Err(SchemaError::UnknownKey { .. })));
}

#[test]
fn model_key_rejected() {
    let contract = ContractDef::new("T")
        .property(PropertyDef::model("A", "Other", 1))
        .key("A");
    assert!(matches!(
        SchemaDescriptor::compile(&contract),
        Err(SchemaError::KeyNotConvertible { .. })
    ));
}

#[test]
fn unknown_owner_rejected() {
    let contract = ContractDef::new("T").owner("Parent");
    assert!(matches!(SchemaDescriptor::compile(&contract), Err(SchemaError::UnknownOwner { .. })));
}

#[test]
fn numeric_owner_rejected() {
    let contract = ContractDef::new("T")
        .property(PropertyDef::primitive("Parent", PrimitiveKind::I32, 1))
        .owner("Parent");
    assert!(matches!(SchemaDescriptor::compile(&contract), Err(SchemaError::InvalidOwner { .. })));
}

// ── Contract documents ───────────────────────────────────────────

#[test]
fn contract_loads_from_json() {
    let json = r#"{
        "name": "Person",
        "key": "Id",
        "properties": [
            { "name": "Id", "type": "uuid", "order": 1 },
            { "name": "Name", "type": "string", "order": 2 },
            { "name": "Address", "type": "model<Address>", "order": 3 },
            { "name": "Phones", "type": "collection<Phone>", "order": 4 }
        ]
    }"#;
    let contract = ContractDef::from_json(json).unwrap();
    assert_eq!(contract, person());
}

#[test]
fn contract_json_flags_default_to_true() {
    let json = r#"{ "name": "T", "properties": [ { "name": "A", "type": "int?", "order": 7, "writable": false } ] }"#;
    let contract = ContractDef::from_json(json).unwrap();
    assert!(contract.properties[0].readable);
    assert!(!contract.properties[0].writable);
    let descriptor = SchemaDescriptor::compile(&contract).unwrap();
    assert_eq!(
        *descriptor.property("A").unwrap().category(),
        PropertyCategory::Nullable(PrimitiveKind::I32)
    );
}

#[test]
fn malformed_json_is_a_schema_error() {
    assert!(matches!(ContractDef::from_json("{"), Err(SchemaError::Json(_))));
}
