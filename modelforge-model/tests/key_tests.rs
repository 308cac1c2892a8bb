mod common;

use std::sync::{Arc, Mutex};

use common::{factory, recorder, registry, take};
use modelforge_model::{ModelError, ModelRegistry, PropertyChange};
use modelforge_schema::{ContractDef, PropertyDef};
use modelforge_types::{PrimitiveKind, Value};
use pretty_assertions::assert_eq;
use uuid::Uuid;

#[test]
fn contract_without_key() {
    let registry = registry();
    let mut person = factory(&registry, "Person").new_instance();
    let (seen, handler) = recorder();
    person.on_before_change("", handler);

    assert_eq!(person.key(), None);
    person.set_key("anything").unwrap();

    assert_eq!(person.key(), None);
    assert!(take(&seen).is_empty());
    assert_eq!(person, factory(&registry, "Person").new_instance());
}

#[test]
fn integer_key_round_trips() {
    let registry = registry();
    let mut order = factory(&registry, "Order").new_instance();
    assert_eq!(order.key().as_deref(), Some("0"));

    order.set_key("-42").unwrap();

    assert_eq!(order.get("Number").unwrap(), &Value::I64(-42));
    assert_eq!(order.key().as_deref(), Some("-42"));
    let decoded = factory(&registry, "Order").from_bytes(&order.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.key().as_deref(), Some("-42"));
}

#[test]
fn uuid_key_round_trips() {
    let registry = ModelRegistry::default();
    let contract = ContractDef::new("Document")
        .property(PropertyDef::primitive("Id", PrimitiveKind::Uuid, 1))
        .property(PropertyDef::string("Title", 2))
        .key("Id");
    let (_, factory) = registry.get_or_build(&contract).unwrap();
    let id = Uuid::now_v7();
    let mut document = factory.new_instance();

    document.set_key(&id.to_string()).unwrap();

    assert_eq!(document.get("Id").unwrap(), &Value::Uuid(id));
    assert_eq!(document.key(), Some(id.to_string()));
}

#[test]
fn unparseable_key_is_rejected() {
    let registry = registry();
    let mut order = factory(&registry, "Order").new_instance();
    order.set_key("7").unwrap();

    let err = order.set_key("abc").unwrap_err();

    assert!(matches!(err, ModelError::Conversion(_)));
    assert_eq!(order.key().as_deref(), Some("7"));
}

#[test]
fn set_key_raises_change_events() {
    let registry = registry();
    let mut order = factory(&registry, "Order").new_instance();
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    order.on_before_change("", move |c: &PropertyChange| sink.lock().unwrap().push(format!("before {}", c.path)));
    let sink = Arc::clone(&log);
    order.on_after_change("", move |c: &PropertyChange| sink.lock().unwrap().push(format!("after {}", c.path)));

    order.set_key("5").unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["before Number", "after Number"]);
}

#[test]
fn init_only_key_is_settable_through_the_accessor() {
    let registry = ModelRegistry::default();
    let contract = ContractDef::new("Invoice")
        .property(PropertyDef::primitive("Number", PrimitiveKind::U32, 1).init_only())
        .key("Number");
    let (_, factory) = registry.get_or_build(&contract).unwrap();
    let mut invoice = factory.new_instance();

    assert!(matches!(invoice.set("Number", 9u32), Err(ModelError::ReadOnly { .. })));
    invoice.set_key("9").unwrap();
    assert_eq!(invoice.key().as_deref(), Some("9"));
}
