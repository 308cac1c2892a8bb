//! Shared contracts and helpers for model tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use modelforge_model::{Instance, ModelFactory, ModelRegistry, PropertyChange};
use modelforge_schema::{ContractDef, PropertyDef};
use modelforge_types::PrimitiveKind;

pub fn address() -> ContractDef {
    ContractDef::new("Address")
        .property(PropertyDef::string("City", 1))
        .property(PropertyDef::string("Zip", 2))
}

pub fn person() -> ContractDef {
    ContractDef::new("Person")
        .property(PropertyDef::string("Name", 1))
        .property(PropertyDef::primitive("Age", PrimitiveKind::I32, 2))
        .property(PropertyDef::model("Address", "Address", 3))
}

pub fn line() -> ContractDef {
    ContractDef::new("Line")
        .property(PropertyDef::string("Sku", 1))
        .property(PropertyDef::primitive("Qty", PrimitiveKind::I32, 2))
}

pub fn order() -> ContractDef {
    ContractDef::new("Order")
        .property(PropertyDef::primitive("Number", PrimitiveKind::I64, 1))
        .property(PropertyDef::model_collection("Lines", "Line", 2))
        .property(PropertyDef::model_array("Stops", "Address", 3))
        .key("Number")
}

pub fn shape() -> ContractDef {
    ContractDef::new("Shape").property(PropertyDef::string("Label", 1))
}

pub fn circle() -> ContractDef {
    ContractDef::new("Circle")
        .extends("Shape")
        .property(PropertyDef::string("Label", 1))
        .property(PropertyDef::primitive("Radius", PrimitiveKind::F64, 2))
}

/// Extends `Shape` only through `Circle`.
pub fn ring() -> ContractDef {
    ContractDef::new("Ring")
        .extends("Circle")
        .property(PropertyDef::string("Label", 1))
        .property(PropertyDef::primitive("Radius", PrimitiveKind::F64, 2))
        .property(PropertyDef::primitive("Inner", PrimitiveKind::F64, 3))
}

pub fn drawing() -> ContractDef {
    ContractDef::new("Drawing")
        .property(PropertyDef::polymorphic("Main", "Shape", 1))
        .property(PropertyDef::string("Title", 2))
}

/// One property of every category.
pub fn kitchen_sink() -> ContractDef {
    ContractDef::new("KitchenSink")
        .property(PropertyDef::primitive("Flag", PrimitiveKind::Bool, 1))
        .property(PropertyDef::primitive("Small", PrimitiveKind::U8, 2))
        .property(PropertyDef::primitive("Tiny", PrimitiveKind::I8, 3))
        .property(PropertyDef::primitive("Short", PrimitiveKind::U16, 4))
        .property(PropertyDef::primitive("Signed", PrimitiveKind::I16, 5))
        .property(PropertyDef::primitive("Word", PrimitiveKind::U32, 6))
        .property(PropertyDef::primitive("Int", PrimitiveKind::I32, 7))
        .property(PropertyDef::primitive("Big", PrimitiveKind::U64, 8))
        .property(PropertyDef::primitive("Long", PrimitiveKind::I64, 9))
        .property(PropertyDef::primitive("Single", PrimitiveKind::F32, 10))
        .property(PropertyDef::primitive("Double", PrimitiveKind::F64, 11))
        .property(PropertyDef::primitive("Letter", PrimitiveKind::Char, 12))
        .property(PropertyDef::primitive("Guid", PrimitiveKind::Uuid, 13))
        .property(PropertyDef::nullable("Maybe", PrimitiveKind::I32, 14))
        .property(PropertyDef::string("Text", 15))
        .property(PropertyDef::bytes("Blob", 16))
        .property(PropertyDef::chars("Letters", 17))
        .property(PropertyDef::timestamp("When", 18))
        .property(PropertyDef::object("Extra", 19))
        .property(PropertyDef::model("Home", "Address", 20))
        .property(PropertyDef::polymorphic("Figure", "Shape", 21))
        .property(PropertyDef::model_array("Stops", "Address", 22))
        .property(PropertyDef::model_collection("Lines", "Line", 23))
}

/// A registry with every fixture contract registered.
pub fn registry() -> ModelRegistry {
    let registry = ModelRegistry::default();
    for contract in [address(), person(), line(), order(), shape(), circle(), ring(), drawing(), kitchen_sink()] {
        registry.register(contract);
    }
    registry
}

pub fn factory(registry: &ModelRegistry, name: &str) -> ModelFactory {
    registry.resolve(name).unwrap()
}

pub fn address_in(registry: &ModelRegistry, city: &str) -> Instance {
    let mut address = factory(registry, "Address").new_instance();
    address.set("City", city).unwrap();
    address
}

pub fn line_in(registry: &ModelRegistry, sku: &str, qty: i32) -> Instance {
    let mut line = factory(registry, "Line").new_instance();
    line.set("Sku", sku).unwrap();
    line.set("Qty", qty).unwrap();
    line
}

/// Collected notification paths.
pub type Seen = Arc<Mutex<Vec<String>>>;

/// Returns a sink and a handler that records every path it sees.
pub fn recorder() -> (Seen, impl Fn(&PropertyChange) + Send + Sync + 'static) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |change: &PropertyChange| sink.lock().unwrap().push(change.path.clone()))
}

pub fn take(seen: &Seen) -> Vec<String> {
    std::mem::take(&mut *seen.lock().unwrap())
}

/// Installs a test subscriber once so `RUST_LOG` controls test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
