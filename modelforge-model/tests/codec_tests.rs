mod common;

use common::{address_in, factory, line_in, registry};
use modelforge_model::{CodecError, CodecLimits, ModelConfig, ModelError, ModelRegistry};
use modelforge_schema::{ContractDef, PropertyDef};
use modelforge_types::{PrimitiveKind, Timestamp, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

const KINDS: [PrimitiveKind; 13] = [
    PrimitiveKind::Bool,
    PrimitiveKind::U8,
    PrimitiveKind::I8,
    PrimitiveKind::U16,
    PrimitiveKind::I16,
    PrimitiveKind::U32,
    PrimitiveKind::I32,
    PrimitiveKind::U64,
    PrimitiveKind::I64,
    PrimitiveKind::F32,
    PrimitiveKind::F64,
    PrimitiveKind::Char,
    PrimitiveKind::Uuid,
];

/// Derives a value of `kind` from arbitrary bits.
fn primitive(kind: PrimitiveKind, raw: u64) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(raw & 1 == 1),
        PrimitiveKind::U8 => Value::U8(raw as u8),
        PrimitiveKind::I8 => Value::I8(raw as i8),
        PrimitiveKind::U16 => Value::U16(raw as u16),
        PrimitiveKind::I16 => Value::I16(raw as i16),
        PrimitiveKind::U32 => Value::U32(raw as u32),
        PrimitiveKind::I32 => Value::I32(raw as i32),
        PrimitiveKind::U64 => Value::U64(raw),
        PrimitiveKind::I64 => Value::I64(raw as i64),
        PrimitiveKind::F32 => Value::F32(f32::from_bits(raw as u32)),
        PrimitiveKind::F64 => Value::F64(f64::from_bits(raw)),
        PrimitiveKind::Char => Value::Char(char::from_u32((raw % 0xD800) as u32).unwrap_or('?')),
        PrimitiveKind::Uuid => Value::Uuid(Uuid::from_u64_pair(raw, !raw)),
    }
}

/// Five scalar fields: the first is a fixed-width `i32`.
fn five_fields(registry: &ModelRegistry) -> modelforge_model::ModelFactory {
    let contract = ContractDef::new("Five")
        .property(PropertyDef::primitive("A", PrimitiveKind::I32, 1))
        .property(PropertyDef::string("B", 2))
        .property(PropertyDef::primitive("C", PrimitiveKind::I32, 3))
        .property(PropertyDef::string("D", 4))
        .property(PropertyDef::primitive("E", PrimitiveKind::Bool, 5));
    registry.get_or_build(&contract).unwrap().1
}

proptest! {
    #[test]
    fn kitchen_sink_round_trips(
        ints in any::<(bool, u8, i8, u16, i16, u32, i32, u64, i64)>(),
        others in any::<(u32, u64, char, u128, Option<i32>, i64)>(),
        text in proptest::option::of(".{0,16}"),
        blob in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..32)),
        letters in proptest::option::of(proptest::collection::vec(any::<char>(), 0..8)),
        extra in proptest::option::of(any::<i32>()),
        city in proptest::option::of("[a-z]{1,8}"),
        circle in any::<bool>(),
        stops in 0usize..4,
        lines in 0usize..4,
    ) {
        let (flag, small, tiny, short, signed, word, int, big, long) = ints;
        let (single_bits, double_bits, letter, guid, maybe, when) = others;
        let registry = registry();
        let mut sink = factory(&registry, "KitchenSink").new_instance();
        sink.set("Flag", flag).unwrap();
        sink.set("Small", small).unwrap();
        sink.set("Tiny", tiny).unwrap();
        sink.set("Short", short).unwrap();
        sink.set("Signed", signed).unwrap();
        sink.set("Word", word).unwrap();
        sink.set("Int", int).unwrap();
        sink.set("Big", big).unwrap();
        sink.set("Long", long).unwrap();
        sink.set("Single", f32::from_bits(single_bits)).unwrap();
        sink.set("Double", f64::from_bits(double_bits)).unwrap();
        sink.set("Letter", letter).unwrap();
        sink.set("Guid", Uuid::from_u128(guid)).unwrap();
        sink.set("Maybe", maybe).unwrap();
        sink.set("Text", text).unwrap();
        sink.set("Blob", blob).unwrap();
        sink.set("Letters", letters).unwrap();
        sink.set("When", Timestamp::from_micros(when)).unwrap();
        sink.set("Extra", extra.map(|n| json!({ "n": n, "tags": ["a", "b"] }))).unwrap();
        if let Some(city) = &city {
            sink.set_model("Home", Some(address_in(&registry, city))).unwrap();
        }
        let figure = if circle {
            let mut circle = factory(&registry, "Circle").new_instance();
            circle.set("Radius", 1.5f64).unwrap();
            circle
        } else {
            factory(&registry, "Shape").new_instance()
        };
        sink.set_model("Figure", Some(figure)).unwrap();
        sink.set_models("Stops", (0..stops).map(|i| address_in(&registry, &format!("stop{i}"))).collect()).unwrap();
        for i in 0..lines {
            sink.collection_mut("Lines").unwrap().push(line_in(&registry, "sku", i as i32)).unwrap();
        }

        let bytes = sink.to_bytes().unwrap();
        let decoded = factory(&registry, "KitchenSink").from_bytes(&bytes).unwrap();

        prop_assert_eq!(&decoded, &sink);
        prop_assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn generated_contracts_round_trip(
        fields in proptest::collection::vec((0usize..KINDS.len(), any::<u64>()), 1..12)
            .prop_flat_map(|fields| {
                let orders: Vec<u32> = (1..=fields.len() as u32).collect();
                (Just(fields), Just(orders).prop_shuffle())
            })
    ) {
        let (fields, orders) = fields;
        let mut contract = ContractDef::new("Generated");
        for (i, ((kind, _), order)) in fields.iter().zip(&orders).enumerate() {
            contract = contract.property(PropertyDef::primitive(format!("F{i}"), KINDS[*kind], *order));
        }
        let registry = ModelRegistry::default();
        let (_, factory) = registry.get_or_build(&contract).unwrap();

        let mut instance = factory.new_instance();
        for (i, (kind, raw)) in fields.iter().enumerate() {
            instance.set(&format!("F{i}"), primitive(KINDS[*kind], *raw)).unwrap();
        }
        let bytes = instance.to_bytes().unwrap();
        let width: usize = fields.iter().map(|(kind, _)| KINDS[*kind].width()).sum();
        // Primitives plus the absent synthesized owner flag.
        prop_assert_eq!(bytes.len(), width + 1);

        let decoded = factory.from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded, instance);
    }
}

#[test]
fn payload_cut_on_a_field_boundary_keeps_defaults() {
    common::init_tracing();
    let registry = ModelRegistry::default();
    let factory = five_fields(&registry);
    let mut full = factory.new_instance();
    full.set("A", 7).unwrap();
    full.set("B", "bee").unwrap();
    full.set("C", 9).unwrap();
    full.set("D", "dee").unwrap();
    full.set("E", true).unwrap();
    let bytes = full.to_bytes().unwrap();

    let partial = factory.from_bytes(&bytes[..4]).unwrap();

    assert_eq!(partial.get("A").unwrap(), &Value::I32(7));
    assert_eq!(partial.get("B").unwrap(), &Value::Null);
    assert_eq!(partial.get("C").unwrap(), &Value::I32(0));
    assert_eq!(partial.get("D").unwrap(), &Value::Null);
    assert_eq!(partial.get("E").unwrap(), &Value::Bool(false));
}

#[test]
fn payload_cut_inside_a_field_is_an_error() {
    let registry = ModelRegistry::default();
    let factory = five_fields(&registry);
    let mut full = factory.new_instance();
    full.set("B", "bee").unwrap();
    let bytes = full.to_bytes().unwrap();

    // A (4 bytes), B's presence flag, then half of B's length prefix.
    let err = factory.from_bytes(&bytes[..7]).unwrap_err();
    match err {
        ModelError::Codec(CodecError::Truncated { property, .. }) => assert_eq!(property, "B"),
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn empty_payload_yields_defaults() {
    let registry = registry();
    let person = factory(&registry, "Person").from_bytes(&[]).unwrap();
    assert_eq!(person, factory(&registry, "Person").new_instance());
}

#[test]
fn trailing_bytes_survive_until_modified() {
    let registry = registry();
    let mut person = factory(&registry, "Person").new_instance();
    person.set("Name", "Ann").unwrap();
    let mut bytes = person.to_bytes().unwrap();
    bytes.extend_from_slice(&[0xaa, 0xbb, 0xcc]);

    let mut decoded = factory(&registry, "Person").from_bytes(&bytes).unwrap();
    assert_eq!(decoded, person);
    assert!(decoded.has_serialized_form());
    assert_eq!(decoded.to_bytes().unwrap(), bytes);

    decoded.set("Age", 31).unwrap();
    assert!(!decoded.has_serialized_form());
    let reencoded = decoded.to_bytes().unwrap();
    assert!(!reencoded.ends_with(&[0xaa, 0xbb, 0xcc]));
}

#[test]
fn nested_mutation_invalidates_the_parent_payload() {
    let registry = registry();
    let mut person = factory(&registry, "Person").new_instance();
    person.set_model("Address", Some(address_in(&registry, "Oslo"))).unwrap();
    let bytes = person.to_bytes().unwrap();

    let mut decoded = factory(&registry, "Person").from_bytes(&bytes).unwrap();
    decoded.model_mut("Address").unwrap().unwrap().set("City", "Bergen").unwrap();
    assert!(!decoded.has_serialized_form());

    let again = factory(&registry, "Person").from_bytes(&decoded.to_bytes().unwrap()).unwrap();
    let city = again.model("Address").unwrap().unwrap().get("City").unwrap();
    assert_eq!(city, &Value::from("Bergen"));
}

#[test]
fn collection_changes_invalidate_the_parent_payload() {
    let registry = registry();
    let order = factory(&registry, "Order").new_instance();
    let mut decoded = factory(&registry, "Order").from_bytes(&order.to_bytes().unwrap()).unwrap();

    decoded.collection_mut("Lines").unwrap().push(line_in(&registry, "A", 1)).unwrap();

    let again = factory(&registry, "Order").from_bytes(&decoded.to_bytes().unwrap()).unwrap();
    assert_eq!(again.collection("Lines").unwrap().len(), 1);
}

#[test]
fn clones_keep_the_decoded_payload() {
    let registry = registry();
    let mut person = factory(&registry, "Person").new_instance();
    person.set("Name", "Ann").unwrap();
    let mut bytes = person.to_bytes().unwrap();
    bytes.push(0xff);

    let decoded = factory(&registry, "Person").from_bytes(&bytes).unwrap();
    let copy = decoded.clone();
    assert_eq!(copy.to_bytes().unwrap(), bytes);
}

#[test]
fn polymorphic_values_keep_their_concrete_contract() {
    let registry = registry();
    let mut circle = factory(&registry, "Circle").new_instance();
    circle.set("Label", "c").unwrap();
    circle.set("Radius", 2.0f64).unwrap();
    let mut drawing = factory(&registry, "Drawing").new_instance();
    drawing.set_model("Main", Some(circle)).unwrap();

    let decoded = factory(&registry, "Drawing").from_bytes(&drawing.to_bytes().unwrap()).unwrap();
    let main = decoded.model("Main").unwrap().unwrap();
    assert_eq!(main.contract(), "Circle");
    assert_eq!(main.get("Radius").unwrap(), &Value::F64(2.0));
}

#[test]
fn indirect_descendants_decode_through_a_base_reference() {
    let registry = registry();
    let mut ring = factory(&registry, "Ring").new_instance();
    ring.set("Inner", 0.5f64).unwrap();
    let mut drawing = factory(&registry, "Drawing").new_instance();
    drawing.set_model("Main", Some(ring)).unwrap();

    let decoded = factory(&registry, "Drawing").from_bytes(&drawing.to_bytes().unwrap()).unwrap();
    let main = decoded.model("Main").unwrap().unwrap();
    assert_eq!(main.contract(), "Ring");
    assert_eq!(main.get("Inner").unwrap(), &Value::F64(0.5));
}

/// Drawing payload whose `Main` carries `tag` and an empty nested payload.
fn drawing_with_tag(tag: &str) -> Vec<u8> {
    let mut bytes = vec![1];
    bytes.extend_from_slice(&(tag.len() as u32).to_le_bytes());
    bytes.extend_from_slice(tag.as_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

#[test]
fn unknown_polymorphic_tag_is_rejected() {
    let registry = registry();
    let err = factory(&registry, "Drawing").from_bytes(&drawing_with_tag("Square")).unwrap_err();
    match err {
        ModelError::Codec(CodecError::UnknownContract { property, contract }) => {
            assert_eq!(property, "Main");
            assert_eq!(contract, "Square");
        }
        other => panic!("expected unknown contract, got {other:?}"),
    }
}

#[test]
fn unrelated_polymorphic_tag_is_rejected() {
    let registry = registry();
    let err = factory(&registry, "Drawing").from_bytes(&drawing_with_tag("Address")).unwrap_err();
    assert!(matches!(err, ModelError::Codec(CodecError::IncompatibleContract { .. })));
}

#[test]
fn invalid_presence_flag_is_rejected() {
    let registry = registry();
    let err = factory(&registry, "Address").from_bytes(&[2]).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Codec(CodecError::InvalidPresenceFlag { flag: 2, .. })
    ));
}

#[test]
fn element_count_limit_applies_on_decode() {
    let registry = ModelRegistry::new(ModelConfig {
        codec: CodecLimits {
            max_elements: 2,
            ..CodecLimits::default()
        },
    });
    registry.register(common::line());
    registry.register(common::address());
    registry.register(common::order());
    let order = registry.resolve("Order").unwrap();

    // Number, then Lines claiming three elements.
    let mut bytes = 5i64.to_le_bytes().to_vec();
    bytes.push(1);
    bytes.extend_from_slice(&3u32.to_le_bytes());
    let err = order.from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Codec(CodecError::TooManyElements { count: 3, max: 2, .. })
    ));
}

#[test]
fn oversized_payload_is_rejected() {
    let registry = ModelRegistry::new(ModelConfig {
        codec: CodecLimits {
            max_payload_len: 8,
            ..CodecLimits::default()
        },
    });
    let (_, factory) = registry.get_or_build(&common::address()).unwrap();
    let mut address = factory.new_instance();
    address.set("City", "a city name longer than eight bytes").unwrap();

    assert!(matches!(
        address.to_bytes(),
        Err(ModelError::Codec(CodecError::PayloadTooLarge { max: 8, .. }))
    ));
    assert!(matches!(
        factory.from_bytes(&[0; 16]),
        Err(ModelError::Codec(CodecError::PayloadTooLarge { len: 16, max: 8 }))
    ));
}

#[test]
fn decoding_does_not_notify() {
    let registry = registry();
    let mut person = factory(&registry, "Person").new_instance();
    person.set("Name", "Ann").unwrap();
    let bytes = person.to_bytes().unwrap();

    let mut target = factory(&registry, "Person").new_instance();
    let (seen, handler) = common::recorder();
    target.on_after_change("", handler);
    target.from_bytes(&bytes).unwrap();

    assert!(common::take(&seen).is_empty());
    assert_eq!(target, person);
}
