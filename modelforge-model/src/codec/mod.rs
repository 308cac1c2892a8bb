//! Binary codec.
//!
//! Fields are written in ascending serialization order with no envelope:
//!
//! | Category | Wire form |
//! |---|---|
//! | primitive | fixed-width little-endian value |
//! | nullable primitive | presence flag, then the value if present |
//! | string, bytes, chars | presence flag, then a length-prefixed payload (chars as UTF-8) |
//! | timestamp | 8-byte little-endian microseconds |
//! | model | presence flag, then a length-prefixed nested payload |
//! | polymorphic model | presence flag, length-prefixed contract tag, length-prefixed nested payload |
//! | model array, collection | presence flag, `u32` count, then one length-prefixed payload per element |
//! | object | presence flag, then length-prefixed JSON |
//!
//! Presence flags are a single `0` or `1` byte; length prefixes and counts
//! are 4-byte little-endian. Decoding stops quietly when the input ends on a
//! field boundary, leaving later fields at their defaults, and ignores bytes
//! past the last known field.

mod error;
mod reader;
mod writer;

use std::sync::Arc;

use modelforge_schema::{PropertyCategory, PropertyDescriptor};
use modelforge_types::{Timestamp, Value};
use tracing::debug;

pub use error::{CodecError, CodecResult};
use reader::WireReader;
use writer::WireWriter;

use crate::instance::Slot;
use crate::property::PropertyRef;
use crate::{CodecLimits, Instance, ModelError, ModelFactory, ModelResult};

impl Instance {
    /// Encodes this instance.
    ///
    /// An instance decoded with [`from_bytes`](Self::from_bytes) and not
    /// modified since returns the exact bytes it was decoded from.
    pub fn to_bytes(&self) -> ModelResult<Vec<u8>> {
        let limits = &self.factory().config().codec;
        Ok(encode(self, limits, 0)?.to_vec())
    }

    /// Replaces every property with the contents of `bytes`.
    ///
    /// No notifications are raised. On error the instance is left partially
    /// populated and should be discarded.
    pub fn from_bytes(&mut self, bytes: &[u8]) -> ModelResult<()> {
        let factory = self.factory().clone();
        let limits = &factory.config().codec;
        if bytes.len() > limits.max_payload_len {
            return Err(CodecError::PayloadTooLarge {
                len: bytes.len(),
                max: limits.max_payload_len,
            }
            .into());
        }
        self.reset_slots();
        decode_into(self, &mut WireReader::new(bytes, limits), 0)?;
        self.remember_serialized(Arc::from(bytes));
        Ok(())
    }
}

fn encode(instance: &Instance, limits: &CodecLimits, depth: usize) -> ModelResult<Arc<[u8]>> {
    if let Some(bytes) = instance.serialized_bytes() {
        return Ok(Arc::clone(bytes));
    }
    if depth > limits.max_depth {
        return Err(CodecError::DepthExceeded { max: limits.max_depth }.into());
    }
    let mut writer = WireWriter::new(limits);
    for property in instance.descriptor().wire_order() {
        encode_field(&mut writer, property, instance.slot(property.index()), depth)?;
    }
    Ok(Arc::from(writer.finish()?))
}

fn encode_field(writer: &mut WireWriter<'_>, property: &PropertyDescriptor, slot: &Slot, depth: usize) -> ModelResult<()> {
    let name = property.name();
    let value = match slot.view() {
        PropertyRef::Scalar(value) => value,
        PropertyRef::Model(child) => return encode_model(writer, property, child, depth),
        PropertyRef::Models(items) => return encode_models(writer, property, items, depth),
    };
    match (property.category(), value) {
        (PropertyCategory::Primitive(kind), v) if v.primitive_kind() == Some(*kind) => writer.put_primitive(v),
        (PropertyCategory::Nullable(_), Value::Null) => writer.put_flag(false),
        (PropertyCategory::Nullable(kind), v) if v.primitive_kind() == Some(*kind) => {
            writer.put_flag(true);
            writer.put_primitive(v);
        }
        (PropertyCategory::Timestamp, Value::Timestamp(ts)) => writer.put_raw(&ts.to_le_bytes()),
        (
            PropertyCategory::String | PropertyCategory::Bytes | PropertyCategory::Chars | PropertyCategory::Object,
            Value::Null,
        ) => writer.put_flag(false),
        (PropertyCategory::String, Value::String(s)) => {
            writer.put_flag(true);
            writer.put_prefixed(s.as_bytes())?;
        }
        (PropertyCategory::Bytes, Value::Bytes(b)) => {
            writer.put_flag(true);
            writer.put_prefixed(b)?;
        }
        (PropertyCategory::Chars, Value::Chars(chars)) => {
            writer.put_flag(true);
            writer.put_prefixed(chars.iter().collect::<String>().as_bytes())?;
        }
        (PropertyCategory::Object, Value::Object(json)) => {
            let payload = serde_json::to_vec(json).map_err(|source| CodecError::Object {
                property: name.to_string(),
                source,
            })?;
            writer.put_flag(true);
            writer.put_prefixed(&payload)?;
        }
        _ => {
            return Err(CodecError::SlotMismatch {
                property: name.to_string(),
                expected: "scalar of the declared type",
            }
            .into());
        }
    }
    Ok(())
}

fn encode_model(
    writer: &mut WireWriter<'_>,
    property: &PropertyDescriptor,
    child: Option<&Instance>,
    depth: usize,
) -> ModelResult<()> {
    let Some(child) = child else {
        writer.put_flag(false);
        return Ok(());
    };
    let payload = encode(child, writer.limits(), depth + 1)?;
    writer.put_flag(true);
    if let PropertyCategory::Polymorphic(_) = property.category() {
        writer.put_prefixed(child.contract().as_bytes())?;
    }
    writer.put_prefixed(&payload)?;
    Ok(())
}

fn encode_models(
    writer: &mut WireWriter<'_>,
    property: &PropertyDescriptor,
    items: &[Instance],
    depth: usize,
) -> ModelResult<()> {
    let max = writer.limits().max_elements;
    let count = u32::try_from(items.len())
        .ok()
        .filter(|&count| count as usize <= max)
        .ok_or_else(|| CodecError::TooManyElements {
            property: property.name().to_string(),
            count: items.len(),
            max,
        })?;
    writer.put_flag(true);
    writer.put_u32(count);
    for item in items {
        let payload = encode(item, writer.limits(), depth + 1)?;
        writer.put_prefixed(&payload)?;
    }
    Ok(())
}

fn decode_into(instance: &mut Instance, reader: &mut WireReader<'_, '_>, depth: usize) -> ModelResult<()> {
    let limits = reader.limits();
    if depth > limits.max_depth {
        return Err(CodecError::DepthExceeded { max: limits.max_depth }.into());
    }
    let descriptor = Arc::clone(instance.descriptor());
    for property in descriptor.wire_order() {
        if reader.is_at_end() {
            debug!(
                contract = %descriptor.identity(),
                property = %property.name(),
                "payload ended on a field boundary; remaining fields keep their defaults"
            );
            break;
        }
        let name = property.name();
        match property.category() {
            PropertyCategory::Primitive(kind) => {
                let value = reader.read_primitive(*kind, name)?;
                instance.init_scalar(property, value);
            }
            PropertyCategory::Nullable(kind) => {
                let value = if reader.read_flag(name)? {
                    reader.read_primitive(*kind, name)?
                } else {
                    Value::Null
                };
                instance.init_scalar(property, value);
            }
            PropertyCategory::Timestamp => {
                let value = Value::Timestamp(Timestamp::from_micros(reader.read_i64(name)?));
                instance.init_scalar(property, value);
            }
            PropertyCategory::String => {
                let value = match reader.read_flag(name)? {
                    true => Value::String(reader.read_string(name)?),
                    false => Value::Null,
                };
                instance.init_scalar(property, value);
            }
            PropertyCategory::Bytes => {
                let value = match reader.read_flag(name)? {
                    true => Value::Bytes(reader.read_prefixed(name)?.to_vec()),
                    false => Value::Null,
                };
                instance.init_scalar(property, value);
            }
            PropertyCategory::Chars => {
                let value = match reader.read_flag(name)? {
                    true => Value::Chars(reader.read_string(name)?.chars().collect()),
                    false => Value::Null,
                };
                instance.init_scalar(property, value);
            }
            PropertyCategory::Object => {
                let value = match reader.read_flag(name)? {
                    true => {
                        let payload = reader.read_prefixed(name)?;
                        Value::Object(serde_json::from_slice(payload).map_err(|source| CodecError::Object {
                            property: name.to_string(),
                            source,
                        })?)
                    }
                    false => Value::Null,
                };
                instance.init_scalar(property, value);
            }
            PropertyCategory::Model(contract) => {
                let child = match reader.read_flag(name)? {
                    true => {
                        let factory = resolve(instance.factory(), contract, name)?;
                        let payload = reader.read_prefixed(name)?;
                        Some(decode_child(&factory, payload, limits, depth + 1)?)
                    }
                    false => None,
                };
                instance.init_model(property, child);
            }
            PropertyCategory::Polymorphic(base) => {
                let child = match reader.read_flag(name)? {
                    true => {
                        let tag = reader.read_string(name)?;
                        let factory = resolve(instance.factory(), &tag, name)?;
                        if !factory.is_assignable_to(base) {
                            return Err(CodecError::IncompatibleContract {
                                property: name.to_string(),
                                expected: base.clone(),
                                actual: tag,
                            }
                            .into());
                        }
                        let payload = reader.read_prefixed(name)?;
                        Some(decode_child(&factory, payload, limits, depth + 1)?)
                    }
                    false => None,
                };
                instance.init_model(property, child);
            }
            PropertyCategory::ModelArray(contract) | PropertyCategory::ModelCollection(contract) => {
                let mut items = Vec::new();
                if reader.read_flag(name)? {
                    let count = reader.read_u32(name)? as usize;
                    if count > limits.max_elements {
                        return Err(CodecError::TooManyElements {
                            property: name.to_string(),
                            count,
                            max: limits.max_elements,
                        }
                        .into());
                    }
                    let factory = resolve(instance.factory(), contract, name)?;
                    // Every element needs at least its 4-byte length prefix.
                    items.reserve(count.min(reader.remaining() / 4));
                    for _ in 0..count {
                        let payload = reader.read_prefixed(name)?;
                        items.push(decode_child(&factory, payload, limits, depth + 1)?);
                    }
                }
                instance.init_models(property, items);
            }
        }
    }
    Ok(())
}

fn decode_child(factory: &ModelFactory, payload: &[u8], limits: &CodecLimits, depth: usize) -> ModelResult<Instance> {
    let mut child = factory.new_instance();
    decode_into(&mut child, &mut WireReader::new(payload, limits), depth)?;
    child.remember_serialized(Arc::from(payload));
    Ok(child)
}

fn resolve(factory: &ModelFactory, contract: &str, property: &str) -> ModelResult<ModelFactory> {
    factory.resolve(contract).map_err(|err| match err {
        ModelError::UnknownContract(_) => CodecError::UnknownContract {
            property: property.to_string(),
            contract: contract.to_string(),
        }
        .into(),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelRegistry;
    use modelforge_schema::{ContractDef, PropertyDef};
    use modelforge_types::PrimitiveKind;

    #[test]
    fn nullable_primitive_wire_form() {
        let registry = ModelRegistry::default();
        let contract = ContractDef::new("Reading").property(PropertyDef::nullable("Level", PrimitiveKind::I16, 1));
        let (_, factory) = registry.get_or_build(&contract).unwrap();

        let mut reading = factory.new_instance();
        // Owner (absent) trails every contract without its own owner.
        assert_eq!(reading.to_bytes().unwrap(), vec![0, 0]);
        reading.set("Level", Value::I16(-2)).unwrap();
        assert_eq!(reading.to_bytes().unwrap(), vec![1, 0xfe, 0xff, 0]);
    }

    #[test]
    fn depth_limit_applies_to_nested_payloads() {
        let registry = ModelRegistry::new(crate::ModelConfig {
            codec: CodecLimits {
                max_depth: 1,
                ..CodecLimits::default()
            },
        });
        let node = ContractDef::new("Node").property(PropertyDef::model("Next", "Node", 1));
        let (_, factory) = registry.get_or_build(&node).unwrap();

        let mut leaf = factory.new_instance();
        leaf.set_model("Next", Some(factory.new_instance())).unwrap();
        let mut root = factory.new_instance();
        root.set_model("Next", Some(leaf)).unwrap();

        let err = root.to_bytes().unwrap_err();
        assert!(matches!(err, ModelError::Codec(CodecError::DepthExceeded { max: 1 })));
    }
}
